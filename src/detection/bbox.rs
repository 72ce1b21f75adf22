//! Axis-aligned boxes in XYXY form and the overlap metrics used for linking.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use super::space::{Normalized, Pixel, Space};

/// An axis-aligned bounding box in XYXY format (x_min, y_min, x_max, y_max).
///
/// The `S` parameter is either [`Pixel`] or [`Normalized`].
///
/// The constructor does not enforce `min < max`. Boxes clamped to the image
/// edge can collapse to zero width, and such boxes must still be
/// representable so the linker can report them instead of silently dropping
/// them. Use [`BBoxXYXY::is_degenerate`] to check.
pub struct BBoxXYXY<S> {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    _space: PhantomData<S>,
}

impl<S> BBoxXYXY<S> {
    /// Creates a new bounding box from explicit corner coordinates.
    #[inline]
    pub fn from_xyxy(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            _space: PhantomData,
        }
    }

    /// Creates a box from its center point and size.
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        let half_w = w / 2.0;
        let half_h = h / 2.0;
        Self::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Returns the width of the box. Negative if the box is malformed.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Returns the height of the box. Negative if the box is malformed.
    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Returns `width * height`, which may be zero or negative.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x_min.is_finite()
            && self.y_min.is_finite()
            && self.x_max.is_finite()
            && self.y_max.is_finite()
    }

    /// Returns true if the box cannot take part in overlap computations:
    /// any coordinate is non-finite, or either side has zero or negative length.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Clamps every coordinate into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f64, height: f64) -> Self {
        Self::from_xyxy(
            self.x_min.clamp(0.0, width),
            self.y_min.clamp(0.0, height),
            self.x_max.clamp(0.0, width),
            self.y_max.clamp(0.0, height),
        )
    }

    /// Area of the overlap between `self` and `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &Self) -> f64 {
        let w = self.x_max.min(other.x_max) - self.x_min.max(other.x_min);
        let h = self.y_max.min(other.y_max) - self.y_min.max(other.y_min);
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }

    /// Intersection over union. Zero when the union is empty.
    pub fn iou(&self, other: &Self) -> f64 {
        let inter = self.intersection_area(other);
        let union = self.area().max(0.0) + other.area().max(0.0) - inter;
        if union > 0.0 {
            inter / union
        } else {
            0.0
        }
    }

    /// Fraction of `self`'s area that lies inside `container`, in `[0, 1]`.
    ///
    /// Zero when `self` has no positive area.
    pub fn containment_in(&self, container: &Self) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        (self.intersection_area(container) / area).min(1.0)
    }
}

impl BBoxXYXY<Normalized> {
    /// Scales normalized coordinates to pixels for an image of the given size.
    pub fn to_pixel(&self, image_width: f64, image_height: f64) -> BBoxXYXY<Pixel> {
        BBoxXYXY::from_xyxy(
            self.x_min * image_width,
            self.y_min * image_height,
            self.x_max * image_width,
            self.y_max * image_height,
        )
    }
}

impl<S> Clone for BBoxXYXY<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for BBoxXYXY<S> {}

impl<S> PartialEq for BBoxXYXY<S> {
    fn eq(&self, other: &Self) -> bool {
        self.x_min == other.x_min
            && self.y_min == other.y_min
            && self.x_max == other.x_max
            && self.y_max == other.y_max
    }
}

impl<S: Space> std::fmt::Debug for BBoxXYXY<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BBoxXYXY<{}>({}, {}, {}, {})",
            S::NAME,
            self.x_min,
            self.y_min,
            self.x_max,
            self.y_max
        )
    }
}

impl<S> Default for BBoxXYXY<S> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

// Hand-written serde so `S` does not need Serialize/Deserialize bounds.
impl<S> Serialize for BBoxXYXY<S> {
    fn serialize<Ser: serde::Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("BBoxXYXY", 4)?;
        state.serialize_field("x_min", &self.x_min)?;
        state.serialize_field("y_min", &self.y_min)?;
        state.serialize_field("x_max", &self.x_max)?;
        state.serialize_field("y_max", &self.y_max)?;
        state.end()
    }
}

impl<'de, S> Deserialize<'de> for BBoxXYXY<S> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Corners {
            x_min: f64,
            y_min: f64,
            x_max: f64,
            y_max: f64,
        }
        let c = Corners::deserialize(deserializer)?;
        Ok(BBoxXYXY::from_xyxy(c.x_min, c.y_min, c.x_max, c.y_max))
    }
}
