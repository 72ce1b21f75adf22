//! Coordinate space markers for detection boxes.
//!
//! Label files carry boxes normalized to the image size, while overlap
//! metrics are computed in pixels. The markers below are uninhabited types
//! used only as type parameters, so a normalized box can never be handed to
//! code expecting pixels.

/// A coordinate space a box can live in.
pub trait Space {
    /// Short name used in debug output.
    const NAME: &'static str;
}

/// Absolute pixel coordinates, (0, 0) at the top-left corner of the image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Coordinates expressed as fractions of the image width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl Space for Pixel {
    const NAME: &'static str = "px";
}

impl Space for Normalized {
    const NAME: &'static str = "norm";
}
