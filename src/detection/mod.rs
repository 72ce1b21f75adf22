//! Detection geometry and records.
//!
//! Everything downstream of the label parser works with pixel-space
//! [`BoundingBox`] values. Coordinate spaces are tracked in the type system
//! with the [`Pixel`] and [`Normalized`] markers, so normalized label
//! coordinates have to go through [`BBoxXYXY::to_pixel`] before they can be
//! compared against anything.
//!
//! # Example
//!
//! ```
//! use panelscan::detection::{BBoxXYXY, BoundingBox, Normalized};
//!
//! let bbox = BBoxXYXY::<Normalized>::from_cxcywh(0.5, 0.5, 0.2, 0.4).to_pixel(100.0, 200.0);
//! let panel = BoundingBox::new(0, "panel", bbox);
//! assert!((panel.bbox.width() - 20.0).abs() < 1e-9);
//! ```

mod bbox;
mod model;
mod space;

pub use bbox::BBoxXYXY;
pub use model::{BoundingBox, BoxRole, ClassMap, ImageSize};
pub use space::{Normalized, Pixel, Space};
