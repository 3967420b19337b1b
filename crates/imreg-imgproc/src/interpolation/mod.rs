//! Sub-pixel sampling used by the warp.
//!
//! [`InterpolationMode::Bilinear`] blends the four neighbors of a location,
//! [`InterpolationMode::Nearest`] snaps to the closest pixel.

mod bilinear;

/// Sampling maps for resampling a destination grid.
pub mod grid;

mod interpolate;
mod nearest;

pub use interpolate::{interpolate_pixel, InterpolationMode};
