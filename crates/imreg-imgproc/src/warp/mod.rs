//! Geometric image transformations.
//!
//! Applies a 3x3 perspective transform (homography) to resample an image
//! onto a new canvas.

mod perspective;

pub use perspective::{inverse_perspective_matrix, warp_perspective};
