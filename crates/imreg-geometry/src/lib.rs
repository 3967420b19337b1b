#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Small fixed-size matrix helpers.
pub mod linalg;

mod error;
pub use error::*;

mod homography;
pub use homography::*;

mod ransac;
pub use ransac::*;
