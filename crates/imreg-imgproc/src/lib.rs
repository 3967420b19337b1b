#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Conversion to a single intensity channel.
pub mod color;

/// Sub-pixel sampling.
pub mod interpolation;

/// Row-parallel pixel loops.
pub mod parallel;

/// Perspective warping.
pub mod warp;
