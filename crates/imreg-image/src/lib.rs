#![deny(missing_docs)]
//! Interleaved pixel buffers shared by the registration crates.

mod error;
mod image;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
