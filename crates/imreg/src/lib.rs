#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use imreg_image as image;

#[doc(inline)]
pub use imreg_imgproc as imgproc;

#[doc(inline)]
pub use imreg_features as features;

#[doc(inline)]
pub use imreg_geometry as geometry;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod registration;
pub use registration::*;
