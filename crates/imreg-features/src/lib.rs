#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! The detector that produces keypoints and descriptors is an external
//! collaborator behind [`DescriptorSource`]. Nearest-neighbor search is
//! behind [`KnnSearch`], with an exact [`BruteForceIndex`] and a multi-probe
//! [`LshIndex`] for binary descriptors.

mod descriptor;
pub use descriptor::*;

mod error;
pub use error::*;

mod keypoint;
pub use keypoint::*;

mod knn;
pub use knn::*;

mod lsh;
pub use lsh::*;

mod matcher;
pub use matcher::*;

mod source;
pub use source::*;
