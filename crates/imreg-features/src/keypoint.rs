use serde::{Deserialize, Serialize};

use crate::Descriptor;

/// A salient image location in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Column coordinate in pixels.
    pub x: f64,
    /// Row coordinate in pixels.
    pub y: f64,
    /// Detection scale, if the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Orientation in radians, if the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<f32>,
}

impl Keypoint {
    /// Create a keypoint at `(x, y)` without scale or orientation.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            scale: None,
            orientation: None,
        }
    }

    /// Set the detection scale.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the orientation in radians.
    pub fn with_orientation(mut self, orientation: f32) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// The location as an `[x, y]` pair.
    pub fn xy(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// A keypoint together with the descriptor computed around it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// The keypoint location.
    pub keypoint: Keypoint,
    /// The descriptor of the patch around the keypoint.
    pub descriptor: Descriptor,
}

impl Feature {
    /// Create a new feature.
    pub fn new(keypoint: Keypoint, descriptor: Descriptor) -> Self {
        Self {
            keypoint,
            descriptor,
        }
    }
}

impl AsRef<Descriptor> for Feature {
    fn as_ref(&self) -> &Descriptor {
        &self.descriptor
    }
}
