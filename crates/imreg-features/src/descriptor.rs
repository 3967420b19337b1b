use serde::{Deserialize, Serialize};

use crate::MatchError;

/// A fixed-length signature of the patch around a keypoint.
///
/// Binary descriptors are packed bit strings compared with the Hamming
/// distance; float descriptors are compared with the Euclidean distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Descriptor {
    /// Packed binary descriptor, e.g. 32 bytes for ORB.
    Binary(Vec<u8>),
    /// Real valued descriptor, e.g. 128 floats for SIFT.
    Float(Vec<f32>),
}

/// The metric family of a descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Compared with the Hamming distance.
    Binary,
    /// Compared with the Euclidean distance.
    Float,
}

/// Kind and length shared by every descriptor of a set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorLayout {
    /// The descriptor kind.
    pub kind: DescriptorKind,
    /// Number of elements (bytes for binary, floats for float descriptors).
    pub len: usize,
}

impl std::fmt::Display for DescriptorLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.kind, self.len)
    }
}

impl Descriptor {
    /// The metric family of the descriptor.
    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Binary(_) => DescriptorKind::Binary,
            Descriptor::Float(_) => DescriptorKind::Float,
        }
    }

    /// Number of elements in the descriptor.
    pub fn len(&self) -> usize {
        match self {
            Descriptor::Binary(d) => d.len(),
            Descriptor::Float(d) => d.len(),
        }
    }

    /// Whether the descriptor has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The layout of the descriptor.
    pub fn layout(&self) -> DescriptorLayout {
        DescriptorLayout {
            kind: self.kind(),
            len: self.len(),
        }
    }

    /// Distance to another descriptor.
    ///
    /// Returns `None` when the descriptors do not share a layout.
    ///
    /// # Example
    ///
    /// ```
    /// use imreg_features::Descriptor;
    ///
    /// let a = Descriptor::Binary(vec![0b0000_1111]);
    /// let b = Descriptor::Binary(vec![0b0000_0001]);
    /// assert_eq!(a.distance(&b), Some(3.0));
    ///
    /// let c = Descriptor::Float(vec![0.0, 3.0]);
    /// let d = Descriptor::Float(vec![4.0, 0.0]);
    /// assert_eq!(c.distance(&d), Some(5.0));
    /// assert_eq!(a.distance(&c), None);
    /// ```
    pub fn distance(&self, other: &Descriptor) -> Option<f32> {
        match (self, other) {
            (Descriptor::Binary(a), Descriptor::Binary(b)) if a.len() == b.len() => {
                Some(hamming_distance(a, b) as f32)
            }
            (Descriptor::Float(a), Descriptor::Float(b)) if a.len() == b.len() => {
                Some(euclidean_distance(a, b))
            }
            _ => None,
        }
    }
}

impl AsRef<Descriptor> for Descriptor {
    fn as_ref(&self) -> &Descriptor {
        self
    }
}

/// Hamming distance between two byte descriptors.
#[inline]
pub fn hamming_distance(a: &[u8], b: &[u8]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x ^ y).count_ones())
        .sum()
}

/// Euclidean distance between two float descriptors.
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Check that every descriptor of a set shares one layout.
///
/// # Returns
///
/// The shared layout, or `None` for an empty set.
///
/// # Errors
///
/// Returns [`MatchError::InvalidDescriptorSet`] if kinds or lengths differ
/// or a descriptor is empty.
pub fn descriptor_layout<D: AsRef<Descriptor>>(
    descriptors: &[D],
) -> Result<Option<DescriptorLayout>, MatchError> {
    let Some(first) = descriptors.first() else {
        return Ok(None);
    };

    let layout = first.as_ref().layout();
    if layout.len == 0 {
        return Err(MatchError::InvalidDescriptorSet(
            "descriptor has zero length".to_string(),
        ));
    }

    for (i, d) in descriptors.iter().enumerate().skip(1) {
        let other = d.as_ref().layout();
        if other != layout {
            return Err(MatchError::InvalidDescriptorSet(format!(
                "descriptor {i} is {other}, expected {layout}"
            )));
        }
    }

    Ok(Some(layout))
}
