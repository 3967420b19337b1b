use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;
use imreg_image::Image;

/// How to sample an image between pixel centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Blend the four surrounding pixels.
    #[default]
    Bilinear,
    /// Take the closest pixel.
    Nearest,
}

/// Sample every channel of `image` at the sub-pixel location `(u, v)`.
///
/// PRECONDITION: `u` and `v` are non-negative and the image is not empty.
pub fn interpolate_pixel<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
) -> [f32; C] {
    match interpolation {
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v),
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v),
    }
}
