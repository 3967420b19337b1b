use crate::parallel;
use imreg_image::{Image, ImageError};

/// ITU-R BT.601 luma weights for red, green and blue.
pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

// fixed-point weights summing to 256
const LUMA_WEIGHTS_U8: [u16; 3] = [77, 150, 29];

#[inline]
fn luma(pixel: &[f32]) -> f32 {
    let [rw, gw, bw] = LUMA_WEIGHTS;
    rw * pixel[0] + gw * pixel[1] + bw * pixel[2]
}

/// Reduce an image to a single intensity channel.
///
/// The channel count decides how pixels are read:
///
/// * 1 channel: copied unchanged.
/// * 3 channels: RGB, weighted with [`LUMA_WEIGHTS`].
/// * 4 channels: RGBA, alpha is ignored.
///
/// # Errors
///
/// Returns [`ImageError::UnsupportedChannels`] for any other channel count.
///
/// # Example
///
/// ```
/// use imreg_image::{Image, ImageSize};
/// use imreg_imgproc::color::to_gray;
///
/// let rgb = Image::<f32, 3>::new(
///     ImageSize {
///         width: 2,
///         height: 1,
///     },
///     vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
/// )
/// .unwrap();
///
/// let gray = to_gray(&rgb).unwrap();
/// assert_eq!(gray.size(), rgb.size());
/// assert!((gray.as_slice()[0] - 1.0).abs() < 1e-6);
/// ```
pub fn to_gray<const C: usize>(src: &Image<f32, C>) -> Result<Image<f32, 1>, ImageError> {
    if !matches!(C, 1 | 3 | 4) {
        return Err(ImageError::UnsupportedChannels(C));
    }

    let mut dst = Image::from_size_val(src.size(), 0.0f32)?;

    parallel::par_iter_rows(src, &mut dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = match C {
            1 => src_pixel[0],
            _ => luma(src_pixel),
        };
    });

    Ok(dst)
}

/// 8-bit variant of [`to_gray`] using `Y = (77 R + 150 G + 29 B) >> 8`.
///
/// # Errors
///
/// Returns [`ImageError::UnsupportedChannels`] unless the image has 1, 3 or 4
/// channels.
pub fn to_gray_u8<const C: usize>(src: &Image<u8, C>) -> Result<Image<u8, 1>, ImageError> {
    if !matches!(C, 1 | 3 | 4) {
        return Err(ImageError::UnsupportedChannels(C));
    }

    let mut dst = Image::from_size_val(src.size(), 0u8)?;

    let [rw, gw, bw] = LUMA_WEIGHTS_U8;
    parallel::par_iter_rows(src, &mut dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = match C {
            1 => src_pixel[0],
            _ => {
                let (r, g, b) = (src_pixel[0] as u16, src_pixel[1] as u16, src_pixel[2] as u16);
                ((rw * r + gw * g + bw * b) >> 8) as u8
            }
        };
    });

    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::{to_gray, to_gray_u8};
    use approx::assert_relative_eq;
    use imreg_image::{Image, ImageError};

    #[test]
    fn rgb_uses_luma_weights() -> Result<(), ImageError> {
        let image = Image::<f32, 3>::new([3, 1].into(), vec![1., 0., 0., 0., 1., 0., 0., 0., 1.])?;
        let gray = to_gray(&image)?;
        assert_relative_eq!(gray.as_slice()[0], 0.299, epsilon = 1e-6);
        assert_relative_eq!(gray.as_slice()[1], 0.587, epsilon = 1e-6);
        assert_relative_eq!(gray.as_slice()[2], 0.114, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn single_channel_is_copied() -> Result<(), ImageError> {
        let mono = Image::<f32, 1>::new([2, 2].into(), vec![0.25, 0.75, 0.0, 1.0])?;
        assert_eq!(to_gray(&mono)?, mono);
        Ok(())
    }

    #[test]
    fn rgba_ignores_alpha() -> Result<(), ImageError> {
        let data = vec![0.0, 1.0, 0.0, 0.5, 0.0, 1.0, 0.0, 1.0];
        let rgba = Image::<f32, 4>::new([2, 1].into(), data)?;
        let gray = to_gray(&rgba)?;
        assert_relative_eq!(gray.as_slice()[0], 0.587, epsilon = 1e-6);
        assert_relative_eq!(gray.as_slice()[1], 0.587, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn other_layouts_are_rejected() -> Result<(), ImageError> {
        let two = Image::<f32, 2>::from_size_val([1, 1].into(), 0.0)?;
        assert_eq!(to_gray(&two), Err(ImageError::UnsupportedChannels(2)));
        Ok(())
    }

    #[test]
    fn fixed_point_gray() -> Result<(), ImageError> {
        let rgb = Image::<u8, 3>::new([3, 1].into(), vec![255, 255, 255, 0, 0, 0, 255, 0, 0])?;
        assert_eq!(to_gray_u8(&rgb)?.as_slice(), &[255, 0, 76]);

        let rgba = Image::<u8, 4>::new([1, 1].into(), vec![0, 255, 0, 17])?;
        assert_eq!(to_gray_u8(&rgba)?.as_slice(), &[149]);

        let two = Image::<u8, 2>::from_size_val([1, 1].into(), 0)?;
        assert_eq!(to_gray_u8(&two), Err(ImageError::UnsupportedChannels(2)));
        Ok(())
    }
}
