use crate::{
    interpolation::{grid::meshgrid_from_fn, interpolate_pixel, InterpolationMode},
    parallel,
};

use imreg_image::{Image, ImageError};

type Row = [f64; 3];

fn row(m: &[f64; 9], i: usize) -> Row {
    [m[3 * i], m[3 * i + 1], m[3 * i + 2]]
}

fn cross(a: Row, b: Row) -> Row {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: Row, b: Row) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Invert a row-major 3x3 perspective matrix.
///
/// The columns of the inverse are the pairwise cross products of the rows of
/// `m`, scaled by the reciprocal determinant.
///
/// # Errors
///
/// Returns [`ImageError::CannotComputeDeterminant`] if the matrix is singular.
pub fn inverse_perspective_matrix(m: &[f64; 9]) -> Result<[f64; 9], ImageError> {
    let (r0, r1, r2) = (row(m, 0), row(m, 1), row(m, 2));
    let cols = [cross(r1, r2), cross(r2, r0), cross(r0, r1)];

    let det = dot(r0, cols[0]);
    if det == 0.0 || !det.is_finite() {
        return Err(ImageError::CannotComputeDeterminant);
    }

    Ok(std::array::from_fn(|k| cols[k % 3][k / 3] / det))
}

fn transform_point(x: f64, y: f64, m: &[f64; 9]) -> (f64, f64) {
    let p = [x, y, 1.0];
    let w = dot(row(m, 2), p);
    (dot(row(m, 0), p) / w, dot(row(m, 1), p) / w)
}

/// Resample `src` onto `dst` through the perspective transform `m`.
///
/// `m` is row-major and maps source coordinates to destination coordinates.
/// Each destination pixel is pulled back through the inverse of `m`; the
/// size of `dst` is the output canvas, and pixels whose pre-image falls
/// outside `src` are set to `fill`.
///
/// # Errors
///
/// * [`ImageError::EmptyImage`] if `src` has no pixels.
/// * [`ImageError::CannotComputeDeterminant`] if `m` is singular.
///
/// # Example
///
/// ```
/// use imreg_image::Image;
/// use imreg_imgproc::interpolation::InterpolationMode;
/// use imreg_imgproc::warp::warp_perspective;
///
/// let src = Image::<f32, 1>::new([2, 1].into(), vec![1.0, 2.0]).unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val([3, 1].into(), 0.0).unwrap();
///
/// // move one pixel to the right
/// let m = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
/// warp_perspective(&src, &mut dst, &m, InterpolationMode::Nearest, [0.0]).unwrap();
///
/// assert_eq!(dst.as_slice(), &[0.0, 1.0, 2.0]);
/// ```
pub fn warp_perspective<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    m: &[f64; 9],
    interpolation: InterpolationMode,
    fill: [f32; C],
) -> Result<(), ImageError> {
    if src.cols() == 0 || src.rows() == 0 {
        return Err(ImageError::EmptyImage(src.cols(), src.rows()));
    }

    let inv_m = inverse_perspective_matrix(m)?;

    // find the source position of every destination pixel
    let (dst_rows, dst_cols) = (dst.rows(), dst.cols());
    let (map_x, map_y) = meshgrid_from_fn(dst_cols, dst_rows, |x, y| {
        let (xsrc, ysrc) = transform_point(x as f64, y as f64, &inv_m);
        (xsrc as f32, ysrc as f32)
    });

    let (src_cols, src_rows) = (src.cols() as f32, src.rows() as f32);
    parallel::par_iter_rows_resample(dst, &map_x, &map_y, |&x, &y, dst_pixel| {
        if x >= 0.0f32 && x < src_cols && y >= 0.0f32 && y < src_rows {
            dst_pixel.copy_from_slice(&interpolate_pixel(src, x, y, interpolation));
        } else {
            dst_pixel.copy_from_slice(&fill);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use imreg_image::{Image, ImageError};

    use super::{inverse_perspective_matrix, transform_point, warp_perspective};
    use crate::interpolation::InterpolationMode;

    const SHIFT_LEFT: [f64; 9] = [1.0, 0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

    fn ramp(width: usize, height: usize) -> Result<Image<f32, 1>, ImageError> {
        let data = (0..width * height).map(|v| v as f32).collect();
        Image::new([width, height].into(), data)
    }

    #[test]
    fn inverse_of_translation_and_scale() -> Result<(), ImageError> {
        let inv = inverse_perspective_matrix(&SHIFT_LEFT)?;
        assert_eq!(inv, [1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

        let inv = inverse_perspective_matrix(&[2.0, 0.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 1.0])?;
        assert_eq!(inv, [0.5, 0.0, 0.0, 0.0, 0.25, 0.0, 0.0, 0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let rank_two = [1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0];
        assert_eq!(
            inverse_perspective_matrix(&rank_two),
            Err(ImageError::CannotComputeDeterminant)
        );
    }

    #[test]
    fn homogeneous_division() {
        assert_eq!(transform_point(1.0, 1.0, &SHIFT_LEFT), (0.0, 1.0));
        let doubled = [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0];
        assert_eq!(transform_point(3.0, 4.0, &doubled), (3.0, 4.0));
    }

    #[test]
    fn identity_copies_every_channel() -> Result<(), ImageError> {
        let data = (0..4 * 5 * 3).map(|v| v as f32).collect();
        let image = Image::<f32, 3>::new([4, 5].into(), data)?;
        let mut warped = Image::from_size_val(image.size(), -1.0)?;

        let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        warp_perspective(&image, &mut warped, &identity, InterpolationMode::Bilinear, [0.0; 3])?;

        assert_eq!(warped, image);
        Ok(())
    }

    #[test]
    fn uncovered_pixels_get_fill() -> Result<(), ImageError> {
        let image = ramp(3, 2)?;
        let mut warped = Image::from_size_val(image.size(), 0.0)?;

        warp_perspective(&image, &mut warped, &SHIFT_LEFT, InterpolationMode::Nearest, [-1.0])?;

        assert_eq!(warped.as_slice(), &[1.0, 2.0, -1.0, 4.0, 5.0, -1.0]);
        Ok(())
    }

    #[test]
    fn canvas_size_follows_destination() -> Result<(), ImageError> {
        let image = ramp(4, 4)?;
        let mut warped = Image::from_size_val([6, 2].into(), 0.0)?;

        let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        warp_perspective(&image, &mut warped, &identity, InterpolationMode::Nearest, [9.0])?;

        assert_eq!(
            warped.as_slice(),
            &[0.0, 1.0, 2.0, 3.0, 9.0, 9.0, 4.0, 5.0, 6.0, 7.0, 9.0, 9.0]
        );
        Ok(())
    }

    #[test]
    fn singular_warp_and_empty_source() -> Result<(), ImageError> {
        let image = ramp(4, 4)?;
        let mut warped = Image::from_size_val([4, 4].into(), 0.0)?;
        assert_eq!(
            warp_perspective(&image, &mut warped, &[0.0; 9], InterpolationMode::Bilinear, [0.0]),
            Err(ImageError::CannotComputeDeterminant)
        );

        let empty = Image::<f32, 1>::new([0, 3].into(), vec![])?;
        assert_eq!(
            warp_perspective(&empty, &mut warped, &SHIFT_LEFT, InterpolationMode::Bilinear, [0.0]),
            Err(ImageError::EmptyImage(0, 3))
        );
        Ok(())
    }

    #[test]
    fn forward_then_inverse_restores_interior() -> Result<(), ImageError> {
        let size = [32, 32].into();
        let mut image = Image::<f32, 1>::from_size_val(size, 0.0)?;
        for (i, v) in image.as_slice_mut().iter_mut().enumerate() {
            let (x, y) = ((i % 32) as f32, (i / 32) as f32);
            *v = 0.5 * x + 0.25 * y + 1.0;
        }

        let m = [1.02, 0.03, 1.5, -0.02, 0.98, 0.75, 0.0, 0.0, 1.0];
        let m_inv = inverse_perspective_matrix(&m)?;

        let mut forward = Image::from_size_val(size, 0.0)?;
        warp_perspective(&image, &mut forward, &m, InterpolationMode::Bilinear, [0.0])?;
        let mut back = Image::from_size_val(size, 0.0)?;
        warp_perspective(&forward, &mut back, &m_inv, InterpolationMode::Bilinear, [0.0])?;

        for y in 8..24 {
            for x in 8..24 {
                assert_relative_eq!(
                    back.get_pixel(x, y, 0)?,
                    image.get_pixel(x, y, 0)?,
                    epsilon = 1e-3
                );
            }
        }
        Ok(())
    }
}
