use imreg_image::Image;

/// Sample an image at a sub-pixel location by blending the four surrounding pixels.
///
/// PRECONDITION: `u` and `v` are non-negative and the image is not empty.
/// Neighbors past the last row or column are clamped to the border.
pub(crate) fn bilinear_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());
    let data = image.as_slice();

    let x0 = (u.trunc() as usize).min(cols - 1);
    let y0 = (v.trunc() as usize).min(rows - 1);
    let x1 = (x0 + 1).min(cols - 1);
    let y1 = (y0 + 1).min(rows - 1);

    let (tx, ty) = (u.fract(), v.fract());

    let at = |x: usize, y: usize| {
        let start = (y * cols + x) * C;
        &data[start..start + C]
    };
    let (top_left, top_right) = (at(x0, y0), at(x1, y0));
    let (bottom_left, bottom_right) = (at(x0, y1), at(x1, y1));

    std::array::from_fn(|k| {
        let top = top_left[k] + (top_right[k] - top_left[k]) * tx;
        let bottom = bottom_left[k] + (bottom_right[k] - bottom_left[k]) * tx;
        top + (bottom - top) * ty
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use imreg_image::{Image, ImageError};

    #[test]
    fn bilinear_center() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new([2, 2].into(), vec![0.0, 1.0, 2.0, 3.0])?;
        let pixel = super::bilinear_interpolation(&image, 0.5, 0.5);
        assert_relative_eq!(pixel[0], 1.5);

        let pixel = super::bilinear_interpolation(&image, 1.0, 0.25);
        assert_relative_eq!(pixel[0], 1.5);
        Ok(())
    }

    #[test]
    fn bilinear_on_grid_is_exact() -> Result<(), ImageError> {
        let image = Image::<f32, 2>::new([3, 2].into(), (0..12).map(|v| v as f32).collect())?;
        assert_eq!(super::bilinear_interpolation(&image, 2.0, 1.0), [10.0, 11.0]);
        assert_eq!(super::bilinear_interpolation(&image, 0.0, 0.0), [0.0, 1.0]);
        Ok(())
    }
}
