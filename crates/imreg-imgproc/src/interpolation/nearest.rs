use imreg_image::Image;

/// Sample the pixel closest to `(u, v)`, clamped to the image border.
pub(crate) fn nearest_neighbor_interpolation<const C: usize>(
    image: &Image<f32, C>,
    u: f32,
    v: f32,
) -> [f32; C] {
    let x = (u.round() as usize).min(image.cols() - 1);
    let y = (v.round() as usize).min(image.rows() - 1);

    let start = (y * image.cols() + x) * C;
    let data = image.as_slice();
    std::array::from_fn(|k| data[start + k])
}
