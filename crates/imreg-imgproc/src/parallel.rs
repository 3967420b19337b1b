use rayon::prelude::*;

use imreg_image::Image;

/// Apply a function to each pixel in the image in parallel.
///
/// Rows are processed on the rayon pool; `f` receives the source pixel
/// channels and the destination pixel channels.
///
/// PRECONDITION: `src` and `dst` have the same size.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }
    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each pixel for grid sampling in parallel.
///
/// `map_x` and `map_y` hold, for every destination pixel, the source
/// coordinates to sample from. They are laid out row-major with the
/// destination's shape.
pub fn par_iter_rows_resample<const C: usize>(
    dst: &mut Image<f32, C>,
    map_x: &[f32],
    map_y: &[f32],
    f: impl Fn(&f32, &f32, &mut [f32]) + Send + Sync,
) {
    let cols = dst.cols();
    if cols == 0 {
        return;
    }
    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .zip(map_x.par_chunks_exact(cols))
        .zip(map_y.par_chunks_exact(cols))
        .for_each(|((dst_chunk, map_x_chunk), map_y_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .zip(map_x_chunk.iter().zip(map_y_chunk.iter()))
                .for_each(|(dst_pixel, (x, y))| {
                    f(x, y, dst_pixel);
                });
        });
}

#[cfg(test)]
mod tests {
    use imreg_image::{Image, ImageError, ImageSize};

    #[test]
    fn par_iter_rows_doubles() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let src = Image::<f32, 2>::new(size, (0..12).map(|v| v as f32).collect())?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        super::par_iter_rows(&src, &mut dst, |s, d| d[0] = s[0] + s[1]);

        assert_eq!(dst.as_slice(), &[1.0, 5.0, 9.0, 13.0, 17.0, 21.0]);
        Ok(())
    }

    #[test]
    fn par_iter_rows_resample_visits_all() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 2,
        };
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let map_x = [0.0, 1.0, 0.0, 1.0];
        let map_y = [0.0, 0.0, 1.0, 1.0];

        super::par_iter_rows_resample(&mut dst, &map_x, &map_y, |x, y, pixel| {
            pixel[0] = x + 10.0 * y;
        });

        assert_eq!(dst.as_slice(), &[0.0, 1.0, 10.0, 11.0]);
        Ok(())
    }
}
