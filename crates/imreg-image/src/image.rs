use crate::error::ImageError;

/// Width and height of an image in pixels.
///
/// ```
/// use imreg_image::ImageSize;
///
/// let size: ImageSize = [640, 480].into();
/// assert_eq!(size.width, 640);
/// assert_eq!(size.to_string(), "640x480");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from([width, height]: [usize; 2]) -> Self {
        ImageSize { width, height }
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.width as u32, size.height as u32]
    }
}

/// An owned image with `C` interleaved channels.
///
/// The buffer is row-major with shape (height, width, C), so the channels of
/// one pixel are contiguous.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const C: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const C: usize> Image<T, C> {
    /// Wrap a pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidChannelShape`] when `data` does not hold
    /// exactly `width * height * C` values.
    ///
    /// ```
    /// use imreg_image::{Image, ImageError};
    ///
    /// let image = Image::<u8, 3>::new([2, 1].into(), vec![0, 1, 2, 3, 4, 5]).unwrap();
    /// assert_eq!(image.pixel(1, 0), Some(&[3u8, 4, 5][..]));
    ///
    /// let short = Image::<u8, 3>::new([2, 1].into(), vec![0; 5]);
    /// assert_eq!(short, Err(ImageError::InvalidChannelShape(5, 6)));
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.area() * C;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }
        Ok(Self { size, data })
    }

    /// An image of `size` with every value set to `val`.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Self::new(size, vec![val; size.area() * C])
    }

    /// Size in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// The interleaved buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The interleaved buffer, mutable.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.cols() && y < self.rows()).then(|| (y * self.cols() + x) * C)
    }

    /// All channels of the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[T]> {
        let start = self.offset(x, y)?;
        self.data.get(start..start + C)
    }

    /// One channel of the pixel at column `x`, row `y`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::PixelIndexOutOfBounds`] or
    /// [`ImageError::ChannelIndexOutOfBounds`].
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<T, ImageError>
    where
        T: Copy,
    {
        if ch >= C {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, C));
        }
        self.offset(x, y)
            .map(|start| self.data[start + ch])
            .ok_or(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.cols(),
                self.rows(),
            ))
    }

    /// Convert every value to `U` and multiply it by `scale`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::CastError`] if a value has no `U` representation.
    ///
    /// ```
    /// use imreg_image::Image;
    ///
    /// let image = Image::<u8, 1>::new([2, 1].into(), vec![0, 255]).unwrap();
    /// let scaled = image.cast_and_scale::<f32>(1.0 / 255.0).unwrap();
    /// assert_eq!(scaled.as_slice(), &[0.0, 1.0]);
    /// ```
    pub fn cast_and_scale<U>(&self, scale: U) -> Result<Image<U, C>, ImageError>
    where
        T: num_traits::NumCast + Copy,
        U: num_traits::NumCast + std::ops::Mul<Output = U> + Copy,
    {
        let data = self
            .data
            .iter()
            .map(|&v| U::from(v).map(|u| u * scale).ok_or(ImageError::CastError))
            .collect::<Result<Vec<U>, _>>()?;
        Image::new(self.size, data)
    }
}

#[cfg(test)]
mod tests {
    use super::{Image, ImageSize};
    use crate::ImageError;

    #[test]
    fn buffer_length_is_checked() {
        assert!(Image::<f32, 3>::new([2, 2].into(), vec![0.0; 12]).is_ok());
        assert_eq!(
            Image::<f32, 3>::new([2, 2].into(), vec![0.0; 11]),
            Err(ImageError::InvalidChannelShape(11, 12))
        );
    }

    #[test]
    fn pixel_access() -> Result<(), ImageError> {
        let image = Image::<u8, 2>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0, 1, 2, 3, 4, 5, 6, 7],
        )?;
        assert_eq!(image.pixel(1, 1), Some(&[6u8, 7][..]));
        assert_eq!(image.pixel(2, 0), None);
        assert_eq!(image.get_pixel(1, 0, 0)?, 2);
        assert_eq!(image.get_pixel(0, 1, 1)?, 5);
        assert_eq!(
            image.get_pixel(0, 0, 2),
            Err(ImageError::ChannelIndexOutOfBounds(2, 2))
        );
        assert_eq!(
            image.get_pixel(3, 0, 0),
            Err(ImageError::PixelIndexOutOfBounds(3, 0, 2, 2))
        );
        Ok(())
    }

    #[test]
    fn cast_u8_to_f32() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new([3, 1].into(), vec![0, 2, 255])?;
        let image_f32 = image.cast_and_scale::<f32>(0.5)?;
        assert_eq!(image_f32.as_slice(), &[0.0, 1.0, 127.5]);
        assert_eq!(image_f32.size(), image.size());
        Ok(())
    }

    #[test]
    fn cast_out_of_range() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new([1, 1].into(), vec![-3.0])?;
        assert_eq!(image.cast_and_scale::<u8>(1), Err(ImageError::CastError));
        Ok(())
    }
}
