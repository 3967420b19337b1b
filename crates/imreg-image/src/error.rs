/// Errors raised while building or reading images.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// The buffer length does not match width x height x channels.
    #[error("buffer holds {0} values but the image needs {1}")]
    InvalidChannelShape(usize, usize),

    /// The image has no pixels.
    #[error("image has no pixels ({0}x{1})")]
    EmptyImage(usize, usize),

    /// A value could not be represented in the target pixel type.
    #[error("pixel value cannot be cast to the target type")]
    CastError,

    /// Pixel coordinates outside the image.
    #[error("pixel ({0}, {1}) is outside a {2}x{3} image")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Channel index past the channel count.
    #[error("channel {0} is out of range for {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// The operation does not handle this channel layout.
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(usize),

    /// The transformation matrix has no inverse.
    #[error("transformation matrix is singular")]
    CannotComputeDeterminant,
}
