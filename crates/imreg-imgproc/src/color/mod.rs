mod gray;
pub use gray::{to_gray, to_gray_u8, LUMA_WEIGHTS};
