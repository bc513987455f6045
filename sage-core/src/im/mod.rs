mod buffer;
mod image;
mod mask;

pub use buffer::SageBuffer;
pub use image::SageImage;
pub use image::SageRgb;

pub use mask::MaskRecord;
pub use mask::SageMask;
