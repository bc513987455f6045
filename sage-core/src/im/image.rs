// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::Path;

use fast_image_resize::PixelType;
use image::{DynamicImage, ImageBuffer, Rgb, Rgba, open as open_dynamic};

use crate::constant;
use crate::cv::transform;
use crate::error::SageError;
use crate::im::SageBuffer;
use crate::impl_enum_dispatch;

/// An 8-bit RGB(A) pixel grid
pub type SageRgb = SageBuffer<u8, Vec<u8>>;

/// A wrapper for the images flowing in and out of the segmentation pipeline
///
/// Inputs are 8-bit RGB images. Composited overlays are stored as 32-bit
/// floats in [0, 1] and segmented images or cutouts as 8-bit RGBA. All
/// external image types (e.g `DynamicImage`) should be converted to a
/// SageImage via a method on this enum.
///
/// # Examples
///
/// ```
/// use image::{RgbImage, DynamicImage};
/// use sage_core::im::SageImage;
///
/// let rgb = RgbImage::new(10, 10);
/// let dynamic = DynamicImage::ImageRgb8(rgb);
/// let image = SageImage::new_from_default(dynamic).unwrap();
///
/// assert_eq!(image.shape(), (10, 10, 3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SageImage {
    U8(SageBuffer<u8, Vec<u8>>),
    F32(SageBuffer<f32, Vec<f32>>),
}

// >>> I/O METHODS

impl SageImage {
    /// Open a new RGB image from a provided path
    ///
    /// # Arguments
    ///
    /// * `path` - A path to an image with a valid extension
    ///
    /// ```no_run
    /// use sage_core::im::SageImage;
    /// let image = SageImage::open("image.png");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SageImage, SageError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        if let Some(ext) = extension {
            if constant::IMAGE_DYNAMIC_FORMATS.iter().any(|e| e == &ext) {
                if !path.as_ref().exists() {
                    return Err(SageError::NoFileError(
                        path.as_ref().display().to_string(),
                    ));
                }

                if let Ok(image) = open_dynamic(&path) {
                    return Self::new_from_default(image);
                }

                return Err(SageError::ImageReadError);
            }
        }

        Err(SageError::ImageExtensionError)
    }

    /// Initialize a new RGB image from a DynamicImage
    ///
    /// Any alpha channel is discarded and grayscale or high bit-depth
    /// images are converted to 8-bit RGB.
    ///
    /// # Arguments
    ///
    /// * `image` - Any DynamicImage
    pub fn new_from_default(image: DynamicImage) -> Result<SageImage, SageError> {
        let width = image.width();
        let height = image.height();

        match image {
            DynamicImage::ImageRgb8(buffer) => Ok(SageImage::U8(SageBuffer::new(
                width,
                height,
                3,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageRgba8(buffer) => Ok(SageImage::U8(SageBuffer::new(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            )?)),
            other => Ok(SageImage::U8(SageBuffer::new(
                width,
                height,
                3,
                other.into_rgb8().into_raw(),
            )?)),
        }
    }

    /// Convert to a DynamicImage
    ///
    /// Float images are assumed to hold values in [0, 1] and are scaled
    /// to 8-bit before conversion.
    pub fn to_dynamic(&self) -> Result<DynamicImage, SageError> {
        let (width, height) = (self.width(), self.height());

        let raw = match self {
            SageImage::U8(buffer) => buffer.as_raw().clone(),
            SageImage::F32(buffer) => buffer.iter().map(|v| unit_to_u8(*v)).collect(),
        };

        match self.channels() {
            3 => ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, raw)
                .map(DynamicImage::ImageRgb8)
                .ok_or(SageError::BufferSizeError),
            4 => ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, raw)
                .map(DynamicImage::ImageRgba8)
                .ok_or(SageError::BufferSizeError),
            _ => Err(SageError::ImageError(
                "Only 3 or 4 channel images can be converted.",
            )),
        }
    }

    /// Save image
    ///
    /// # Arguments
    ///
    /// * `path` - A path to an image with a valid extension
    ///
    /// ```no_run
    /// use sage_core::im::SageImage;
    /// let image = SageImage::open("image.png").unwrap();
    /// image.save("image.jpg").unwrap();
    /// ```
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SageError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        if let Some(ext) = extension {
            if !constant::IMAGE_DYNAMIC_FORMATS.iter().any(|e| e == &ext) {
                return Err(SageError::ImageExtensionError);
            }

            if self.channels() == 4 && !constant::IMAGE_ALPHA_FORMATS.iter().any(|e| e == &ext) {
                return Err(SageError::ImageError(
                    "Images with an alpha channel must be saved in a format supporting transparency (e.g. png).",
                ));
            }

            return self
                .to_dynamic()?
                .save(path)
                .map_err(|_| SageError::ImageWriteError);
        }

        Err(SageError::ImageExtensionError)
    }
}

// <<< I/O METHODS

// >>> PROPERTY METHODS

impl_enum_dispatch!(SageImage, U8, F32; width(&self) -> u32);
impl_enum_dispatch!(SageImage, U8, F32; height(&self) -> u32);
impl_enum_dispatch!(SageImage, U8, F32; channels(&self) -> u32);
impl_enum_dispatch!(SageImage, U8, F32; shape(&self) -> (u32, u32, u32));
impl_enum_dispatch!(SageImage, U8, F32; len(&self) -> usize);
impl_enum_dispatch!(SageImage, U8, F32; is_empty(&self) -> bool);

impl SageImage {
    /// Borrow the underlying 8-bit RGB buffer of a pipeline input
    pub fn as_rgb8(&self) -> Result<&SageRgb, SageError> {
        match self {
            SageImage::U8(buffer) if buffer.channels() == 3 => Ok(buffer),
            _ => Err(SageError::ImageError(
                "Segmentation inputs must be 3-channel 8-bit RGB images.",
            )),
        }
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl_enum_dispatch!(SageImage, U8, F32; to_u8(&self) -> Vec<u8>);
impl_enum_dispatch!(SageImage, U8, F32; to_f32(&self) -> Vec<f32>);

// <<< CONVERSION METHODS

// >>> TRANSFORM METHODS

impl SageImage {
    /// Create a new image with copied cropped contents
    ///
    /// # Arguments
    ///
    /// * `x` - Minimum x-coordinate (left)
    /// * `y` - Minimum y-coordinate (top)
    /// * `w` - Width of crop
    /// * `h` - Height of crop
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Result<SageImage, SageError> {
        match self {
            SageImage::U8(buffer) => Ok(SageImage::U8(buffer.crop(x, y, w, h)?)),
            SageImage::F32(buffer) => Ok(SageImage::F32(buffer.crop(x, y, w, h)?)),
        }
    }

    /// Resize an 8-bit RGB image
    ///
    /// # Arguments
    ///
    /// * `width` - Width of resized image
    /// * `height` - Height of resized image
    pub fn resize(&self, width: u32, height: u32) -> Result<SageImage, SageError> {
        let buffer = self.as_rgb8()?;

        if buffer.width() == width && buffer.height() == height {
            return Ok(self.clone());
        }

        let source = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(
            buffer.width(),
            buffer.height(),
            buffer.as_raw().to_vec(),
        )
        .ok_or(SageError::ImageError("Failed to resize image."))?;

        Ok(SageImage::U8(SageBuffer::new(
            width,
            height,
            3,
            transform::resize_bilinear_fast(
                &DynamicImage::ImageRgb8(source),
                width,
                height,
                PixelType::U8x3,
            )?,
        )?))
    }
}

// <<< TRANSFORM METHODS

/// Scale a value in [0, 1] to an 8-bit intensity
fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
