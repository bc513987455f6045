// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use fast_image_resize;
use fast_image_resize::{FilterType, PixelType, images::Image};
use image::DynamicImage;

use crate::error::SageError;

/// Resize a 2D u8 image using the SIMD-accelerated fast-image-resize crate
///
/// # Arguments
///
/// * `source` - A DynamicImage with u8 subpixel type
/// * `new_width` - New width following resizing
/// * `new_height` - New height following resizing
/// * `pixel_type` - RGB or RGBA pixel type
pub fn resize_bilinear_fast(
    source: &DynamicImage,
    new_width: u32,
    new_height: u32,
    pixel_type: PixelType,
) -> Result<Vec<u8>, SageError> {
    let mut destination = Image::new(new_width, new_height, pixel_type);

    let mut resizer = fast_image_resize::Resizer::new();
    let option = fast_image_resize::ResizeOptions {
        algorithm: fast_image_resize::ResizeAlg::Convolution(FilterType::Bilinear),
        cropping: fast_image_resize::SrcCropping::None,
        mul_div_alpha: false,
    };

    resizer
        .resize(source, &mut destination, &option)
        .map_err(|_| SageError::ImageError("Failed to resize image."))?;

    Ok(destination.into_vec())
}

/// Dimensions that fit the long side of an image to `target` while keeping aspect
///
/// # Arguments
///
/// * `width` - Current width
/// * `height` - Current height
/// * `target` - Length of the long side after resizing
pub fn long_side_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    let scale = target as f64 / width.max(height).max(1) as f64;

    let new_width = ((width as f64 * scale).round() as u32).clamp(1, target);
    let new_height = ((height as f64 * scale).round() as u32).clamp(1, target);

    (new_width, new_height)
}

#[cfg(test)]
mod test {

    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_resize_bilinear_fast() {
        let source =
            DynamicImage::ImageRgb8(RgbImage::from_fn(8, 4, |x, _| Rgb([x as u8, 0, 255])));

        let resized = resize_bilinear_fast(&source, 4, 2, PixelType::U8x3).unwrap();
        assert_eq!(resized.len(), 4 * 2 * 3);
    }

    #[test]
    fn test_long_side_dimensions() {
        assert_eq!(long_side_dimensions(2048, 1024, 1024), (1024, 512));
        assert_eq!(long_side_dimensions(300, 600, 1024), (512, 1024));
        assert_eq!(long_side_dimensions(1024, 1024, 1024), (1024, 1024));
        assert_eq!(long_side_dimensions(4000, 1, 1024), (1024, 1));
    }
}
