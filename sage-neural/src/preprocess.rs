// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use candle_core::{Device, Result, Tensor};
use candle_transformers::models::segment_anything::sam::IMAGE_SIZE;

use sage_core::cv::transform::long_side_dimensions;
use sage_core::im::SageImage;

/// Convert an 8-bit RGB SageImage to a (3, h, w) u8 tensor
fn to_tensor_rgb(image: &SageImage, device: &Device) -> Result<Tensor> {
    let rgb = image
        .as_rgb8()
        .map_err(|err| candle_core::Error::Msg(err.to_string()))?;

    let (h, w) = (rgb.height() as usize, rgb.width() as usize);

    Tensor::from_vec(rgb.as_raw().clone(), (h, w, 3), device)?
        .permute((2, 0, 1))?
        .contiguous()
}

/// Resize an image so its long side matches the model input size
///
/// Returns the (3, h, w) u8 tensor expected by the image encoder together
/// with the resized (height, width). Normalization and padding happen
/// inside the model.
pub fn preprocess_sam(image: &SageImage, device: &Device) -> Result<(Tensor, (usize, usize))> {
    let target = IMAGE_SIZE as u32;
    let (w, h) = long_side_dimensions(image.width(), image.height(), target);

    let tensor = if image.width() == w && image.height() == h {
        to_tensor_rgb(image, device)?
    } else {
        let resized = image
            .resize(w, h)
            .map_err(|err| candle_core::Error::Msg(err.to_string()))?;
        to_tensor_rgb(&resized, device)?
    };

    Ok((tensor, (h as usize, w as usize)))
}

#[cfg(test)]
mod test {
    use super::*;

    use sage_core::im::SageBuffer;

    #[test]
    fn test_to_tensor_rgb_layout() {
        let buffer: Vec<u8> = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];
        let image = SageImage::U8(SageBuffer::new(2, 2, 3, buffer).unwrap());
        let tensor = to_tensor_rgb(&image, &Device::Cpu).unwrap();

        assert_eq!(tensor.dims(), &[3, 2, 2]);
        assert_eq!(
            tensor.get(0).unwrap().flatten_all().unwrap().to_vec1::<u8>().unwrap(),
            vec![0, 3, 6, 9]
        );
    }

    #[test]
    fn test_to_tensor_rejects_rgba() {
        let image = SageImage::U8(SageBuffer::filled(2, 2, 4, 0u8));
        assert!(to_tensor_rgb(&image, &Device::Cpu).is_err());
    }

    #[test]
    fn test_preprocess_long_side() {
        let image = SageImage::U8(SageBuffer::filled(200, 100, 3, 7u8));
        let (tensor, (h, w)) = preprocess_sam(&image, &Device::Cpu).unwrap();

        assert_eq!(w, IMAGE_SIZE);
        assert_eq!(h, IMAGE_SIZE / 2);
        assert_eq!(tensor.dims(), &[3, h, w]);
    }
}
