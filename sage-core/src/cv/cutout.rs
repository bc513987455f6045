// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use crate::constant::ALPHA_OPAQUE;
use crate::error::SageError;
use crate::im::SageImage;

/// Inclusive (min_x, min_y, max_x, max_y) bounds of the opaque pixels
///
/// # Arguments
///
/// * `segmented` - An 8-bit RGBA image
pub fn opaque_bounds(segmented: &SageImage) -> Result<Option<[u32; 4]>, SageError> {
    let buffer = match segmented {
        SageImage::U8(buffer) if buffer.channels() == 4 => buffer,
        _ => {
            return Err(SageError::ImageError(
                "Cutouts require a 4-channel 8-bit segmented image.",
            ));
        }
    };

    let width = buffer.width() as usize;
    let mut bounds: Option<[u32; 4]> = None;

    for (idx, _) in buffer
        .iter_pixels()
        .enumerate()
        .filter(|(_, pixel)| pixel[3] == ALPHA_OPAQUE)
    {
        let (x, y) = ((idx % width) as u32, (idx / width) as u32);

        bounds = Some(match bounds {
            None => [x, y, x, y],
            Some([min_x, min_y, max_x, max_y]) => {
                [min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)]
            }
        });
    }

    Ok(bounds)
}

/// Crop a segmented image to the smallest rectangle holding every opaque pixel
///
/// All four channels are kept, so transparent holes inside the rectangle
/// stay transparent. Fails with `EmptySelection` when nothing is opaque.
///
/// # Examples
///
/// ```
/// use sage_core::cv::cutout;
/// use sage_core::im::{SageBuffer, SageImage};
///
/// let mut data = vec![0u8; 3 * 3 * 4];
/// data[4 * 4 + 3] = 255; // center pixel
///
/// let segmented = SageImage::U8(SageBuffer::new(3, 3, 4, data).unwrap());
/// assert_eq!(cutout(&segmented).unwrap().shape(), (1, 1, 4));
///
/// let transparent = SageImage::U8(SageBuffer::filled(3, 3, 4, 0u8));
/// assert!(cutout(&transparent).is_err());
/// ```
pub fn cutout(segmented: &SageImage) -> Result<SageImage, SageError> {
    let [min_x, min_y, max_x, max_y] =
        opaque_bounds(segmented)?.ok_or(SageError::EmptySelection)?;

    segmented.crop(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::cv::segment_alpha;
    use crate::im::{SageBuffer, SageMask};

    #[test]
    fn test_cutout_box_on_black_image() {
        let image = SageImage::U8(SageBuffer::filled(100, 100, 3, 0u8));
        let mask = SageMask::from_box(100, 100, [10., 10., 40., 40.]);

        let segmented = segment_alpha(&image, &[mask]).unwrap();
        let cropped = cutout(&segmented).unwrap();

        assert_eq!(cropped.shape(), (31, 31, 4));

        let SageImage::U8(cropped) = cropped else {
            panic!("cutout should be an 8-bit image");
        };

        assert!(cropped.iter_pixels().all(|pixel| pixel == [0, 0, 0, 255]));
    }

    #[test]
    fn test_cutout_fully_opaque_is_identity() {
        let data = (0..6 * 4 * 4)
            .map(|v| if v % 4 == 3 { 255 } else { v as u8 })
            .collect();
        let segmented = SageImage::U8(SageBuffer::new(6, 4, 4, data).unwrap());

        assert_eq!(cutout(&segmented).unwrap(), segmented);
    }

    #[test]
    fn test_cutout_keeps_holes() {
        let image = SageImage::U8(SageBuffer::filled(10, 10, 3, 9u8));
        let corners = SageMask::from_fn(10, 10, |x, y| (x, y) == (2, 3) || (x, y) == (6, 8));

        let segmented = segment_alpha(&image, &[corners]).unwrap();
        let cropped = cutout(&segmented).unwrap();

        assert_eq!(cropped.shape(), (6, 5, 4));

        let SageImage::U8(cropped) = cropped else {
            panic!("cutout should be an 8-bit image");
        };

        assert_eq!(cropped.pixel(0, 0).unwrap(), [9, 9, 9, 255]);
        assert_eq!(cropped.pixel(4, 5).unwrap(), [9, 9, 9, 255]);
        assert_eq!(cropped.pixel(2, 2).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn test_cutout_empty_selection() {
        let segmented = SageImage::U8(SageBuffer::filled(5, 5, 4, 0u8));
        assert_eq!(cutout(&segmented).unwrap_err(), SageError::EmptySelection);
    }

    #[test]
    fn test_cutout_requires_alpha() {
        let image = SageImage::U8(SageBuffer::filled(5, 5, 3, 255u8));
        assert!(cutout(&image).is_err());
    }
}
