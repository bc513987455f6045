// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use rand::Rng;

use crate::constant::{ALPHA_OPAQUE, AUTOMATIC_BLEND, PROMPTED_BLEND};
use crate::error::SageError;
use crate::im::{MaskRecord, SageBuffer, SageImage, SageMask, SageRgb};

/// Draw a random RGB color with every component in [0, 1)
pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> [f32; 3] {
    [
        rng.gen_range(0.0f32..1.0),
        rng.gen_range(0.0f32..1.0),
        rng.gen_range(0.0f32..1.0),
    ]
}

/// Overlay masks from automatic segmentation onto an RGB image
///
/// Records are stably sorted by area in descending order and painted onto
/// a black canvas with one random color each, so smaller masks stay
/// visible on top of the larger masks they overlap. The canvas is blended
/// equally with the original image. When no record covers a single pixel
/// the original image is returned unchanged.
///
/// # Arguments
///
/// * `image` - An 8-bit RGB image
/// * `records` - Candidate masks with their areas, in any order
/// * `rng` - Source of the per-mask colors
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use sage_core::cv::overlay_automatic;
/// use sage_core::im::{MaskRecord, SageBuffer, SageImage, SageMask};
///
/// let image = SageImage::U8(SageBuffer::filled(8, 8, 3, 0u8));
/// let records = vec![MaskRecord::new(SageMask::from_box(8, 8, [0., 0., 3., 3.]))];
///
/// let mut rng = StdRng::seed_from_u64(0);
/// let overlay = overlay_automatic(&image, &records, &mut rng).unwrap();
///
/// assert_eq!(overlay.shape(), (8, 8, 3));
/// ```
pub fn overlay_automatic<R: Rng + ?Sized>(
    image: &SageImage,
    records: &[MaskRecord],
    rng: &mut R,
) -> Result<SageImage, SageError> {
    let original = image.as_rgb8()?;

    for record in records {
        check_mask_shape(original, &record.mask)?;
    }

    if records.iter().all(|record| record.mask.is_blank()) {
        return Ok(image.clone());
    }

    let mut ordered: Vec<&MaskRecord> = records.iter().collect();
    ordered.sort_by(|a, b| b.area.cmp(&a.area));

    let mut canvas = SageBuffer::filled(original.width(), original.height(), 3, 0f32);
    for record in ordered {
        paint(&mut canvas, &record.mask, random_color(rng));
    }

    blend(original, &canvas, AUTOMATIC_BLEND)
}

/// Overlay masks from prompted segmentation onto an RGB image
///
/// Masks are painted in input order onto a white canvas, one random color
/// each, with later masks winning where they overlap. Returns the blended
/// overlay together with the color canvas itself, which is the mask
/// artifact of a prompted request.
///
/// # Arguments
///
/// * `image` - An 8-bit RGB image
/// * `masks` - One mask per box prompt
/// * `rng` - Source of the per-mask colors
pub fn overlay_prompted<R: Rng + ?Sized>(
    image: &SageImage,
    masks: &[SageMask],
    rng: &mut R,
) -> Result<(SageImage, SageImage), SageError> {
    let original = image.as_rgb8()?;

    for mask in masks {
        check_mask_shape(original, mask)?;
    }

    let mut canvas = SageBuffer::filled(original.width(), original.height(), 3, 1f32);
    for mask in masks {
        paint(&mut canvas, mask, random_color(rng));
    }

    let overlay = blend(original, &canvas, PROMPTED_BLEND)?;

    Ok((overlay, SageImage::F32(canvas)))
}

/// Keep only the pixels covered by at least one mask
///
/// Covered pixels carry the original RGB values and an opaque alpha.
/// Every other pixel is fully transparent black.
///
/// # Examples
///
/// ```
/// use sage_core::cv::segment_alpha;
/// use sage_core::im::{SageBuffer, SageImage, SageMask};
///
/// let image = SageImage::U8(SageBuffer::filled(2, 1, 3, 50u8));
/// let mask = SageMask::new(2, 1, vec![false, true]).unwrap();
///
/// let segmented = segment_alpha(&image, &[mask]).unwrap();
/// assert_eq!(segmented.to_u8(), vec![0, 0, 0, 0, 50, 50, 50, 255]);
/// ```
pub fn segment_alpha(image: &SageImage, masks: &[SageMask]) -> Result<SageImage, SageError> {
    let original = image.as_rgb8()?;

    for mask in masks {
        check_mask_shape(original, mask)?;
    }

    let mut segmented = SageBuffer::filled(original.width(), original.height(), 4, 0u8);

    for (idx, (pixel, rgb)) in segmented
        .iter_pixels_mut()
        .zip(original.iter_pixels())
        .enumerate()
    {
        if masks.iter().any(|mask| mask.as_raw()[idx]) {
            pixel[..3].copy_from_slice(rgb);
            pixel[3] = ALPHA_OPAQUE;
        }
    }

    Ok(SageImage::U8(segmented))
}

fn check_mask_shape(image: &SageRgb, mask: &SageMask) -> Result<(), SageError> {
    if mask.shape() != (image.height(), image.width()) {
        return Err(SageError::MaskError(
            "Mask dimensions do not match the image.",
        ));
    }

    Ok(())
}

fn paint(canvas: &mut SageBuffer<f32, Vec<f32>>, mask: &SageMask, color: [f32; 3]) {
    for (pixel, &covered) in canvas.iter_pixels_mut().zip(mask.iter()) {
        if covered {
            pixel.copy_from_slice(&color);
        }
    }
}

fn blend(
    original: &SageRgb,
    canvas: &SageBuffer<f32, Vec<f32>>,
    (w_original, w_canvas): (f32, f32),
) -> Result<SageImage, SageError> {
    let blended = original
        .iter()
        .zip(canvas.iter())
        .map(|(&v, &c)| (v as f32 / 255.0) * w_original + c * w_canvas)
        .collect();

    Ok(SageImage::F32(SageBuffer::new(
        original.width(),
        original.height(),
        3,
        blended,
    )?))
}

#[cfg(test)]
mod test {

    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn gradient(width: u32, height: u32) -> SageImage {
        let data = (0..width * height * 3).map(|v| (v % 256) as u8).collect();
        SageImage::U8(SageBuffer::new(width, height, 3, data).unwrap())
    }

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn test_random_color_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert!(random_color(&mut rng).iter().all(|c| (0.0..1.0).contains(c)));
        }
    }

    #[test]
    fn test_automatic_identity_empty_set() {
        let image = gradient(6, 4);
        let mut rng = StdRng::seed_from_u64(0);

        let overlay = overlay_automatic(&image, &[], &mut rng).unwrap();
        assert_eq!(overlay, image);
    }

    #[test]
    fn test_automatic_identity_blank_masks() {
        let image = gradient(6, 4);
        let records = vec![
            MaskRecord::new(SageMask::empty(6, 4)),
            MaskRecord::new(SageMask::empty(6, 4)),
        ];
        let mut rng = StdRng::seed_from_u64(0);

        let overlay = overlay_automatic(&image, &records, &mut rng).unwrap();
        assert_eq!(overlay, image);
    }

    #[test]
    fn test_automatic_smaller_mask_on_top() {
        let image = SageImage::U8(SageBuffer::filled(10, 10, 3, 0u8));

        let small = MaskRecord::new(SageMask::from_box(10, 10, [2., 2., 3., 3.]));
        let large = MaskRecord::new(SageMask::from_box(10, 10, [0., 0., 6., 6.]));

        // Smaller record given first, painted last
        let records = vec![small, large];

        let mut rng = StdRng::seed_from_u64(42);
        let overlay = overlay_automatic(&image, &records, &mut rng).unwrap();

        let mut replay = StdRng::seed_from_u64(42);
        let large_color = random_color(&mut replay);
        let small_color = random_color(&mut replay);

        let SageImage::F32(overlay) = overlay else {
            panic!("automatic overlay should be a float image");
        };

        let halve = |c: [f32; 3]| [c[0] * 0.5, c[1] * 0.5, c[2] * 0.5];

        assert!(close(overlay.pixel(2, 2).unwrap(), &halve(small_color)));
        assert!(close(overlay.pixel(5, 5).unwrap(), &halve(large_color)));
        assert!(close(overlay.pixel(9, 9).unwrap(), &[0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_automatic_blend_weights() {
        let image = SageImage::U8(SageBuffer::filled(3, 3, 3, 255u8));
        let records = vec![MaskRecord::new(SageMask::from_box(3, 3, [0., 0., 0., 0.]))];

        let mut rng = StdRng::seed_from_u64(3);
        let overlay = overlay_automatic(&image, &records, &mut rng).unwrap();

        let color = random_color(&mut StdRng::seed_from_u64(3));
        let SageImage::F32(overlay) = overlay else {
            panic!("automatic overlay should be a float image");
        };

        let expected: Vec<f32> = color.iter().map(|c| 0.5 + 0.5 * c).collect();
        assert!(close(overlay.pixel(0, 0).unwrap(), &expected));
        assert!(close(overlay.pixel(1, 1).unwrap(), &[0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_automatic_mask_shape_mismatch() {
        let image = gradient(6, 4);
        let records = vec![MaskRecord::new(SageMask::empty(4, 6))];
        let mut rng = StdRng::seed_from_u64(0);

        assert!(overlay_automatic(&image, &records, &mut rng).is_err());
    }

    #[test]
    fn test_prompted_later_mask_wins() {
        let image = SageImage::U8(SageBuffer::filled(8, 8, 3, 0u8));
        let first = SageMask::from_box(8, 8, [0., 0., 4., 4.]);
        let second = SageMask::from_box(8, 8, [3., 3., 7., 7.]);

        let mut rng = StdRng::seed_from_u64(11);
        let (overlay, canvas) = overlay_prompted(&image, &[first, second], &mut rng).unwrap();

        let mut replay = StdRng::seed_from_u64(11);
        let first_color = random_color(&mut replay);
        let second_color = random_color(&mut replay);

        let SageImage::F32(canvas) = canvas else {
            panic!("mask canvas should be a float image");
        };

        assert!(close(canvas.pixel(0, 0).unwrap(), &first_color));
        assert!(close(canvas.pixel(4, 4).unwrap(), &second_color));
        assert!(close(canvas.pixel(0, 7).unwrap(), &[1.0, 1.0, 1.0]));

        let SageImage::F32(overlay) = overlay else {
            panic!("prompted overlay should be a float image");
        };

        let expected: Vec<f32> = second_color.iter().map(|c| c * 0.7).collect();
        assert!(close(overlay.pixel(7, 7).unwrap(), &expected));
        assert!(close(overlay.pixel(7, 0).unwrap(), &[0.7, 0.7, 0.7]));
    }

    #[test]
    fn test_prompted_no_masks() {
        let image = SageImage::U8(SageBuffer::filled(2, 2, 3, 255u8));
        let mut rng = StdRng::seed_from_u64(0);

        let (overlay, canvas) = overlay_prompted(&image, &[], &mut rng).unwrap();

        assert!(overlay.to_f32().iter().all(|v| (v - 1.0).abs() < 1e-6));
        assert!(canvas.to_f32().iter().all(|v| *v == 1.0));
    }

    #[test]
    fn test_segment_alpha_coverage() {
        let image = gradient(5, 5);
        let a = SageMask::from_fn(5, 5, |x, _| x == 0);
        let b = SageMask::from_fn(5, 5, |_, y| y == 4);

        let segmented = segment_alpha(&image, &[a.clone(), b.clone()]).unwrap();
        let SageImage::U8(segmented) = segmented else {
            panic!("segmented image should be an 8-bit image");
        };

        assert_eq!(segmented.channels(), 4);

        let original = image.as_rgb8().unwrap();
        for y in 0..5 {
            for x in 0..5 {
                let pixel = segmented.pixel(x, y).unwrap();
                if a.get(x, y) || b.get(x, y) {
                    assert_eq!(pixel[3], 255);
                    assert_eq!(&pixel[..3], original.pixel(x, y).unwrap());
                } else {
                    assert_eq!(pixel, &[0, 0, 0, 0]);
                }
            }
        }
    }

    #[test]
    fn test_segment_alpha_rejects_non_rgb() {
        let image = SageImage::U8(SageBuffer::filled(2, 2, 4, 0u8));
        assert!(segment_alpha(&image, &[]).is_err());
    }
}
