// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use rand::Rng;

use crate::cv::{cutout, overlay_automatic, overlay_prompted, segment_alpha};
use crate::error::SageError;
use crate::im::{SageImage, SageMask};
use crate::pr::{PromptSet, decode_annotations};
use crate::sg::ReleaseGuard;
use crate::sg::SegmentationPort;

/// Artifacts derived from a prompted segmentation request
#[derive(Debug, Clone, PartialEq)]
pub struct PromptedOutput {
    /// Decoded prompts that drove the request
    pub prompts: PromptSet,
    /// Masks returned by the backend, one per box
    pub masks: Vec<SageMask>,
    /// Original image blended with the mask colors
    pub overlay: SageImage,
    /// Mask colors painted on a white canvas
    pub mask: SageImage,
    /// Original pixels under any mask, transparent elsewhere
    pub segmented: SageImage,
    /// Segmented image cropped to its opaque pixels
    pub cutout: SageImage,
}

/// Segment every object in an image and overlay the masks
///
/// The backend is released once inference returns, whether or not it
/// succeeded.
///
/// # Arguments
///
/// * `port` - A segmentation backend
/// * `image` - An 8-bit RGB image
/// * `rng` - Source of the per-mask colors
pub fn segment_everything<P, R>(
    port: &mut P,
    image: &SageImage,
    rng: &mut R,
) -> Result<SageImage, SageError>
where
    P: SegmentationPort + ?Sized,
    R: Rng + ?Sized,
{
    image.as_rgb8()?;

    let records = {
        let mut port = ReleaseGuard::new(port);
        port.segment_automatic(image)?
    };

    for record in records.iter() {
        check_backend_mask(image, &record.mask)?;
    }

    overlay_automatic(image, &records, rng)
}

/// Segment the objects selected by annotation records
///
/// Records are decoded into prompts first, so a malformed record aborts the
/// request before the backend is touched. The backend is only called when at
/// least one box was decoded and is released once inference returns. Without
/// any segmented pixel the request fails with `EmptySelection`.
///
/// # Arguments
///
/// * `port` - A segmentation backend
/// * `image` - An 8-bit RGB image
/// * `records` - Flat `(x1, y1, kind, x2, y2, stroke)` annotation records
/// * `rng` - Source of the per-mask colors
pub fn segment_from_prompts<P, R, A>(
    port: &mut P,
    image: &SageImage,
    records: &[A],
    rng: &mut R,
) -> Result<PromptedOutput, SageError>
where
    P: SegmentationPort + ?Sized,
    R: Rng + ?Sized,
    A: AsRef<[f32]>,
{
    image.as_rgb8()?;

    let prompts = decode_annotations(records, image.height(), image.width())?;

    let masks = if prompts.boxes.is_empty() {
        Vec::new()
    } else {
        let mut port = ReleaseGuard::new(port);
        port.segment_from_prompts(image, &prompts.boxes, &prompts.positive, &prompts.negative)?
    };

    if masks.len() != prompts.boxes.len() {
        return Err(SageError::SegmentationFailure(format!(
            "Expected {} masks but the backend returned {}.",
            prompts.boxes.len(),
            masks.len()
        )));
    }

    for mask in masks.iter() {
        check_backend_mask(image, mask)?;
    }

    let (overlay, mask) = overlay_prompted(image, &masks, rng)?;
    let segmented = segment_alpha(image, &masks)?;
    let cutout = cutout(&segmented)?;

    Ok(PromptedOutput {
        prompts,
        masks,
        overlay,
        mask,
        segmented,
        cutout,
    })
}

fn check_backend_mask(image: &SageImage, mask: &SageMask) -> Result<(), SageError> {
    if mask.shape() != (image.height(), image.width()) {
        return Err(SageError::SegmentationFailure(format!(
            "Mask of shape {:?} does not match image of shape {:?}.",
            mask.shape(),
            (image.height(), image.width())
        )));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod test {

    use super::*;
    use crate::im::{MaskRecord, SageBuffer};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Backend returning box-shaped masks and counting releases
    #[derive(Default)]
    pub(crate) struct BoxPort {
        pub records: Vec<MaskRecord>,
        pub fail: bool,
        pub calls: usize,
        pub released: usize,
        pub points_seen: usize,
    }

    impl SegmentationPort for BoxPort {
        fn segment_automatic(&mut self, _: &SageImage) -> Result<Vec<MaskRecord>, SageError> {
            self.calls += 1;
            if self.fail {
                return Err(SageError::SegmentationFailure("out of memory".to_string()));
            }

            Ok(self.records.clone())
        }

        fn segment_from_prompts(
            &mut self,
            image: &SageImage,
            boxes: &[[f32; 4]],
            positive: &[[f32; 2]],
            negative: &[[f32; 2]],
        ) -> Result<Vec<SageMask>, SageError> {
            self.calls += 1;
            self.points_seen = positive.len() + negative.len();
            if self.fail {
                return Err(SageError::SegmentationFailure("out of memory".to_string()));
            }

            Ok(boxes
                .iter()
                .map(|&xyxy| SageMask::from_box(image.width(), image.height(), xyxy))
                .collect())
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    fn black(width: u32, height: u32) -> SageImage {
        SageImage::U8(SageBuffer::filled(width, height, 3, 0u8))
    }

    #[test]
    fn test_prompted_single_box() {
        let image = black(100, 100);
        let mut port = BoxPort::default();
        let mut rng = StdRng::seed_from_u64(0);

        let output =
            segment_from_prompts(&mut port, &image, &[[10f32, 10., 2., 40., 40., 3.]], &mut rng)
                .unwrap();

        assert_eq!(output.masks.len(), 1);
        assert_eq!(output.overlay.shape(), (100, 100, 3));
        assert_eq!(output.mask.shape(), (100, 100, 3));
        assert_eq!(output.segmented.shape(), (100, 100, 4));
        assert_eq!(output.cutout.shape(), (31, 31, 4));
        assert!(output.cutout.to_u8().chunks_exact(4).all(|p| p[3] == 255));

        assert_eq!((port.calls, port.released), (1, 1));
    }

    #[test]
    fn test_prompted_points_forwarded_to_port() {
        let image = black(20, 20);
        let mut port = BoxPort::default();
        let mut rng = StdRng::seed_from_u64(0);

        let records = vec![
            vec![2f32, 2., 2., 8., 8., 3.],
            vec![4., 4., 1., 0., 0., 4.],
            vec![9., 9., 0., 0., 0., 4.],
        ];

        let output = segment_from_prompts(&mut port, &image, &records, &mut rng).unwrap();

        assert_eq!(port.points_seen, 2);
        assert_eq!(output.prompts.len(), 3);
    }

    #[test]
    fn test_prompted_no_boxes_skips_backend() {
        let image = black(20, 20);
        let mut port = BoxPort::default();
        let mut rng = StdRng::seed_from_u64(0);

        let result = segment_from_prompts(&mut port, &image, &[[4f32, 4., 1., 0., 0., 4.]], &mut rng);

        assert_eq!(result.unwrap_err(), SageError::EmptySelection);
        assert_eq!((port.calls, port.released), (0, 0));
    }

    #[test]
    fn test_prompted_invalid_annotation_skips_backend() {
        let image = black(20, 20);
        let mut port = BoxPort::default();
        let mut rng = StdRng::seed_from_u64(0);

        let records = vec![vec![2f32, 2., 2., 8., 8., 3.], vec![1., 1.]];
        let result = segment_from_prompts(&mut port, &image, &records, &mut rng);

        assert!(matches!(result, Err(SageError::InvalidAnnotation(_))));
        assert_eq!(port.calls, 0);
    }

    #[test]
    fn test_prompted_failure_still_releases() {
        let image = black(20, 20);
        let mut port = BoxPort {
            fail: true,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);

        let result =
            segment_from_prompts(&mut port, &image, &[[2f32, 2., 2., 8., 8., 3.]], &mut rng);

        assert!(matches!(result, Err(SageError::SegmentationFailure(_))));
        assert_eq!((port.calls, port.released), (1, 1));
    }

    #[test]
    fn test_prompted_box_outside_image() {
        let image = black(20, 20);
        let mut port = BoxPort::default();
        let mut rng = StdRng::seed_from_u64(0);

        let result =
            segment_from_prompts(&mut port, &image, &[[50f32, 50., 2., 60., 60., 3.]], &mut rng);

        assert_eq!(result.unwrap_err(), SageError::EmptySelection);
        assert_eq!(port.released, 1);
    }

    #[test]
    fn test_automatic_layers_records() {
        let image = black(10, 10);
        let mut port = BoxPort {
            records: vec![
                MaskRecord::new(SageMask::from_box(10, 10, [0., 0., 1., 1.])),
                MaskRecord::new(SageMask::from_box(10, 10, [0., 0., 5., 5.])),
            ],
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);

        let overlay = segment_everything(&mut port, &image, &mut rng).unwrap();

        assert!(matches!(overlay, SageImage::F32(_)));
        assert_eq!(overlay.shape(), (10, 10, 3));
        assert_eq!(port.released, 1);
    }

    #[test]
    fn test_automatic_no_masks_is_identity() {
        let image = black(10, 10);
        let mut port = BoxPort::default();
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(segment_everything(&mut port, &image, &mut rng).unwrap(), image);
    }

    #[test]
    fn test_automatic_failure_still_releases() {
        let image = black(10, 10);
        let mut port = BoxPort {
            fail: true,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);

        assert!(segment_everything(&mut port, &image, &mut rng).is_err());
        assert_eq!(port.released, 1);
    }

    #[test]
    fn test_automatic_rejects_mismatched_masks() {
        let image = black(10, 10);
        let mut port = BoxPort {
            records: vec![MaskRecord::new(SageMask::empty(5, 5))],
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);

        let result = segment_everything(&mut port, &image, &mut rng);
        assert!(matches!(result, Err(SageError::SegmentationFailure(_))));
    }

    #[test]
    fn test_boxed_port() {
        let image = black(10, 10);
        let mut port: Box<dyn SegmentationPort> = Box::new(BoxPort::default());
        let mut rng = StdRng::seed_from_u64(0);

        let output =
            segment_from_prompts(&mut port, &image, &[[1f32, 1., 2., 3., 3., 3.]], &mut rng)
                .unwrap();
        assert_eq!(output.cutout.shape(), (3, 3, 4));
    }
}
