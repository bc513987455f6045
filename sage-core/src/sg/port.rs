// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::ops::{Deref, DerefMut};

use crate::error::SageError;
use crate::im::{MaskRecord, SageImage, SageMask};

/// A segmentation backend turning an image and prompt geometry into masks
///
/// Implementors are free to cache per-image state (e.g. an embedding on an
/// accelerator) between calls. Any such state must be dropped in `release`,
/// which the pipelines call after every inference, including failed ones.
pub trait SegmentationPort {
    /// Propose unordered candidate masks covering the objects in an image
    fn segment_automatic(&mut self, image: &SageImage) -> Result<Vec<MaskRecord>, SageError>;

    /// Produce exactly one mask per box, aligned by index
    ///
    /// Point prompts are accepted but backends may ignore them when boxes
    /// are present.
    ///
    /// # Arguments
    ///
    /// * `image` - An 8-bit RGB image
    /// * `boxes` - Boxes in xyxy pixel coordinates
    /// * `positive` - Foreground points in xy pixel coordinates
    /// * `negative` - Background points in xy pixel coordinates
    fn segment_from_prompts(
        &mut self,
        image: &SageImage,
        boxes: &[[f32; 4]],
        positive: &[[f32; 2]],
        negative: &[[f32; 2]],
    ) -> Result<Vec<SageMask>, SageError>;

    /// Free any resources held for the last image
    fn release(&mut self) {}
}

impl<P: SegmentationPort + ?Sized> SegmentationPort for Box<P> {
    fn segment_automatic(&mut self, image: &SageImage) -> Result<Vec<MaskRecord>, SageError> {
        (**self).segment_automatic(image)
    }

    fn segment_from_prompts(
        &mut self,
        image: &SageImage,
        boxes: &[[f32; 4]],
        positive: &[[f32; 2]],
        negative: &[[f32; 2]],
    ) -> Result<Vec<SageMask>, SageError> {
        (**self).segment_from_prompts(image, boxes, positive, negative)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Borrow of a backend that is released when the borrow ends
///
/// # Examples
///
/// ```
/// use sage_core::error::SageError;
/// use sage_core::im::{MaskRecord, SageImage, SageMask};
/// use sage_core::sg::{ReleaseGuard, SegmentationPort};
///
/// struct Counter(usize);
///
/// impl SegmentationPort for Counter {
///     fn segment_automatic(&mut self, _: &SageImage) -> Result<Vec<MaskRecord>, SageError> {
///         Ok(Vec::new())
///     }
///
///     fn segment_from_prompts(
///         &mut self,
///         _: &SageImage,
///         _: &[[f32; 4]],
///         _: &[[f32; 2]],
///         _: &[[f32; 2]],
///     ) -> Result<Vec<SageMask>, SageError> {
///         Ok(Vec::new())
///     }
///
///     fn release(&mut self) {
///         self.0 += 1;
///     }
/// }
///
/// let mut port = Counter(0);
/// {
///     let _guard = ReleaseGuard::new(&mut port);
/// }
/// assert_eq!(port.0, 1);
/// ```
pub struct ReleaseGuard<'a, P: SegmentationPort + ?Sized> {
    port: &'a mut P,
}

impl<'a, P: SegmentationPort + ?Sized> ReleaseGuard<'a, P> {
    pub fn new(port: &'a mut P) -> Self {
        ReleaseGuard { port }
    }
}

impl<P: SegmentationPort + ?Sized> Deref for ReleaseGuard<'_, P> {
    type Target = P;

    fn deref(&self) -> &P {
        self.port
    }
}

impl<P: SegmentationPort + ?Sized> DerefMut for ReleaseGuard<'_, P> {
    fn deref_mut(&mut self) -> &mut P {
        self.port
    }
}

impl<P: SegmentationPort + ?Sized> Drop for ReleaseGuard<'_, P> {
    fn drop(&mut self) {
        self.port.release();
    }
}
