// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use image::{ImageBuffer, Luma, open as open_dynamic};

use crate::constant;
use crate::error::SageError;

/// A row-major boolean grid marking the pixels occupied by an object
///
/// The length of the grid must be equal to the product of `w` * `h`.
///
/// # Examples
///
/// ```
/// use sage_core::im::SageMask;
///
/// let mask = SageMask::new(2, 2, vec![true, false, false, true]).unwrap();
/// assert_eq!(mask.area(), 2);
///
/// let mask = SageMask::new(2, 2, vec![true, false]);
/// assert!(mask.is_err()); // Mask size does not match dimensions
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SageMask {
    w: u32,
    h: u32,
    data: Vec<bool>,
}

impl SageMask {
    /// Initialize a mask from row-major boolean data
    ///
    /// # Arguments
    ///
    /// * `width` - Mask width
    /// * `height` - Mask height
    /// * `data` - Row-major membership flags
    pub fn new(width: u32, height: u32, data: Vec<bool>) -> Result<SageMask, SageError> {
        if (width as usize) * (height as usize) != data.len() {
            return Err(SageError::MaskError(
                "Mask data does not match provided width and height.",
            ));
        }

        Ok(SageMask {
            w: width,
            h: height,
            data,
        })
    }

    /// Initialize a mask with no object pixels
    pub fn empty(width: u32, height: u32) -> SageMask {
        SageMask {
            w: width,
            h: height,
            data: vec![false; (width as usize) * (height as usize)],
        }
    }

    /// Initialize a mask by evaluating `f(x, y)` at every pixel
    ///
    /// # Examples
    ///
    /// ```
    /// use sage_core::im::SageMask;
    ///
    /// let diagonal = SageMask::from_fn(3, 3, |x, y| x == y);
    /// assert_eq!(diagonal.area(), 3);
    /// ```
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> SageMask
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut data = Vec::with_capacity((width as usize) * (height as usize));

        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }

        SageMask {
            w: width,
            h: height,
            data,
        }
    }

    /// Initialize a mask covering an xyxy box with inclusive corners
    ///
    /// # Arguments
    ///
    /// * `width` - Mask width
    /// * `height` - Mask height
    /// * `xyxy` - Box corners (min_x, min_y, max_x, max_y) in pixels
    pub fn from_box(width: u32, height: u32, xyxy: [f32; 4]) -> SageMask {
        SageMask::from_fn(width, height, |x, y| inside_box(x, y, &xyxy))
    }

    /// Open a mask from a grayscale image, treating non-zero pixels as the object
    ///
    /// ```no_run
    /// use sage_core::im::SageMask;
    /// let mask = SageMask::open("mask.png");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SageMask, SageError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        if let Some(ext) = extension {
            if constant::IMAGE_DYNAMIC_FORMATS.iter().any(|e| e == &ext) {
                let mask = open_dynamic(&path)
                    .map_err(|_| SageError::ImageReadError)?
                    .into_luma8();

                return SageMask::new(
                    mask.width(),
                    mask.height(),
                    mask.into_raw().into_iter().map(|v| v != 0).collect(),
                );
            }
        }

        Err(SageError::ImageExtensionError)
    }

    /// Save the mask as an 8-bit grayscale image (object = 255)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SageError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        if let Some(ext) = extension {
            if constant::IMAGE_DYNAMIC_FORMATS.iter().any(|e| e == &ext) {
                return ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(
                    self.w,
                    self.h,
                    self.data.iter().map(|&m| if m { 255u8 } else { 0u8 }).collect(),
                )
                .ok_or(SageError::ImageWriteError)?
                .save(path)
                .map_err(|_| SageError::ImageWriteError);
            }
        }

        Err(SageError::ImageExtensionError)
    }
}

// >>> PROPERTY METHODS

impl SageMask {
    /// Width of the mask
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Height of the mask
    pub fn height(&self) -> u32 {
        self.h
    }

    /// Shape of the mask as (height, width)
    pub fn shape(&self) -> (u32, u32) {
        (self.h, self.w)
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the mask has no pixels at all
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of object pixels
    pub fn area(&self) -> usize {
        self.data.iter().filter(|&&m| m).count()
    }

    /// Check if no pixel belongs to the object
    pub fn is_blank(&self) -> bool {
        !self.data.iter().any(|&m| m)
    }

    /// Membership of the pixel at column `x` and row `y` (false when out of bounds)
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.w || y >= self.h {
            return false;
        }

        self.data[(y as usize) * (self.w as usize) + (x as usize)]
    }

    /// Inclusive (min_x, min_y, max_x, max_y) bounds of the object pixels
    pub fn bounds(&self) -> Option<[u32; 4]> {
        let mut bounds: Option<[u32; 4]> = None;

        for (idx, _) in self.data.iter().enumerate().filter(|(_, m)| **m) {
            let x = (idx % self.w as usize) as u32;
            let y = (idx / self.w as usize) as u32;

            bounds = Some(match bounds {
                None => [x, y, x, y],
                Some([min_x, min_y, max_x, max_y]) => {
                    [min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)]
                }
            });
        }

        bounds
    }

    /// Intersection over union with another mask of the same shape
    pub fn iou(&self, other: &SageMask) -> f32 {
        if self.shape() != other.shape() {
            return 0.0;
        }

        let mut intersection = 0usize;
        let mut union = 0usize;

        for (&a, &b) in self.data.iter().zip(other.data.iter()) {
            intersection += (a && b) as usize;
            union += (a || b) as usize;
        }

        if union == 0 {
            0.0
        } else {
            intersection as f32 / union as f32
        }
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl SageMask {
    /// Returns a reference to the raw flags
    pub fn as_raw(&self) -> &Vec<bool> {
        &self.data
    }

    /// Returns the raw flags
    pub fn into_raw(self) -> Vec<bool> {
        self.data
    }

    // An iterator over the raw flags
    pub fn iter(&self) -> impl Iterator<Item = &bool> {
        self.data.iter()
    }
}

// <<< CONVERSION METHODS

// >>> TRANSFORM METHODS

impl SageMask {
    /// Remove every object pixel that falls outside an xyxy box
    pub fn clip_to_box(&mut self, xyxy: [f32; 4]) {
        let w = self.w as usize;

        for (idx, m) in self.data.iter_mut().enumerate() {
            if *m && !inside_box((idx % w) as u32, (idx / w) as u32, &xyxy) {
                *m = false;
            }
        }
    }
}

// <<< TRANSFORM METHODS

fn inside_box(x: u32, y: u32, [min_x, min_y, max_x, max_y]: &[f32; 4]) -> bool {
    let (x, y) = (x as f32, y as f32);
    x >= min_x.floor() && x <= max_x.ceil() && y >= min_y.floor() && y <= max_y.ceil()
}

/// A mask discovered by automatic segmentation together with its pixel count
#[derive(Debug, Clone, PartialEq)]
pub struct MaskRecord {
    pub mask: SageMask,
    pub area: usize,
}

impl MaskRecord {
    /// Wrap a mask, computing its area from the object pixels
    pub fn new(mask: SageMask) -> MaskRecord {
        let area = mask.area();
        MaskRecord { mask, area }
    }
}
