// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::iter::Iterator;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::slice::{ChunksExact, ChunksExactMut};

use num::{FromPrimitive, ToPrimitive};

use crate::error::SageError;

/// A row-major container storing an interleaved grid of pixels.
///
/// The struct is generic over the subpixel type `T` and over the container
/// that holds the raw subpixels (e.g. `Vec<T>` or `&[T]`). The container
/// must implement `Deref<Target = [T]>` and its length must be equal to
/// `w` * `h` * `c`. Channel order is RGB (or RGBA when `c` is 4).
///
/// # Examples
///
/// ```
/// use sage_core::im::SageBuffer;
///
/// let width = 10;
/// let height = 10;
/// let channels = 3; // RGB
/// let data = vec![0u8; (width * height * channels) as usize];
///
/// let buffer = SageBuffer::new(width, height, channels, data);
///
/// assert_eq!(buffer.unwrap().len(), (width * height * channels) as usize);
/// ```
///
/// ```
/// use sage_core::im::SageBuffer;
///
/// let data = vec![0u8; 7];
/// let buffer = SageBuffer::new(2, 2, 2, data);
///
/// assert!(buffer.is_err()); // Buffer size does not match dimensions
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SageBuffer<T, Container> {
    w: u32,                   // Width
    h: u32,                   // Height
    c: u32,                   // Channels
    pub buffer: Container,    // Subpixels
    _phantom: PhantomData<T>, // Subpixel type
}

impl<T, Container> SageBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Initializes a buffer from a generic data container
    ///
    /// # Arguments
    ///
    /// * `width` - Image width
    /// * `height` - Image height
    /// * `channels` - Number of channels (3 for RGB, 4 for RGBA)
    /// * `buffer` - A generic container (e.g. `Vec` or slice)
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        buffer: Container,
    ) -> Result<SageBuffer<T, Container>, SageError> {
        if (width as usize) * (height as usize) * (channels as usize) == buffer.len() {
            Ok(SageBuffer {
                w: width,
                h: height,
                c: channels,
                buffer,
                _phantom: PhantomData,
            })
        } else {
            Err(SageError::BufferSizeError)
        }
    }
}

impl<T> SageBuffer<T, Vec<T>>
where
    T: ToPrimitive + FromPrimitive + Clone,
{
    /// Initializes an owned buffer with every subpixel set to `value`
    ///
    /// # Examples
    ///
    /// ```
    /// use sage_core::im::SageBuffer;
    ///
    /// let canvas = SageBuffer::filled(4, 2, 3, 1.0f32);
    /// assert_eq!(canvas.shape(), (2, 4, 3));
    /// assert!(canvas.iter().all(|v| *v == 1.0));
    /// ```
    pub fn filled(width: u32, height: u32, channels: u32, value: T) -> SageBuffer<T, Vec<T>> {
        SageBuffer {
            w: width,
            h: height,
            c: channels,
            buffer: vec![value; (width as usize) * (height as usize) * (channels as usize)],
            _phantom: PhantomData,
        }
    }
}

// >>> PROPERTY METHODS

impl<T, Container> SageBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Width of the image
    pub fn width(&self) -> u32 {
        self.w
    }

    /// Height of the image
    pub fn height(&self) -> u32 {
        self.h
    }

    /// Number of channels in the image
    pub fn channels(&self) -> u32 {
        self.c
    }

    /// Shape of the image as (height, width, channels)
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.h, self.w, self.c)
    }

    /// Number of subpixels
    pub fn len(&self) -> usize {
        (self.w as usize) * (self.h as usize) * (self.c as usize)
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// <<< PROPERTY METHODS

// >>> CONVERSION METHODS

impl<T, Container> SageBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Returns the raw subpixels
    pub fn into_raw(self) -> Container {
        self.buffer
    }

    /// Returns a reference to the raw subpixels
    pub fn as_raw(&self) -> &Container {
        &self.buffer
    }

    /// Cast subpixels to u8 and return the buffer
    pub fn to_u8(&self) -> Vec<u8> {
        self.buffer
            .iter()
            .map(|x| x.to_u8().unwrap_or(0u8))
            .collect()
    }

    /// Cast subpixels to f32 and return the buffer
    pub fn to_f32(&self) -> Vec<f32> {
        self.buffer
            .iter()
            .map(|x| x.to_f32().unwrap_or(0f32))
            .collect()
    }

    // An iterator over the raw buffer
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    // An iterator over pixel-level chunks of the raw buffer
    pub fn iter_pixels(&self) -> ChunksExact<'_, T> {
        self.buffer.chunks_exact(self.channels() as usize)
    }

    /// Subpixels of the pixel at column `x` and row `y`
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[T]> {
        if x >= self.w || y >= self.h {
            return None;
        }

        let c = self.c as usize;
        let start = ((y as usize) * (self.w as usize) + (x as usize)) * c;

        Some(&self.buffer[start..start + c])
    }
}

impl<T, Container> SageBuffer<T, Container>
where
    T: ToPrimitive + FromPrimitive,
    Container: DerefMut<Target = [T]>,
{
    // A mutable iterator over pixel-level chunks of the raw buffer
    pub fn iter_pixels_mut(&mut self) -> ChunksExactMut<'_, T> {
        let c = self.c as usize;
        self.buffer.chunks_exact_mut(c)
    }
}

// <<< CONVERSION METHODS

// >>> TRANSFORM METHODS

impl<T, Container> SageBuffer<T, Container>
where
    T: Clone + ToPrimitive + FromPrimitive,
    Container: Deref<Target = [T]>,
{
    /// Create a new owned buffer with copied cropped contents
    ///
    /// # Arguments
    ///
    /// * `x` - Minimum x-coordinate (left column)
    /// * `y` - Minimum y-coordinate (top row)
    /// * `w` - Width of crop
    /// * `h` - Height of crop
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Result<SageBuffer<T, Vec<T>>, SageError> {
        if x as u64 + w as u64 > self.w as u64 || y as u64 + h as u64 > self.h as u64 {
            return Err(SageError::ImageError("Cropping coordinates out of bounds"));
        }

        let c = self.c as usize;
        let row_width = self.w as usize;

        let mut cropped = Vec::with_capacity((w as usize) * (h as usize) * c);

        for row in y..y + h {
            let start = ((row as usize) * row_width + (x as usize)) * c;
            let end = start + (w as usize) * c;
            cropped.extend_from_slice(&self.buffer[start..end]);
        }

        SageBuffer::new(w, h, self.c, cropped)
    }
}

// <<< TRANSFORM METHODS
