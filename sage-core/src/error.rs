// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SageError {
    InvalidAnnotation(String),
    SegmentationFailure(String),
    EmptySelection,
    AnnotationReadError,
    BufferSizeError,
    ImageError(&'static str),
    ImageReadError,
    ImageWriteError,
    ImageExtensionError,
    MaskError(&'static str),
    NoFileError(String),
    DirError(String),
    OtherError(String),
}

impl fmt::Display for SageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SageError::InvalidAnnotation(message) => {
                write!(
                    f,
                    "[sage::InvalidAnnotation] Annotation record is malformed. {}",
                    message
                )
            }
            SageError::SegmentationFailure(message) => {
                write!(
                    f,
                    "[sage::SegmentationFailure] Segmentation backend failed to produce masks. {}",
                    message
                )
            }
            SageError::EmptySelection => {
                write!(
                    f,
                    "[sage::EmptySelection] No objects found in the image. No pixels were segmented."
                )
            }
            SageError::AnnotationReadError => {
                write!(
                    f,
                    "[sage::AnnotationReadError] Annotation records could not be read."
                )
            }
            SageError::BufferSizeError => {
                write!(
                    f,
                    "[sage::BufferSizeError] The buffer does not match provided size"
                )
            }
            SageError::ImageError(message) => {
                write!(f, "[sage::ImageError] Failed to create image. {}", message)
            }
            SageError::ImageReadError => {
                write!(f, "[sage::ImageReadError] Failed to read image.")
            }
            SageError::ImageWriteError => {
                write!(f, "[sage::ImageWriteError] Failed to write image.")
            }
            SageError::ImageExtensionError => {
                write!(
                    f,
                    "[sage::ImageExtensionError] Could not detect a valid image extension for input."
                )
            }
            SageError::MaskError(message) => {
                write!(f, "[sage::MaskError] Failed to create mask. {}", message)
            }
            SageError::NoFileError(message) => {
                write!(
                    f,
                    "[sage::NoFileError] File could not be found. {}.",
                    message
                )
            }
            SageError::DirError(message) => {
                write!(
                    f,
                    "[sage::DirError] Directory could not be created. {}.",
                    message
                )
            }
            SageError::OtherError(message) => {
                write!(f, "[sage::OtherError] Error: {}.", message)
            }
        }
    }
}

impl std::error::Error for SageError {}
