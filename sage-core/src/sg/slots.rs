// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use rand::Rng;

use crate::error::SageError;
use crate::im::SageImage;
use crate::sg::{PromptedOutput, SegmentationPort, segment_everything, segment_from_prompts};

/// Input and output of the automatic pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutomaticSlots {
    pub input: Option<SageImage>,
    pub output: Option<SageImage>,
}

impl AutomaticSlots {
    pub fn new(input: SageImage) -> Self {
        AutomaticSlots {
            input: Some(input),
            output: None,
        }
    }

    /// Run the automatic pipeline on the input slot
    ///
    /// Every slot is cleared when the request fails.
    pub fn run<P, R>(&mut self, port: &mut P, rng: &mut R) -> Result<&SageImage, SageError>
    where
        P: SegmentationPort + ?Sized,
        R: Rng + ?Sized,
    {
        let input = self
            .input
            .as_ref()
            .ok_or(SageError::ImageError("No input image was provided."))?;

        match segment_everything(port, input, rng) {
            Ok(output) => Ok(self.output.insert(output)),
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    /// Clear every slot
    pub fn reset(&mut self) {
        *self = AutomaticSlots::default();
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none()
    }
}

/// Inputs and outputs of the prompted pipeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptedSlots {
    pub input: Option<SageImage>,
    pub annotations: Vec<Vec<f32>>,
    pub overlay: Option<SageImage>,
    pub mask: Option<SageImage>,
    pub segmented: Option<SageImage>,
    pub cutout: Option<SageImage>,
}

impl PromptedSlots {
    pub fn new(input: SageImage, annotations: Vec<Vec<f32>>) -> Self {
        PromptedSlots {
            input: Some(input),
            annotations,
            ..Default::default()
        }
    }

    /// Run the prompted pipeline on the input and annotation slots
    ///
    /// On success the four output slots are filled. Every slot is cleared
    /// when the request fails.
    pub fn run<P, R>(&mut self, port: &mut P, rng: &mut R) -> Result<PromptedOutput, SageError>
    where
        P: SegmentationPort + ?Sized,
        R: Rng + ?Sized,
    {
        let input = self
            .input
            .as_ref()
            .ok_or(SageError::ImageError("No input image was provided."))?;

        match segment_from_prompts(port, input, &self.annotations, rng) {
            Ok(output) => {
                self.overlay = Some(output.overlay.clone());
                self.mask = Some(output.mask.clone());
                self.segmented = Some(output.segmented.clone());
                self.cutout = Some(output.cutout.clone());
                Ok(output)
            }
            Err(err) => {
                self.reset();
                Err(err)
            }
        }
    }

    /// Clear every slot
    pub fn reset(&mut self) {
        *self = PromptedSlots::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == PromptedSlots::default()
    }
}
