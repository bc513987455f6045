// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constant::{
    ANNOTATION_ARITY, KIND_BOX, KIND_NEGATIVE_POINT, KIND_POSITIVE_POINT, STROKE_BOX_DRAG,
    STROKE_POINT_CLICK,
};
use crate::error::SageError;

/// A single user hint steering segmentation, in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prompt {
    Positive { x: f32, y: f32 },
    Negative { x: f32, y: f32 },
    Box { xyxy: [f32; 4] },
}

impl Prompt {
    /// Classify one flat `(x1, y1, kind, x2, y2, stroke)` annotation record
    ///
    /// Returns `Ok(None)` when the kind and stroke codes do not form one of
    /// the recognized pairs. Such records are dropped rather than guessed.
    ///
    /// # Examples
    ///
    /// ```
    /// use sage_core::pr::Prompt;
    ///
    /// let point = Prompt::from_record(&[10., 10., 1., 0., 0., 4.]).unwrap();
    /// assert_eq!(point, Some(Prompt::Positive { x: 10., y: 10. }));
    ///
    /// let mismatched = Prompt::from_record(&[1., 1., 1., 0., 0., 3.]).unwrap();
    /// assert_eq!(mismatched, None);
    ///
    /// assert!(Prompt::from_record(&[1., 1., 1.]).is_err());
    /// ```
    pub fn from_record(record: &[f32]) -> Result<Option<Prompt>, SageError> {
        let [x1, y1, kind, x2, y2, stroke]: [f32; ANNOTATION_ARITY] =
            record.try_into().map_err(|_| {
                SageError::InvalidAnnotation(format!(
                    "Expected {} values per record but found {}.",
                    ANNOTATION_ARITY,
                    record.len()
                ))
            })?;

        if record.iter().any(|v| !v.is_finite()) {
            return Err(SageError::InvalidAnnotation(
                "Records must only contain finite values.".to_string(),
            ));
        }

        let prompt = if kind == KIND_POSITIVE_POINT && stroke == STROKE_POINT_CLICK {
            Some(Prompt::Positive { x: x1, y: y1 })
        } else if kind == KIND_NEGATIVE_POINT && stroke == STROKE_POINT_CLICK {
            Some(Prompt::Negative { x: x1, y: y1 })
        } else if kind == KIND_BOX && stroke == STROKE_BOX_DRAG {
            Some(Prompt::Box {
                xyxy: [x1, y1, x2, y2],
            })
        } else {
            None
        };

        Ok(prompt)
    }
}

/// Positive points, negative points, and boxes referring to one image
///
/// Boxes are stored in xyxy format. Corners are expected to already be
/// ordered min to max and are kept as provided.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptSet {
    pub height: u32,
    pub width: u32,
    pub positive: Vec<[f32; 2]>,
    pub negative: Vec<[f32; 2]>,
    pub boxes: Vec<[f32; 4]>,
}

impl PromptSet {
    /// An empty prompt set for an image of the given size
    pub fn new(height: u32, width: u32) -> Self {
        PromptSet {
            height,
            width,
            ..Default::default()
        }
    }

    /// Add a decoded prompt to the matching collection
    pub fn push(&mut self, prompt: Prompt) {
        match prompt {
            Prompt::Positive { x, y } => self.positive.push([x, y]),
            Prompt::Negative { x, y } => self.negative.push([x, y]),
            Prompt::Box { xyxy } => self.boxes.push(xyxy),
        }
    }

    /// Total number of prompts
    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len() + self.boxes.len()
    }

    /// Check if no prompt was decoded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if any point prompt was decoded
    pub fn has_points(&self) -> bool {
        !self.positive.is_empty() || !self.negative.is_empty()
    }

    /// All prompts as tagged values (positive, then negative, then boxes)
    pub fn prompts(&self) -> Vec<Prompt> {
        self.positive
            .iter()
            .map(|&[x, y]| Prompt::Positive { x, y })
            .chain(self.negative.iter().map(|&[x, y]| Prompt::Negative { x, y }))
            .chain(self.boxes.iter().map(|&xyxy| Prompt::Box { xyxy }))
            .collect()
    }
}

/// Decode raw annotation records into a prompt set
///
/// Every record must have exactly six finite values, otherwise the whole
/// sequence is rejected with `InvalidAnnotation`. Records whose kind and
/// stroke codes do not agree are silently dropped.
///
/// # Arguments
///
/// * `records` - Flat `(x1, y1, kind, x2, y2, stroke)` records
/// * `height` - Height of the annotated image
/// * `width` - Width of the annotated image
///
/// # Examples
///
/// ```
/// use sage_core::pr::decode_annotations;
///
/// let records = vec![
///     vec![10f32, 10., 1., 0., 0., 4.],
///     vec![5., 5., 2., 50., 60., 3.],
/// ];
///
/// let prompts = decode_annotations(&records, 100, 100).unwrap();
/// assert_eq!(prompts.positive, vec![[10., 10.]]);
/// assert_eq!(prompts.boxes, vec![[5., 5., 50., 60.]]);
/// ```
pub fn decode_annotations<R: AsRef<[f32]>>(
    records: &[R],
    height: u32,
    width: u32,
) -> Result<PromptSet, SageError> {
    let mut prompts = PromptSet::new(height, width);

    for (idx, record) in records.iter().enumerate() {
        let prompt = Prompt::from_record(record.as_ref()).map_err(|err| match err {
            SageError::InvalidAnnotation(message) => {
                SageError::InvalidAnnotation(format!("Record {}: {}", idx, message))
            }
            other => other,
        })?;

        if let Some(prompt) = prompt {
            prompts.push(prompt);
        }
    }

    Ok(prompts)
}

/// Write a decoded prompt set to a json file
pub fn write_prompts_json<P: AsRef<Path>>(path: P, prompts: &PromptSet) -> Result<(), SageError> {
    let file = File::create(path).map_err(|_| SageError::ImageWriteError)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer(writer, &serde_json::json!({ "prompts": prompts.prompts() }))
        .map_err(|_| SageError::ImageWriteError)?;

    Ok(())
}
