// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use sage_core::error::SageError;
use sage_core::im::{MaskRecord, SageMask};

/// Tuning knobs for automatic mask generation
///
/// Missing fields fall back to the defaults when read from json.
///
/// # Examples
///
/// ```
/// use sage_neural::generate::GeneratorConfig;
///
/// let config: GeneratorConfig = serde_json::from_str(r#"{"points_per_side": 8}"#).unwrap();
///
/// assert_eq!(config.points_per_side, 8);
/// assert_eq!(config.pred_iou_thresh, 0.88);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of prompt points sampled along each side of the image
    pub points_per_side: usize,
    /// Minimum predicted mask quality
    pub pred_iou_thresh: f32,
    /// Minimum stability of a mask under a shifted logit threshold
    pub stability_score_thresh: f32,
    /// Logit shift used when computing the stability score
    pub stability_score_offset: f32,
    /// Logit threshold turning predictions into masks
    pub mask_threshold: f32,
    /// Mask overlap above which the lower quality mask is discarded
    pub box_nms_thresh: f32,
    /// Masks with fewer pixels are discarded
    pub min_mask_region_area: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            points_per_side: 32,
            pred_iou_thresh: 0.88,
            stability_score_thresh: 0.95,
            stability_score_offset: 1.0,
            mask_threshold: 0.0,
            box_nms_thresh: 0.7,
            min_mask_region_area: 0,
        }
    }
}

impl GeneratorConfig {
    /// Read a config from a json file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, SageError> {
        let file = File::open(path.as_ref())
            .map_err(|_| SageError::NoFileError(path.as_ref().display().to_string()))?;

        let config: GeneratorConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| SageError::OtherError(format!("Invalid generator config: {}", err)))?;

        config.validate()?;

        Ok(config)
    }

    /// Check that every knob is within its valid range
    pub fn validate(&self) -> Result<(), SageError> {
        if self.points_per_side == 0 {
            return Err(SageError::OtherError(
                "points_per_side must be a positive integer".to_string(),
            ));
        }

        for (name, value) in [
            ("pred_iou_thresh", self.pred_iou_thresh),
            ("stability_score_thresh", self.stability_score_thresh),
            ("box_nms_thresh", self.box_nms_thresh),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SageError::OtherError(format!(
                    "{} must be between 0 and 1",
                    name
                )));
            }
        }

        if !self.stability_score_offset.is_finite() || self.stability_score_offset < 0.0 {
            return Err(SageError::OtherError(
                "stability_score_offset must be a non-negative number".to_string(),
            ));
        }

        if !self.mask_threshold.is_finite() {
            return Err(SageError::OtherError(
                "mask_threshold must be a finite number".to_string(),
            ));
        }

        Ok(())
    }
}

/// A regular grid of prompt points as fractions of the image width and height
///
/// Points sit at the center of each of the `n` x `n` cells, row by row.
pub fn point_grid(n: usize) -> Vec<(f64, f64)> {
    let step = 1.0 / n as f64;

    (0..n)
        .flat_map(|row| (0..n).map(move |col| ((col as f64 + 0.5) * step, (row as f64 + 0.5) * step)))
        .collect()
}

/// Ratio of pixels above `threshold + offset` to pixels above `threshold - offset`
///
/// A mask whose extent barely changes when the logit cutoff is shifted is
/// stable. Returns 0 when no pixel passes the lower cutoff.
pub fn stability_score(logits: &[f32], threshold: f32, offset: f32) -> f32 {
    let mut intersections = 0usize;
    let mut unions = 0usize;

    for &logit in logits {
        intersections += (logit > threshold + offset) as usize;
        unions += (logit > threshold - offset) as usize;
    }

    if unions == 0 {
        0.0
    } else {
        intersections as f32 / unions as f32
    }
}

/// A single mask predicted from one grid point
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub mask: SageMask,
    pub predicted_iou: f32,
    pub stability: f32,
}

impl Candidate {
    /// Build a candidate from full resolution logits
    ///
    /// # Arguments
    ///
    /// * `logits` - Row-major mask logits at the image resolution
    /// * `width` - Image width
    /// * `height` - Image height
    /// * `predicted_iou` - Quality predicted by the model
    /// * `config` - Thresholds used to binarize and score the logits
    pub fn from_logits(
        logits: &[f32],
        width: u32,
        height: u32,
        predicted_iou: f32,
        config: &GeneratorConfig,
    ) -> Result<Candidate, SageError> {
        let mask = SageMask::new(
            width,
            height,
            logits.iter().map(|&v| v > config.mask_threshold).collect(),
        )?;

        Ok(Candidate {
            mask,
            predicted_iou,
            stability: stability_score(
                logits,
                config.mask_threshold,
                config.stability_score_offset,
            ),
        })
    }

    /// Check the candidate against the quality and stability thresholds
    pub fn passes(&self, config: &GeneratorConfig) -> bool {
        self.predicted_iou >= config.pred_iou_thresh
            && self.stability >= config.stability_score_thresh
    }
}

/// Filter grid candidates down to a set of distinct masks
///
/// Candidates below the quality or stability thresholds are dropped, the
/// rest are visited from highest to lowest predicted quality and kept only
/// when their overlap with every kept mask stays below `box_nms_thresh`.
/// Blank masks and masks smaller than `min_mask_region_area` are removed.
pub fn select_candidates(candidates: Vec<Candidate>, config: &GeneratorConfig) -> Vec<MaskRecord> {
    let mut passing: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.passes(config))
        .collect();

    passing.sort_by(|a, b| b.predicted_iou.total_cmp(&a.predicted_iou));

    let mut kept: Vec<MaskRecord> = Vec::new();

    for candidate in passing {
        let record = MaskRecord::new(candidate.mask);

        if record.area == 0 || record.area < config.min_mask_region_area {
            continue;
        }

        if kept
            .iter()
            .all(|k| k.mask.iou(&record.mask) <= config.box_nms_thresh)
        {
            kept.push(record);
        }
    }

    kept
}
