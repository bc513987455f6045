// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use candle_core::{Device, IndexOp, Result, Tensor};
use candle_transformers::models::segment_anything::sam::{IMAGE_SIZE, Sam};
use kdam::BarExt;

use sage_core::error::SageError;
use sage_core::im::{MaskRecord, SageImage, SageMask};
use sage_core::sg::SegmentationPort;
use sage_core::ut::track::{progress_bar, progress_log, thousands_format};
use sage_data::data::Checkpoint;

use crate::generate::{Candidate, GeneratorConfig, point_grid, select_candidates};
use crate::load::load_sam;
use crate::preprocess::preprocess_sam;

fn failure(err: candle_core::Error) -> SageError {
    SageError::SegmentationFailure(err.to_string())
}

/// Image embedding cached for the image it was computed from
struct Embedding {
    source: SageImage,
    tensor: Tensor,
    resized: (usize, usize),
}

/// Segment Anything backend running on a candle device
///
/// The image embedding is computed once per image and kept until
/// `release` is called.
pub struct SamBackend {
    model: Sam,
    device: Device,
    checkpoint: Checkpoint,
    config: GeneratorConfig,
    embedding: Option<Embedding>,
    verbose: bool,
}

impl SamBackend {
    /// Load a checkpoint onto a device
    pub fn load(
        checkpoint: Checkpoint,
        device: &Device,
        config: GeneratorConfig,
        verbose: bool,
    ) -> std::result::Result<Self, SageError> {
        config.validate()?;

        Ok(SamBackend {
            model: load_sam(checkpoint, device, verbose)?,
            device: device.clone(),
            checkpoint,
            config,
            embedding: None,
            verbose,
        })
    }

    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Check if an image embedding is currently held
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    fn embed(&mut self, image: &SageImage) -> Result<()> {
        if let Some(embedding) = &self.embedding {
            if &embedding.source == image {
                return Ok(());
            }
        }

        progress_log("Computing image embedding", self.verbose);

        let (tensor, resized) = preprocess_sam(image, &self.device)?;
        let tensor = self.model.embeddings(&tensor)?;

        self.embedding = Some(Embedding {
            source: image.clone(),
            tensor,
            resized,
        });

        Ok(())
    }

    /// Predict mask logits at the original image size for a single prompt
    ///
    /// Points are (x, y, foreground) with x and y as fractions of the image
    /// width and height. Returns the row-major logits and predicted quality
    /// of every mask proposed for the prompt.
    fn predict(
        &self,
        points: &[(f64, f64, bool)],
        height: usize,
        width: usize,
    ) -> Result<Vec<(Vec<f32>, f32)>> {
        let embedding = self
            .embedding
            .as_ref()
            .ok_or_else(|| candle_core::Error::Msg("No image embedding was computed.".into()))?;

        let (rh, rw) = embedding.resized;

        let (low_res, iou) =
            self.model
                .forward_for_embeddings(&embedding.tensor, rh, rw, points, true)?;

        let logits = low_res
            .upsample_nearest2d(IMAGE_SIZE, IMAGE_SIZE)?
            .i((.., .., ..rh, ..rw))?
            .contiguous()?
            .upsample_nearest2d(height, width)?
            .squeeze(0)?;

        let iou = iou.flatten_all()?.to_vec1::<f32>()?;

        (0..logits.dim(0)?)
            .map(|k| {
                let mask = logits.get(k)?.flatten_all()?.to_vec1::<f32>()?;
                Ok((mask, iou.get(k).copied().unwrap_or(0.0)))
            })
            .collect()
    }
}

impl SegmentationPort for SamBackend {
    fn segment_automatic(
        &mut self,
        image: &SageImage,
    ) -> std::result::Result<Vec<MaskRecord>, SageError> {
        image.as_rgb8()?;
        self.embed(image).map_err(failure)?;

        let (width, height) = (image.width(), image.height());
        let grid = point_grid(self.config.points_per_side);

        let mut pb = progress_bar(grid.len(), "Sampling prompt grid", self.verbose);
        let mut candidates = Vec::new();

        for (x, y) in grid {
            let predictions = self
                .predict(&[(x, y, true)], height as usize, width as usize)
                .map_err(failure)?;

            for (logits, predicted_iou) in predictions {
                let candidate =
                    Candidate::from_logits(&logits, width, height, predicted_iou, &self.config)?;

                if candidate.passes(&self.config) {
                    candidates.push(candidate);
                }
            }

            pb.update(1)
                .map_err(|err| SageError::OtherError(err.to_string()))?;
        }

        if self.verbose {
            println!();
        }

        let records = select_candidates(candidates, &self.config);

        progress_log(
            &format!("Kept {} masks", thousands_format(records.len())),
            self.verbose,
        );

        Ok(records)
    }

    fn segment_from_prompts(
        &mut self,
        image: &SageImage,
        boxes: &[[f32; 4]],
        positive: &[[f32; 2]],
        negative: &[[f32; 2]],
    ) -> std::result::Result<Vec<SageMask>, SageError> {
        image.as_rgb8()?;

        if boxes.is_empty() {
            return Ok(Vec::new());
        }

        if !positive.is_empty() || !negative.is_empty() {
            progress_log(
                &format!(
                    "Ignoring {} point prompts as boxes were provided",
                    positive.len() + negative.len()
                ),
                self.verbose,
            );
        }

        self.embed(image).map_err(failure)?;

        let (width, height) = (image.width(), image.height());
        let mut masks = Vec::with_capacity(boxes.len());

        for &[min_x, min_y, max_x, max_y] in boxes {
            let center = (
                ((min_x + max_x) / 2.0 / width as f32) as f64,
                ((min_y + max_y) / 2.0 / height as f32) as f64,
                true,
            );

            let predictions = self
                .predict(&[center], height as usize, width as usize)
                .map_err(failure)?;

            let (logits, _) = predictions
                .into_iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .ok_or_else(|| {
                    SageError::SegmentationFailure("No mask was predicted for a box.".to_string())
                })?;

            let mut mask = SageMask::new(
                width,
                height,
                logits
                    .iter()
                    .map(|&v| v > self.config.mask_threshold)
                    .collect(),
            )?;

            mask.clip_to_box([min_x, min_y, max_x, max_y]);
            masks.push(mask);
        }

        Ok(masks)
    }

    fn release(&mut self) {
        self.embedding = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use sage_core::im::SageBuffer;
    use sage_core::sg::{ReleaseGuard, segment_from_prompts};

    fn load_backend() -> SamBackend {
        let config = GeneratorConfig {
            points_per_side: 4,
            ..Default::default()
        };

        SamBackend::load(Checkpoint::VitB, &Device::Cpu, config, true).unwrap()
    }

    fn square_image() -> SageImage {
        let buffer = SageBuffer::new(
            64,
            48,
            3,
            (0..64 * 48)
                .flat_map(|idx| {
                    let (x, y) = (idx % 64, idx / 64);
                    if (16..40).contains(&x) && (12..36).contains(&y) {
                        [240u8, 240, 240]
                    } else {
                        [10u8, 10, 10]
                    }
                })
                .collect(),
        )
        .unwrap();

        SageImage::U8(buffer)
    }

    #[test]
    #[ignore = "downloads the vit_b checkpoint"]
    fn test_prompted_one_mask_per_box() {
        let mut backend = load_backend();
        let image = square_image();

        let masks = backend
            .segment_from_prompts(&image, &[[16., 12., 39., 35.], [0., 0., 10., 10.]], &[], &[])
            .unwrap();

        assert_eq!(masks.len(), 2);
        assert!(masks.iter().all(|m| m.shape() == (48, 64)));
        assert!(masks[0].bounds().is_none_or(|[x0, y0, x1, y1]| {
            x0 >= 16 && y0 >= 12 && x1 <= 39 && y1 <= 35
        }));
    }

    #[test]
    #[ignore = "downloads the vit_b checkpoint"]
    fn test_release_drops_embedding() {
        let mut backend = load_backend();
        let image = square_image();

        {
            let mut guard = ReleaseGuard::new(&mut backend);
            guard.segment_automatic(&image).unwrap();
            assert!(guard.has_embedding());
        }

        assert!(!backend.has_embedding());
    }

    #[test]
    #[ignore = "downloads the vit_b checkpoint"]
    fn test_prompted_pipeline() {
        use rand::SeedableRng;

        let mut backend = load_backend();
        let image = square_image();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);

        let output = segment_from_prompts(
            &mut backend,
            &image,
            &[[16f32, 12., 2., 39., 35., 3.]],
            &mut rng,
        );

        if let Ok(output) = output {
            assert!(output.cutout.width() <= 24);
        }
        assert!(!backend.has_embedding());
    }
}
