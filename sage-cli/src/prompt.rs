// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::Path;

use clap::Args;

use sage_core::error::SageError;
use sage_core::im::{SageImage, SageMask};
use sage_core::pr::{PromptSet, decode_annotations, read_annotations_json, write_prompts_json};
use sage_core::sg::PromptedSlots;
use sage_core::ut::path::ensure_directory;
use sage_core::ut::track::{progress_log, thousands_format};
use sage_neural::generate::GeneratorConfig;
use sage_neural::nn::SamBackend;

use crate::setup::{color_rng, select_checkpoint, select_device};

#[derive(Debug, Args)]
#[command(about = "Segment objects selected by point and box annotations.")]
pub struct PromptArgs {
    #[arg(short = 'i', long, help = "Input image.", required = true)]
    pub image: Option<String>,

    #[arg(
        short = 'a',
        long,
        help = "Annotation records (.json) of (x1, y1, kind, x2, y2, stroke).",
        required = true
    )]
    pub annotations: Option<String>,

    #[arg(short = 'o', long, help = "Output directory.", required = true)]
    pub output: Option<String>,

    #[arg(
        short = 'm',
        long,
        help = "Model name (vit_b, vit_l, vit_h).",
        default_value = "vit_b"
    )]
    pub model: Option<String>,

    #[arg(long, help = "Device (cpu, cuda, metal).", default_value = "cpu")]
    pub device: Option<String>,

    #[arg(long, help = "Logit threshold for binarizing masks.")]
    pub mask_threshold: Option<f32>,

    #[arg(long, help = "Also save each mask and the decoded prompts.")]
    pub save_masks: bool,

    #[arg(short = 's', long, help = "Seed for mask colors.")]
    pub seed: Option<u64>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

fn fail(err: SageError) -> ! {
    eprintln!("[sage::prompt] ERROR: {}", err);
    std::process::exit(1);
}

pub fn prompt(args: &PromptArgs) {
    let checkpoint = select_checkpoint(args.model.as_deref().unwrap_or("vit_b"), "prompt");

    let image = SageImage::open(args.image.as_ref().unwrap()).unwrap_or_else(|err| fail(err));

    let records =
        read_annotations_json(args.annotations.as_ref().unwrap()).unwrap_or_else(|err| fail(err));

    let prompts = decode_annotations(&records, image.height(), image.width())
        .unwrap_or_else(|err| fail(err));

    progress_log(
        &format!(
            "Decoded {} boxes, {} positive points, and {} negative points",
            thousands_format(prompts.boxes.len()),
            thousands_format(prompts.positive.len()),
            thousands_format(prompts.negative.len())
        ),
        args.verbose,
    );

    if prompts.boxes.is_empty() {
        fail(SageError::EmptySelection);
    }

    let output = ensure_directory(args.output.as_ref().unwrap()).unwrap_or_else(|err| fail(err));

    let device = select_device(args.device.as_deref().unwrap_or("cpu"), "prompt", args.verbose);

    let mut config = GeneratorConfig::default();
    if let Some(v) = args.mask_threshold {
        config.mask_threshold = v;
    }

    let mut backend = SamBackend::load(checkpoint, &device, config, args.verbose)
        .unwrap_or_else(|err| fail(err));

    let mut rng = color_rng(args.seed);
    let mut slots = PromptedSlots::new(image, records);

    let result = slots
        .run(&mut backend, &mut rng)
        .unwrap_or_else(|err| fail(err));

    for (name, artifact) in [
        ("overlay.png", &slots.overlay),
        ("mask.png", &slots.mask),
        ("segmented.png", &slots.segmented),
        ("cutout.png", &slots.cutout),
    ] {
        if let Some(artifact) = artifact {
            artifact
                .save(output.join(name))
                .unwrap_or_else(|err| fail(err));
        }
    }

    if args.save_masks {
        save_masks(&output, &result.masks, &result.prompts);
    }

    progress_log(
        &format!(
            "Saved {} cutout to {}",
            shape_string(slots.cutout.as_ref()),
            output.display()
        ),
        args.verbose,
    );
}

fn save_masks(output: &Path, masks: &[SageMask], prompts: &PromptSet) {
    for (idx, mask) in masks.iter().enumerate() {
        mask.save(output.join(format!("mask_{}.png", idx)))
            .unwrap_or_else(|err| fail(err));
    }

    write_prompts_json(output.join("prompts.json"), prompts).unwrap_or_else(|err| fail(err));
}

fn shape_string(image: Option<&SageImage>) -> String {
    match image {
        Some(image) => format!("{} x {}", image.width(), image.height()),
        None => "empty".to_string(),
    }
}
