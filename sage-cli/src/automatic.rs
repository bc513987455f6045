// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use clap::Args;

use sage_core::im::SageImage;
use sage_core::sg::AutomaticSlots;
use sage_core::ut::path::check_parent_directory;
use sage_core::ut::track::progress_log;
use sage_neural::generate::GeneratorConfig;
use sage_neural::nn::SamBackend;

use crate::setup::{color_rng, select_checkpoint, select_device};

#[derive(Debug, Args)]
#[command(about = "Segment every object in an image and overlay the masks.")]
pub struct AutomaticArgs {
    #[arg(short = 'i', long, help = "Input image.", required = true)]
    pub image: Option<String>,

    #[arg(
        short = 'o',
        long,
        help = "Output overlay image (e.g. overlay.png).",
        required = true
    )]
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

    #[arg(short = 'c', long, help = "JSON file with mask generator settings.")]
    pub config: Option<String>,

    #[arg(long, help = "Number of prompt points along each side of the image.")]
    pub points_per_side: Option<usize>,

    #[arg(long, help = "Minimum predicted mask quality.")]
    pub pred_iou_thresh: Option<f32>,

    #[arg(long, help = "Minimum mask stability score.")]
    pub stability_score_thresh: Option<f32>,

    #[arg(long, help = "Logit offset used to compute the stability score.")]
    pub stability_score_offset: Option<f32>,

    #[arg(long, help = "Logit threshold for binarizing masks.")]
    pub mask_threshold: Option<f32>,

    #[arg(long, help = "Overlap above which duplicate masks are removed.")]
    pub box_nms_thresh: Option<f32>,

    #[arg(long, help = "Remove masks with fewer pixels.")]
    pub min_mask_region_area: Option<usize>,

    #[arg(short = 's', long, help = "Seed for mask colors.")]
    pub seed: Option<u64>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

impl AutomaticArgs {
    /// Generator settings from the config file overridden by explicit flags
    fn generator_config(&self) -> GeneratorConfig {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::read_json(path).unwrap_or_else(|err| {
                eprintln!("[sage::automatic] ERROR: {}", err);
                std::process::exit(1);
            }),
            None => GeneratorConfig::default(),
        };

        if let Some(v) = self.points_per_side {
            config.points_per_side = v;
        }
        if let Some(v) = self.pred_iou_thresh {
            config.pred_iou_thresh = v;
        }
        if let Some(v) = self.stability_score_thresh {
            config.stability_score_thresh = v;
        }
        if let Some(v) = self.stability_score_offset {
            config.stability_score_offset = v;
        }
        if let Some(v) = self.mask_threshold {
            config.mask_threshold = v;
        }
        if let Some(v) = self.box_nms_thresh {
            config.box_nms_thresh = v;
        }
        if let Some(v) = self.min_mask_region_area {
            config.min_mask_region_area = v;
        }

        if let Err(err) = config.validate() {
            eprintln!("[sage::automatic] ERROR: {}", err);
            std::process::exit(1);
        }

        config
    }
}

pub fn automatic(args: &AutomaticArgs) {
    let config = args.generator_config();

    let checkpoint = select_checkpoint(args.model.as_deref().unwrap_or("vit_b"), "automatic");

    let output = args.output.to_owned().unwrap();
    if let Err(err) = check_parent_directory(&output) {
        eprintln!("[sage::automatic] ERROR: {}", err);
        std::process::exit(1);
    }

    let image = SageImage::open(args.image.as_ref().unwrap()).unwrap_or_else(|err| {
        eprintln!("[sage::automatic] ERROR: {}", err);
        std::process::exit(1);
    });

    let device = select_device(
        args.device.as_deref().unwrap_or("cpu"),
        "automatic",
        args.verbose,
    );

    progress_log(
        &format!(
            "Segmenting {} x {} image with {} prompt points",
            image.width(),
            image.height(),
            config.points_per_side * config.points_per_side
        ),
        args.verbose,
    );

    let mut backend =
        SamBackend::load(checkpoint, &device, config, args.verbose).unwrap_or_else(|err| {
            eprintln!("[sage::automatic] ERROR: {}", err);
            std::process::exit(1);
        });

    let mut rng = color_rng(args.seed);
    let mut slots = AutomaticSlots::new(image);

    if let Err(err) = slots.run(&mut backend, &mut rng) {
        eprintln!("[sage::automatic] ERROR: {}", err);
        std::process::exit(1);
    }

    if let Some(overlay) = &slots.output {
        if let Err(err) = overlay.save(&output) {
            eprintln!("[sage::automatic] ERROR: {}", err);
            std::process::exit(1);
        }
    }

    progress_log(&format!("Saved overlay to {}", output), args.verbose);
}
