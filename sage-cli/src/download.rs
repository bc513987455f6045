// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use clap::Args;

use sage_core::ut::track::progress_log;
use sage_data::data::Checkpoint;

use crate::setup::select_checkpoint;

#[derive(Debug, Args)]
#[command(about = "Download Segment Anything checkpoints to the sage cache.")]
pub struct DownloadArgs {
    #[arg(
        short = 'm',
        long,
        help = "Model name (vit_b, vit_l, vit_h).",
        default_value = "vit_b"
    )]
    pub model: Option<String>,

    #[arg(long, help = "Download every checkpoint with a hosted conversion.")]
    pub all: bool,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn download(args: &DownloadArgs) {
    if args.all {
        progress_log("Downloading all hosted checkpoints to cache", args.verbose);

        for checkpoint in Checkpoint::iter().filter(|c| c.url().is_some()) {
            fetch(checkpoint, args.verbose);
        }

        return;
    }

    let checkpoint = select_checkpoint(args.model.as_deref().unwrap_or("vit_b"), "download");
    fetch(&checkpoint, args.verbose);
}

fn fetch(checkpoint: &Checkpoint, verbose: bool) {
    if checkpoint.is_cached() {
        progress_log(
            &format!(
                "{} is already cached at {}",
                checkpoint,
                checkpoint.path().display()
            ),
            verbose,
        );
        return;
    }

    match checkpoint.download(verbose) {
        Ok(path) => progress_log(
            &format!("Saved {} checkpoint to {}", checkpoint, path.display()),
            verbose,
        ),
        Err(err) => {
            eprintln!("[sage::download] ERROR: {}", err);
            std::process::exit(1);
        }
    }
}
