// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use candle_core::{Device, utils::cuda_is_available, utils::metal_is_available};
use rand::SeedableRng;
use rand::rngs::StdRng;

use sage_core::ut::track::progress_log;
use sage_data::data::Checkpoint;

/// Resolve a device name, exiting with an error message when it is unusable
///
/// # Arguments
///
/// * `device` - One of cpu, cuda, or metal
/// * `command` - Name of the calling command used to tag error messages
/// * `verbose` - Log the detected accelerator
pub fn select_device(device: &str, command: &str, verbose: bool) -> Device {
    if !["cpu", "metal", "cuda"].iter().any(|d| d == &device) {
        eprintln!(
            "[sage::{}] ERROR: Invalid device. Must be one of: cpu, metal, cuda.",
            command
        );
        std::process::exit(1);
    }

    if device == "cuda" && !cuda_is_available() {
        eprintln!(
            "[sage::{}] ERROR: Device 'cuda' specified but no cuda device was detected.",
            command
        );
        std::process::exit(1);
    }

    if device == "metal" && !metal_is_available() {
        eprintln!(
            "[sage::{}] ERROR: Device 'metal' specified but no metal device was detected.",
            command
        );
        std::process::exit(1);
    }

    let selected = match device {
        "cuda" => Device::new_cuda(0),
        "metal" => Device::new_metal(0),
        _ => Ok(Device::Cpu),
    };

    match selected {
        Ok(selected) => {
            if device != "cpu" {
                progress_log(&format!("{} device detected.", device), verbose);
            }
            selected
        }
        Err(err) => {
            eprintln!(
                "[sage::{}] ERROR: Failed to initialize {} device. {}",
                command, device, err
            );
            std::process::exit(1);
        }
    }
}

/// Resolve a checkpoint name, exiting with an error message when it is unknown
pub fn select_checkpoint(model: &str, command: &str) -> Checkpoint {
    Checkpoint::select(model).unwrap_or_else(|err| {
        eprintln!("[sage::{}] ERROR: {}", command, err);
        std::process::exit(1);
    })
}

/// Random source for mask colors, reproducible when a seed is given
pub fn color_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
