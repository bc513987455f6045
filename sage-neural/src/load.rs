// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::segment_anything::sam::Sam;

use sage_core::error::SageError;
use sage_core::ut::track::progress_log;
use sage_data::data::Checkpoint;

fn load_error(err: candle_core::Error) -> SageError {
    SageError::OtherError(format!("Failed to load checkpoint: {}", err))
}

/// Load a Segment Anything model, downloading the checkpoint when possible
pub fn load_sam(checkpoint: Checkpoint, device: &Device, verbose: bool) -> Result<Sam, SageError> {
    let path = checkpoint
        .download(verbose)
        .map_err(|err| SageError::NoFileError(err.to_string()))?;

    progress_log(
        &format!("Loading {} checkpoint from {}", checkpoint, path.display()),
        verbose,
    );

    let (embed_dim, depth, heads, global_attn) = checkpoint.encoder();

    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device) }
        .map_err(load_error)?;

    Sam::new(embed_dim, depth, heads, global_attn, vb).map_err(load_error)
}
