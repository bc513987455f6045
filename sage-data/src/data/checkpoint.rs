// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Result, anyhow};

use crate::get_sage_cache;
use crate::request;

const CHECKPOINT_NAMES: &str = "vit_b, vit_l, vit_h";

/// Segment Anything checkpoints available to the sage library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Checkpoint {
    #[default]
    VitB,
    VitL,
    VitH,
}

impl Checkpoint {
    /// Select a checkpoint by name.
    pub fn select(name: &str) -> Result<Self> {
        match name {
            "vit_b" => Ok(Checkpoint::VitB),
            "vit_l" => Ok(Checkpoint::VitL),
            "vit_h" => Ok(Checkpoint::VitH),
            _ => Err(anyhow!(
                "[sage::data::checkpoint] Checkpoint {} not found. Available checkpoints include: {}.",
                name,
                CHECKPOINT_NAMES
            )),
        }
    }

    /// Return an iterator over the enum members.
    pub fn iter() -> impl Iterator<Item = &'static Checkpoint> {
        static CHECKPOINTS: [Checkpoint; 3] = [Checkpoint::VitB, Checkpoint::VitL, Checkpoint::VitH];

        CHECKPOINTS.iter()
    }

    /// Get the name of the model.
    pub fn model_name(&self) -> &'static str {
        match self {
            Checkpoint::VitB => "vit_b",
            Checkpoint::VitL => "vit_l",
            Checkpoint::VitH => "vit_h",
        }
    }

    /// Get the file name of the checkpoint in the cache.
    pub fn file_name(&self) -> &'static str {
        match self {
            Checkpoint::VitB => "sam_vit_b_01ec64.safetensors",
            Checkpoint::VitL => "sam_vit_l_0b3195.safetensors",
            Checkpoint::VitH => "sam_vit_h_4b8939.safetensors",
        }
    }

    /// Get the direct download url of a hosted safetensors conversion.
    pub fn url(&self) -> Option<&'static str> {
        match self {
            Checkpoint::VitB => Some(
                "https://huggingface.co/lmz/candle-sam/resolve/main/sam_vit_b_01ec64.safetensors",
            ),
            Checkpoint::VitL => None,
            Checkpoint::VitH => None,
        }
    }

    /// Get the usage license for a model.
    pub fn license(&self) -> &'static str {
        "Apache License 2.0"
    }

    /// Get the authors of the model weights.
    pub fn data_authors(&self) -> &'static str {
        "Meta AI Research"
    }

    /// Get the size of the checkpoint in GB.
    pub fn data_size(&self) -> &'static str {
        match self {
            Checkpoint::VitB => "0.375",
            Checkpoint::VitL => "1.250",
            Checkpoint::VitH => "2.560",
        }
    }

    /// Image encoder hyper-parameters as (embed dim, depth, heads, global attention layers).
    pub fn encoder(&self) -> (usize, usize, usize, &'static [usize]) {
        match self {
            Checkpoint::VitB => (768, 12, 12, &[2, 5, 8, 11]),
            Checkpoint::VitL => (1024, 24, 16, &[5, 11, 17, 23]),
            Checkpoint::VitH => (1280, 32, 16, &[7, 15, 23, 31]),
        }
    }

    /// Get path to the checkpoint.
    pub fn path(&self) -> PathBuf {
        get_sage_cache().join(self.file_name())
    }

    /// Check if the checkpoint is present in the cache.
    pub fn is_cached(&self) -> bool {
        self.path().exists()
    }

    /// Download the checkpoint to the sage cache if missing.
    ///
    /// Checkpoints without a hosted conversion must be placed in the cache
    /// manually.
    pub fn download(&self, verbose: bool) -> Result<PathBuf> {
        let path = self.path();
        if path.exists() {
            return Ok(path);
        }

        let cache = get_sage_cache();
        let url = self.url().ok_or_else(|| {
            anyhow!(
                "[sage::data::checkpoint] No hosted download exists for {}. Convert the checkpoint to safetensors and place it at {}.",
                self.model_name(),
                path.display()
            )
        })?;

        request::download_file(url, cache.as_path(), self.file_name(), !verbose)?;

        if !path.exists() {
            return Err(anyhow!(
                "[sage::data::checkpoint] Failed to download {} checkpoint.",
                self.model_name()
            ));
        }

        Ok(path)
    }
}

impl FromStr for Checkpoint {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        Checkpoint::select(name)
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.model_name())
    }
}
