// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use clap::Args;
use colored::Colorize;

use sage_data::data::Checkpoint;
use sage_data::get_sage_cache;

#[derive(Debug, Args)]
#[command(about = "List the available Segment Anything checkpoints.")]
pub struct ListArgs {}

pub fn list(_args: &ListArgs) {
    println!("{:^69}", "\n");
    println!("| {:-^84} |", "");
    println!("| {:^84} |", "sage".truecolor(214, 122, 64).bold());
    println!("| {:^84} |", "Segment Anything checkpoints");
    println!(
        "| {:-^8} | {:-^30} | {:-^10} | {:-^18} | {:-^7} |",
        "", "", "", "", ""
    );
    println!(
        "| {:^8} | {:^30} | {:^10} | {:^18} | {:^7} |",
        "model".bold(),
        "file".bold(),
        "size (GB)".bold(),
        "license".bold(),
        "cached".bold()
    );
    println!(
        "| {:-^8} | {:-^30} | {:-^10} | {:-^18} | {:-^7} |",
        "", "", "", "", ""
    );

    for checkpoint in Checkpoint::iter() {
        println!(
            "| {:^8} | {:^30} | {:^10} | {:^18} | {:^7} |",
            checkpoint.model_name(),
            checkpoint.file_name(),
            checkpoint.data_size(),
            checkpoint.license(),
            if checkpoint.is_cached() { "yes" } else { "no" },
        );
    }

    println!(
        "| {:-^8} | {:-^30} | {:-^10} | {:-^18} | {:-^7} |",
        "", "", "", "", ""
    );
    println!("Cache: {}", get_sage_cache().display());
    println!("{:^69}", "\n");
}
