// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use clap::{Parser, Subcommand};
use sage_cli::{automatic, download, list, prompt};

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Automatic(automatic::AutomaticArgs),
    Prompt(prompt::PromptArgs),
    Download(download::DownloadArgs),
    List(list::ListArgs),
}

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Automatic(automatic_args)) => automatic::automatic(automatic_args),
        Some(Commands::Prompt(prompt_args)) => prompt::prompt(prompt_args),
        Some(Commands::Download(download_args)) => download::download(download_args),
        Some(Commands::List(list_args)) => list::list(list_args),
        None => {}
    }
}
