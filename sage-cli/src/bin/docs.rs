#![allow(clippy::all)]
use clap::{Parser, Subcommand};

use sage_cli::{automatic, download, list, prompt};

#[derive(Parser)]
#[command(version, about, long_about = None)]
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
    clap_markdown::print_help_markdown::<Cli>();
}
