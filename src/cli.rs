use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "funddocs",
    version,
    about = "Local fund statement extraction and indexing tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Process(ProcessArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Extraction-layer output for one document: raw tables plus
    /// per-page cleaned text, as JSON.
    #[arg(long)]
    pub extraction_path: PathBuf,

    #[arg(long, default_value = ".cache/funddocs/funddocs.sqlite")]
    pub db_path: PathBuf,

    /// Overrides the fund id carried in the extraction file.
    #[arg(long)]
    pub fund_id: Option<i64>,

    /// Overrides the document id carried in the extraction file.
    #[arg(long)]
    pub document_id: Option<i64>,

    #[arg(long, default_value_t = 1000)]
    pub chunk_size: usize,

    #[arg(long, default_value_t = 200)]
    pub chunk_overlap: usize,

    /// Where to write the processing result manifest.
    #[arg(long)]
    pub result_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/funddocs/funddocs.sqlite")]
    pub db_path: PathBuf,
}
