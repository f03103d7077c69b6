//! Command-line interface for dermascan.

use clap::Parser;
use std::path::PathBuf;

/// Serve skin-disease predictions from a pretrained classifier over HTTP.
#[derive(Parser, Debug)]
#[command(name = "dermascan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to optional YAML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the safetensors weights file (overrides config).
    #[arg(short, long)]
    pub weights: Option<PathBuf>,

    /// Device to run on (cpu, cuda, cuda:0, cuda:1, etc; overrides config).
    #[arg(short, long)]
    pub device: Option<String>,

    /// EfficientNet variant (b0..b7; overrides config).
    #[arg(long)]
    pub variant: Option<String>,

    /// Address to bind (overrides config).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config).
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Attempt the model load and report status instead of serving.
    ///
    /// Exits non-zero if the load fails; useful for verifying a weights
    /// file and device before deployment.
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
