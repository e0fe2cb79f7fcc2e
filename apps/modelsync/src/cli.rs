//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// modelsync - fetch, unpack and validate inference models
#[derive(Parser)]
#[command(name = "modelsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch, unpack and validate inference models from mirrors")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seconds to wait for a mirror's response headers
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Make sure a model directory is present and valid, downloading it if needed
    Ensure {
        /// Artifact key; callers with the same key never download concurrently
        key: String,

        /// Target directory (default: <models_dir>/<KEY>)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Mirror URL, tried in the order given
        #[arg(long = "mirror", value_name = "URL", required = true)]
        mirrors: Vec<String>,

        /// Required file, overriding the configured manifest
        #[arg(long = "require", value_name = "FILE")]
        required: Vec<String>,
    },

    /// Check whether a model directory is ready without touching the network
    Check {
        /// Directory to validate
        #[arg(long, value_name = "DIR")]
        dir: PathBuf,

        /// Required file, overriding the configured manifest
        #[arg(long = "require", value_name = "FILE")]
        required: Vec<String>,
    },
}

impl Commands {
    /// Required files given on the command line
    pub fn required_files(&self) -> &[String] {
        match self {
            Self::Ensure { required, .. } | Self::Check { required, .. } => required,
        }
    }
}
