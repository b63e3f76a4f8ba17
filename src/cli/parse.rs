//! CLI parse: clap types for promptcast. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Promptcast CLI - fan one prompt out to several image-generation backends
#[derive(Parser, Debug)]
#[command(name = "promptcast")]
#[command(about = "Generate images from one prompt across several backends concurrently")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Workspace root directory (where config/ is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory generated images are written to
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Skip probing backends at startup
    #[arg(long)]
    pub no_warm_up: bool,

    /// Append a catalog line for every generated image to this file
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

impl Cli {
    /// The command to run; `interactive` when none is given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Interactive)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Menu-driven loop: pick backends, enter a prompt, repeat
    Interactive,
    /// Generate images for one or more prompts and exit
    Generate {
        /// Prompt text (repeat for several prompts)
        #[arg(long = "prompt", short = 'p', required = true)]
        prompts: Vec<String>,
        /// Backend identifier (repeat to select several; default: all)
        #[arg(long = "backend", short = 'b')]
        backends: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List configured backends
    Backends {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Probe every backend once and report readiness
    Probe {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration as TOML
    Config,
}
