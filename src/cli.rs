//! Command-line interface for `faceunlock-check`
//!
//! The checker runs one authentication attempt through the same client the
//! PAM module uses, which makes it the first thing to reach for when a
//! login falls through to the password prompt.

use clap::Parser;
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;

/// Test face authentication against the running daemon
#[derive(Parser, Debug, Clone)]
#[command(name = "faceunlock-check")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// User to authenticate (defaults to $USER)
    #[arg(env = "USER")]
    pub user: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Override the daemon socket path
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Override the attempt deadline in milliseconds
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
