//! Command-line interface for the Bkknet agent.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Bkk320 network control-plane agent
#[derive(Parser, Debug)]
#[command(
    name = "bkknet",
    author,
    version,
    about = "Network control-plane agent for the Bkk320 sensor device",
    long_about = r#"
Bkknet listens for the Bkk320 binary command protocol over UDP, answers
identity requests, and logs raw TCP traffic on the same port.

QUICK START:
  bkknet --port 30720 --main-cfg /opt/Sensor-M/Bkk320/etc/MainCfg.json
"#
)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on (UDP protocol + TCP log sink)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    pub log_level: String,

    /// Path to the device main configuration file
    #[arg(short = 'm', long)]
    pub main_cfg: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show example configuration
    Config(ConfigArgs),
}

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write the example to the default config path instead of stdout
    #[arg(long)]
    pub write: bool,
}
