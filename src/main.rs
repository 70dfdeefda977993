//! Bkknet agent binary.

use clap::Parser;

use bkknet::cli::{Cli, Commands};
use bkknet::config::{init_logging, Config};
use bkknet::error::Result;
use bkknet::server::{wait_for_shutdown, Agent};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config if specified
    let mut config = if let Some(ref path) = cli.config {
        Config::load(path)?
    } else if Config::default_path().exists() {
        Config::load(Config::default_path())?
    } else {
        Config::default()
    };

    // CLI flags override the config file.
    if let Some(port) = cli.port {
        config.agent.port = port;
    }
    if let Some(ref main_cfg) = cli.main_cfg {
        config.agent.main_cfg_file = main_cfg.clone();
    }
    config.logging.level = cli.log_level.clone();
    config.logging.color = !cli.no_color;
    config.validate()?;

    if let Some(Commands::Config(args)) = cli.command {
        return run_config(args.write);
    }

    init_logging(&config.logging)?;

    let agent = Agent::start(&config)?;

    // Block until SIGINT/SIGTERM, then shut the pipeline down in order.
    wait_for_shutdown().await;

    agent.shutdown().await;

    Ok(())
}

/// Print or write the example configuration.
fn run_config(write: bool) -> Result<()> {
    let example = Config::example();
    if write {
        let path = Config::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        example.save(&path)?;
        println!("Wrote example config to {}", path.display());
    } else {
        let toml = toml::to_string_pretty(&example)
            .map_err(|e| bkknet::Error::Config(e.to_string()))?;
        print!("{toml}");
    }
    Ok(())
}
