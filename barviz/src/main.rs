mod cli;
mod config;
mod window;

use std::{path::PathBuf, sync::OnceLock};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xdg::BaseDirectories;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const CONFIG_FILE_NAME: &str = "config.toml";

static XDG: OnceLock<BaseDirectories> = OnceLock::new();

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();
    if args.list_inputs {
        let names = barviz_audio::fetcher::input_device_names()?;

        info!("Available input devices:\n\n{:#?}\n", names);
        return Ok(());
    }

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_path()?,
    };

    let config = config::load_or_create(&config_path)?;
    if args.demo {
        info!("Demo mode: no input device will be opened");
    }

    if let Err(err) = window::run(config, config_path, args.demo) {
        error!("{:?}", err);
        anyhow::bail!("Fatal error");
    }

    Ok(())
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info,barviz_audio=info", APP_NAME)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .without_time()
        .pretty()
        .init();

    tracing::debug!("Debug logging enabled");
}

fn get_xdg() -> &'static BaseDirectories {
    XDG.get_or_init(|| BaseDirectories::with_prefix(APP_NAME))
}

/// Returns the path to the config file of `barviz`.
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    get_xdg()
        .place_config_file(CONFIG_FILE_NAME)
        .context("Create the config directory")
}
