//! rewm — a minimalist reparenting window manager.

mod config;
mod wm;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use config::Config;
use wm::{events, WindowManager};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().context("failed to load configuration")?;
    let mut wm = WindowManager::new(config).context("failed to start window manager")?;
    wm.scan_existing()
        .context("failed to adopt existing windows")?;
    events::run(&mut wm)
}
