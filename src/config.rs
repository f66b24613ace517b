//! Configuration system
//!
//! Loads configuration from a TOML file at `~/.config/rewm/config.toml`.
//! Auto-generates a default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::wm::workspace::MAX_DESKTOPS;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title strip height in pixels.
    pub title_height: u16,
    /// Frame border width in pixels.
    pub border_width: u16,
    /// Number of virtual desktops, capped at MAX_DESKTOPS.
    pub desktops: u32,
    /// Snap distance for interactive moves, in pixels. 0 disables snapping.
    pub snap_distance: i32,
    /// Draw an XOR outline during drags instead of live-updating the window.
    pub outline_drag: bool,
    /// Foreground color name for decorations.
    pub foreground: String,
    /// Background color name for decorations.
    pub background: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title_height: 18,
            border_width: 1,
            desktops: 4,
            snap_distance: 8,
            outline_drag: true,
            foreground: "white".to_string(),
            background: "black".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if the file doesn't
    /// exist. A malformed file is a startup failure.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("failed to read config file")?;
        let config: Config = toml::from_str(&content).context("failed to parse config file")?;

        info!("configuration loaded from {:?}", config_path);
        Ok(config.validated())
    }

    /// Clamp out-of-range values rather than failing.
    fn validated(mut self) -> Self {
        if self.desktops == 0 || self.desktops > MAX_DESKTOPS {
            warn!(
                "desktop count {} out of range, clamping to {}",
                self.desktops, MAX_DESKTOPS
            );
            self.desktops = self.desktops.clamp(1, MAX_DESKTOPS);
        }
        if self.title_height == 0 {
            self.title_height = Self::default().title_height;
        }
        self
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("failed to get config directory")?
            .join("rewm");
        Ok(config_dir.join("config.toml"))
    }

    fn save_default(path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create config directory")?;
        }
        let toml_string = toml::to_string_pretty(&Self::default())
            .context("failed to serialize default config")?;
        fs::write(path, toml_string).context("failed to write default config file")?;
        info!("created default config file at {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_within_range() {
        let config = Config::default().validated();
        assert!(config.desktops >= 1 && config.desktops <= MAX_DESKTOPS);
        assert!(config.title_height > 0);
    }

    #[test]
    fn desktop_count_is_clamped() {
        let config = Config {
            desktops: 99,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.desktops, MAX_DESKTOPS);

        let config = Config {
            desktops: 0,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.desktops, 1);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str("title_height = 24").unwrap();
        assert_eq!(config.title_height, 24);
        assert_eq!(config.border_width, Config::default().border_width);
    }
}
