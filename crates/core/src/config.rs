//! Application configuration.
//!
//! A TOML file under the platform config directory, with `TALLYTUI_`
//! environment variables layered on top. Every key has a default, so a
//! missing file is never an error.

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::modality::DEFAULT_GESTURE_BREAKPOINT;

const CONFIG_DIR: &str = "tallytui";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# tallytui configuration. Every key is optional; commented values show the
# defaults. Environment variables prefixed TALLYTUI_ override this file.

# Profile whose records are loaded and edited.
# profile = \"default\"

# Widest terminal, in columns, that still gets gesture input.
# gesture_breakpoint = 100

# Ring the terminal bell as gesture feedback.
# bell_feedback = true

# Where record documents live. Defaults to the platform data directory.
# data_root = \"/path/to/data\"

# Where exported snapshots are written. Defaults to <data_root>/exports.
# export_dir = \"/path/to/exports\"
";

/// Runtime configuration for both crates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory of the record store.
    pub data_root: PathBuf,
    /// Profile whose records are loaded and edited.
    pub profile: String,
    /// Widest terminal, in columns, that still gets gesture input.
    pub gesture_breakpoint: u16,
    /// Ring the terminal bell as gesture feedback.
    pub bell_feedback: bool,
    /// Where exported snapshots are written.
    pub export_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from defaults, the config file, and environment
    /// overrides, in that order.
    pub fn load() -> Result<Self> {
        let data_root = default_data_root();
        let export_dir = data_root.join("exports");

        let settings = Config::builder()
            .set_default("data_root", data_root.to_string_lossy().as_ref())?
            .set_default("profile", "default")?
            .set_default(
                "gesture_breakpoint",
                i64::from(DEFAULT_GESTURE_BREAKPOINT),
            )?
            .set_default("bell_feedback", true)?
            .set_default("export_dir", export_dir.to_string_lossy().as_ref())?
            .add_source(File::from(config_path()).required(false))
            .add_source(Environment::with_prefix("TALLYTUI"))
            .build()
            .context("failed to load configuration")?;

        settings
            .try_deserialize()
            .context("invalid configuration values")
    }
}

/// Path of the user's config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

fn default_data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    std::fs::write(&path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write default config {}", path.display()))
}
