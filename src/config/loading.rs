//! Locating, reading and defaulting the configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Configuration directory chosen with `--config`, set once at startup.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Set the configuration directory for this process. Errors if already set.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Path of `adhanr.toml`: the custom directory if one was set, otherwise
/// `$XDG_CONFIG_HOME/adhanr/adhanr.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join("adhanr.toml"));
    }
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("adhanr").join("adhanr.toml"))
}

/// Load the configuration, writing the default file first if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        super::builder::create_default_config(&config_path)
            .context("Failed to create default config during load")?;
    }

    load_from_path(&config_path).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            private_path(&config_path)
        )
    })
}

/// Load, validate and default a specific file. Never creates the file.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", private_path(path));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", private_path(path)))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", private_path(path)))?;

    validate_config(&config)?;
    apply_defaults(&mut config);

    Ok(config)
}

/// Fill every unset field with its default.
///
/// City and country are only defaulted when no coordinates are configured,
/// so the location shown in logs is the one actually used.
pub(crate) fn apply_defaults(config: &mut Config) {
    let has_coordinates = config.latitude.is_some() && config.longitude.is_some();
    if !has_coordinates {
        config.city.get_or_insert_with(|| DEFAULT_CITY.to_string());
        config
            .country
            .get_or_insert_with(|| DEFAULT_COUNTRY.to_string());
    }

    config.method.get_or_insert(DEFAULT_METHOD);
    config
        .provider_url
        .get_or_insert_with(|| DEFAULT_PROVIDER_URL.to_string());
    config.fetch_timeout.get_or_insert(DEFAULT_FETCH_TIMEOUT);
    config.refresh_offset.get_or_insert(DEFAULT_REFRESH_OFFSET);

    config
        .adhan_asset
        .get_or_insert_with(|| DEFAULT_ADHAN_ASSET.to_string());
    config
        .player
        .get_or_insert_with(|| DEFAULT_PLAYER.to_string());

    config.display_width.get_or_insert(DEFAULT_DISPLAY_WIDTH);
    config.poll_interval.get_or_insert(DEFAULT_POLL_INTERVAL);

    config.recitation.get_or_insert(DEFAULT_RECITATION);
    config
        .recitation_offset
        .get_or_insert(DEFAULT_RECITATION_OFFSET);
    config.reciter_id.get_or_insert(DEFAULT_RECITER_ID);
    config
        .recitation_rotation
        .get_or_insert_with(|| DEFAULT_RECITATION_ROTATION.to_vec());
    config
        .recitation_api
        .get_or_insert_with(|| DEFAULT_RECITATION_API.to_string());
}
