//! Configuration for the adhanr daemon.
//!
//! Settings live in `adhanr.toml`, by default under
//! `$XDG_CONFIG_HOME/adhanr/`, or in the directory passed with `--config`.
//! A commented default file is written on first run.
//!
//! ```toml
//! #[Location]
//! city = "Montreal"            # City name (used when no coordinates are set)
//! country = "Canada"           # Country for the city lookup
//! # latitude = 45.5017         # Coordinates take precedence over city/country
//! # longitude = -73.5673
//! method = 2                   # Provider calculation method id
//!
//! #[Provider]
//! provider_url = "https://api.aladhan.com/v1"
//! fetch_timeout = 10           # Seconds before a fetch is abandoned (1-60)
//! refresh_offset = 3           # Minutes after Isha to fetch the next day (1-120)
//!
//! #[Audio]
//! adhan_asset = "/usr/share/adhanr/adhan.mp3"
//! player = "mpg123"            # Player command, the asset path is appended
//!
//! #[Display]
//! # display_device = "/dev/lcd"  # Character LCD device (log output when unset)
//! display_width = 16           # Columns per line (8-40)
//! poll_interval = 5            # Seconds between status refreshes (1-300)
//!
//! #[Recitation]
//! recitation = false           # Play a recitation before Maghrib
//! recitation_offset = 15       # Minutes before Maghrib (1-120)
//! reciter_id = 7
//! recitation_rotation = [18, 32, 36, 55, 56, 67, 76, 78]
//! ```
//!
//! Every field is optional in the file. `load_from_path` validates what was
//! written and then fills the gaps with the defaults from
//! `common::constants`, so code reading a loaded `Config` may rely on the
//! defaulted fields being `Some`.

pub mod builder;
pub mod loading;
pub mod validation;


use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::constants::*;
use crate::common::utils::private_path;
use crate::provider::Location;

pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Settings read from `adhanr.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub method: Option<u8>,

    pub provider_url: Option<String>,
    pub fetch_timeout: Option<u64>,  // seconds
    pub refresh_offset: Option<u64>, // minutes after the last prayer

    pub adhan_asset: Option<String>,
    pub player: Option<String>,

    pub display_device: Option<String>,
    pub display_width: Option<usize>,
    pub poll_interval: Option<u64>, // seconds

    pub recitation: Option<bool>,
    pub recitation_offset: Option<u64>, // minutes before Maghrib
    pub reciter_id: Option<u32>,
    pub recitation_rotation: Option<Vec<u32>>,
    pub recitation_api: Option<String>,
    pub recitation_fallback: Option<String>,
    pub cache_dir: Option<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        load()
    }

    /// Location to fetch prayer times for. Coordinates win over city.
    pub fn location(&self) -> Location {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Location::Coordinates {
                latitude,
                longitude,
            },
            _ => Location::City {
                city: self.city.clone().unwrap_or_else(|| DEFAULT_CITY.to_string()),
                country: self
                    .country
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            },
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT))
    }

    pub fn refresh_offset(&self) -> chrono::Duration {
        minutes(self.refresh_offset.unwrap_or(DEFAULT_REFRESH_OFFSET))
    }

    pub fn recitation_offset(&self) -> chrono::Duration {
        minutes(self.recitation_offset.unwrap_or(DEFAULT_RECITATION_OFFSET))
    }

    pub fn poll_interval(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL) as i64)
    }

    pub fn display_width(&self) -> usize {
        self.display_width.unwrap_or(DEFAULT_DISPLAY_WIDTH)
    }

    pub fn adhan_asset(&self) -> PathBuf {
        PathBuf::from(
            self.adhan_asset
                .as_deref()
                .unwrap_or(DEFAULT_ADHAN_ASSET),
        )
    }

    pub fn recitation_enabled(&self) -> bool {
        self.recitation.unwrap_or(DEFAULT_RECITATION)
    }

    pub fn recitation_rotation(&self) -> Vec<u32> {
        self.recitation_rotation
            .clone()
            .unwrap_or_else(|| DEFAULT_RECITATION_ROTATION.to_vec())
    }

    /// Directory holding downloaded recitations.
    pub fn cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("adhanr")
                .join("recitations"),
        }
    }

    /// Print the effective configuration as a log block.
    pub fn log_config(&self) {
        match get_config_path() {
            Ok(path) => log_block_start!("Loaded configuration from {}", private_path(&path)),
            Err(_) => log_block_start!("Loaded configuration"),
        }
        log_indented!("Location: {}", self.location());
        log_indented!(
            "Provider: {} (method {})",
            self.provider_url.as_deref().unwrap_or(DEFAULT_PROVIDER_URL),
            self.method.unwrap_or(DEFAULT_METHOD)
        );
        log_indented!(
            "Refresh: {} min after the last prayer",
            self.refresh_offset.unwrap_or(DEFAULT_REFRESH_OFFSET)
        );
        log_indented!("Adhan: {}", private_path(&self.adhan_asset()));
        match &self.display_device {
            Some(device) => log_indented!("Display: {device} ({} columns)", self.display_width()),
            None => log_indented!("Display: log output ({} columns)", self.display_width()),
        }
        if self.recitation_enabled() {
            log_indented!(
                "Recitation: {} min before Maghrib, reciter {}",
                self.recitation_offset.unwrap_or(DEFAULT_RECITATION_OFFSET),
                self.reciter_id.unwrap_or(DEFAULT_RECITER_ID)
            );
        } else {
            log_indented!("Recitation: disabled");
        }
    }
}

fn minutes(value: u64) -> chrono::Duration {
    chrono::Duration::minutes(value as i64)
}
