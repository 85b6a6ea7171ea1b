//! Generation of the default `adhanr.toml`.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;
use crate::common::utils::private_path;

/// Write a commented default configuration to `path`.
///
/// Parent directories are created as needed. An existing file is left alone.
pub fn create_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create config directory {}", private_path(parent))
        })?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))?;

    log_block_start!("Created default config file: {}", private_path(path));
    log_indented!("Location: {DEFAULT_CITY}, {DEFAULT_COUNTRY}");
    log_indented!("Edit it to set your city or coordinates");

    Ok(())
}

pub(crate) fn default_config_content() -> String {
    let rotation = DEFAULT_RECITATION_ROTATION
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let mut content = ConfigBuilder::new()
        .add_section("Location")
        .add_setting(
            "city",
            &format!("\"{DEFAULT_CITY}\""),
            "City name, used when no coordinates are set",
        )
        .add_setting(
            "country",
            &format!("\"{DEFAULT_COUNTRY}\""),
            "Country for the city lookup",
        )
        .add_commented_setting(
            "latitude",
            "45.5017",
            "Coordinates take precedence over city/country",
        )
        .add_commented_setting("longitude", "-73.5673", "Set together with latitude")
        .add_setting(
            "method",
            &DEFAULT_METHOD.to_string(),
            "Provider calculation method id",
        )
        .add_section("Provider")
        .add_setting(
            "provider_url",
            &format!("\"{DEFAULT_PROVIDER_URL}\""),
            "Prayer time service",
        )
        .add_setting(
            "fetch_timeout",
            &DEFAULT_FETCH_TIMEOUT.to_string(),
            &format!(
                "Seconds before a fetch is abandoned ({MINIMUM_FETCH_TIMEOUT}-{MAXIMUM_FETCH_TIMEOUT})"
            ),
        )
        .add_setting(
            "refresh_offset",
            &DEFAULT_REFRESH_OFFSET.to_string(),
            &format!(
                "Minutes after the last prayer to fetch the next day ({MINIMUM_OFFSET}-{MAXIMUM_OFFSET})"
            ),
        )
        .add_section("Audio")
        .add_setting(
            "adhan_asset",
            &format!("\"{DEFAULT_ADHAN_ASSET}\""),
            "Adhan audio file",
        )
        .add_setting(
            "player",
            &format!("\"{DEFAULT_PLAYER}\""),
            "Player command, the file path is appended",
        )
        .add_section("Display")
        .add_commented_setting(
            "display_device",
            "\"/dev/lcd\"",
            "Character display device, log output when unset",
        )
        .add_setting(
            "display_width",
            &DEFAULT_DISPLAY_WIDTH.to_string(),
            &format!("Columns per line ({MINIMUM_DISPLAY_WIDTH}-{MAXIMUM_DISPLAY_WIDTH})"),
        )
        .add_setting(
            "poll_interval",
            &DEFAULT_POLL_INTERVAL.to_string(),
            &format!(
                "Seconds between status refreshes ({MINIMUM_POLL_INTERVAL}-{MAXIMUM_POLL_INTERVAL})"
            ),
        )
        .add_section("Recitation")
        .add_setting(
            "recitation",
            &DEFAULT_RECITATION.to_string(),
            "Play a recitation before Maghrib",
        )
        .add_setting(
            "recitation_offset",
            &DEFAULT_RECITATION_OFFSET.to_string(),
            &format!("Minutes before Maghrib ({MINIMUM_OFFSET}-{MAXIMUM_OFFSET})"),
        )
        .add_setting(
            "reciter_id",
            &DEFAULT_RECITER_ID.to_string(),
            "Reciter id on the recitation service",
        )
        .add_setting(
            "recitation_rotation",
            &format!("[{rotation}]"),
            "Chapters chosen from, one per day",
        )
        .add_setting(
            "recitation_api",
            &format!("\"{DEFAULT_RECITATION_API}\""),
            "Recitation service",
        )
        .add_commented_setting(
            "recitation_fallback",
            "\"/usr/share/adhanr/recitation.mp3\"",
            "Played when a download fails",
        )
        .add_commented_setting(
            "cache_dir",
            "\"~/.cache/adhanr/recitations\"",
            "Where downloaded recitations are kept",
        )
        .build();
    content.push('\n');
    content
}

/// Builds config files with comments aligned in one column.
struct ConfigBuilder {
    entries: Vec<EntryType>,
}

enum EntryType {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(EntryType::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(EntryType::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting shown in the file but disabled.
    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(EntryType::Setting {
            line: format!("# {key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                EntryType::Setting { line, .. } => Some(line.len()),
                EntryType::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                EntryType::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                EntryType::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
