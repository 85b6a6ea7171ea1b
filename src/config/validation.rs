//! Configuration validation.
//!
//! Runs on the file as written, before defaults are applied, so error
//! messages name the values the user actually typed.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;

/// Reject configurations the daemon cannot run with.
pub fn validate_config(config: &Config) -> Result<()> {
    match (config.latitude, config.longitude) {
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("latitude and longitude must be set together")
        }
        _ => {}
    }

    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    match (&config.city, &config.country) {
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("city and country must be set together")
        }
        (Some(city), Some(country)) if city.trim().is_empty() || country.trim().is_empty() => {
            anyhow::bail!("city and country must not be empty")
        }
        _ => {}
    }

    validate_range(
        config.fetch_timeout,
        MINIMUM_FETCH_TIMEOUT,
        MAXIMUM_FETCH_TIMEOUT,
        "fetch_timeout",
        "seconds",
    )?;
    validate_range(
        config.refresh_offset,
        MINIMUM_OFFSET,
        MAXIMUM_OFFSET,
        "refresh_offset",
        "minutes",
    )?;
    validate_range(
        config.recitation_offset,
        MINIMUM_OFFSET,
        MAXIMUM_OFFSET,
        "recitation_offset",
        "minutes",
    )?;
    validate_range(
        config.poll_interval,
        MINIMUM_POLL_INTERVAL,
        MAXIMUM_POLL_INTERVAL,
        "poll_interval",
        "seconds",
    )?;

    if let Some(width) = config.display_width
        && !(MINIMUM_DISPLAY_WIDTH..=MAXIMUM_DISPLAY_WIDTH).contains(&width)
    {
        anyhow::bail!(
            "display_width ({}) must be between {} and {} columns",
            width,
            MINIMUM_DISPLAY_WIDTH,
            MAXIMUM_DISPLAY_WIDTH
        );
    }

    if let Some(ref rotation) = config.recitation_rotation
        && rotation.is_empty()
    {
        anyhow::bail!("recitation_rotation must list at least one chapter");
    }

    if let Some(ref player) = config.player
        && player.split_whitespace().next().is_none()
    {
        anyhow::bail!("player must name a command");
    }

    for (field, value) in [
        ("provider_url", &config.provider_url),
        ("recitation_api", &config.recitation_api),
    ] {
        if let Some(url) = value
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            anyhow::bail!("{field} must be an http(s) URL (got {url:?})");
        }
    }

    Ok(())
}

fn validate_range(value: Option<u64>, min: u64, max: u64, field: &str, unit: &str) -> Result<()> {
    if let Some(value) = value
        && !(min..=max).contains(&value)
    {
        anyhow::bail!("{field} ({value} {unit}) must be between {min} and {max} {unit}");
    }
    Ok(())
}
