//! Prayer-time providers.
//!
//! A provider turns a calendar date and a location into the five raw
//! `HH:MM` strings for that day. Providers never fail towards their caller:
//! any network, status or payload problem is logged and degrades to an
//! empty [`RawTimings`], which the schedule builder turns into sentinels.

pub mod aladhan;

use chrono::NaiveDate;
use std::fmt;

use crate::common::constants::{DEFAULT_METHOD, DEFAULT_PROVIDER_URL};
use crate::config::Config;
use crate::schedule::RawTimings;

pub use aladhan::AladhanProvider;

/// Where to compute prayer times for.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Coordinates { latitude: f64, longitude: f64 },
    City { city: String, country: String },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Coordinates {
                latitude,
                longitude,
            } => write!(f, "{latitude:.4}°, {longitude:.4}°"),
            Location::City { city, country } => write!(f, "{city}, {country}"),
        }
    }
}

/// Source of raw prayer times for a date.
#[cfg_attr(test, mockall::automock)]
pub trait TimingsProvider {
    /// Fetch the timings for `date` at `location`.
    ///
    /// Returns an empty mapping on any failure.
    fn fetch(&self, date: NaiveDate, location: &Location) -> RawTimings;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// The configured provider.
pub fn from_config(config: &Config) -> Box<dyn TimingsProvider> {
    Box::new(AladhanProvider::new(
        config.provider_url.as_deref().unwrap_or(DEFAULT_PROVIDER_URL),
        config.method.unwrap_or(DEFAULT_METHOD),
        config.fetch_timeout(),
    ))
}
