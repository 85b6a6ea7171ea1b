//! Aladhan prayer-times API client.
//!
//! `GET {base}/timings/{DD-MM-YYYY}?latitude=..&longitude=..&method=..` or
//! `GET {base}/timingsByCity/{DD-MM-YYYY}?city=..&country=..&method=..`,
//! answered with `{"data": {"timings": {"Fajr": "05:12", ...}}}`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::{Location, TimingsProvider};
use crate::schedule::RawTimings;

#[derive(Debug, Deserialize)]
struct Envelope {
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    timings: HashMap<String, String>,
}

/// Parse a provider response body into canonical timings.
pub fn parse_timings(body: &str) -> Result<RawTimings> {
    let envelope: Envelope =
        serde_json::from_str(body).context("Malformed prayer times payload")?;
    let timings = RawTimings::from_provider_map(&envelope.data.timings);
    if timings.is_empty() {
        anyhow::bail!("Payload contained no prayer times");
    }
    Ok(timings)
}

/// Blocking HTTP client for api.aladhan.com (or a compatible mirror).
pub struct AladhanProvider {
    agent: ureq::Agent,
    base_url: String,
    method: u8,
}

impl AladhanProvider {
    pub fn new(base_url: &str, method: u8, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("adhanr/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            method,
        }
    }

    /// Build the request for `date`, without sending it.
    fn request(&self, date: NaiveDate, location: &Location) -> ureq::Request {
        let day = date.format("%d-%m-%Y");
        let method = self.method.to_string();
        match location {
            Location::Coordinates {
                latitude,
                longitude,
            } => self
                .agent
                .get(&format!("{}/timings/{day}", self.base_url))
                .query("latitude", &latitude.to_string())
                .query("longitude", &longitude.to_string())
                .query("method", &method),
            Location::City { city, country } => self
                .agent
                .get(&format!("{}/timingsByCity/{day}", self.base_url))
                .query("city", city)
                .query("country", country)
                .query("method", &method),
        }
    }

    fn try_fetch(&self, date: NaiveDate, location: &Location) -> Result<RawTimings> {
        let response = self
            .request(date, location)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => anyhow::anyhow!("Provider returned HTTP {code}"),
                ureq::Error::Transport(transport) => {
                    anyhow::anyhow!("Provider unreachable: {transport}")
                }
            })?;
        let body = response
            .into_string()
            .context("Failed to read provider response")?;
        parse_timings(&body)
    }
}

impl TimingsProvider for AladhanProvider {
    fn fetch(&self, date: NaiveDate, location: &Location) -> RawTimings {
        match self.try_fetch(date, location) {
            Ok(timings) => {
                log_decorated!(
                    "Fetched {} prayer times for {}",
                    timings.len(),
                    date.format("%d-%m-%Y")
                );
                timings
            }
            Err(e) => {
                log_pipe!();
                log_error!("Failed to fetch prayer times for {}: {e:#}", date.format("%d-%m-%Y"));
                log_indented!("Continuing with placeholder times until the next refresh");
                RawTimings::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        "Aladhan"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::PrayerName;

    const BODY: &str = r#"{
        "code": 200,
        "status": "OK",
        "data": {
            "timings": {
                "Fajr": "05:37",
                "Sunrise": "07:08",
                "Dhuhr": "12:38",
                "Asr": "15:35",
                "Sunset": "18:08",
                "Maghreb": "18:08",
                "Isha": "19:33",
                "Imsak": "05:27",
                "Midnight": "00:38"
            },
            "date": { "readable": "16 Oct 2026" }
        }
    }"#;

    #[test]
    fn test_parse_timings_canonicalizes() {
        let timings = parse_timings(BODY).unwrap();
        assert_eq!(timings.len(), 5);
        assert_eq!(timings.get(PrayerName::Maghrib), Some("18:08"));
        assert_eq!(timings.get(PrayerName::Isha), Some("19:33"));
    }

    #[test]
    fn test_parse_timings_rejects_malformed() {
        assert!(parse_timings("<html>gateway timeout</html>").is_err());
        assert!(parse_timings(r#"{"data": {}}"#).is_err());
        assert!(parse_timings(r#"{"data": {"timings": {"Sunrise": "07:08"}}}"#).is_err());
    }

    #[test]
    fn test_unreachable_provider_degrades_to_empty() {
        crate::common::logger::Log::set_enabled(false);
        // Port 9 (discard) on localhost refuses connections immediately.
        let provider = AladhanProvider::new("http://127.0.0.1:9/v1/", 2, Duration::from_secs(1));
        let location = Location::City {
            city: "Montreal".into(),
            country: "Canada".into(),
        };
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert!(provider.fetch(date, &location).is_empty());
    }

    #[test]
    fn test_request_url_uses_day_first_date() {
        let provider = AladhanProvider::new("https://api.aladhan.com/v1/", 2, Duration::from_secs(10));
        let location = Location::Coordinates {
            latitude: 45.5,
            longitude: -73.5,
        };
        let date = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
        let url = provider.request(date, &location).url().to_string();
        assert!(url.starts_with("https://api.aladhan.com/v1/timings/04-03-2026?"));
        assert!(url.contains("latitude=45.5"));
        assert!(url.contains("longitude=-73.5"));
        assert!(url.contains("method=2"));
    }
}
