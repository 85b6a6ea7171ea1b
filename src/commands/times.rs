//! Implementation of the `times` command.
//!
//! Fetches one day's timings through the same provider and schedule builder
//! the daemon uses, without pruning, and prints them. Useful to check a new
//! location or calculation method before restarting the daemon.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::common::constants::EXIT_FAILURE;
use crate::config::Config;
use crate::provider;
use crate::schedule::Schedule;

/// Print the timetable for `date` (today when `None`).
///
/// Exits with `EXIT_FAILURE` if the provider returned nothing usable.
pub fn handle_times_command(date: Option<&str>) -> Result<()> {
    let date = match date {
        Some(raw) => parse_date(raw)?,
        None => crate::time::source::now().date_naive(),
    };

    let config = Config::load()?;
    let location = config.location();
    let provider = provider::from_config(&config);

    log_version!();
    log_block_start!("Prayer times for {}", date.format("%Y-%m-%d"));
    log_indented!("{} via {}", location, provider.name());

    let schedule = Schedule::from_timings(date, &provider.fetch(date, &location));

    if schedule.is_degraded() {
        log_pipe!();
        log_error!("No prayer times available for {}", date.format("%Y-%m-%d"));
        log_end!();
        std::process::exit(EXIT_FAILURE);
    }

    log_pipe!();
    for line in timetable_lines(&schedule) {
        log_decorated!("{line}");
    }
    log_end!();
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{raw}'. Use YYYY-MM-DD"))
}

/// One aligned line per prayer; missing times are marked.
fn timetable_lines(schedule: &Schedule) -> Vec<String> {
    schedule
        .events()
        .iter()
        .map(|event| {
            let marker = if event.provided { "" } else { "  (missing)" };
            let next_day = if event.time.date() > schedule.date() {
                "  (+1 day)"
            } else {
                ""
            };
            format!(
                "{:<8} {}{}{}",
                event.name.as_str(),
                event.hour_minute(),
                next_day,
                marker
            )
        })
        .collect()
}

/// Display detailed help for the times command.
pub fn display_help() {
    log_version!();
    log_block_start!("times - Print the prayer times for a day");
    log_block_start!("Usage: adhanr times [DATE]");
    log_block_start!("Arguments:");
    log_indented!("DATE  Day to fetch as YYYY-MM-DD (default: today)");
    log_block_start!("Notes:");
    log_indented!("Uses the location and method from the configuration");
    log_indented!("Exits with an error if the provider returns no times");
    log_block_start!("Examples:");
    log_indented!("adhanr times");
    log_indented!("adhanr times 2026-03-20");
    log_end!();
}
