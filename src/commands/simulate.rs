//! Implementation of the `simulate` command for testing time-based behavior.
//!
//! This command installs a fast-forward time source so the daemon loop can
//! replay hours of arming, firing and rollover in seconds. Control then
//! returns to main.rs, which runs the daemon as usual.

use anyhow::Result;
use std::sync::Arc;

use crate::time::source::{self, FastForwardTimeSource};

/// Set up the simulated clock between two `YYYY-MM-DD HH:MM:SS` instants.
///
/// # Arguments
/// * `start_time` - Start time in format "YYYY-MM-DD HH:MM:SS"
/// * `end_time` - End time in format "YYYY-MM-DD HH:MM:SS"
/// * `debug_enabled` - Whether debug mode is enabled
pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    debug_enabled: bool,
) -> Result<()> {
    let start = source::parse_datetime(start_time)
        .map_err(|e| anyhow::anyhow!("Invalid start time: {}", e))?;
    let end = source::parse_datetime(end_time)
        .map_err(|e| anyhow::anyhow!("Invalid end time: {}", e))?;

    if end <= start {
        anyhow::bail!("End time must be after start time");
    }

    // Must happen before any logging so every line carries the simulated clock
    source::init_time_source(Arc::new(FastForwardTimeSource::new(start, end)));

    log_version!();
    log_block_start!("Simulation Mode");

    let duration = end.signed_duration_since(start);
    log_decorated!(
        "Simulating from {} to {}",
        start.format("%Y-%m-%d %H:%M:%S"),
        end.format("%Y-%m-%d %H:%M:%S")
    );
    log_indented!(
        "Total simulated time: {} hours {} minutes",
        duration.num_hours(),
        duration.num_minutes() % 60
    );
    log_indented!("Audio is logged instead of played");

    if debug_enabled {
        log_pipe!();
        log_debug!("Fast-forward time source initialized");
    }

    Ok(())
}

/// Display detailed help for the simulate command.
pub fn display_help() {
    log_version!();
    log_block_start!("simulate - Run the scheduler on a fast-forward clock");
    log_block_start!("Usage: adhanr simulate <start> <end> [--debug] [--log <file>]");
    log_block_start!("Arguments:");
    log_indented!("start  First simulated instant, \"YYYY-MM-DD HH:MM:SS\"");
    log_indented!("end    Last simulated instant, must be after start");
    log_block_start!("Notes:");
    log_indented!("Prayer times are fetched from the configured provider as usual");
    log_indented!("Audio is logged instead of played and no lock file is taken");
    log_block_start!("Examples:");
    log_indented!("# Watch one evening roll over into the next day");
    log_indented!("adhanr simulate \"2026-10-16 18:00:00\" \"2026-10-17 06:00:00\"");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_before_start_rejected() {
        let err = handle_simulate_command("2026-10-16 12:00:00", "2026-10-16 11:00:00", false)
            .unwrap_err();
        assert!(err.to_string().contains("End time must be after start time"));
    }

    #[test]
    fn test_bad_start_rejected() {
        let err = handle_simulate_command("yesterday", "2026-10-16 11:00:00", false).unwrap_err();
        assert!(err.to_string().contains("Invalid start time"));
    }
}
