//! Help command implementation for adhanr.
//!
//! This module provides a dispatcher for the help command that shows
//! command-specific help or general help based on the arguments provided.

use anyhow::Result;

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("help") | Some("h") => display_help_help(),
        Some("simulate") | Some("S") => super::simulate::display_help(),
        Some("times") | Some("t") => super::times::display_help(),
        Some(unknown) => {
            log_warning_standalone!("Unknown command: {}", unknown);
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("help, h [COMMAND]         Show detailed help for a command");
    log_indented!("simulate, S <start> <end> Run the scheduler on a fast-forward clock");
    log_indented!("times, t [DATE]           Print the prayer times for a day");
    log_pipe!();
    log_info!("Use 'adhanr help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'adhanr --help' to see all options and general usage.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: adhanr help [COMMAND]");
    log_block_start!("Arguments:");
    log_indented!("COMMAND  Optional command to get help for");
    log_indented!("         If omitted, shows general help");
    log_block_start!("Examples:");
    log_indented!("# Show general help");
    log_indented!("adhanr help");
    log_pipe!();
    log_indented!("# Show help for specific commands");
    log_indented!("adhanr help times");
    log_indented!("adhanr help simulate");
    log_end!();
}
