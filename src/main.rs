//! Main application entry point.
//!
//! Parses the command line and dispatches to the matching command or to the
//! [`Adhanr`] daemon runner. Everything else lives in the library crate.

use anyhow::Result;
use std::sync::Arc;

use adhanr::args::{self, CliAction, ParsedArgs};
use adhanr::common::logger::{Log, LoggerGuard};
use adhanr::time::source::{self, RealTimeSource};
use adhanr::{Adhanr, commands, config};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::from_env();

    match parsed_args.action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp | CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(())
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::Run {
            debug_enabled,
            config_dir,
            log_file,
        } => {
            config::set_config_dir(config_dir)?;
            let _log_guard = start_file_logging(log_file)?;
            source::init_time_source(Arc::new(RealTimeSource));
            Adhanr::new(debug_enabled).run()
        }
        CliAction::Times { date, config_dir } => {
            config::set_config_dir(config_dir)?;
            source::init_time_source(Arc::new(RealTimeSource));
            commands::times::handle_times_command(date.as_deref())
        }
        CliAction::Simulate {
            debug_enabled,
            start_time,
            end_time,
            config_dir,
            log_file,
        } => {
            config::set_config_dir(config_dir)?;
            // Keep the writer alive until the simulation has flushed its last line
            let _log_guard = start_file_logging(log_file)?;
            commands::simulate::handle_simulate_command(&start_time, &end_time, debug_enabled)?;
            Adhanr::new(debug_enabled).without_lock().simulated().run()
        }
    }
}

fn start_file_logging(log_file: Option<String>) -> Result<Option<LoggerGuard>> {
    log_file.map(Log::start_file_logging).transpose()
}
