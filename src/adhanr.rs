//! Application coordinator that manages the complete lifecycle of adhanr.
//!
//! This module handles resource acquisition and hands the result to
//! [`Core`]. It manages:
//! - Configuration loading
//! - Lock file management for single-instance enforcement
//! - Signal handler setup
//! - Construction of the provider, audio, display and recitation sinks
//!
//! The `Adhanr` struct uses a builder pattern to support different startup contexts:
//! - Normal startup: `Adhanr::new(debug_enabled).run()`
//! - Simulation mode: `Adhanr::new(debug_enabled).without_lock().simulated().run()`

use anyhow::Result;
use std::path::Path;

use crate::{
    common::constants::{DEFAULT_PLAYER, EXIT_FAILURE},
    config::Config,
    core::{self, Core, CoreParams, Scheduler, SchedulerSettings},
    io::{
        audio::{AudioSink, LogAudio, PlayerAudio},
        display::{CharDeviceDisplay, DisplaySink, LogDisplay},
        lock,
        signals::setup_signal_handler,
    },
    provider,
};

/// Builder for configuring and running the adhanr daemon.
///
/// # Examples
///
/// ```no_run
/// use adhanr::Adhanr;
///
/// # fn main() -> anyhow::Result<()> {
/// // Normal daemon startup
/// Adhanr::new(false).run()?;
///
/// // Simulation: no lock, no speaker, no display device
/// Adhanr::new(true).without_lock().simulated().run()?;
/// # Ok(())
/// # }
/// ```
pub struct Adhanr {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
    log_sinks: bool, // Log audio and display instead of using hardware
}

impl Adhanr {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
            log_sinks: false,
        }
    }

    /// Skip lock file creation so a simulation can run beside the daemon
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Replace the player and display device with logging sinks
    pub fn simulated(mut self) -> Self {
        self.log_sinks = true;
        self.show_headers = false; // The simulate command prints its own header
        self
    }

    /// Execute the daemon with the configured settings.
    ///
    /// Startup problems (bad configuration, a second instance, an unopenable
    /// display) end the process with `EXIT_FAILURE`. Everything after that is
    /// recovered inside the core loop.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_error_exit!("Configuration failed");
                eprintln!("{:?}", e);
                std::process::exit(EXIT_FAILURE);
            }
        };

        let lock_info = if self.create_lock {
            match lock::acquire_lock()? {
                Some(lock_info) => Some(lock_info),
                // Conflict already reported with the running PID
                None => std::process::exit(EXIT_FAILURE),
            }
        } else {
            None
        };

        let signal_state = setup_signal_handler(self.debug_enabled)?;

        config.log_config();

        let (audio, display) = match self.create_sinks(&config) {
            Ok(sinks) => sinks,
            Err(e) => {
                log_error_exit!("Output setup failed");
                eprintln!("{:?}", e);
                if let Some((lock_file, lock_path)) = lock_info {
                    lock::release_lock(lock_file, &lock_path);
                }
                std::process::exit(EXIT_FAILURE);
            }
        };

        let mut scheduler = Scheduler::new(
            SchedulerSettings::from_config(&config),
            provider::from_config(&config),
            audio,
            display,
        );
        if let Some(source) = core::recitation_source(&config) {
            scheduler = scheduler.with_recitation_source(source);
        }

        if lock_info.is_some() {
            log_block_start!("Lock acquired, starting adhanr...");
        } else if !crate::time::source::is_simulated() {
            log_block_start!("Starting adhanr without a lock...");
        }

        let core = Core::new(CoreParams {
            scheduler,
            signal_state,
            debug_enabled: self.debug_enabled,
            lock_info,
        });

        core.execute()
    }

    fn create_sinks(&self, config: &Config) -> Result<(Box<dyn AudioSink>, Box<dyn DisplaySink>)> {
        if self.log_sinks {
            return Ok((
                Box::new(LogAudio::new()),
                Box::new(LogDisplay::new(config.display_width())),
            ));
        }

        let audio = PlayerAudio::new(config.player.as_deref().unwrap_or(DEFAULT_PLAYER))?;
        let display: Box<dyn DisplaySink> = match &config.display_device {
            Some(device) => Box::new(CharDeviceDisplay::open(
                Path::new(device),
                config.display_width(),
            )?),
            None => Box::new(LogDisplay::new(config.display_width())),
        };
        Ok((Box::new(audio), display))
    }
}
