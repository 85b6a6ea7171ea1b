//! Core application loop.
//!
//! `Core` owns the [`Scheduler`] and the signal channel. Once per second it
//! reads the clock, ticks the scheduler (which resynchronizes itself after
//! a date jump) and then waits on the signal channel for the rest of the interval, so a shutdown
//! or resync request is handled within one tick.

pub mod rollover;
pub mod scheduler;

use anyhow::Result;
use chrono::NaiveDateTime;
use std::{fs::File, path::PathBuf, sync::mpsc::RecvTimeoutError, time::Duration};

use crate::{
    common::{constants::*, utils},
    config::{self, Config},
    io::{
        lock,
        signals::{SignalMessage, SignalState},
    },
    provider,
    recitation::{RecitationCache, RecitationSource},
};

pub use scheduler::{RecitationSettings, Scheduler, SchedulerSettings};

/// Parameters for creating a Core instance.
pub(crate) struct CoreParams {
    pub scheduler: Scheduler,
    pub signal_state: SignalState,
    pub debug_enabled: bool,
    pub lock_info: Option<(File, PathBuf)>,
}

pub(crate) struct Core {
    scheduler: Scheduler,
    signal_state: SignalState,
    debug_enabled: bool,
    lock_info: Option<(File, PathBuf)>,
}

/// Current local time from the process time source.
fn local_now() -> NaiveDateTime {
    crate::time::source::now().naive_local()
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            scheduler: params.scheduler,
            signal_state: params.signal_state,
            debug_enabled: params.debug_enabled,
            lock_info: params.lock_info,
        }
    }

    /// Run until a shutdown signal arrives or a simulation ends.
    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!("Base directory: {}", utils::private_path(&custom_dir));
        }

        self.scheduler.start(local_now());
        self.main_loop();

        log_block_start!("Shutting down...");
        self.scheduler.shutdown();
        if let Some((lock_file, lock_path)) = self.lock_info.take() {
            lock::release_lock(lock_file, &lock_path);
        }
        log_end!();
        Ok(())
    }

    fn main_loop(&mut self) {
        'main_loop: while self.signal_state.is_running()
            && !crate::time::source::simulation_ended()
        {
            let now = local_now();
            let fired = self.scheduler.tick(now);
            if self.debug_enabled {
                for action in fired {
                    log_debug!("Fired {} trigger at {}", action.tag(), now.format("%H:%M:%S"));
                }
            }

            match self.wait_for_signal() {
                Some(SignalMessage::Shutdown) => break 'main_loop,
                Some(SignalMessage::Resync) => self.resync(),
                None => {}
            }
        }
    }

    /// Block for one tick interval or until a signal arrives.
    fn wait_for_signal(&self) -> Option<SignalMessage> {
        let interval = Duration::from_millis(TICK_INTERVAL_MS);

        // Simulated time advances on sleep, so poll the channel afterwards
        if crate::time::source::is_simulated() {
            crate::time::source::sleep(interval);
            return self.signal_state.signal_receiver.try_recv().ok();
        }

        match self.signal_state.signal_receiver.recv_timeout(interval) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log_critical!("Signal channel closed, stopping");
                Some(SignalMessage::Shutdown)
            }
        }
    }

    /// Reload the configuration and rebuild. A bad file keeps the old
    /// settings.
    fn resync(&mut self) {
        let now = local_now();
        match Config::load() {
            Ok(config) => {
                log_decorated!("Configuration reloaded");
                self.scheduler.reconfigure(
                    SchedulerSettings::from_config(&config),
                    provider::from_config(&config),
                    recitation_source(&config),
                    now,
                );
            }
            Err(e) => {
                log_error!("Configuration reload failed: {e}");
                log_indented!("Keeping the current settings");
                self.scheduler.rebuild(now);
            }
        }
    }
}

/// The configured recitation source, if recitation is enabled.
pub(crate) fn recitation_source(config: &Config) -> Option<Box<dyn RecitationSource>> {
    RecitationCache::from_config(config).map(|cache| Box::new(cache) as Box<dyn RecitationSource>)
}
