//! # Adhanr Library
//!
//! Internal library for the adhanr binary application
//!
//! This library exists to enable testing of the scheduling internals and to
//! keep a clean separation between CLI dispatch (main.rs) and application logic.
//!
//! ## Architecture
//!
//! - **Entry Point**: `Adhanr` acquires resources (config, lock, signals, sinks)
//! - **Core Logic**: `core` holds the polling loop, the `Scheduler` and the
//!   day-rollover decisions
//! - **Schedule**: `schedule` turns raw provider times into ordered events
//! - **Triggers**: `trigger` arms and fires minute-precision triggers
//! - **Provider**: `provider` fetches raw prayer times over HTTP
//! - **Recitation**: `recitation` picks, downloads and caches the evening recitation
//! - **Configuration**: `config` for TOML-based settings
//! - **Commands**: `commands` for the `times`, `simulate` and `help` subcommands
//! - **Infrastructure**: signal handling, lock file, audio and display sinks,
//!   the swappable clock and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod common;

// Public API modules
pub mod args;
pub mod commands;
pub mod config;
pub mod core;
pub mod io;
pub mod provider;
pub mod recitation;
pub mod schedule;
pub mod time;
pub mod trigger;

mod adhanr;

// Re-export for binary
pub use adhanr::Adhanr;
