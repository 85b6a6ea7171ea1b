//! Command-line command handlers for adhanr.
//!
//! One-shot commands that do not start the daemon, plus the simulation
//! setup that runs before it. Each command lives in its own submodule.

pub mod help;
pub mod simulate;
pub mod times;
