//! Structured logging with box-drawing output.
//!
//! Every line adhanr prints goes through the macros in this module so that the
//! daemon log reads as one continuous tree:
//!
//! ```text
//! ┏ adhanr v0.3.0 ━━╸
//! ┃
//! ┣ Fetching prayer times for 16-10-2026
//! ┃   Montreal, Canada (method 2)
//! ┣[INFO] Armed prayer Dhuhr at 12:30
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new conceptual block (a fetch cycle, a fired
//!   action, shutdown). It prints a spacer pipe first.
//! - `log_decorated!` continues the current block, `log_indented!` nests
//!   details under it.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`
//!   carry a coloured level tag. Precede them with `log_pipe!` when they start a
//!   block of their own.
//! - `log_version!` is printed once at startup and `log_end!` once at exit.
//!
//! Output goes to stdout unless `--log <path>` routed it to a file, in which
//! case a writer thread owns the file and ANSI codes are stripped.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Line(String),
    Shutdown,
}

/// Logging switches and helpers used by the macros.
pub struct Log;

impl Log {
    /// Enable or disable all output (tests and the `times` command run quiet).
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Route all further output to `file_path`.
    ///
    /// The returned guard flushes and joins the writer thread when dropped,
    /// so it must live until the end of `main`.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Log file already configured"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)?;

            while let Ok(LogMessage::Line(text)) = rx.recv() {
                file.write_all(text.as_bytes())?;
            }
            file.flush()?;

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Simulated clock prefix, empty when running on real time.
    pub fn get_timestamp_prefix() -> String {
        if crate::time::source::is_initialized() && crate::time::source::is_simulated() {
            format!("[{}] ", crate::time::source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Keeps the file writer alive; dropping it flushes the log file.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Send a finished line to the log file or stdout.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Line(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

/// Format one log entry. `spaced` prepends an empty pipe line.
pub fn emit(spaced: bool, lead: &str, message: std::fmt::Arguments<'_>) {
    if !Log::is_enabled() {
        return;
    }
    let prefix = Log::get_timestamp_prefix();
    let formatted = if spaced {
        format!("{prefix}┃\n{prefix}{lead}{message}\n")
    } else {
        format!("{prefix}{lead}{message}\n")
    };
    write_output(&formatted);
}

/// Continue the current block: `┣ message`.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(false, "┣ ", format_args!($($arg)+))
    };
}

/// Nested detail line: `┃   message`.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(false, "┃   ", format_args!($($arg)+))
    };
}

/// Empty pipe line for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::common::logger::emit(false, "┃", format_args!(""))
    };
}

/// Start a new block: spacer pipe, then `┣ message`.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(true, "┣ ", format_args!($($arg)+))
    };
}

/// Startup header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::common::logger::emit(
            false,
            "┏ ",
            format_args!("adhanr v{} ━━╸", env!("CARGO_PKG_VERSION")),
        )
    };
}

/// Final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::common::logger::emit(false, "╹", format_args!(""))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(false, "┣[\x1b[33mWARNING\x1b[0m] ", format_args!($($arg)+))
    };
}

/// Warning outside the pipe tree (CLI errors before the header).
#[macro_export]
macro_rules! log_warning_standalone {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(false, "[\x1b[33mWARNING\x1b[0m] ", format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(false, "┣[\x1b[31mERROR\x1b[0m] ", format_args!($($arg)+))
    };
}

/// Error that terminates the run: spacer pipe, then `┗[ERROR] message`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(true, "┗[\x1b[31mERROR\x1b[0m] ", format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(false, "┣[\x1b[32mINFO\x1b[0m] ", format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(false, "┣[\x1b[32mDEBUG\x1b[0m] ", format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => {
        $crate::common::logger::emit(false, "┣[\x1b[31mCRITICAL\x1b[0m] ", format_args!($($arg)+))
    };
}
