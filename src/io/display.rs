//! Two-line character display output.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::common::utils::private_path;

/// A two-line character display.
pub trait DisplaySink {
    /// Replace both lines. Callers pass raw text; sinks fit it to the width.
    fn write(&mut self, line1: &str, line2: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

/// Truncate `text` to `width` characters and right-pad it with spaces.
pub fn fit_line(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

/// Writes to a Linux character LCD device such as the `charlcd` driver's
/// `/dev/lcd`, which clears on form feed and wraps on newline.
pub struct CharDeviceDisplay {
    device: File,
    width: usize,
}

impl CharDeviceDisplay {
    pub fn open(path: &Path, width: usize) -> Result<Self> {
        let device = OpenOptions::new()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open display device {}", private_path(path)))?;
        Ok(Self { device, width })
    }
}

impl DisplaySink for CharDeviceDisplay {
    fn write(&mut self, line1: &str, line2: &str) -> Result<()> {
        let frame = format!(
            "\x0c{}\n{}",
            fit_line(line1, self.width),
            fit_line(line2, self.width)
        );
        self.device
            .write_all(frame.as_bytes())
            .context("Failed to write to display")?;
        self.device.flush().context("Failed to flush display")
    }

    fn clear(&mut self) -> Result<()> {
        self.device
            .write_all(b"\x0c")
            .context("Failed to clear display")
    }
}

/// Logs display content, only when it changes.
#[derive(Debug)]
pub struct LogDisplay {
    width: usize,
    last: Option<(String, String)>,
}

impl LogDisplay {
    pub fn new(width: usize) -> Self {
        Self { width, last: None }
    }
}

impl DisplaySink for LogDisplay {
    fn write(&mut self, line1: &str, line2: &str) -> Result<()> {
        let frame = (fit_line(line1, self.width), fit_line(line2, self.width));
        if self.last.as_ref() != Some(&frame) {
            log_indented!("Display: [{}] [{}]", frame.0, frame.1);
            self.last = Some(frame);
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.last = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fit_line_pads_and_truncates() {
        assert_eq!(fit_line("Fajr", 8), "Fajr    ");
        assert_eq!(fit_line("No prayers left today", 16), "No prayers left ");
        assert_eq!(fit_line("", 4), "    ");
        assert_eq!(fit_line("éèêëàâäô", 4), "éèêë");
    }

    #[test]
    fn test_char_device_frame() {
        let device = NamedTempFile::new().unwrap();
        let mut display = CharDeviceDisplay::open(device.path(), 8).unwrap();
        display.write("Maghrib 19:45", "Isha").unwrap();

        let written = std::fs::read_to_string(device.path()).unwrap();
        assert_eq!(written, "\x0cMaghrib \nIsha    ");
    }

    #[test]
    fn test_missing_device_is_error() {
        assert!(CharDeviceDisplay::open(Path::new("/nonexistent/lcd"), 16).is_err());
    }

    #[test]
    fn test_log_display_remembers_last_frame() {
        let mut display = LogDisplay::new(16);
        display.write("a", "b").unwrap();
        assert_eq!(
            display.last,
            Some((fit_line("a", 16), fit_line("b", 16)))
        );
        display.clear().unwrap();
        assert!(display.last.is_none());
    }
}
