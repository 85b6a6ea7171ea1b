//! Lock file management for single-instance enforcement.
//!
//! Two daemons driving the same speaker and display would double every
//! Adhan, so startup takes an exclusive `fs2` lock on
//! `$XDG_RUNTIME_DIR/adhanr.lock` and holds it for the life of the process.
//! The kernel drops the lock when the process exits, so a leftover file from
//! a crash never blocks the next start.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::utils::private_path;

/// Default lock file location.
pub fn lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("adhanr.lock")
}

/// Acquire the lock at the default location.
///
/// # Returns
/// - `Ok(Some((lock_file, lock_path)))` if the lock was acquired
/// - `Ok(None)` if another instance holds it
/// - `Err(_)` if the lock file could not be opened or written
pub fn acquire_lock() -> Result<Option<(File, PathBuf)>> {
    acquire_lock_at(&lock_path())
}

/// Acquire an exclusive lock on `path`, writing our PID into it.
pub fn acquire_lock_at(path: &Path) -> Result<Option<(File, PathBuf)>> {
    // Truncation waits until the lock is ours so the holder's PID stays readable
    let mut lock_file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", private_path(path)))?;

    match lock_file.try_lock_exclusive() {
        Ok(()) => {
            lock_file.set_len(0)?;
            lock_file.seek(SeekFrom::Start(0))?;
            writeln!(&lock_file, "{}", std::process::id())?;
            lock_file.flush()?;
            Ok(Some((lock_file, path.to_path_buf())))
        }
        Err(_) => {
            let holder = std::fs::read_to_string(path)
                .ok()
                .and_then(|content| content.trim().parse::<u32>().ok());
            log_pipe!();
            match holder {
                Some(pid) => log_error!("adhanr is already running (PID: {pid})"),
                None => log_error!("adhanr is already running"),
            }
            log_indented!("Send SIGUSR2 to the running instance to resync it");
            Ok(None)
        }
    }
}

/// Remove the lock file. The lock itself is released when `lock_file` drops.
pub fn release_lock(lock_file: File, path: &Path) {
    drop(lock_file);
    let _ = std::fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_acquire_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("adhanr.lock");

        let (file, held_path) = acquire_lock_at(&path).unwrap().unwrap();
        let content = std::fs::read_to_string(&held_path).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());

        assert!(acquire_lock_at(&path).unwrap().is_none());

        release_lock(file, &held_path);
        assert!(!path.exists());
        assert!(acquire_lock_at(&path).unwrap().is_some());
    }
}
