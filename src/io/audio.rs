//! Audio output.
//!
//! Playback is delegated to an external command-line player so the daemon
//! never links an audio stack. Only one clip plays at a time: starting a new
//! one stops whatever is still running.

use anyhow::{Context, Result};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use crate::common::utils::private_path;

/// How long a stopped player gets to exit before it is killed.
const REAP_GRACE: Duration = Duration::from_secs(2);

/// What is being played, used for logging and interruption rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioKind {
    Adhan,
    Recitation,
}

impl fmt::Display for AudioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioKind::Adhan => f.write_str("Adhan"),
            AudioKind::Recitation => f.write_str("recitation"),
        }
    }
}

/// Somewhere audio clips can be sent.
pub trait AudioSink {
    /// Start playing `path` without waiting for it to finish.
    fn play(&mut self, kind: AudioKind, path: &Path) -> Result<()>;

    /// Stop the current clip, if any.
    fn stop(&mut self) -> Result<()>;
}

/// Plays clips through an external player process.
pub struct PlayerAudio {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl PlayerAudio {
    /// `command` is split on whitespace; the clip path is appended.
    pub fn new(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().context("Player command is empty")?;
        Ok(Self {
            program,
            args: parts.collect(),
            child: None,
        })
    }
}

impl AudioSink for PlayerAudio {
    fn play(&mut self, kind: AudioKind, path: &Path) -> Result<()> {
        if !path.exists() {
            anyhow::bail!("{kind} audio not found: {}", private_path(path));
        }

        self.stop()?;

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start player '{}'", self.program))?;

        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        if child.try_wait()?.is_some() {
            return Ok(());
        }

        signal::kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM)
            .with_context(|| format!("Failed to stop {} process", self.program))?;

        // Reap in the background so the tick is never held up by a slow player
        thread::spawn(move || {
            if matches!(child.try_wait(), Ok(None)) {
                thread::sleep(REAP_GRACE);
                if matches!(child.try_wait(), Ok(None)) {
                    let _ = child.kill();
                }
            }
            let _ = child.wait();
        });
        Ok(())
    }
}

impl Drop for PlayerAudio {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Logs clips instead of playing them, for simulations and machines without
/// a speaker.
#[derive(Debug, Default)]
pub struct LogAudio {
    playing: Option<AudioKind>,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, kind: AudioKind, path: &Path) -> Result<()> {
        log_indented!("Playing {kind}: {}", private_path(path));
        self.playing = Some(kind);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(kind) = self.playing.take() {
            log_indented!("Stopped {kind}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_player_command_rejected() {
        assert!(PlayerAudio::new("   ").is_err());
    }

    #[test]
    fn test_player_arguments_split() {
        let player = PlayerAudio::new("mpg123 -q --gain 50").unwrap();
        assert_eq!(player.program, "mpg123");
        assert_eq!(player.args, vec!["-q", "--gain", "50"]);
    }

    #[test]
    fn test_missing_asset_is_error() {
        let mut player = PlayerAudio::new("true").unwrap();
        let err = player
            .play(AudioKind::Adhan, Path::new("/nonexistent/adhan.mp3"))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_play_then_stop_long_running_player() {
        let clip = NamedTempFile::new().unwrap();
        // The clip path lands in $1 and is ignored
        let mut player = PlayerAudio {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), "sleep 30".to_string(), "sh".to_string()],
            child: None,
        };

        player.play(AudioKind::Recitation, clip.path()).unwrap();
        assert!(player.child.is_some());
        player.stop().unwrap();
        assert!(player.child.is_none());
    }

    #[test]
    fn test_log_audio_tracks_playback() {
        let mut audio = LogAudio::new();
        audio.play(AudioKind::Adhan, Path::new("adhan.mp3")).unwrap();
        assert_eq!(audio.playing, Some(AudioKind::Adhan));
        audio.stop().unwrap();
        assert_eq!(audio.playing, None);
    }
}
