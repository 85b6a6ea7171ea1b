//! Pre-Maghrib recitation: daily selection and a local audio cache.
//!
//! The chapter for a day is picked from a fixed rotation by hashing the ISO
//! date, so rebuilding the schedule mid-day always lands on the same
//! chapter. Audio is resolved through the quran.com v4 API and kept under
//! `cache_dir/<reciter>/<chapter>.mp3`. Downloads go to a temporary file in
//! the same directory and are renamed into place only when complete.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

use crate::common::constants::{DEFAULT_RECITATION_API, DEFAULT_RECITER_ID};
use crate::common::utils::private_path;
use crate::config::Config;

const USER_AGENT: &str = concat!("adhanr/", env!("CARGO_PKG_VERSION"));

/// Chapter to recite on `date`. Stable for a given date and rotation.
///
/// Returns `None` for an empty rotation.
pub fn select_content(date: NaiveDate, rotation: &[u32]) -> Option<u32> {
    if rotation.is_empty() {
        return None;
    }
    let digest = sha256::digest(date.format("%Y-%m-%d").to_string());
    let value = u64::from_str_radix(&digest[..16], 16).ok()?;
    let index = (value % rotation.len() as u64) as usize;
    Some(rotation[index])
}

/// Something that can produce a local audio file for a chapter.
#[cfg_attr(test, mockall::automock)]
pub trait RecitationSource {
    /// Local path of the chapter's audio, downloading it if needed.
    fn prepare(&self, content_id: u32) -> Result<PathBuf>;
}

#[derive(Debug, Deserialize)]
struct ChapterRecitation {
    audio_file: AudioFile,
}

#[derive(Debug, Deserialize)]
struct AudioFile {
    audio_url: String,
}

/// Downloads recitations on demand and serves them from disk afterwards.
pub struct RecitationCache {
    agent: ureq::Agent,
    /// No overall deadline; a chapter can take minutes on a slow link.
    download_agent: ureq::Agent,
    api_base: String,
    reciter_id: u32,
    cache_dir: PathBuf,
}

impl RecitationCache {
    /// `timeout` bounds the metadata request as a whole, and each connect or
    /// stalled read of the audio download.
    pub fn new(api_base: &str, reciter_id: u32, cache_dir: PathBuf, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        let download_agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            download_agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            reciter_id,
            cache_dir,
        }
    }

    /// Cache configured by `config`, or `None` when recitation is disabled.
    pub fn from_config(config: &Config) -> Option<Self> {
        config.recitation_enabled().then(|| {
            Self::new(
                config
                    .recitation_api
                    .as_deref()
                    .unwrap_or(DEFAULT_RECITATION_API),
                config.reciter_id.unwrap_or(DEFAULT_RECITER_ID),
                config.cache_dir(),
                config.fetch_timeout(),
            )
        })
    }

    /// Where the chapter lives once cached.
    pub fn cached_path(&self, content_id: u32) -> PathBuf {
        self.cache_dir
            .join(self.reciter_id.to_string())
            .join(format!("{content_id:03}.mp3"))
    }

    fn resolve_url(&self, content_id: u32) -> Result<String> {
        let url = format!(
            "{}/chapter_recitations/{}/{content_id}",
            self.api_base, self.reciter_id
        );
        let body = self
            .agent
            .get(&url)
            .call()
            .map_err(describe_error)?
            .into_string()
            .context("Failed to read recitation metadata")?;
        let recitation: ChapterRecitation =
            serde_json::from_str(&body).context("Malformed recitation metadata")?;
        Ok(recitation.audio_file.audio_url)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let parent = dest
            .parent()
            .context("Cache path has no parent directory")?;
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory {}", private_path(parent)))?;

        let response = self
            .download_agent
            .get(url)
            .call()
            .map_err(describe_error)?;
        let mut reader = response.into_reader();

        let mut partial = NamedTempFile::new_in(parent)
            .context("Failed to create temporary download file")?;
        let bytes = io::copy(&mut reader, &mut partial).context("Recitation download interrupted")?;
        if bytes == 0 {
            anyhow::bail!("Recitation download was empty");
        }
        partial
            .persist(dest)
            .with_context(|| format!("Failed to store recitation at {}", private_path(dest)))?;

        log_indented!("Saved {} ({bytes} bytes)", private_path(dest));
        Ok(())
    }
}

impl RecitationSource for RecitationCache {
    fn prepare(&self, content_id: u32) -> Result<PathBuf> {
        let path = self.cached_path(content_id);
        if path.exists() {
            log_indented!("Recitation {content_id} found in cache");
            return Ok(path);
        }

        log_indented!(
            "Downloading recitation {content_id} (reciter {})",
            self.reciter_id
        );
        let url = self.resolve_url(content_id)?;
        self.download(&url, &path)?;
        Ok(path)
    }
}

fn describe_error(error: ureq::Error) -> anyhow::Error {
    match error {
        ureq::Error::Status(code, response) => {
            anyhow::anyhow!("Recitation service returned {code} for {}", response.get_url())
        }
        ureq::Error::Transport(transport) => {
            anyhow::anyhow!("Recitation service unreachable: {transport}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use tempfile::tempdir;

    const CHUNK: usize = 1024;

    /// Read one request and return its path.
    fn request_path(stream: &TcpStream) -> String {
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).unwrap();
            if header == "\r\n" || header.is_empty() {
                break;
            }
        }
        request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or_default()
            .to_string()
    }

    /// Serve the metadata request, then the audio as `chunks` pieces sent
    /// `gap` apart. Returns the API base URL.
    fn spawn_recitation_server(chunks: usize, gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let audio_url = format!("{base}/audio/067.mp3");

        thread::spawn(move || {
            for stream in listener.incoming().take(2) {
                let mut stream = stream.unwrap();
                let path = request_path(&stream);
                if path.starts_with("/chapter_recitations/") {
                    let body = format!(r#"{{"audio_file":{{"audio_url":"{audio_url}"}}}}"#);
                    write!(
                        stream,
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    )
                    .unwrap();
                    continue;
                }
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    chunks * CHUNK
                );
                if stream.write_all(header.as_bytes()).is_err() {
                    return;
                }
                for _ in 0..chunks {
                    thread::sleep(gap);
                    if stream.write_all(&[0u8; CHUNK]).is_err() {
                        return;
                    }
                    let _ = stream.flush();
                }
            }
        });

        base
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_selection_is_stable_per_date() {
        let rotation = [18, 32, 36, 55, 56, 67, 76, 78];
        let first = select_content(date(2026, 10, 16), &rotation);
        for _ in 0..5 {
            assert_eq!(select_content(date(2026, 10, 16), &rotation), first);
        }
        assert!(rotation.contains(&first.unwrap()));
    }

    #[test]
    fn test_selection_varies_across_dates() {
        let rotation = [18, 32, 36, 55, 56, 67, 76, 78];
        let picks: std::collections::HashSet<u32> = (1..=28)
            .filter_map(|day| select_content(date(2026, 2, day), &rotation))
            .collect();
        assert!(picks.len() > 1);
    }

    #[test]
    fn test_selection_empty_rotation() {
        assert_eq!(select_content(date(2026, 10, 16), &[]), None);
        assert_eq!(select_content(date(2026, 10, 16), &[67]), Some(67));
    }

    #[test]
    fn test_cache_hit_skips_network() {
        let dir = tempdir().unwrap();
        // Nothing listens on port 9, so any request would fail
        let cache = RecitationCache::new(
            "http://127.0.0.1:9",
            7,
            dir.path().to_path_buf(),
            Duration::from_secs(1),
        );
        let cached = cache.cached_path(67);
        assert!(cached.ends_with("7/067.mp3"));

        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, b"ID3").unwrap();

        assert_eq!(cache.prepare(67).unwrap(), cached);
    }

    #[test]
    fn test_cache_miss_with_unreachable_service() {
        let dir = tempdir().unwrap();
        let cache = RecitationCache::new(
            "http://127.0.0.1:9",
            7,
            dir.path().to_path_buf(),
            Duration::from_secs(1),
        );
        assert!(cache.prepare(36).is_err());
        assert!(!cache.cached_path(36).exists());
    }

    #[test]
    fn test_slow_steady_download_completes() {
        let dir = tempdir().unwrap();
        // 30 KB over about three seconds, never idle for a full second
        let base = spawn_recitation_server(30, Duration::from_millis(100));
        let cache = RecitationCache::new(&base, 7, dir.path().to_path_buf(), Duration::from_secs(1));

        let path = cache.prepare(67).unwrap();
        assert_eq!(path, cache.cached_path(67));
        assert_eq!(fs::metadata(&path).unwrap().len(), (30 * CHUNK) as u64);
    }

    #[test]
    fn test_stalled_download_leaves_no_cache_entry() {
        let dir = tempdir().unwrap();
        let base = spawn_recitation_server(1, Duration::from_secs(3));
        let cache = RecitationCache::new(&base, 7, dir.path().to_path_buf(), Duration::from_secs(1));

        assert!(cache.prepare(67).is_err());
        assert!(!cache.cached_path(67).exists());
    }
}
