use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::config::{DETAIL_TIMEOUT, LIST_TIMEOUT, ytdlp_path_override};
use crate::error::{Error, Result};

/// Entry from a flat channel listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub view_count: Option<u64>,
    /// Seconds; yt-dlp reports this as a float for some extractors
    pub duration: Option<f64>,
}

/// Date fields from a single video's metadata dump
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoDetail {
    /// YYYYMMDD, set for premieres and scheduled streams
    pub release_date: Option<String>,
    /// YYYYMMDD
    pub upload_date: Option<String>,
    pub release_timestamp: Option<f64>,
    pub timestamp: Option<f64>,
}

/// Something that can list a channel and look up a single video.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// List at most `count` entries from a channel tab, newest first
    async fn list_channel(&self, listing_url: &str, count: usize) -> Result<Vec<PlaylistEntry>>;

    /// Fetch metadata for one video without downloading any media
    async fn fetch_detail(&self, video_url: &str) -> Result<VideoDetail>;
}

/// yt-dlp run as a child process
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    base_args: Vec<String>,
    list_timeout: Duration,
    detail_timeout: Duration,
}

impl YtDlp {
    /// Find yt-dlp on this machine
    pub fn locate() -> Result<Self> {
        Ok(Self::with_program(find_ytdlp()?, Vec::new()))
    }

    /// Use an explicit program; `base_args` go before every yt-dlp argument
    pub fn with_program(program: impl Into<PathBuf>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
            list_timeout: LIST_TIMEOUT,
            detail_timeout: DETAIL_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, list_timeout: Duration, detail_timeout: Duration) -> Self {
        self.list_timeout = list_timeout;
        self.detail_timeout = detail_timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run yt-dlp with the given arguments and return its stdout
    async fn run(&self, args: &[&str], limit: Duration) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        debug!(program = %self.program.display(), ?args, "running yt-dlp");

        let output = match tokio::time::timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ExtractorNotFound);
            }
            Ok(Err(e)) => return Err(Error::Io(e)),
            Err(_) => return Err(Error::Timeout(limit.as_secs())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.trim().is_empty() {
                return Err(Error::Extractor(format!("exited with {}", output.status)));
            }
            return Err(classify_failure(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Extractor for YtDlp {
    async fn list_channel(&self, listing_url: &str, count: usize) -> Result<Vec<PlaylistEntry>> {
        let end = count.to_string();
        let stdout = self
            .run(
                &[
                    "--flat-playlist",
                    "--dump-json",
                    "--playlist-end",
                    end.as_str(),
                    listing_url,
                ],
                self.list_timeout,
            )
            .await?;

        let entries = parse_listing(&stdout, count);
        if entries.is_empty() && !stdout.trim().is_empty() {
            return Err(Error::Parse(format!("no usable entries for {}", listing_url)));
        }
        Ok(entries)
    }

    async fn fetch_detail(&self, video_url: &str) -> Result<VideoDetail> {
        let stdout = self
            .run(
                &["--dump-json", "--skip-download", "--no-playlist", video_url],
                self.detail_timeout,
            )
            .await?;

        let line = stdout
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| Error::Parse(format!("empty metadata for {}", video_url)))?;

        Ok(serde_json::from_str(line)?)
    }
}

/// Parse one-JSON-object-per-line listing output. Lines that are not JSON
/// or that carry no video id are skipped.
pub(crate) fn parse_listing(stdout: &str, count: usize) -> Vec<PlaylistEntry> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<PlaylistEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unparseable listing line");
                None
            }
        })
        .filter(|entry| entry.id.as_deref().is_some_and(|id| !id.trim().is_empty()))
        .take(count)
        .collect()
}

const NOT_FOUND_PHRASES: &[&str] = &[
    "not found",
    "does not exist",
    "404",
    "not available",
    "private",
    "does not have",
];

const NETWORK_PHRASES: &[&str] = &[
    "network",
    "timed out",
    "timeout",
    "connection",
    "resolve",
    "name resolution",
];

/// Map yt-dlp's stderr to an error kind
pub(crate) fn classify_failure(stderr: &str) -> Error {
    let message = stderr.trim().to_string();
    let lower = message.to_lowercase();

    if NOT_FOUND_PHRASES.iter().any(|p| lower.contains(p)) {
        Error::ChannelNotFound(message)
    } else if NETWORK_PHRASES.iter().any(|p| lower.contains(p)) {
        Error::Network(message)
    } else {
        Error::Extractor(message)
    }
}

/// Find the yt-dlp binary
fn find_ytdlp() -> Result<PathBuf> {
    if let Some(path) = ytdlp_path_override() {
        if path.is_file() {
            return Ok(path);
        }
        debug!(path = %path.display(), "YT_DLP_PATH does not point at a file");
        return Err(Error::ExtractorNotFound);
    }

    // Try PATH
    if let Ok(path) = which::which("yt-dlp") {
        return Ok(path);
    }

    // Try common locations
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local/bin/yt-dlp"));
    }
    candidates.extend(
        [
            "/opt/homebrew/bin/yt-dlp",
            "/usr/local/bin/yt-dlp",
            "/usr/bin/yt-dlp",
            "venv/bin/yt-dlp",
            ".venv/bin/yt-dlp",
        ]
        .map(PathBuf::from),
    );

    candidates
        .into_iter()
        .find(|p| p.is_file())
        .ok_or(Error::ExtractorNotFound)
}
