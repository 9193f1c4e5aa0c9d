use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::export::resolve_output_path;

/// Number of videos exported when `--count` is not given
pub const DEFAULT_COUNT: usize = 10;

/// Upper bound for concurrent premiere-date lookups
pub const MAX_JOBS: usize = 8;

/// How long the channel listing may take
pub const LIST_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a single video's metadata lookup may take
pub const DETAIL_TIMEOUT: Duration = Duration::from_secs(30);

/// Channel tabs yt-dlp can list videos from
pub const CHANNEL_TABS: &[&str] = &["videos", "shorts", "streams"];

const EXPORT_DIR_NAME: &str = "yt-csv";
const YOUTUBE_BASE: &str = "https://www.youtube.com/";

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([^/?#\s]+)(?:/|$)").expect("handle pattern is valid"));
static UNSAFE_FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("filename pattern is valid"));

/// Load environment variables from a .env file in the working directory
pub fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Get the export directory (`./yt-csv`, or `YT_CSV_DIR` when set)
pub fn export_dir() -> PathBuf {
    std::env::var("YT_CSV_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(EXPORT_DIR_NAME))
}

/// Explicit yt-dlp binary from `YT_DLP_PATH`
pub fn ytdlp_path_override() -> Option<PathBuf> {
    std::env::var("YT_DLP_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// Turn `@name`, `youtube.com/@name` or a full channel URL into
/// `https://www.youtube.com/@name[/tab]`. Query strings and fragments are
/// dropped, and only the video tabs survive.
pub fn normalize_channel_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    let path = if rest.starts_with('@') {
        rest
    } else {
        let host_stripped = rest
            .strip_prefix("www.")
            .or_else(|| rest.strip_prefix("m."))
            .unwrap_or(rest);
        host_stripped
            .strip_prefix("youtube.com/")
            .ok_or_else(|| Error::InvalidChannel(trimmed.to_string()))?
    };

    let path = path
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());

    let handle = segments
        .next()
        .filter(|s| HANDLE_RE.is_match(s))
        .ok_or_else(|| Error::InvalidChannel(trimmed.to_string()))?;

    match segments.next() {
        Some(tab) if CHANNEL_TABS.contains(&tab) => Ok(format!("{}{}/{}", YOUTUBE_BASE, handle, tab)),
        Some(other) => {
            debug!(tab = other, "ignoring channel tab without a video list");
            Ok(format!("{}{}", YOUTUBE_BASE, handle))
        }
        None => Ok(format!("{}{}", YOUTUBE_BASE, handle)),
    }
}

/// Extract the channel handle (without `@`) from a normalized channel URL
pub fn channel_handle(channel_url: &str) -> Option<&str> {
    let path = channel_url.strip_prefix(YOUTUBE_BASE)?;
    HANDLE_RE
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Sanitize a string for use as a filename
pub fn sanitize_filename(name: &str, max_length: usize) -> String {
    let sanitized = UNSAFE_FILENAME_RE.replace_all(name, "_");
    let sanitized = sanitized.trim_matches(|c: char| c == '_' || c == '.' || c.is_whitespace());

    let result: String = sanitized.chars().take(max_length).collect();

    if result.is_empty() {
        "channel".to_string()
    } else {
        result
    }
}

/// Settings for a single export run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub channel_url: String,
    pub count: usize,
    pub output_file: String,
    pub export_dir: PathBuf,
    pub jobs: usize,
}

impl RunConfig {
    /// Validate CLI input. Nothing here touches the network or the filesystem.
    pub fn new(channel: &str, count: usize, output: Option<&str>, jobs: usize) -> Result<Self> {
        if count == 0 {
            return Err(Error::InvalidArgument("count must be at least 1".to_string()));
        }
        if jobs == 0 || jobs > MAX_JOBS {
            return Err(Error::InvalidArgument(format!(
                "jobs must be between 1 and {}",
                MAX_JOBS
            )));
        }

        let channel_url = normalize_channel_url(channel)?;

        let output_file = match output {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            Some(_) => {
                return Err(Error::InvalidArgument("output file name is empty".to_string()));
            }
            None => {
                let handle = channel_handle(&channel_url).unwrap_or_default();
                format!("{}.csv", sanitize_filename(handle, 100))
            }
        };

        let export_dir = export_dir();
        resolve_output_path(&export_dir, &output_file)?;

        Ok(Self {
            channel_url,
            count,
            output_file,
            export_dir,
            jobs,
        })
    }

    /// Replace the export directory (tests and embedders)
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}
