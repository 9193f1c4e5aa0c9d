use chrono::{DateTime, NaiveDate};

use crate::extractor::{PlaylistEntry, VideoDetail};

/// Written in place of any value yt-dlp could not supply
pub const UNKNOWN: &str = "unknown";

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Canonical watch URL for a video ID
pub fn video_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL, video_id)
}

/// A listed video before its premiere date is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedVideo {
    pub video_id: String,
    pub title: Option<String>,
    pub view_count: Option<u64>,
    pub duration_seconds: Option<u64>,
}

impl ListedVideo {
    /// Returns `None` for entries without a usable ID
    pub fn from_entry(entry: PlaylistEntry) -> Option<Self> {
        let video_id = entry.id?.trim().to_string();
        if video_id.is_empty() {
            return None;
        }

        Some(Self {
            video_id,
            title: entry.title,
            view_count: entry.view_count,
            duration_seconds: entry
                .duration
                .filter(|d| d.is_finite() && *d >= 0.0)
                .map(|d| d.round() as u64),
        })
    }
}

/// One exported row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub title: String,
    pub video_id: String,
    pub url: String,
    pub view_count: Option<u64>,
    pub duration_seconds: Option<u64>,
    pub premiere_date: Option<NaiveDate>,
}

impl VideoRecord {
    /// Fields in export order
    pub fn to_row(&self) -> [String; 6] {
        [
            self.title.clone(),
            self.video_id.clone(),
            self.url.clone(),
            or_unknown(self.view_count),
            or_unknown(self.duration_seconds),
            self.premiere_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ]
    }
}

fn or_unknown(value: Option<u64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Combine a listing entry with its looked-up premiere date
pub fn merge_and_sanitize(video: ListedVideo, premiere_date: Option<NaiveDate>) -> VideoRecord {
    let title = video
        .title
        .as_deref()
        .map(sanitize_title)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string());

    VideoRecord {
        title,
        url: video_url(&video.video_id),
        video_id: video.video_id,
        view_count: video.view_count,
        duration_seconds: video.duration_seconds,
        premiere_date,
    }
}

/// Replace delimiter commas with U+FF0C and line breaks with spaces
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            ',' => '，',
            '\r' | '\n' => ' ',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Pick the premiere date from a metadata dump.
/// `release_date` wins over `upload_date`; timestamps are the fallback.
pub fn premiere_date(detail: &VideoDetail) -> Option<NaiveDate> {
    [detail.release_date.as_deref(), detail.upload_date.as_deref()]
        .into_iter()
        .flatten()
        .find_map(parse_date)
        .or_else(|| {
            [detail.release_timestamp, detail.timestamp]
                .into_iter()
                .flatten()
                .filter(|ts| ts.is_finite())
                .find_map(|ts| DateTime::from_timestamp(ts as i64, 0).map(|dt| dt.date_naive()))
        })
}

/// Parse `YYYYMMDD` (yt-dlp) or an ISO date/datetime
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value[0..4].parse().ok()?;
        let month = value[4..6].parse().ok()?;
        let day = value[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let date_part = value.split('T').next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
