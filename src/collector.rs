use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::{CHANNEL_TABS, RunConfig};
use crate::error::{Error, Result};
use crate::extractor::Extractor;
use crate::record::{ListedVideo, VideoRecord, merge_and_sanitize, premiere_date, video_url};

/// Channel tab handed to the listing call; defaults to the uploads tab
pub fn listing_url(channel_url: &str) -> String {
    let base = channel_url
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    match base.rsplit_once('/') {
        Some((_, last)) if CHANNEL_TABS.contains(&last) => base.to_string(),
        Some((parent, last)) if !last.starts_with('@') => format!("{}/videos", parent),
        _ => format!("{}/videos", base),
    }
}

/// List up to `count` of the channel's most recent videos, newest first
pub async fn list_recent_videos(
    extractor: &dyn Extractor,
    channel_url: &str,
    count: usize,
) -> Result<Vec<ListedVideo>> {
    if count == 0 {
        return Err(Error::InvalidArgument("count must be at least 1".to_string()));
    }
    if !channel_url.contains('@') {
        return Err(Error::InvalidChannel(channel_url.to_string()));
    }

    let url = listing_url(channel_url);
    let entries = extractor.list_channel(&url, count).await?;

    let videos: Vec<ListedVideo> = entries
        .into_iter()
        .filter_map(ListedVideo::from_entry)
        .take(count)
        .collect();

    if videos.is_empty() {
        return Err(Error::NoVideos(channel_url.to_string()));
    }

    debug!(listing = %url, found = videos.len(), "channel listed");
    Ok(videos)
}

/// Look up a single video's premiere date. Any failure yields `None`.
pub async fn fetch_premiere_date(extractor: &dyn Extractor, video_id: &str) -> Option<NaiveDate> {
    match extractor.fetch_detail(&video_url(video_id)).await {
        Ok(detail) => {
            let date = premiere_date(&detail);
            if date.is_none() {
                warn!(video_id, "no date field in video metadata");
            }
            date
        }
        Err(e) => {
            warn!(video_id, error = %e, "premiere date lookup failed");
            None
        }
    }
}

/// Look up every video's date with at most `jobs` lookups in flight.
/// Records come back in listing order.
pub async fn enrich(
    extractor: &dyn Extractor,
    videos: Vec<ListedVideo>,
    jobs: usize,
) -> Vec<VideoRecord> {
    let total = videos.len();

    stream::iter(videos.into_iter().enumerate())
        .map(|(index, video)| async move {
            eprintln!("Processing video {}/{}: {}", index + 1, total, video.video_id);
            let date = fetch_premiere_date(extractor, &video.video_id).await;
            merge_and_sanitize(video, date)
        })
        .buffered(jobs.max(1))
        .collect()
        .await
}

/// List the channel and enrich each video
pub async fn collect(extractor: &dyn Extractor, config: &RunConfig) -> Result<Vec<VideoRecord>> {
    eprintln!("Fetching channel: {}", config.channel_url);
    eprintln!("Videos requested: {}", config.count);

    let videos = list_recent_videos(extractor, &config.channel_url, config.count).await?;
    eprintln!("Found {} video(s)", videos.len());

    let records = enrich(extractor, videos, config.jobs).await;
    info!(
        records = records.len(),
        unknown_dates = records.iter().filter(|r| r.premiere_date.is_none()).count(),
        "collection finished"
    );

    Ok(records)
}
