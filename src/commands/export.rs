use std::future::Future;
use std::path::PathBuf;

use tracing::info;

use crate::collector::collect;
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::export::write_records;
use crate::extractor::Extractor;

/// Outcome of a finished export
#[derive(Debug)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
}

/// Collect and write the export. `interrupt` only cancels the collection
/// stage; once writing starts the file is always completed.
pub async fn run<F>(config: &RunConfig, extractor: &dyn Extractor, interrupt: F) -> Result<ExportSummary>
where
    F: Future<Output = ()>,
{
    let records = tokio::select! {
        records = collect(extractor, config) => records?,
        _ = interrupt => return Err(Error::Interrupted),
    };

    match write_records(&records, &config.export_dir, &config.output_file) {
        Ok(path) => {
            info!(path = %path.display(), rows = records.len(), "export complete");
            Ok(ExportSummary {
                path,
                rows: records.len(),
            })
        }
        Err(e) => {
            eprintln!(
                "Collected {} video(s), but the CSV could not be written.",
                records.len()
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::{pending, ready};
    use std::time::Duration;

    use assert_matches::assert_matches;
    use tempfile::TempDir;

    use super::*;
    use crate::extractor::stub::FakeExtractor;

    fn config(dir: &TempDir, output: Option<&str>) -> RunConfig {
        RunConfig::new("https://www.youtube.com/@example", 3, output, 1)
            .unwrap()
            .with_export_dir(dir.path().join("yt-csv"))
    }

    fn scenario_extractor() -> FakeExtractor {
        FakeExtractor::with_videos(&[("V1", "First"), ("V2", "Second, part 2"), ("V3", "Third")])
            .with_upload_date("V1", "20240110")
            .with_upload_date("V3", "20240101")
    }

    #[tokio::test]
    async fn test_failed_lookup_keeps_row_with_unknown_date() {
        let dir = TempDir::new().unwrap();
        let fake = scenario_extractor();

        let summary = run(&config(&dir, None), &fake, pending()).await.unwrap();

        assert_eq!(summary.rows, 3);
        assert_eq!(summary.path, dir.path().join("yt-csv").join("example.csv"));

        let content = std::fs::read_to_string(&summary.path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines,
            [
                "title,video_id,url,view_count,duration_seconds,premiere_date",
                "First,V1,https://www.youtube.com/watch?v=V1,100,61,2024-01-10",
                "Second， part 2,V2,https://www.youtube.com/watch?v=V2,100,61,unknown",
                "Third,V3,https://www.youtube.com/watch?v=V3,100,61,2024-01-01",
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let fake = FakeExtractor::failing_listing();

        let result = run(&config(&dir, Some("out.csv")), &fake, pending()).await;

        assert_matches!(result, Err(Error::Extractor(_)));
        assert!(!dir.path().join("yt-csv").exists());
        assert!(fake.detail_urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_runs_are_byte_identical() {
        let dir = TempDir::new().unwrap();
        let fake = scenario_extractor();
        let config = config(&dir, Some("again.csv"));

        let first = run(&config, &fake, pending()).await.unwrap();
        let first_bytes = std::fs::read(&first.path).unwrap();
        let second = run(&config, &fake, pending()).await.unwrap();
        let second_bytes = std::fs::read(&second.path).unwrap();

        assert_eq!(first.path, second.path);
        assert_eq!(first_bytes, second_bytes);
    }

    #[tokio::test]
    async fn test_traversal_in_output_is_contained() {
        let dir = TempDir::new().unwrap();
        let fake = scenario_extractor();

        let summary = run(&config(&dir, Some("../../etc/output.csv")), &fake, pending())
            .await
            .unwrap();

        assert_eq!(summary.path, dir.path().join("yt-csv").join("output.csv"));
        assert!(summary.path.exists());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("yt-csv"), "in the way").unwrap();
        let fake = scenario_extractor();

        let result = run(&config(&dir, None), &fake, pending()).await;

        assert_matches!(result, Err(Error::Io(_)));
        assert_eq!(fake.detail_urls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_interrupt_during_collection_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let fake = scenario_extractor().with_delay("V1", Duration::from_millis(200));

        let result = run(&config(&dir, Some("out.csv")), &fake, ready(())).await;

        assert_matches!(result, Err(Error::Interrupted));
        assert!(!dir.path().join("yt-csv").exists());
    }

    #[tokio::test]
    async fn test_failures_map_to_exit_codes() {
        let dir = TempDir::new().unwrap();

        let bad_channel = RunConfig::new("example", 3, None, 1).unwrap_err();
        assert_eq!(bad_channel.exit_code(), 1);

        let listing = run(&config(&dir, None), &FakeExtractor::failing_listing(), pending())
            .await
            .unwrap_err();
        assert_eq!(listing.exit_code(), 1);

        let interrupted = run(
            &config(&dir, None),
            &scenario_extractor().with_delay("V1", Duration::from_millis(200)),
            ready(()),
        )
        .await
        .unwrap_err();
        assert_eq!(interrupted.exit_code(), 130);

        std::fs::write(dir.path().join("yt-csv"), "in the way").unwrap();
        let write = run(&config(&dir, None), &scenario_extractor(), pending())
            .await
            .unwrap_err();
        assert_eq!(write.exit_code(), 1);
    }
}
