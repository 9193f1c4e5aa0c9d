use std::fs;
use std::path::{Component, Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::VideoRecord;

/// Header row of every export
pub const HEADER: [&str; 6] = [
    "title",
    "video_id",
    "url",
    "view_count",
    "duration_seconds",
    "premiere_date",
];

/// Place `output_file` directly inside `export_dir`, dropping any directory
/// part the caller supplied
pub fn resolve_output_path(export_dir: &Path, output_file: &str) -> Result<PathBuf> {
    let name = output_file
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    // A drive prefix such as `C:name` would replace export_dir on join
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part.to_str() == Some(name) => Ok(export_dir.join(name)),
        _ => Err(Error::InvalidArgument(format!(
            "output file name has no usable file part: {}",
            output_file
        ))),
    }
}

/// Write records as UTF-8 CSV and return the file path
pub fn write_records(records: &[VideoRecord], export_dir: &Path, output_file: &str) -> Result<PathBuf> {
    let path = resolve_output_path(export_dir, output_file)?;
    fs::create_dir_all(export_dir)?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_path(&path)?;

    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record(record.to_row())?;
    }
    writer.flush()?;

    debug!(path = %path.display(), rows = records.len(), "export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;

    fn record(id: &str, title: &str, date: Option<NaiveDate>) -> VideoRecord {
        VideoRecord {
            title: title.to_string(),
            video_id: id.to_string(),
            url: crate::record::video_url(id),
            view_count: Some(42),
            duration_seconds: None,
            premiere_date: date,
        }
    }

    #[test]
    fn test_resolve_strips_directories() {
        let dir = Path::new("/exports");
        for input in [
            "../../etc/output.csv",
            "/etc/output.csv",
            "nested/dir/output.csv",
            "..\\..\\output.csv",
            "output.csv",
        ] {
            assert_eq!(
                resolve_output_path(dir, input).unwrap(),
                Path::new("/exports/output.csv"),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_resolve_rejects_directory_only_names() {
        let dir = Path::new("/exports");
        for input in ["", "..", "a/..", "dir/", "."] {
            assert_matches!(resolve_output_path(dir, input), Err(Error::InvalidArgument(_)), "input: {input}");
        }
    }

    #[cfg(windows)]
    #[test]
    fn test_resolve_rejects_drive_prefixes() {
        let dir = Path::new("yt-csv");
        for input in ["C:evil.csv", "..\\C:evil.csv", "D:"] {
            assert_matches!(resolve_output_path(dir, input), Err(Error::InvalidArgument(_)), "input: {input}");
        }
        assert_eq!(resolve_output_path(dir, "C:\\out\\ok.csv").unwrap(), dir.join("ok.csv"));
    }

    #[test]
    fn test_write_records_stays_inside_export_dir() {
        let root = TempDir::new().unwrap();
        let export_dir = root.path().join("nested").join("yt-csv");

        let path = write_records(&[], &export_dir, "../../escape.csv").unwrap();

        assert_eq!(path, export_dir.join("escape.csv"));
        assert!(path.exists());
        assert!(!root.path().join("escape.csv").exists());
    }

    #[test]
    fn test_write_records_format() {
        let dir = TempDir::new().unwrap();
        let records = [
            record("a1", "日本語のタイトル", NaiveDate::from_ymd_opt(2024, 2, 29)),
            record("b2", "Say \"hi\"", None),
        ];

        let path = write_records(&records, dir.path(), "out.csv").unwrap();
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();

        assert_eq!(lines[0], "title,video_id,url,view_count,duration_seconds,premiere_date");
        assert_eq!(
            lines[1],
            "日本語のタイトル,a1,https://www.youtube.com/watch?v=a1,42,unknown,2024-02-29"
        );
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line.split(',').count(), 6, "line: {line}");
        }
    }

    #[test]
    fn test_write_fails_when_export_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("yt-csv");
        fs::write(&blocker, "not a directory").unwrap();

        let result = write_records(&[], &blocker, "out.csv");
        assert_matches!(result, Err(Error::Io(_)));
    }
}
