//! Report writers and the format-keyed factory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::{AnnouncementRecord, LogicalKey};

/// Renders projected records to a file.
#[async_trait]
pub trait ReportWriter: Send + Sync {
    /// Write `records` for `key` and return the created file.
    async fn generate(&self, key: &LogicalKey, records: &[AnnouncementRecord]) -> Result<PathBuf>;
}

/// Maps a format name to a writer.
#[derive(Debug, Clone)]
pub struct ReportFactory {
    output_dir: PathBuf,
}

impl ReportFactory {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Writer for `format` (case-insensitive), or `None` if unsupported.
    pub fn create_report(&self, format: &str) -> Option<Box<dyn ReportWriter>> {
        match format.trim().to_lowercase().as_str() {
            "json" => Some(Box::new(JsonReport::new(&self.output_dir))),
            _ => None,
        }
    }

    pub fn formats(&self) -> &'static [&'static str] {
        &["json"]
    }
}

/// Writes `<dir>/<key>_<timestamp>.json` as a pretty JSON document.
#[derive(Debug, Clone)]
pub struct JsonReport {
    output_dir: PathBuf,
}

#[derive(serde::Serialize)]
struct JsonDocument<'a> {
    key: &'a LogicalKey,
    generated_at: chrono::DateTime<Utc>,
    count: usize,
    announcements: &'a [AnnouncementRecord],
}

impl JsonReport {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportWriter for JsonReport {
    async fn generate(&self, key: &LogicalKey, records: &[AnnouncementRecord]) -> Result<PathBuf> {
        let generated_at = Utc::now();
        let file_name = format!("{}_{}.json", key, generated_at.format("%Y%m%d_%H%M%S%3f"));
        let path = self.output_dir.join(file_name);

        let document = JsonDocument {
            key,
            generated_at,
            count: records.len(),
            announcements: records,
        };
        let bytes = serde_json::to_vec_pretty(&document)?;
        self.write_bytes(&path, &bytes).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_knows_json_only() {
        let factory = ReportFactory::new("reports");
        assert!(factory.create_report("json").is_some());
        assert!(factory.create_report(" JSON ").is_some());
        assert!(factory.create_report("excel").is_none());
        assert!(factory.create_report("").is_none());
    }

    #[tokio::test]
    async fn json_report_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonReport::new(dir.path().join("out"));
        let key = LogicalKey::parse("computer").unwrap();
        let records = vec![AnnouncementRecord {
            id: "1".into(),
            title: "Title".into(),
            author: "Author".into(),
            view_count: "10".into(),
            posted_date: "2024-01-01".into(),
        }];

        let path = writer.generate(&key, &records).await.unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("computer_"));

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["key"], "computer");
        assert_eq!(value["count"], 1);
        assert_eq!(value["announcements"][0]["viewCount"], "10");
        assert!(!path.with_extension("tmp").exists());
    }
}
