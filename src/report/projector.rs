//! Projection of positional rows into keyed records, and report generation.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{AnnouncementRecord, AnnouncementRow, LogicalKey, ROW_WIDTH, ReportConfig};
use crate::report::writer::ReportFactory;
use crate::storage::SharedCache;

/// Serves report generation from the shared cache.
pub struct ReportProjector {
    cache: Arc<SharedCache>,
    factory: ReportFactory,
}

impl ReportProjector {
    pub fn new(cache: Arc<SharedCache>, factory: ReportFactory) -> Self {
        Self { cache, factory }
    }

    pub fn from_config(cache: Arc<SharedCache>, config: &ReportConfig) -> Self {
        Self::new(cache, ReportFactory::new(&config.output_dir))
    }

    pub fn factory(&self) -> &ReportFactory {
        &self.factory
    }

    /// One record per row, in row order.
    pub fn project(rows: &[AnnouncementRow]) -> Vec<AnnouncementRecord> {
        rows.iter().map(AnnouncementRecord::from).collect()
    }

    /// Project untyped rows, skipping any that are not exactly five wide.
    pub fn project_raw(rows: &[Vec<String>]) -> Vec<AnnouncementRecord> {
        rows.iter()
            .filter_map(|row| match AnnouncementRow::try_from(row.clone()) {
                Ok(row) => Some(AnnouncementRecord::from(&row)),
                Err(_) => {
                    log::warn!(
                        "Skipping malformed row ({} of {} fields): {:?}",
                        row.len(),
                        ROW_WIDTH,
                        row
                    );
                    None
                }
            })
            .collect()
    }

    /// Write a `format` report of the cached announcements for `key`.
    ///
    /// Reads whatever the cache holds; refreshing is the caller's job.
    pub async fn generate_report(&self, format: &str, key: &str) -> Result<PathBuf> {
        let key = LogicalKey::parse(key)?;
        log::info!("Generating '{}' report for '{}'", format, key);

        let entry = match self.cache.get(&key) {
            Some(entry) if !entry.is_empty() => entry,
            Some(_) => {
                log::error!("Cached data for '{}' is empty.", key);
                return Err(AppError::NoData(key.to_string()));
            }
            None => {
                log::error!("No cached data for '{}'.", key);
                return Err(AppError::NoData(key.to_string()));
            }
        };

        let writer = self
            .factory
            .create_report(format)
            .ok_or_else(|| AppError::UnknownFormat(format.to_string()))?;

        let records = Self::project(&entry.rows);
        let path = writer.generate(&key, &records).await?;
        log::info!("Report successfully generated: {}", path.display());
        Ok(path)
    }
}
