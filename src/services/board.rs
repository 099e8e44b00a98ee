// src/services/board.rs

//! Request boundary for announcement consumers.
//!
//! Checks the shared cache, refreshes a key through the ingestor when its
//! entry is missing or stale, and answers with an explicit
//! [`BoardResponse`] so callers can tell "no announcements" from "fetch
//! failed".

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{AnnouncementRow, Config, LogicalKey};
use crate::report::ReportProjector;
use crate::services::fetcher::SourceFetcher;
use crate::services::ingestor::{AnnouncementIngestor, StopReason};
use crate::services::registry::SourceRegistry;
use crate::storage::{CacheEntry, SharedCache};
use crate::utils::http::HttpGet;

/// Where a served entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Source,
}

/// Tagged answer to a board request.
#[derive(Debug)]
pub enum BoardResponse {
    /// Rows are available; `entry.completeness` tells if they are partial.
    Announcements {
        entry: Arc<CacheEntry>,
        origin: Origin,
    },
    /// The source was read to its end and had no announcements.
    NoData,
    /// The key was rejected or the source could not be read.
    Failed(AppError),
}

impl BoardResponse {
    /// Rows for display; empty for `NoData` and `Failed`.
    pub fn rows(&self) -> &[AnnouncementRow] {
        match self {
            BoardResponse::Announcements { entry, .. } => &entry.rows,
            BoardResponse::NoData | BoardResponse::Failed(_) => &[],
        }
    }

    /// Convert into the cached entry, mapping `NoData` to an error.
    pub fn into_entry(self, key: &str) -> Result<Arc<CacheEntry>> {
        match self {
            BoardResponse::Announcements { entry, .. } => Ok(entry),
            BoardResponse::NoData => Err(AppError::NoData(key.trim().to_lowercase())),
            BoardResponse::Failed(e) => Err(e),
        }
    }
}

/// Front door shared by the front-end and the report path.
pub struct BoardService<C = Client> {
    registry: SourceRegistry,
    ingestor: AnnouncementIngestor<C>,
    cache: Arc<SharedCache>,
    projector: ReportProjector,
    refresh_locks: Mutex<HashMap<LogicalKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl BoardService<Client> {
    /// Wire every component from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = SourceRegistry::from_config(config)?;
        let fetcher = SourceFetcher::from_config(&config.fetch)?;
        let cache = Arc::new(SharedCache::from_config(&config.cache));
        let projector = ReportProjector::from_config(Arc::clone(&cache), &config.report);
        Ok(Self::new(
            registry,
            AnnouncementIngestor::new(fetcher),
            cache,
            projector,
        ))
    }
}

impl<C: HttpGet> BoardService<C> {
    pub fn new(
        registry: SourceRegistry,
        ingestor: AnnouncementIngestor<C>,
        cache: Arc<SharedCache>,
        projector: ReportProjector,
    ) -> Self {
        Self {
            registry,
            ingestor,
            cache,
            projector,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<SharedCache> {
        &self.cache
    }

    pub fn ingestor(&self) -> &AnnouncementIngestor<C> {
        &self.ingestor
    }

    /// Serve announcements for `raw_key`, refreshing when needed.
    pub async fn handle_request(&self, raw_key: &str) -> BoardResponse {
        log::info!("Handling request for key: '{}'", raw_key);
        match self.load(raw_key).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Request for '{}' failed: {}", raw_key, e);
                BoardResponse::Failed(e)
            }
        }
    }

    /// Rows for `raw_key`; every failure is logged and reads as empty.
    pub async fn rows(&self, raw_key: &str) -> Vec<AnnouncementRow> {
        self.handle_request(raw_key).await.rows().to_vec()
    }

    /// Ensure `raw_key` is cached, then write a `format` report of it.
    pub async fn report(&self, format: &str, raw_key: &str) -> Result<PathBuf> {
        self.handle_request(raw_key).await.into_entry(raw_key)?;
        self.projector.generate_report(format, raw_key).await
    }

    /// Drop the cached entry so the next request refetches.
    pub fn invalidate(&self, raw_key: &str) -> Result<bool> {
        let key = LogicalKey::parse(raw_key)?;
        Ok(self.cache.invalidate(&key))
    }

    async fn load(&self, raw_key: &str) -> Result<BoardResponse> {
        let key = LogicalKey::parse(raw_key)?;
        let source = self.registry.resolve_key(&key)?;

        if let Some(entry) = self.cache.get_fresh(&key) {
            log::info!("Returning cached data for '{}': {} items", key, entry.len());
            return Ok(cached(entry));
        }

        let lock = self.refresh_lock(&key);
        let _guard = lock.lock().await;

        // Another request may have refreshed while we waited.
        if let Some(entry) = self.cache.get_fresh(&key) {
            log::debug!("'{}' refreshed by a concurrent request", key);
            return Ok(cached(entry));
        }

        let outcome = self.ingestor.ingest(&key, source).await;
        if outcome.rows.is_empty() {
            return match outcome.stop {
                StopReason::Failed(e) => Err(e),
                stop if !stop.is_complete() => Err(AppError::IngestAborted {
                    url: source.base_url.clone(),
                    reason: stop.to_string(),
                }),
                _ => Ok(BoardResponse::NoData),
            };
        }

        let entry = match outcome.stop {
            StopReason::PageLimit(max_pages) => {
                self.cache.put_truncated(&key, outcome.rows, max_pages)
            }
            stop if stop.is_complete() => self.cache.put(&key, outcome.rows),
            stop => {
                log::warn!(
                    "Caching {} rows for '{}' as partial: {}",
                    outcome.rows.len(),
                    key,
                    stop
                );
                self.cache.put_partial(&key, outcome.rows, stop.to_string())
            }
        };
        Ok(BoardResponse::Announcements {
            entry,
            origin: Origin::Source,
        })
    }

    fn refresh_lock(&self, key: &LogicalKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }
}

fn cached(entry: Arc<CacheEntry>) -> BoardResponse {
    BoardResponse::Announcements {
        entry,
        origin: Origin::Cache,
    }
}
