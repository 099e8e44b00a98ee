//! In-memory announcement storage.
//!
//! A single authoritative [`SharedCache`] holds one [`CacheEntry`] per
//! logical key. Both the front-end path and the report path read from it;
//! nothing is persisted across restarts.

pub mod memory;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::models::{AnnouncementRecord, AnnouncementRow, LogicalKey};

pub use memory::SharedCache;

/// Whether a cached row set covers the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Completeness {
    Complete,
    /// The listing ran past `max_pages`; rows cover the newest pages.
    Truncated { max_pages: u32 },
    /// The ingest stopped early; rows are best effort.
    Partial { reason: String },
}

impl Completeness {
    pub fn label(&self) -> &'static str {
        match self {
            Completeness::Complete => "complete",
            Completeness::Truncated { .. } => "truncated",
            Completeness::Partial { .. } => "partial",
        }
    }
}

/// One cached row set, replaced wholesale on every refresh.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntry {
    pub key: LogicalKey,
    pub rows: Vec<AnnouncementRow>,
    pub last_refreshed: DateTime<Utc>,
    pub completeness: Completeness,
    /// SHA-256 over the rows; equal fingerprints mean unchanged content
    pub fingerprint: String,
}

impl CacheEntry {
    pub fn is_complete(&self) -> bool {
        self.completeness == Completeness::Complete
    }

    /// Whether the entry may be served without a refetch while young.
    pub fn is_trusted(&self) -> bool {
        !matches!(self.completeness, Completeness::Partial { .. })
    }

    /// Fresh when trusted and younger than `ttl` at `now`.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        self.is_trusted() && now.signed_duration_since(self.last_refreshed) < ttl
    }

    /// Rows keyed by field name, in order.
    pub fn records(&self) -> Vec<AnnouncementRecord> {
        self.rows.iter().map(AnnouncementRecord::from).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
