//! Service layer for board ingestion.
//!
//! - `SourceRegistry`: logical key to source lookup
//! - `SourceFetcher`: one listing page, fetched and parsed
//! - `AnnouncementIngestor`: the multi-page loop
//! - `BoardService`: cache-first request boundary

mod board;
mod fetcher;
mod ingestor;
mod registry;

pub use board::{BoardResponse, BoardService, Origin};
pub use fetcher::{EndOfData, NextPage, PageResult, SourceFetcher, parse_page};
pub use ingestor::{AnnouncementIngestor, IngestOutcome, StopReason};
pub use registry::SourceRegistry;
