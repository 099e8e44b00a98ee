// src/models/mod.rs

//! Domain models for board ingestion.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod announcement;
mod config;
mod source;

// Re-export all public types
pub use announcement::{
    AnnouncementRecord, AnnouncementRow, DATE_FORMAT, FIELD_NAMES, ROW_WIDTH, filter_recent,
};
pub use config::{
    CacheConfig, Config, DisplayConfig, FetchConfig, LoggingConfig, MAX_RECENT_DAYS, ReportConfig,
};
pub use source::{LogicalKey, SourceConfig, SourceDefinition};
