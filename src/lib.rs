// src/lib.rs

//! Board announcement ingestion library.
//!
//! Scrapes paginated HTML announcement boards into fixed-width rows, keeps
//! them in a shared TTL cache and projects them into keyed report records.

pub mod error;
pub mod models;
pub mod report;
pub mod services;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
