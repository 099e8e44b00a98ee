// src/services/ingestor.rs

//! Multi-page ingest loop.
//!
//! Drives a [`SourceFetcher`] from page 1 until the listing ends, a fetch
//! fails, or one of the page/duration guards trips. Never fails: whatever
//! was collected is returned together with the reason the loop stopped.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;

use crate::error::AppError;
use crate::models::{AnnouncementRow, LogicalKey, SourceConfig};
use crate::services::fetcher::{EndOfData, NextPage, PageResult, SourceFetcher};
use crate::utils::http::HttpGet;

/// Why an ingest stopped collecting.
#[derive(Debug)]
pub enum StopReason {
    /// The page structure signalled the end of the listing
    EndOfData(EndOfData),
    /// A page parsed but none of its rows had enough cells
    NoValidRows,
    /// No pagination container after the last page
    PaginationMissing,
    /// Pagination without a "next" control
    NextMissing,
    /// The "next" control is disabled
    NextDisabled,
    /// `max_pages` pages were read and another was advertised
    PageLimit(u32),
    /// The ingest ran out of its wall-clock budget
    TimeLimit(Duration),
    /// A fetch or parse error aborted the loop
    Failed(AppError),
}

impl StopReason {
    /// Whether the listing was read to its natural end.
    pub fn is_complete(&self) -> bool {
        !matches!(
            self,
            StopReason::PageLimit(_) | StopReason::TimeLimit(_) | StopReason::Failed(_)
        )
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::EndOfData(end) => write!(f, "{end}"),
            StopReason::NoValidRows => f.write_str("no valid rows on page"),
            StopReason::PaginationMissing => f.write_str("no pagination found"),
            StopReason::NextMissing => f.write_str("no next-page control"),
            StopReason::NextDisabled => f.write_str("next-page control disabled"),
            StopReason::PageLimit(max) => write!(f, "page limit of {max} reached"),
            StopReason::TimeLimit(budget) => write!(f, "time budget of {budget:?} exhausted"),
            StopReason::Failed(e) => write!(f, "fetch failed: {e}"),
        }
    }
}

/// Result of one ingest run.
#[derive(Debug)]
pub struct IngestOutcome {
    pub rows: Vec<AnnouncementRow>,
    pub pages: u32,
    pub dropped: usize,
    pub stop: StopReason,
}

impl IngestOutcome {
    pub fn is_complete(&self) -> bool {
        self.stop.is_complete()
    }
}

/// Drives page fetches for one source to completion.
pub struct AnnouncementIngestor<C = Client> {
    fetcher: SourceFetcher<C>,
}

impl<C: HttpGet> AnnouncementIngestor<C> {
    pub fn new(fetcher: SourceFetcher<C>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &SourceFetcher<C> {
        &self.fetcher
    }

    /// Collect every row of `source`, best effort.
    pub async fn ingest(&self, key: &LogicalKey, source: &SourceConfig) -> IngestOutcome {
        let max_pages = self.fetcher.config().max_pages;
        let budget = self.fetcher.config().max_duration();
        let started = Instant::now();

        let mut rows = Vec::new();
        let mut dropped = 0;
        let mut pages = 0;
        let mut page: u32 = 1;

        let stop = loop {
            if page > max_pages {
                log::warn!("[{}] Page limit {} reached. Stopping fetch.", key, max_pages);
                break StopReason::PageLimit(max_pages);
            }
            let Some(remaining) = budget.checked_sub(started.elapsed()) else {
                log::warn!("[{}] Time budget {:?} exhausted. Stopping fetch.", key, budget);
                break StopReason::TimeLimit(budget);
            };

            let result =
                match tokio::time::timeout(remaining, self.fetcher.fetch_page(source, page)).await
                {
                    Ok(result) => result,
                    Err(_) => {
                        log::warn!(
                            "[{}] Time budget {:?} exhausted on page {}. Stopping fetch.",
                            key,
                            budget,
                            page
                        );
                        break StopReason::TimeLimit(budget);
                    }
                };

            match result {
                Err(e) => {
                    log::error!("[{}] Error on page {}: {}", key, page, e);
                    break StopReason::Failed(e);
                }
                Ok(PageResult::Ended(end)) => break StopReason::EndOfData(end),
                Ok(PageResult::Rows {
                    rows: page_rows,
                    dropped: page_dropped,
                    next,
                }) => {
                    pages += 1;
                    dropped += page_dropped;
                    if page_rows.is_empty() {
                        log::info!("[{}] No valid rows on page {}. Ending fetch.", key, page);
                        break StopReason::NoValidRows;
                    }
                    rows.extend(page_rows);
                    log::info!(
                        "[{}] Page {}: collected {} total rows so far.",
                        key,
                        page,
                        rows.len()
                    );
                    let stop = match next {
                        NextPage::Available => {
                            page += 1;
                            continue;
                        }
                        NextPage::Disabled => StopReason::NextDisabled,
                        NextPage::ControlMissing => StopReason::NextMissing,
                        NextPage::PaginationMissing => StopReason::PaginationMissing,
                    };
                    log::info!("[{}] No more pages to fetch ({}). Ending fetch.", key, stop);
                    break stop;
                }
            }
        };

        if rows.is_empty() {
            log::warn!("[{}] No announcements fetched ({}).", key, stop);
        } else {
            log::info!(
                "[{}] Fetched total {} announcements over {} page(s) ({}).",
                key,
                rows.len(),
                pages,
                stop
            );
        }

        IngestOutcome {
            rows,
            pages,
            dropped,
            stop,
        }
    }
}
