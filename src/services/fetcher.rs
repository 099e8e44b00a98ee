// src/services/fetcher.rs

//! Single-page fetch and parse.
//!
//! Turns one page of a paginated board into validated rows plus a
//! "more pages?" signal. Timeouts are retried here; everything else is
//! reported to the caller.

use std::fmt;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{AnnouncementRow, FetchConfig, ROW_WIDTH, SourceConfig};
use crate::utils::http::HttpGet;
use crate::utils::{normalize_whitespace, page_url};

/// Structural reasons a page ends the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOfData {
    /// No element matched the table selector
    TableMissing,
    /// The table has no `<tbody>`
    BodyMissing,
    /// The body holds the no-data sentinel
    NoDataMarker,
    /// The body has no rows at all
    NoRows,
}

impl fmt::Display for EndOfData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EndOfData::TableMissing => "table not found",
            EndOfData::BodyMissing => "table body not found",
            EndOfData::NoDataMarker => "no-data marker reached",
            EndOfData::NoRows => "no rows on page",
        };
        f.write_str(text)
    }
}

/// State of the pagination "next" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    Available,
    Disabled,
    ControlMissing,
    PaginationMissing,
}

impl NextPage {
    pub fn has_next(self) -> bool {
        self == NextPage::Available
    }
}

/// Outcome of parsing one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    /// The page signals that no data remains.
    Ended(EndOfData),
    /// The page held rows; `dropped` counts rows with too few cells.
    Rows {
        rows: Vec<AnnouncementRow>,
        dropped: usize,
        next: NextPage,
    },
}

impl PageResult {
    pub fn rows(&self) -> &[AnnouncementRow] {
        match self {
            PageResult::Rows { rows, .. } => rows,
            PageResult::Ended(_) => &[],
        }
    }

    pub fn has_next(&self) -> bool {
        match self {
            PageResult::Rows { next, .. } => next.has_next(),
            PageResult::Ended(_) => false,
        }
    }
}

/// Fetches and parses single pages of a board.
pub struct SourceFetcher<C = Client> {
    client: C,
    config: FetchConfig,
}

impl SourceFetcher<Client> {
    /// Create a fetcher backed by a configured `reqwest` client.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let client = crate::utils::http::create_async_client(config)?;
        Ok(Self::new(client, config.clone()))
    }
}

impl<C: HttpGet> SourceFetcher<C> {
    pub fn new(client: C, config: FetchConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetch and parse page `page` (1-based) of `source`.
    pub async fn fetch_page(&self, source: &SourceConfig, page: u32) -> Result<PageResult> {
        let url = page_url(&source.base_url, &source.page_param, page)?;
        log::info!("Fetching URL: {}", url);
        let html = self.fetch_with_retry(&url).await?;
        parse_page(&html, source, page)
    }

    /// GET `url`, retrying timeouts with exponential backoff.
    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.client.get_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_timeout() => {
                    if attempt > self.config.max_retries {
                        log::error!("Timed out {} times on {}. Giving up.", attempt, url);
                        return Err(AppError::RetryExhausted {
                            url: url.to_string(),
                            attempts: attempt,
                        });
                    }
                    let delay = self.config.backoff_for(attempt);
                    log::warn!(
                        "Timeout on {} (attempt {}/{}). Retrying in {:?}",
                        url,
                        attempt,
                        self.config.max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Parse one board page.
///
/// The HTML parser inserts a `<tbody>` into any table with rows, so a
/// missing body is detected on the raw markup. `page` is only used for log
/// context.
pub fn parse_page(html: &str, source: &SourceConfig, page: u32) -> Result<PageResult> {
    let table_sel = parse_selector(&source.table_selector)?;
    let tbody_sel = parse_selector("tbody")?;
    let nodata_sel = parse_selector(&source.nodata_selector)?;
    let pagination_sel = parse_selector(&source.pagination_selector)?;
    let next_sel = parse_selector(&source.next_selector)?;

    let document = Html::parse_document(html);

    let Some(table) = document.select(&table_sel).next() else {
        log::warn!(
            "No table matching '{}' on page {}. Stopping fetch.",
            source.table_selector,
            page
        );
        return Ok(PageResult::Ended(EndOfData::TableMissing));
    };

    if !declares_body(html) {
        log::warn!("No <tbody> in the markup of page {}. Stopping fetch.", page);
        return Ok(PageResult::Ended(EndOfData::BodyMissing));
    }

    let Some(tbody) = table.select(&tbody_sel).next() else {
        log::warn!("No <tbody> in the table on page {}. Stopping fetch.", page);
        return Ok(PageResult::Ended(EndOfData::BodyMissing));
    };

    if tbody.select(&nodata_sel).next().is_some() {
        log::info!("Reached no-data marker on page {}. Ending fetch.", page);
        return Ok(PageResult::Ended(EndOfData::NoDataMarker));
    }

    let row_elems: Vec<ElementRef> = child_elements(tbody, "tr").collect();
    if row_elems.is_empty() {
        log::info!("No rows found on page {}. Ending fetch.", page);
        return Ok(PageResult::Ended(EndOfData::NoRows));
    }

    let mut rows = Vec::with_capacity(row_elems.len());
    let mut dropped = 0;
    for row in row_elems {
        let cells = child_elements(row, "td").map(cell_text);
        match AnnouncementRow::from_cells(cells) {
            Some(parsed) => {
                log::debug!("Row data (page {}): {:?}", page, parsed.fields());
                rows.push(parsed);
            }
            None => {
                dropped += 1;
                log::warn!(
                    "Skipping malformed row on page {} (fewer than {} cells): {}",
                    page,
                    ROW_WIDTH,
                    normalize_whitespace(&row.text().collect::<String>())
                );
            }
        }
    }

    let next = match document.select(&pagination_sel).next() {
        None => NextPage::PaginationMissing,
        Some(pagination) => match pagination.select(&next_sel).next() {
            None => NextPage::ControlMissing,
            Some(control) if has_class(control, &source.disabled_class) => NextPage::Disabled,
            Some(_) => NextPage::Available,
        },
    };

    Ok(PageResult::Rows {
        rows,
        dropped,
        next,
    })
}

fn declares_body(html: &str) -> bool {
    html.to_ascii_lowercase().contains("<tbody")
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    normalize_whitespace(&cell.text().collect::<String>())
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
