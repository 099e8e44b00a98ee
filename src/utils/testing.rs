//! Scripted transport and HTML fixtures shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::SourceConfig;
use crate::utils::{http::HttpGet, page_url};

pub(crate) const BASE_URL: &str = "https://board.example.com/list.do";

pub(crate) enum Reply {
    Body(String),
    Timeout,
    Network,
}

/// In-memory `HttpGet` answering from scripted replies, then fixed pages.
#[derive(Default)]
pub(crate) struct ScriptedHttp {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    pages: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve `html` for every request to page `page` of [`BASE_URL`].
    pub fn page(self, page: u32, html: impl Into<String>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url_for(page), html.into());
        self
    }

    /// Answer the next requests to page `page` with `replies`, in order.
    pub fn script(self, page: u32, replies: Vec<Reply>) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(url_for(page))
            .or_default()
            .extend(replies);
        self
    }

    pub fn calls_to(&self, page: u32) -> usize {
        let url = url_for(page);
        self.calls.lock().unwrap().iter().filter(|c| **c == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpGet for ScriptedHttp {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(|q| q.pop_front());
        match queued {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Timeout) => Err(AppError::timeout(url)),
            Some(Reply::Network) => Err(AppError::network(url, "connection reset")),
            None => self
                .pages
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::network(url, "404 Not Found")),
        }
    }
}

pub(crate) fn source() -> SourceConfig {
    SourceConfig::new("Test board", BASE_URL)
}

pub(crate) fn url_for(page: u32) -> String {
    page_url(BASE_URL, "pageIndex", page).unwrap()
}

/// State of the pagination block rendered by [`board_page`].
#[derive(Clone, Copy)]
pub(crate) enum Next {
    Enabled,
    Disabled,
    Missing,
    NoPagination,
}

/// Render a board listing with the given cell rows.
pub(crate) fn board_page(rows: &[&[&str]], next: Next) -> String {
    let body: String = rows
        .iter()
        .map(|cells| {
            let tds: String = cells.iter().map(|c| format!("<td> {c} </td>")).collect();
            format!("<tr>{tds}</tr>")
        })
        .collect();
    wrap(&body, next)
}

/// Render a listing whose body holds only the no-data sentinel.
pub(crate) fn nodata_page() -> String {
    wrap(
        r#"<tr><td class="nodata" colspan="5">No posts.</td></tr>"#,
        Next::Disabled,
    )
}

/// `count` valid rows numbered from `first`.
pub(crate) fn numbered_rows(first: usize, count: usize) -> Vec<Vec<String>> {
    (first..first + count)
        .map(|i| {
            vec![
                i.to_string(),
                format!("Notice {i}"),
                "Office".to_string(),
                (i * 10).to_string(),
                "2024-01-01".to_string(),
            ]
        })
        .collect()
}

pub(crate) fn board_page_owned(rows: &[Vec<String>], next: Next) -> String {
    let borrowed: Vec<Vec<&str>> = rows
        .iter()
        .map(|r| r.iter().map(String::as_str).collect())
        .collect();
    let slices: Vec<&[&str]> = borrowed.iter().map(Vec::as_slice).collect();
    board_page(&slices, next)
}

fn wrap(tbody: &str, next: Next) -> String {
    let pagination = match next {
        Next::Enabled => {
            r#"<div class="pagination"><a aria-label="Previous">&lt;</a><a aria-label="Next" href="?pageIndex=2">&gt;</a></div>"#
        }
        Next::Disabled => {
            r#"<div class="pagination"><a aria-label="Next" class="btn disabled">&gt;</a></div>"#
        }
        Next::Missing => r#"<div class="pagination"><a aria-label="Previous">&lt;</a></div>"#,
        Next::NoPagination => "",
    };
    format!(
        r#"<html><body>
        <table class="board_list table table-default">
          <thead><tr><th>No</th><th>Title</th><th>Author</th><th>Views</th><th>Date</th></tr></thead>
          <tbody>{tbody}</tbody>
        </table>
        {pagination}
        </body></html>"#
    )
}
