//! Utility functions and helpers.

pub mod http;
#[cfg(test)]
pub(crate) mod testing;

use sha2::{Digest, Sha256};
use url::Url;

use crate::error::Result;
use crate::models::AnnouncementRow;

/// Append `param=page` to a listing URL, keeping its existing query.
pub fn page_url(base_url: &str, param: &str, page: u32) -> Result<String> {
    let mut url = Url::parse(base_url)?;
    url.query_pairs_mut().append_pair(param, &page.to_string());
    Ok(url.to_string())
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable SHA-256 hex digest over rows, in order.
pub fn fingerprint(rows: &[AnnouncementRow]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        for field in row.fields() {
            hasher.update(field.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
    }
    hex::encode(hasher.finalize())
}
