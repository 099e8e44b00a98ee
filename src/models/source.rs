// src/models/source.rs

//! Logical keys and per-source fetch configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Normalized identifier of a source (a department name).
///
/// Always trimmed, lower-cased and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LogicalKey(String);

impl LogicalKey {
    /// Normalize a raw key, rejecting empty or whitespace-only input.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidKey(
                "key must be a non-empty string".to_string(),
            ));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for LogicalKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Where and how to scrape one paginated board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name of the board
    #[serde(default)]
    pub name: String,

    /// Listing URL without the page parameter
    pub base_url: String,

    /// Selector for the announcement table
    #[serde(default = "defaults::table_selector")]
    pub table_selector: String,

    /// Selector for the pagination container
    #[serde(default = "defaults::pagination_selector")]
    pub pagination_selector: String,

    /// Query parameter carrying the 1-based page index
    #[serde(default = "defaults::page_param")]
    pub page_param: String,

    /// Cell marking an empty listing
    #[serde(default = "defaults::nodata_selector")]
    pub nodata_selector: String,

    /// "Next" control inside the pagination container
    #[serde(default = "defaults::next_selector")]
    pub next_selector: String,

    /// Class that disables the "next" control
    #[serde(default = "defaults::disabled_class")]
    pub disabled_class: String,
}

impl SourceConfig {
    /// Create a source with the standard board structure.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            table_selector: defaults::table_selector(),
            pagination_selector: defaults::pagination_selector(),
            page_param: defaults::page_param(),
            nodata_selector: defaults::nodata_selector(),
            next_selector: defaults::next_selector(),
            disabled_class: defaults::disabled_class(),
        }
    }
}

/// A source bound to its logical key, as written in `[[sources]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDefinition {
    pub key: LogicalKey,

    #[serde(flatten)]
    pub source: SourceConfig,
}

mod defaults {
    pub fn table_selector() -> String {
        "table.board_list.table.table-default".into()
    }
    pub fn pagination_selector() -> String {
        "div.pagination".into()
    }
    pub fn page_param() -> String {
        "pageIndex".into()
    }
    pub fn nodata_selector() -> String {
        "td.nodata".into()
    }
    pub fn next_selector() -> String {
        r#"a[aria-label="Next"]"#.into()
    }
    pub fn disabled_class() -> String {
        "disabled".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let a = LogicalKey::parse("  COMPUTER ").unwrap();
        let b = LogicalKey::parse("computer").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "computer");
    }

    #[test]
    fn parse_rejects_blank() {
        assert!(matches!(LogicalKey::parse(""), Err(AppError::InvalidKey(_))));
        assert!(matches!(LogicalKey::parse(" \t\n"), Err(AppError::InvalidKey(_))));
    }

    #[test]
    fn definition_fills_structural_defaults() {
        let def: SourceDefinition = toml::from_str(
            r#"
            key = " Physics "
            base_url = "https://example.com/list.do"
            "#,
        )
        .unwrap();
        assert_eq!(def.key.as_str(), "physics");
        assert_eq!(def.source.page_param, "pageIndex");
        assert_eq!(def.source.table_selector, "table.board_list.table.table-default");
    }

    #[test]
    fn definition_rejects_blank_key() {
        let result: std::result::Result<SourceDefinition, _> = toml::from_str(
            r#"
            key = "  "
            base_url = "https://example.com/list.do"
            "#,
        );
        assert!(result.is_err());
    }
}
