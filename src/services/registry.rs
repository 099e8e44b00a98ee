// src/services/registry.rs

//! Closed mapping from logical key to source configuration.

use std::collections::BTreeMap;

use crate::error::{AppError, Result};
use crate::models::{Config, LogicalKey, SourceConfig, SourceDefinition};

/// Immutable registry of the boards this process knows how to ingest.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: BTreeMap<LogicalKey, SourceConfig>,
}

impl SourceRegistry {
    /// Build a registry, rejecting duplicate keys and empty sets.
    pub fn new(definitions: impl IntoIterator<Item = SourceDefinition>) -> Result<Self> {
        let mut sources = BTreeMap::new();
        for SourceDefinition { key, source } in definitions {
            if sources.contains_key(&key) {
                return Err(AppError::config(format!("duplicate source key '{key}'")));
            }
            sources.insert(key, source);
        }
        if sources.is_empty() {
            return Err(AppError::config("no sources registered"));
        }
        Ok(Self { sources })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.sources.iter().cloned())
    }

    /// Resolve a raw key (trimmed, case-insensitive) to its source.
    pub fn resolve(&self, raw: &str) -> Result<&SourceConfig> {
        let key = LogicalKey::parse(raw)?;
        self.resolve_key(&key)
    }

    /// Resolve an already normalized key.
    pub fn resolve_key(&self, key: &LogicalKey) -> Result<&SourceConfig> {
        log::debug!("Resolving source for key '{}'", key);
        self.sources.get(key).ok_or_else(|| {
            log::error!("Unknown source key: '{}'", key);
            AppError::UnknownKey(key.to_string())
        })
    }

    /// Registered keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &LogicalKey> {
        self.sources.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LogicalKey, &SourceConfig)> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        let sources = Config::default()
            .sources
            .into_iter()
            .map(|def| (def.key, def.source))
            .collect();
        Self { sources }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(key: &str) -> SourceDefinition {
        SourceDefinition {
            key: LogicalKey::parse(key).unwrap(),
            source: SourceConfig::new(key, format!("https://example.com/{key}/list.do")),
        }
    }

    #[test]
    fn resolve_is_case_and_whitespace_insensitive() {
        let registry = SourceRegistry::default();
        let a = registry.resolve("COMPUTER ").unwrap();
        let b = registry.resolve("computer").unwrap();
        assert_eq!(a, b);
        assert!(a.base_url.contains("BBSMSTR_000000000333"));
    }

    #[test]
    fn resolve_unknown_key_fails() {
        let registry = SourceRegistry::default();
        assert!(matches!(
            registry.resolve("unknown-dept"),
            Err(AppError::UnknownKey(k)) if k == "unknown-dept"
        ));
    }

    #[test]
    fn resolve_blank_key_is_invalid() {
        let registry = SourceRegistry::default();
        assert!(matches!(registry.resolve("   "), Err(AppError::InvalidKey(_))));
    }

    #[test]
    fn no_prefix_or_fuzzy_matching() {
        let registry = SourceRegistry::default();
        assert!(registry.resolve("comp").is_err());
        assert!(registry.resolve("computers").is_err());
    }

    #[test]
    fn default_has_both_departments() {
        let registry = SourceRegistry::default();
        let keys: Vec<_> = registry.keys().map(LogicalKey::as_str).collect();
        assert_eq!(keys, ["computer", "electrical"]);
    }

    #[test]
    fn new_rejects_duplicates_and_empty() {
        assert!(SourceRegistry::new(vec![definition("a"), definition("A ")]).is_err());
        assert!(SourceRegistry::new(Vec::new()).is_err());
        assert_eq!(
            SourceRegistry::new(vec![definition("a"), definition("b")])
                .unwrap()
                .len(),
            2
        );
    }
}
