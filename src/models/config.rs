//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SourceDefinition;

/// Upper bound for `display.recent_days` (about a century).
pub const MAX_RECENT_DAYS: i64 = 36_500;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP, retry and ingest-guard settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Cache freshness settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Front-end presentation settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Registered board sources
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceDefinition>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.backoff_multiplier < 1.0 {
            return Err(AppError::validation(
                "fetch.backoff_multiplier must be >= 1.0",
            ));
        }
        if self.fetch.max_pages == 0 {
            return Err(AppError::validation("fetch.max_pages must be > 0"));
        }
        if self.fetch.max_duration_secs == 0 {
            return Err(AppError::validation("fetch.max_duration_secs must be > 0"));
        }
        if self.cache.ttl_secs == 0 {
            return Err(AppError::validation("cache.ttl_secs must be > 0"));
        }
        if !(1..=MAX_RECENT_DAYS).contains(&self.display.recent_days) {
            return Err(AppError::validation(format!(
                "display.recent_days must be within 1..={MAX_RECENT_DAYS}"
            )));
        }
        if self.report.output_dir.trim().is_empty() {
            return Err(AppError::validation("report.output_dir is empty"));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }
        for def in &self.sources {
            if url::Url::parse(&def.source.base_url).is_err() {
                return Err(AppError::validation(format!(
                    "source '{}' has an invalid base_url: {}",
                    def.key, def.source.base_url
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            cache: CacheConfig::default(),
            report: ReportConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
            sources: defaults::default_sources(),
        }
    }
}

/// HTTP client, retry and ingest-guard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Extra attempts for a page that timed out
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "defaults::initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Growth factor applied to the delay after each retry
    #[serde(default = "defaults::backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound for a single retry delay in milliseconds
    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_ms: u64,

    /// Maximum pages visited per ingest
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Wall-clock budget for one ingest in seconds
    #[serde(default = "defaults::max_duration")]
    pub max_duration_secs: u64,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            initial_backoff_ms: defaults::initial_backoff(),
            backoff_multiplier: defaults::backoff_multiplier(),
            max_backoff_ms: defaults::max_backoff(),
            max_pages: defaults::max_pages(),
            max_duration_secs: defaults::max_duration(),
        }
    }
}

/// Cache freshness settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds after which a cached entry must be refreshed
    #[serde(default = "defaults::ttl")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: defaults::ttl(),
        }
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory receiving generated report files
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
        }
    }
}

/// Front-end presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Only announcements posted within this many days are shown
    #[serde(default = "defaults::recent_days")]
    pub recent_days: i64,

    /// Template applied to each announcement
    #[serde(default = "defaults::template")]
    pub template: String,

    /// Titles longer than this are truncated
    #[serde(default = "defaults::max_title_graphemes")]
    pub max_title_graphemes: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            recent_days: defaults::recent_days(),
            template: defaults::template(),
            max_title_graphemes: defaults::max_title_graphemes(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level filter when `RUST_LOG` is unset
    #[serde(default = "defaults::level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::level(),
        }
    }
}

mod defaults {
    use crate::models::{LogicalKey, SourceConfig, SourceDefinition};

    // Fetch defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; board-ingest/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn initial_backoff() -> u64 {
        500
    }
    pub fn backoff_multiplier() -> f64 {
        2.0
    }
    pub fn max_backoff() -> u64 {
        8_000
    }
    pub fn max_pages() -> u32 {
        50
    }
    pub fn max_duration() -> u64 {
        300
    }

    // Cache defaults
    pub fn ttl() -> u64 {
        1800
    }

    // Report defaults
    pub fn output_dir() -> String {
        "reports".into()
    }

    // Display defaults
    pub fn recent_days() -> i64 {
        30
    }
    pub fn template() -> String {
        "No.: {id}\nTitle: {title}\nAuthor: {author}\nViews: {view_count}\nPosted: {posted_date}\n------------------------------".into()
    }
    pub fn max_title_graphemes() -> usize {
        80
    }

    // Logging defaults
    pub fn level() -> String {
        "info".into()
    }

    // Source defaults
    pub fn default_sources() -> Vec<SourceDefinition> {
        [
            (
                "computer",
                "컴퓨터공학과 공지사항",
                "https://www.hanbat.ac.kr/prog/bbsArticle/BBSMSTR_000000000333/list.do",
            ),
            (
                "electrical",
                "전기공학과 공지사항",
                "https://www.hanbat.ac.kr/prog/bbsArticle/BBSMSTR_000000000348/list.do",
            ),
        ]
        .into_iter()
        .filter_map(|(key, name, url)| {
            LogicalKey::parse(key).ok().map(|key| SourceDefinition {
                key,
                source: SourceConfig::new(name, url),
            })
        })
        .collect()
    }
}
