//! Analyzer configuration
//!
//! Compiled defaults overlaid with whatever the TOML file provides. Every
//! value the file sets is validated here; the rest of the crate never sees
//! an out-of-range setting.

use crate::api_client::{DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT};
use crate::cache::CacheTtls;
use crate::decision::{DisplaySettings, DisplayToggles, DEFAULT_HIGHLIGHT_THRESHOLD};
use crate::scoring::KeywordPenalty;
use simalyze_common::config::{CacheConfig, TomlConfig};
use simalyze_common::Error;
use std::time::Duration;
use tracing::{debug, info};

/// Default maximum concurrent remote fetches
pub const DEFAULT_FETCH_LIMIT: usize = 5;

/// Default maximum concurrent item analyses
pub const DEFAULT_ANALYSIS_LIMIT: usize = 1;

pub const DEFAULT_KEYWORD: &str = "Keyboard & Achievements";
pub const DEFAULT_KEYWORD_PENALTY: i32 = -50;

/// Accepted range for `[keyword] penalty`
pub const KEYWORD_PENALTY_RANGE: std::ops::RangeInclusive<i32> = -100..=0;

/// Fully resolved analyzer settings
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub ttls: CacheTtls,
    pub fetch_limit: usize,
    pub analysis_limit: usize,
    pub display: DisplaySettings,
    /// `None` disables the banned-keyword penalty
    pub keyword: Option<KeywordPenalty>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            ttls: CacheTtls::default(),
            fetch_limit: DEFAULT_FETCH_LIMIT,
            analysis_limit: DEFAULT_ANALYSIS_LIMIT,
            display: DisplaySettings::default(),
            keyword: KeywordPenalty::new(DEFAULT_KEYWORD, DEFAULT_KEYWORD_PENALTY),
        }
    }
}

impl AnalyzerConfig {
    /// Overlay a parsed config file on the defaults
    pub fn from_toml(file: &TomlConfig) -> Result<Self, Error> {
        let defaults = Self::default();

        let api_base_url = match file.api.base_url.as_deref().map(str::trim) {
            Some("") => {
                return Err(Error::Config("api.base_url must not be empty".to_string()))
            }
            Some(url) => url.to_string(),
            None => defaults.api_base_url,
        };

        let request_timeout = match file.api.request_timeout_secs {
            Some(0) => {
                return Err(Error::Config(
                    "api.request_timeout_secs must be greater than 0".to_string(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => defaults.request_timeout,
        };

        let ttls = ttls_from(&file.cache, defaults.ttls)?;

        let highlight_threshold = file
            .display
            .highlight_threshold
            .unwrap_or(DEFAULT_HIGHLIGHT_THRESHOLD);
        if highlight_threshold > 100 {
            return Err(Error::Config(format!(
                "display.highlight_threshold must be within 0..=100, got {}",
                highlight_threshold
            )));
        }

        let display = DisplaySettings {
            toggles: DisplayToggles {
                hide_enabled: file.display.hide_enabled.unwrap_or(false),
                blur_enabled: file.display.blur_enabled.unwrap_or(false),
                highlight_enabled: file.display.highlight_enabled.unwrap_or(false),
            },
            highlight_threshold,
        };

        if let Some(penalty) = file.keyword.penalty {
            if !KEYWORD_PENALTY_RANGE.contains(&penalty) {
                return Err(Error::Config(format!(
                    "keyword.penalty must be within {}..={}, got {}",
                    KEYWORD_PENALTY_RANGE.start(),
                    KEYWORD_PENALTY_RANGE.end(),
                    penalty
                )));
            }
        }

        let keyword = match (&file.keyword.text, file.keyword.penalty) {
            (None, None) => defaults.keyword,
            (text, penalty) => KeywordPenalty::new(
                text.as_deref().unwrap_or(DEFAULT_KEYWORD),
                penalty.unwrap_or(DEFAULT_KEYWORD_PENALTY),
            ),
        };

        let config = Self {
            api_base_url,
            request_timeout,
            ttls,
            fetch_limit: file.concurrency.fetch_limit.unwrap_or(defaults.fetch_limit),
            analysis_limit: file
                .concurrency
                .analysis_limit
                .unwrap_or(defaults.analysis_limit),
            display,
            keyword,
        };

        info!(
            api = %config.api_base_url,
            fetch_limit = config.fetch_limit,
            analysis_limit = config.analysis_limit,
            threshold = config.display.highlight_threshold,
            keyword = ?config.keyword.as_ref().map(|k| k.keyword.as_str()),
            "Analyzer configuration resolved"
        );

        Ok(config)
    }
}

fn ttls_from(cache: &CacheConfig, defaults: CacheTtls) -> Result<CacheTtls, Error> {
    fn ttl(name: &str, secs: Option<u64>, default: Duration) -> Result<Duration, Error> {
        match secs {
            Some(0) => Err(Error::Config(format!(
                "cache.{} must be greater than 0",
                name
            ))),
            Some(secs) => {
                debug!(cache = name, secs, "TTL override");
                Ok(Duration::from_secs(secs))
            }
            None => Ok(default),
        }
    }

    Ok(CacheTtls {
        record: ttl("record_ttl_secs", cache.record_ttl_secs, defaults.record)?,
        creator: ttl("creator_ttl_secs", cache.creator_ttl_secs, defaults.creator)?,
        asset: ttl("asset_ttl_secs", cache.asset_ttl_secs, defaults.asset)?,
        revision: ttl("revision_ttl_secs", cache.revision_ttl_secs, defaults.revision)?,
        screenshot: ttl(
            "screenshot_ttl_secs",
            cache.screenshot_ttl_secs,
            defaults.screenshot,
        )?,
        engagement: ttl(
            "engagement_ttl_secs",
            cache.engagement_ttl_secs,
            defaults.engagement,
        )?,
        descendant: ttl(
            "descendant_ttl_secs",
            cache.descendant_ttl_secs,
            defaults.descendant,
        )?,
        content: ttl("content_ttl_secs", cache.content_ttl_secs, defaults.content)?,
        analysis: ttl("analysis_ttl_secs", cache.analysis_ttl_secs, defaults.analysis)?,
    })
}
