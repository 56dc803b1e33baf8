//! Error types for simalyze-scorer
//!
//! None of these escape the analysis pipeline: fetch errors degrade a field
//! to "unavailable" and scoring errors degrade the item to the failure
//! sentinel. They exist so each layer can report what went wrong.

use thiserror::Error;

/// Failure of one remote resource fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (DNS, connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// The resource does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("API returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Body was not the expected JSON shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response parsed but lacks a field the caller needs
    #[error("Response missing {0}")]
    MissingField(&'static str),
}

/// Failure of the scoring engine on a particular input
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("Invalid scoring input: {0}")]
    InvalidInput(String),
}

/// Construction-time failure of the analyzer
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] simalyze_common::Error),
}
