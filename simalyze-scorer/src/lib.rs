//! simalyze-scorer library interface
//!
//! Resolves remote metadata for feed items, scores them, and decides how
//! each should be displayed. The binary in `main.rs` is a thin CLI over
//! [`Analyzer`].

pub mod analyzer;
pub mod api_client;
pub mod cache;
pub mod config;
pub mod decision;
pub mod descriptor;
pub mod error;
pub mod gate;
pub mod resolver;
pub mod scoring;
pub mod types;

pub use analyzer::{AnalysisKey, Analyzer, ItemAnalysis};
pub use api_client::{ApiClient, MetadataSource};
pub use config::AnalyzerConfig;
pub use decision::{decide, decide_with_override, Decision, DisplaySettings, DisplayToggles, ScoreTier};
pub use error::{AnalyzerError, FetchError, ScoringError};
pub use scoring::{AnalysisResult, Dimension, ScoringEngine};
pub use types::{IdentityResolution, ItemDescriptor, ResolvedMetadata};
