//! Analysis pipeline
//!
//! [`Analyzer`] owns the resolver, the scoring engine, the analysis cache and
//! the display state. One call to [`Analyzer::analyze`] always produces a
//! decision: resolution failures lower the score, scoring failures produce
//! the cached failure sentinel.
//!
//! # Flow (per item, under the analysis gate)
//! 1. Resolve metadata (its fetches run under the fetch gate)
//! 2. Derive the analysis key: canonical identity, else the link
//! 3. Reuse a fresh cached result, or score and cache (clearing any
//!    force-view override for the key)
//! 4. Decide from the current display settings

use crate::api_client::{ApiClient, MetadataSource};
use crate::cache::TtlCache;
use crate::config::AnalyzerConfig;
use crate::decision::{Decision, DisplaySettings, ScoreTier};
use crate::error::AnalyzerError;
use crate::gate::ConcurrencyGate;
use crate::resolver::{MetadataCaches, MetadataResolver};
use crate::scoring::{AnalysisResult, ScoringEngine};
use crate::types::{CanonicalIdentity, ItemDescriptor, ResolvedMetadata};
use futures::future::join_all;
use serde::Serialize;
use simalyze_common::{Clock, SystemClock};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info};

/// Key of the analysis cache and of force-view overrides
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKey {
    Identity(CanonicalIdentity),
    /// Fallback when no identity is known; varies with link formatting
    Link(String),
}

impl AnalysisKey {
    pub fn for_item(descriptor: &ItemDescriptor, metadata: &ResolvedMetadata) -> Self {
        match metadata.canonical_identity() {
            Some(identity) => AnalysisKey::Identity(identity.clone()),
            None => AnalysisKey::Link(descriptor.link.clone()),
        }
    }
}

impl fmt::Display for AnalysisKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKey::Identity(identity) => write!(f, "{}", identity),
            AnalysisKey::Link(link) => write!(f, "link:{}", link),
        }
    }
}

/// Per-item outcome handed to the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct ItemAnalysis {
    pub key: AnalysisKey,
    pub result: Arc<AnalysisResult>,
    pub decision: Decision,
    pub tier: ScoreTier,
}

impl ItemAnalysis {
    pub fn score(&self) -> u8 {
        self.result.composite_score
    }
}

pub struct Analyzer {
    resolver: MetadataResolver,
    engine: ScoringEngine,
    analysis_gate: ConcurrencyGate,
    analyses: TtlCache<AnalysisKey, Arc<AnalysisResult>>,
    display: RwLock<DisplaySettings>,
    forced: RwLock<HashSet<AnalysisKey>>,
}

impl Analyzer {
    pub fn new(config: &AnalyzerConfig, source: Arc<dyn MetadataSource>, clock: Arc<dyn Clock>) -> Self {
        let caches = MetadataCaches::new(&config.ttls, clock.clone());
        let resolver = MetadataResolver::new(
            source,
            ConcurrencyGate::bounded(config.fetch_limit),
            caches,
        );

        Self {
            resolver,
            engine: ScoringEngine::new(config.keyword.clone()),
            analysis_gate: ConcurrencyGate::bounded(config.analysis_limit),
            analyses: TtlCache::new("analyses", config.ttls.analysis, clock),
            display: RwLock::new(config.display),
            forced: RwLock::new(HashSet::new()),
        }
    }

    /// Analyzer backed by the HTTP API and the wall clock
    pub fn with_http(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let client = ApiClient::new(&config.api_base_url, config.request_timeout)?;
        Ok(Self::new(config, Arc::new(client), Arc::new(SystemClock)))
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Analyze one item
    pub async fn analyze(&self, descriptor: &ItemDescriptor) -> ItemAnalysis {
        self.analysis_gate.run(self.analyze_now(descriptor)).await
    }

    /// Analyze every item; results come back in input order
    pub async fn analyze_all(&self, descriptors: &[ItemDescriptor]) -> Vec<ItemAnalysis> {
        info!(items = descriptors.len(), "Analyzing batch");
        join_all(descriptors.iter().map(|descriptor| self.analyze(descriptor))).await
    }

    async fn analyze_now(&self, descriptor: &ItemDescriptor) -> ItemAnalysis {
        let metadata = self.resolver.resolve(descriptor).await;
        let key = AnalysisKey::for_item(descriptor, &metadata);

        let result = match self.analyses.get_fresh(&key) {
            Some(result) => result,
            None => {
                let result = Arc::new(self.score(&key, descriptor, &metadata));
                self.analyses.set(key.clone(), result.clone());
                self.clear_forced(&key);
                result
            }
        };

        let decision = self.decide(&key, result.composite_score);
        let tier = ScoreTier::of(result.composite_score);

        info!(
            key = %key,
            score = result.composite_score,
            decision = decision.as_str(),
            "Item analyzed"
        );

        ItemAnalysis {
            key,
            result,
            decision,
            tier,
        }
    }

    fn score(
        &self,
        key: &AnalysisKey,
        descriptor: &ItemDescriptor,
        metadata: &ResolvedMetadata,
    ) -> AnalysisResult {
        match self.engine.score(descriptor, metadata) {
            Ok(result) => result,
            Err(e) => {
                error!(key = %key, error = %e, "Analysis failed");
                AnalysisResult::failed()
            }
        }
    }

    fn decide(&self, key: &AnalysisKey, score: u8) -> Decision {
        self.display_settings()
            .decide_with_override(score, self.is_forced(key))
    }

    // ========================================================================
    // Renderer-facing state
    // ========================================================================

    /// Suppress hide/blur for `key` until it is next scored afresh
    pub fn force_view(&self, key: &AnalysisKey) {
        debug!(key = %key, "Force view");
        self.forced
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone());
    }

    pub fn is_forced(&self, key: &AnalysisKey) -> bool {
        self.forced
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    fn clear_forced(&self, key: &AnalysisKey) {
        self.forced
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    pub fn set_display_settings(&self, settings: DisplaySettings) {
        info!(
            hide = settings.toggles.hide_enabled,
            blur = settings.toggles.blur_enabled,
            highlight = settings.toggles.highlight_enabled,
            threshold = settings.highlight_threshold,
            "Display settings changed"
        );
        *self.display.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    pub fn display_settings(&self) -> DisplaySettings {
        *self.display.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh cached result for `key`, if any
    pub fn cached_result(&self, key: &AnalysisKey) -> Option<Arc<AnalysisResult>> {
        self.analyses.get_fresh(key)
    }

    /// Decision re-derived from a fresh cached result, without fetching
    pub fn cached_decision(&self, key: &AnalysisKey) -> Option<Decision> {
        self.cached_result(key)
            .map(|result| self.decide(key, result.composite_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IdentityResolution;

    #[test]
    fn test_key_prefers_identity() {
        let descriptor = ItemDescriptor::from_link("/@someone/thing");
        let metadata =
            ResolvedMetadata::empty(IdentityResolution::Assumed(CanonicalIdentity::new("raw_9")));
        assert_eq!(
            AnalysisKey::for_item(&descriptor, &metadata),
            AnalysisKey::Identity(CanonicalIdentity::new("raw_9"))
        );
    }

    #[test]
    fn test_key_falls_back_to_link() {
        let descriptor = ItemDescriptor::from_link("/@someone/thing");
        let key = AnalysisKey::for_item(&descriptor, &ResolvedMetadata::unavailable());
        assert_eq!(key, AnalysisKey::Link("/@someone/thing".to_string()));
        assert_eq!(key.to_string(), "link:/@someone/thing");
    }
}
