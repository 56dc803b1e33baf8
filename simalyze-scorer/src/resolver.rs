//! Metadata Resolver
//!
//! Turns an [`ItemDescriptor`] into [`ResolvedMetadata`]: resolves the
//! canonical identity, then fetches up to six identity-scoped resources plus
//! the creator's stats. Every fetch is cache-checked first and runs under the
//! fetch gate.
//!
//! # Failure handling
//! Resolution never fails. A fetch error is logged and the field stays
//! `None`; nothing is retried within the same pass.
//!
//! # Ordering
//! 1. Identity resolution and creator stats run concurrently.
//! 2. Once identity is known, the six dependent fetches run concurrently.
//!    Revision-scoped ones (assets, screenshots, content) are skipped when no
//!    revision version is known.

use crate::api_client::MetadataSource;
use crate::cache::{CacheTtls, TtlCache};
use crate::error::FetchError;
use crate::gate::ConcurrencyGate;
use crate::types::{
    CanonicalIdentity, CreatorStats, IdentityResolution, IdentitySource, ItemDescriptor,
    ItemRecord, ResolvedMetadata,
};
use simalyze_common::Clock;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

/// Key of the core-record cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Slug { owner: String, item: String },
    Id(String),
}

impl RecordKey {
    fn slug(owner: &str, item: &str) -> Self {
        RecordKey::Slug {
            owner: owner.to_string(),
            item: item.to_string(),
        }
    }
}

/// Revision-scoped cache key
type VersionedKey = (CanonicalIdentity, u64);

/// One cache per resource kind
pub struct MetadataCaches {
    pub records: TtlCache<RecordKey, ItemRecord>,
    pub creators: TtlCache<String, CreatorStats>,
    pub assets: TtlCache<VersionedKey, u64>,
    pub revisions: TtlCache<CanonicalIdentity, u64>,
    pub screenshots: TtlCache<VersionedKey, u64>,
    pub engagement: TtlCache<CanonicalIdentity, f64>,
    pub descendants: TtlCache<CanonicalIdentity, u64>,
    pub content: TtlCache<VersionedKey, Arc<str>>,
}

impl MetadataCaches {
    pub fn new(ttls: &CacheTtls, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: TtlCache::new("records", ttls.record, clock.clone()),
            creators: TtlCache::new("creators", ttls.creator, clock.clone()),
            assets: TtlCache::new("assets", ttls.asset, clock.clone()),
            revisions: TtlCache::new("revisions", ttls.revision, clock.clone()),
            screenshots: TtlCache::new("screenshots", ttls.screenshot, clock.clone()),
            engagement: TtlCache::new("engagement", ttls.engagement, clock.clone()),
            descendants: TtlCache::new("descendants", ttls.descendant, clock.clone()),
            content: TtlCache::new("content", ttls.content, clock),
        }
    }
}

/// Steps of the identity fallback chain, tried in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupStep {
    CachedBySlug,
    CachedById,
    FetchBySlug,
    FetchById,
}

const IDENTITY_CHAIN: [LookupStep; 4] = [
    LookupStep::CachedBySlug,
    LookupStep::CachedById,
    LookupStep::FetchBySlug,
    LookupStep::FetchById,
];

/// Resolves descriptors into metadata via cache, gate, and remote source
pub struct MetadataResolver {
    source: Arc<dyn MetadataSource>,
    fetch_gate: ConcurrencyGate,
    caches: MetadataCaches,
}

impl MetadataResolver {
    pub fn new(
        source: Arc<dyn MetadataSource>,
        fetch_gate: ConcurrencyGate,
        caches: MetadataCaches,
    ) -> Self {
        Self {
            source,
            fetch_gate,
            caches,
        }
    }

    pub fn caches(&self) -> &MetadataCaches {
        &self.caches
    }

    pub fn fetch_gate(&self) -> &ConcurrencyGate {
        &self.fetch_gate
    }

    /// Resolve everything obtainable for `descriptor`
    pub async fn resolve(&self, descriptor: &ItemDescriptor) -> ResolvedMetadata {
        let (identity, creator_stats) = tokio::join!(
            self.resolve_identity(descriptor),
            self.resolve_creator(descriptor),
        );

        let mut metadata = ResolvedMetadata::empty(identity);
        metadata.creator_stats = creator_stats;

        let Some(id) = metadata.canonical_identity().cloned() else {
            debug!(link = %descriptor.link, "No identity, skipping item resources");
            return metadata;
        };
        let version = metadata.identity.revision_version();

        let (assets, revisions, screenshots, engagement, descendants, content) = tokio::join!(
            self.resolve_asset_count(&id, version),
            self.resolve_revision_count(&id),
            self.resolve_screenshot_count(&id, version),
            self.resolve_engagement(&id),
            self.resolve_descendant_count(&id),
            self.resolve_content(&id, version),
        );

        metadata.asset_count = assets;
        metadata.revision_count = revisions;
        metadata.screenshot_count = screenshots;
        metadata.avg_engagement_secs = engagement;
        metadata.descendant_count = descendants;
        metadata.content_body = content;

        debug!(
            identity = %id,
            version = ?version,
            creator = metadata.creator_stats.is_some(),
            assets = ?metadata.asset_count,
            revisions = ?metadata.revision_count,
            screenshots = ?metadata.screenshot_count,
            engagement = ?metadata.avg_engagement_secs,
            descendants = ?metadata.descendant_count,
            content = metadata.content_body.is_some(),
            "Metadata resolved"
        );

        metadata
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Walk the fallback chain until a step yields a record
    pub async fn resolve_identity(&self, descriptor: &ItemDescriptor) -> IdentityResolution {
        for step in IDENTITY_CHAIN {
            if let Some(resolution) = self.try_lookup(step, descriptor).await {
                debug!(step = ?step, identity = ?resolution.identity(), "Identity resolved");
                return resolution;
            }
        }

        match descriptor.raw_id() {
            Some(raw_id) => {
                debug!(raw_id, "Identity lookups failed, assuming raw identifier");
                IdentityResolution::Assumed(CanonicalIdentity::new(raw_id))
            }
            None => {
                debug!(link = %descriptor.link, "Identity unresolved");
                IdentityResolution::Unresolved
            }
        }
    }

    async fn try_lookup(
        &self,
        step: LookupStep,
        descriptor: &ItemDescriptor,
    ) -> Option<IdentityResolution> {
        match step {
            LookupStep::CachedBySlug => {
                let (owner, item) = descriptor.slugs()?;
                let record = self.caches.records.get_fresh(&RecordKey::slug(owner, item))?;
                Some(resolved(record, IdentitySource::Cache))
            }
            LookupStep::CachedById => {
                let raw_id = descriptor.raw_id()?;
                let record = self
                    .caches
                    .records
                    .get_fresh(&RecordKey::Id(raw_id.to_string()))?;
                Some(resolved(record, IdentitySource::Cache))
            }
            LookupStep::FetchBySlug => {
                let (owner, item) = descriptor.slugs()?;
                let subject = format!("@{}/{}", owner, item);
                let record = self
                    .gated("record_by_slug", &subject, self.source.record_by_slug(owner, item))
                    .await?;
                self.caches
                    .records
                    .set(RecordKey::Id(record.project.id.clone()), record.clone());
                self.caches
                    .records
                    .set(RecordKey::slug(owner, item), record.clone());
                Some(resolved(record, IdentitySource::SlugLookup))
            }
            LookupStep::FetchById => {
                let raw_id = descriptor.raw_id()?;
                let record = self
                    .gated("record_by_id", raw_id, self.source.record_by_id(raw_id))
                    .await?;
                self.caches
                    .records
                    .set(RecordKey::Id(record.project.id.clone()), record.clone());
                Some(resolved(record, IdentitySource::IdLookup))
            }
        }
    }

    // ========================================================================
    // Creator
    // ========================================================================

    async fn resolve_creator(&self, descriptor: &ItemDescriptor) -> Option<CreatorStats> {
        let creator = descriptor.creator_name()?;
        self.cached(
            &self.caches.creators,
            creator.to_string(),
            "creator_stats",
            creator,
            self.source.creator_stats(creator),
        )
        .await
    }

    // ========================================================================
    // Identity-scoped resources
    // ========================================================================

    async fn resolve_asset_count(&self, id: &CanonicalIdentity, version: Option<u64>) -> Option<u64> {
        let version = version?;
        self.cached(
            &self.caches.assets,
            (id.clone(), version),
            "assets",
            id.as_str(),
            self.source.asset_count(id, version),
        )
        .await
    }

    async fn resolve_revision_count(&self, id: &CanonicalIdentity) -> Option<u64> {
        self.cached(
            &self.caches.revisions,
            id.clone(),
            "revisions",
            id.as_str(),
            self.source.revision_count(id),
        )
        .await
    }

    async fn resolve_screenshot_count(
        &self,
        id: &CanonicalIdentity,
        version: Option<u64>,
    ) -> Option<u64> {
        let version = version?;
        self.cached(
            &self.caches.screenshots,
            (id.clone(), version),
            "screenshots",
            id.as_str(),
            self.source.screenshot_count(id, version),
        )
        .await
    }

    async fn resolve_engagement(&self, id: &CanonicalIdentity) -> Option<f64> {
        self.cached(
            &self.caches.engagement,
            id.clone(),
            "engagement",
            id.as_str(),
            self.source.avg_engagement_secs(id),
        )
        .await
    }

    async fn resolve_descendant_count(&self, id: &CanonicalIdentity) -> Option<u64> {
        self.cached(
            &self.caches.descendants,
            id.clone(),
            "descendants",
            id.as_str(),
            self.source.descendant_count(id),
        )
        .await
    }

    async fn resolve_content(&self, id: &CanonicalIdentity, version: Option<u64>) -> Option<Arc<str>> {
        let version = version?;
        let fetch = async move {
            self.source
                .content_body(id, version)
                .await
                .map(Arc::<str>::from)
        };
        self.cached(
            &self.caches.content,
            (id.clone(), version),
            "content",
            id.as_str(),
            fetch,
        )
        .await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Fresh cached value, or a gated fetch whose success is cached
    async fn cached<K, V, F>(
        &self,
        cache: &TtlCache<K, V>,
        key: K,
        resource: &'static str,
        subject: &str,
        fetch: F,
    ) -> Option<V>
    where
        K: Eq + Hash + std::fmt::Debug,
        V: Clone,
        F: Future<Output = Result<V, FetchError>>,
    {
        if let Some(value) = cache.get_fresh(&key) {
            return Some(value);
        }

        let value = self.gated(resource, subject, fetch).await?;
        cache.set(key, value.clone());
        Some(value)
    }

    /// Run one fetch under the fetch gate, converting failure to `None`
    async fn gated<T, F>(&self, resource: &'static str, subject: &str, fetch: F) -> Option<T>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        debug!(resource, subject, "Fetching");
        match self.fetch_gate.run(fetch).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(resource, subject, error = %e, "Fetch failed, treating as unavailable");
                None
            }
        }
    }
}

fn resolved(record: ItemRecord, source: IdentitySource) -> IdentityResolution {
    IdentityResolution::Resolved {
        identity: record.identity(),
        record,
        source,
    }
}
