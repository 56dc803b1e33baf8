//! Core types shared by the resolver, scoring engine, and analyzer
//!
//! [`ItemDescriptor`] comes in from the page side. [`ItemRecord`] and
//! [`CreatorStats`] mirror the remote API. [`ResolvedMetadata`] is what the
//! resolver hands to the scoring engine: every sub-resource is an `Option`,
//! and `None` means "could not be fetched", never "zero".

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Input
// ============================================================================

/// One observed feed item, as extracted from the page markup
///
/// Produced by an external supplier; immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDescriptor {
    /// Identifier carried by the card itself, if any
    pub raw_id: Option<String>,
    /// Owner slug from the item link (`/@owner/item`)
    pub owner_slug: Option<String>,
    /// Item slug from the item link
    pub item_slug: Option<String>,
    /// Link as it appeared on the card
    pub link: String,
    /// Whether the card shows a preview image
    pub has_preview_image: bool,
    /// Title text as rendered
    pub title: String,
    /// Creator display name as rendered
    pub creator_name: Option<String>,
    /// Like count as rendered
    pub observed_likes: u64,
    /// View count as rendered
    pub observed_views: u64,
}

impl ItemDescriptor {
    /// Owner and item slug, only when both are present and non-empty
    pub fn slugs(&self) -> Option<(&str, &str)> {
        match (self.owner_slug.as_deref(), self.item_slug.as_deref()) {
            (Some(owner), Some(item)) if !owner.is_empty() && !item.is_empty() => {
                Some((owner, item))
            }
            _ => None,
        }
    }

    /// Raw identifier, ignoring empty strings
    pub fn raw_id(&self) -> Option<&str> {
        self.raw_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Creator name, ignoring blank strings
    pub fn creator_name(&self) -> Option<&str> {
        self.creator_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

// ============================================================================
// Identity
// ============================================================================

/// Stable API-assigned identifier of an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalIdentity(String);

impl CanonicalIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a resolved identity was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    Cache,
    SlugLookup,
    IdLookup,
}

/// Outcome of the identity fallback chain
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityResolution {
    /// A lookup (or a fresh cache entry) produced the core record
    Resolved {
        identity: CanonicalIdentity,
        record: ItemRecord,
        source: IdentitySource,
    },
    /// Both lookups failed but the card carried a raw identifier
    Assumed(CanonicalIdentity),
    /// Nothing to go on
    Unresolved,
}

impl IdentityResolution {
    pub fn identity(&self) -> Option<&CanonicalIdentity> {
        match self {
            IdentityResolution::Resolved { identity, .. } => Some(identity),
            IdentityResolution::Assumed(identity) => Some(identity),
            IdentityResolution::Unresolved => None,
        }
    }

    pub fn record(&self) -> Option<&ItemRecord> {
        match self {
            IdentityResolution::Resolved { record, .. } => Some(record),
            _ => None,
        }
    }

    /// Known revision version; zero counts as unknown
    pub fn revision_version(&self) -> Option<u64> {
        self.record().and_then(ItemRecord::revision_version)
    }
}

// ============================================================================
// Remote records
// ============================================================================

/// Core item record as returned by the identity lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub project: ProjectInfo,
    #[serde(default)]
    pub project_revision: Option<RevisionInfo>,
    #[serde(default)]
    pub site: Option<serde_json::Value>,
}

impl ItemRecord {
    pub fn identity(&self) -> CanonicalIdentity {
        CanonicalIdentity::new(self.project.id.clone())
    }

    pub fn revision_version(&self) -> Option<u64> {
        self.project_revision
            .as_ref()
            .map(|revision| revision.version)
            .filter(|version| *version > 0)
    }

    /// Published as a standalone site
    pub fn is_published_site(&self) -> bool {
        self.site.as_ref().is_some_and(|site| !site.is_null())
    }

    pub fn title(&self) -> &str {
        self.project.title.as_deref().unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.project.description.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stats: Option<ProjectStats>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from_template: bool,
    #[serde(default)]
    pub created_by: Option<CreatorRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub likes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: u64,
}

/// Aggregate stats across all of a creator's items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_likes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_views: u64,
}

/// Treats an explicit JSON `null` like a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Resolver output
// ============================================================================

/// Everything the resolver could find out about one item
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMetadata {
    pub identity: IdentityResolution,
    pub creator_stats: Option<CreatorStats>,
    pub asset_count: Option<u64>,
    pub revision_count: Option<u64>,
    pub screenshot_count: Option<u64>,
    /// Average active engagement per session, in seconds
    pub avg_engagement_secs: Option<f64>,
    pub descendant_count: Option<u64>,
    pub content_body: Option<Arc<str>>,
}

impl ResolvedMetadata {
    /// Nothing resolved beyond the given identity outcome
    pub fn empty(identity: IdentityResolution) -> Self {
        Self {
            identity,
            creator_stats: None,
            asset_count: None,
            revision_count: None,
            screenshot_count: None,
            avg_engagement_secs: None,
            descendant_count: None,
            content_body: None,
        }
    }

    /// Nothing resolved at all
    pub fn unavailable() -> Self {
        Self::empty(IdentityResolution::Unresolved)
    }

    pub fn record(&self) -> Option<&ItemRecord> {
        self.identity.record()
    }

    pub fn canonical_identity(&self) -> Option<&CanonicalIdentity> {
        self.identity.identity()
    }
}
