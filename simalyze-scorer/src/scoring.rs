//! Scoring Engine
//!
//! Turns a descriptor plus its resolved metadata into a 0-100 composite
//! score with a per-dimension breakdown and a one-line summary.
//!
//! # Scoring Algorithm
//! Start from a base of 50, add eight integer dimension impacts, clamp to
//! `[0, 100]`:
//! 1. **Content quality**: title and description length, thumbnail, banned keyword
//! 2. **Engagement**: likes, views, average engagement time
//! 3. **Creator reputation**: creator's aggregate likes and views
//! 4. **Project maturity**: revision count, published-as-site
//! 5. **Influence & originality**: remix count, template origin
//! 6. **Code complexity**: asset count, revision count
//! 7. **Visual presentation**: thumbnail, screenshot count
//! 8. **Overall completeness**: joint availability of every resource
//!
//! # Absent vs. zero
//! Every resolved resource is an `Option`. `None` takes the dimension's
//! "unavailable" branch; `Some(0)` goes through the ordinary tiers. The two
//! never score the same.
//!
//! # Summary
//! - ≥ 80: high quality
//! - ≥ 60: generally good
//! - ≥ 50: average
//! - otherwise: low quality

use crate::error::ScoringError;
use crate::types::{ItemDescriptor, ResolvedMetadata};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Score every item starts from before dimension impacts
pub const BASE_SCORE: i32 = 50;

/// Summary carried by the failure sentinel
pub const FAILED_SUMMARY: &str = "Analysis failed.";

// ============================================================================
// Result types
// ============================================================================

/// One of the eight scoring dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    ContentQuality,
    Engagement,
    CreatorReputation,
    ProjectMaturity,
    InfluenceAndOriginality,
    CodeComplexity,
    VisualPresentation,
    OverallCompleteness,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::ContentQuality,
        Dimension::Engagement,
        Dimension::CreatorReputation,
        Dimension::ProjectMaturity,
        Dimension::InfluenceAndOriginality,
        Dimension::CodeComplexity,
        Dimension::VisualPresentation,
        Dimension::OverallCompleteness,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::ContentQuality => "Content quality",
            Dimension::Engagement => "Engagement",
            Dimension::CreatorReputation => "Creator reputation",
            Dimension::ProjectMaturity => "Project maturity",
            Dimension::InfluenceAndOriginality => "Influence & originality",
            Dimension::CodeComplexity => "Code complexity",
            Dimension::VisualPresentation => "Visual presentation",
            Dimension::OverallCompleteness => "Overall completeness",
        }
    }

    /// Reason reported when no rule fired
    fn default_reason(self) -> &'static str {
        match self {
            Dimension::ContentQuality => "Adequate content presentation.",
            Dimension::Engagement => "Moderate engagement.",
            Dimension::CreatorReputation => "Average creator reputation.",
            Dimension::ProjectMaturity => "Moderate project maturity.",
            Dimension::InfluenceAndOriginality => "Standard influence/originality.",
            Dimension::CodeComplexity => "Average code complexity estimate.",
            Dimension::VisualPresentation => "Standard visual presentation.",
            Dimension::OverallCompleteness => "Standard completeness.",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signed contribution of one dimension, with its explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionScore {
    pub impact: i32,
    pub reason: String,
}

/// Per-dimension impacts, ordered by dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScoreBreakdown(BTreeMap<Dimension, DimensionScore>);

impl ScoreBreakdown {
    pub fn get(&self, dimension: Dimension) -> Option<&DimensionScore> {
        self.0.get(&dimension)
    }

    /// Impact of `dimension`, zero when not scored
    pub fn impact(&self, dimension: Dimension) -> i32 {
        self.get(dimension).map_or(0, |score| score.impact)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &DimensionScore)> {
        self.0.iter().map(|(dimension, score)| (*dimension, score))
    }

    pub fn total_impact(&self) -> i32 {
        self.0
            .values()
            .fold(0i32, |total, score| total.saturating_add(score.impact))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, dimension: Dimension, score: DimensionScore) {
        self.0.insert(dimension, score);
    }
}

/// Output of one analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    /// Composite score in `[0, 100]`
    pub composite_score: u8,
    pub breakdown: ScoreBreakdown,
    pub summary: String,
}

impl AnalysisResult {
    /// Sentinel for an item whose scoring failed
    pub fn failed() -> Self {
        Self {
            composite_score: 0,
            breakdown: ScoreBreakdown::default(),
            summary: FAILED_SUMMARY.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.breakdown.is_empty() && self.summary == FAILED_SUMMARY
    }
}

/// Summary line for a composite score
pub fn summary_for(score: u8) -> &'static str {
    match score {
        80.. => "This project demonstrates high quality, strong engagement, and a mature development. Looks good!",
        60..=79 => "This project is generally good, with decent quality and engagement. Worth a look.",
        50..=59 => "This project is of average quality. It has some potential but could use improvements.",
        _ => "This project appears to be of very low quality and may contain unoriginal or undesirable content.",
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Banned keyword and the impact applied when it matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordPenalty {
    pub keyword: String,
    pub penalty: i32,
}

impl KeywordPenalty {
    /// `None` for a blank keyword
    pub fn new(keyword: impl Into<String>, penalty: i32) -> Option<Self> {
        let keyword = keyword.into();
        if keyword.trim().is_empty() {
            return None;
        }
        Some(Self { keyword, penalty })
    }

    fn matches(&self, title: &str, description: &str) -> bool {
        let needle = self.keyword.to_lowercase();
        title.contains(&needle) || description.contains(&needle)
    }
}

/// Accumulates one dimension's impact and reasons
#[derive(Default)]
struct Tally {
    impact: i32,
    reasons: Vec<String>,
}

impl Tally {
    fn add(&mut self, delta: i32, reason: impl Into<String>) {
        self.impact = self.impact.saturating_add(delta);
        self.reasons.push(reason.into());
    }

    fn note(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }

    fn finish(self, dimension: Dimension) -> DimensionScore {
        let reason = if self.reasons.is_empty() {
            dimension.default_reason().to_string()
        } else {
            self.reasons.join(" ")
        };
        DimensionScore {
            impact: self.impact,
            reason,
        }
    }
}

/// Text and counters shared by several dimensions
struct Signals<'a> {
    title: String,
    description: String,
    has_thumbnail: bool,
    metadata: &'a ResolvedMetadata,
}

impl<'a> Signals<'a> {
    fn new(descriptor: &ItemDescriptor, metadata: &'a ResolvedMetadata) -> Self {
        let record = metadata.record();
        let title = record
            .map(|r| r.title())
            .filter(|t| !t.is_empty())
            .unwrap_or(descriptor.title.as_str())
            .to_lowercase();
        let description = record.map_or("", |r| r.description()).to_lowercase();

        Self {
            title,
            description,
            has_thumbnail: descriptor.has_preview_image,
            metadata,
        }
    }

    fn title_len(&self) -> usize {
        self.title.chars().count()
    }

    fn description_len(&self) -> usize {
        self.description.chars().count()
    }
}

/// Pure, deterministic scorer
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    keyword: Option<KeywordPenalty>,
}

impl ScoringEngine {
    pub fn new(keyword: Option<KeywordPenalty>) -> Self {
        Self { keyword }
    }

    pub fn keyword(&self) -> Option<&KeywordPenalty> {
        self.keyword.as_ref()
    }

    /// Score one item
    ///
    /// Fails only on metadata no resolver could produce (negative or
    /// non-finite engagement time).
    pub fn score(
        &self,
        descriptor: &ItemDescriptor,
        metadata: &ResolvedMetadata,
    ) -> Result<AnalysisResult, ScoringError> {
        if let Some(avg) = metadata.avg_engagement_secs {
            if !avg.is_finite() || avg < 0.0 {
                return Err(ScoringError::InvalidInput(format!(
                    "average engagement must be a non-negative number, got {}",
                    avg
                )));
            }
        }

        let signals = Signals::new(descriptor, metadata);

        let mut breakdown = ScoreBreakdown::default();
        breakdown.insert(Dimension::ContentQuality, self.content_quality(&signals));
        breakdown.insert(Dimension::Engagement, engagement(descriptor, &signals));
        breakdown.insert(Dimension::CreatorReputation, creator_reputation(&signals));
        breakdown.insert(Dimension::ProjectMaturity, project_maturity(&signals));
        breakdown.insert(
            Dimension::InfluenceAndOriginality,
            influence_and_originality(&signals),
        );
        breakdown.insert(Dimension::CodeComplexity, code_complexity(&signals));
        breakdown.insert(Dimension::VisualPresentation, visual_presentation(&signals));
        breakdown.insert(Dimension::OverallCompleteness, completeness(&signals));

        let raw = BASE_SCORE.saturating_add(breakdown.total_impact());
        let composite_score = raw.clamp(0, 100) as u8;

        debug!(
            identity = ?metadata.canonical_identity(),
            raw,
            composite = composite_score,
            content = breakdown.impact(Dimension::ContentQuality),
            engagement = breakdown.impact(Dimension::Engagement),
            creator = breakdown.impact(Dimension::CreatorReputation),
            maturity = breakdown.impact(Dimension::ProjectMaturity),
            influence = breakdown.impact(Dimension::InfluenceAndOriginality),
            complexity = breakdown.impact(Dimension::CodeComplexity),
            visual = breakdown.impact(Dimension::VisualPresentation),
            completeness = breakdown.impact(Dimension::OverallCompleteness),
            "Scoring complete"
        );

        Ok(AnalysisResult {
            composite_score,
            breakdown,
            summary: summary_for(composite_score).to_string(),
        })
    }

    fn content_quality(&self, s: &Signals<'_>) -> DimensionScore {
        let mut tally = Tally::default();
        let record_available = s.metadata.record().is_some();

        if let Some(keyword) = self.keyword.as_ref().filter(|k| k.matches(&s.title, &s.description)) {
            tally.add(
                keyword.penalty,
                format!(
                    "Contains unwanted keyword \"{}\" ({} penalty).",
                    keyword.keyword, keyword.penalty
                ),
            );
        }

        let title_len = s.title_len();
        match title_len {
            0 => tally.add(-15, "Missing title."),
            1..=4 => tally.add(-10, format!("Very short title ({} chars).", title_len)),
            5..=14 => tally.add(-5, format!("Short title ({} chars).", title_len)),
            51.. => tally.add(-2, format!("Very long title ({} chars).", title_len)),
            _ => {}
        }

        let description_len = s.description_len();
        if record_available {
            match description_len {
                0 => tally.add(-15, "Missing description."),
                1..=29 => tally.add(
                    -7,
                    format!("Short description ({} chars).", description_len),
                ),
                _ => tally.add(3, "Good description length."),
            }
        } else {
            tally.add(
                -5,
                "Content quality assessment limited (API data unavailable).",
            );
        }

        if title_len >= 15 && description_len >= 30 && s.has_thumbnail && record_available {
            tally.add(7, "Good title, description, and thumbnail.");
        }

        tally.finish(Dimension::ContentQuality)
    }
}

fn engagement(descriptor: &ItemDescriptor, s: &Signals<'_>) -> DimensionScore {
    let mut tally = Tally::default();

    let api_stats = s.metadata.record().and_then(|r| r.project.stats);
    let (likes, views, suffix) = match api_stats {
        Some(stats) => (stats.likes, stats.views, ""),
        None => (descriptor.observed_likes, descriptor.observed_views, " (from DOM)"),
    };

    if likes > 500 {
        tally.add(15, format!("Very high likes{}.", suffix));
    } else if likes > 100 {
        tally.add(10, format!("High likes{}.", suffix));
    } else if likes > 20 {
        tally.add(5, format!("Good likes{}.", suffix));
    }

    if views > 10_000 {
        tally.add(15, format!("Very high views{}.", suffix));
    } else if views > 2_000 {
        tally.add(10, format!("High views{}.", suffix));
    } else if views > 500 {
        tally.add(5, format!("Good views{}.", suffix));
    }

    if api_stats.is_some() {
        match s.metadata.avg_engagement_secs {
            Some(avg) if avg > 60.0 => {
                tally.add(8, format!("High average playtime ({:.0}s).", avg))
            }
            Some(avg) if avg > 15.0 => {
                tally.add(4, format!("Moderate average playtime ({:.0}s).", avg))
            }
            Some(avg) if views > 500 && avg == 0.0 => {
                tally.add(-5, "No recorded playtime despite views.")
            }
            Some(_) => {}
            None => tally.note("Playtime data unavailable from API."),
        }
    }

    if views > 1_000 && (likes as f64) < (views as f64) / 50.0 {
        match api_stats {
            Some(_) => tally.add(-10, "Low engagement relative to views (potential \"slop\")."),
            None => tally.add(-10, "Low likes relative to views (from DOM)."),
        }
    }

    if views > 500 && likes == 0 {
        match api_stats {
            Some(_) => tally.add(-7, "No engagement despite some views."),
            None => tally.add(-7, "No likes despite some views (from DOM)."),
        }
    }

    if api_stats.is_none() {
        tally.add(
            -10,
            "Engagement data assessment limited (API data unavailable).",
        );
    }

    tally.finish(Dimension::Engagement)
}

fn creator_reputation(s: &Signals<'_>) -> DimensionScore {
    let mut tally = Tally::default();

    match s.metadata.creator_stats {
        Some(stats) => {
            if stats.total_likes > 2_000 {
                tally.add(10, "Very high overall creator likes.");
            } else if stats.total_likes > 500 {
                tally.add(7, "High overall creator likes.");
            } else if stats.total_likes > 100 {
                tally.add(3, "Good overall creator likes.");
            }

            if stats.total_views > 20_000 {
                tally.add(10, "Very high overall creator views.");
            } else if stats.total_views > 5_000 {
                tally.add(7, "High overall creator views.");
            } else if stats.total_views > 1_000 {
                tally.add(3, "Good overall creator views.");
            }

            if stats.total_likes == 0 && stats.total_views == 0 {
                tally.add(-5, "New or very inactive creator.");
            }
        }
        None => tally.add(-7, "Creator reputation data unavailable from API."),
    }

    tally.finish(Dimension::CreatorReputation)
}

fn project_maturity(s: &Signals<'_>) -> DimensionScore {
    let mut tally = Tally::default();

    match (s.metadata.revision_count, s.metadata.record()) {
        (Some(revisions), Some(record)) => {
            if revisions > 20 {
                tally.add(
                    10,
                    format!("Extensive revision history ({} revisions).", revisions),
                );
            } else if revisions > 5 {
                tally.add(
                    5,
                    format!(
                        "Multiple revisions ({} revisions) (suggests ongoing development/complexity).",
                        revisions
                    ),
                );
            } else if revisions <= 2 {
                tally.add(
                    -5,
                    format!(
                        "Few revisions ({} revisions) (may indicate early stage or low effort).",
                        revisions
                    ),
                );
            }

            if record.is_published_site() {
                tally.add(5, "Published as a live site.");
            }
        }
        _ => tally.add(
            -8,
            "Project maturity data (revisions count) unavailable from API.",
        ),
    }

    tally.finish(Dimension::ProjectMaturity)
}

fn influence_and_originality(s: &Signals<'_>) -> DimensionScore {
    let mut tally = Tally::default();

    match (s.metadata.descendant_count, s.metadata.record()) {
        (Some(descendants), Some(record)) => {
            if descendants > 0 {
                let bonus = descendants.saturating_mul(2).min(20) as i32;
                tally.add(bonus, format!("Has {} remixes (+{}).", descendants, bonus));
            }
            if record.project.from_template {
                tally.add(-10, "Created from a template.");
            }
        }
        _ => tally.add(
            -5,
            "Influence data unavailable (descendants/template status).",
        ),
    }

    tally.finish(Dimension::InfluenceAndOriginality)
}

fn code_complexity(s: &Signals<'_>) -> DimensionScore {
    let mut tally = Tally::default();

    match s.metadata.asset_count {
        Some(assets) if assets > 10 => tally.add(
            7,
            format!(
                "Significant number of assets ({} assets, implies more content/complexity).",
                assets
            ),
        ),
        Some(assets) if assets > 2 => tally.add(
            3,
            format!(
                "Some assets present ({} assets, indicates custom content).",
                assets
            ),
        ),
        Some(0) => tally.add(-3, "Few or no custom assets."),
        Some(_) => {}
        None => tally.add(
            -5,
            "Asset count data unavailable (limits complexity assessment).",
        ),
    }

    match s.metadata.revision_count {
        Some(revisions) if revisions > 15 => tally.add(
            5,
            format!(
                "High number of revisions ({} revisions, suggests iterative code development).",
                revisions
            ),
        ),
        Some(revisions @ 1..=3) => tally.add(
            -2,
            format!(
                "Few revisions ({} revisions) (may indicate simpler code).",
                revisions
            ),
        ),
        Some(_) => {}
        None => tally.add(
            -5,
            "Revision data (for complexity) unavailable from API.",
        ),
    }

    tally.finish(Dimension::CodeComplexity)
}

fn visual_presentation(s: &Signals<'_>) -> DimensionScore {
    let mut tally = Tally::default();

    if !s.has_thumbnail {
        tally.add(-10, "Missing thumbnail.");
    }

    match s.metadata.screenshot_count {
        Some(shots) if shots > 3 => tally.add(
            7,
            format!(
                "Multiple screenshots ({}) present (good visual documentation).",
                shots
            ),
        ),
        Some(shots) if shots >= 1 => tally.add(
            3,
            format!("At least one additional screenshot ({}) present.", shots),
        ),
        Some(_) if !s.has_thumbnail => tally.add(-5, "No screenshots beyond default."),
        Some(_) => {}
        None => tally.add(
            -5,
            "Screenshots data unavailable (limits visual assessment).",
        ),
    }

    tally.finish(Dimension::VisualPresentation)
}

fn completeness(s: &Signals<'_>) -> DimensionScore {
    let mut tally = Tally::default();
    let m = s.metadata;

    let all_resolved = m
        .record()
        .filter(|record| record.project_revision.is_some())
        .filter(|_| {
            m.creator_stats.is_some()
                && m.asset_count.is_some()
                && m.revision_count.is_some()
                && m.screenshot_count.is_some()
                && m.avg_engagement_secs.is_some()
                && m.descendant_count.is_some()
                && m.content_body.is_some()
        });

    match all_resolved {
        Some(record) => {
            let fields_present = !record.description().is_empty()
                && !record.title().is_empty()
                && s.has_thumbnail
                && record.revision_version().is_some()
                && m.content_body.as_deref().is_some_and(|body| !body.is_empty());

            if fields_present {
                tally.add(5, "All major project metadata present and fetched.");
            } else {
                tally.add(
                    -5,
                    "Some project metadata missing or incomplete (from available API data).",
                );
            }
        }
        None => tally.add(
            -15,
            "Core project metadata unavailable from API (e.g., project not found or fetch failed).",
        ),
    }

    tally.finish(Dimension::OverallCompleteness)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CanonicalIdentity, CreatorStats, IdentityResolution, IdentitySource, ItemRecord,
        ProjectInfo, ProjectStats, RevisionInfo,
    };
    use serde_json::json;
    use std::sync::Arc;

    fn descriptor() -> ItemDescriptor {
        ItemDescriptor::from_link("/@orbiter/orbit-sandbox")
            .with_title("Orbit Sandbox")
            .with_preview_image(true)
    }

    fn record() -> ItemRecord {
        ItemRecord {
            project: ProjectInfo {
                id: "p_orbit".to_string(),
                title: Some("Orbit Sandbox Deluxe".to_string()),
                description: Some("A small gravity toy with orbiting planets".to_string()),
                stats: Some(ProjectStats {
                    likes: 150,
                    views: 3_000,
                }),
                from_template: false,
                created_by: None,
            },
            project_revision: Some(RevisionInfo { version: 4 }),
            site: Some(json!({ "id": "site_1" })),
        }
    }

    fn full_metadata() -> ResolvedMetadata {
        let record = record();
        ResolvedMetadata {
            identity: IdentityResolution::Resolved {
                identity: CanonicalIdentity::new("p_orbit"),
                record,
                source: IdentitySource::SlugLookup,
            },
            creator_stats: Some(CreatorStats {
                total_likes: 600,
                total_views: 6_000,
            }),
            asset_count: Some(5),
            revision_count: Some(8),
            screenshot_count: Some(2),
            avg_engagement_secs: Some(30.0),
            descendant_count: Some(3),
            content_body: Some(Arc::from("<html></html>")),
        }
    }

    #[test]
    fn test_full_metadata_breakdown() {
        let result = ScoringEngine::default()
            .score(&descriptor(), &full_metadata())
            .unwrap();
        let b = &result.breakdown;

        assert_eq!(b.impact(Dimension::ContentQuality), 10);
        assert_eq!(b.impact(Dimension::Engagement), 24);
        assert_eq!(b.impact(Dimension::CreatorReputation), 14);
        assert_eq!(b.impact(Dimension::ProjectMaturity), 10);
        assert_eq!(b.impact(Dimension::InfluenceAndOriginality), 6);
        assert_eq!(b.impact(Dimension::CodeComplexity), 3);
        assert_eq!(b.impact(Dimension::VisualPresentation), 3);
        assert_eq!(b.impact(Dimension::OverallCompleteness), 5);

        // 50 + 75 clamps to 100
        assert_eq!(result.composite_score, 100);
        assert!(result.summary.ends_with("Looks good!"));
        assert_eq!(b.iter().count(), Dimension::ALL.len());
    }

    #[test]
    fn test_nothing_resolved_empty_title() {
        let descriptor = ItemDescriptor::from_link("https://example.test/feed");
        let result = ScoringEngine::default()
            .score(&descriptor, &ResolvedMetadata::unavailable())
            .unwrap();
        let b = &result.breakdown;

        // Missing title (-15) plus API unavailable (-5)
        assert_eq!(b.impact(Dimension::ContentQuality), -20);
        assert!(b
            .get(Dimension::ContentQuality)
            .unwrap()
            .reason
            .contains("Missing title."));
        assert_eq!(b.impact(Dimension::Engagement), -10);
        assert_eq!(b.impact(Dimension::CreatorReputation), -7);
        assert_eq!(b.impact(Dimension::ProjectMaturity), -8);
        assert_eq!(b.impact(Dimension::InfluenceAndOriginality), -5);
        assert_eq!(b.impact(Dimension::CodeComplexity), -10);
        assert_eq!(b.impact(Dimension::VisualPresentation), -15);
        assert_eq!(b.impact(Dimension::OverallCompleteness), -15);

        assert_eq!(result.composite_score, 0);
        assert!(result.summary.contains("very low quality"));
    }

    #[test]
    fn test_absent_revisions_differs_from_zero_revisions() {
        let engine = ScoringEngine::default();

        let mut absent = full_metadata();
        absent.revision_count = None;
        let absent = engine.score(&descriptor(), &absent).unwrap();

        let mut zero = full_metadata();
        zero.revision_count = Some(0);
        let zero = engine.score(&descriptor(), &zero).unwrap();

        // Unavailable: flat -8, site bonus not considered
        assert_eq!(absent.breakdown.impact(Dimension::ProjectMaturity), -8);
        // Zero: few-revisions -5, plus published site +5
        assert_eq!(zero.breakdown.impact(Dimension::ProjectMaturity), 0);

        assert_eq!(absent.breakdown.impact(Dimension::CodeComplexity), -2);
        assert_eq!(zero.breakdown.impact(Dimension::CodeComplexity), 3);
    }

    #[test]
    fn test_absent_assets_and_screenshots_differ_from_zero() {
        let engine = ScoringEngine::default();
        let no_thumb = descriptor().with_preview_image(false);

        let mut absent = full_metadata();
        absent.asset_count = None;
        absent.screenshot_count = None;
        let absent = engine.score(&no_thumb, &absent).unwrap();

        let mut zero = full_metadata();
        zero.asset_count = Some(0);
        zero.screenshot_count = Some(0);
        let zero = engine.score(&no_thumb, &zero).unwrap();

        assert_eq!(absent.breakdown.impact(Dimension::CodeComplexity), -5);
        assert_eq!(zero.breakdown.impact(Dimension::CodeComplexity), -3);

        // Both -15, but from different rules
        assert_eq!(absent.breakdown.impact(Dimension::VisualPresentation), -15);
        assert_eq!(zero.breakdown.impact(Dimension::VisualPresentation), -15);
        assert_ne!(
            absent.breakdown.get(Dimension::VisualPresentation),
            zero.breakdown.get(Dimension::VisualPresentation)
        );
    }

    #[test]
    fn test_keyword_penalty_with_no_api_data() {
        let engine = ScoringEngine::new(KeywordPenalty::new("Keyboard & Achievements", -50));
        let descriptor = ItemDescriptor::from_link("/@someone/kb-ach")
            .with_title("Keyboard & Achievements")
            .with_preview_image(true);

        let result = engine
            .score(&descriptor, &ResolvedMetadata::unavailable())
            .unwrap();

        let content = result.breakdown.get(Dimension::ContentQuality).unwrap();
        assert_eq!(content.impact, -55);
        assert!(content
            .reason
            .starts_with("Contains unwanted keyword \"Keyboard & Achievements\" (-50 penalty)."));
        assert_eq!(result.composite_score, 0);
    }

    #[test]
    fn test_extreme_keyword_penalty_clamps_to_zero() {
        let engine = ScoringEngine::new(KeywordPenalty::new("orbit", i32::MIN));
        let descriptor = ItemDescriptor::from_link("/@someone/orbit").with_title("Orbit");

        let result = engine
            .score(&descriptor, &ResolvedMetadata::unavailable())
            .unwrap();

        assert_eq!(result.breakdown.impact(Dimension::ContentQuality), i32::MIN);
        assert_eq!(result.composite_score, 0);
    }

    #[test]
    fn test_keyword_matches_description_case_insensitively() {
        let engine = ScoringEngine::new(KeywordPenalty::new("Gravity", -50));
        let plain = ScoringEngine::default();

        let with = engine.score(&descriptor(), &full_metadata()).unwrap();
        let without = plain.score(&descriptor(), &full_metadata()).unwrap();

        assert_eq!(
            with.breakdown.total_impact(),
            without.breakdown.total_impact() - 50
        );
        assert_eq!(with.composite_score, 75);
    }

    #[test]
    fn test_blank_keyword_is_ignored() {
        assert!(KeywordPenalty::new("   ", -50).is_none());
    }

    #[test]
    fn test_dom_counts_used_without_api_stats() {
        let descriptor = descriptor().with_observed_counts("0", "1.5k");
        let result = ScoringEngine::default()
            .score(&descriptor, &ResolvedMetadata::unavailable())
            .unwrap();
        let engagement = result.breakdown.get(Dimension::Engagement).unwrap();

        // views +5, ratio -10, zero likes -7, data limited -10
        assert_eq!(engagement.impact, -22);
        assert!(engagement.reason.contains("(from DOM)"));
    }

    #[test]
    fn test_api_stats_take_precedence_over_dom_counts() {
        let descriptor = descriptor().with_observed_counts("0", "0");
        let result = ScoringEngine::default()
            .score(&descriptor, &full_metadata())
            .unwrap();
        let engagement = result.breakdown.get(Dimension::Engagement).unwrap();
        assert_eq!(engagement.impact, 24);
        assert!(!engagement.reason.contains("from DOM"));
    }

    #[test]
    fn test_zero_playtime_with_views_penalized_but_absent_is_not() {
        let engine = ScoringEngine::default();

        let mut zero = full_metadata();
        zero.avg_engagement_secs = Some(0.0);
        let zero = engine.score(&descriptor(), &zero).unwrap();
        assert_eq!(zero.breakdown.impact(Dimension::Engagement), 15);

        let mut absent = full_metadata();
        absent.avg_engagement_secs = None;
        let absent = engine.score(&descriptor(), &absent).unwrap();
        assert_eq!(absent.breakdown.impact(Dimension::Engagement), 20);
        assert!(absent
            .breakdown
            .get(Dimension::Engagement)
            .unwrap()
            .reason
            .contains("Playtime data unavailable"));
    }

    #[test]
    fn test_views_without_likes_penalized() {
        let mut record = record();
        record.project.stats = Some(ProjectStats {
            likes: 0,
            views: 3_000,
        });
        let mut metadata = full_metadata();
        metadata.identity = IdentityResolution::Resolved {
            identity: CanonicalIdentity::new("p_orbit"),
            record,
            source: IdentitySource::SlugLookup,
        };

        let result = ScoringEngine::default()
            .score(&descriptor(), &metadata)
            .unwrap();
        let engagement = result.breakdown.get(Dimension::Engagement).unwrap();
        assert_eq!(engagement.impact, -3);
        assert!(engagement.reason.contains("No engagement despite some views."));
        assert!(engagement.reason.contains("Low engagement relative to views"));
    }

    #[test]
    fn test_remix_bonus_caps_at_twenty() {
        let mut metadata = full_metadata();
        metadata.descendant_count = Some(50);
        let result = ScoringEngine::default()
            .score(&descriptor(), &metadata)
            .unwrap();
        assert_eq!(
            result.breakdown.impact(Dimension::InfluenceAndOriginality),
            20
        );
    }

    #[test]
    fn test_incomplete_fields_penalized_less_than_unavailable() {
        let mut metadata = full_metadata();
        metadata.content_body = Some(Arc::from(""));
        let result = ScoringEngine::default()
            .score(&descriptor(), &metadata)
            .unwrap();
        assert_eq!(result.breakdown.impact(Dimension::OverallCompleteness), -5);

        let mut metadata = full_metadata();
        metadata.content_body = None;
        let result = ScoringEngine::default()
            .score(&descriptor(), &metadata)
            .unwrap();
        assert_eq!(result.breakdown.impact(Dimension::OverallCompleteness), -15);
    }

    #[test]
    fn test_score_is_deterministic() {
        let engine = ScoringEngine::new(KeywordPenalty::new("slop", -50));
        let first = engine.score(&descriptor(), &full_metadata()).unwrap();
        for _ in 0..5 {
            assert_eq!(engine.score(&descriptor(), &full_metadata()).unwrap(), first);
        }
    }

    #[test]
    fn test_composite_always_within_bounds() {
        let engine = ScoringEngine::new(KeywordPenalty::new("orbit", -50));
        let descriptors = [
            descriptor(),
            descriptor().with_preview_image(false),
            ItemDescriptor::default(),
            descriptor().with_observed_counts("2m", "9m"),
        ];
        let metadata = [full_metadata(), ResolvedMetadata::unavailable(), {
            let mut m = full_metadata();
            m.descendant_count = Some(u64::MAX);
            m.revision_count = Some(u64::MAX);
            m
        }];

        for d in &descriptors {
            for m in &metadata {
                let result = engine.score(d, m).unwrap();
                assert!(result.composite_score <= 100);
            }
        }
    }

    #[test]
    fn test_invalid_engagement_rejected() {
        let engine = ScoringEngine::default();
        for bad in [f64::NAN, f64::INFINITY, -1.0] {
            let mut metadata = full_metadata();
            metadata.avg_engagement_secs = Some(bad);
            assert!(matches!(
                engine.score(&descriptor(), &metadata),
                Err(ScoringError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_summary_thresholds() {
        assert!(summary_for(80).contains("Looks good!"));
        assert!(summary_for(79).contains("Worth a look."));
        assert!(summary_for(60).contains("Worth a look."));
        assert!(summary_for(59).contains("average quality"));
        assert!(summary_for(50).contains("average quality"));
        assert!(summary_for(49).contains("very low quality"));
    }

    #[test]
    fn test_failed_sentinel() {
        let failed = AnalysisResult::failed();
        assert_eq!(failed.composite_score, 0);
        assert!(failed.breakdown.is_empty());
        assert_eq!(failed.summary, "Analysis failed.");
        assert!(failed.is_failed());
    }

    #[test]
    fn test_breakdown_serializes_with_camel_case_keys() {
        let result = ScoringEngine::default()
            .score(&descriptor(), &full_metadata())
            .unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["composite_score"], 100);
        assert_eq!(value["breakdown"]["contentQuality"]["impact"], 10);
        assert!(value["breakdown"]["influenceAndOriginality"]["reason"].is_string());
    }
}
