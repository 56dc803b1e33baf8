//! Helpers for building [`ItemDescriptor`]s from rendered card text
//!
//! Markup extraction itself lives outside this crate. These are the pure
//! pieces of it: abbreviated counter parsing and item-link parsing.

use crate::types::ItemDescriptor;
use once_cell::sync::Lazy;
use regex::Regex;

static ITEM_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/@([a-zA-Z0-9_]{3,32})/([a-zA-Z0-9-]+)$").expect("item link pattern is valid")
});

static ABBREVIATED_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([km])?").expect("count pattern is valid")
});

/// Parse a rendered counter such as `"42"`, `"1.2k"` or `"3M"`
///
/// Case-insensitive; leading/trailing whitespace ignored. Anything that does
/// not start with a number parses as 0.
pub fn parse_abbreviated_count(text: &str) -> u64 {
    let clean = text.trim().to_lowercase();
    let Some(captures) = ABBREVIATED_COUNT.captures(&clean) else {
        return 0;
    };

    let base: f64 = captures[1].parse().unwrap_or(0.0);
    let multiplier = match captures.get(2).map(|m| m.as_str()) {
        Some("k") => 1_000.0,
        Some("m") => 1_000_000.0,
        _ => 1.0,
    };

    (base * multiplier).round() as u64
}

/// Split an item link of the form `/@owner/item` into its two slugs
pub fn parse_item_link(link: &str) -> Option<(String, String)> {
    let captures = ITEM_LINK.captures(link)?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

impl ItemDescriptor {
    /// Descriptor for a card link; slugs are filled in when the link has the
    /// `/@owner/item` shape
    pub fn from_link(link: impl Into<String>) -> Self {
        let link = link.into();
        let (owner_slug, item_slug) = match parse_item_link(&link) {
            Some((owner, item)) => (Some(owner), Some(item)),
            None => (None, None),
        };

        Self {
            owner_slug,
            item_slug,
            link,
            ..Default::default()
        }
    }

    pub fn with_raw_id(mut self, raw_id: impl Into<String>) -> Self {
        self.raw_id = Some(raw_id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator_name = Some(creator.into());
        self
    }

    pub fn with_preview_image(mut self, has_preview_image: bool) -> Self {
        self.has_preview_image = has_preview_image;
        self
    }

    /// Counters as rendered on the card, e.g. `("1.2k", "30k")`
    pub fn with_observed_counts(mut self, likes: &str, views: &str) -> Self {
        self.observed_likes = parse_abbreviated_count(likes);
        self.observed_views = parse_abbreviated_count(views);
        self
    }

    /// Fill in slugs from the link if the supplier left them out
    pub fn normalized(mut self) -> Self {
        if self.slugs().is_none() {
            if let Some((owner, item)) = parse_item_link(&self.link) {
                self.owner_slug = Some(owner);
                self.item_slug = Some(item);
            }
        }
        self
    }
}
