//! Decision policy
//!
//! Maps a composite score and the user's display toggles to what the
//! renderer should do with the item. Precedence is fixed:
//! hidden, then blurred, then highlighted, then normal.

use serde::{Deserialize, Serialize};

/// Score below which an item is hidden (when hiding is enabled)
pub const HIDE_BELOW: u8 = 30;

/// Score below which an item is blurred (when blurring is enabled)
pub const BLUR_BELOW: u8 = 50;

pub const DEFAULT_HIGHLIGHT_THRESHOLD: u8 = 75;

/// What the renderer should do with an analysed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Hidden,
    Blurred,
    Highlighted,
    Normal,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Hidden => "hidden",
            Decision::Blurred => "blurred",
            Decision::Highlighted => "highlighted",
            Decision::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayToggles {
    pub hide_enabled: bool,
    pub blur_enabled: bool,
    pub highlight_enabled: bool,
}

/// Toggles plus the highlight threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    pub toggles: DisplayToggles,
    pub highlight_threshold: u8,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            toggles: DisplayToggles::default(),
            highlight_threshold: DEFAULT_HIGHLIGHT_THRESHOLD,
        }
    }
}

impl DisplaySettings {
    pub fn decide(&self, score: u8) -> Decision {
        decide(score, self.toggles, self.highlight_threshold)
    }

    pub fn decide_with_override(&self, score: u8, force_view: bool) -> Decision {
        decide_with_override(score, self.toggles, self.highlight_threshold, force_view)
    }
}

/// Colour band of a score, independent of the display toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    Good,
    Neutral,
    Poor,
}

impl ScoreTier {
    pub fn of(score: u8) -> Self {
        if score > 70 {
            ScoreTier::Good
        } else if score < 50 {
            ScoreTier::Poor
        } else {
            ScoreTier::Neutral
        }
    }
}

pub fn decide(score: u8, toggles: DisplayToggles, highlight_threshold: u8) -> Decision {
    if toggles.hide_enabled && score < HIDE_BELOW {
        Decision::Hidden
    } else if toggles.blur_enabled && score < BLUR_BELOW {
        Decision::Blurred
    } else if toggles.highlight_enabled && score >= highlight_threshold {
        Decision::Highlighted
    } else {
        Decision::Normal
    }
}

/// [`decide`], with a user's force-view override suppressing hide and blur
pub fn decide_with_override(
    score: u8,
    toggles: DisplayToggles,
    highlight_threshold: u8,
    force_view: bool,
) -> Decision {
    if !force_view {
        return decide(score, toggles, highlight_threshold);
    }

    let visible = DisplayToggles {
        hide_enabled: false,
        blur_enabled: false,
        ..toggles
    };
    decide(score, visible, highlight_threshold)
}
