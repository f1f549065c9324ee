//! Semantic trigger positions and progress math.
//!
//! A trigger position names the moment an element edge reaches a fraction
//! of the viewport height, in the `"top 80%"` / `"bottom 20%"` form
//! familiar from scroll-animation tooling. Unrecognized input is a parse
//! error, never a silent default: a bad trigger string is a caller bug
//! that should surface immediately.

use std::str::FromStr;

use scrollkit_core::ElementBounds;

use crate::easing::Easing;

/// Element edge referenced by a trigger position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEdge {
    Top,
    Center,
    Bottom,
}

impl TriggerEdge {
    fn document_position(self, bounds: &ElementBounds) -> f32 {
        match self {
            TriggerEdge::Top => bounds.top,
            TriggerEdge::Center => bounds.center(),
            TriggerEdge::Bottom => bounds.bottom(),
        }
    }
}

/// "Edge of the element reaches `viewport_fraction` of the viewport".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerPosition {
    pub edge: TriggerEdge,
    /// Fraction of the viewport height, `0.0` = viewport top.
    pub viewport_fraction: f32,
}

impl TriggerPosition {
    pub fn new(edge: TriggerEdge, viewport_fraction: f32) -> Self {
        Self {
            edge,
            viewport_fraction,
        }
    }

    /// Scroll offset at which this position's condition is met.
    pub fn scroll_offset(&self, bounds: &ElementBounds, viewport_height: f32) -> f32 {
        self.edge.document_position(bounds) - self.viewport_fraction * viewport_height
    }
}

impl FromStr for TriggerPosition {
    type Err = TriggerParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split_whitespace();
        let edge = match parts.next() {
            None => return Err(TriggerParseError::Empty),
            Some("top") => TriggerEdge::Top,
            Some("center") => TriggerEdge::Center,
            Some("bottom") => TriggerEdge::Bottom,
            Some(other) => return Err(TriggerParseError::UnknownEdge(other.to_string())),
        };
        let offset = match parts.next() {
            None => return Err(TriggerParseError::MissingOffset),
            Some(token) => parse_fraction(token)?,
        };
        if parts.next().is_some() {
            return Err(TriggerParseError::TrailingInput(input.to_string()));
        }
        Ok(Self::new(edge, offset))
    }
}

/// Accepts `"80%"` or a bare fraction like `"0.8"`.
fn parse_fraction(token: &str) -> Result<f32, TriggerParseError> {
    let (digits, scale) = match token.strip_suffix('%') {
        Some(digits) => (digits, 0.01),
        None => (token, 1.0),
    };
    digits
        .parse::<f32>()
        .map(|value| value * scale)
        .map_err(|_| TriggerParseError::InvalidOffset(token.to_string()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerParseError {
    Empty,
    UnknownEdge(String),
    MissingOffset,
    InvalidOffset(String),
    TrailingInput(String),
}

impl std::fmt::Display for TriggerParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerParseError::Empty => write!(f, "empty trigger position"),
            TriggerParseError::UnknownEdge(edge) => {
                write!(f, "unknown trigger edge {edge:?}; expected top, center or bottom")
            }
            TriggerParseError::MissingOffset => write!(f, "trigger position missing offset"),
            TriggerParseError::InvalidOffset(offset) => {
                write!(f, "invalid trigger offset {offset:?}")
            }
            TriggerParseError::TrailingInput(input) => {
                write!(f, "trailing input in trigger position {input:?}")
            }
        }
    }
}

impl std::error::Error for TriggerParseError {}

/// How progress is delivered while the element is in the active zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scrub {
    /// Report raw progress on every scroll event.
    Direct,
    /// Ease reported progress toward the raw value over this many seconds,
    /// driven by frame callbacks.
    Smoothed(f32),
}

impl Default for Scrub {
    fn default() -> Self {
        Scrub::Direct
    }
}

/// Configuration for one tracked element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerConfig {
    /// Position at which progress is 0.
    pub start: TriggerPosition,
    /// Position at which progress is 1.
    pub end: TriggerPosition,
    pub scrub: Scrub,
    /// Fire `callback(element, 1.0)` on the first activation and never
    /// observe the element again.
    pub once: bool,
    /// Intersection-ratio activation threshold, clamped to `[0, 1]`.
    pub threshold: f32,
    /// Shaping applied to progress before the callback sees it.
    pub ease: Easing,
}

impl TriggerConfig {
    /// Parse semantic start/end positions, failing fast on bad input.
    pub fn between(start: &str, end: &str) -> Result<Self, TriggerParseError> {
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
            ..Self::default()
        })
    }

    pub fn with_scrub(mut self, scrub: Scrub) -> Self {
        self.scrub = scrub;
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_ease(mut self, ease: Easing) -> Self {
        self.ease = ease;
        self
    }

    /// Raw progress for the given geometry, clamped to `[0, 1]`.
    ///
    /// A degenerate span (end not past start) pins progress to 0 or 1
    /// depending on which side of the start the scroll sits; a visual
    /// misconfiguration, not a failure.
    pub fn progress(&self, bounds: &ElementBounds, viewport_height: f32, scroll_y: f32) -> f32 {
        let start_y = self.start.scroll_offset(bounds, viewport_height);
        let end_y = self.end.scroll_offset(bounds, viewport_height);
        let span = end_y - start_y;
        if span <= f32::EPSILON {
            return if scroll_y < start_y { 0.0 } else { 1.0 };
        }
        ((scroll_y - start_y) / span).clamp(0.0, 1.0)
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            start: TriggerPosition::new(TriggerEdge::Top, 0.8),
            end: TriggerPosition::new(TriggerEdge::Bottom, 0.2),
            scrub: Scrub::default(),
            once: false,
            threshold: 0.1,
            ease: Easing::Linear,
        }
    }
}
