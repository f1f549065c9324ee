//! Scroll-progress scheduling for ScrollKit.
//!
//! The scheduler attaches progress tracking to an element only while the
//! element is near the viewport, reports a normalized `[0, 1]` progress to
//! a caller-supplied callback on every scroll update, and tears everything
//! down the moment the element leaves view or unmounts. What the callback
//! does with the progress is entirely the caller's business.

pub mod easing;
pub mod motion;
pub mod perf;
pub mod stagger;
pub mod tracker;
pub mod trigger;

pub use easing::{Easing, Lerp};
pub use motion::ReducedMotion;
pub use perf::FpsMonitor;
pub use stagger::staggered_progress;
pub use tracker::{ScrollTracker, TrackedElement};
pub use trigger::{Scrub, TriggerConfig, TriggerEdge, TriggerParseError, TriggerPosition};

pub mod prelude {
    pub use crate::easing::Easing;
    pub use crate::motion::ReducedMotion;
    pub use crate::perf::FpsMonitor;
    pub use crate::stagger::staggered_progress;
    pub use crate::tracker::{ScrollTracker, TrackedElement};
    pub use crate::trigger::{Scrub, TriggerConfig, TriggerPosition};
}
