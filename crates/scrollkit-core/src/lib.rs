#![doc = r"Core runtime pieces for ScrollKit.

ScrollKit coordinates scroll-driven UI state without knowing anything about
rendering: consumers register callbacks, the host platform feeds events in,
and the runtime guarantees that nothing fires after its owner tears down."]

pub mod collections;
pub mod frame_clock;
pub mod platform;
pub mod runtime;
pub mod state;
pub mod viewport;

pub use frame_clock::{FrameCallbackRegistration, FrameClock};
pub use platform::{Clock, RuntimeScheduler};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use state::{derive, Derived, MutableState, State, Subscription};
pub use viewport::{ElementBounds, ElementId, Viewport};

/// Identifier handed out for a registered frame callback.
pub type FrameCallbackId = u64;
/// Identifier handed out for a registered scroll listener.
pub type ScrollListenerId = u64;
/// Identifier handed out for an intersection observation.
pub type ObservationId = u64;
/// Identifier handed out for a motion-preference listener.
pub type MotionListenerId = u64;
