//! Platform abstraction traits for ScrollKit runtime services.
//!
//! These traits let ScrollKit delegate frame scheduling and clock
//! responsibilities to the host, so the same runtime drives a real event
//! loop and a headless test harness alike. An environment that cannot
//! provide them is a fatal precondition, not a recoverable error.

/// Schedules work for the ScrollKit runtime.
///
/// Implementations are responsible for triggering frame processing on
/// behalf of the runtime. They must be safe to use from multiple threads.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}

/// Provides timing information for the runtime.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of milliseconds elapsed since `since`.
    fn elapsed_millis(&self, since: Self::Instant) -> u64;
}
