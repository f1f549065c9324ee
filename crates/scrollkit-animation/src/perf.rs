//! Frame-rate sampling for performance-adaptive consumers.

use std::cell::RefCell;
use std::rc::Rc;

use scrollkit_core::{derive, Derived, FrameCallbackRegistration, MutableState, RuntimeHandle, State};

/// Below this rate consumers are advised to simplify animation work.
pub const LOW_FPS_THRESHOLD: u32 = 30;

const WINDOW_NANOS: u64 = 1_000_000_000;

/// Running frames-per-second estimate.
///
/// Counts frames with a self-rescheduling frame callback and publishes the
/// count once per ~1 s window; the published value is replaced wholesale,
/// never accumulated. `should_reduce_animations` is the bare
/// `fps < 30` derivation with no hysteresis — a consumer sitting right at
/// the threshold will see the flag flip as the rate wobbles. The monitor
/// only reports; reacting to the signal is the consumer's job.
pub struct FpsMonitor {
    inner: Rc<RefCell<FpsInner>>,
    should_reduce: Derived<bool>,
}

struct FpsInner {
    runtime: RuntimeHandle,
    fps: MutableState<u32>,
    frame_count: u32,
    window_start_nanos: Option<u64>,
    registration: Option<FrameCallbackRegistration>,
}

impl FpsMonitor {
    pub fn new(runtime: RuntimeHandle) -> Self {
        let fps = MutableState::new(60);
        let should_reduce = derive(&fps.as_state(), |fps| *fps < LOW_FPS_THRESHOLD);
        let inner = Rc::new(RefCell::new(FpsInner {
            runtime,
            fps,
            frame_count: 0,
            window_start_nanos: None,
            registration: None,
        }));
        Self::schedule_frame(&inner);
        Self {
            inner,
            should_reduce,
        }
    }

    /// Latest published frames-per-second value.
    pub fn fps(&self) -> State<u32> {
        self.inner.borrow().fps.as_state()
    }

    /// Reactive `fps < 30` signal; advisory only.
    pub fn should_reduce_animations(&self) -> State<bool> {
        self.should_reduce.state()
    }

    fn schedule_frame(this: &Rc<RefCell<FpsInner>>) {
        let registration = {
            let inner = this.borrow();
            if inner.registration.is_some() {
                return;
            }
            let weak = Rc::downgrade(this);
            inner.runtime.frame_clock().with_frame_nanos(move |nanos| {
                if let Some(strong) = weak.upgrade() {
                    FpsMonitor::on_frame(&strong, nanos);
                }
            })
        };
        this.borrow_mut().registration = Some(registration);
    }

    fn on_frame(this: &Rc<RefCell<FpsInner>>, frame_time_nanos: u64) {
        {
            let mut inner = this.borrow_mut();
            inner.registration = None;
            let window_start = *inner.window_start_nanos.get_or_insert(frame_time_nanos);
            if frame_time_nanos.saturating_sub(window_start) >= WINDOW_NANOS {
                let fps = inner.frame_count;
                inner.frame_count = 0;
                inner.window_start_nanos = Some(frame_time_nanos);
                inner.fps.set(fps);
            }
            inner.frame_count += 1;
        }
        Self::schedule_frame(this);
    }
}

impl Drop for FpsMonitor {
    fn drop(&mut self) {
        // Dropping the registration cancels the pending frame callback, so
        // no sample is published after teardown.
        self.inner.borrow_mut().registration = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollkit_testing::ScrollTestRule;

    fn drive_window(rule: &ScrollTestRule, frames: u64, window_start: u64) {
        let step = WINDOW_NANOS / frames;
        for frame in 0..frames {
            rule.advance_frame(window_start + frame * step);
        }
    }

    #[test]
    fn publishes_frame_count_per_window() {
        let rule = ScrollTestRule::new();
        let monitor = FpsMonitor::new(rule.runtime_handle());

        drive_window(&rule, 45, 0);
        rule.advance_frame(WINDOW_NANOS); // window boundary publishes
        assert_eq!(monitor.fps().value(), 45);
        assert!(!monitor.should_reduce_animations().value());
    }

    #[test]
    fn low_frame_rate_raises_reduction_signal() {
        let rule = ScrollTestRule::new();
        let monitor = FpsMonitor::new(rule.runtime_handle());

        drive_window(&rule, 20, 0);
        rule.advance_frame(WINDOW_NANOS);
        assert_eq!(monitor.fps().value(), 20);
        assert!(monitor.should_reduce_animations().value());
    }

    #[test]
    fn signal_recovers_without_hysteresis() {
        let rule = ScrollTestRule::new();
        let monitor = FpsMonitor::new(rule.runtime_handle());

        drive_window(&rule, 20, 0);
        rule.advance_frame(WINDOW_NANOS);
        assert!(monitor.should_reduce_animations().value());

        // Second window runs at full rate again.
        drive_window(&rule, 59, WINDOW_NANOS + 1);
        rule.advance_frame(2 * WINDOW_NANOS + 1);
        assert_eq!(monitor.fps().value(), 60);
        assert!(!monitor.should_reduce_animations().value());
    }

    #[test]
    fn no_samples_after_drop() {
        let rule = ScrollTestRule::new();
        let monitor = FpsMonitor::new(rule.runtime_handle());
        let fps = monitor.fps();

        drive_window(&rule, 10, 0);
        drop(monitor);
        rule.advance_frame(WINDOW_NANOS);
        rule.advance_frame(2 * WINDOW_NANOS);
        assert_eq!(fps.value(), 60, "initial value must survive untouched");
    }
}
