//! Reactive mirror of the platform "prefers reduced motion" setting.

use scrollkit_core::{MotionListenerId, MutableState, RuntimeHandle, State};

/// Observable reduced-motion preference.
///
/// Seeds itself from the runtime's current value and stays live: a user
/// flipping the OS setting while the page is open is observed without a
/// reload. Consumers that honor the preference typically skip registering
/// scroll animations entirely while it is set.
pub struct ReducedMotion {
    runtime: RuntimeHandle,
    state: MutableState<bool>,
    listener: Option<MotionListenerId>,
}

impl ReducedMotion {
    pub fn new(runtime: RuntimeHandle) -> Self {
        let state = MutableState::new(runtime.reduced_motion());
        let listener = {
            let state = state.clone();
            runtime.add_motion_listener(move |reduced| state.set(reduced))
        };
        Self {
            runtime,
            state,
            listener,
        }
    }

    /// Current preference value.
    pub fn prefers_reduced_motion(&self) -> bool {
        self.state.value()
    }

    /// Observable view for consumers that re-render on changes.
    pub fn state(&self) -> State<bool> {
        self.state.as_state()
    }
}

impl Drop for ReducedMotion {
    fn drop(&mut self) {
        if let Some(id) = self.listener.take() {
            self.runtime.remove_motion_listener(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrollkit_testing::ScrollTestRule;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn seeds_from_current_platform_value() {
        let rule = ScrollTestRule::new();
        rule.runtime_handle().set_reduced_motion(true);
        let motion = ReducedMotion::new(rule.runtime_handle());
        assert!(motion.prefers_reduced_motion());
    }

    #[test]
    fn observes_live_setting_changes() {
        let rule = ScrollTestRule::new();
        let handle = rule.runtime_handle();
        let motion = ReducedMotion::new(handle.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_cb = Rc::clone(&seen);
        let _subscription = motion.state().subscribe(move |value| seen_cb.borrow_mut().push(*value));

        handle.set_reduced_motion(true);
        handle.set_reduced_motion(false);
        assert_eq!(&*seen.borrow(), &[true, false]);
        assert!(!motion.prefers_reduced_motion());
    }

    #[test]
    fn dropped_signal_stops_tracking() {
        let rule = ScrollTestRule::new();
        let handle = rule.runtime_handle();
        let motion = ReducedMotion::new(handle.clone());
        let state = motion.state();
        drop(motion);

        handle.set_reduced_motion(true);
        assert!(!state.value(), "listener must be removed on drop");
    }
}
