use crate::runtime::RuntimeHandle;
use crate::FrameCallbackId;

/// Hands out one-shot frame callbacks bound to a runtime.
///
/// Callbacks receive the frame timestamp in nanoseconds. Continuous
/// consumers (the FPS monitor, scrub smoothing) re-register from within
/// their own callback.
#[derive(Clone)]
pub struct FrameClock {
    runtime: RuntimeHandle,
}

impl FrameClock {
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self { runtime }
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.clone()
    }

    pub fn with_frame_nanos(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> FrameCallbackRegistration {
        let mut callback_opt = Some(callback);
        let runtime = self.runtime.clone();
        match runtime.register_frame_callback(move |time| {
            if let Some(callback) = callback_opt.take() {
                callback(time);
            }
        }) {
            Some(id) => FrameCallbackRegistration::new(runtime, id),
            None => FrameCallbackRegistration::inactive(runtime),
        }
    }

    pub fn with_frame_millis(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> FrameCallbackRegistration {
        self.with_frame_nanos(move |nanos| {
            let millis = nanos / 1_000_000;
            callback(millis);
        })
    }
}

/// RAII guard for a pending frame callback.
///
/// Dropping the registration cancels the callback; this is the mechanism
/// that guarantees nothing fires after its owner unmounts.
pub struct FrameCallbackRegistration {
    runtime: RuntimeHandle,
    id: Option<FrameCallbackId>,
}

impl FrameCallbackRegistration {
    fn new(runtime: RuntimeHandle, id: FrameCallbackId) -> Self {
        Self {
            runtime,
            id: Some(id),
        }
    }

    fn inactive(runtime: RuntimeHandle) -> Self {
        Self { runtime, id: None }
    }

    pub fn cancel(mut self) {
        if let Some(id) = self.id.take() {
            self.runtime.cancel_frame_callback(id);
        }
    }
}

impl Drop for FrameCallbackRegistration {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.runtime.cancel_frame_callback(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{DefaultScheduler, Runtime};
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    #[test]
    fn with_frame_millis_converts_from_nanos() {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let millis = Rc::new(Cell::new(0u64));

        let millis_cb = Rc::clone(&millis);
        let _registration = runtime
            .frame_clock()
            .with_frame_millis(move |value| millis_cb.set(value));
        runtime.handle().drain_frame_callbacks(5_000_000);
        assert_eq!(millis.get(), 5);
    }

    #[test]
    fn dropping_registration_cancels_pending_callback() {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let fired = Rc::new(Cell::new(false));

        let fired_cb = Rc::clone(&fired);
        let registration = runtime
            .frame_clock()
            .with_frame_nanos(move |_| fired_cb.set(true));
        drop(registration);
        runtime.handle().drain_frame_callbacks(0);
        assert!(!fired.get());
    }
}
