use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::collections::map::HashMap;
use crate::frame_clock::FrameClock;
use crate::platform::RuntimeScheduler;
use crate::viewport::ElementId;
use crate::{FrameCallbackId, MotionListenerId, ObservationId, ScrollListenerId};

struct ObservationEntry {
    element: ElementId,
    threshold: f32,
    last_intersecting: Cell<bool>,
    handler: Rc<RefCell<dyn FnMut(bool)>>,
}

struct ScrollListenerEntry {
    id: ScrollListenerId,
    callback: Rc<RefCell<dyn FnMut(f32)>>,
}

struct MotionListenerEntry {
    id: MotionListenerId,
    callback: Rc<RefCell<dyn FnMut(bool)>>,
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    frame_callbacks: RefCell<VecDeque<FrameCallbackEntry>>,
    next_frame_callback_id: Cell<FrameCallbackId>,
    scroll_listeners: RefCell<Vec<ScrollListenerEntry>>,
    next_scroll_listener_id: Cell<ScrollListenerId>,
    observations: RefCell<HashMap<ObservationId, ObservationEntry>>,
    next_observation_id: Cell<ObservationId>,
    reduced_motion: Cell<bool>,
    motion_listeners: RefCell<Vec<MotionListenerEntry>>,
    next_motion_listener_id: Cell<MotionListenerId>,
    pending_tasks: RefCell<VecDeque<Box<dyn FnOnce() + 'static>>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            needs_frame: Cell::new(false),
            frame_callbacks: RefCell::new(VecDeque::new()),
            next_frame_callback_id: Cell::new(1),
            scroll_listeners: RefCell::new(Vec::new()),
            next_scroll_listener_id: Cell::new(1),
            observations: RefCell::new(HashMap::new()),
            next_observation_id: Cell::new(1),
            reduced_motion: Cell::new(false),
            motion_listeners: RefCell::new(Vec::new()),
            next_motion_listener_id: Cell::new(1),
            pending_tasks: RefCell::new(VecDeque::new()),
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn enqueue_task(&self, task: Box<dyn FnOnce() + 'static>) {
        self.pending_tasks.borrow_mut().push_back(task);
        self.schedule();
    }

    fn drain_tasks(&self) {
        let mut tasks: Vec<Box<dyn FnOnce() + 'static>> = {
            let mut pending = self.pending_tasks.borrow_mut();
            pending.drain(..).collect()
        };
        for task in tasks.drain(..) {
            task();
        }
    }

    fn has_tasks(&self) -> bool {
        !self.pending_tasks.borrow().is_empty()
    }

    fn register_frame_callback(&self, callback: Box<dyn FnOnce(u64) + 'static>) -> FrameCallbackId {
        let id = self.next_frame_callback_id.get();
        self.next_frame_callback_id.set(id + 1);
        self.frame_callbacks
            .borrow_mut()
            .push_back(FrameCallbackEntry {
                id,
                callback: Some(callback),
            });
        self.schedule();
        id
    }

    fn cancel_frame_callback(&self, id: FrameCallbackId) {
        let mut callbacks = self.frame_callbacks.borrow_mut();
        if let Some(index) = callbacks.iter().position(|entry| entry.id == id) {
            callbacks.remove(index);
        }
        if callbacks.is_empty() {
            self.needs_frame.set(false);
        }
    }

    fn drain_frame_callbacks(&self, frame_time_nanos: u64) {
        let mut callbacks = self.frame_callbacks.borrow_mut();
        let mut pending: Vec<Box<dyn FnOnce(u64) + 'static>> = Vec::with_capacity(callbacks.len());
        while let Some(mut entry) = callbacks.pop_front() {
            if let Some(callback) = entry.callback.take() {
                pending.push(callback);
            }
        }
        drop(callbacks);
        for callback in pending {
            callback(frame_time_nanos);
        }
        if self.frame_callbacks.borrow().is_empty() {
            self.needs_frame.set(false);
        }
    }

    fn has_frame_callbacks(&self) -> bool {
        !self.frame_callbacks.borrow().is_empty()
    }

    fn add_scroll_listener(&self, callback: Box<dyn FnMut(f32) + 'static>) -> ScrollListenerId {
        let id = self.next_scroll_listener_id.get();
        self.next_scroll_listener_id.set(id + 1);
        self.scroll_listeners.borrow_mut().push(ScrollListenerEntry {
            id,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    fn remove_scroll_listener(&self, id: ScrollListenerId) {
        self.scroll_listeners
            .borrow_mut()
            .retain(|entry| entry.id != id);
    }

    fn scroll_listener_count(&self) -> usize {
        self.scroll_listeners.borrow().len()
    }

    fn dispatch_scroll(&self, scroll_y: f32) {
        // Snapshot the registry so listeners may add or remove entries from
        // inside their callbacks; liveness is re-checked per listener so a
        // removal during dispatch suppresses the already-queued event.
        let snapshot: Vec<(ScrollListenerId, Rc<RefCell<dyn FnMut(f32)>>)> = self
            .scroll_listeners
            .borrow()
            .iter()
            .map(|entry| (entry.id, Rc::clone(&entry.callback)))
            .collect();
        for (id, callback) in snapshot {
            let still_registered = self
                .scroll_listeners
                .borrow()
                .iter()
                .any(|entry| entry.id == id);
            if still_registered {
                (callback.borrow_mut())(scroll_y);
            }
        }
    }

    fn observe(
        &self,
        element: ElementId,
        threshold: f32,
        handler: Box<dyn FnMut(bool) + 'static>,
    ) -> ObservationId {
        let id = self.next_observation_id.get();
        self.next_observation_id.set(id + 1);
        self.observations.borrow_mut().insert(
            id,
            ObservationEntry {
                element,
                threshold: threshold.clamp(0.0, 1.0),
                last_intersecting: Cell::new(false),
                handler: Rc::new(RefCell::new(handler)),
            },
        );
        id
    }

    fn unobserve(&self, id: ObservationId) {
        self.observations.borrow_mut().remove(&id);
    }

    fn observed_elements(&self) -> Vec<ElementId> {
        let mut elements: Vec<ElementId> = self
            .observations
            .borrow()
            .values()
            .map(|entry| entry.element)
            .collect();
        elements.sort();
        elements.dedup();
        elements
    }

    fn dispatch_intersection(&self, element: ElementId, visible_ratio: f32) {
        let snapshot: Vec<(ObservationId, Rc<RefCell<dyn FnMut(bool)>>, bool)> = self
            .observations
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.element == element)
            .map(|(id, entry)| {
                let intersecting = visible_ratio >= entry.threshold && visible_ratio > 0.0;
                (*id, Rc::clone(&entry.handler), intersecting)
            })
            .collect();
        for (id, handler, intersecting) in snapshot {
            let transition = {
                let observations = self.observations.borrow();
                match observations.get(&id) {
                    Some(entry) if entry.last_intersecting.get() != intersecting => {
                        entry.last_intersecting.set(intersecting);
                        true
                    }
                    _ => false,
                }
            };
            if transition {
                (handler.borrow_mut())(intersecting);
            }
        }
    }

    fn set_reduced_motion(&self, reduced: bool) {
        if self.reduced_motion.replace(reduced) == reduced {
            return;
        }
        let snapshot: Vec<(MotionListenerId, Rc<RefCell<dyn FnMut(bool)>>)> = self
            .motion_listeners
            .borrow()
            .iter()
            .map(|entry| (entry.id, Rc::clone(&entry.callback)))
            .collect();
        for (id, callback) in snapshot {
            let still_registered = self
                .motion_listeners
                .borrow()
                .iter()
                .any(|entry| entry.id == id);
            if still_registered {
                (callback.borrow_mut())(reduced);
            }
        }
    }

    fn add_motion_listener(&self, callback: Box<dyn FnMut(bool) + 'static>) -> MotionListenerId {
        let id = self.next_motion_listener_id.get();
        self.next_motion_listener_id.set(id + 1);
        self.motion_listeners.borrow_mut().push(MotionListenerEntry {
            id,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    fn remove_motion_listener(&self, id: MotionListenerId) {
        self.motion_listeners
            .borrow_mut()
            .retain(|entry| entry.id != id);
    }
}

/// Owner of all per-page coordination state.
///
/// Single-threaded by design: every mutation happens on the UI thread, so
/// interior mutability is `RefCell`/`Cell` and sharing is `Rc`. The host
/// keeps the `Runtime` alive for the page's lifetime and hands
/// [`RuntimeHandle`]s to everything else.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn set_needs_frame(&self, value: bool) {
        self.inner.needs_frame.set(value);
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.handle())
    }
}

/// No-op scheduler for hosts that poll the runtime themselves.
#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

/// Weak handle to a [`Runtime`].
///
/// Every operation degrades to a no-op once the runtime is gone; this is
/// what lets teardown be idempotent without reference cycles.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    pub fn spawn_task(&self, task: Box<dyn FnOnce() + 'static>) {
        if let Some(inner) = self.0.upgrade() {
            inner.enqueue_task(task);
        } else {
            task();
        }
    }

    pub fn drain_tasks(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.drain_tasks();
        }
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_tasks())
            .unwrap_or(false)
    }

    pub fn register_frame_callback(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> Option<FrameCallbackId> {
        self.0
            .upgrade()
            .map(|inner| inner.register_frame_callback(Box::new(callback)))
    }

    pub fn cancel_frame_callback(&self, id: FrameCallbackId) {
        if let Some(inner) = self.0.upgrade() {
            inner.cancel_frame_callback(id);
        }
    }

    pub fn drain_frame_callbacks(&self, frame_time_nanos: u64) {
        if let Some(inner) = self.0.upgrade() {
            inner.drain_frame_callbacks(frame_time_nanos);
        }
    }

    pub fn has_frame_callbacks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_frame_callbacks())
            .unwrap_or(false)
    }

    pub fn frame_clock(&self) -> FrameClock {
        FrameClock::new(self.clone())
    }

    pub fn add_scroll_listener(&self, callback: impl FnMut(f32) + 'static) -> Option<ScrollListenerId> {
        self.0
            .upgrade()
            .map(|inner| inner.add_scroll_listener(Box::new(callback)))
    }

    pub fn remove_scroll_listener(&self, id: ScrollListenerId) {
        if let Some(inner) = self.0.upgrade() {
            inner.remove_scroll_listener(id);
        }
    }

    /// Number of live scroll listeners. Primarily a harness affordance for
    /// asserting the attachment invariant.
    pub fn scroll_listener_count(&self) -> usize {
        self.0
            .upgrade()
            .map(|inner| inner.scroll_listener_count())
            .unwrap_or(0)
    }

    /// Deliver a scroll event to every live listener, in registration order.
    pub fn dispatch_scroll(&self, scroll_y: f32) {
        if let Some(inner) = self.0.upgrade() {
            inner.dispatch_scroll(scroll_y);
        }
    }

    /// Start watching `element`; the handler fires on transitions across
    /// `visible_ratio >= threshold`, never on repeats of the same state.
    pub fn observe(
        &self,
        element: ElementId,
        threshold: f32,
        handler: impl FnMut(bool) + 'static,
    ) -> Option<ObservationId> {
        self.0
            .upgrade()
            .map(|inner| inner.observe(element, threshold, Box::new(handler)))
    }

    pub fn unobserve(&self, id: ObservationId) {
        if let Some(inner) = self.0.upgrade() {
            inner.unobserve(id);
        }
    }

    /// Elements with at least one live observation. The platform observer
    /// (or a test driver standing in for it) reports ratios for these.
    pub fn observed_elements(&self) -> Vec<ElementId> {
        self.0
            .upgrade()
            .map(|inner| inner.observed_elements())
            .unwrap_or_default()
    }

    /// Report a visibility ratio for `element` as the platform observer
    /// would.
    pub fn dispatch_intersection(&self, element: ElementId, visible_ratio: f32) {
        if let Some(inner) = self.0.upgrade() {
            inner.dispatch_intersection(element, visible_ratio);
        }
    }

    /// Current platform-level "prefers reduced motion" value.
    pub fn reduced_motion(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.reduced_motion.get())
            .unwrap_or(false)
    }

    /// Feed a live change of the platform reduced-motion setting.
    pub fn set_reduced_motion(&self, reduced: bool) {
        if let Some(inner) = self.0.upgrade() {
            inner.set_reduced_motion(reduced);
        }
    }

    pub fn add_motion_listener(&self, callback: impl FnMut(bool) + 'static) -> Option<MotionListenerId> {
        self.0
            .upgrade()
            .map(|inner| inner.add_motion_listener(Box::new(callback)))
    }

    pub fn remove_motion_listener(&self, id: MotionListenerId) {
        if let Some(inner) = self.0.upgrade() {
            inner.remove_motion_listener(id);
        }
    }
}

struct FrameCallbackEntry {
    id: FrameCallbackId,
    callback: Option<Box<dyn FnOnce(u64) + 'static>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn test_runtime() -> Runtime {
        Runtime::new(Arc::new(DefaultScheduler))
    }

    #[test]
    fn frame_callbacks_fire_once_in_order() {
        let runtime = test_runtime();
        let handle = runtime.handle();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["a", "b"] {
            let order = Rc::clone(&order);
            handle.register_frame_callback(move |time| {
                order.borrow_mut().push((tag, time));
            });
        }

        handle.drain_frame_callbacks(42);
        handle.drain_frame_callbacks(43);
        assert_eq!(&*order.borrow(), &[("a", 42), ("b", 42)]);
    }

    #[test]
    fn cancelled_frame_callback_never_fires() {
        let runtime = test_runtime();
        let handle = runtime.handle();
        let fired = Rc::new(Cell::new(false));

        let fired_cb = Rc::clone(&fired);
        let id = handle
            .register_frame_callback(move |_| fired_cb.set(true))
            .unwrap();
        handle.cancel_frame_callback(id);
        handle.drain_frame_callbacks(0);
        assert!(!fired.get());
    }

    #[test]
    fn tasks_run_on_drain_in_fifo_order() {
        let runtime = test_runtime();
        let handle = runtime.handle();
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in [1, 2] {
            let order = Rc::clone(&order);
            handle.spawn_task(Box::new(move || order.borrow_mut().push(tag)));
        }
        assert!(handle.has_pending_tasks());
        handle.drain_tasks();
        assert!(!handle.has_pending_tasks());
        assert_eq!(&*order.borrow(), &[1, 2]);
    }

    #[test]
    fn scroll_listener_removed_during_dispatch_is_suppressed() {
        let runtime = test_runtime();
        let handle = runtime.handle();
        let second_fired = Rc::new(Cell::new(false));

        let removal_slot: Rc<RefCell<Option<ScrollListenerId>>> = Rc::new(RefCell::new(None));
        let removal_handle = handle.clone();
        let removal_slot_cb = Rc::clone(&removal_slot);
        handle.add_scroll_listener(move |_| {
            if let Some(id) = removal_slot_cb.borrow_mut().take() {
                removal_handle.remove_scroll_listener(id);
            }
        });
        let second_fired_cb = Rc::clone(&second_fired);
        let second = handle
            .add_scroll_listener(move |_| second_fired_cb.set(true))
            .unwrap();
        *removal_slot.borrow_mut() = Some(second);

        handle.dispatch_scroll(10.0);
        assert!(
            !second_fired.get(),
            "listener removed mid-dispatch must not see the queued event"
        );
    }

    #[test]
    fn intersection_fires_only_on_threshold_transitions() {
        let runtime = test_runtime();
        let handle = runtime.handle();
        let element = ElementId(1);
        let events = Rc::new(RefCell::new(Vec::new()));

        let events_cb = Rc::clone(&events);
        handle.observe(element, 0.5, move |intersecting| {
            events_cb.borrow_mut().push(intersecting);
        });

        handle.dispatch_intersection(element, 0.1);
        handle.dispatch_intersection(element, 0.6);
        handle.dispatch_intersection(element, 0.7); // same state, no event
        handle.dispatch_intersection(element, 0.2);
        assert_eq!(&*events.borrow(), &[true, false]);
    }

    #[test]
    fn zero_threshold_still_requires_some_visibility() {
        let runtime = test_runtime();
        let handle = runtime.handle();
        let element = ElementId(7);
        let events = Rc::new(RefCell::new(Vec::new()));

        let events_cb = Rc::clone(&events);
        handle.observe(element, 0.0, move |intersecting| {
            events_cb.borrow_mut().push(intersecting);
        });

        handle.dispatch_intersection(element, 0.0);
        assert!(events.borrow().is_empty());
        handle.dispatch_intersection(element, 0.01);
        assert_eq!(&*events.borrow(), &[true]);
    }

    #[test]
    fn unobserve_inside_handler_is_allowed() {
        let runtime = test_runtime();
        let handle = runtime.handle();
        let element = ElementId(3);

        let id_slot: Rc<RefCell<Option<ObservationId>>> = Rc::new(RefCell::new(None));
        let handler_handle = handle.clone();
        let id_slot_cb = Rc::clone(&id_slot);
        let id = handle
            .observe(element, 0.1, move |_| {
                if let Some(id) = id_slot_cb.borrow_mut().take() {
                    handler_handle.unobserve(id);
                }
            })
            .unwrap();
        *id_slot.borrow_mut() = Some(id);

        handle.dispatch_intersection(element, 1.0);
        assert!(handle.observed_elements().is_empty());
        // A later report must be silent.
        handle.dispatch_intersection(element, 0.0);
    }

    #[test]
    fn motion_listeners_see_only_changes() {
        let runtime = test_runtime();
        let handle = runtime.handle();
        let events = Rc::new(RefCell::new(Vec::new()));

        let events_cb = Rc::clone(&events);
        handle.add_motion_listener(move |reduced| events_cb.borrow_mut().push(reduced));

        handle.set_reduced_motion(false); // already false, no event
        handle.set_reduced_motion(true);
        handle.set_reduced_motion(true); // repeat, no event
        handle.set_reduced_motion(false);
        assert_eq!(&*events.borrow(), &[true, false]);
        assert!(!handle.reduced_motion());
    }

    #[test]
    fn handle_outliving_runtime_degrades_to_noop() {
        let handle = {
            let runtime = test_runtime();
            runtime.handle()
        };
        assert!(handle.register_frame_callback(|_| {}).is_none());
        assert!(handle.add_scroll_listener(|_| {}).is_none());
        assert_eq!(handle.scroll_listener_count(), 0);
        handle.dispatch_scroll(0.0);
    }
}
