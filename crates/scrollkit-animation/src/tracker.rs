//! Viewport-gated progress tracking.
//!
//! [`ScrollTracker::track`] ties a progress callback to an element for the
//! caller's lifetime. The element is watched through an intersection
//! observation (O(1) registration, no per-frame cost while off-screen); a
//! scroll-listening progress attachment exists exactly while the element
//! is near the viewport. That iff relationship is the central invariant:
//! total attachment count is bounded by the number of on-screen elements
//! regardless of page length, and an on-screen element is never silently
//! left without updates.

use std::cell::RefCell;
use std::rc::Rc;

use scrollkit_core::{
    ElementId, FrameCallbackRegistration, ObservationId, RuntimeHandle, ScrollListenerId, Viewport,
};

use crate::trigger::{Scrub, TriggerConfig};

/// Entry point for registering tracked elements.
///
/// Holds the runtime handle and the geometry seam; each `track` call
/// returns an independent [`TrackedElement`] guard.
pub struct ScrollTracker {
    runtime: RuntimeHandle,
    viewport: Rc<dyn Viewport>,
}

impl ScrollTracker {
    pub fn new(runtime: RuntimeHandle, viewport: Rc<dyn Viewport>) -> Self {
        Self { runtime, viewport }
    }

    /// Track a single element; `callback` receives the element and a
    /// normalized progress in `[0, 1]` on every scroll update while the
    /// element is near the viewport.
    ///
    /// Tracking lives exactly as long as the returned guard.
    pub fn track(
        &self,
        element: ElementId,
        config: TriggerConfig,
        callback: impl FnMut(ElementId, f32) + 'static,
    ) -> TrackedElement {
        self.register(element, config, Target::Single(Box::new(callback)))
    }

    /// Track a container and fan its progress out to matching children.
    ///
    /// Children are re-resolved through the viewport on every activation,
    /// so insertions and removals between appearances are picked up. The
    /// callback receives the resolved children plus the raw container
    /// progress; per-child phase shifting is the caller's convention (see
    /// [`crate::stagger::staggered_progress`]).
    pub fn track_staggered(
        &self,
        container: ElementId,
        selector: impl Into<String>,
        config: TriggerConfig,
        callback: impl FnMut(&[ElementId], f32) + 'static,
    ) -> TrackedElement {
        self.register(
            container,
            config,
            Target::Staggered {
                selector: selector.into(),
                children: Vec::new(),
                callback: Box::new(callback),
            },
        )
    }

    fn register(&self, element: ElementId, config: TriggerConfig, target: Target) -> TrackedElement {
        let inner = Rc::new(RefCell::new(TrackedInner {
            runtime: self.runtime.clone(),
            viewport: Rc::clone(&self.viewport),
            element,
            config,
            target,
            observation: None,
            scroll_listener: None,
            near_viewport: false,
            fired_once: false,
            smoothing: None,
        }));
        let weak = Rc::downgrade(&inner);
        let observation = self.runtime.observe(element, config.threshold, move |intersecting| {
            if let Some(strong) = weak.upgrade() {
                TrackedInner::on_intersection(&strong, intersecting);
            }
        });
        inner.borrow_mut().observation = observation;
        TrackedElement { inner }
    }
}

enum Target {
    Single(Box<dyn FnMut(ElementId, f32)>),
    Staggered {
        selector: String,
        children: Vec<ElementId>,
        callback: Box<dyn FnMut(&[ElementId], f32)>,
    },
}

struct Smoothing {
    seconds: f32,
    reported: f32,
    target: f32,
    last_frame_nanos: Option<u64>,
    registration: Option<FrameCallbackRegistration>,
}

struct TrackedInner {
    runtime: RuntimeHandle,
    viewport: Rc<dyn Viewport>,
    element: ElementId,
    config: TriggerConfig,
    target: Target,
    observation: Option<ObservationId>,
    scroll_listener: Option<ScrollListenerId>,
    near_viewport: bool,
    fired_once: bool,
    smoothing: Option<Smoothing>,
}

impl TrackedInner {
    fn emit(&mut self, progress: f32) {
        let element = self.element;
        match &mut self.target {
            Target::Single(callback) => callback(element, progress),
            Target::Staggered { children, callback, .. } => callback(children, progress),
        }
    }

    fn on_intersection(this: &Rc<RefCell<TrackedInner>>, entering: bool) {
        let mut inner = this.borrow_mut();
        if entering {
            inner.near_viewport = true;
            if inner.config.once {
                if !inner.fired_once {
                    inner.fired_once = true;
                    if let Some(id) = inner.observation.take() {
                        inner.runtime.unobserve(id);
                    }
                    inner.emit(1.0);
                }
                return;
            }
            {
                let TrackedInner {
                    viewport,
                    element,
                    target,
                    ..
                } = &mut *inner;
                if let Target::Staggered { selector, children, .. } = target {
                    *children = viewport.resolve_children(*element, selector);
                }
            }
            if inner.scroll_listener.is_none() {
                let weak = Rc::downgrade(this);
                inner.scroll_listener = inner.runtime.add_scroll_listener(move |scroll_y| {
                    if let Some(strong) = weak.upgrade() {
                        TrackedInner::on_scroll(&strong, scroll_y);
                    }
                });
                log::debug!("progress attachment created for {}", inner.element);
            }
        } else {
            inner.near_viewport = false;
            if let Some(id) = inner.scroll_listener.take() {
                inner.runtime.remove_scroll_listener(id);
                log::debug!("progress attachment released for {}", inner.element);
            }
            if let Some(smoothing) = inner.smoothing.as_mut() {
                smoothing.registration = None;
                smoothing.last_frame_nanos = None;
            }
        }
    }

    fn on_scroll(this: &Rc<RefCell<TrackedInner>>, scroll_y: f32) {
        let mut inner = this.borrow_mut();
        let bounds = match inner.viewport.element_bounds(inner.element) {
            Some(bounds) => bounds,
            // Not attached to the render tree yet; nothing to report.
            None => return,
        };
        let viewport_height = inner.viewport.height();
        let raw = inner.config.progress(&bounds, viewport_height, scroll_y);
        match inner.config.scrub {
            Scrub::Direct => {
                let eased = inner.config.ease.transform(raw);
                inner.emit(eased);
            }
            Scrub::Smoothed(seconds) => {
                let smoothing = inner.smoothing.get_or_insert_with(|| Smoothing {
                    seconds,
                    reported: 0.0,
                    target: raw,
                    last_frame_nanos: None,
                    registration: None,
                });
                smoothing.target = raw;
                let needs_frame = smoothing.registration.is_none();
                drop(inner);
                if needs_frame {
                    TrackedInner::schedule_smoothing_frame(this);
                }
            }
        }
    }

    fn schedule_smoothing_frame(this: &Rc<RefCell<TrackedInner>>) {
        let registration = {
            let inner = this.borrow();
            let weak = Rc::downgrade(this);
            inner.runtime.frame_clock().with_frame_nanos(move |nanos| {
                if let Some(strong) = weak.upgrade() {
                    TrackedInner::on_smoothing_frame(&strong, nanos);
                }
            })
        };
        let mut inner = this.borrow_mut();
        if let Some(smoothing) = inner.smoothing.as_mut() {
            smoothing.registration = Some(registration);
        }
    }

    fn on_smoothing_frame(this: &Rc<RefCell<TrackedInner>>, frame_time_nanos: u64) {
        let mut inner = this.borrow_mut();
        let (value, settled) = {
            let smoothing = match inner.smoothing.as_mut() {
                Some(smoothing) => smoothing,
                None => return,
            };
            smoothing.registration = None;
            let dt = match smoothing.last_frame_nanos {
                Some(previous) => frame_time_nanos.saturating_sub(previous) as f32 / 1e9,
                None => 1.0 / 60.0,
            };
            smoothing.last_frame_nanos = Some(frame_time_nanos);
            let alpha = if smoothing.seconds <= f32::EPSILON {
                1.0
            } else {
                (dt / smoothing.seconds).min(1.0)
            };
            smoothing.reported += (smoothing.target - smoothing.reported) * alpha;
            let settled = (smoothing.target - smoothing.reported).abs() < 1e-3;
            if settled {
                smoothing.reported = smoothing.target;
                smoothing.last_frame_nanos = None;
            }
            (smoothing.reported, settled)
        };
        let eased = inner.config.ease.transform(value);
        inner.emit(eased);
        drop(inner);
        if !settled {
            TrackedInner::schedule_smoothing_frame(this);
        }
    }
}

/// Guard for one tracked element.
///
/// Dropping the guard synchronously releases the intersection observation,
/// any live progress attachment, and any pending smoothing frame; no
/// callback fires afterwards, even for an event the platform had already
/// queued.
pub struct TrackedElement {
    inner: Rc<RefCell<TrackedInner>>,
}

impl TrackedElement {
    pub fn element(&self) -> ElementId {
        self.inner.borrow().element
    }

    /// Whether the element is currently inside the activation zone.
    pub fn is_near_viewport(&self) -> bool {
        self.inner.borrow().near_viewport
    }

    /// Whether a live progress attachment exists right now. Holds the
    /// scheduler invariant: true iff [`Self::is_near_viewport`] for
    /// non-`once` configs.
    pub fn has_progress_attachment(&self) -> bool {
        self.inner.borrow().scroll_listener.is_some()
    }
}

impl Drop for TrackedElement {
    fn drop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(id) = inner.observation.take() {
            inner.runtime.unobserve(id);
        }
        if let Some(id) = inner.scroll_listener.take() {
            inner.runtime.remove_scroll_listener(id);
        }
        // Dropping the smoothing state cancels any pending frame callback.
        inner.smoothing = None;
        inner.near_viewport = false;
    }
}

#[cfg(test)]
#[path = "tests/tracker_tests.rs"]
mod tests;
