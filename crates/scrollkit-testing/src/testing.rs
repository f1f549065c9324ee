use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use scrollkit_core::collections::map::HashMap;
use scrollkit_core::{
    ElementBounds, ElementId, Runtime, RuntimeHandle, RuntimeScheduler, Viewport,
};

/// No-op scheduler; tests drive frames explicitly.
#[derive(Default)]
pub struct TestScheduler;

impl RuntimeScheduler for TestScheduler {
    fn schedule_frame(&self) {}
}

struct TestViewportInner {
    height: f32,
    scroll_y: f32,
    elements: HashMap<ElementId, ElementBounds>,
    // (container, selector) -> children
    children: HashMap<(ElementId, String), Vec<ElementId>>,
}

/// Scriptable [`Viewport`] backed by plain maps.
///
/// Tests place elements at document positions and the harness computes
/// visibility from the same geometry the progress math sees.
#[derive(Clone)]
pub struct TestViewport {
    inner: Rc<RefCell<TestViewportInner>>,
}

impl TestViewport {
    pub fn new(height: f32) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TestViewportInner {
                height,
                scroll_y: 0.0,
                elements: HashMap::new(),
                children: HashMap::new(),
            })),
        }
    }

    pub fn place_element(&self, element: ElementId, top: f32, height: f32) {
        self.inner
            .borrow_mut()
            .elements
            .insert(element, ElementBounds::new(top, height));
    }

    /// Detach an element; subsequent geometry queries return `None`.
    pub fn remove_element(&self, element: ElementId) {
        self.inner.borrow_mut().elements.remove(&element);
    }

    pub fn set_children(&self, container: ElementId, selector: &str, children: Vec<ElementId>) {
        self.inner
            .borrow_mut()
            .children
            .insert((container, selector.to_string()), children);
    }

    pub fn set_scroll_y(&self, scroll_y: f32) {
        self.inner.borrow_mut().scroll_y = scroll_y;
    }

    pub fn visible_ratio(&self, element: ElementId) -> f32 {
        let inner = self.inner.borrow();
        inner
            .elements
            .get(&element)
            .map(|bounds| bounds.visible_ratio(inner.scroll_y, inner.height))
            .unwrap_or(0.0)
    }
}

impl Viewport for TestViewport {
    fn height(&self) -> f32 {
        self.inner.borrow().height
    }

    fn scroll_y(&self) -> f32 {
        self.inner.borrow().scroll_y
    }

    fn element_bounds(&self, element: ElementId) -> Option<ElementBounds> {
        self.inner.borrow().elements.get(&element).copied()
    }

    fn resolve_children(&self, container: ElementId, selector: &str) -> Vec<ElementId> {
        self.inner
            .borrow()
            .children
            .get(&(container, selector.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

/// Headless harness for exercising scroll coordination in tests.
///
/// `ScrollTestRule` plays the roles the browser would: it owns the runtime,
/// stands in for the platform intersection observer (visibility is computed
/// from [`TestViewport`] geometry and delivered as transitions), dispatches
/// scroll events, and drains frame callbacks on demand.
pub struct ScrollTestRule {
    runtime: Runtime,
    viewport: TestViewport,
}

impl ScrollTestRule {
    pub fn new() -> Self {
        Self::with_viewport_height(600.0)
    }

    pub fn with_viewport_height(height: f32) -> Self {
        Self {
            runtime: Runtime::new(Arc::new(TestScheduler)),
            viewport: TestViewport::new(height),
        }
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn viewport(&self) -> TestViewport {
        self.viewport.clone()
    }

    /// The viewport as the trait object consumers expect.
    pub fn viewport_rc(&self) -> Rc<dyn Viewport> {
        Rc::new(self.viewport.clone())
    }

    pub fn place_element(&self, element: ElementId, top: f32, height: f32) {
        self.viewport.place_element(element, top, height);
    }

    pub fn remove_element(&self, element: ElementId) {
        self.viewport.remove_element(element);
    }

    pub fn set_children(&self, container: ElementId, selector: &str, children: Vec<ElementId>) {
        self.viewport.set_children(container, selector, children);
    }

    /// Report visibility for every observed element from current geometry,
    /// as the platform observer would after a layout pass.
    pub fn flush_intersections(&self) {
        let handle = self.runtime.handle();
        for element in handle.observed_elements() {
            let ratio = self.viewport.visible_ratio(element);
            handle.dispatch_intersection(element, ratio);
        }
    }

    /// Scroll to `y`: update geometry, deliver intersection transitions,
    /// then deliver the scroll event itself.
    pub fn scroll_to(&self, y: f32) {
        self.viewport.set_scroll_y(y);
        self.flush_intersections();
        self.runtime.handle().dispatch_scroll(y);
    }

    /// Drain scheduled frame callbacks at the supplied timestamp.
    pub fn advance_frame(&self, frame_time_nanos: u64) {
        self.runtime.handle().drain_frame_callbacks(frame_time_nanos);
    }

    /// Drive frames at a fixed cadence until no frame callbacks remain or
    /// `max_frames` is hit. Returns the number of frames driven.
    pub fn pump_frames(&self, start_nanos: u64, step_nanos: u64, max_frames: usize) -> usize {
        let handle = self.runtime.handle();
        let mut time = start_nanos;
        let mut frames = 0;
        while handle.has_frame_callbacks() && frames < max_frames {
            handle.drain_frame_callbacks(time);
            time += step_nanos;
            frames += 1;
        }
        frames
    }
}

impl Default for ScrollTestRule {
    fn default() -> Self {
        Self::new()
    }
}
