//! Viewport geometry seam between ScrollKit and the rendering layer.
//!
//! ScrollKit never owns elements. The rendering layer hands out opaque
//! [`ElementId`] handles and answers geometry queries through the
//! [`Viewport`] trait; everything here is expressed in document space with
//! a vertical scroll axis.

use crate::collections::hashing::hash_one;

/// Opaque handle to an element owned by the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Derive a stable id from a human-readable label.
    ///
    /// Convenient for hosts that address elements by name rather than by
    /// index, and for tests.
    pub fn from_label(label: &str) -> Self {
        Self(hash_one(&label))
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Vertical extent of an element in document coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementBounds {
    /// Distance from the document top to the element's top edge.
    pub top: f32,
    /// Element height; zero-height elements are legal.
    pub height: f32,
}

impl ElementBounds {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    /// Document-space bottom edge.
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Document-space vertical center.
    pub fn center(&self) -> f32 {
        self.top + self.height * 0.5
    }

    /// Fraction of the element visible in a viewport of `height` scrolled
    /// to `scroll_y`, in `[0, 1]`.
    pub fn visible_ratio(&self, scroll_y: f32, height: f32) -> f32 {
        if self.height <= 0.0 {
            let inside = self.top >= scroll_y && self.top <= scroll_y + height;
            return if inside { 1.0 } else { 0.0 };
        }
        let visible_top = self.top.max(scroll_y);
        let visible_bottom = self.bottom().min(scroll_y + height);
        ((visible_bottom - visible_top) / self.height).clamp(0.0, 1.0)
    }
}

/// Geometry queries answered by the rendering layer.
///
/// Returning `None` from [`Viewport::element_bounds`] means the element is
/// not currently attached; callers treat that as "nothing to do yet"
/// rather than as an error.
pub trait Viewport {
    /// Current viewport height.
    fn height(&self) -> f32;

    /// Current vertical scroll offset.
    fn scroll_y(&self) -> f32;

    /// Document-space bounds of `element`, or `None` while detached.
    fn element_bounds(&self, element: ElementId) -> Option<ElementBounds>;

    /// Resolve the descendants of `container` matching `selector`.
    ///
    /// Selector semantics belong to the rendering layer; ScrollKit only
    /// passes the string through.
    fn resolve_children(&self, container: ElementId, selector: &str) -> Vec<ElementId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_label_is_stable() {
        assert_eq!(
            ElementId::from_label("hero"),
            ElementId::from_label("hero")
        );
        assert_ne!(
            ElementId::from_label("hero"),
            ElementId::from_label("footer")
        );
    }

    #[test]
    fn visible_ratio_clamps_to_unit_interval() {
        let bounds = ElementBounds::new(100.0, 200.0);
        // Fully above the viewport.
        assert_eq!(bounds.visible_ratio(400.0, 600.0), 0.0);
        // Fully inside.
        assert_eq!(bounds.visible_ratio(0.0, 600.0), 1.0);
        // Half visible below the fold.
        let ratio = bounds.visible_ratio(200.0, 600.0);
        assert!((ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_height_element_is_visible_only_inside_viewport() {
        let bounds = ElementBounds::new(500.0, 0.0);
        assert_eq!(bounds.visible_ratio(0.0, 600.0), 1.0);
        assert_eq!(bounds.visible_ratio(501.0, 600.0), 0.0);
    }
}
