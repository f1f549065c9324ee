//! Single-active-selection coordination.
//!
//! A [`SelectionGroup`] names one set of mutually exclusive toggles — all
//! the dropdowns in a navigation bar, the sections of an accordion, the
//! modals of a page. At most one key is active per group at any instant;
//! opening a key implicitly closes whichever key was active before.
//!
//! Keys form a lazy namespace: any comparable value may be toggled without
//! a registration step. All transitions are synchronous and infallible.

use std::fmt;

use scrollkit_core::{MutableState, State, Subscription};

/// One namespace of mutually exclusive toggles.
///
/// The group is owned by the view (or view subtree) that created it and is
/// discarded with it; there is no persistence and no cross-group sharing.
pub struct SelectionGroup<K: Clone + PartialEq + 'static> {
    active: MutableState<Option<K>>,
}

impl<K: Clone + PartialEq + 'static> SelectionGroup<K> {
    /// Create a group with nothing active.
    pub fn new() -> Self {
        Self {
            active: MutableState::new(None),
        }
    }

    /// Create a group with `key` already active.
    pub fn with_initial(key: K) -> Self {
        Self {
            active: MutableState::new(Some(key)),
        }
    }

    /// Activate `key`, implicitly closing any previously active key.
    pub fn open(&self, key: K) {
        self.active.set(Some(key));
    }

    /// Close `key` only if it is the active key.
    ///
    /// A stale close (the caller's key lost the race to a newer `open`) is
    /// a no-op, so a late-arriving close cannot clobber a newer selection.
    pub fn close(&self, key: &K) {
        let is_current = self.active.with(|active| active.as_ref() == Some(key));
        if is_current {
            self.active.set(None);
        } else {
            log::debug!("stale close ignored; key is no longer active");
        }
    }

    /// Close whatever is active, unconditionally.
    pub fn close_all(&self) {
        self.active.set(None);
    }

    /// Flip `key`: close it if active, otherwise make it the active key.
    ///
    /// This is the entry point clickable triggers wire to.
    pub fn toggle(&self, key: K) {
        self.active.update(|active| {
            if active.as_ref() == Some(&key) {
                *active = None;
            } else {
                *active = Some(key);
            }
        });
    }

    /// Whether `key` is the active key. Pure query, no side effects.
    pub fn is_open(&self, key: &K) -> bool {
        self.active.with(|active| active.as_ref() == Some(key))
    }

    /// The currently active key, if any.
    pub fn active(&self) -> Option<K> {
        self.active.value()
    }

    /// Observable view of the active key, for consumers that re-render on
    /// selection changes.
    pub fn state(&self) -> State<Option<K>> {
        self.active.as_state()
    }

    /// Subscribe to selection changes directly.
    pub fn subscribe(&self, callback: impl FnMut(&Option<K>) + 'static) -> Subscription {
        self.active.subscribe(callback)
    }
}

impl<K: Clone + PartialEq + 'static> Default for SelectionGroup<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for SelectionGroup<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionGroup")
            .field("active", &self.active.value())
            .finish()
    }
}

/// Group for dropdown menus keyed by name.
pub fn dropdown_group() -> SelectionGroup<String> {
    SelectionGroup::new()
}

/// Group for accordion/collapsible sections keyed by name.
pub fn accordion_group() -> SelectionGroup<String> {
    SelectionGroup::new()
}

/// Group for modals; only one modal may be open at a time.
pub fn modal_group() -> SelectionGroup<String> {
    SelectionGroup::new()
}
