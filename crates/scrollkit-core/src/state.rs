use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type WatcherFn<T> = RefCell<Box<dyn FnMut(&T)>>;

struct MutableStateInner<T: Clone + 'static> {
    value: RefCell<T>,
    watchers: RefCell<Vec<Weak<WatcherFn<T>>>>,
}

impl<T: Clone + 'static> MutableStateInner<T> {
    fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            watchers: RefCell::new(Vec::new()),
        }
    }
}

/// Read-only view of a [`MutableState`].
pub struct State<T: Clone + 'static> {
    inner: Rc<MutableStateInner<T>>,
}

/// Observable state cell.
///
/// Watchers are registered explicitly through [`State::subscribe`] and
/// notified synchronously on every write. They are held weakly: dropping
/// the returned [`Subscription`] is the whole teardown story, and dead
/// watchers are pruned on the next notification.
pub struct MutableState<T: Clone + 'static> {
    inner: Rc<MutableStateInner<T>>,
}

impl<T: Clone + 'static> PartialEq for State<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> Eq for State<T> {}

impl<T: Clone + 'static> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> PartialEq for MutableState<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone + 'static> Eq for MutableState<T> {}

impl<T: Clone + 'static> Clone for MutableState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> MutableState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(MutableStateInner::new(value)),
        }
    }

    pub fn as_state(&self) -> State<T> {
        State {
            inner: Rc::clone(&self.inner),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.as_state().with(f)
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut *self.inner.value.borrow_mut());
        self.notify_watchers();
        result
    }

    pub fn replace(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify_watchers();
    }

    pub fn set_value(&self, value: T) {
        self.replace(value);
    }

    pub fn set(&self, value: T) {
        self.replace(value);
    }

    fn notify_watchers(&self) {
        let watchers: Vec<Rc<WatcherFn<T>>> = {
            let mut watchers = self.inner.watchers.borrow_mut();
            watchers.retain(|w| w.strong_count() > 0);
            watchers.iter().filter_map(|w| w.upgrade()).collect()
        };
        if watchers.is_empty() {
            return;
        }
        let value = self.inner.value.borrow().clone();
        for watcher in watchers {
            (watcher.borrow_mut())(&value);
        }
    }

    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        self.as_state().subscribe(callback)
    }

    pub fn value(&self) -> T {
        self.as_state().value()
    }

    pub fn get(&self) -> T {
        self.value()
    }
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for MutableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableState")
            .field("value", &self.value())
            .finish()
    }
}

impl<T: Clone + 'static> State<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    pub fn value(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn get(&self) -> T {
        self.value()
    }

    /// Register `callback` to run synchronously after every write.
    ///
    /// The callback stays registered for exactly as long as the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription {
        let watcher: Rc<WatcherFn<T>> = Rc::new(RefCell::new(Box::new(callback)));
        let mut watchers = self.inner.watchers.borrow_mut();
        watchers.retain(|w| w.strong_count() > 0);
        watchers.push(Rc::downgrade(&watcher));
        Subscription { _watcher: watcher }
    }
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &self.value())
            .finish()
    }
}

/// Keeps one state watcher alive; dropping it unsubscribes.
pub struct Subscription {
    _watcher: Rc<dyn Any>,
}

/// State derived from another state cell, recomputed on every source write.
pub struct Derived<U: Clone + 'static> {
    state: MutableState<U>,
    _subscription: Subscription,
}

impl<U: Clone + 'static> Derived<U> {
    pub fn state(&self) -> State<U> {
        self.state.as_state()
    }

    pub fn value(&self) -> U {
        self.state.value()
    }
}

/// Build a [`Derived`] cell that tracks `source` through `compute`.
pub fn derive<T, U>(source: &State<T>, compute: impl Fn(&T) -> U + 'static) -> Derived<U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    let state = MutableState::new(source.with(|value| compute(value)));
    let subscription = {
        let state = state.clone();
        source.subscribe(move |value| state.set(compute(value)))
    };
    Derived {
        state,
        _subscription: subscription,
    }
}
