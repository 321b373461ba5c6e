// ObservableRef - reactive storage cell with undoable writes

use crate::history::error::HistoryResult;
use crate::history::group::box_effect;
use crate::history::stack::History;
use crate::observable::event::ChangeEvent;
use crate::observable::subscription::{Subscribers, Subscription};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{trace, warn};

type Handler<T> = dyn Fn(&ChangeEvent<'_, T>) -> HistoryResult<()>;

/// A single mutable value that notifies subscribers synchronously on every
/// distinct-value write and records the write in its [`History`].
///
/// Cloning the ref clones the handle; both clones observe the same cell.
///
/// # Example
/// ```
/// use dawg_history::History;
///
/// let history = History::new();
/// let volume = history.create_ref("volume", 0.5_f32);
///
/// volume.set(0.8).unwrap();
/// assert_eq!(volume.get(), 0.8);
///
/// history.undo();
/// assert_eq!(volume.get(), 0.5);
/// ```
pub struct ObservableRef<T> {
    inner: Rc<RefInner<T>>,
}

struct RefInner<T> {
    name: String,
    value: RefCell<T>,
    subscribers: Subscribers<Handler<T>>,
    history: History,
}

impl<T> Clone for ObservableRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> ObservableRef<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a ref recorded in `history`. `name` is a diagnostic label used
    /// in group labels and logs; it does not need to be unique.
    pub fn new(history: &History, name: impl Into<String>, value: T) -> Self {
        Self {
            inner: Rc::new(RefInner {
                name: name.into(),
                value: RefCell::new(value),
                subscribers: Subscribers::new(),
                history: history.clone(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn history(&self) -> &History {
        &self.inner.history
    }

    /// Current value
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it.
    /// `f` must not write to this ref.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Write a new value
    ///
    /// Writing a value equal to the current one does nothing. Otherwise the
    /// value is stored, every subscriber (as of the start of the write) is
    /// called in subscription order, and the write joins the open group or
    /// becomes its own undo step.
    ///
    /// Writes issued while the history is replaying (typically by a
    /// subscriber reacting to an undo) are ignored: the replayed group
    /// already holds the recorded outcome of every ref it touched.
    ///
    /// # Errors
    /// If a subscriber fails, everything this write recorded (including the
    /// value change itself) is reverted and the error is returned.
    /// Returns `ReentrancyLimit` if writes are nested deeper than the
    /// configured ceiling.
    pub fn set(&self, new_value: T) -> HistoryResult<()> {
        if *self.inner.value.borrow() == new_value {
            trace!(name = %self.inner.name, "unchanged value ignored");
            return Ok(());
        }
        if self.inner.history.is_replaying() {
            trace!(name = %self.inner.name, "write during replay ignored");
            return Ok(());
        }

        let history = &self.inner.history;
        let mark = history.enter(&self.inner.name, || format!("Set {}", self.inner.name))?;
        let result = self.write(new_value);
        history.leave(mark, result.is_ok());
        result
    }

    /// Clone the value, mutate the clone, and [`set`](ObservableRef::set) it
    pub fn update(&self, f: impl FnOnce(&mut T)) -> HistoryResult<()> {
        let mut value = self.get();
        f(&mut value);
        self.set(value)
    }

    /// Register a handler called with a [`ChangeEvent`] for every write.
    ///
    /// Handlers are also called when undo, redo or a rollback changes the
    /// value, with [`ChangeEvent::is_replay`] set. Their `on_execute` calls
    /// are skipped then, since the recorded inverses already restore bound
    /// resources. Errors returned during replay are logged and ignored.
    ///
    /// Handlers added while a notification is in flight only see later
    /// writes.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent<'_, T>) -> HistoryResult<()> + 'static,
    {
        let handler: Rc<Handler<T>> = Rc::new(handler);
        let id = self.inner.subscribers.insert(handler);
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.remove(id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    fn write(&self, new_value: T) -> HistoryResult<()> {
        let old_value = self.get();

        // The value change is the first action of the write, so it is
        // reverted last. Linear history means the value before a redo is
        // always the one seen by the original write.
        let weak = Rc::downgrade(&self.inner);
        let stored = new_value.clone();
        let restored = old_value.clone();
        self.inner.history.run_effect(box_effect(move || {
            RefInner::store(&weak, &stored);
            let weak = Weak::clone(&weak);
            let restored = restored.clone();
            Ok(move || RefInner::store(&weak, &restored))
        }))?;

        let event = ChangeEvent::new(old_value, new_value, &self.inner.history);
        for handler in self.inner.subscribers.snapshot() {
            if let Err(err) = handler(&event) {
                warn!(name = %self.inner.name, error = %err, "subscriber failed");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl<T> RefInner<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Replace the value from a recorded action. Outside the first write
    /// this only happens while replaying, so subscribers get a replay event.
    fn store(weak: &Weak<Self>, value: &T) {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        let previous = inner.value.replace(value.clone());
        if previous != *value && inner.history.is_replaying() {
            inner.notify_replay(previous, value.clone());
        }
    }

    fn notify_replay(&self, old_value: T, new_value: T) {
        let event = ChangeEvent::new(old_value, new_value, &self.history);
        for handler in self.subscribers.snapshot() {
            if let Err(err) = handler(&event) {
                warn!(name = %self.name, error = %err, "subscriber failed during replay");
            }
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableRef")
            .field("name", &self.inner.name)
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}
