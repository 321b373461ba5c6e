// History - per-document undo/redo ledger and transaction machinery

use crate::history::config::HistoryConfig;
use crate::history::error::{HistoryError, HistoryResult};
use crate::history::group::{ActionPair, SideEffect, TransactionGroup, box_effect};
use crate::observable::ObservableRef;
use crate::observable::subscription::{Subscribers, Subscription};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{trace, warn};

/// Snapshot of what the history can do next, for enabling menu items
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_label: Option<String>,
    pub redo_label: Option<String>,
}

type StatusHandler = dyn Fn(&HistoryStatus);

/// Undo/redo ledger of one document
///
/// The History maintains two stacks:
/// - Past: committed groups that can be undone (most recent at the back)
/// - Future: undone groups that can be redone (most recently undone at the back)
///
/// It also owns the group currently being built. Every ref write and batch
/// increments a depth counter; the group is opened when the depth leaves
/// zero and committed when it returns to zero, so reentrant writes join the
/// enclosing group.
///
/// When a group is committed:
/// 1. Empty groups are dropped
/// 2. The group is pushed onto the past stack
/// 3. The future stack is cleared (linear history)
/// 4. The past stack is trimmed to `max_history`
///
/// `History` is a cheap handle; clones share the same ledger.
#[derive(Clone)]
pub struct History {
    inner: Rc<HistoryInner>,
}

struct HistoryInner {
    config: HistoryConfig,
    state: RefCell<HistoryState>,
    listeners: Subscribers<StatusHandler>,
}

#[derive(Default)]
struct HistoryState {
    past: VecDeque<TransactionGroup>,
    future: Vec<TransactionGroup>,
    building: Option<TransactionGroup>,
    depth: usize,
    /// Depth levels opened by explicit batches, innermost last
    batch_levels: Vec<usize>,
    replaying: bool,
}

/// Sets the replay flag for its lifetime and restores the previous value on
/// drop, including while unwinding from a panicking effect or inverse
struct ReplayGuard<'a> {
    history: &'a History,
    previous: bool,
}

impl<'a> ReplayGuard<'a> {
    fn new(history: &'a History) -> Self {
        let previous = history.set_replaying(true);
        Self { history, previous }
    }
}

impl Drop for ReplayGuard<'_> {
    fn drop(&mut self) {
        self.history.set_replaying(self.previous);
    }
}

impl History {
    /// Create a new History with default settings
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Create a new History with custom limits
    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            inner: Rc::new(HistoryInner {
                config,
                state: RefCell::new(HistoryState::default()),
                listeners: Subscribers::new(),
            }),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.inner.config
    }

    /// Create a ref whose writes are recorded in this history
    pub fn create_ref<T>(&self, name: impl Into<String>, value: T) -> ObservableRef<T>
    where
        T: Clone + PartialEq + 'static,
    {
        ObservableRef::new(self, name, value)
    }

    /// Run a reversible effect as its own undo step, or as part of the
    /// enclosing group when a write or batch is already open.
    ///
    /// `effect` runs immediately and must return the closure that reverts
    /// exactly what it did. It runs again on redo.
    ///
    /// # Errors
    /// Returns the effect's error, or `ReentrancyLimit` when nested too deep.
    pub fn perform<F, I>(&self, label: &str, effect: F) -> HistoryResult<()>
    where
        F: FnMut() -> HistoryResult<I> + 'static,
        I: FnMut() + 'static,
    {
        let mark = self.enter(label, || label.to_string())?;
        let result = self.run_effect(box_effect(effect));
        self.leave(mark, result.is_ok());
        result
    }

    /// Undo the last committed group
    ///
    /// Reverts every action of the group, last recorded first, and moves the
    /// group to the future stack. Returns `false` when there is nothing to
    /// undo, or when called while a group is being built or replayed.
    pub fn undo(&self) -> bool {
        let group = {
            let mut state = self.inner.state.borrow_mut();
            if state.depth > 0 || state.replaying {
                None
            } else {
                state.past.pop_back()
            }
        };

        let Some(mut group) = group else {
            if self.is_batching() || self.is_replaying() {
                warn!("undo refused while a transaction is open");
            } else {
                trace!("nothing to undo");
            }
            return false;
        };

        trace!(label = group.label(), actions = group.len(), "undo");
        {
            let _replay = ReplayGuard::new(self);
            group.revert();
        }

        self.inner.state.borrow_mut().future.push(group);
        self.notify_status();
        true
    }

    /// Redo the last undone group
    ///
    /// Re-executes every action of the group in recording order and moves the
    /// group back to the past stack. Returns `Ok(false)` when there is nothing
    /// to redo.
    ///
    /// # Errors
    /// If a side effect fails, the actions re-executed so far are reverted,
    /// the group stays on the future stack and the error is returned.
    pub fn redo(&self) -> HistoryResult<bool> {
        let group = {
            let mut state = self.inner.state.borrow_mut();
            if state.depth > 0 || state.replaying {
                None
            } else {
                state.future.pop()
            }
        };

        let Some(mut group) = group else {
            if self.is_batching() || self.is_replaying() {
                warn!("redo refused while a transaction is open");
            } else {
                trace!("nothing to redo");
            }
            return Ok(false);
        };

        trace!(label = group.label(), actions = group.len(), "redo");
        let result = {
            let _replay = ReplayGuard::new(self);
            group.reapply()
        };

        match result {
            Ok(()) => {
                self.inner.state.borrow_mut().past.push_back(group);
                self.notify_status();
                Ok(true)
            }
            Err(err) => {
                warn!(label = group.label(), error = %err, "redo failed, group kept on redo stack");
                self.inner.state.borrow_mut().future.push(group);
                Err(err)
            }
        }
    }

    /// Check if there are groups that can be undone
    pub fn can_undo(&self) -> bool {
        !self.inner.state.borrow().past.is_empty()
    }

    /// Check if there are groups that can be redone
    pub fn can_redo(&self) -> bool {
        !self.inner.state.borrow().future.is_empty()
    }

    /// Get the number of groups in the past stack
    pub fn undo_count(&self) -> usize {
        self.inner.state.borrow().past.len()
    }

    /// Get the number of groups in the future stack
    pub fn redo_count(&self) -> usize {
        self.inner.state.borrow().future.len()
    }

    /// Label of the group that would be undone
    pub fn undo_label(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .past
            .back()
            .map(|group| group.label().to_string())
    }

    /// Label of the group that would be redone
    pub fn redo_label(&self) -> Option<String> {
        self.inner
            .state
            .borrow()
            .future
            .last()
            .map(|group| group.label().to_string())
    }

    /// Inspect the group that would be undone
    pub fn with_last_undo<R>(&self, f: impl FnOnce(&TransactionGroup) -> R) -> Option<R> {
        self.inner.state.borrow().past.back().map(f)
    }

    /// True while a write or batch is open
    pub fn is_batching(&self) -> bool {
        self.inner.state.borrow().depth > 0
    }

    /// True while undo, redo or a rollback is running
    pub fn is_replaying(&self) -> bool {
        self.inner.state.borrow().replaying
    }

    pub fn status(&self) -> HistoryStatus {
        let state = self.inner.state.borrow();
        HistoryStatus {
            can_undo: !state.past.is_empty(),
            can_redo: !state.future.is_empty(),
            undo_label: state.past.back().map(|group| group.label().to_string()),
            redo_label: state.future.last().map(|group| group.label().to_string()),
        }
    }

    /// Be notified with the new [`HistoryStatus`] after every commit, undo,
    /// redo and clear
    pub fn subscribe_status(&self, handler: impl Fn(&HistoryStatus) + 'static) -> Subscription {
        let handler: Rc<StatusHandler> = Rc::new(handler);
        let id = self.inner.listeners.insert(handler);
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.remove(id);
            }
        })
    }

    /// Clear all history. The group being built, if any, is kept.
    pub fn clear(&self) {
        let discarded = {
            let mut state = self.inner.state.borrow_mut();
            (
                std::mem::take(&mut state.past),
                std::mem::take(&mut state.future),
            )
        };
        drop(discarded);
        self.notify_status();
    }

    /// Open a write or batch. Returns the rollback mark: the number of
    /// actions already in the group being built.
    pub(crate) fn enter(&self, name: &str, label: impl FnOnce() -> String) -> HistoryResult<usize> {
        let mut state = self.inner.state.borrow_mut();
        let limit = self.inner.config.max_depth;
        if state.depth >= limit {
            return Err(HistoryError::ReentrancyLimit {
                name: name.to_string(),
                limit,
            });
        }

        state.depth += 1;
        if state.depth == 1 && !state.replaying {
            let group = TransactionGroup::new(label());
            trace!(label = group.label(), "group opened");
            state.building = Some(group);
        }

        Ok(state.building.as_ref().map_or(0, TransactionGroup::len))
    }

    /// Close a write or batch. A failed write first reverts everything it
    /// recorded after `mark`. Returns true if a group was committed.
    pub(crate) fn leave(&self, mark: usize, succeeded: bool) -> bool {
        if !succeeded {
            self.rollback_to(mark);
        }

        let finished = {
            let mut state = self.inner.state.borrow_mut();
            state.depth = state.depth.saturating_sub(1);
            if state.depth == 0 {
                state.building.take()
            } else {
                None
            }
        };

        finished.is_some_and(|group| self.commit(group))
    }

    /// Revert and drop every action recorded after `mark` in the group being
    /// built
    pub(crate) fn rollback_to(&self, mark: usize) {
        let mut tail = {
            let mut state = self.inner.state.borrow_mut();
            match state.building.as_mut() {
                Some(group) if group.len() > mark => group.actions.split_off(mark),
                _ => return,
            }
        };

        warn!(actions = tail.len(), "rolling back partially applied write");
        let _replay = ReplayGuard::new(self);
        for action in tail.iter_mut().rev() {
            (action.undo)();
        }
    }

    /// Run `effect` now and record it in the group being built.
    ///
    /// While replaying, the effect is skipped: the recorded actions are the
    /// only thing that touches state during undo, redo and rollback.
    pub(crate) fn run_effect(&self, mut effect: SideEffect) -> HistoryResult<()> {
        if self.is_replaying() {
            trace!("effect skipped during replay");
            return Ok(());
        }
        let inverse = effect()?;
        self.record(ActionPair::new(effect, inverse));
        Ok(())
    }

    pub(crate) fn depth(&self) -> usize {
        self.inner.state.borrow().depth
    }

    /// Remember that the current depth level belongs to an explicit batch
    pub(crate) fn mark_batch_level(&self) -> usize {
        let mut state = self.inner.state.borrow_mut();
        let level = state.depth;
        state.batch_levels.push(level);
        level
    }

    /// Forget an explicit batch level. Returns false if it is not open.
    pub(crate) fn unmark_batch_level(&self, level: usize) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let index = state.batch_levels.iter().rposition(|open| *open == level);
        index.map(|index| state.batch_levels.remove(index)).is_some()
    }

    /// Level of the innermost open batch, if it is also the innermost open
    /// boundary. A write in progress above the batch hides it.
    pub(crate) fn innermost_batch_level(&self) -> Option<usize> {
        let state = self.inner.state.borrow();
        state
            .batch_levels
            .last()
            .copied()
            .filter(|level| *level == state.depth)
    }

    fn record(&self, action: ActionPair) {
        let rejected = {
            let mut state = self.inner.state.borrow_mut();
            let replaying = state.replaying;
            match state.building.as_mut() {
                Some(group) if !replaying => {
                    group.push(action);
                    None
                }
                _ => Some(action),
            }
        };
        drop(rejected);
    }

    fn commit(&self, group: TransactionGroup) -> bool {
        if group.is_empty() {
            trace!(label = group.label(), "empty group elided");
            return false;
        }

        let discarded = {
            let mut state = self.inner.state.borrow_mut();
            trace!(
                label = group.label(),
                actions = group.len(),
                undo_stack = state.past.len() + 1,
                "group committed"
            );
            state.past.push_back(group);

            let trimmed = if state.past.len() > self.inner.config.max_history {
                state.past.pop_front()
            } else {
                None
            };
            if !state.future.is_empty() {
                trace!(cleared = state.future.len(), "redo stack cleared");
            }
            (std::mem::take(&mut state.future), trimmed)
        };
        drop(discarded);

        self.notify_status();
        true
    }

    fn set_replaying(&self, replaying: bool) -> bool {
        std::mem::replace(&mut self.inner.state.borrow_mut().replaying, replaying)
    }

    fn notify_status(&self) {
        let status = self.status();
        for handler in self.inner.listeners.snapshot() {
            handler(&status);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("History")
            .field("past", &state.past.len())
            .field("future", &state.future.len())
            .field("depth", &state.depth)
            .field("replaying", &state.replaying)
            .finish()
    }
}
