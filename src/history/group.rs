// TransactionGroup - one atomic undo step

use crate::history::error::HistoryResult;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Closure restoring the state a side effect replaced
pub type Inverse = Box<dyn FnMut()>;

/// Forward side effect. Runs immediately when recorded and again on redo;
/// each run returns the inverse for that run.
pub type SideEffect = Box<dyn FnMut() -> HistoryResult<Inverse>>;

/// Unique identifier for a committed group
pub type GroupId = Uuid;

/// Box a typed effect closure into a [`SideEffect`]
pub(crate) fn box_effect<F, I>(mut effect: F) -> SideEffect
where
    F: FnMut() -> HistoryResult<I> + 'static,
    I: FnMut() + 'static,
{
    Box::new(move || effect().map(|inverse| Box::new(inverse) as Inverse))
}

/// An already-applied forward effect and the closure that reverts it
pub struct ActionPair {
    pub(crate) execute: SideEffect,
    pub(crate) undo: Inverse,
}

impl ActionPair {
    pub(crate) fn new(execute: SideEffect, undo: Inverse) -> Self {
        Self { execute, undo }
    }
}

impl fmt::Debug for ActionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActionPair")
    }
}

/// Ordered sequence of ActionPairs recorded by one logical operation
///
/// Groups are built while a write or batch is open, then become immutable
/// once pushed onto the history.
#[derive(Debug)]
pub struct TransactionGroup {
    id: GroupId,
    label: String,
    timestamp: DateTime<Utc>,
    pub(crate) actions: Vec<ActionPair>,
}

impl TransactionGroup {
    pub(crate) fn new(label: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            timestamp: Utc::now(),
            actions: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Human-readable label (e.g. "Set volume", "Add Track")
    pub fn label(&self) -> &str {
        &self.label
    }

    /// When the group was opened
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub(crate) fn push(&mut self, action: ActionPair) {
        self.actions.push(action);
    }

    /// Revert every action, last recorded first
    pub(crate) fn revert(&mut self) {
        for action in self.actions.iter_mut().rev() {
            (action.undo)();
        }
    }

    /// Re-run every action in recording order, replacing each stored inverse
    /// with the fresh one. On failure the actions re-run so far are reverted
    /// and the group is left as it was before the call.
    pub(crate) fn reapply(&mut self) -> HistoryResult<()> {
        for index in 0..self.actions.len() {
            match (self.actions[index].execute)() {
                Ok(inverse) => self.actions[index].undo = inverse,
                Err(err) => {
                    for action in self.actions[..index].iter_mut().rev() {
                        (action.undo)();
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
