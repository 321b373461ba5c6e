// ChangeEvent - what a subscriber sees for one write

use crate::history::error::HistoryResult;
use crate::history::group::box_effect;
use crate::history::stack::History;

/// Before/after pair delivered to every subscriber of a ref write
///
/// Subscribers that drive an external resource call
/// [`on_execute`](ChangeEvent::on_execute) to apply their effect and register
/// its inverse with the active transaction group.
pub struct ChangeEvent<'a, T> {
    pub old_value: T,
    pub new_value: T,
    history: &'a History,
}

impl<'a, T> ChangeEvent<'a, T> {
    pub(crate) fn new(old_value: T, new_value: T, history: &'a History) -> Self {
        Self {
            old_value,
            new_value,
            history,
        }
    }

    /// Run `effect` immediately and record it, together with the inverse it
    /// returns, in the active group.
    ///
    /// May be called any number of times per event; each call appends one
    /// action. `effect` runs again on redo and must return a fresh inverse
    /// each time. On a replay event the call does nothing and returns `Ok`:
    /// the recorded actions are replayed instead.
    ///
    /// # Errors
    /// Returns the effect's error. Nothing is recorded for a failed effect.
    pub fn on_execute<F, I>(&self, effect: F) -> HistoryResult<()>
    where
        F: FnMut() -> HistoryResult<I> + 'static,
        I: FnMut() + 'static,
    {
        self.history.run_effect(box_effect(effect))
    }

    /// True when the event reports a value restored by undo, redo or a
    /// rollback rather than a new write
    pub fn is_replay(&self) -> bool {
        self.history.is_replaying()
    }

    /// The history the write is being recorded in
    pub fn history(&self) -> &History {
        self.history
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ChangeEvent<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeEvent")
            .field("old_value", &self.old_value)
            .field("new_value", &self.new_value)
            .field("replay", &self.is_replay())
            .finish()
    }
}
