// Explicit batch boundaries - several writes, one undo step

use crate::history::error::{HistoryError, HistoryResult};
use crate::history::stack::History;
use tracing::{debug, warn};

/// Open batch that ends when dropped
///
/// Returned by [`History::batch`]. Dropping the guard commits the batch,
/// except while unwinding from a panic, in which case everything recorded
/// since the guard was created is rolled back first.
#[must_use = "the batch ends as soon as the guard is dropped"]
pub struct BatchGuard {
    history: History,
    mark: usize,
    level: usize,
    finished: bool,
}

impl BatchGuard {
    /// End the batch. Returns true if this closed the outermost boundary
    /// and a non-empty group was committed.
    pub fn commit(mut self) -> bool {
        self.finish(true)
    }

    /// Revert everything recorded since the guard was created, then end the
    /// batch
    pub fn rollback(mut self) {
        self.finish(false);
    }

    fn finish(&mut self, succeeded: bool) -> bool {
        self.finished = true;
        if !self.history.unmark_batch_level(self.level) {
            warn!(level = self.level, "batch already closed by end_batch");
            return false;
        }
        self.history.leave(self.mark, succeeded)
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(!std::thread::panicking());
        }
    }
}

impl History {
    /// Open a batch boundary. Every write until the matching
    /// [`end_batch`](History::end_batch) joins one group; nested batches are
    /// allowed and only the outermost one commits.
    ///
    /// # Errors
    /// Returns `ReentrancyLimit` when nested deeper than `max_depth`.
    pub fn begin_batch(&self, label: impl Into<String>) -> HistoryResult<()> {
        let label = label.into();
        debug!(label = %label, depth = self.depth(), "batch opened");
        self.enter(&label, || label.clone())?;
        self.mark_batch_level();
        Ok(())
    }

    /// Close the innermost batch boundary. Returns true if a non-empty group
    /// was committed.
    ///
    /// # Errors
    /// Returns `NoOpenBatch` if no batch is open, or if a write opened
    /// after the batch is still in progress (a subscriber cannot close the
    /// write that is notifying it).
    pub fn end_batch(&self) -> HistoryResult<bool> {
        let Some(level) = self.innermost_batch_level() else {
            return Err(HistoryError::NoOpenBatch);
        };
        debug!(depth = level, "batch closed");
        self.unmark_batch_level(level);
        Ok(self.leave(0, true))
    }

    /// Scoped form of [`begin_batch`](History::begin_batch)
    pub fn batch(&self, label: impl Into<String>) -> HistoryResult<BatchGuard> {
        let label = label.into();
        debug!(label = %label, depth = self.depth(), "batch opened");
        let mark = self.enter(&label, || label.clone())?;
        let level = self.mark_batch_level();
        Ok(BatchGuard {
            history: self.clone(),
            mark,
            level,
            finished: false,
        })
    }

    /// Run `f` inside a batch. If `f` returns an error, everything it
    /// recorded is reverted and the error is returned.
    pub fn transact<R>(
        &self,
        label: impl Into<String>,
        f: impl FnOnce(&History) -> HistoryResult<R>,
    ) -> HistoryResult<R> {
        let guard = self.batch(label)?;
        match f(self) {
            Ok(value) => {
                guard.commit();
                Ok(value)
            }
            Err(err) => {
                guard.rollback();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_end_batch_without_begin() {
        let history = History::new();
        assert_eq!(history.end_batch(), Err(HistoryError::NoOpenBatch));
    }

    #[test]
    fn test_end_batch_cannot_close_running_write() {
        let history = History::new();
        let x = history.create_ref("x", 0);
        let resource = Rc::new(Cell::new(0));
        let outcome = Rc::new(RefCell::new(None));

        let inner = history.clone();
        let bound = Rc::clone(&resource);
        let seen = Rc::clone(&outcome);
        let _sub = x.subscribe(move |event| {
            *seen.borrow_mut() = Some(inner.end_batch());
            let bound = Rc::clone(&bound);
            let value = event.new_value;
            event.on_execute(move || {
                let previous = bound.replace(value);
                let bound = Rc::clone(&bound);
                Ok(move || bound.set(previous))
            })
        });

        x.set(1).unwrap();
        assert_eq!(*outcome.borrow(), Some(Err(HistoryError::NoOpenBatch)));
        assert_eq!(history.with_last_undo(|group| group.len()), Some(2));

        assert!(history.undo());
        assert_eq!((x.get(), resource.get()), (0, 0));
    }

    #[test]
    fn test_end_batch_hidden_by_write_inside_batch() {
        let history = History::new();
        let x = history.create_ref("x", 0);

        let inner = history.clone();
        let closed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&closed);
        let _sub = x.subscribe(move |_| {
            flag.set(inner.end_batch().is_ok());
            Ok(())
        });

        history.begin_batch("Outer").unwrap();
        x.set(1).unwrap();
        assert!(!closed.get());
        assert!(history.is_batching());
        assert_eq!(history.end_batch(), Ok(true));
        assert_eq!(history.undo_label().as_deref(), Some("Outer"));
    }

    #[test]
    fn test_batch_opened_by_subscriber_is_closed_by_it() {
        let history = History::new();
        let x = history.create_ref("x", 0);

        let inner = history.clone();
        let _sub = x.subscribe(move |_| {
            inner.begin_batch("Nested")?;
            inner.end_batch().map(|_| ())
        });

        x.set(1).unwrap();
        assert!(!history.is_batching());
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.undo_label().as_deref(), Some("Set x"));
    }

    #[test]
    fn test_empty_batch_is_elided() {
        let history = History::new();
        history.begin_batch("Nothing").unwrap();
        assert!(history.is_batching());
        assert_eq!(history.end_batch(), Ok(false));
        assert!(!history.is_batching());
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn test_nested_batches_commit_once() {
        let history = History::new();
        let x = history.create_ref("x", 0);

        history.begin_batch("Outer").unwrap();
        x.set(1).unwrap();
        history.begin_batch("Inner").unwrap();
        x.set(2).unwrap();
        assert_eq!(history.end_batch(), Ok(false));
        assert_eq!(history.undo_count(), 0);
        x.set(3).unwrap();
        assert_eq!(history.end_batch(), Ok(true));

        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.undo_label().as_deref(), Some("Outer"));
        assert!(history.undo());
        assert_eq!(x.get(), 0);
    }

    #[test]
    fn test_guard_commits_on_drop() {
        let history = History::new();
        let x = history.create_ref("x", 0);
        let y = history.create_ref("y", 0);

        {
            let _guard = history.batch("Both").unwrap();
            x.set(1).unwrap();
            y.set(2).unwrap();
        }

        assert_eq!(history.undo_count(), 1);
        history.undo();
        assert_eq!((x.get(), y.get()), (0, 0));
    }

    #[test]
    fn test_guard_rollback() {
        let history = History::new();
        let x = history.create_ref("x", 0);

        let guard = history.batch("Discarded").unwrap();
        x.set(5).unwrap();
        guard.rollback();

        assert_eq!(x.get(), 0);
        assert_eq!(history.undo_count(), 0);
    }

    #[test]
    fn test_transact_rolls_back_on_error() {
        let history = History::new();
        let x = history.create_ref("x", 1);
        let y = history.create_ref("y", 1);

        let result: HistoryResult<()> = history.transact("Fails", |_| {
            x.set(10)?;
            y.set(20)?;
            Err(HistoryError::side_effect("late failure"))
        });

        assert!(result.is_err());
        assert_eq!((x.get(), y.get()), (1, 1));
        assert_eq!(history.undo_count(), 0);
        assert!(!history.is_batching());
    }

    #[test]
    fn test_transact_returns_value() {
        let history = History::new();
        let x = history.create_ref("x", 1);

        let doubled = history
            .transact("Double", |_| {
                let value = x.get() * 2;
                x.set(value)?;
                Ok(value)
            })
            .unwrap();

        assert_eq!(doubled, 2);
        assert_eq!(history.undo_label().as_deref(), Some("Double"));
    }

    #[test]
    fn test_guard_rolls_back_on_panic() {
        let history = History::new();
        let x = history.create_ref("x", 0);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = history.batch("Panics").unwrap();
            x.set(9).unwrap();
            panic!("gesture aborted");
        }));

        assert!(result.is_err());
        assert_eq!(x.get(), 0);
        assert_eq!(history.undo_count(), 0);
        assert!(!history.is_batching());
    }
}
