// Subscriber lists and disposable handles

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by `subscribe`
///
/// Call [`dispose`](Subscription::dispose) to remove the handler. Dropping the
/// handle without disposing it keeps the handler installed for the lifetime
/// of the observed object.
pub struct Subscription {
    remover: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(remover: impl FnOnce() + 'static) -> Self {
        Self {
            remover: Some(Box::new(remover)),
        }
    }

    /// Remove the handler. Safe to call from inside a notification; the
    /// in-flight notification still reaches the handler.
    pub fn dispose(mut self) {
        if let Some(remover) = self.remover.take() {
            remover();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.remover.is_some())
            .finish()
    }
}

/// Ordered handler list with stable ids
///
/// No borrow is held while handlers run: callers take a [`snapshot`] and
/// invoke that, so handlers may subscribe or dispose reentrantly.
///
/// [`snapshot`]: Subscribers::snapshot
pub(crate) struct Subscribers<H: ?Sized> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Rc<H>)>>,
}

impl<H: ?Sized> Subscribers<H> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn insert(&self, handler: Rc<H>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, handler));
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let index = entries.iter().position(|(entry_id, _)| *entry_id == id);
            index.map(|index| entries.remove(index))
        };
        removed.is_some()
    }

    pub(crate) fn snapshot(&self) -> Vec<Rc<H>> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_keeps_order() {
        let list: Subscribers<dyn Fn() -> u32> = Subscribers::new();
        let a = list.insert(Rc::new(|| 1));
        let _b = list.insert(Rc::new(|| 2));
        let _c = list.insert(Rc::new(|| 3));

        assert!(list.remove(a));
        assert!(!list.remove(a));

        let values: Vec<u32> = list.snapshot().iter().map(|h| h()).collect();
        assert_eq!(values, vec![2, 3]);
    }

    #[test]
    fn test_dispose_runs_remover_once() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = Subscription::new(move || counter.set(counter.get() + 1));
        subscription.dispose();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_drop_keeps_handler() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        drop(Subscription::new(move || counter.set(counter.get() + 1)));
        assert_eq!(hits.get(), 0);
    }
}
