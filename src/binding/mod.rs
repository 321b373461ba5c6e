// Binding adapters - keep external resources in step with a ref
//
// A bound resource is updated inside the write that changed the ref, and the
// inverse restores the value the resource itself reported before the update
// (not a value re-derived from the ref), since the resource may hold state
// the ref does not know about.

pub mod parameters;

pub use parameters::{AtomicF32, ParameterSender};

use crate::history::error::HistoryResult;
use crate::observable::{ObservableRef, Subscription};
use std::rc::Rc;
use tracing::warn;

/// An external resource that can follow a ref
pub trait Bindable<T> {
    /// Value the resource currently holds
    fn current(&self) -> T;

    /// Push a value to the resource
    fn apply(&self, value: &T) -> HistoryResult<()>;

    /// Name used in logs
    fn label(&self) -> String {
        "resource".to_string()
    }
}

impl<T, R: Bindable<T> + ?Sized> Bindable<T> for Rc<R> {
    fn current(&self) -> T {
        (**self).current()
    }

    fn apply(&self, value: &T) -> HistoryResult<()> {
        (**self).apply(value)
    }

    fn label(&self) -> String {
        (**self).label()
    }
}

/// Bind `resource` to `source`: every write to `source` applies the new
/// value to the resource as part of the same undo step.
pub fn bind<T, R>(source: &ObservableRef<T>, resource: R) -> Subscription
where
    T: Clone + PartialEq + 'static,
    R: Bindable<T> + 'static,
{
    bind_map(source, resource, T::clone)
}

/// Like [`bind`], applying `map(&new_value)` to the resource
pub fn bind_map<T, U, R, M>(source: &ObservableRef<T>, resource: R, map: M) -> Subscription
where
    T: Clone + PartialEq + 'static,
    U: 'static,
    R: Bindable<U> + 'static,
    M: Fn(&T) -> U + 'static,
{
    let resource = Rc::new(resource);
    source.subscribe(move |event| {
        let resource = Rc::clone(&resource);
        let target = map(&event.new_value);
        event.on_execute(move || {
            let previous = <R as Bindable<U>>::current(&resource);
            <R as Bindable<U>>::apply(&resource, &target)?;
            let resource = Rc::clone(&resource);
            Ok(move || {
                if let Err(err) = <R as Bindable<U>>::apply(&resource, &previous) {
                    warn!(
                        resource = %<R as Bindable<U>>::label(&resource),
                        error = %err,
                        "failed to restore bound resource"
                    );
                }
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{History, HistoryError};
    use std::cell::{Cell, RefCell};

    /// Gain stage that also tracks how many times it was written
    struct Gain {
        value: Cell<f32>,
        writes: Cell<u32>,
    }

    impl Bindable<f32> for Gain {
        fn current(&self) -> f32 {
            self.value.get()
        }

        fn apply(&self, value: &f32) -> HistoryResult<()> {
            self.value.set(*value);
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_bind_follows_writes_and_undo() {
        let history = History::new();
        let volume = history.create_ref("volume", 0.5_f32);
        let gain = Rc::new(Gain {
            value: Cell::new(0.5),
            writes: Cell::new(0),
        });

        let _binding = bind(&volume, Rc::clone(&gain));

        volume.set(0.9).unwrap();
        assert_eq!(gain.value.get(), 0.9);

        history.undo();
        assert_eq!(gain.value.get(), 0.5);

        history.redo().unwrap();
        assert_eq!(gain.value.get(), 0.9);
        assert_eq!(gain.writes.get(), 3);
    }

    #[test]
    fn test_inverse_restores_resource_value_not_ref_value() {
        let history = History::new();
        let volume = history.create_ref("volume", 0.5_f32);
        // Resource starts out of sync with the ref
        let gain = Rc::new(Gain {
            value: Cell::new(0.1),
            writes: Cell::new(0),
        });
        let _binding = bind(&volume, Rc::clone(&gain));

        volume.set(0.7).unwrap();
        history.undo();

        assert_eq!(volume.get(), 0.5);
        assert_eq!(gain.value.get(), 0.1);
    }

    #[test]
    fn test_bind_map_converts_value() {
        let history = History::new();
        let decibels = history.create_ref("gain_db", 0.0_f32);
        let gain = Rc::new(Gain {
            value: Cell::new(1.0),
            writes: Cell::new(0),
        });

        let _binding = bind_map(&decibels, Rc::clone(&gain), |db| 10f32.powf(db / 20.0));

        decibels.set(-20.0).unwrap();
        assert!((gain.value.get() - 0.1).abs() < 1e-6);

        history.undo();
        assert_eq!(gain.value.get(), 1.0);
    }

    #[test]
    fn test_rejected_value_rolls_back_write() {
        struct Clamp(RefCell<f32>);

        impl Bindable<f32> for Clamp {
            fn current(&self) -> f32 {
                *self.0.borrow()
            }

            fn apply(&self, value: &f32) -> HistoryResult<()> {
                if !(0.0..=1.0).contains(value) {
                    return Err(HistoryError::side_effect(format!("{} out of range", value)));
                }
                *self.0.borrow_mut() = *value;
                Ok(())
            }
        }

        let history = History::new();
        let volume = history.create_ref("volume", 0.5_f32);
        let _binding = bind(&volume, Clamp(RefCell::new(0.5)));

        let result = volume.set(1.5);
        assert_eq!(result, Err(HistoryError::side_effect("1.5 out of range")));
        assert_eq!(volume.get(), 0.5);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_dispose_unbinds() {
        let history = History::new();
        let volume = history.create_ref("volume", 0.5_f32);
        let gain = Rc::new(Gain {
            value: Cell::new(0.5),
            writes: Cell::new(0),
        });

        let binding = bind(&volume, Rc::clone(&gain));
        binding.dispose();
        volume.set(0.2).unwrap();

        assert_eq!(gain.value.get(), 0.5);
        assert_eq!(gain.writes.get(), 0);
    }
}
