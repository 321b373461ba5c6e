// Audio parameter bindings - UI-side refs driving audio-thread state
//
// Two ways of reaching the audio thread:
// - AtomicF32: lock-free shared float, read by the audio callback
// - ParameterSender: SetParameter messages pushed through the ringbuffer

use crate::binding::Bindable;
use crate::history::error::{HistoryError, HistoryResult};
use crate::messaging::channels::CommandProducer;
use crate::messaging::command::{Command, ParameterId};
use ringbuf::traits::Producer;
use std::cell::Cell;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Thread-safe f32 parameter using atomic operations
/// Converts f32 to u32 bits for atomic storage
#[derive(Clone)]
pub struct AtomicF32 {
    inner: Arc<AtomicU32>,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    /// Set the value (called from UI thread)
    pub fn set(&self, value: f32) {
        self.inner.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Get the value (called from audio thread)
    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Bindable<f32> for AtomicF32 {
    fn current(&self) -> f32 {
        self.get()
    }

    fn apply(&self, value: &f32) -> HistoryResult<()> {
        self.set(*value);
        Ok(())
    }

    fn label(&self) -> String {
        "atomic parameter".to_string()
    }
}

/// Sends parameter changes to the audio thread through the command ringbuffer
///
/// The audio thread owns the authoritative value, so the sender remembers the
/// last value it successfully sent and reports that as its current value.
pub struct ParameterSender {
    id: ParameterId,
    producer: Arc<Mutex<CommandProducer>>,
    last_sent: Cell<f32>,
}

impl ParameterSender {
    /// `initial` must match the value the audio thread starts with
    pub fn new(id: ParameterId, producer: Arc<Mutex<CommandProducer>>, initial: f32) -> Self {
        Self {
            id,
            producer,
            last_sent: Cell::new(initial),
        }
    }

    pub fn id(&self) -> ParameterId {
        self.id
    }

    /// Returns true if the message was sent, false if the ringbuffer is full
    fn send(&self, value: f32) -> bool {
        if let Ok(mut producer) = self.producer.lock() {
            producer
                .try_push(Command::SetParameter { id: self.id, value })
                .is_ok()
        } else {
            false
        }
    }
}

impl Bindable<f32> for ParameterSender {
    fn current(&self) -> f32 {
        self.last_sent.get()
    }

    fn apply(&self, value: &f32) -> HistoryResult<()> {
        if !self.send(*value) {
            return Err(HistoryError::side_effect(format!(
                "Failed to send parameter {} to audio thread (ringbuffer full)",
                self.id
            )));
        }
        self.last_sent.set(*value);
        Ok(())
    }

    fn label(&self) -> String {
        format!("parameter {}", self.id)
    }
}
