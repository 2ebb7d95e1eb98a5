// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Audit Events
//!
//! Events are the registry's and verifier's only outward signal. They are
//! handed to an [`EventSink`]; indexers, tests and logs plug in their own sink.

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError, TryLockError};
use tracing::info;

use crate::registry::{ModelCommitment, ModelId};
use crate::verifier::{InferenceId, InputCommitment, Output};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    ModelRegistered {
        model_id: ModelId,
        owner: Address,
        commitment: ModelCommitment,
    },
    ModelUpdated {
        model_id: ModelId,
        old: ModelCommitment,
        new: ModelCommitment,
    },
    ModelDeprecated {
        model_id: ModelId,
    },
    InferenceVerified {
        model_id: ModelId,
        input_commitment: InputCommitment,
        output: Output,
        caller: Address,
    },
    InferenceStored {
        inference_id: InferenceId,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModelRegistered { .. } => "ModelRegistered",
            Self::ModelUpdated { .. } => "ModelUpdated",
            Self::ModelDeprecated { .. } => "ModelDeprecated",
            Self::InferenceVerified { .. } => "InferenceVerified",
            Self::InferenceStored { .. } => "InferenceStored",
        }
    }
}

/// Receiver of emitted events
///
/// The registry and the store never hold their state locks while calling
/// `emit`, so a sink may read back through their public API.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// In-memory event log, in emission order
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<Event>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Snapshot of all events emitted so far
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events with the given name
    pub fn count_of(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|e| e.name() == name)
            .count()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(
            &mut *self
                .events
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl EventSink for MemoryEventLog {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Writes every event as a structured `tracing` record
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: Event) {
        let payload = serde_json::to_string(&event).unwrap_or_else(|e| format!("<unserializable: {e}>"));
        info!(event = event.name(), %payload, "📣 event emitted");
    }
}

/// Forwards every event to several sinks, in order
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

/// Hands events to a sink in the order they were queued, outside the
/// emitter's state lock.
///
/// Emitters `enqueue` while holding their lock (so queue order is mutation
/// order), release it, then `flush`. Only one thread delivers at a time; a
/// thread that finds delivery in progress leaves its events to that thread.
/// A sink that re-enters the emitter queues behind the event being delivered.
pub struct EventQueue {
    sink: Arc<dyn EventSink>,
    pending: Mutex<VecDeque<Event>>,
    delivering: Mutex<()>,
}

impl EventQueue {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            pending: Mutex::new(VecDeque::new()),
            delivering: Mutex::new(()),
        }
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    pub fn enqueue(&self, event: Event) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event);
    }

    fn pop(&self) -> Option<Event> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    fn has_pending(&self) -> bool {
        !self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Deliver queued events unless another thread already is
    pub fn flush(&self) {
        loop {
            let turn = match self.delivering.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            while let Some(event) = self.pop() {
                self.sink.emit(event);
            }
            drop(turn);

            // an event queued while we held the turn may have been left to us
            if !self.has_pending() {
                return;
            }
        }
    }

    /// Queue and deliver one event; for emitters holding no lock
    pub fn emit_now(&self, event: Event) {
        self.enqueue(event);
        self.flush();
    }
}
