// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference Record Store
//!
//! Persists accepted inferences under `InferenceId::derive(model, input, output)`.
//! The id is deterministic, so resubmitting the same triple lands on the
//! same record: the second call returns the same id, leaves the record
//! untouched and emits no `InferenceStored`. That collision is the only
//! built-in replay signal; real replay prevention needs single-use input
//! commitments (see `InputCommitment::with_nonce`).
//!
//! Storing is two steps. `prepare_inference` verifies without side effects
//! beyond metrics; `commit_inference` persists and emits. Inside a pipeline
//! body, prepare in the body and hand the commit to `Journal::defer`, so an
//! aborted invocation leaves neither a record nor an event behind:
//!
//! ```ignore
//! pipeline.invoke(&mut ledger, &invocation, |ledger, inv, journal| {
//!     let pending = store.prepare_inference(inv.caller, model_id, input, &output, &proof)?;
//!     let id = pending.inference_id();
//!     journal.defer(move || {
//!         store.commit_inference(pending);
//!     });
//!     Ok(id)
//! })?;
//! ```

use chrono::Utc;
use ethers::types::Address;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use super::error::VerifierError;
use super::inference::InferenceVerifier;
use super::types::{InferenceId, InferenceRecord, InputCommitment, Output};
use crate::config::VerifierConfig;
use crate::events::Event;
use crate::registry::ModelId;

/// A verified inference that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "nothing is stored until the inference is committed"]
pub struct PendingInference {
    caller: Address,
    model_id: ModelId,
    input_commitment: InputCommitment,
    output: Output,
}

impl PendingInference {
    pub fn inference_id(&self) -> InferenceId {
        InferenceId::derive(self.model_id, &self.input_commitment, &self.output)
    }

    pub fn model_id(&self) -> ModelId {
        self.model_id
    }
}

pub struct InferenceStore {
    verifier: Arc<InferenceVerifier>,
    records: RwLock<HashMap<InferenceId, InferenceRecord>>,
    enabled: bool,
}

impl InferenceStore {
    pub fn new(verifier: Arc<InferenceVerifier>) -> Self {
        Self {
            verifier,
            records: RwLock::new(HashMap::new()),
            enabled: true,
        }
    }

    pub fn from_config(config: &VerifierConfig, verifier: Arc<InferenceVerifier>) -> Self {
        let mut store = Self::new(verifier);
        store.enabled = config.store_inferences;
        store
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn verifier(&self) -> &Arc<InferenceVerifier> {
        &self.verifier
    }

    /// Run the full verifier protocol, then persist the triple.
    /// Fails exactly like `verify_inference` when verification fails.
    ///
    /// Takes effect immediately; inside a pipeline body use
    /// `prepare_inference` and defer `commit_inference` instead.
    pub fn verify_and_store_inference(
        &self,
        caller: Address,
        model_id: ModelId,
        input_commitment: InputCommitment,
        output: &Output,
        proof: &[u8],
    ) -> Result<InferenceId, VerifierError> {
        let pending = self.prepare_inference(caller, model_id, input_commitment, output, proof)?;
        Ok(self.commit_inference(pending))
    }

    /// Verify an inference for storage without persisting or emitting anything
    pub fn prepare_inference(
        &self,
        caller: Address,
        model_id: ModelId,
        input_commitment: InputCommitment,
        output: &Output,
        proof: &[u8],
    ) -> Result<PendingInference, VerifierError> {
        if !self.enabled {
            return Err(VerifierError::StoreDisabled);
        }

        self.verifier
            .check_inference(model_id, &input_commitment, output, proof)?;

        Ok(PendingInference {
            caller,
            model_id,
            input_commitment,
            output: output.clone(),
        })
    }

    /// Persist a prepared inference and emit its events.
    ///
    /// Cannot fail: a poisoned record map is recovered, since a panic while
    /// holding it leaves at worst a fully inserted record behind.
    pub fn commit_inference(&self, pending: PendingInference) -> InferenceId {
        let inference_id = pending.inference_id();
        let PendingInference {
            caller,
            model_id,
            input_commitment,
            output,
        } = pending;
        let events = self.verifier.events();

        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        events.enqueue(
            self.verifier
                .verified_event(caller, model_id, input_commitment, &output),
        );

        if records.contains_key(&inference_id) {
            debug!("🔁 Inference {} already stored", inference_id);
            self.verifier.metrics().record_replay();
        } else {
            records.insert(
                inference_id,
                InferenceRecord {
                    inference_id,
                    model_id,
                    input_commitment,
                    output,
                    stored_at: Utc::now(),
                },
            );
            self.verifier.metrics().record_stored();

            info!("💾 Stored inference {} for model {}", inference_id, model_id);
            events.enqueue(Event::InferenceStored { inference_id });
        }

        drop(records);
        events.flush();
        inference_id
    }

    pub fn get_inference(&self, inference_id: InferenceId) -> Result<InferenceRecord, VerifierError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records
            .get(&inference_id)
            .cloned()
            .ok_or(VerifierError::InferenceNotFound { inference_id })
    }

    /// Whether a record exists; lets callers spot a replay before submitting
    pub fn contains_inference(&self, inference_id: InferenceId) -> bool {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&inference_id)
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
