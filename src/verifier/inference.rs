// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference Verifier
//!
//! Checks a submitted `(model, input commitment, output, proof)` against the
//! model's registered commitment:
//!
//! 1. load the model (`ModelNotFound`)
//! 2. refuse deprecated models
//! 3. resolve the backend for the commitment's proof system
//! 4. enforce size limits
//! 5. run the backend and map its verdict
//! 6. emit `InferenceVerified`
//!
//! The verifier keeps no per-call state, so one instance can be shared across
//! threads. Each call reads one consistent registry snapshot.

use ethers::types::Address;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::dispatch::{DispatchTable, Verdict};
use super::error::VerifierError;
use super::metrics::VerificationMetrics;
use super::types::{InputCommitment, Output};
use crate::config::VerifierConfig;
use crate::crypto::ProofSystemId;
use crate::events::{Event, EventQueue, EventSink};
use crate::registry::{CommitmentRegistry, ModelId};

/// Size limits enforced before a backend is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationLimits {
    pub max_proof_size: usize,
    pub max_output_size: usize,
}

impl Default for VerificationLimits {
    fn default() -> Self {
        let config = VerifierConfig::default();
        Self::from(&config)
    }
}

impl From<&VerifierConfig> for VerificationLimits {
    fn from(config: &VerifierConfig) -> Self {
        Self {
            max_proof_size: config.max_proof_size,
            max_output_size: config.max_output_size,
        }
    }
}

pub struct InferenceVerifier {
    registry: Arc<CommitmentRegistry>,
    dispatch: Arc<DispatchTable>,
    events: EventQueue,
    limits: VerificationLimits,
    metrics: VerificationMetrics,
}

impl InferenceVerifier {
    pub fn new(
        registry: Arc<CommitmentRegistry>,
        dispatch: Arc<DispatchTable>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            registry,
            dispatch,
            events: EventQueue::new(events),
            limits: VerificationLimits::default(),
            metrics: VerificationMetrics::new(),
        }
    }

    pub fn from_config(
        config: &VerifierConfig,
        registry: Arc<CommitmentRegistry>,
        dispatch: Arc<DispatchTable>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self::new(registry, dispatch, events).with_limits(VerificationLimits::from(config))
    }

    pub fn with_limits(mut self, limits: VerificationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &Arc<CommitmentRegistry> {
        &self.registry
    }

    pub fn dispatch_table(&self) -> &Arc<DispatchTable> {
        &self.dispatch
    }

    pub fn limits(&self) -> VerificationLimits {
        self.limits
    }

    pub fn metrics(&self) -> &VerificationMetrics {
        &self.metrics
    }

    pub(crate) fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Proof system the model's current commitment is bound to
    pub fn proof_system_of(&self, model_id: ModelId) -> Result<ProofSystemId, VerifierError> {
        Ok(self.registry.get_model(model_id)?.commitment.proof_system_id)
    }

    /// Verify an inference and emit `InferenceVerified` on success.
    /// Success carries no payload; any failure is a specific error.
    pub fn verify_inference(
        &self,
        caller: Address,
        model_id: ModelId,
        input_commitment: InputCommitment,
        output: &Output,
        proof: &[u8],
    ) -> Result<(), VerifierError> {
        self.check_inference(model_id, &input_commitment, output, proof)?;
        self.events
            .emit_now(self.verified_event(caller, model_id, input_commitment, output));
        Ok(())
    }

    /// Steps 1-5 of the protocol, without emitting anything
    pub(crate) fn check_inference(
        &self,
        model_id: ModelId,
        input_commitment: &InputCommitment,
        output: &Output,
        proof: &[u8],
    ) -> Result<(), VerifierError> {
        self.metrics.record_attempt();
        let result = self.run_checks(model_id, input_commitment, output, proof);
        match &result {
            Ok(()) => self.metrics.record_accepted(),
            Err(e) => {
                warn!("❌ Inference for model {} rejected: {}", model_id, e);
                self.metrics.record_rejected(e);
            }
        }
        result
    }

    fn run_checks(
        &self,
        model_id: ModelId,
        input_commitment: &InputCommitment,
        output: &Output,
        proof: &[u8],
    ) -> Result<(), VerifierError> {
        let model = self.registry.get_model(model_id)?;

        if model.deprecated {
            return Err(VerifierError::ModelDeprecated { model_id });
        }

        let backend = self.dispatch.resolve(model.commitment.proof_system_id)?;

        if proof.len() > self.limits.max_proof_size {
            return Err(VerifierError::ProofTooLarge {
                size: proof.len(),
                max: self.limits.max_proof_size,
            });
        }
        if output.len() > self.limits.max_output_size {
            return Err(VerifierError::OutputTooLarge {
                size: output.len(),
                max: self.limits.max_output_size,
            });
        }

        debug!(
            "🔍 Dispatching model {} to backend '{}' ({})",
            model_id,
            backend.name(),
            model.commitment.proof_system_id
        );

        match backend.verify(&model.commitment.vk_hash, input_commitment, output, proof) {
            Verdict::Accepted => Ok(()),
            Verdict::Rejected(reason) => Err(VerifierError::from_rejection(model_id, reason)),
        }
    }

    pub(crate) fn verified_event(
        &self,
        caller: Address,
        model_id: ModelId,
        input_commitment: InputCommitment,
        output: &Output,
    ) -> Event {
        info!("✅ Inference verified for model {} (caller {:?})", model_id, caller);
        Event::InferenceVerified {
            model_id,
            input_commitment,
            output: output.clone(),
            caller,
        }
    }
}
