// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Proof-System Dispatch Table
//!
//! Maps a [`ProofSystemId`] to the backend able to check proofs of that
//! system. Backends are pure predicates: they share no mutable state, so
//! unrelated verifications can run in parallel and each backend can be
//! audited on its own. An unknown id is always an error, never a silent
//! accept.

use ethers::types::H256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

use super::error::VerifierError;
use super::types::{InputCommitment, Output};
use crate::crypto::ProofSystemId;

/// Why a backend rejected a proof
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// Proof is malformed or does not verify (the coarse default)
    InvalidProof,
    /// Proof was produced against a different verifying key
    ModelMismatch,
    /// Proof is bound to a different input commitment
    InputCommitmentMismatch,
    /// Proof is bound to a different output
    OutputMismatch,
}

/// Backend decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    /// For backends that can only answer yes or no
    pub fn from_bool(valid: bool) -> Self {
        if valid {
            Self::Accepted
        } else {
            Self::Rejected(RejectReason::InvalidProof)
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Verification capability of one proof system
pub trait ProofBackend: Send + Sync {
    /// Human-readable backend name, for logs
    fn name(&self) -> &str;

    fn verify(
        &self,
        vk_hash: &H256,
        input_commitment: &InputCommitment,
        output: &Output,
        proof: &[u8],
    ) -> Verdict;
}

#[derive(Default)]
pub struct DispatchTable {
    backends: RwLock<HashMap<ProofSystemId, Arc<dyn ProofBackend>>>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend. An existing registration must be removed first.
    pub fn register_backend(
        &self,
        proof_system_id: ProofSystemId,
        backend: Arc<dyn ProofBackend>,
    ) -> Result<(), VerifierError> {
        let mut backends = self
            .backends
            .write()
            .map_err(|_| VerifierError::LockPoisoned)?;

        if backends.contains_key(&proof_system_id) {
            return Err(VerifierError::BackendAlreadyRegistered { proof_system_id });
        }

        info!(
            "🔌 Registered proof backend '{}' for {}",
            backend.name(),
            proof_system_id
        );
        backends.insert(proof_system_id, backend);
        Ok(())
    }

    /// Builder-style registration, for wiring at startup
    pub fn with_backend(
        self,
        proof_system_id: ProofSystemId,
        backend: Arc<dyn ProofBackend>,
    ) -> Result<Self, VerifierError> {
        self.register_backend(proof_system_id, backend)?;
        Ok(self)
    }

    /// Remove a backend, returning it if one was registered
    pub fn remove_backend(
        &self,
        proof_system_id: ProofSystemId,
    ) -> Result<Option<Arc<dyn ProofBackend>>, VerifierError> {
        let mut backends = self
            .backends
            .write()
            .map_err(|_| VerifierError::LockPoisoned)?;
        let removed = backends.remove(&proof_system_id);
        if removed.is_some() {
            info!("🔌 Removed proof backend for {}", proof_system_id);
        }
        Ok(removed)
    }

    pub fn resolve(&self, proof_system_id: ProofSystemId) -> Result<Arc<dyn ProofBackend>, VerifierError> {
        let backends = self
            .backends
            .read()
            .map_err(|_| VerifierError::LockPoisoned)?;
        backends
            .get(&proof_system_id)
            .cloned()
            .ok_or(VerifierError::UnsupportedProofSystem { proof_system_id })
    }

    pub fn is_supported(&self, proof_system_id: ProofSystemId) -> bool {
        self.backends
            .read()
            .map(|backends| backends.contains_key(&proof_system_id))
            .unwrap_or(false)
    }

    /// Registered proof systems, sorted
    pub fn supported_systems(&self) -> Vec<ProofSystemId> {
        let mut ids: Vec<ProofSystemId> = self
            .backends
            .read()
            .map(|backends| backends.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}
