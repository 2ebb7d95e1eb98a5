// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures for integration tests
#![allow(dead_code)]

use ethers::types::{Address, H160, H256};
use fabstir_model_verifier::events::MemoryEventLog;
use fabstir_model_verifier::registry::{CommitmentRegistry, ModelCommitment, ModelId};
use fabstir_model_verifier::verifier::{
    CommitmentBindingBackend, DispatchTable, InferenceStore, InferenceVerifier, InputCommitment,
    Output, MOCK_PROOF_SYSTEM_NAME,
};
use fabstir_model_verifier::ProofSystemId;
use std::sync::Arc;

pub const OWNER: Address = H160([0x0A; 20]);
pub const OTHER: Address = H160([0x0B; 20]);
pub const CLIENT: Address = H160([0x0C; 20]);

pub fn mock_system() -> ProofSystemId {
    ProofSystemId::from_name(MOCK_PROOF_SYSTEM_NAME).unwrap()
}

/// Commitment with every field derived from `seed`
pub fn commitment(seed: u8, proof_system_id: ProofSystemId) -> ModelCommitment {
    ModelCommitment::new(
        H256::repeat_byte(seed),
        H256::repeat_byte(seed.wrapping_add(1)),
        H256::repeat_byte(seed.wrapping_add(2)),
        proof_system_id,
    )
}

pub fn sample_inference(tag: &[u8]) -> (InputCommitment, Output) {
    (
        InputCommitment::commit(b"public inputs", tag),
        Output::new("application/json", br#"{"label":"cat"}"#.to_vec()),
    )
}

/// Registry, dispatch table, verifier and store sharing one event log
pub struct Harness {
    pub log: Arc<MemoryEventLog>,
    pub registry: Arc<CommitmentRegistry>,
    pub dispatch: Arc<DispatchTable>,
    pub verifier: Arc<InferenceVerifier>,
    pub store: InferenceStore,
}

impl Harness {
    /// Mock backend registered under its own canonical name
    pub fn new() -> Self {
        Self::with_system(mock_system())
    }

    /// Mock backend registered under an arbitrary proof-system id
    pub fn with_system(system: ProofSystemId) -> Self {
        let log = MemoryEventLog::shared();
        let registry = Arc::new(CommitmentRegistry::new(log.clone()));
        let dispatch = Arc::new(
            DispatchTable::new()
                .with_backend(system, Arc::new(CommitmentBindingBackend::new()))
                .unwrap(),
        );
        let verifier = Arc::new(InferenceVerifier::new(
            registry.clone(),
            dispatch.clone(),
            log.clone(),
        ));
        let store = InferenceStore::new(verifier.clone());
        Self {
            log,
            registry,
            dispatch,
            verifier,
            store,
        }
    }

    /// Register a model bound to `system`; returns its id and vk hash
    pub fn register(&self, owner: Address, seed: u8, system: ProofSystemId) -> (ModelId, H256) {
        let commitment = commitment(seed, system);
        let vk = commitment.vk_hash;
        let id = self.registry.register_model(owner, commitment).unwrap();
        (id, vk)
    }

    pub fn register_mock(&self, owner: Address) -> (ModelId, H256) {
        self.register(owner, 0x10, mock_system())
    }
}
