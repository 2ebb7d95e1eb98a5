// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use ethers::types::{Address, H256};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::RegistryError;
use crate::crypto::ProofSystemId;

/// Registry-assigned model identifier (monotonic, starts at 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub u64);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commitment bundle identifying a model and how its proofs are checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCommitment {
    /// Digest of weights and architecture
    pub model_hash: H256,
    /// Digest of the verification circuit
    pub circuit_hash: H256,
    /// Digest of the verifying key
    pub vk_hash: H256,
    /// Backend selector
    pub proof_system_id: ProofSystemId,
    /// Off-path metadata pointer, not trust-bearing
    pub uri: Option<String>,
}

impl ModelCommitment {
    pub fn new(
        model_hash: H256,
        circuit_hash: H256,
        vk_hash: H256,
        proof_system_id: ProofSystemId,
    ) -> Self {
        Self {
            model_hash,
            circuit_hash,
            vk_hash,
            proof_system_id,
            uri: None,
        }
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Reject commitments with a missing (all-zero) required field
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.model_hash.is_zero() {
            return Err(RegistryError::malformed("model_hash"));
        }
        if self.circuit_hash.is_zero() {
            return Err(RegistryError::malformed("circuit_hash"));
        }
        if self.vk_hash.is_zero() {
            return Err(RegistryError::malformed("vk_hash"));
        }
        if self.proof_system_id.is_zero() {
            return Err(RegistryError::malformed("proof_system_id"));
        }
        Ok(())
    }
}

/// Stored model entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: ModelId,
    pub commitment: ModelCommitment,
    pub owner: Address,
    pub deprecated: bool,
    /// 1 on registration, incremented by every update
    pub version: u32,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-only view returned by `get_model`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelView {
    pub commitment: ModelCommitment,
    pub deprecated: bool,
    pub owner: Address,
}

impl From<&ModelRecord> for ModelView {
    fn from(record: &ModelRecord) -> Self {
        Self {
            commitment: record.commitment.clone(),
            deprecated: record.deprecated,
            owner: record.owner,
        }
    }
}
