// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference Data Types
//!
//! Input commitments, outputs and inference records.
//!
//! ```ignore
//! let nonce = random_nonce();
//! let input = InputCommitment::with_nonce(b"public", b"private", &nonce);
//! let output = Output::new("application/json", br#"{"label":"cat"}"#.to_vec());
//! let inference_id = InferenceId::derive(model_id, &input, &output);
//! ```

use chrono::{DateTime, Utc};
use ethers::types::H256;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::hashing::{DomainHasher, INFERENCE_ID_DOMAIN, INPUT_COMMITMENT_DOMAIN, OUTPUT_DOMAIN};
use crate::registry::ModelId;

/// Digest binding every input of one inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputCommitment(pub H256);

impl InputCommitment {
    /// Deterministic commitment with no nonce. Only appropriate when the
    /// computation is deterministic and may legitimately be repeated.
    pub fn commit(public_inputs: &[u8], private_inputs: &[u8]) -> Self {
        let mut hasher = DomainHasher::new(INPUT_COMMITMENT_DOMAIN);
        hasher
            .update_prefixed(public_inputs)
            .update_prefixed(private_inputs)
            .update(&[0u8]);
        Self(H256::from(hasher.finalize()))
    }

    /// Commitment salted with a per-inference nonce, making it single-use
    pub fn with_nonce(public_inputs: &[u8], private_inputs: &[u8], nonce: &[u8; 32]) -> Self {
        let mut hasher = DomainHasher::new(INPUT_COMMITMENT_DOMAIN);
        hasher
            .update_prefixed(public_inputs)
            .update_prefixed(private_inputs)
            .update(&[1u8])
            .update(nonce);
        Self(H256::from(hasher.finalize()))
    }

    pub fn from_digest(digest: H256) -> Self {
        Self(digest)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_fixed_bytes()
    }
}

/// Fresh random nonce for [`InputCommitment::with_nonce`]
pub fn random_nonce() -> [u8; 32] {
    rand::random()
}

/// Opaque, schema-tagged inference output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Output {
    pub schema: String,
    pub bytes: Vec<u8>,
}

impl Output {
    pub fn new(schema: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            schema: schema.into(),
            bytes,
        }
    }

    /// Digest binding schema and bytes
    pub fn digest(&self) -> H256 {
        let mut hasher = DomainHasher::new(OUTPUT_DOMAIN);
        hasher
            .update_prefixed(self.schema.as_bytes())
            .update_prefixed(&self.bytes);
        H256::from(hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// `keccak256(INFERENCE_ID_DOMAIN || model_id || input_commitment || output_digest)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceId(pub H256);

impl InferenceId {
    pub fn derive(model_id: ModelId, input_commitment: &InputCommitment, output: &Output) -> Self {
        let mut hasher = DomainHasher::new(INFERENCE_ID_DOMAIN);
        hasher
            .update(&model_id.0.to_be_bytes())
            .update(input_commitment.as_bytes())
            .update(output.digest().as_bytes());
        Self(H256::from(hasher.finalize()))
    }
}

impl fmt::Display for InferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

/// Receipt of one accepted inference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRecord {
    pub inference_id: InferenceId,
    pub model_id: ModelId,
    pub input_commitment: InputCommitment,
    pub output: Output,
    pub stored_at: DateTime<Utc>,
}
