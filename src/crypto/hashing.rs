// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Domain-Separated Keccak-256 Hashing
//!
//! Every digest derived by this crate starts with a fixed domain tag, so a
//! value committed in one context can never be reinterpreted as a value from
//! another context (an input commitment can never collide with an inference
//! id, a mock proof tag, and so on).
//!
//! Variable-length fields are written with a big-endian `u64` length prefix
//! so that adjacent fields cannot be shifted into each other.

use tiny_keccak::{Hasher, Keccak};

/// Domain tag for proof-system identifiers
pub const PROOF_SYSTEM_DOMAIN: &[u8] = b"fabstir.proof-system.v1";

/// Domain tag for inference input commitments
pub const INPUT_COMMITMENT_DOMAIN: &[u8] = b"fabstir.input-commitment.v1";

/// Domain tag for output digests
pub const OUTPUT_DOMAIN: &[u8] = b"fabstir.output.v1";

/// Domain tag for inference record identifiers
pub const INFERENCE_ID_DOMAIN: &[u8] = b"fabstir.inference-id.v1";

/// Domain tag for the binding tag of mock proofs
pub const MOCK_PROOF_DOMAIN: &[u8] = b"fabstir.mock-proof.v1";

/// Plain Keccak-256 (no domain tag). Used for operation selectors, which
/// follow the Ethereum function-selector convention.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Incremental Keccak-256 hasher seeded with a domain tag
pub struct DomainHasher {
    inner: Keccak,
}

impl DomainHasher {
    /// Start a new digest in the given domain
    pub fn new(domain: &[u8]) -> Self {
        let mut inner = Keccak::v256();
        inner.update(domain);
        Self { inner }
    }

    /// Append raw fixed-width bytes
    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        self.inner.update(bytes);
        self
    }

    /// Append variable-length bytes with a length prefix
    pub fn update_prefixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.inner.update(&(bytes.len() as u64).to_be_bytes());
        self.inner.update(bytes);
        self
    }

    /// Finish and return the 32-byte digest
    pub fn finalize(self) -> [u8; 32] {
        let mut output = [0u8; 32];
        self.inner.finalize(&mut output);
        output
    }
}
