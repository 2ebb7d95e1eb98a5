// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Commitment-Binding Mock Backend
//!
//! A deterministic stand-in for a real proof system, used in development and
//! tests. A "proof" binds the verifying key, input commitment and output digest
//! under a domain-separated tag:
//!
//! ```text
//! MAGIC(4) || vk_hash(32) || input_commitment(32) || output_digest(32) || tag(32)
//! tag = keccak256(MOCK_PROOF_DOMAIN || vk_hash || input_commitment || output_digest)
//! ```
//!
//! It proves nothing about the computation itself, but it distinguishes every
//! rejection reason, which makes it useful for exercising the verifier.

use ethers::types::H256;
use tracing::debug;

use super::dispatch::{ProofBackend, RejectReason, Verdict};
use super::types::{InputCommitment, Output};
use crate::crypto::hashing::{DomainHasher, MOCK_PROOF_DOMAIN};

/// Proof header marker
pub const MOCK_PROOF_MAGIC: [u8; 4] = *b"FBMK";

/// Exact length of a well-formed mock proof
pub const MOCK_PROOF_LEN: usize = 4 + 32 * 4;

/// Canonical proof-system name the mock backend is usually registered under
pub const MOCK_PROOF_SYSTEM_NAME: &str = "mock-binding-v1";

#[derive(Debug, Clone)]
pub struct CommitmentBindingBackend {
    name: String,
}

impl Default for CommitmentBindingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitmentBindingBackend {
    pub fn new() -> Self {
        Self {
            name: MOCK_PROOF_SYSTEM_NAME.to_string(),
        }
    }

    /// Same behaviour under a different display name
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Produce a proof that this backend accepts for exactly these values
    pub fn prove(vk_hash: &H256, input_commitment: &InputCommitment, output: &Output) -> Vec<u8> {
        let output_digest = output.digest();
        let tag = Self::binding_tag(
            vk_hash.as_bytes(),
            input_commitment.as_bytes(),
            output_digest.as_bytes(),
        );

        let mut proof = Vec::with_capacity(MOCK_PROOF_LEN);
        proof.extend_from_slice(&MOCK_PROOF_MAGIC);
        proof.extend_from_slice(vk_hash.as_bytes());
        proof.extend_from_slice(input_commitment.as_bytes());
        proof.extend_from_slice(output_digest.as_bytes());
        proof.extend_from_slice(&tag);
        proof
    }

    fn binding_tag(vk: &[u8], input: &[u8], output_digest: &[u8]) -> [u8; 32] {
        let mut hasher = DomainHasher::new(MOCK_PROOF_DOMAIN);
        hasher.update(vk).update(input).update(output_digest);
        hasher.finalize()
    }
}

impl ProofBackend for CommitmentBindingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn verify(
        &self,
        vk_hash: &H256,
        input_commitment: &InputCommitment,
        output: &Output,
        proof: &[u8],
    ) -> Verdict {
        if proof.len() != MOCK_PROOF_LEN {
            debug!("❌ Mock proof has wrong length: {} bytes", proof.len());
            return Verdict::Rejected(RejectReason::InvalidProof);
        }
        if proof[0..4] != MOCK_PROOF_MAGIC {
            debug!("❌ Mock proof missing marker");
            return Verdict::Rejected(RejectReason::InvalidProof);
        }

        let proof_vk = &proof[4..36];
        let proof_input = &proof[36..68];
        let proof_output = &proof[68..100];
        let tag = &proof[100..132];

        if tag != Self::binding_tag(proof_vk, proof_input, proof_output) {
            debug!("❌ Mock proof binding tag does not verify");
            return Verdict::Rejected(RejectReason::InvalidProof);
        }
        if proof_vk != vk_hash.as_bytes() {
            debug!("❌ Verifying key mismatch");
            return Verdict::Rejected(RejectReason::ModelMismatch);
        }
        if proof_input != input_commitment.as_bytes() {
            debug!("❌ Input commitment mismatch");
            return Verdict::Rejected(RejectReason::InputCommitmentMismatch);
        }
        if proof_output != output.digest().as_bytes() {
            debug!("❌ Output mismatch");
            return Verdict::Rejected(RejectReason::OutputMismatch);
        }

        debug!("✅ Mock proof verified");
        Verdict::Accepted
    }
}
