// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Proof Verification
//!
//! ## Module Structure
//!
//! - `types`: input commitments, outputs, inference ids and records
//! - `dispatch`: `ProofBackend` trait and the proof-system dispatch table
//! - `mock_backend`: deterministic commitment-binding backend for development
//! - `inference`: the stateless `InferenceVerifier`
//! - `store`: optional inference record store (idempotent receipts, staged commits)
//! - `metrics`: verification counters
//! - `error`: verification error taxonomy

pub mod dispatch;
pub mod error;
pub mod inference;
pub mod metrics;
pub mod mock_backend;
pub mod store;
pub mod types;

pub use dispatch::{DispatchTable, ProofBackend, RejectReason, Verdict};
pub use error::VerifierError;
pub use inference::{InferenceVerifier, VerificationLimits};
pub use metrics::{MetricsSnapshot, VerificationMetrics};
pub use mock_backend::{CommitmentBindingBackend, MOCK_PROOF_SYSTEM_NAME};
pub use store::{InferenceStore, PendingInference};
pub use types::{random_nonce, InferenceId, InferenceRecord, InputCommitment, Output};
