// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Verification Metrics
//!
//! Lock-free counters for verification outcomes.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::error::VerifierError;

#[derive(Debug, Clone, Default)]
pub struct VerificationMetrics {
    attempts: Arc<AtomicU64>,
    accepted: Arc<AtomicU64>,
    rejected_not_found: Arc<AtomicU64>,
    rejected_deprecated: Arc<AtomicU64>,
    rejected_unsupported: Arc<AtomicU64>,
    rejected_proof: Arc<AtomicU64>,
    rejected_other: Arc<AtomicU64>,
    stored: Arc<AtomicU64>,
    replays: Arc<AtomicU64>,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub accepted: u64,
    pub rejected_not_found: u64,
    pub rejected_deprecated: u64,
    pub rejected_unsupported: u64,
    pub rejected_proof: u64,
    pub rejected_other: u64,
    pub stored: u64,
    pub replays: u64,
}

impl MetricsSnapshot {
    pub fn rejected(&self) -> u64 {
        self.rejected_not_found
            + self.rejected_deprecated
            + self.rejected_unsupported
            + self.rejected_proof
            + self.rejected_other
    }

    /// Accepted / attempts (0.0 when nothing was attempted)
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted as f64 / self.attempts as f64
        }
    }
}

impl VerificationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self, error: &VerifierError) {
        let counter = match error {
            VerifierError::Registry(crate::registry::RegistryError::ModelNotFound { .. }) => {
                &self.rejected_not_found
            }
            VerifierError::ModelDeprecated { .. } => &self.rejected_deprecated,
            VerifierError::UnsupportedProofSystem { .. } => &self.rejected_unsupported,
            e if e.is_proof_error() => &self.rejected_proof,
            _ => &self.rejected_other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stored(&self) {
        self.stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_replay(&self) {
        self.replays.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected_not_found: self.rejected_not_found.load(Ordering::Relaxed),
            rejected_deprecated: self.rejected_deprecated.load(Ordering::Relaxed),
            rejected_unsupported: self.rejected_unsupported.load(Ordering::Relaxed),
            rejected_proof: self.rejected_proof.load(Ordering::Relaxed),
            rejected_other: self.rejected_other.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            replays: self.replays.load(Ordering::Relaxed),
        }
    }
}
