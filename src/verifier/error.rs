// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Verification Error Types

use thiserror::Error;

use super::dispatch::RejectReason;
use super::types::InferenceId;
use crate::crypto::ProofSystemId;
use crate::error::ErrorKind;
use crate::registry::{ModelId, RegistryError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifierError {
    /// Registry lookup failed (unknown model, poisoned lock)
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Verification refused: model {model_id} is deprecated")]
    ModelDeprecated { model_id: ModelId },

    #[error("Unsupported proof system {proof_system_id}")]
    UnsupportedProofSystem { proof_system_id: ProofSystemId },

    #[error("A backend is already registered for proof system {proof_system_id}")]
    BackendAlreadyRegistered { proof_system_id: ProofSystemId },

    #[error("Invalid proof for model {model_id}")]
    InvalidProof { model_id: ModelId },

    #[error("Proof was produced for a different model than {model_id}")]
    ModelMismatch { model_id: ModelId },

    #[error("Proof does not match the input commitment for model {model_id}")]
    InputCommitmentMismatch { model_id: ModelId },

    #[error("Proof does not match the declared output for model {model_id}")]
    OutputMismatch { model_id: ModelId },

    #[error("Proof too large: {size} bytes (max {max})")]
    ProofTooLarge { size: usize, max: usize },

    #[error("Output too large: {size} bytes (max {max})")]
    OutputTooLarge { size: usize, max: usize },

    #[error("Inference {inference_id} not found")]
    InferenceNotFound { inference_id: InferenceId },

    #[error("Inference record storage is disabled")]
    StoreDisabled,

    #[error("Verifier state lock poisoned")]
    LockPoisoned,
}

impl VerifierError {
    /// Map a backend rejection onto the error taxonomy
    pub fn from_rejection(model_id: ModelId, reason: RejectReason) -> Self {
        match reason {
            RejectReason::InvalidProof => Self::InvalidProof { model_id },
            RejectReason::ModelMismatch => Self::ModelMismatch { model_id },
            RejectReason::InputCommitmentMismatch => Self::InputCommitmentMismatch { model_id },
            RejectReason::OutputMismatch => Self::OutputMismatch { model_id },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Registry(inner) => inner.kind(),
            Self::ModelDeprecated { .. } => ErrorKind::State,
            Self::InferenceNotFound { .. } => ErrorKind::NotFound,
            Self::StoreDisabled | Self::LockPoisoned => ErrorKind::Internal,
            Self::UnsupportedProofSystem { .. }
            | Self::BackendAlreadyRegistered { .. }
            | Self::InvalidProof { .. }
            | Self::ModelMismatch { .. }
            | Self::InputCommitmentMismatch { .. }
            | Self::OutputMismatch { .. }
            | Self::ProofTooLarge { .. }
            | Self::OutputTooLarge { .. } => ErrorKind::Validation,
        }
    }

    /// Whether the proof itself (rather than the model or configuration) was at fault
    pub fn is_proof_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidProof { .. }
                | Self::ModelMismatch { .. }
                | Self::InputCommitmentMismatch { .. }
                | Self::OutputMismatch { .. }
                | Self::ProofTooLarge { .. }
        )
    }

    /// Whether resubmitting against another model could succeed
    pub fn suggests_other_model(&self) -> bool {
        matches!(
            self,
            Self::ModelDeprecated { .. }
                | Self::UnsupportedProofSystem { .. }
                | Self::Registry(RegistryError::ModelNotFound { .. })
        )
    }
}
