// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::Address;
use thiserror::Error;

use super::types::ModelId;
use crate::error::ErrorKind;

/// Errors raised by the commitment registry
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Model {model_id} not found")]
    ModelNotFound { model_id: ModelId },

    #[error("Caller {caller:?} is not the owner of model {model_id}")]
    NotModelOwner { model_id: ModelId, caller: Address },

    #[error("Model {model_id} is deprecated and can no longer change")]
    ModelDeprecated { model_id: ModelId },

    #[error("Malformed commitment: missing {field}")]
    MalformedCommitment { field: &'static str },

    #[error("Registry state lock poisoned")]
    LockPoisoned,
}

impl RegistryError {
    pub fn malformed(field: &'static str) -> Self {
        Self::MalformedCommitment { field }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ModelNotFound { .. } => ErrorKind::NotFound,
            Self::NotModelOwner { .. } => ErrorKind::Authorization,
            Self::ModelDeprecated { .. } => ErrorKind::State,
            Self::MalformedCommitment { .. } => ErrorKind::Validation,
            Self::LockPoisoned => ErrorKind::Internal,
        }
    }
}
