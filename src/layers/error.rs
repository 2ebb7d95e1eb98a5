// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::time::Duration;
use thiserror::Error;

use super::types::PipelinePhase;
use crate::crypto::OperationSelector;
use crate::error::ErrorKind;

/// Failure raised by a single layer check
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayerError {
    #[error("{layer}: {reason}")]
    Rejected { layer: String, reason: String },

    #[error("{layer}: rate limit exceeded ({limit} per {window:?}), retry after {retry_after:?}")]
    RateLimited {
        layer: String,
        limit: usize,
        window: Duration,
        retry_after: Duration,
    },

    #[error("{layer}: invalid configuration: {reason}")]
    InvalidConfig { layer: String, reason: String },

    #[error("{layer}: invalid carry data: {reason}")]
    InvalidCarryData { layer: String, reason: String },
}

impl LayerError {
    pub fn rejected(layer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            layer: layer.into(),
            reason: reason.into(),
        }
    }

    pub fn layer(&self) -> &str {
        match self {
            Self::Rejected { layer, .. }
            | Self::RateLimited { layer, .. }
            | Self::InvalidConfig { layer, .. }
            | Self::InvalidCarryData { layer, .. } => layer,
        }
    }

    /// Only rate limiting clears up on its own
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Why a protected invocation was aborted
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invocation selector {actual} does not match pipeline selector {expected}")]
    SelectorMismatch {
        expected: OperationSelector,
        actual: OperationSelector,
    },

    #[error("Aborted during {phase:?} by layer '{layer}': {source}")]
    LayerAborted {
        phase: PipelinePhase,
        layer: String,
        #[source]
        source: LayerError,
    },

    #[error("Aborted during Executing: {source}")]
    ExecutionFailed {
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Phase the invocation was in when it aborted
    pub fn phase(&self) -> PipelinePhase {
        match self {
            Self::SelectorMismatch { .. } => PipelinePhase::Idle,
            Self::LayerAborted { phase, .. } => *phase,
            Self::ExecutionFailed { .. } => PipelinePhase::Executing,
        }
    }

    /// Name of the aborting layer, if a layer aborted
    pub fn layer(&self) -> Option<&str> {
        match self {
            Self::LayerAborted { layer, .. } => Some(layer),
            _ => None,
        }
    }

    pub fn layer_error(&self) -> Option<&LayerError> {
        match self {
            Self::LayerAborted { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SelectorMismatch { .. } => ErrorKind::Validation,
            Self::LayerAborted { .. } => ErrorKind::LayerRejection,
            Self::ExecutionFailed { .. } => ErrorKind::Internal,
        }
    }
}
