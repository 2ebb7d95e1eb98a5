// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error classification shared by every module
//!
//! Each module keeps its own `thiserror` enum; `ErrorKind` is the coarse
//! class a caller uses to decide what to do next (pick another model, stop
//! because it is not authorized, or fix the proof).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unknown model or inference id
    NotFound,
    /// Non-owner mutation attempt
    Authorization,
    /// Operation on a deprecated model
    State,
    /// Invalid proof, mismatched commitment/output, unsupported proof system,
    /// malformed input
    Validation,
    /// A pipeline layer rejected the invocation
    LayerRejection,
    /// Lock poisoning or a failure inside a protected operation body
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotFound => "not-found",
            Self::Authorization => "authorization",
            Self::State => "state",
            Self::Validation => "validation",
            Self::LayerRejection => "layer-rejection",
            Self::Internal => "internal",
        };
        f.write_str(label)
    }
}
