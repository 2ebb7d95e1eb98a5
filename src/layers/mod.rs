// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Layered execution guards
//!
//! A [`LayerPipeline`] wraps one protected operation (identified by its
//! [`OperationSelector`](crate::crypto::OperationSelector)) with an ordered
//! list of [`Layer`]s. Each layer runs a pre-check before the operation and a
//! post-check after it; any failure aborts the invocation with no visible
//! effect on the protected state.

pub mod allowlist;
pub mod error;
pub mod execution_budget;
pub mod journal;
pub mod pipeline;
pub mod rate_limit;
pub mod types;
pub mod value_cap;

pub use allowlist::{AllowlistConfig, AllowlistLayer};
pub use error::{LayerError, PipelineError};
pub use execution_budget::{ExecutionBudgetConfig, ExecutionBudgetLayer};
pub use journal::Journal;
pub use pipeline::{Layer, LayerBinding, LayerPipeline};
pub use rate_limit::RateLimitLayer;
pub use types::{CarryData, Invocation, LayerConfig, PipelinePhase};
pub use value_cap::{ValueCapConfig, ValueCapLayer};
