// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model Commitment Registry
//!
//! - `types`: model ids, commitment bundles and stored records
//! - `store`: the registry itself (register, update, deprecate, lookup)
//! - `error`: registry error taxonomy

pub mod error;
pub mod store;
pub mod types;

pub use error::RegistryError;
pub use store::CommitmentRegistry;
pub use types::{ModelCommitment, ModelId, ModelRecord, ModelView};
