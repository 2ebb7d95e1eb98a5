// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hashing and Identifier Derivation
//!
//! - **Hashing**: domain-separated Keccak-256 used for every commitment and
//!   derived id in the crate
//! - **Identifiers**: canonicalization and derivation of the 4-byte
//!   proof-system ids and operation selectors that select behaviour

pub mod hashing;
pub mod identifiers;

pub use hashing::{keccak256, DomainHasher};
pub use identifiers::{IdentifierError, OperationSelector, ProofSystemId};
