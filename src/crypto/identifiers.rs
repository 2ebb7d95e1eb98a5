// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Behaviour-Selecting Identifiers
//!
//! Two 4-byte identifiers select behaviour across independent implementations:
//!
//! - [`ProofSystemId`]: `keccak256(PROOF_SYSTEM_DOMAIN || name)[0..4]` where
//!   `name` is the canonical proof-system name, e.g. `"groth16-bn254-v1"`.
//!   Canonical names are lowercase ASCII alphanumeric segments joined by single
//!   hyphens, and the final segment is a version (`v` followed by digits).
//! - [`OperationSelector`]: `keccak256(signature)[0..4]` where `signature` is
//!   the operation signature with all whitespace removed, e.g.
//!   `"transfer(address,uint256)"` (the Ethereum function-selector rule).

use super::hashing::{keccak256, DomainHasher, PROOF_SYSTEM_DOMAIN};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while canonicalizing identifier sources
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Proof system name '{name}' is not canonical: {reason}")]
    NonCanonicalProofSystemName { name: String, reason: String },

    #[error("Operation signature '{signature}' is malformed: {reason}")]
    MalformedSignature { signature: String, reason: String },

    #[error("Invalid hex identifier '{input}': expected 4 bytes")]
    InvalidHex { input: String },
}

fn parse_hex4(input: &str) -> Result<[u8; 4], IdentifierError> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(stripped).map_err(|_| IdentifierError::InvalidHex {
        input: input.to_string(),
    })?;
    bytes.try_into().map_err(|_| IdentifierError::InvalidHex {
        input: input.to_string(),
    })
}

/// Identifier selecting the proof-verification backend
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofSystemId(pub [u8; 4]);

impl ProofSystemId {
    /// Derive the id from a canonical proof-system name
    pub fn from_name(name: &str) -> Result<Self, IdentifierError> {
        validate_proof_system_name(name)?;
        let mut hasher = DomainHasher::new(PROOF_SYSTEM_DOMAIN);
        hasher.update(name.as_bytes());
        let digest = hasher.finalize();
        Ok(Self([digest[0], digest[1], digest[2], digest[3]]))
    }

    /// Parse from `0x`-prefixed or bare hex
    pub fn from_hex(input: &str) -> Result<Self, IdentifierError> {
        parse_hex4(input).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 4]
    }
}

impl fmt::Display for ProofSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ProofSystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProofSystemId({})", self)
    }
}

fn validate_proof_system_name(name: &str) -> Result<(), IdentifierError> {
    let reject = |reason: &str| IdentifierError::NonCanonicalProofSystemName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(reject("name is empty"));
    }

    let segments: Vec<&str> = name.split('-').collect();
    if segments.len() < 2 {
        return Err(reject("expected '<name>-v<version>'"));
    }

    for segment in &segments {
        if segment.is_empty() {
            return Err(reject("empty segment"));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(reject(
                "segments may only contain lowercase ASCII letters and digits",
            ));
        }
    }

    let version = segments[segments.len() - 1];
    let is_version = version.len() > 1
        && version.starts_with('v')
        && version[1..].chars().all(|c| c.is_ascii_digit());
    if !is_version {
        return Err(reject("last segment must be a version such as 'v1'"));
    }

    Ok(())
}

/// Identifier of a protected operation, derived from its signature
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSelector(pub [u8; 4]);

impl OperationSelector {
    /// Derive the selector from an operation signature such as
    /// `"transfer(address,uint256)"`. Whitespace is removed before hashing.
    pub fn from_signature(signature: &str) -> Result<Self, IdentifierError> {
        let canonical: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
        let malformed = |reason: &str| IdentifierError::MalformedSignature {
            signature: signature.to_string(),
            reason: reason.to_string(),
        };

        let open = canonical.find('(').ok_or_else(|| malformed("missing '('"))?;
        if open == 0 {
            return Err(malformed("missing operation name"));
        }
        if !canonical.ends_with(')') {
            return Err(malformed("must end with ')'"));
        }

        let digest = keccak256(canonical.as_bytes());
        Ok(Self([digest[0], digest[1], digest[2], digest[3]]))
    }

    pub fn from_hex(input: &str) -> Result<Self, IdentifierError> {
        parse_hex4(input).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for OperationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for OperationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationSelector({})", self)
    }
}
