// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, U256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::LayerError;
use crate::crypto::OperationSelector;

/// Description of one call into a protected operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub selector: OperationSelector,
    pub caller: Address,
    pub value: U256,
    pub data: Vec<u8>,
}

impl Invocation {
    pub fn new(selector: OperationSelector, caller: Address) -> Self {
        Self {
            selector,
            caller,
            value: U256::zero(),
            data: Vec::new(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }
}

/// Opaque data a layer hands from its pre-check to its own post-check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarryData(Vec<u8>);

impl CarryData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Carry a single big-endian `u64`
    pub fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    pub fn to_u64(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.0.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }
}

/// Per-binding layer configuration (JSON)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerConfig(serde_json::Value);

impl LayerConfig {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// No configuration (JSON `null`)
    pub fn empty() -> Self {
        Self(serde_json::Value::Null)
    }

    pub fn from_typed<T: Serialize>(config: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(config).map(Self)
    }

    /// Decode into the layer's typed configuration
    pub fn parse<T: DeserializeOwned>(&self, layer: &str) -> Result<T, LayerError> {
        serde_json::from_value(self.0.clone()).map_err(|e| LayerError::InvalidConfig {
            layer: layer.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Lifecycle of one protected invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelinePhase {
    Idle,
    PreChecking,
    Executing,
    PostChecking,
    Committed,
    Aborted,
}
