// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caller allowlist layer

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use super::error::LayerError;
use super::pipeline::Layer;
use super::types::{CarryData, Invocation, LayerConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistConfig {
    pub allowed: Vec<Address>,
}

#[derive(Debug, Clone)]
pub struct AllowlistLayer {
    name: String,
}

impl Default for AllowlistLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AllowlistLayer {
    pub fn new() -> Self {
        Self {
            name: "allowlist".to_string(),
        }
    }

    pub fn config(allowed: Vec<Address>) -> LayerConfig {
        LayerConfig::new(serde_json::json!({ "allowed": allowed }))
    }
}

impl Layer for AllowlistLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn pre_check(&self, config: &LayerConfig, invocation: &Invocation) -> Result<CarryData, LayerError> {
        let config: AllowlistConfig = config.parse(&self.name)?;
        if !config.allowed.contains(&invocation.caller) {
            return Err(LayerError::rejected(
                &self.name,
                format!("caller {:?} is not allowed", invocation.caller),
            ));
        }
        Ok(CarryData::empty())
    }

    fn post_check(&self, _config: &LayerConfig, _invocation: &Invocation, _carry: &CarryData) -> Result<(), LayerError> {
        Ok(())
    }
}
