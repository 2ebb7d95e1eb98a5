// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Rejects invocations carrying more value than the configured cap

use ethers::types::U256;
use serde::{Deserialize, Serialize};

use super::error::LayerError;
use super::pipeline::Layer;
use super::types::{CarryData, Invocation, LayerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCapConfig {
    pub max_value: U256,
}

#[derive(Debug, Clone, Default)]
pub struct ValueCapLayer;

impl ValueCapLayer {
    pub fn new() -> Self {
        Self
    }

    pub fn config(max_value: U256) -> LayerConfig {
        // U256 always serializes to JSON
        LayerConfig::from_typed(&ValueCapConfig { max_value }).unwrap_or_default()
    }
}

impl Layer for ValueCapLayer {
    fn name(&self) -> &str {
        "value-cap"
    }

    fn pre_check(&self, config: &LayerConfig, invocation: &Invocation) -> Result<CarryData, LayerError> {
        let config: ValueCapConfig = config.parse(self.name())?;
        if invocation.value > config.max_value {
            return Err(LayerError::rejected(
                self.name(),
                format!("value {} exceeds cap {}", invocation.value, config.max_value),
            ));
        }
        Ok(CarryData::empty())
    }

    fn post_check(&self, _config: &LayerConfig, _invocation: &Invocation, _carry: &CarryData) -> Result<(), LayerError> {
        Ok(())
    }
}
