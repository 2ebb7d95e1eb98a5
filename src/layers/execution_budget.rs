// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Execution Budget Layer
//!
//! Timeouts expressed as a layer: the pre-check carries the start time
//! forward, the post-check fails the invocation (rolling back the body) when
//! the body took longer than `max_duration_ms`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::LayerError;
use super::pipeline::Layer;
use super::types::{CarryData, Invocation, LayerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionBudgetConfig {
    pub max_duration_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionBudgetLayer;

impl ExecutionBudgetLayer {
    pub fn new() -> Self {
        Self
    }

    pub fn config(max_duration_ms: u64) -> LayerConfig {
        LayerConfig::new(serde_json::json!({ "max_duration_ms": max_duration_ms }))
    }

    fn now_ms() -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

impl Layer for ExecutionBudgetLayer {
    fn name(&self) -> &str {
        "execution-budget"
    }

    fn pre_check(&self, config: &LayerConfig, _invocation: &Invocation) -> Result<CarryData, LayerError> {
        // validate early so a bad config never lets the body run
        let _: ExecutionBudgetConfig = config.parse(self.name())?;
        Ok(CarryData::from_u64(Self::now_ms()))
    }

    fn post_check(&self, config: &LayerConfig, _invocation: &Invocation, carry: &CarryData) -> Result<(), LayerError> {
        let config: ExecutionBudgetConfig = config.parse(self.name())?;
        let started = carry.to_u64().ok_or_else(|| LayerError::InvalidCarryData {
            layer: self.name().to_string(),
            reason: format!("expected 8-byte start time, got {} bytes", carry.as_bytes().len()),
        })?;

        let elapsed = Self::now_ms().saturating_sub(started);
        debug!("⏱️  Execution took {}ms (budget {}ms)", elapsed, config.max_duration_ms);
        if elapsed > config.max_duration_ms {
            return Err(LayerError::rejected(
                self.name(),
                format!(
                    "execution took {}ms, budget is {}ms",
                    elapsed, config.max_duration_ms
                ),
            ));
        }
        Ok(())
    }
}
