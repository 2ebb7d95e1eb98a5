// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Layer Pipeline
//!
//! Runs an ordered list of layers around one protected operation:
//!
//! ```text
//! Idle -> PreChecking -> Executing -> PostChecking -> Committed
//!              \              \             \
//!               +--------------+-------------+--> Aborted
//! ```
//!
//! - Pre-checks run in configured order. The first failure aborts: later
//!   layers, the body and every post-check are skipped.
//! - The body runs only if every pre-check passed; it records undo steps for
//!   its effects in a [`Journal`] and defers effects outside the protected
//!   state until commit.
//! - Post-checks run in the same order, each receiving the carry data its own
//!   pre-check returned. A failure rolls back every body effect.
//! - On any abort, layers whose pre-check passed get `on_abort` (newest first)
//!   so they can release private state such as rate-limit slots.
//!
//! Order is part of the contract. It only changes through `push_layer` (which
//! appends) or `set_layers` (explicit reconfiguration).

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::{LayerError, PipelineError};
use super::journal::Journal;
use super::types::{CarryData, Invocation, LayerConfig, PipelinePhase};
use crate::crypto::OperationSelector;

/// Guard component contributing pre- and post-execution checks
pub trait Layer: Send + Sync {
    fn name(&self) -> &str;

    /// Check before the body runs; may return data for the post-check
    fn pre_check(&self, config: &LayerConfig, invocation: &Invocation) -> Result<CarryData, LayerError>;

    /// Check after the body succeeded
    fn post_check(
        &self,
        config: &LayerConfig,
        invocation: &Invocation,
        carry: &CarryData,
    ) -> Result<(), LayerError>;

    /// Called when an invocation aborts after this layer's pre-check passed
    fn on_abort(&self, _config: &LayerConfig, _invocation: &Invocation, _carry: &CarryData) {}
}

/// A layer attached to a pipeline together with its configuration
#[derive(Clone)]
pub struct LayerBinding {
    layer: Arc<dyn Layer>,
    config: LayerConfig,
}

impl LayerBinding {
    pub fn new(layer: Arc<dyn Layer>, config: LayerConfig) -> Self {
        Self { layer, config }
    }

    pub fn name(&self) -> &str {
        self.layer.name()
    }

    pub fn layer(&self) -> &Arc<dyn Layer> {
        &self.layer
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }
}

impl std::fmt::Debug for LayerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerBinding")
            .field("layer", &self.layer.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Ordered layers guarding one protected operation
#[derive(Debug, Clone)]
pub struct LayerPipeline {
    selector: OperationSelector,
    bindings: Vec<LayerBinding>,
}

impl LayerPipeline {
    pub fn new(selector: OperationSelector) -> Self {
        Self {
            selector,
            bindings: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer: Arc<dyn Layer>, config: LayerConfig) -> Self {
        self.push_layer(layer, config);
        self
    }

    /// Append a layer after every existing one
    pub fn push_layer(&mut self, layer: Arc<dyn Layer>, config: LayerConfig) {
        debug!(
            "➕ Layer '{}' appended to pipeline {} at position {}",
            layer.name(),
            self.selector,
            self.bindings.len()
        );
        self.bindings.push(LayerBinding::new(layer, config));
    }

    /// Replace the whole ordered list
    pub fn set_layers(&mut self, bindings: Vec<LayerBinding>) {
        info!(
            "🔧 Pipeline {} reconfigured with {} layers",
            self.selector,
            bindings.len()
        );
        self.bindings = bindings;
    }

    pub fn selector(&self) -> OperationSelector {
        self.selector
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.bindings.iter().map(|b| b.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Run one protected invocation. Either every journaled effect of `body`
    /// is kept (`Committed`) or none is (`Aborted`).
    ///
    /// Only writes with a recorded undo step are rolled back; a write to
    /// `state` the body does not journal survives an abort. Use
    /// [`invoke_snapshot`](Self::invoke_snapshot) when `S` is `Clone`.
    pub fn invoke<'a, S, R, F>(&self, state: &mut S, invocation: &Invocation, body: F) -> Result<R, PipelineError>
    where
        F: FnOnce(&mut S, &Invocation, &mut Journal<'a, S>) -> anyhow::Result<R>,
    {
        if invocation.selector != self.selector {
            return Err(PipelineError::SelectorMismatch {
                expected: self.selector,
                actual: invocation.selector,
            });
        }

        // PreChecking
        let mut carries: Vec<CarryData> = Vec::with_capacity(self.bindings.len());
        for binding in &self.bindings {
            match binding.layer.pre_check(&binding.config, invocation) {
                Ok(carry) => carries.push(carry),
                Err(source) => {
                    warn!(
                        "🚫 Pre-check '{}' rejected {} from {:?}: {}",
                        binding.name(),
                        invocation.selector,
                        invocation.caller,
                        source
                    );
                    self.release(invocation, &carries);
                    return Err(PipelineError::LayerAborted {
                        phase: PipelinePhase::PreChecking,
                        layer: binding.name().to_string(),
                        source,
                    });
                }
            }
        }

        // Executing
        let mut journal: Journal<'a, S> = Journal::new();
        let result = match body(state, invocation, &mut journal) {
            Ok(result) => result,
            Err(source) => {
                warn!("🚫 Protected operation {} failed: {}", invocation.selector, source);
                let undone = journal.rollback(state);
                debug!("↩️  Rolled back {} effects", undone);
                self.release(invocation, &carries);
                return Err(PipelineError::ExecutionFailed { source });
            }
        };

        // PostChecking
        for (binding, carry) in self.bindings.iter().zip(&carries) {
            if let Err(source) = binding.layer.post_check(&binding.config, invocation, carry) {
                warn!(
                    "🚫 Post-check '{}' rejected {} from {:?}: {}",
                    binding.name(),
                    invocation.selector,
                    invocation.caller,
                    source
                );
                let undone = journal.rollback(state);
                debug!("↩️  Rolled back {} effects", undone);
                self.release(invocation, &carries);
                return Err(PipelineError::LayerAborted {
                    phase: PipelinePhase::PostChecking,
                    layer: binding.name().to_string(),
                    source,
                });
            }
        }

        // Committed
        let effects = journal.commit();
        debug!(
            "✅ Invocation {} committed with {} effects",
            invocation.selector, effects
        );
        Ok(result)
    }

    /// Like [`invoke`](Self::invoke), but any abort restores `state` to a copy
    /// taken before the invocation, whether or not the body journaled its writes.
    /// Deferred journal effects still run only on commit.
    pub fn invoke_snapshot<'a, S, R, F>(
        &self,
        state: &mut S,
        invocation: &Invocation,
        body: F,
    ) -> Result<R, PipelineError>
    where
        S: Clone,
        F: FnOnce(&mut S, &Invocation, &mut Journal<'a, S>) -> anyhow::Result<R>,
    {
        let snapshot = state.clone();
        self.invoke(state, invocation, body).map_err(|e| {
            *state = snapshot;
            e
        })
    }

    /// Notify layers whose pre-check passed, newest first
    fn release(&self, invocation: &Invocation, carries: &[CarryData]) {
        for (binding, carry) in self.bindings.iter().zip(carries).rev() {
            binding.layer.on_abort(&binding.config, invocation, carry);
        }
    }
}
