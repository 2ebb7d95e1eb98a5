// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Rate-Limit Layer
//!
//! Per-caller sliding window: at most `max_invocations` accepted pre-checks
//! per caller within any `window_ms` span. Check-and-record happens inside one
//! mutex critical section, so two concurrent invocations can never both pass
//! on a stale count. An invocation that later aborts gives its slot back.
//!
//! A caller's window is dropped once it holds no entries, and at most once
//! per window length every idle window is swept, so the map tracks only
//! callers with live entries.

use ethers::types::Address;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use super::error::LayerError;
use super::pipeline::Layer;
use super::types::{CarryData, Invocation, LayerConfig};
use crate::config::RateLimitSettings;

/// Sliding window of accepted invocations for one caller
#[derive(Debug, Default)]
struct SlidingWindow {
    /// (ticket, accepted at), oldest first
    entries: VecDeque<(u64, Instant)>,
}

impl SlidingWindow {
    fn cleanup(&mut self, window: Duration, now: Instant) {
        while let Some(&(_, at)) = self.entries.front() {
            if now.duration_since(at) >= window {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    fn try_acquire(
        &mut self,
        ticket: u64,
        settings: &RateLimitSettings,
        now: Instant,
    ) -> Result<(), Duration> {
        let window = Duration::from_millis(settings.window_ms);
        self.cleanup(window, now);

        if self.entries.len() >= settings.max_invocations {
            let retry_after = self
                .entries
                .front()
                .map(|&(_, oldest)| window.saturating_sub(now.duration_since(oldest)))
                .unwrap_or(window);
            return Err(retry_after);
        }

        self.entries.push_back((ticket, now));
        Ok(())
    }

    fn release(&mut self, ticket: u64) {
        self.entries.retain(|&(t, _)| t != ticket);
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
struct RateLimitState {
    next_ticket: u64,
    windows: HashMap<Address, SlidingWindow>,
    last_sweep: Option<Instant>,
}

impl RateLimitState {
    /// Drop every window whose entries have all expired
    fn sweep(&mut self, window: Duration, now: Instant) {
        if let Some(last) = self.last_sweep {
            if now.duration_since(last) < window {
                return;
            }
        }
        self.last_sweep = Some(now);

        let before = self.windows.len();
        self.windows.retain(|_, w| {
            w.cleanup(window, now);
            !w.is_empty()
        });
        let evicted = before - self.windows.len();
        if evicted > 0 {
            debug!("🧹 Evicted {} idle rate-limit windows", evicted);
        }
    }
}

#[derive(Debug)]
pub struct RateLimitLayer {
    name: String,
    state: Mutex<RateLimitState>,
}

impl Default for RateLimitLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitLayer {
    pub fn new() -> Self {
        Self::named("rate-limit")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(RateLimitState::default()),
        }
    }

    /// Binding configuration for the given settings
    pub fn config(settings: RateLimitSettings) -> LayerConfig {
        LayerConfig::new(serde_json::json!({
            "max_invocations": settings.max_invocations,
            "window_ms": settings.window_ms,
        }))
    }

    /// Callers with a window currently held in memory
    pub fn tracked_callers(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .windows
            .len()
    }

    /// Accepted invocations currently inside the caller's window
    pub fn current_count(&self, caller: &Address, window_ms: u64) -> usize {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match state.windows.get_mut(caller) {
            Some(window) => {
                window.cleanup(Duration::from_millis(window_ms), Instant::now());
                window.entries.len()
            }
            None => 0,
        }
    }

    fn settings(&self, config: &LayerConfig) -> Result<RateLimitSettings, LayerError> {
        let settings: RateLimitSettings = config.parse(&self.name)?;
        if settings.max_invocations == 0 || settings.window_ms == 0 {
            return Err(LayerError::InvalidConfig {
                layer: self.name.clone(),
                reason: "max_invocations and window_ms must be > 0".to_string(),
            });
        }
        Ok(settings)
    }
}

impl Layer for RateLimitLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn pre_check(&self, config: &LayerConfig, invocation: &Invocation) -> Result<CarryData, LayerError> {
        let settings = self.settings(config)?;
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let now = Instant::now();
        state.sweep(Duration::from_millis(settings.window_ms), now);

        let ticket = state.next_ticket;
        state.next_ticket += 1;

        let window = state.windows.entry(invocation.caller).or_default();
        match window.try_acquire(ticket, &settings, now) {
            Ok(()) => {
                debug!(
                    "⏱️  {:?} at {}/{} in window",
                    invocation.caller,
                    window.entries.len(),
                    settings.max_invocations
                );
                Ok(CarryData::from_u64(ticket))
            }
            Err(retry_after) => Err(LayerError::RateLimited {
                layer: self.name.clone(),
                limit: settings.max_invocations,
                window: Duration::from_millis(settings.window_ms),
                retry_after,
            }),
        }
    }

    fn post_check(&self, _config: &LayerConfig, _invocation: &Invocation, _carry: &CarryData) -> Result<(), LayerError> {
        Ok(())
    }

    fn on_abort(&self, _config: &LayerConfig, invocation: &Invocation, carry: &CarryData) {
        let Some(ticket) = carry.to_u64() else {
            return;
        };
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(window) = state.windows.get_mut(&invocation.caller) {
            window.release(ticket);
            if window.is_empty() {
                state.windows.remove(&invocation.caller);
            }
        }
    }
}
