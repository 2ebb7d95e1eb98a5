// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Verifier Configuration
//!
//! Loaded from environment variables or a TOML file:
//!
//! ```toml
//! store_inferences = true
//! max_proof_size = 524288
//! max_output_size = 65536
//!
//! [rate_limit]
//! max_invocations = 10
//! window_ms = 60000
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}

impl ConfigError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

/// Sliding-window rate limit: at most `max_invocations` per caller per window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_invocations: usize,
    pub window_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_invocations: 10,
            window_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Enable the inference record store
    pub store_inferences: bool,

    /// Maximum proof size in bytes
    pub max_proof_size: usize,

    /// Maximum output size in bytes
    pub max_output_size: usize,

    /// Default settings for rate-limit layers
    pub rate_limit: RateLimitSettings,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            store_inferences: true,
            max_proof_size: 512 * 1024,
            max_output_size: 64 * 1024,
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl VerifierConfig {
    /// Create configuration from environment variables
    ///
    /// Environment variables:
    /// - `VERIFIER_STORE_INFERENCES`: true/false (default: true)
    /// - `VERIFIER_MAX_PROOF_SIZE`: maximum proof size in bytes
    /// - `VERIFIER_MAX_OUTPUT_SIZE`: maximum output size in bytes
    /// - `VERIFIER_RATE_LIMIT_MAX`: invocations allowed per window
    /// - `VERIFIER_RATE_LIMIT_WINDOW_MS`: window length in milliseconds
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
            value.and_then(|s| s.parse().ok()).unwrap_or(default)
        }

        let defaults = Self::default();
        Self {
            store_inferences: parsed(
                lookup("VERIFIER_STORE_INFERENCES"),
                defaults.store_inferences,
            ),
            max_proof_size: parsed(lookup("VERIFIER_MAX_PROOF_SIZE"), defaults.max_proof_size),
            max_output_size: parsed(lookup("VERIFIER_MAX_OUTPUT_SIZE"), defaults.max_output_size),
            rate_limit: RateLimitSettings {
                max_invocations: parsed(
                    lookup("VERIFIER_RATE_LIMIT_MAX"),
                    defaults.rate_limit.max_invocations,
                ),
                window_ms: parsed(
                    lookup("VERIFIER_RATE_LIMIT_WINDOW_MS"),
                    defaults.rate_limit.window_ms,
                ),
            },
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_proof_size == 0 {
            return Err(ConfigError::invalid("max_proof_size must be > 0"));
        }
        if self.max_proof_size > 16 * 1024 * 1024 {
            return Err(ConfigError::invalid("max_proof_size too large (max 16MB)"));
        }
        if self.max_output_size == 0 {
            return Err(ConfigError::invalid("max_output_size must be > 0"));
        }
        if self.rate_limit.max_invocations == 0 {
            return Err(ConfigError::invalid("rate_limit.max_invocations must be > 0"));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(ConfigError::invalid("rate_limit.window_ms must be > 0"));
        }
        Ok(())
    }
}
