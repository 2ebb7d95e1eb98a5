// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod layers;
pub mod registry;
pub mod verifier;
pub mod version;

// Re-export main types
pub use config::{ConfigError, RateLimitSettings, VerifierConfig};
pub use crypto::{OperationSelector, ProofSystemId};
pub use error::ErrorKind;
pub use events::{Event, EventQueue, EventSink, FanoutSink, MemoryEventLog, TracingEventSink};
pub use layers::{
    CarryData, Invocation, Journal, Layer, LayerConfig, LayerError, LayerPipeline,
    PipelineError, PipelinePhase,
};
pub use registry::{CommitmentRegistry, ModelCommitment, ModelId, ModelView, RegistryError};
pub use verifier::{
    DispatchTable, InferenceId, InferenceStore, InferenceVerifier, InputCommitment, Output,
    PendingInference, ProofBackend, Verdict, VerifierError,
};
