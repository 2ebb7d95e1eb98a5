// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end walkthrough: register a model, verify and store an inference
//! through a guarded pipeline, then show a rejected tampered output.

use anyhow::{anyhow, Result};
use clap::Args;
use ethers::types::{Address, H256};
use std::sync::Arc;
use tracing::info;

use crate::config::VerifierConfig;
use crate::crypto::{keccak256, OperationSelector, ProofSystemId};
use crate::events::{EventSink, FanoutSink, MemoryEventLog, TracingEventSink};
use crate::layers::{AllowlistLayer, Invocation, LayerPipeline, RateLimitLayer};
use crate::registry::{CommitmentRegistry, ModelCommitment};
use crate::verifier::{
    random_nonce, CommitmentBindingBackend, DispatchTable, InferenceId, InferenceStore,
    InferenceVerifier, InputCommitment, Output, MOCK_PROOF_SYSTEM_NAME,
};

/// Protected operation guarded by the demo pipeline
pub const STORE_INFERENCE_SIGNATURE: &str = "storeInference(uint256,bytes32,bytes)";

/// Arguments for demo command
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Proof-system name the mock backend is registered under
    #[arg(long, default_value = MOCK_PROOF_SYSTEM_NAME)]
    pub proof_system: String,
}

#[derive(Debug, Default)]
struct DemoLedger {
    accepted: Vec<InferenceId>,
}

pub async fn run_demo(args: DemoArgs) -> Result<()> {
    let config = VerifierConfig::from_env();
    config.validate()?;

    let log = MemoryEventLog::shared();
    let sink: Arc<dyn EventSink> = Arc::new(
        FanoutSink::new()
            .with_sink(log.clone())
            .with_sink(Arc::new(TracingEventSink)),
    );

    let system = ProofSystemId::from_name(&args.proof_system)?;
    let dispatch = Arc::new(DispatchTable::new().with_backend(
        system,
        Arc::new(CommitmentBindingBackend::named(args.proof_system.clone())),
    )?);
    let registry = Arc::new(CommitmentRegistry::new(sink.clone()));
    let verifier = Arc::new(InferenceVerifier::from_config(
        &config,
        registry.clone(),
        dispatch,
        sink,
    ));
    let store = InferenceStore::from_config(&config, verifier.clone());

    let owner = Address::repeat_byte(0x0A);
    let client = Address::repeat_byte(0x0C);
    let vk_hash = H256::from(keccak256(b"demo verifying key"));
    let commitment = ModelCommitment::new(
        H256::from(keccak256(b"demo model weights")),
        H256::from(keccak256(b"demo circuit")),
        vk_hash,
        system,
    )
    .with_uri("ipfs://demo-model");

    println!("\n📋 Demo Setup:");
    println!("  Proof System:  {} ({})", args.proof_system, system);
    let model_id = registry.register_model(owner, commitment)?;
    println!("  Model ID:      {}", model_id);

    let nonce = random_nonce();
    let input = InputCommitment::with_nonce(b"prompt: classify", b"image bytes", &nonce);
    let output = Output::new("application/json", br#"{"label":"cat"}"#.to_vec());
    let proof = CommitmentBindingBackend::prove(&vk_hash, &input, &output);

    let selector = OperationSelector::from_signature(STORE_INFERENCE_SIGNATURE)?;
    let pipeline = LayerPipeline::new(selector)
        .with_layer(
            Arc::new(AllowlistLayer::new()),
            AllowlistLayer::config(vec![client]),
        )
        .with_layer(
            Arc::new(RateLimitLayer::new()),
            RateLimitLayer::config(config.rate_limit),
        );
    println!("  Pipeline:      {} {:?}", selector, pipeline.layer_names());

    let mut ledger = DemoLedger::default();
    let invocation = Invocation::new(selector, client);
    let store = &store;

    // the second submission is a replay and lands on the same record
    for attempt in 1..=2 {
        let inference_id = pipeline.invoke(&mut ledger, &invocation, |ledger, inv, journal| {
            let pending = store.prepare_inference(inv.caller, model_id, input, &output, &proof)?;
            let id = pending.inference_id();
            journal.push(ledger, |l| &mut l.accepted, id);
            journal.defer(move || {
                store.commit_inference(pending);
            });
            Ok(id)
        })?;
        println!("\n✅ Attempt {}: inference {}", attempt, inference_id);
    }

    let intruder = Invocation::new(selector, Address::repeat_byte(0xEE));
    match pipeline.invoke(&mut ledger, &intruder, |_, _, _| Ok(())) {
        Ok(()) => return Err(anyhow!("allowlist let an unknown caller through")),
        Err(e) => println!("🚫 Unknown caller: {} ({})", e, e.kind()),
    }

    let mut tampered = output.clone();
    tampered.bytes[2] ^= 0x01;
    match verifier.verify_inference(client, model_id, input, &tampered, &proof) {
        Ok(()) => return Err(anyhow!("tampered output was accepted")),
        Err(e) => println!("🚫 Tampered output: {} ({})", e, e.kind()),
    }

    info!("Demo complete: {} ledger entries", ledger.accepted.len());

    println!("\n📣 Events:");
    for event in log.events() {
        println!("  {}", serde_json::to_string(&event)?);
    }

    let metrics = verifier.metrics().snapshot();
    println!("\n📊 Metrics:");
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    Ok(())
}
