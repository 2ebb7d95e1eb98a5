// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-end: register under a production proof-system name, verify, store,
//! update, deprecate, all behind a guarded pipeline

use anyhow::Result;
use ethers::types::H256;
use fabstir_model_verifier::config::RateLimitSettings;
use fabstir_model_verifier::events::Event;
use fabstir_model_verifier::layers::{
    AllowlistLayer, CarryData, Invocation, Layer, LayerConfig, LayerError, LayerPipeline,
    PipelinePhase, RateLimitLayer,
};
use fabstir_model_verifier::verifier::{
    random_nonce, CommitmentBindingBackend, InferenceId, InputCommitment, Output, VerifierError,
};
use fabstir_model_verifier::{OperationSelector, ProofSystemId};
use std::sync::Arc;

use crate::common::{commitment, Harness, CLIENT, OTHER, OWNER};

fn groth16() -> ProofSystemId {
    ProofSystemId::from_name("groth16-bn254-v1").unwrap()
}

#[test]
fn test_valid_proof_then_tampered_output() -> Result<()> {
    let h = Harness::with_system(groth16());
    let (model_id, vk) = h.register(OWNER, 0x21, groth16());
    h.log.take();

    let input = InputCommitment::with_nonce(b"prompt", b"secret", &random_nonce());
    let output = Output::new("application/json", br#"{"answer":42}"#.to_vec());
    let proof = CommitmentBindingBackend::prove(&vk, &input, &output);

    h.verifier
        .verify_inference(CLIENT, model_id, input, &output, &proof)?;
    assert_eq!(h.log.count_of("InferenceVerified"), 1);

    let mut tampered = output.clone();
    tampered.bytes[1] ^= 0x01;
    let err = h
        .verifier
        .verify_inference(CLIENT, model_id, input, &tampered, &proof)
        .unwrap_err();
    assert_eq!(err, VerifierError::OutputMismatch { model_id });
    assert_eq!(h.log.len(), 1);
    Ok(())
}

#[test]
fn test_model_lifecycle_event_stream() -> Result<()> {
    let h = Harness::with_system(groth16());
    let first = commitment(0x30, groth16());
    let model_id = h.registry.register_model(OWNER, first.clone())?;

    let input = InputCommitment::commit(b"in", b"");
    let output = Output::new("text/plain", b"out".to_vec());
    let proof = CommitmentBindingBackend::prove(&first.vk_hash, &input, &output);
    let inference_id = h
        .store
        .verify_and_store_inference(CLIENT, model_id, input, &output, &proof)?;

    let mut second = first.clone();
    second.vk_hash = H256::repeat_byte(0x77);
    h.registry.update_model(OWNER, model_id, second.clone())?;
    h.registry.deprecate_model(OWNER, model_id)?;

    // stored receipts survive deprecation
    assert_eq!(h.store.get_inference(inference_id)?.model_id, model_id);

    assert_eq!(
        h.log.events(),
        vec![
            Event::ModelRegistered {
                model_id,
                owner: OWNER,
                commitment: first.clone(),
            },
            Event::InferenceVerified {
                model_id,
                input_commitment: input,
                output: output.clone(),
                caller: CLIENT,
            },
            Event::InferenceStored { inference_id },
            Event::ModelUpdated {
                model_id,
                old: first,
                new: second,
            },
            Event::ModelDeprecated { model_id },
        ]
    );
    Ok(())
}

#[test]
fn test_store_behind_pipeline() -> Result<()> {
    let h = Harness::with_system(groth16());
    let (model_id, vk) = h.register(OWNER, 0x40, groth16());

    let selector = OperationSelector::from_signature("storeInference(uint256,bytes32,bytes)")?;
    let pipeline = LayerPipeline::new(selector)
        .with_layer(Arc::new(AllowlistLayer::new()), AllowlistLayer::config(vec![CLIENT]))
        .with_layer(
            Arc::new(RateLimitLayer::new()),
            RateLimitLayer::config(RateLimitSettings {
                max_invocations: 2,
                window_ms: 60_000,
            }),
        );

    let mut accepted: Vec<InferenceId> = Vec::new();
    let store = &h.store;
    let mut submit = |caller, tag: &str| {
        let input = InputCommitment::commit(b"public", tag.as_bytes());
        let output = Output::new("raw", tag.as_bytes().to_vec());
        let proof = CommitmentBindingBackend::prove(&vk, &input, &output);
        pipeline.invoke(&mut accepted, &Invocation::new(selector, caller), move |accepted, inv, journal| {
            let pending = store.prepare_inference(inv.caller, model_id, input, &output, &proof)?;
            let id = pending.inference_id();
            accepted.push(id);
            journal.record(|a: &mut Vec<InferenceId>| {
                a.pop();
            });
            journal.defer(move || {
                store.commit_inference(pending);
            });
            Ok(id)
        })
    };

    submit(CLIENT, "one")?;
    assert!(submit(OTHER, "two").is_err());
    submit(CLIENT, "three")?;
    let limited = submit(CLIENT, "four").unwrap_err();
    assert_eq!(limited.layer(), Some("rate-limit"));

    assert_eq!(accepted.len(), 2);
    assert_eq!(h.store.len(), 2);
    Ok(())
}

#[test]
fn test_failed_verification_inside_pipeline_aborts() -> Result<()> {
    let h = Harness::with_system(groth16());
    let (model_id, vk) = h.register(OWNER, 0x50, groth16());
    let selector = OperationSelector::from_signature("storeInference(uint256,bytes32,bytes)")?;
    let pipeline = LayerPipeline::new(selector);

    let input = InputCommitment::commit(b"public", b"private");
    let output = Output::new("raw", b"result".to_vec());
    let proof = CommitmentBindingBackend::prove(&vk, &input, &Output::new("raw", b"forged".to_vec()));

    let mut accepted: Vec<InferenceId> = Vec::new();
    let store = &h.store;
    let err = pipeline
        .invoke(&mut accepted, &Invocation::new(selector, CLIENT), |accepted, inv, journal| {
            let pending = store.prepare_inference(inv.caller, model_id, input, &output, &proof)?;
            accepted.push(pending.inference_id());
            journal.record(|a: &mut Vec<InferenceId>| {
                a.pop();
            });
            journal.defer(move || {
                store.commit_inference(pending);
            });
            Ok(())
        })
        .unwrap_err();

    assert!(err.to_string().contains("does not match the declared output"));
    assert!(accepted.is_empty());
    assert!(h.store.is_empty());
    Ok(())
}

/// Rejects every invocation after the body ran
struct AuditLayer;

impl Layer for AuditLayer {
    fn name(&self) -> &str {
        "audit"
    }

    fn pre_check(&self, _: &LayerConfig, _: &Invocation) -> Result<CarryData, LayerError> {
        Ok(CarryData::empty())
    }

    fn post_check(&self, _: &LayerConfig, _: &Invocation, _: &CarryData) -> Result<(), LayerError> {
        Err(LayerError::rejected("audit", "settlement window closed"))
    }
}

#[test]
fn test_post_check_failure_leaves_no_record_or_event() -> Result<()> {
    let h = Harness::with_system(groth16());
    let (model_id, vk) = h.register(OWNER, 0x60, groth16());
    h.log.take();

    let selector = OperationSelector::from_signature("storeInference(uint256,bytes32,bytes)")?;
    let pipeline = LayerPipeline::new(selector).with_layer(Arc::new(AuditLayer), LayerConfig::empty());

    let input = InputCommitment::commit(b"public", b"private");
    let output = Output::new("raw", b"result".to_vec());
    let proof = CommitmentBindingBackend::prove(&vk, &input, &output);

    let mut accepted: Vec<InferenceId> = Vec::new();
    let store = &h.store;
    let err = pipeline
        .invoke(&mut accepted, &Invocation::new(selector, CLIENT), |accepted, inv, journal| {
            let pending = store.prepare_inference(inv.caller, model_id, input, &output, &proof)?;
            accepted.push(pending.inference_id());
            journal.record(|a: &mut Vec<InferenceId>| {
                a.pop();
            });
            journal.defer(move || {
                store.commit_inference(pending);
            });
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err.phase(), PipelinePhase::PostChecking);
    assert_eq!(err.layer(), Some("audit"));
    assert!(accepted.is_empty());
    assert!(h.store.is_empty());
    assert!(h.log.is_empty());

    // the same submission commits once nothing objects
    let open = LayerPipeline::new(selector);
    let id = open.invoke(&mut accepted, &Invocation::new(selector, CLIENT), |accepted, inv, journal| {
        let pending = store.prepare_inference(inv.caller, model_id, input, &output, &proof)?;
        let id = pending.inference_id();
        accepted.push(id);
        journal.defer(move || {
            store.commit_inference(pending);
        });
        Ok(id)
    })?;
    assert!(h.store.contains_inference(id));
    assert_eq!(h.log.count_of("InferenceVerified"), 1);
    assert_eq!(h.log.count_of("InferenceStored"), 1);
    Ok(())
}
