// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inference record store: persistence, replays and disabled storage

use anyhow::Result;
use fabstir_model_verifier::config::VerifierConfig;
use fabstir_model_verifier::events::Event;
use fabstir_model_verifier::verifier::{
    random_nonce, CommitmentBindingBackend, InferenceId, InferenceStore, InputCommitment,
    VerifierError,
};
use fabstir_model_verifier::ErrorKind;

use crate::common::{sample_inference, Harness, CLIENT, OWNER};

#[test]
fn test_store_persists_record() -> Result<()> {
    let h = Harness::new();
    let (model_id, vk) = h.register_mock(OWNER);
    h.log.take();

    let (input, output) = sample_inference(b"private");
    let proof = CommitmentBindingBackend::prove(&vk, &input, &output);
    let inference_id = h
        .store
        .verify_and_store_inference(CLIENT, model_id, input, &output, &proof)?;

    assert_eq!(inference_id, InferenceId::derive(model_id, &input, &output));
    let record = h.store.get_inference(inference_id)?;
    assert_eq!(record.model_id, model_id);
    assert_eq!(record.input_commitment, input);
    assert_eq!(record.output, output);

    let names: Vec<&str> = h.log.events().iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["InferenceVerified", "InferenceStored"]);
    assert_eq!(
        h.log.events()[1],
        Event::InferenceStored { inference_id }
    );
    Ok(())
}

#[test]
fn test_resubmission_is_idempotent() -> Result<()> {
    let h = Harness::new();
    let (model_id, vk) = h.register_mock(OWNER);
    let (input, output) = sample_inference(b"private");
    let proof = CommitmentBindingBackend::prove(&vk, &input, &output);

    let first = h
        .store
        .verify_and_store_inference(CLIENT, model_id, input, &output, &proof)?;
    let second = h
        .store
        .verify_and_store_inference(CLIENT, model_id, input, &output, &proof)?;

    assert_eq!(first, second);
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.log.count_of("InferenceStored"), 1);
    assert_eq!(h.log.count_of("InferenceVerified"), 2);

    let metrics = h.verifier.metrics().snapshot();
    assert_eq!(metrics.stored, 1);
    assert_eq!(metrics.replays, 1);
    Ok(())
}

#[test]
fn test_nonces_make_repeated_inputs_distinct() -> Result<()> {
    let h = Harness::new();
    let (model_id, vk) = h.register_mock(OWNER);
    let (_, output) = sample_inference(b"unused");

    let mut ids = Vec::new();
    for _ in 0..3 {
        let input = InputCommitment::with_nonce(b"same public", b"same private", &random_nonce());
        let proof = CommitmentBindingBackend::prove(&vk, &input, &output);
        ids.push(
            h.store
                .verify_and_store_inference(CLIENT, model_id, input, &output, &proof)?,
        );
    }

    assert_eq!(h.store.len(), 3);
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    Ok(())
}

#[test]
fn test_failed_verification_stores_nothing() {
    let h = Harness::new();
    let (model_id, vk) = h.register_mock(OWNER);
    let (input, output) = sample_inference(b"private");
    let mut proof = CommitmentBindingBackend::prove(&vk, &input, &output);
    proof[110] ^= 0x01;

    let err = h
        .store
        .verify_and_store_inference(CLIENT, model_id, input, &output, &proof)
        .unwrap_err();
    assert_eq!(err, VerifierError::InvalidProof { model_id });
    assert!(h.store.is_empty());
    assert!(!h
        .store
        .contains_inference(InferenceId::derive(model_id, &input, &output)));
    assert_eq!(h.log.count_of("InferenceStored"), 0);
}

#[test]
fn test_unknown_inference_lookup() {
    let h = Harness::new();
    let missing = InferenceId::derive(
        fabstir_model_verifier::registry::ModelId(1),
        &InputCommitment::commit(b"", b""),
        &sample_inference(b"").1,
    );
    let err = h.store.get_inference(missing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_disabled_store_refuses() {
    let h = Harness::new();
    let (model_id, vk) = h.register_mock(OWNER);
    let config = VerifierConfig {
        store_inferences: false,
        ..VerifierConfig::default()
    };
    let store = InferenceStore::from_config(&config, h.verifier.clone());
    assert!(!store.is_enabled());

    let (input, output) = sample_inference(b"private");
    let proof = CommitmentBindingBackend::prove(&vk, &input, &output);
    assert_eq!(
        store
            .verify_and_store_inference(CLIENT, model_id, input, &output, &proof)
            .unwrap_err(),
        VerifierError::StoreDisabled
    );

    // plain verification still works
    assert!(h
        .verifier
        .verify_inference(CLIENT, model_id, input, &output, &proof)
        .is_ok());
}
