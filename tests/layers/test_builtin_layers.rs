// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Allowlist, value cap and execution budget composed in one pipeline

use anyhow::Result;
use ethers::types::U256;
use fabstir_model_verifier::config::RateLimitSettings;
use fabstir_model_verifier::layers::{
    AllowlistLayer, ExecutionBudgetLayer, Invocation, LayerConfig, LayerError, LayerPipeline,
    PipelineError, PipelinePhase, RateLimitLayer, ValueCapLayer,
};
use fabstir_model_verifier::OperationSelector;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{CLIENT, OTHER};

fn selector() -> OperationSelector {
    OperationSelector::from_signature("transfer(address,uint256)").unwrap()
}

fn guarded(budget_ms: u64) -> LayerPipeline {
    LayerPipeline::new(selector())
        .with_layer(Arc::new(AllowlistLayer::new()), AllowlistLayer::config(vec![CLIENT]))
        .with_layer(Arc::new(ValueCapLayer::new()), ValueCapLayer::config(U256::from(1_000)))
        .with_layer(
            Arc::new(RateLimitLayer::new()),
            RateLimitLayer::config(RateLimitSettings::default()),
        )
        .with_layer(Arc::new(ExecutionBudgetLayer::new()), ExecutionBudgetLayer::config(budget_ms))
}

fn transfer(
    pipeline: &LayerPipeline,
    balances: &mut Vec<u64>,
    invocation: &Invocation,
    delay: Duration,
) -> Result<usize, PipelineError> {
    let amount = invocation.value.as_u64();
    pipeline.invoke(balances, invocation, move |balances, _, journal| {
        balances.push(amount);
        journal.record(|b: &mut Vec<u64>| {
            b.pop();
        });
        std::thread::sleep(delay);
        Ok(balances.len())
    })
}

#[test]
fn test_well_formed_transfer_commits() -> Result<()> {
    let pipeline = guarded(5_000);
    let mut balances = Vec::new();
    let invocation = Invocation::new(selector(), CLIENT).with_value(U256::from(250));

    assert_eq!(transfer(&pipeline, &mut balances, &invocation, Duration::ZERO)?, 1);
    assert_eq!(balances, vec![250]);
    assert_eq!(
        pipeline.layer_names(),
        vec!["allowlist", "value-cap", "rate-limit", "execution-budget"]
    );
    Ok(())
}

#[test]
fn test_unlisted_caller_rejected_first() {
    let pipeline = guarded(5_000);
    let mut balances = Vec::new();
    let invocation = Invocation::new(selector(), OTHER).with_value(U256::from(5_000));

    let err = transfer(&pipeline, &mut balances, &invocation, Duration::ZERO).unwrap_err();
    assert_eq!(err.layer(), Some("allowlist"));
    assert_eq!(err.phase(), PipelinePhase::PreChecking);
    assert!(balances.is_empty());
}

#[test]
fn test_value_over_cap_rejected() {
    let pipeline = guarded(5_000);
    let mut balances = Vec::new();
    let invocation = Invocation::new(selector(), CLIENT).with_value(U256::from(1_001));

    let err = transfer(&pipeline, &mut balances, &invocation, Duration::ZERO).unwrap_err();
    assert_eq!(err.layer(), Some("value-cap"));
    assert!(matches!(err.layer_error(), Some(LayerError::Rejected { .. })));
    assert!(balances.is_empty());
}

#[test]
fn test_slow_body_exceeds_budget_and_rolls_back() {
    let pipeline = guarded(5);
    let mut balances = vec![1, 2];
    let invocation = Invocation::new(selector(), CLIENT).with_value(U256::from(10));

    let err = transfer(&pipeline, &mut balances, &invocation, Duration::from_millis(40)).unwrap_err();
    assert_eq!(err.phase(), PipelinePhase::PostChecking);
    assert_eq!(err.layer(), Some("execution-budget"));
    assert_eq!(balances, vec![1, 2]);
}

#[test]
fn test_invalid_layer_config_aborts_before_body() {
    let pipeline = LayerPipeline::new(selector()).with_layer(
        Arc::new(ValueCapLayer::new()),
        LayerConfig::new(serde_json::json!({ "max_value": "lots" })),
    );
    let mut balances = Vec::new();
    let invocation = Invocation::new(selector(), CLIENT);

    let err = transfer(&pipeline, &mut balances, &invocation, Duration::ZERO).unwrap_err();
    assert_eq!(err.phase(), PipelinePhase::PreChecking);
    assert!(matches!(err.layer_error(), Some(LayerError::InvalidConfig { .. })));
    assert!(balances.is_empty());
}
