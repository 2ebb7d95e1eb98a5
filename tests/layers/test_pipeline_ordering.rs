// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Layer execution order, carry data and abort phases

use anyhow::Result;
use fabstir_model_verifier::layers::{
    CarryData, Invocation, Layer, LayerBinding, LayerConfig, LayerError, LayerPipeline,
    PipelineError, PipelinePhase,
};
use fabstir_model_verifier::{ErrorKind, OperationSelector};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::common::CLIENT;

type Trace = Arc<Mutex<Vec<String>>>;

/// Records every hook call; fails where its config says so
struct RecordingLayer {
    name: String,
    trace: Trace,
}

impl RecordingLayer {
    fn new(name: &str, trace: &Trace) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            trace: trace.clone(),
        })
    }

    fn log(&self, entry: String) {
        self.trace.lock().unwrap().push(entry);
    }

    fn fails_at(config: &LayerConfig, phase: &str) -> bool {
        config.as_value().get("fail").and_then(|v| v.as_str()) == Some(phase)
    }
}

impl Layer for RecordingLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn pre_check(&self, config: &LayerConfig, _: &Invocation) -> Result<CarryData, LayerError> {
        self.log(format!("pre:{}", self.name));
        if Self::fails_at(config, "pre") {
            return Err(LayerError::rejected(&self.name, "pre-check failed"));
        }
        Ok(CarryData::from_bytes(self.name.as_bytes().to_vec()))
    }

    fn post_check(&self, config: &LayerConfig, _: &Invocation, carry: &CarryData) -> Result<(), LayerError> {
        self.log(format!("post:{}", self.name));
        if carry.as_bytes() != self.name.as_bytes() {
            return Err(LayerError::InvalidCarryData {
                layer: self.name.clone(),
                reason: "carry data from another layer".to_string(),
            });
        }
        if Self::fails_at(config, "post") {
            return Err(LayerError::rejected(&self.name, "post-check failed"));
        }
        Ok(())
    }

    fn on_abort(&self, _: &LayerConfig, _: &Invocation, _: &CarryData) {
        self.log(format!("abort:{}", self.name));
    }
}

fn selector() -> OperationSelector {
    OperationSelector::from_signature("execute(bytes)").unwrap()
}

fn pass() -> LayerConfig {
    LayerConfig::empty()
}

fn fail(phase: &str) -> LayerConfig {
    LayerConfig::new(serde_json::json!({ "fail": phase }))
}

fn pipeline(trace: &Trace, configs: [LayerConfig; 3]) -> LayerPipeline {
    let [a, b, c] = configs;
    LayerPipeline::new(selector())
        .with_layer(RecordingLayer::new("A", trace), a)
        .with_layer(RecordingLayer::new("B", trace), b)
        .with_layer(RecordingLayer::new("C", trace), c)
}

fn run(pipeline: &LayerPipeline, trace: &Trace) -> Result<u32, PipelineError> {
    let mut state = 0u32;
    let trace = trace.clone();
    pipeline.invoke(&mut state, &Invocation::new(selector(), CLIENT), move |s, _, _| {
        trace.lock().unwrap().push("body".to_string());
        *s += 1;
        Ok(*s)
    })
}

fn entries(trace: &Trace) -> Vec<String> {
    trace.lock().unwrap().clone()
}

#[test]
fn test_all_pass_runs_in_configured_order() -> Result<()> {
    let trace = Trace::default();
    let pipeline = pipeline(&trace, [pass(), pass(), pass()]);

    assert_eq!(run(&pipeline, &trace)?, 1);
    assert_eq!(
        entries(&trace),
        vec!["pre:A", "pre:B", "pre:C", "body", "post:A", "post:B", "post:C"]
    );
    Ok(())
}

#[test]
fn test_pre_check_failure_skips_rest() {
    let trace = Trace::default();
    let pipeline = pipeline(&trace, [pass(), fail("pre"), pass()]);

    let err = run(&pipeline, &trace).unwrap_err();
    assert_eq!(err.phase(), PipelinePhase::PreChecking);
    assert_eq!(err.layer(), Some("B"));
    assert_eq!(err.kind(), ErrorKind::LayerRejection);

    // C, the body and every post-check never ran; A was released
    assert_eq!(entries(&trace), vec!["pre:A", "pre:B", "abort:A"]);
}

#[test]
fn test_post_check_failure_releases_every_layer() {
    let trace = Trace::default();
    let pipeline = pipeline(&trace, [pass(), fail("post"), pass()]);

    let err = run(&pipeline, &trace).unwrap_err();
    assert_eq!(err.phase(), PipelinePhase::PostChecking);
    assert_eq!(err.layer(), Some("B"));
    assert_eq!(
        entries(&trace),
        vec![
            "pre:A", "pre:B", "pre:C", "body", "post:A", "post:B", "abort:C", "abort:B", "abort:A"
        ]
    );
}

#[test]
fn test_first_layer_failure_releases_nothing() {
    let trace = Trace::default();
    let pipeline = pipeline(&trace, [fail("pre"), pass(), pass()]);

    assert!(run(&pipeline, &trace).is_err());
    assert_eq!(entries(&trace), vec!["pre:A"]);
}

#[test]
fn test_selector_mismatch_runs_nothing() {
    let trace = Trace::default();
    let pipeline = pipeline(&trace, [pass(), pass(), pass()]);
    let other = OperationSelector::from_signature("other()").unwrap();

    let mut state = 0u32;
    let err = pipeline
        .invoke(&mut state, &Invocation::new(other, CLIENT), |s, _, _| {
            *s += 1;
            Ok(())
        })
        .unwrap_err();

    assert!(matches!(err, PipelineError::SelectorMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(state, 0);
    assert!(entries(&trace).is_empty());
}

#[test]
fn test_push_appends_and_set_layers_reorders() -> Result<()> {
    let trace = Trace::default();
    let mut pipeline = LayerPipeline::new(selector())
        .with_layer(RecordingLayer::new("A", &trace), pass());
    pipeline.push_layer(RecordingLayer::new("B", &trace), pass());
    assert_eq!(pipeline.layer_names(), vec!["A", "B"]);

    pipeline.set_layers(vec![
        LayerBinding::new(RecordingLayer::new("B", &trace), pass()),
        LayerBinding::new(RecordingLayer::new("A", &trace), pass()),
    ]);
    assert_eq!(pipeline.layer_names(), vec!["B", "A"]);

    run(&pipeline, &trace)?;
    assert_eq!(
        entries(&trace),
        vec!["pre:B", "pre:A", "body", "post:B", "post:A"]
    );
    Ok(())
}

#[test]
fn test_empty_pipeline_just_runs_body() -> Result<()> {
    let trace = Trace::default();
    let pipeline = LayerPipeline::new(selector());
    assert!(pipeline.is_empty());
    assert_eq!(run(&pipeline, &trace)?, 1);
    assert_eq!(entries(&trace), vec!["body"]);
    Ok(())
}

/// Hands out a sequence number in its pre-check
struct TicketLayer {
    issued: Arc<AtomicU64>,
}

impl Layer for TicketLayer {
    fn name(&self) -> &str {
        "ticket"
    }

    fn pre_check(&self, _: &LayerConfig, _: &Invocation) -> Result<CarryData, LayerError> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CarryData::from_u64(ticket))
    }

    fn post_check(&self, _: &LayerConfig, _: &Invocation, _: &CarryData) -> Result<(), LayerError> {
        Ok(())
    }
}

/// Admits only while no ticket has been issued
struct FirstComerLayer {
    issued: Arc<AtomicU64>,
}

impl Layer for FirstComerLayer {
    fn name(&self) -> &str {
        "first-comer"
    }

    fn pre_check(&self, _: &LayerConfig, _: &Invocation) -> Result<CarryData, LayerError> {
        let issued = self.issued.load(Ordering::SeqCst);
        if issued > 0 {
            return Err(LayerError::rejected("first-comer", format!("{} tickets already issued", issued)));
        }
        Ok(CarryData::empty())
    }

    fn post_check(&self, _: &LayerConfig, _: &Invocation, _: &CarryData) -> Result<(), LayerError> {
        Ok(())
    }
}

fn ticketing(ticket_first: bool) -> LayerPipeline {
    let issued = Arc::new(AtomicU64::new(0));
    let ticket = LayerBinding::new(Arc::new(TicketLayer { issued: issued.clone() }), pass());
    let gate = LayerBinding::new(Arc::new(FirstComerLayer { issued }), pass());

    let mut pipeline = LayerPipeline::new(selector());
    if ticket_first {
        pipeline.set_layers(vec![ticket, gate]);
    } else {
        pipeline.set_layers(vec![gate, ticket]);
    }
    pipeline
}

#[test]
fn test_layer_order_changes_outcome() -> Result<()> {
    let trace = Trace::default();

    // the gate looks before any ticket exists
    let gate_first = ticketing(false);
    assert_eq!(gate_first.layer_names(), vec!["first-comer", "ticket"]);
    assert_eq!(run(&gate_first, &trace)?, 1);

    // the same layers reversed: the gate sees the ticket just issued
    let ticket_first = ticketing(true);
    let err = run(&ticket_first, &trace).unwrap_err();
    assert_eq!(err.phase(), PipelinePhase::PreChecking);
    assert_eq!(err.layer(), Some("first-comer"));
    assert_eq!(entries(&trace), vec!["body"]);
    Ok(())
}
