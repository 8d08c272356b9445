// crates/piflow-core/tests/lifecycle.rs
// ============================================================================
// Module: Lifecycle Tests
// Description: Tests for start, stop, and reconfigure entry points.
// Purpose: Ensure one submission per activation and fatal construction errors.
// Dependencies: piflow-core
// ============================================================================
//! ## Overview
//! Runs activations against the in-memory gateway and a counting gateway, and
//! inspects the audit trail each entry point leaves behind.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;
use std::sync::Mutex;

use piflow_core::ActivationError;
use piflow_core::AuditRecord;
use piflow_core::BuildError;
use piflow_core::DeviceId;
use piflow_core::DeviceIdError;
use piflow_core::DeviceStatus;
use piflow_core::InMemoryRuleGateway;
use piflow_core::MemoryAuditSink;
use piflow_core::NoopAuditSink;
use piflow_core::RejectionReason;
use piflow_core::Rule;
use piflow_core::RuleApp;
use piflow_core::RuleGateway;
use piflow_core::SubmissionError;
use piflow_core::SubmissionReceipt;

use crate::common::SCENARIO_DEVICE;
use crate::common::app_config;
use crate::common::sai_schema;
use crate::common::scenario_definition;
use crate::common::scenario_rule;

/// Gateway that records every batch it receives.
#[derive(Default)]
struct CountingGateway {
    batches: Mutex<Vec<usize>>,
}

impl CountingGateway {
    fn calls(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

impl RuleGateway for CountingGateway {
    fn submit(&self, rules: &[Rule]) -> Result<SubmissionReceipt, SubmissionError> {
        self.batches.lock().unwrap().push(rules.len());
        Ok(SubmissionReceipt {
            batch_id: "counted".to_string(),
            accepted: Vec::new(),
        })
    }
}

fn mastered_gateway() -> InMemoryRuleGateway {
    let gateway = InMemoryRuleGateway::new().with_schema(sai_schema());
    gateway
        .set_device(DeviceId::parse(SCENARIO_DEVICE).unwrap(), DeviceStatus::mastered())
        .unwrap();
    gateway
}

#[test]
fn start_submits_scenario_rule_once() {
    let app = RuleApp::new(CountingGateway::default(), NoopAuditSink);
    let mut second = scenario_definition();
    second.match_fields.insert("router_interface_id".into(), "Ethernet/36".into());
    let handle = app.start(&app_config(vec![scenario_definition(), second])).expect("start");

    assert_eq!(app.gateway().calls(), vec![2]);
    assert_eq!(handle.rules().len(), 2);
    assert_eq!(handle.rules()[0], scenario_rule(&sai_schema()));
    assert_eq!(handle.receipt().batch_id, "counted");
}

#[test]
fn start_installs_rule_and_audits() {
    let app = RuleApp::new(mastered_gateway(), MemoryAuditSink::new());
    let handle = app.start(&app_config(vec![scenario_definition()])).expect("start");

    assert_eq!(app.gateway().rule_count().unwrap(), 1);
    assert_eq!(handle.receipt().accepted.len(), 1);
    assert_eq!(handle.app_id().as_str(), "org.foo.app");
    assert_eq!(app.audit().event_names(), vec!["lifecycle_start", "rule_submission"]);

    let records = app.audit().records();
    let AuditRecord::Submission(event) = &records[1] else {
        panic!("expected submission event");
    };
    assert!(event.accepted);
    assert_eq!(event.batch_id.as_deref(), Some(handle.receipt().batch_id.as_str()));
    assert_eq!(event.rules[0].digest.as_ref(), Some(&handle.receipt().accepted[0].digest));
}

#[test]
fn construction_error_aborts_before_gateway_call() {
    let app = RuleApp::new(CountingGateway::default(), MemoryAuditSink::new());
    let mut broken = scenario_definition();
    broken.device = "not a uri".to_string();

    let result = app.start(&app_config(vec![scenario_definition(), broken]));
    assert_eq!(
        result.map(|handle| handle.rules().len()),
        Err(ActivationError::Build {
            index: 1,
            source: BuildError::InvalidDeviceId {
                value: "not a uri".to_string(),
                reason: DeviceIdError::IllegalCharacter,
            },
        })
    );
    assert!(app.gateway().calls().is_empty());

    let records = app.audit().records();
    assert_eq!(records.len(), 1);
    let AuditRecord::Lifecycle(event) = &records[0] else {
        panic!("expected lifecycle event");
    };
    assert!(event.error.is_some());
}

#[test]
fn gateway_rejection_is_surfaced_without_retry() {
    let gateway = InMemoryRuleGateway::new();
    gateway
        .set_device(DeviceId::parse(SCENARIO_DEVICE).unwrap(), DeviceStatus::standby())
        .unwrap();
    let app = RuleApp::new(gateway, MemoryAuditSink::new());

    let result = app.start(&app_config(vec![scenario_definition()]));
    assert!(matches!(
        result,
        Err(ActivationError::Submission(SubmissionError::Rejected(RejectionReason::NotMaster {
            ..
        })))
    ));
    let submissions = app
        .audit()
        .records()
        .into_iter()
        .filter(|record| matches!(record, AuditRecord::Submission(event) if !event.accepted))
        .count();
    assert_eq!(submissions, 1);
}

#[test]
fn empty_rule_list_is_rejected_by_gateway() {
    let app = RuleApp::new(mastered_gateway(), NoopAuditSink);
    let result = app.start(&app_config(Vec::new()));
    assert!(matches!(
        result,
        Err(ActivationError::Submission(SubmissionError::Rejected(RejectionReason::EmptyBatch)))
    ));
}

#[test]
fn stop_leaves_rules_installed() {
    let app = RuleApp::new(mastered_gateway(), MemoryAuditSink::new());
    let handle = app.start(&app_config(vec![scenario_definition()])).expect("start");
    app.stop(handle);

    assert_eq!(app.gateway().rule_count().unwrap(), 1);
    assert_eq!(
        app.audit().event_names(),
        vec!["lifecycle_start", "rule_submission", "lifecycle_stop"]
    );
}

#[test]
fn reconfigure_updates_properties_without_resubmitting() {
    let app = RuleApp::new(CountingGateway::default(), MemoryAuditSink::new());
    let mut handle = app.start(&app_config(vec![scenario_definition()])).expect("start");
    assert_eq!(handle.property("someProperty"), Some("Some Default String Value"));

    let properties = BTreeMap::from([
        ("someProperty".to_string(), "updated".to_string()),
        ("extra".to_string(), "1".to_string()),
    ]);
    let changed = app.reconfigure(&mut handle, properties);

    assert_eq!(changed, vec!["extra".to_string(), "someProperty".to_string()]);
    assert_eq!(handle.property("someProperty"), Some("updated"));
    assert_eq!(app.gateway().calls(), vec![1]);

    let current = handle.properties().clone();
    let unchanged = app.reconfigure(&mut handle, current);
    assert!(unchanged.is_empty());
    assert_eq!(app.audit().event_names().last(), Some(&"lifecycle_reconfigure"));
}
