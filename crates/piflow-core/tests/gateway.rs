// crates/piflow-core/tests/gateway.rs
// ============================================================================
// Module: In-Memory Gateway Tests
// Description: Tests for the reference rule gateway.
// Purpose: Validate idempotent installation and fail-closed rejections.
// Dependencies: piflow-core
// ============================================================================
//! ## Overview
//! Ensures the in-memory gateway stores one entry per rule key, rejects whole
//! batches on any failure, and enforces reachability, mastership, and layout.

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

use std::sync::Arc;
use std::thread;

use piflow_core::AppId;
use piflow_core::DeviceId;
use piflow_core::DeviceStatus;
use piflow_core::FieldValue;
use piflow_core::InMemoryRuleGateway;
use piflow_core::MatchCriterion;
use piflow_core::RejectionReason;
use piflow_core::Rule;
use piflow_core::RuleGateway;
use piflow_core::Selector;
use piflow_core::SubmissionError;
use piflow_core::Treatment;

use crate::common::IPV4_DST;
use crate::common::IPV4_TABLE;
use crate::common::ROUTER_INTERFACE_ID;
use crate::common::ROUTER_INTERFACE_TABLE;
use crate::common::SCENARIO_APP;
use crate::common::SCENARIO_DEVICE;
use crate::common::sai_schema;
use crate::common::scenario_action;
use crate::common::scenario_rule;

fn leaf1() -> DeviceId {
    DeviceId::parse(SCENARIO_DEVICE).expect("device")
}

fn gateway_with(status: DeviceStatus) -> InMemoryRuleGateway {
    let gateway = InMemoryRuleGateway::new().with_schema(sai_schema());
    gateway.set_device(leaf1(), status).expect("register device");
    gateway
}

fn rule_for_interface(interface: &str, priority: i64) -> Rule {
    let schema = sai_schema();
    let criterion = MatchCriterion::builder(&schema)
        .match_exact(ROUTER_INTERFACE_ID, FieldValue::text(interface))
        .build()
        .expect("criterion");
    Rule::builder()
        .with_selector(Selector::new(criterion))
        .with_treatment(Treatment::new(scenario_action(&schema)))
        .for_table(ROUTER_INTERFACE_TABLE)
        .with_priority(priority)
        .for_device(SCENARIO_DEVICE)
        .from_app(SCENARIO_APP)
        .make_permanent()
        .build()
        .expect("rule")
}

#[test]
fn resubmitting_identical_rule_is_idempotent() {
    let gateway = gateway_with(DeviceStatus::mastered());
    let rule = scenario_rule(&sai_schema());

    let first = gateway.submit(std::slice::from_ref(&rule)).expect("first submission");
    let second = gateway.submit(std::slice::from_ref(&rule)).expect("second submission");

    assert_eq!(gateway.rule_count().unwrap(), 1);
    assert_eq!(gateway.installed_rules().unwrap(), vec![rule.clone()]);
    assert_eq!(first.accepted, second.accepted);
    assert_ne!(first.batch_id, second.batch_id);
    assert_eq!(first.accepted[0].digest, rule.content_digest().unwrap());
}

#[test]
fn rule_with_same_key_replaces_previous_entry() {
    let gateway = gateway_with(DeviceStatus::mastered());
    gateway.submit(&[rule_for_interface("Ethernet/32", 777)]).expect("first");
    let replacement = rule_for_interface("Ethernet/32", 900);
    gateway.submit(std::slice::from_ref(&replacement)).expect("replacement");

    assert_eq!(gateway.rule_count().unwrap(), 1);
    let installed = gateway.rule(&replacement.key()).unwrap().expect("installed");
    assert_eq!(installed.priority().get(), 900);
}

#[test]
fn distinct_keys_are_installed_side_by_side() {
    let gateway = gateway_with(DeviceStatus::mastered());
    let receipt = gateway
        .submit(&[rule_for_interface("Ethernet/32", 777), rule_for_interface("Ethernet/36", 777)])
        .expect("batch");
    assert_eq!(receipt.accepted.len(), 2);
    assert_eq!(gateway.rule_count().unwrap(), 2);
}

#[test]
fn batch_repeating_a_key_is_malformed_and_installs_nothing() {
    let gateway = gateway_with(DeviceStatus::mastered());
    let result = gateway.submit(&[
        rule_for_interface("Ethernet/32", 777),
        rule_for_interface("Ethernet/36", 777),
        rule_for_interface("Ethernet/32", 900),
    ]);
    assert!(matches!(
        result,
        Err(SubmissionError::Rejected(RejectionReason::MalformedRule { index: 2, .. }))
    ));
    assert_eq!(gateway.rule_count().unwrap(), 0);
}

#[test]
fn empty_batch_is_rejected() {
    let gateway = gateway_with(DeviceStatus::mastered());
    assert_eq!(gateway.submit(&[]), Err(SubmissionError::Rejected(RejectionReason::EmptyBatch)));
}

#[test]
fn unknown_or_unreachable_device_is_rejected() {
    let rule = scenario_rule(&sai_schema());
    let expected = Err(SubmissionError::Rejected(RejectionReason::DeviceUnreachable {
        device: leaf1(),
    }));

    let unknown = InMemoryRuleGateway::new();
    assert_eq!(unknown.submit(std::slice::from_ref(&rule)), expected);

    let unreachable = gateway_with(DeviceStatus::unreachable());
    assert_eq!(unreachable.submit(std::slice::from_ref(&rule)), expected);
    assert_eq!(unreachable.rule_count().unwrap(), 0);
}

#[test]
fn standby_controller_is_rejected_as_not_master() {
    let gateway = gateway_with(DeviceStatus::standby());
    let result = gateway.submit(&[scenario_rule(&sai_schema())]);
    assert_eq!(
        result,
        Err(SubmissionError::Rejected(RejectionReason::NotMaster {
            device: leaf1(),
        }))
    );
}

#[test]
fn rejected_batch_installs_nothing() {
    let gateway = gateway_with(DeviceStatus::mastered());
    let good = rule_for_interface("Ethernet/32", 777);
    let foreign = Rule::builder()
        .with_selector(good.selector().clone())
        .with_treatment(good.treatment().clone())
        .for_table(ROUTER_INTERFACE_TABLE)
        .with_priority(777)
        .for_device("device:spine1")
        .from_app(SCENARIO_APP)
        .make_permanent()
        .build()
        .expect("rule");

    let result = gateway.submit(&[good, foreign]);
    assert!(matches!(
        result,
        Err(SubmissionError::Rejected(RejectionReason::DeviceUnreachable { .. }))
    ));
    assert_eq!(gateway.rule_count().unwrap(), 0);
}

#[test]
fn layout_mismatch_is_malformed() {
    let gateway = gateway_with(DeviceStatus::mastered());
    let good = scenario_rule(&sai_schema());
    let wrong_table = Rule::builder()
        .with_selector(good.selector().clone())
        .with_treatment(good.treatment().clone())
        .for_table(IPV4_TABLE)
        .with_priority(777)
        .for_device(SCENARIO_DEVICE)
        .from_app(SCENARIO_APP)
        .make_permanent()
        .build()
        .expect("rule");

    let result = gateway.submit(&[good, wrong_table]);
    assert!(matches!(
        result,
        Err(SubmissionError::Rejected(RejectionReason::MalformedRule { index: 1, .. }))
    ));
}

#[test]
fn missing_key_field_is_malformed() {
    let gateway = gateway_with(DeviceStatus::mastered());
    let schema = sai_schema();
    let partial = MatchCriterion::builder(&schema)
        .match_exact(IPV4_DST, FieldValue::bytes([10_u8, 0, 0, 1]))
        .build()
        .expect("criterion");
    let rule = Rule::builder()
        .with_selector(Selector::new(partial))
        .with_treatment(Treatment::new(scenario_action(&schema)))
        .for_table(IPV4_TABLE)
        .with_priority(10)
        .for_device(SCENARIO_DEVICE)
        .from_app(SCENARIO_APP)
        .make_permanent()
        .build()
        .expect("rule");
    let result = gateway.submit(&[rule]);
    assert!(matches!(
        result,
        Err(SubmissionError::Rejected(RejectionReason::MalformedRule { index: 0, .. }))
    ));
}

#[test]
fn gateway_without_schema_skips_layout_checks() {
    let gateway = InMemoryRuleGateway::new();
    gateway.set_device(leaf1(), DeviceStatus::mastered()).unwrap();
    let good = scenario_rule(&sai_schema());
    let any_table = Rule::builder()
        .with_selector(good.selector().clone())
        .with_treatment(good.treatment().clone())
        .for_table("vendor.custom_table")
        .with_priority(1)
        .for_device(SCENARIO_DEVICE)
        .from_app(SCENARIO_APP)
        .make_permanent()
        .build()
        .expect("rule");
    gateway.submit(&[any_table]).expect("accepted");
}

#[test]
fn withdraw_removes_only_the_owning_app() {
    let gateway = gateway_with(DeviceStatus::mastered());
    let ours = rule_for_interface("Ethernet/32", 777);
    let theirs = Rule::builder()
        .with_selector(Selector::new(
            MatchCriterion::builder(&sai_schema())
                .match_exact(ROUTER_INTERFACE_ID, FieldValue::text("Ethernet/40"))
                .build()
                .expect("criterion"),
        ))
        .with_treatment(ours.treatment().clone())
        .for_table(ROUTER_INTERFACE_TABLE)
        .with_priority(777)
        .for_device(SCENARIO_DEVICE)
        .from_app("org.bar.app")
        .make_permanent()
        .build()
        .expect("rule");
    gateway.submit(&[ours, theirs]).expect("batch");

    assert_eq!(gateway.withdraw_app(&AppId::new(SCENARIO_APP)).unwrap(), 1);
    let remaining = gateway.installed_rules().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].app().as_str(), "org.bar.app");
}

#[test]
fn concurrent_submissions_never_duplicate() {
    let gateway = Arc::new(gateway_with(DeviceStatus::mastered()));
    let handles: Vec<_> = (0 .. 8)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            thread::spawn(move || {
                let rule = scenario_rule(&sai_schema());
                gateway.submit(&[rule]).expect("submission");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join");
    }
    assert_eq!(gateway.rule_count().unwrap(), 1);
}
