// crates/piflow-core/src/lib.rs
// ============================================================================
// Module: piflow Core Library
// Description: Public API surface for programmable-pipeline rule construction.
// Purpose: Expose core types, the gateway contract, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! piflow builds match-action forwarding rules for programmable pipelines and
//! hands them to a rule-management service. Construction is pure and validated
//! against a loaded pipeline schema; submission crosses the [`RuleGateway`]
//! boundary exactly once per activation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AcceptedRule;
pub use interfaces::RejectionReason;
pub use interfaces::RuleGateway;
pub use interfaces::SubmissionError;
pub use interfaces::SubmissionReceipt;
pub use runtime::ActivationError;
pub use runtime::AppConfig;
pub use runtime::AppHandle;
pub use runtime::AuditRecord;
pub use runtime::AuditSink;
pub use runtime::DeviceStatus;
pub use runtime::FileAuditSink;
pub use runtime::InMemoryRuleGateway;
pub use runtime::LifecycleEvent;
pub use runtime::MemoryAuditSink;
pub use runtime::NoopAuditSink;
pub use runtime::ReconfigureEvent;
pub use runtime::RuleApp;
pub use runtime::RuleSummary;
pub use runtime::StderrAuditSink;
pub use runtime::SubmissionEvent;
