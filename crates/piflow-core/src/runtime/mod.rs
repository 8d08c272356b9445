// crates/piflow-core/src/runtime/mod.rs
// ============================================================================
// Module: piflow Runtime
// Description: Reference gateway, audit sinks, and lifecycle entry points.
// Purpose: Run one activation from rule definitions to a gateway submission.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules bind the pure construction layer to a [`crate::RuleGateway`].
//! The lifecycle layer is the only caller of `submit`, and it calls it once per
//! activation.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod gateway;
pub mod lifecycle;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditRecord;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::LifecycleEvent;
pub use audit::MemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::ReconfigureEvent;
pub use audit::RuleSummary;
pub use audit::StderrAuditSink;
pub use audit::SubmissionEvent;
pub use gateway::DeviceStatus;
pub use gateway::InMemoryRuleGateway;
pub use lifecycle::ActivationError;
pub use lifecycle::AppConfig;
pub use lifecycle::AppHandle;
pub use lifecycle::RuleApp;
