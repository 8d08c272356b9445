// crates/piflow-core/src/interfaces/mod.rs
// ============================================================================
// Module: piflow Interfaces
// Description: Contract surface for the rule-management service.
// Purpose: Define how assembled rules leave the core.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The core hands assembled rules to a [`RuleGateway`]. Acceptance or rejection is
//! synchronous; programming the device happens later and is not observable here.
//! Gateways own reachability, mastership, serialization of concurrent
//! submissions, replacement, and withdrawal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::HashDigest;
use crate::core::Priority;
use crate::core::Rule;
use crate::core::identifiers::DeviceId;
use crate::core::identifiers::TableId;

// ============================================================================
// SECTION: Receipts
// ============================================================================

/// Summary of one accepted rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedRule {
    /// Target device.
    pub device: DeviceId,
    /// Target table.
    pub table: TableId,
    /// Rule priority.
    pub priority: Priority,
    /// Canonical content digest of the rule.
    pub digest: HashDigest,
}

/// Acknowledgement that a batch was accepted for installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    /// Gateway-assigned batch identifier.
    pub batch_id: String,
    /// Accepted rules in submission order.
    pub accepted: Vec<AcceptedRule>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Why a gateway refused a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Batch contained no rules.
    EmptyBatch,
    /// Rule does not fit the device pipeline.
    MalformedRule {
        /// Position of the rule in the batch.
        index: usize,
        /// Gateway explanation.
        detail: String,
    },
    /// Device is unknown or not reachable.
    DeviceUnreachable {
        /// Target device.
        device: DeviceId,
    },
    /// This controller instance is not master for the device.
    NotMaster {
        /// Target device.
        device: DeviceId,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyBatch => f.write_str("empty batch"),
            Self::MalformedRule {
                index,
                detail,
            } => write!(f, "malformed rule at index {index}: {detail}"),
            Self::DeviceUnreachable {
                device,
            } => write!(f, "device {device} is unreachable"),
            Self::NotMaster {
                device,
            } => write!(f, "not master for device {device}"),
        }
    }
}

/// Errors reported by a rule gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Gateway rejected the batch; nothing was accepted.
    #[error("submission rejected: {0}")]
    Rejected(RejectionReason),
    /// Gateway failed internally.
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// SECTION: Rule Gateway
// ============================================================================

/// Rule-management service accepting assembled rules.
pub trait RuleGateway {
    /// Submits a batch of rules for asynchronous installation.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError`] when the batch is rejected or the gateway fails.
    fn submit(&self, rules: &[Rule]) -> Result<SubmissionReceipt, SubmissionError>;
}
