// crates/piflow-core/src/core/error.rs
// ============================================================================
// Module: Construction Errors
// Description: Error taxonomy for match, action, and rule construction.
// Purpose: Surface caller mistakes in literal inputs before any gateway call.
// Dependencies: crate::core::{identifiers, schema}, thiserror
// ============================================================================

//! ## Overview
//! Every variant is a local, non-retryable precondition violation. Builders stop at
//! the first violation they find; nothing is partially built.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::core::identifiers::ActionId;
use crate::core::identifiers::ActionParamId;
use crate::core::identifiers::DeviceIdError;
use crate::core::identifiers::MatchFieldId;
use crate::core::schema::FieldWidth;

// ============================================================================
// SECTION: Parameter Mismatch Detail
// ============================================================================

/// How a supplied parameter set deviates from an action's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamMismatch {
    /// Declared parameter was not supplied.
    Missing(ActionParamId),
    /// Supplied parameter is not declared by the action.
    Unexpected(ActionParamId),
    /// Parameter was supplied more than once.
    Duplicate(ActionParamId),
}

impl fmt::Display for ParamMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(param) => write!(f, "missing parameter {param}"),
            Self::Unexpected(param) => write!(f, "unexpected parameter {param}"),
            Self::Duplicate(param) => write!(f, "duplicate parameter {param}"),
        }
    }
}

// ============================================================================
// SECTION: Build Error
// ============================================================================

/// Construction-time errors raised by the builders.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Same match field supplied twice in one criterion.
    #[error("duplicate match field: {0}")]
    DuplicateField(MatchFieldId),
    /// Match field is not declared by the pipeline.
    #[error("unknown match field: {0}")]
    UnknownField(MatchFieldId),
    /// Value does not fit the declared width of a field or parameter.
    #[error("width mismatch for {name}: expected {expected}, got {actual}")]
    FieldWidth {
        /// Field or parameter name.
        name: String,
        /// Declared width.
        expected: FieldWidth,
        /// Observed value shape.
        actual: String,
    },
    /// Action is not in the pipeline's action catalog.
    #[error("unknown action: {0}")]
    UnknownAction(ActionId),
    /// Parameters do not match the action's declared signature.
    #[error("parameter mismatch for action {action}: {detail}")]
    ParameterMismatch {
        /// Action being built.
        action: ActionId,
        /// First deviation found.
        detail: ParamMismatch,
    },
    /// Priority outside `0..=65535`.
    #[error("invalid priority {0}: must be within 0..=65535")]
    InvalidPriority(i64),
    /// Device identifier failed to parse.
    #[error("invalid device id \"{value}\": {reason}")]
    InvalidDeviceId {
        /// Supplied device string.
        value: String,
        /// Parse failure.
        reason: DeviceIdError,
    },
    /// Timed rule with a timeout outside `1..=65535` seconds.
    #[error("invalid timeout {0}s: must be within 1..=65535")]
    InvalidTimeout(i64),
    /// Required component was never supplied to a builder.
    #[error("missing rule component: {0}")]
    MissingComponent(&'static str),
}
