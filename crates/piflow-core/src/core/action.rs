// crates/piflow-core/src/core/action.rs
// ============================================================================
// Module: Action Descriptors
// Description: Action invocations with bound parameters and their builder.
// Purpose: Build action descriptors whose parameter order follows the pipeline.
// Dependencies: crate::core::{error, identifiers, schema, value}, serde
// ============================================================================

//! ## Overview
//! [`ActionBuilder`] accepts parameters in any order and emits them in the order
//! the pipeline declares, so logically identical actions serialize identically.
//! The supplied set must match the declared signature exactly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::BuildError;
use crate::core::error::ParamMismatch;
use crate::core::identifiers::ActionId;
use crate::core::identifiers::ActionParamId;
use crate::core::schema::PipelineSchema;
use crate::core::value::FieldValue;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One named action argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionParam {
    /// Parameter identifier.
    pub id: ActionParamId,
    /// Bound value.
    pub value: FieldValue,
}

impl ActionParam {
    /// Creates a parameter binding.
    #[must_use]
    pub fn new(id: impl Into<ActionParamId>, value: FieldValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

/// One action invocation.
///
/// # Invariants
/// - `params` holds exactly the declared parameters, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ActionDescriptor {
    /// Action identifier.
    action: ActionId,
    /// Bound parameters in pipeline-declared order.
    params: Vec<ActionParam>,
}

impl ActionDescriptor {
    /// Returns the action identifier.
    #[must_use]
    pub const fn action(&self) -> &ActionId {
        &self.action
    }

    /// Returns the bound parameters in declared order.
    #[must_use]
    pub fn params(&self) -> &[ActionParam] {
        &self.params
    }

    /// Returns the value bound to a parameter.
    #[must_use]
    pub fn param(&self, id: &ActionParamId) -> Option<&FieldValue> {
        self.params.iter().find(|param| &param.id == id).map(|param| &param.value)
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Collects parameters for one action and validates them against its signature.
#[derive(Debug, Clone)]
pub struct ActionBuilder<'a> {
    /// Schema holding the action catalog.
    schema: &'a PipelineSchema,
    /// Action being invoked.
    action: ActionId,
    /// Parameters in supply order.
    pending: Vec<ActionParam>,
}

impl<'a> ActionBuilder<'a> {
    /// Creates a builder for the given action.
    #[must_use]
    pub fn new(schema: &'a PipelineSchema, action: impl Into<ActionId>) -> Self {
        Self {
            schema,
            action: action.into(),
            pending: Vec::new(),
        }
    }

    /// Binds one parameter.
    #[must_use]
    pub fn param(mut self, id: impl Into<ActionParamId>, value: FieldValue) -> Self {
        self.pending.push(ActionParam::new(id, value));
        self
    }

    /// Binds several parameters.
    #[must_use]
    pub fn params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = ActionParam>,
    {
        self.pending.extend(params);
        self
    }

    /// Validates the parameters and builds the descriptor.
    ///
    /// Checks run in a fixed order: action lookup, duplicates, undeclared
    /// parameters, missing parameters, then widths in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownAction`], [`BuildError::ParameterMismatch`], or
    /// [`BuildError::FieldWidth`].
    pub fn build(self) -> Result<ActionDescriptor, BuildError> {
        let spec = self
            .schema
            .action(&self.action)
            .ok_or_else(|| BuildError::UnknownAction(self.action.clone()))?;

        let mut supplied: BTreeMap<ActionParamId, FieldValue> = BTreeMap::new();
        for ActionParam {
            id,
            value,
        } in self.pending
        {
            if supplied.contains_key(&id) {
                return Err(mismatch(&self.action, ParamMismatch::Duplicate(id)));
            }
            if spec.param(&id).is_none() {
                return Err(mismatch(&self.action, ParamMismatch::Unexpected(id)));
            }
            supplied.insert(id, value);
        }

        let mut params = Vec::with_capacity(spec.params.len());
        for declared in &spec.params {
            let value = supplied
                .remove(&declared.id)
                .ok_or_else(|| mismatch(&self.action, ParamMismatch::Missing(declared.id.clone())))?;
            params.push(ActionParam {
                id: declared.id.clone(),
                value,
            });
        }
        for (param, declared) in params.iter().zip(&spec.params) {
            param.value.check(declared.width).map_err(|err| BuildError::FieldWidth {
                name: format!("{}.{}", self.action, param.id),
                expected: err.expected,
                actual: err.actual,
            })?;
        }

        Ok(ActionDescriptor {
            action: self.action,
            params,
        })
    }
}

/// Builds a parameter mismatch error for `action`.
fn mismatch(action: &ActionId, detail: ParamMismatch) -> BuildError {
    BuildError::ParameterMismatch {
        action: action.clone(),
        detail,
    }
}
