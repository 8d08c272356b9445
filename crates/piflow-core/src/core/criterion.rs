// crates/piflow-core/src/core/criterion.rs
// ============================================================================
// Module: Match Criteria
// Description: Exact-match field/value conjunctions and their builder.
// Purpose: Build immutable, canonically ordered match criteria.
// Dependencies: crate::core::{error, identifiers, schema, value}, serde
// ============================================================================

//! ## Overview
//! A [`MatchCriterion`] is keyed by field identifier, so two criteria with the same
//! fields compare, hash, and serialize identically whatever order the fields were
//! supplied in.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::BuildError;
use crate::core::identifiers::MatchFieldId;
use crate::core::schema::PipelineSchema;
use crate::core::value::FieldValue;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One exact-match condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchField {
    /// Field identifier.
    pub field: MatchFieldId,
    /// Value the field must equal.
    pub value: FieldValue,
}

/// Conjunction of exact-match conditions for one rule.
///
/// # Invariants
/// - Field identifiers are unique and every value fits its declared width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MatchCriterion {
    /// Values keyed by field identifier.
    fields: BTreeMap<MatchFieldId, FieldValue>,
}

impl MatchCriterion {
    /// Starts a criterion builder resolving fields against `schema`.
    #[must_use]
    pub const fn builder(schema: &PipelineSchema) -> MatchCriterionBuilder<'_> {
        MatchCriterionBuilder::new(schema)
    }

    /// Returns the value bound to a field.
    #[must_use]
    pub fn get(&self, field: &MatchFieldId) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Iterates over fields in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&MatchFieldId, &FieldValue)> {
        self.fields.iter()
    }

    /// Returns the number of match fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true when the criterion matches every packet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Collects exact-match fields and validates them on [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct MatchCriterionBuilder<'a> {
    /// Schema used to resolve field widths.
    schema: &'a PipelineSchema,
    /// Fields in supply order.
    pending: Vec<MatchField>,
}

impl<'a> MatchCriterionBuilder<'a> {
    /// Creates an empty builder.
    #[must_use]
    pub const fn new(schema: &'a PipelineSchema) -> Self {
        Self {
            schema,
            pending: Vec::new(),
        }
    }

    /// Adds an exact-match condition.
    #[must_use]
    pub fn match_exact(mut self, field: impl Into<MatchFieldId>, value: FieldValue) -> Self {
        self.pending.push(MatchField {
            field: field.into(),
            value,
        });
        self
    }

    /// Adds several exact-match conditions.
    #[must_use]
    pub fn match_all<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = MatchField>,
    {
        self.pending.extend(fields);
        self
    }

    /// Validates the collected fields and builds the criterion.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownField`], [`BuildError::DuplicateField`], or
    /// [`BuildError::FieldWidth`] for the first offending field in supply order.
    pub fn build(self) -> Result<MatchCriterion, BuildError> {
        let mut fields = BTreeMap::new();
        for MatchField {
            field,
            value,
        } in self.pending
        {
            let width = self
                .schema
                .match_field_width(&field)
                .ok_or_else(|| BuildError::UnknownField(field.clone()))?;
            if fields.contains_key(&field) {
                return Err(BuildError::DuplicateField(field));
            }
            value.check(width).map_err(|mismatch| BuildError::FieldWidth {
                name: field.to_string(),
                expected: mismatch.expected,
                actual: mismatch.actual,
            })?;
            fields.insert(field, value);
        }
        Ok(MatchCriterion {
            fields,
        })
    }
}
