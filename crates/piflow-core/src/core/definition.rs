// crates/piflow-core/src/core/definition.rs
// ============================================================================
// Module: Rule Definitions
// Description: Declarative, serializable rule literals.
// Purpose: Feed configured rules through the match, action, and rule builders.
// Dependencies: crate::core::*, serde
// ============================================================================

//! ## Overview
//! A [`RuleDefinition`] is the literal form of one rule as written in
//! configuration. [`RuleDefinition::assemble`] encodes each literal against the
//! schema's declared width and then runs the regular builders, so definitions
//! and programmatic callers share every validation path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::action::ActionBuilder;
use crate::core::criterion::MatchCriterion;
use crate::core::error::BuildError;
use crate::core::error::ParamMismatch;
use crate::core::flow::Selector;
use crate::core::flow::Treatment;
use crate::core::identifiers::ActionId;
use crate::core::identifiers::ActionParamId;
use crate::core::identifiers::AppId;
use crate::core::identifiers::MatchFieldId;
use crate::core::identifiers::TableId;
use crate::core::rule::Rule;
use crate::core::schema::FieldWidth;
use crate::core::schema::PipelineSchema;
use crate::core::value::FieldValue;
use crate::core::value::ValueLiteral;
use crate::core::value::WidthMismatch;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Literal action invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionDefinition {
    /// Action identifier.
    pub name: ActionId,
    /// Parameter literals keyed by parameter identifier.
    #[serde(default)]
    pub params: BTreeMap<ActionParamId, ValueLiteral>,
}

/// Literal rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDefinition {
    /// Target device URI (validated on assembly).
    pub device: String,
    /// Target table.
    pub table: TableId,
    /// Priority (validated on assembly).
    pub priority: i64,
    /// Idle timeout in seconds; absent means permanent.
    #[serde(default)]
    pub timeout_secs: Option<i64>,
    /// Exact-match literals keyed by field identifier.
    #[serde(rename = "match", default)]
    pub match_fields: BTreeMap<MatchFieldId, ValueLiteral>,
    /// Action invocation.
    pub action: ActionDefinition,
}

// ============================================================================
// SECTION: Assembly
// ============================================================================

impl RuleDefinition {
    /// Encodes the literals and assembles the rule through the builders.
    ///
    /// # Errors
    ///
    /// Returns the first [`BuildError`] raised by literal encoding or by the
    /// criterion, action, or rule builders.
    pub fn assemble(&self, schema: &PipelineSchema, app: &AppId) -> Result<Rule, BuildError> {
        let mut criterion = MatchCriterion::builder(schema);
        for (field, literal) in &self.match_fields {
            let width = schema
                .match_field_width(field)
                .ok_or_else(|| BuildError::UnknownField(field.clone()))?;
            criterion = criterion.match_exact(field.clone(), encode(field.as_str(), literal, width)?);
        }
        let selector = Selector::builder().match_pi(criterion.build()?).build()?;

        let spec = schema
            .action(&self.action.name)
            .ok_or_else(|| BuildError::UnknownAction(self.action.name.clone()))?;
        let mut action = ActionBuilder::new(schema, self.action.name.clone());
        for (param, literal) in &self.action.params {
            let declared = spec.param(param).ok_or_else(|| BuildError::ParameterMismatch {
                action: self.action.name.clone(),
                detail: ParamMismatch::Unexpected(param.clone()),
            })?;
            let name = format!("{}.{param}", self.action.name);
            action = action.param(param.clone(), encode(&name, literal, declared.width)?);
        }
        let treatment = Treatment::builder().pi_table_action(action.build()?).build()?;

        let builder = Rule::builder()
            .with_selector(selector)
            .with_treatment(treatment)
            .for_table(self.table.clone())
            .with_priority(self.priority)
            .for_device(self.device.clone())
            .from_app(app.clone());
        let builder = match self.timeout_secs {
            Some(timeout_secs) => builder.make_temporary(timeout_secs),
            None => builder.make_permanent(),
        };
        builder.build()
    }
}

/// Encodes one literal, naming the field or parameter on failure.
fn encode(name: &str, literal: &ValueLiteral, width: FieldWidth) -> Result<FieldValue, BuildError> {
    literal.encode(width).map_err(|WidthMismatch { expected, actual }| BuildError::FieldWidth {
        name: name.to_string(),
        expected,
        actual,
    })
}
