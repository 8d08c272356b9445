// crates/piflow-core/src/core/schema.rs
// ============================================================================
// Module: Pipeline Schema
// Description: Loaded catalog of tables, match fields, and actions for one pipeline.
// Purpose: Let builders resolve symbolic names to declared widths and signatures.
// Dependencies: crate::core::identifiers, serde, thiserror
// ============================================================================

//! ## Overview
//! A [`PipelineSchema`] is the pipeline-agnostic replacement for compiled-in
//! table/field/action constants. It is deserialized from a
//! [`PipelineSchemaDocument`] and validated on construction, so every schema a
//! builder sees is internally consistent.
//!
//! Invariants:
//! - Match field, action, and table identifiers are unique.
//! - Action parameter identifiers are unique within their action and keep their
//!   declared order.
//! - Tables only reference declared match fields and actions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::ActionId;
use crate::core::identifiers::ActionParamId;
use crate::core::identifiers::MatchFieldId;
use crate::core::identifiers::TableId;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Largest bit width a field or parameter may declare.
pub const MAX_FIELD_BITS: u16 = 2048;
/// Largest byte length of a string-typed value.
pub const MAX_TEXT_BYTES: usize = 256;

// ============================================================================
// SECTION: Field Width
// ============================================================================

/// Declared width of a match field or action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldWidth {
    /// Fixed-width bit string, encoded as `ceil(bits / 8)` big-endian bytes.
    Bits {
        /// Declared width in bits.
        bits: u16,
    },
    /// Runtime-translated string value (port names, interface ids).
    String,
}

impl FieldWidth {
    /// Returns the exact byte length for bit-string widths.
    #[must_use]
    pub const fn byte_len(self) -> Option<usize> {
        match self {
            Self::Bits {
                bits,
            } => Some((bits as usize).div_ceil(8)),
            Self::String => None,
        }
    }
}

impl fmt::Display for FieldWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bits {
                bits,
            } => write!(f, "{bits} bits"),
            Self::String => f.write_str("string"),
        }
    }
}

// ============================================================================
// SECTION: Schema Document
// ============================================================================

/// Declared match field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchFieldSpec {
    /// Field identifier.
    pub id: MatchFieldId,
    /// Declared value width.
    pub width: FieldWidth,
}

/// Declared action parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionParamSpec {
    /// Parameter identifier.
    pub id: ActionParamId,
    /// Declared value width.
    pub width: FieldWidth,
}

/// Declared action and its parameter signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    /// Action identifier.
    pub id: ActionId,
    /// Parameters in pipeline-declared order.
    #[serde(default)]
    pub params: Vec<ActionParamSpec>,
}

impl ActionSpec {
    /// Returns the declared parameter with the given identifier.
    #[must_use]
    pub fn param(&self, id: &ActionParamId) -> Option<&ActionParamSpec> {
        self.params.iter().find(|param| &param.id == id)
    }
}

/// Declared match-action table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSpec {
    /// Table identifier.
    pub id: TableId,
    /// Match fields forming the table key.
    #[serde(default)]
    pub match_fields: Vec<MatchFieldId>,
    /// Actions that entries of this table may invoke.
    pub actions: Vec<ActionId>,
}

impl TableSpec {
    /// Returns true when the field is part of the table key.
    #[must_use]
    pub fn has_match_field(&self, field: &MatchFieldId) -> bool {
        self.match_fields.contains(field)
    }

    /// Returns true when entries of this table may invoke the action.
    #[must_use]
    pub fn allows_action(&self, action: &ActionId) -> bool {
        self.actions.contains(action)
    }
}

/// Serialized form of a pipeline schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSchemaDocument {
    /// Pipeline identifier (e.g. `sai`).
    pub id: String,
    /// Declared match fields.
    #[serde(default)]
    pub match_fields: Vec<MatchFieldSpec>,
    /// Declared actions.
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    /// Declared tables.
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when a schema document is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Pipeline identifier was empty.
    #[error("pipeline schema id must be non-empty")]
    EmptyId,
    /// Match field declared twice.
    #[error("duplicate match field: {0}")]
    DuplicateMatchField(MatchFieldId),
    /// Action declared twice.
    #[error("duplicate action: {0}")]
    DuplicateAction(ActionId),
    /// Table declared twice.
    #[error("duplicate table: {0}")]
    DuplicateTable(TableId),
    /// Parameter declared twice within one action.
    #[error("duplicate parameter {param} in action {action}")]
    DuplicateActionParam {
        /// Owning action.
        action: ActionId,
        /// Repeated parameter.
        param: ActionParamId,
    },
    /// Bit width outside `1..=MAX_FIELD_BITS`.
    #[error("invalid width for {name}: {bits} bits")]
    InvalidWidth {
        /// Field or parameter name.
        name: String,
        /// Declared bits.
        bits: u16,
    },
    /// Table key references an undeclared or repeated field.
    #[error("table {table} has invalid match field {field}")]
    InvalidTableField {
        /// Table identifier.
        table: TableId,
        /// Offending field.
        field: MatchFieldId,
    },
    /// Table references an undeclared or repeated action.
    #[error("table {table} has invalid action {action}")]
    InvalidTableAction {
        /// Table identifier.
        table: TableId,
        /// Offending action.
        action: ActionId,
    },
    /// Table declares no actions.
    #[error("table {0} declares no actions")]
    TableWithoutActions(TableId),
}

// ============================================================================
// SECTION: Pipeline Schema
// ============================================================================

/// Validated pipeline schema consulted by the builders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PipelineSchemaDocument", into = "PipelineSchemaDocument")]
pub struct PipelineSchema {
    /// Pipeline identifier.
    id: String,
    /// Match field widths keyed by identifier.
    match_fields: BTreeMap<MatchFieldId, FieldWidth>,
    /// Actions keyed by identifier.
    actions: BTreeMap<ActionId, ActionSpec>,
    /// Tables keyed by identifier.
    tables: BTreeMap<TableId, TableSpec>,
}

impl PipelineSchema {
    /// Validates a schema document and builds the lookup tables.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the document is inconsistent.
    pub fn from_document(document: PipelineSchemaDocument) -> Result<Self, SchemaError> {
        if document.id.trim().is_empty() {
            return Err(SchemaError::EmptyId);
        }

        let mut match_fields = BTreeMap::new();
        for field in document.match_fields {
            ensure_width(field.id.as_str(), field.width)?;
            if match_fields.insert(field.id.clone(), field.width).is_some() {
                return Err(SchemaError::DuplicateMatchField(field.id));
            }
        }

        let mut actions = BTreeMap::new();
        for action in document.actions {
            let mut seen = BTreeSet::new();
            for param in &action.params {
                ensure_width(param.id.as_str(), param.width)?;
                if !seen.insert(&param.id) {
                    return Err(SchemaError::DuplicateActionParam {
                        action: action.id.clone(),
                        param: param.id.clone(),
                    });
                }
            }
            if actions.contains_key(&action.id) {
                return Err(SchemaError::DuplicateAction(action.id));
            }
            actions.insert(action.id.clone(), action);
        }

        let mut tables = BTreeMap::new();
        for table in document.tables {
            ensure_table_refs(&table, &match_fields, &actions)?;
            if tables.contains_key(&table.id) {
                return Err(SchemaError::DuplicateTable(table.id));
            }
            tables.insert(table.id.clone(), table);
        }

        Ok(Self {
            id: document.id,
            match_fields,
            actions,
            tables,
        })
    }

    /// Returns the pipeline identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the declared width of a match field.
    #[must_use]
    pub fn match_field_width(&self, field: &MatchFieldId) -> Option<FieldWidth> {
        self.match_fields.get(field).copied()
    }

    /// Returns the declared action.
    #[must_use]
    pub fn action(&self, action: &ActionId) -> Option<&ActionSpec> {
        self.actions.get(action)
    }

    /// Returns the declared table.
    #[must_use]
    pub fn table(&self, table: &TableId) -> Option<&TableSpec> {
        self.tables.get(table)
    }

    /// Returns the document form of this schema.
    #[must_use]
    pub fn to_document(&self) -> PipelineSchemaDocument {
        PipelineSchemaDocument {
            id: self.id.clone(),
            match_fields: self
                .match_fields
                .iter()
                .map(|(id, width)| MatchFieldSpec {
                    id: id.clone(),
                    width: *width,
                })
                .collect(),
            actions: self.actions.values().cloned().collect(),
            tables: self.tables.values().cloned().collect(),
        }
    }
}

impl TryFrom<PipelineSchemaDocument> for PipelineSchema {
    type Error = SchemaError;

    fn try_from(value: PipelineSchemaDocument) -> Result<Self, Self::Error> {
        Self::from_document(value)
    }
}

impl From<PipelineSchema> for PipelineSchemaDocument {
    fn from(value: PipelineSchema) -> Self {
        value.to_document()
    }
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Rejects bit widths outside the supported range.
fn ensure_width(name: &str, width: FieldWidth) -> Result<(), SchemaError> {
    match width {
        FieldWidth::Bits {
            bits,
        } if bits == 0 || bits > MAX_FIELD_BITS => Err(SchemaError::InvalidWidth {
            name: name.to_string(),
            bits,
        }),
        _ => Ok(()),
    }
}

/// Ensures a table only references declared, non-repeated fields and actions.
fn ensure_table_refs(
    table: &TableSpec,
    match_fields: &BTreeMap<MatchFieldId, FieldWidth>,
    actions: &BTreeMap<ActionId, ActionSpec>,
) -> Result<(), SchemaError> {
    let mut seen_fields = BTreeSet::new();
    for field in &table.match_fields {
        if !match_fields.contains_key(field) || !seen_fields.insert(field) {
            return Err(SchemaError::InvalidTableField {
                table: table.id.clone(),
                field: field.clone(),
            });
        }
    }
    if table.actions.is_empty() {
        return Err(SchemaError::TableWithoutActions(table.id.clone()));
    }
    let mut seen_actions = BTreeSet::new();
    for action in &table.actions {
        if !actions.contains_key(action) || !seen_actions.insert(action) {
            return Err(SchemaError::InvalidTableAction {
                table: table.id.clone(),
                action: action.clone(),
            });
        }
    }
    Ok(())
}
