// crates/piflow-core/src/core/mod.rs
// ============================================================================
// Module: piflow Core Types
// Description: Data model and builders for programmable-pipeline rules.
// Purpose: Provide immutable, canonically ordered rule values.
// Dependencies: serde, serde_jcs, sha2, thiserror, url
// ============================================================================

//! ## Overview
//! Values flow strictly upward: match criteria and action descriptors are built
//! first, wrapped into a selector and treatment, and assembled into a [`Rule`].
//! No builder reads back from a later stage.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod action;
pub mod criterion;
pub mod definition;
pub mod error;
pub mod flow;
pub mod hashing;
pub mod identifiers;
pub mod rule;
pub mod schema;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use action::ActionBuilder;
pub use action::ActionDescriptor;
pub use action::ActionParam;
pub use criterion::MatchCriterion;
pub use criterion::MatchCriterionBuilder;
pub use criterion::MatchField;
pub use definition::ActionDefinition;
pub use definition::RuleDefinition;
pub use error::BuildError;
pub use error::ParamMismatch;
pub use flow::Selector;
pub use flow::SelectorBuilder;
pub use flow::Treatment;
pub use flow::TreatmentBuilder;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::ActionId;
pub use identifiers::ActionParamId;
pub use identifiers::AppId;
pub use identifiers::DeviceId;
pub use identifiers::DeviceIdError;
pub use identifiers::MatchFieldId;
pub use identifiers::TableId;
pub use rule::Permanence;
pub use rule::Priority;
pub use rule::Rule;
pub use rule::RuleBuilder;
pub use rule::RuleKey;
pub use schema::ActionParamSpec;
pub use schema::ActionSpec;
pub use schema::FieldWidth;
pub use schema::MatchFieldSpec;
pub use schema::PipelineSchema;
pub use schema::PipelineSchemaDocument;
pub use schema::SchemaError;
pub use schema::TableSpec;
pub use value::FieldValue;
pub use value::ValueLiteral;
pub use value::WidthMismatch;
