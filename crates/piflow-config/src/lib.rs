// crates/piflow-config/src/lib.rs
// ============================================================================
// Module: piflow Config Library
// Description: Configuration model, schema loading, and canonical example.
// Purpose: Single source of truth for piflow.toml semantics.
// Dependencies: piflow-core, serde, toml
// ============================================================================

//! ## Overview
//! `piflow-config` turns a `piflow.toml` file into the [`piflow_core::AppConfig`]
//! consumed by the lifecycle, with strict, fail-closed validation.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
