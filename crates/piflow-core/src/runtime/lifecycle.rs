// crates/piflow-core/src/runtime/lifecycle.rs
// ============================================================================
// Module: piflow Lifecycle
// Description: Start, stop, and reconfigure entry points for a rule application.
// Purpose: Assemble configured rules and submit them once per activation.
// Dependencies: crate::{core, interfaces, runtime::audit}, thiserror
// ============================================================================

//! ## Overview
//! [`RuleApp`] is the host-agnostic form of a controller application. `start`
//! assembles every configured rule, aborting on the first construction error
//! before any gateway call, then submits all rules in one batch. Submission is
//! best-effort: there is no retry, no installation check, and no rollback.
//! `stop` does not withdraw installed rules and `reconfigure` does not resubmit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::AppId;
use crate::core::BuildError;
use crate::core::PipelineSchema;
use crate::core::Rule;
use crate::core::RuleDefinition;
use crate::interfaces::RuleGateway;
use crate::interfaces::SubmissionError;
use crate::interfaces::SubmissionReceipt;
use crate::runtime::audit::AuditSink;
use crate::runtime::audit::LifecycleEvent;
use crate::runtime::audit::ReconfigureEvent;
use crate::runtime::audit::SubmissionEvent;

// ============================================================================
// SECTION: Configuration and Handle
// ============================================================================

/// Inputs for one activation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Owning application identifier stamped on every rule.
    pub app_id: AppId,
    /// Pipeline schema the rules are built against.
    pub schema: PipelineSchema,
    /// Rule definitions in submission order.
    pub rules: Vec<RuleDefinition>,
    /// Free-form component properties.
    pub properties: BTreeMap<String, String>,
}

/// State of an activated application.
#[derive(Debug, Clone)]
pub struct AppHandle {
    /// Owning application.
    app_id: AppId,
    /// Rules accepted by the gateway.
    rules: Vec<Rule>,
    /// Gateway receipt for the activation batch.
    receipt: SubmissionReceipt,
    /// Current component properties.
    properties: BTreeMap<String, String>,
}

impl AppHandle {
    /// Returns the owning application.
    #[must_use]
    pub const fn app_id(&self) -> &AppId {
        &self.app_id
    }

    /// Returns the submitted rules in submission order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Returns the gateway receipt.
    #[must_use]
    pub const fn receipt(&self) -> &SubmissionReceipt {
        &self.receipt
    }

    /// Returns the current properties.
    #[must_use]
    pub const fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Returns one property value.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors that abort an activation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActivationError {
    /// A rule definition failed to assemble; nothing was submitted.
    #[error("rule {index} failed to build: {source}")]
    Build {
        /// Position of the definition in the configuration.
        index: usize,
        /// Construction error.
        source: BuildError,
    },
    /// The gateway rejected the batch or failed.
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

// ============================================================================
// SECTION: Rule App
// ============================================================================

/// Controller application submitting configured rules through a gateway.
#[derive(Debug)]
pub struct RuleApp<G, A> {
    /// Rule-management service.
    gateway: G,
    /// Audit sink for lifecycle events.
    audit: A,
}

impl<G, A> RuleApp<G, A>
where
    G: RuleGateway,
    A: AuditSink,
{
    /// Creates an application bound to a gateway and an audit sink.
    #[must_use]
    pub const fn new(gateway: G, audit: A) -> Self {
        Self {
            gateway,
            audit,
        }
    }

    /// Returns the gateway.
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Returns the audit sink.
    #[must_use]
    pub const fn audit(&self) -> &A {
        &self.audit
    }

    /// Assembles every configured rule and submits them in one batch.
    ///
    /// # Errors
    ///
    /// Returns [`ActivationError::Build`] for the first definition that fails to
    /// assemble (no gateway call is made), or [`ActivationError::Submission`] when
    /// the gateway rejects the batch.
    pub fn start(&self, config: &AppConfig) -> Result<AppHandle, ActivationError> {
        let rules = match assemble_all(config) {
            Ok(rules) => rules,
            Err(err) => {
                self.audit.record_lifecycle(&LifecycleEvent::start(
                    &config.app_id,
                    config.rules.len(),
                    Some(err.to_string()),
                ));
                return Err(err);
            }
        };
        self.audit.record_lifecycle(&LifecycleEvent::start(&config.app_id, rules.len(), None));

        let outcome = self.gateway.submit(&rules);
        self.audit.record_submission(&SubmissionEvent::new(&config.app_id, &rules, &outcome));
        let receipt = outcome?;

        Ok(AppHandle {
            app_id: config.app_id.clone(),
            rules,
            receipt,
            properties: config.properties.clone(),
        })
    }

    /// Deactivates the application. Installed rules stay on their devices.
    pub fn stop(&self, handle: AppHandle) {
        self.audit.record_lifecycle(&LifecycleEvent::stop(&handle.app_id, handle.rules.len()));
    }

    /// Replaces the handle's properties and returns the keys that changed.
    pub fn reconfigure(
        &self,
        handle: &mut AppHandle,
        properties: BTreeMap<String, String>,
    ) -> Vec<String> {
        let changed = changed_keys(&handle.properties, &properties);
        handle.properties = properties;
        self.audit.record_reconfigure(&ReconfigureEvent::new(&handle.app_id, changed.clone()));
        changed
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Assembles every definition in order, stopping at the first failure.
fn assemble_all(config: &AppConfig) -> Result<Vec<Rule>, ActivationError> {
    config
        .rules
        .iter()
        .enumerate()
        .map(|(index, definition)| {
            definition.assemble(&config.schema, &config.app_id).map_err(|source| {
                ActivationError::Build {
                    index,
                    source,
                }
            })
        })
        .collect()
}

/// Returns keys added, removed, or changed between two property maps, sorted.
fn changed_keys(old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> Vec<String> {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    keys.into_iter().filter(|key| old.get(*key) != new.get(*key)).cloned().collect()
}
