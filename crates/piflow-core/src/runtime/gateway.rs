// crates/piflow-core/src/runtime/gateway.rs
// ============================================================================
// Module: piflow In-Memory Gateway
// Description: Reference rule-management service kept entirely in memory.
// Purpose: Provide a deterministic gateway for tests, demos, and the CLI.
// Dependencies: crate::core, crate::interfaces, serde
// ============================================================================

//! ## Overview
//! [`InMemoryRuleGateway`] implements [`RuleGateway`] over a mutex-protected device
//! table. It checks reachability, mastership, and (optionally) table layout for
//! every rule before applying any of them, so a rejected batch installs nothing.
//! Installed rules are keyed by [`RuleKey`]; re-submitting a rule overwrites its
//! entry and never duplicates it. Two rules for the same key in one batch are
//! rejected. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde::Deserialize;
use serde::Serialize;

use crate::core::AppId;
use crate::core::DeviceId;
use crate::core::PipelineSchema;
use crate::core::Rule;
use crate::core::RuleKey;
use crate::interfaces::AcceptedRule;
use crate::interfaces::RejectionReason;
use crate::interfaces::RuleGateway;
use crate::interfaces::SubmissionError;
use crate::interfaces::SubmissionReceipt;

// ============================================================================
// SECTION: Device Status
// ============================================================================

/// Reachability and mastership of one device as seen by this controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Device is connected.
    pub reachable: bool,
    /// This controller instance holds mastership.
    pub master: bool,
}

impl DeviceStatus {
    /// Reachable and mastered by this instance.
    #[must_use]
    pub const fn mastered() -> Self {
        Self {
            reachable: true,
            master: true,
        }
    }

    /// Reachable but mastered by another instance.
    #[must_use]
    pub const fn standby() -> Self {
        Self {
            reachable: true,
            master: false,
        }
    }

    /// Not reachable.
    #[must_use]
    pub const fn unreachable() -> Self {
        Self {
            reachable: false,
            master: false,
        }
    }
}

// ============================================================================
// SECTION: Gateway State
// ============================================================================

/// Mutable gateway state guarded by one mutex.
#[derive(Debug, Default)]
struct GatewayState {
    /// Known devices.
    devices: BTreeMap<DeviceId, DeviceStatus>,
    /// Installed rules keyed by table entry.
    installed: BTreeMap<RuleKey, Rule>,
    /// Accepted batches so far.
    batches: u64,
}

// ============================================================================
// SECTION: In-Memory Gateway
// ============================================================================

/// In-memory rule gateway for tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRuleGateway {
    /// Device table and installed rules protected by a mutex.
    state: Arc<Mutex<GatewayState>>,
    /// Pipeline layout enforced on submission, when configured.
    schema: Option<Arc<PipelineSchema>>,
}

impl InMemoryRuleGateway {
    /// Creates an empty gateway with no known devices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforces the table layout of `schema` on every submitted rule.
    #[must_use]
    pub fn with_schema(mut self, schema: PipelineSchema) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Registers or updates a device.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Unavailable`] when the state mutex is poisoned.
    pub fn set_device(&self, device: DeviceId, status: DeviceStatus) -> Result<(), SubmissionError> {
        self.lock()?.devices.insert(device, status);
        Ok(())
    }

    /// Returns all installed rules in key order.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Unavailable`] when the state mutex is poisoned.
    pub fn installed_rules(&self) -> Result<Vec<Rule>, SubmissionError> {
        Ok(self.lock()?.installed.values().cloned().collect())
    }

    /// Returns the number of installed rules.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Unavailable`] when the state mutex is poisoned.
    pub fn rule_count(&self) -> Result<usize, SubmissionError> {
        Ok(self.lock()?.installed.len())
    }

    /// Returns the rule occupying `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Unavailable`] when the state mutex is poisoned.
    pub fn rule(&self, key: &RuleKey) -> Result<Option<Rule>, SubmissionError> {
        Ok(self.lock()?.installed.get(key).cloned())
    }

    /// Withdraws every rule owned by `app` and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`SubmissionError::Unavailable`] when the state mutex is poisoned.
    pub fn withdraw_app(&self, app: &AppId) -> Result<usize, SubmissionError> {
        let mut state = self.lock()?;
        let before = state.installed.len();
        state.installed.retain(|_, rule| rule.app() != app);
        Ok(before - state.installed.len())
    }

    /// Locks the gateway state.
    fn lock(&self) -> Result<MutexGuard<'_, GatewayState>, SubmissionError> {
        self.state
            .lock()
            .map_err(|_| SubmissionError::Unavailable("rule gateway mutex poisoned".to_string()))
    }
}

impl RuleGateway for InMemoryRuleGateway {
    fn submit(&self, rules: &[Rule]) -> Result<SubmissionReceipt, SubmissionError> {
        if rules.is_empty() {
            return Err(SubmissionError::Rejected(RejectionReason::EmptyBatch));
        }
        let mut state = self.lock()?;

        let mut accepted = Vec::with_capacity(rules.len());
        let mut keys = BTreeSet::new();
        for (index, rule) in rules.iter().enumerate() {
            check_device(&state.devices, rule.device()).map_err(SubmissionError::Rejected)?;
            if !keys.insert(rule.key()) {
                return Err(SubmissionError::Rejected(RejectionReason::MalformedRule {
                    index,
                    detail: format!(
                        "entry in table {} on {} repeats an earlier rule of this batch",
                        rule.table(),
                        rule.device()
                    ),
                }));
            }
            if let Some(schema) = &self.schema {
                check_layout(schema, rule).map_err(|detail| {
                    SubmissionError::Rejected(RejectionReason::MalformedRule {
                        index,
                        detail,
                    })
                })?;
            }
            let digest =
                rule.content_digest().map_err(|err| SubmissionError::Unavailable(err.to_string()))?;
            accepted.push(AcceptedRule {
                device: rule.device().clone(),
                table: rule.table().clone(),
                priority: rule.priority(),
                digest,
            });
        }

        for rule in rules {
            state.installed.insert(rule.key(), rule.clone());
        }
        state.batches += 1;
        Ok(SubmissionReceipt {
            batch_id: format!("batch-{}", state.batches),
            accepted,
        })
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Rejects rules for unknown, unreachable, or foreign-mastered devices.
fn check_device(
    devices: &BTreeMap<DeviceId, DeviceStatus>,
    device: &DeviceId,
) -> Result<(), RejectionReason> {
    match devices.get(device) {
        Some(status) if status.reachable && status.master => Ok(()),
        Some(status) if status.reachable => Err(RejectionReason::NotMaster {
            device: device.clone(),
        }),
        _ => Err(RejectionReason::DeviceUnreachable {
            device: device.clone(),
        }),
    }
}

/// Checks that a rule fits the declared table: exact key coverage and an allowed action.
fn check_layout(schema: &PipelineSchema, rule: &Rule) -> Result<(), String> {
    let table =
        schema.table(rule.table()).ok_or_else(|| format!("unknown table {}", rule.table()))?;
    let criterion = rule.selector().criterion();
    for (field, _) in criterion.iter() {
        if !table.has_match_field(field) {
            return Err(format!("field {field} is not part of the key of table {}", table.id));
        }
    }
    for field in &table.match_fields {
        if criterion.get(field).is_none() {
            return Err(format!("exact-match field {field} of table {} is not matched", table.id));
        }
    }
    let action = rule.treatment().action().action();
    if !table.allows_action(action) {
        return Err(format!("action {action} is not allowed in table {}", table.id));
    }
    Ok(())
}
