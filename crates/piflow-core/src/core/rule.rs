// crates/piflow-core/src/core/rule.rs
// ============================================================================
// Module: Forwarding Rules
// Description: Immutable match-action rules and the rule assembler.
// Purpose: Compose selector, treatment, table, priority, device, and owner.
// Dependencies: crate::core::{error, flow, hashing, identifiers}, serde
// ============================================================================

//! ## Overview
//! A [`Rule`] is a value object. Changing any part of it means assembling and
//! submitting a new rule. The assembler checks priority, device syntax, and
//! timeout; reachability and mastership are checked by the gateway at apply time.
//!
//! Invariants:
//! - Equality and hashing cover selector, treatment, table, priority, device, and
//!   application; permanence is excluded.
//! - [`RuleKey`] (device, table, criterion) identifies the entry a rule replaces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::hash::Hash;
use std::hash::Hasher;

use serde::Deserialize;
use serde::Serialize;

use crate::core::criterion::MatchCriterion;
use crate::core::error::BuildError;
use crate::core::flow::Selector;
use crate::core::flow::Treatment;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::AppId;
use crate::core::identifiers::DeviceId;
use crate::core::identifiers::TableId;

// ============================================================================
// SECTION: Priority
// ============================================================================

/// Rule priority; higher values are evaluated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u16);

impl Priority {
    /// Lowest accepted priority.
    pub const MIN: Self = Self(0);
    /// Highest accepted priority.
    pub const MAX: Self = Self(u16::MAX);

    /// Validates a caller-supplied priority.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidPriority`] for values outside `0..=65535`.
    pub fn new(value: i64) -> Result<Self, BuildError> {
        u16::try_from(value).map(Self).map_err(|_| BuildError::InvalidPriority(value))
    }

    /// Returns the numeric priority.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

// ============================================================================
// SECTION: Permanence
// ============================================================================

/// Whether a rule persists or expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Permanence {
    /// Rule persists until replaced or withdrawn.
    Permanent,
    /// Rule expires after `timeout_secs` idle seconds.
    Timed {
        /// Idle timeout in seconds.
        timeout_secs: u16,
    },
}

impl Permanence {
    /// Validates a timed permanence.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidTimeout`] for values outside `1..=65535`.
    pub fn timed(timeout_secs: i64) -> Result<Self, BuildError> {
        match u16::try_from(timeout_secs) {
            Ok(timeout_secs) if timeout_secs > 0 => Ok(Self::Timed {
                timeout_secs,
            }),
            _ => Err(BuildError::InvalidTimeout(timeout_secs)),
        }
    }

    /// Returns true for permanent rules.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        matches!(self, Self::Permanent)
    }
}

// ============================================================================
// SECTION: Rule Key
// ============================================================================

/// Identity of the table entry a rule occupies on a device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleKey {
    /// Target device.
    pub device: DeviceId,
    /// Target table.
    pub table: TableId,
    /// Match criterion.
    pub criterion: MatchCriterion,
}

// ============================================================================
// SECTION: Rule
// ============================================================================

/// One immutable forwarding entry.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    /// Match side.
    selector: Selector,
    /// Action side.
    treatment: Treatment,
    /// Target table.
    table: TableId,
    /// Evaluation priority.
    priority: Priority,
    /// Target device.
    device: DeviceId,
    /// Owning application.
    app: AppId,
    /// Permanence policy.
    permanence: Permanence,
}

impl Rule {
    /// Starts a rule assembler.
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// Returns the selector.
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Returns the treatment.
    #[must_use]
    pub const fn treatment(&self) -> &Treatment {
        &self.treatment
    }

    /// Returns the target table.
    #[must_use]
    pub const fn table(&self) -> &TableId {
        &self.table
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the target device.
    #[must_use]
    pub const fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Returns the owning application.
    #[must_use]
    pub const fn app(&self) -> &AppId {
        &self.app
    }

    /// Returns the permanence policy.
    #[must_use]
    pub const fn permanence(&self) -> Permanence {
        self.permanence
    }

    /// Returns the key of the entry this rule occupies.
    #[must_use]
    pub fn key(&self) -> RuleKey {
        RuleKey {
            device: self.device.clone(),
            table: self.table.clone(),
            criterion: self.selector.criterion().clone(),
        }
    }

    /// Returns the RFC 8785 canonical JSON bytes of the full rule.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when serialization fails.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, HashError> {
        canonical_json_bytes(self)
    }

    /// Returns the digest of the canonical JSON form, permanence included.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when serialization fails.
    pub fn content_digest(&self) -> Result<HashDigest, HashError> {
        hash_canonical_json(DEFAULT_HASH_ALGORITHM, self)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.selector == other.selector
            && self.treatment == other.treatment
            && self.table == other.table
            && self.priority == other.priority
            && self.device == other.device
            && self.app == other.app
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.selector.hash(state);
        self.treatment.hash(state);
        self.table.hash(state);
        self.priority.hash(state);
        self.device.hash(state);
        self.app.hash(state);
    }
}

// ============================================================================
// SECTION: Rule Builder
// ============================================================================

/// Device input, parsed on [`RuleBuilder::build`].
#[derive(Debug, Clone)]
enum DeviceInput {
    /// Unvalidated device string.
    Raw(String),
    /// Already validated identifier.
    Parsed(DeviceId),
}

/// Permanence input, validated on [`RuleBuilder::build`].
#[derive(Debug, Clone, Copy)]
enum PermanenceInput {
    /// Rule never expires.
    Permanent,
    /// Rule expires after the given seconds.
    Temporary(i64),
}

/// Rule assembler; inputs are validated together on [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct RuleBuilder {
    /// Selector, once supplied.
    selector: Option<Selector>,
    /// Treatment, once supplied.
    treatment: Option<Treatment>,
    /// Table, once supplied.
    table: Option<TableId>,
    /// Raw priority, once supplied.
    priority: Option<i64>,
    /// Device, once supplied.
    device: Option<DeviceInput>,
    /// Owning application, once supplied.
    app: Option<AppId>,
    /// Permanence, once supplied.
    permanence: Option<PermanenceInput>,
}

impl RuleBuilder {
    /// Sets the selector.
    #[must_use]
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Sets the treatment.
    #[must_use]
    pub fn with_treatment(mut self, treatment: Treatment) -> Self {
        self.treatment = Some(treatment);
        self
    }

    /// Sets the target table.
    #[must_use]
    pub fn for_table(mut self, table: impl Into<TableId>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the priority (validated on build).
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the device from a string (parsed on build).
    #[must_use]
    pub fn for_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(DeviceInput::Raw(device.into()));
        self
    }

    /// Sets an already validated device.
    #[must_use]
    pub fn for_device_id(mut self, device: DeviceId) -> Self {
        self.device = Some(DeviceInput::Parsed(device));
        self
    }

    /// Sets the owning application.
    #[must_use]
    pub fn from_app(mut self, app: impl Into<AppId>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Marks the rule permanent.
    #[must_use]
    pub const fn make_permanent(mut self) -> Self {
        self.permanence = Some(PermanenceInput::Permanent);
        self
    }

    /// Marks the rule temporary with an idle timeout (validated on build).
    #[must_use]
    pub const fn make_temporary(mut self, timeout_secs: i64) -> Self {
        self.permanence = Some(PermanenceInput::Temporary(timeout_secs));
        self
    }

    /// Validates all inputs and assembles the rule.
    ///
    /// Presence is checked first, then priority, device, and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingComponent`], [`BuildError::InvalidPriority`],
    /// [`BuildError::InvalidDeviceId`], or [`BuildError::InvalidTimeout`].
    pub fn build(self) -> Result<Rule, BuildError> {
        let selector = self.selector.ok_or(BuildError::MissingComponent("selector"))?;
        let treatment = self.treatment.ok_or(BuildError::MissingComponent("treatment"))?;
        let table = self.table.ok_or(BuildError::MissingComponent("table"))?;
        let priority = self.priority.ok_or(BuildError::MissingComponent("priority"))?;
        let device = self.device.ok_or(BuildError::MissingComponent("device"))?;
        let app = self.app.ok_or(BuildError::MissingComponent("app"))?;
        let permanence = self.permanence.ok_or(BuildError::MissingComponent("permanence"))?;

        let priority = Priority::new(priority)?;
        let device = match device {
            DeviceInput::Parsed(device) => device,
            DeviceInput::Raw(raw) => {
                DeviceId::parse(&raw).map_err(|reason| BuildError::InvalidDeviceId {
                    value: raw.clone(),
                    reason,
                })?
            }
        };
        let permanence = match permanence {
            PermanenceInput::Permanent => Permanence::Permanent,
            PermanenceInput::Temporary(timeout_secs) => Permanence::timed(timeout_secs)?,
        };

        Ok(Rule {
            selector,
            treatment,
            table,
            priority,
            device,
            app,
            permanence,
        })
    }
}
