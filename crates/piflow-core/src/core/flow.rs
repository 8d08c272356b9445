// crates/piflow-core/src/core/flow.rs
// ============================================================================
// Module: Selectors and Treatments
// Description: Match-side and action-side wrappers composing a rule.
// Purpose: Keep match and action concerns independently reusable.
// Dependencies: crate::core::{action, criterion, error}, serde
// ============================================================================

//! ## Overview
//! [`Selector`] and [`Treatment`] carry no table, device, or priority, so one value
//! can be reused across many rule assemblies. The builders only check presence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::action::ActionDescriptor;
use crate::core::criterion::MatchCriterion;
use crate::core::error::BuildError;

// ============================================================================
// SECTION: Selector
// ============================================================================

/// Match side of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Selector {
    /// Programmable-pipeline match criterion.
    criterion: MatchCriterion,
}

impl Selector {
    /// Wraps a criterion.
    #[must_use]
    pub const fn new(criterion: MatchCriterion) -> Self {
        Self {
            criterion,
        }
    }

    /// Starts a selector builder.
    #[must_use]
    pub const fn builder() -> SelectorBuilder {
        SelectorBuilder {
            criterion: None,
        }
    }

    /// Returns the wrapped criterion.
    #[must_use]
    pub const fn criterion(&self) -> &MatchCriterion {
        &self.criterion
    }
}

impl From<MatchCriterion> for Selector {
    fn from(value: MatchCriterion) -> Self {
        Self::new(value)
    }
}

/// Builder requiring exactly one criterion.
#[derive(Debug, Clone, Default)]
pub struct SelectorBuilder {
    /// Criterion, once supplied.
    criterion: Option<MatchCriterion>,
}

impl SelectorBuilder {
    /// Sets the criterion, replacing any earlier one.
    #[must_use]
    pub fn match_pi(mut self, criterion: MatchCriterion) -> Self {
        self.criterion = Some(criterion);
        self
    }

    /// Builds the selector.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingComponent`] when no criterion was supplied.
    pub fn build(self) -> Result<Selector, BuildError> {
        self.criterion.map(Selector::new).ok_or(BuildError::MissingComponent("criterion"))
    }
}

// ============================================================================
// SECTION: Treatment
// ============================================================================

/// Action side of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Treatment {
    /// Programmable-pipeline table action.
    action: ActionDescriptor,
}

impl Treatment {
    /// Wraps an action descriptor.
    #[must_use]
    pub const fn new(action: ActionDescriptor) -> Self {
        Self {
            action,
        }
    }

    /// Starts a treatment builder.
    #[must_use]
    pub const fn builder() -> TreatmentBuilder {
        TreatmentBuilder {
            action: None,
        }
    }

    /// Returns the wrapped action.
    #[must_use]
    pub const fn action(&self) -> &ActionDescriptor {
        &self.action
    }
}

impl From<ActionDescriptor> for Treatment {
    fn from(value: ActionDescriptor) -> Self {
        Self::new(value)
    }
}

/// Builder requiring exactly one table action.
#[derive(Debug, Clone, Default)]
pub struct TreatmentBuilder {
    /// Action, once supplied.
    action: Option<ActionDescriptor>,
}

impl TreatmentBuilder {
    /// Sets the table action, replacing any earlier one.
    #[must_use]
    pub fn pi_table_action(mut self, action: ActionDescriptor) -> Self {
        self.action = Some(action);
        self
    }

    /// Builds the treatment.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingComponent`] when no action was supplied.
    pub fn build(self) -> Result<Treatment, BuildError> {
        self.action.map(Treatment::new).ok_or(BuildError::MissingComponent("action"))
    }
}
