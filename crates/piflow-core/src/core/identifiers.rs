// crates/piflow-core/src/core/identifiers.rs
// ============================================================================
// Module: piflow Identifiers
// Description: Canonical identifiers for pipeline symbols, applications, and devices.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, thiserror, url
// ============================================================================

//! ## Overview
//! Pipeline symbols (tables, match fields, actions, action parameters) and owning
//! applications are opaque string identifiers. They are resolved against a
//! [`crate::PipelineSchema`] by the builders, never validated here.
//!
//! [`DeviceId`] is the exception: it is a scheme-qualified URI and is validated
//! syntactically on construction, so a malformed device string can only fail at
//! construction time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted length of a device identifier string, in bytes.
pub const MAX_DEVICE_ID_LENGTH: usize = 1024;

// ============================================================================
// SECTION: Opaque Identifiers
// ============================================================================

/// Declares an opaque string identifier with the shared constructor surface.
macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

opaque_id!(
    /// Match-action table identifier within a pipeline.
    TableId
);

opaque_id!(
    /// Header or metadata field identifier usable as an exact-match key.
    MatchFieldId
);

opaque_id!(
    /// Action identifier from the pipeline's action catalog.
    ActionId
);

opaque_id!(
    /// Named parameter of a pipeline action.
    ActionParamId
);

opaque_id!(
    /// Identifier of the application that owns a rule.
    AppId
);

// ============================================================================
// SECTION: Device Identifier
// ============================================================================

/// Reasons a device identifier string is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceIdError {
    /// Input was empty.
    #[error("device id is empty")]
    Empty,
    /// Input exceeded [`MAX_DEVICE_ID_LENGTH`].
    #[error("device id exceeds {MAX_DEVICE_ID_LENGTH} bytes")]
    TooLong,
    /// Input contained whitespace or control characters.
    #[error("device id contains whitespace or control characters")]
    IllegalCharacter,
    /// Input did not parse as a scheme-qualified URI.
    #[error("device id is not a scheme-qualified uri: {0}")]
    Malformed(String),
    /// Input had a scheme but nothing after the separator.
    #[error("device id has an empty body after the scheme")]
    MissingBody,
}

/// Scheme-qualified identifier of a forwarding device, e.g. `device:leaf1`.
///
/// # Invariants
/// - Holds the caller's string unchanged; it parses as a URI with a non-empty
///   scheme and body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Parses and validates a device identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceIdError`] when the string is not a scheme-qualified URI.
    pub fn parse(value: &str) -> Result<Self, DeviceIdError> {
        if value.is_empty() {
            return Err(DeviceIdError::Empty);
        }
        if value.len() > MAX_DEVICE_ID_LENGTH {
            return Err(DeviceIdError::TooLong);
        }
        if value.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(DeviceIdError::IllegalCharacter);
        }
        Url::parse(value).map_err(|err| DeviceIdError::Malformed(err.to_string()))?;
        if value.split_once(':').is_none_or(|(_, body)| body.is_empty()) {
            return Err(DeviceIdError::MissingBody);
        }
        Ok(Self(value.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the URI scheme (the part before the first `:`).
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.0.split_once(':').map_or("", |(scheme, _)| scheme)
    }

    /// Returns everything after the scheme separator.
    #[must_use]
    pub fn body(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, body)| body)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = DeviceIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for DeviceId {
    type Error = DeviceIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}
