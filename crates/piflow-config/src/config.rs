// crates/piflow-config/src/config.rs
// ============================================================================
// Module: piflow Configuration
// Description: TOML configuration model for a rule application.
// Purpose: Load the app identity, pipeline schema, rules, and audit sink.
// Dependencies: piflow-core, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! A configuration file names the owning application, the pipeline schema the
//! rules are built against (inline or from a sibling file), the rule
//! definitions submitted on activation, and where audit events go. Loading is
//! fail-closed: oversized files, non-UTF-8 input, unknown keys, and
//! inconsistent schemas are rejected before anything is assembled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use piflow_core::AppConfig;
use piflow_core::AppId;
use piflow_core::AuditSink;
use piflow_core::FileAuditSink;
use piflow_core::NoopAuditSink;
use piflow_core::PipelineSchema;
use piflow_core::PipelineSchemaDocument;
use piflow_core::RuleDefinition;
use piflow_core::StderrAuditSink;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default config file name.
pub const DEFAULT_CONFIG_NAME: &str = "piflow.toml";
/// Environment variable overriding the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "PIFLOW_CONFIG";
/// Maximum size of a config or schema file in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum length of a full path.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of rule definitions per application.
pub const MAX_RULES: usize = 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or opened.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML did not parse into the config model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Parsed config violated a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level piflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PiflowConfig {
    /// Application identity and properties.
    pub app: AppSection,
    /// Pipeline schema source.
    pub pipeline: PipelineConfig,
    /// Rule definitions in submission order.
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Directory relative paths resolve against; set by [`PiflowConfig::load`].
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// `[app]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSection {
    /// Owning application identifier.
    pub id: AppId,
    /// Free-form component properties.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case", deny_unknown_fields)]
pub enum PipelineConfig {
    /// Schema embedded in the config file.
    Inline {
        /// Schema document.
        schema: PipelineSchemaDocument,
    },
    /// Schema loaded from a TOML file.
    File {
        /// Schema file path, relative to the config file.
        path: String,
    },
}

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Discard events.
    None,
}

/// `[audit]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates sink settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, self.path.as_deref()) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path is only valid for the file sink".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl PiflowConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path argument wins, then `PIFLOW_CONFIG`, then `./piflow.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        let content = read_limited(&resolved, "config")?;
        let mut config = Self::from_toml(&content)?;
        config.base_dir = resolved.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// Relative paths in the result resolve against the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.id.as_str().trim().is_empty() {
            return Err(ConfigError::Invalid("app.id must be non-empty".to_string()));
        }
        if self.rules.is_empty() {
            return Err(ConfigError::Invalid("at least one rule is required".to_string()));
        }
        if self.rules.len() > MAX_RULES {
            return Err(ConfigError::Invalid(format!("rules exceed limit of {MAX_RULES}")));
        }
        match &self.pipeline {
            PipelineConfig::Inline {
                schema,
            } => {
                PipelineSchema::from_document(schema.clone())
                    .map_err(|err| ConfigError::Invalid(format!("pipeline.schema: {err}")))?;
            }
            PipelineConfig::File {
                path,
            } => validate_path_string("pipeline.path", path)?,
        }
        self.audit.validate()
    }

    /// Returns the directory relative paths resolve against, if any.
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Loads and validates the configured pipeline schema.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the schema file cannot be read or the
    /// schema is inconsistent.
    pub fn schema(&self) -> Result<PipelineSchema, ConfigError> {
        let document = match &self.pipeline {
            PipelineConfig::Inline {
                schema,
            } => schema.clone(),
            PipelineConfig::File {
                path,
            } => {
                let resolved = self.resolve_relative(path);
                let content = read_limited(&resolved, "schema")?;
                toml::from_str::<PipelineSchemaDocument>(&content)
                    .map_err(|err| ConfigError::Parse(format!("pipeline schema: {err}")))?
            }
        };
        PipelineSchema::from_document(document)
            .map_err(|err| ConfigError::Invalid(format!("pipeline.schema: {err}")))
    }

    /// Builds the activation config handed to the lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the pipeline schema cannot be loaded.
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        Ok(AppConfig {
            app_id: self.app.id.clone(),
            schema: self.schema()?,
            rules: self.rules.clone(),
            properties: self.app.properties.clone(),
        })
    }

    /// Opens the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the audit log cannot be opened.
    pub fn audit_sink(&self) -> Result<Box<dyn AuditSink>, ConfigError> {
        match (self.audit.sink, self.audit.path.as_deref()) {
            (AuditSinkKind::Stderr, _) => Ok(Box::new(StderrAuditSink)),
            (AuditSinkKind::None, _) => Ok(Box::new(NoopAuditSink)),
            (AuditSinkKind::File, Some(path)) => {
                let sink = FileAuditSink::new(&self.resolve_relative(path))
                    .map_err(|err| ConfigError::Io(err.to_string()))?;
                Ok(Box::new(sink))
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
        }
    }

    /// Resolves a configured path against the config file directory.
    fn resolve_relative(&self, path: &str) -> PathBuf {
        let path = Path::new(path.trim());
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from argument, environment, or default.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a resolved path against length limits.
fn validate_path(path: &Path, label: &str) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{label} path exceeds max length")));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{label} path component too long")));
        }
    }
    Ok(())
}

/// Reads a UTF-8 file no larger than [`MAX_CONFIG_FILE_SIZE`].
fn read_limited(path: &Path, label: &str) -> Result<String, ConfigError> {
    validate_path(path, label)?;
    let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid(format!("{label} file exceeds size limit")));
    }
    String::from_utf8(bytes)
        .map_err(|_| ConfigError::Invalid(format!("{label} file must be utf-8")))
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
