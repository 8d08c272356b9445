// crates/piflow-core/src/runtime/audit.rs
// ============================================================================
// Module: piflow Audit Logging
// Description: Structured audit events for activation, submission, and shutdown.
// Purpose: Emit JSON-line audit logs without a logging facade dependency.
// Dependencies: crate::{core, interfaces}, serde, serde_json
// ============================================================================

//! ## Overview
//! Every lifecycle entry point records one event through an [`AuditSink`]. Rules
//! are logged as key fields plus their canonical digest, never as full payloads.
//! Sinks swallow their own I/O failures; auditing never fails an activation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::core::AppId;
use crate::core::DeviceId;
use crate::core::HashDigest;
use crate::core::Priority;
use crate::core::Rule;
use crate::core::TableId;
use crate::interfaces::SubmissionError;
use crate::interfaces::SubmissionReceipt;

// ============================================================================
// SECTION: Events
// ============================================================================

/// Activation or deactivation of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleEvent {
    /// Event identifier (`lifecycle_start` or `lifecycle_stop`).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Owning application.
    pub app_id: AppId,
    /// Number of rules defined or held by the application.
    pub rule_count: usize,
    /// Failure message when activation aborted before submission.
    pub error: Option<String>,
}

impl LifecycleEvent {
    /// Creates a start event.
    #[must_use]
    pub fn start(app_id: &AppId, rule_count: usize, error: Option<String>) -> Self {
        Self {
            event: "lifecycle_start",
            timestamp_ms: now_ms(),
            app_id: app_id.clone(),
            rule_count,
            error,
        }
    }

    /// Creates a stop event.
    #[must_use]
    pub fn stop(app_id: &AppId, rule_count: usize) -> Self {
        Self {
            event: "lifecycle_stop",
            timestamp_ms: now_ms(),
            app_id: app_id.clone(),
            rule_count,
            error: None,
        }
    }
}

/// Key fields of one submitted rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    /// Target device.
    pub device: DeviceId,
    /// Target table.
    pub table: TableId,
    /// Rule priority.
    pub priority: Priority,
    /// Canonical digest when it could be computed.
    pub digest: Option<HashDigest>,
}

impl RuleSummary {
    /// Summarizes a rule.
    #[must_use]
    pub fn of(rule: &Rule) -> Self {
        Self {
            device: rule.device().clone(),
            table: rule.table().clone(),
            priority: rule.priority(),
            digest: rule.content_digest().ok(),
        }
    }
}

/// Outcome of the single gateway submission of an activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Owning application.
    pub app_id: AppId,
    /// Submitted rules.
    pub rules: Vec<RuleSummary>,
    /// Whether the gateway accepted the batch.
    pub accepted: bool,
    /// Gateway batch identifier when accepted.
    pub batch_id: Option<String>,
    /// Gateway error when rejected.
    pub error: Option<String>,
}

impl SubmissionEvent {
    /// Creates a submission event from the gateway outcome.
    #[must_use]
    pub fn new(
        app_id: &AppId,
        rules: &[Rule],
        outcome: &Result<SubmissionReceipt, SubmissionError>,
    ) -> Self {
        let (batch_id, error) = match outcome {
            Ok(receipt) => (Some(receipt.batch_id.clone()), None),
            Err(err) => (None, Some(err.to_string())),
        };
        Self {
            event: "rule_submission",
            timestamp_ms: now_ms(),
            app_id: app_id.clone(),
            rules: rules.iter().map(RuleSummary::of).collect(),
            accepted: outcome.is_ok(),
            batch_id,
            error,
        }
    }
}

/// Property change applied to a running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconfigureEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Owning application.
    pub app_id: AppId,
    /// Property keys added, removed, or changed.
    pub changed_keys: Vec<String>,
}

impl ReconfigureEvent {
    /// Creates a reconfigure event.
    #[must_use]
    pub fn new(app_id: &AppId, changed_keys: Vec<String>) -> Self {
        Self {
            event: "lifecycle_reconfigure",
            timestamp_ms: now_ms(),
            app_id: app_id.clone(),
            changed_keys,
        }
    }
}

/// Returns milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for lifecycle events.
pub trait AuditSink: Send + Sync {
    /// Record a start or stop event.
    fn record_lifecycle(&self, event: &LifecycleEvent);

    /// Record a gateway submission.
    fn record_submission(&self, _event: &SubmissionEvent) {}

    /// Record a reconfiguration.
    fn record_reconfigure(&self, _event: &ReconfigureEvent) {}
}

impl<T: AuditSink + ?Sized> AuditSink for Box<T> {
    fn record_lifecycle(&self, event: &LifecycleEvent) {
        (**self).record_lifecycle(event);
    }

    fn record_submission(&self, event: &SubmissionEvent) {
        (**self).record_submission(event);
    }

    fn record_reconfigure(&self, event: &ReconfigureEvent) {
        (**self).record_reconfigure(event);
    }
}

impl<T: AuditSink + ?Sized> AuditSink for &T {
    fn record_lifecycle(&self, event: &LifecycleEvent) {
        (**self).record_lifecycle(event);
    }

    fn record_submission(&self, event: &SubmissionEvent) {
        (**self).record_submission(event);
    }

    fn record_reconfigure(&self, event: &ReconfigureEvent) {
        (**self).record_reconfigure(event);
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record_lifecycle(&self, event: &LifecycleEvent) {
        write_line(&mut io::stderr(), event);
    }

    fn record_submission(&self, event: &SubmissionEvent) {
        write_line(&mut io::stderr(), event);
    }

    fn record_reconfigure(&self, event: &ReconfigureEvent) {
        write_line(&mut io::stderr(), event);
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one event.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(mut file) = self.file.lock() {
            write_line(&mut *file, event);
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record_lifecycle(&self, event: &LifecycleEvent) {
        self.append(event);
    }

    fn record_submission(&self, event: &SubmissionEvent) {
        self.append(event);
    }

    fn record_reconfigure(&self, event: &ReconfigureEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_lifecycle(&self, _event: &LifecycleEvent) {}
}

/// Captured audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditRecord {
    /// Start or stop.
    Lifecycle(LifecycleEvent),
    /// Gateway submission.
    Submission(SubmissionEvent),
    /// Property change.
    Reconfigure(ReconfigureEvent),
}

impl AuditRecord {
    /// Returns the event identifier.
    #[must_use]
    pub const fn event(&self) -> &'static str {
        match self {
            Self::Lifecycle(event) => event.event,
            Self::Submission(event) => event.event,
            Self::Reconfigure(event) => event.event,
        }
    }
}

/// Audit sink that keeps events in memory for inspection.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    /// Captured events in record order.
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the captured events.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().map(|records| records.clone()).unwrap_or_default()
    }

    /// Returns the identifiers of the captured events in record order.
    #[must_use]
    pub fn event_names(&self) -> Vec<&'static str> {
        self.records().iter().map(AuditRecord::event).collect()
    }

    /// Stores one event.
    fn push(&self, record: AuditRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

impl AuditSink for MemoryAuditSink {
    fn record_lifecycle(&self, event: &LifecycleEvent) {
        self.push(AuditRecord::Lifecycle(event.clone()));
    }

    fn record_submission(&self, event: &SubmissionEvent) {
        self.push(AuditRecord::Submission(event.clone()));
    }

    fn record_reconfigure(&self, event: &ReconfigureEvent) {
        self.push(AuditRecord::Reconfigure(event.clone()));
    }
}

/// Serializes an event as one JSON line.
fn write_line<W: Write + ?Sized, T: Serialize>(writer: &mut W, event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(writer, "{payload}");
    }
}
