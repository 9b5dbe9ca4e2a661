use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationId, ApplicationStatus, StoreStatus};
use super::lifecycle::FieldDelta;

/// Identifier for a system-wide activity log entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(pub String);

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category tag for log filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Create,
    Update,
    Delete,
    StatusUpdate,
    NoteAdd,
    Edit,
}

impl ActivityKind {
    pub const fn label(self) -> &'static str {
        match self {
            ActivityKind::Create => "create",
            ActivityKind::Update => "update",
            ActivityKind::Delete => "delete",
            ActivityKind::StatusUpdate => "status_update",
            ActivityKind::NoteAdd => "note_add",
            ActivityKind::Edit => "edit",
        }
    }
}

/// One system-wide audit record. Created once at the moment of a mutation and
/// never modified afterwards; administrative bulk clearing removes entries
/// from the log store without touching the applications they reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub id: LogId,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
    pub kind: ActivityKind,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecorderError {
    #[error("an actor is required for every activity log entry")]
    MissingActor,
    #[error("an action label is required for every activity log entry")]
    MissingAction,
}

static LOG_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_log_id(timestamp: DateTime<Utc>) -> LogId {
    // The sequence suffix keeps ids unique when two entries share a
    // millisecond; ids stay sortable by creation time.
    let seq = LOG_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LogId(format!("LOG-{}-{seq:04}", timestamp.timestamp_millis()))
}

/// Build one immutable log entry for a described mutation.
///
/// Pure factory apart from id/timestamp assignment: persisting the entry is
/// the caller's responsibility, conventionally by prepending to the global
/// reverse-chronological list.
pub fn record(
    actor: &str,
    action: &str,
    details: String,
    application_id: Option<ApplicationId>,
    kind: ActivityKind,
) -> Result<ActivityLogEntry, RecorderError> {
    let actor = actor.trim();
    if actor.is_empty() {
        return Err(RecorderError::MissingActor);
    }
    let action = action.trim();
    if action.is_empty() {
        return Err(RecorderError::MissingAction);
    }

    let timestamp = Utc::now();
    Ok(ActivityLogEntry {
        id: next_log_id(timestamp),
        timestamp,
        actor: actor.to_string(),
        action: action.to_string(),
        details,
        application_id,
        kind,
    })
}

pub fn application_created(
    id: &ApplicationId,
    actor: &str,
    customer_name: &str,
) -> Result<ActivityLogEntry, RecorderError> {
    record(
        actor,
        "Application Submitted",
        format!("Application {id} submitted for {customer_name}"),
        Some(id.clone()),
        ActivityKind::Create,
    )
}

pub fn application_edited(
    id: &ApplicationId,
    actor: &str,
    deltas: &[FieldDelta],
) -> Result<ActivityLogEntry, RecorderError> {
    let changes = deltas
        .iter()
        .map(|delta| format!("{}: \"{}\" → \"{}\"", delta.field, delta.from, delta.to))
        .collect::<Vec<_>>()
        .join(", ");

    record(
        actor,
        "Application Edited",
        format!("Application {id} updated: {changes}"),
        Some(id.clone()),
        ActivityKind::Edit,
    )
}

pub fn status_updated(
    id: &ApplicationId,
    actor: &str,
    from: ApplicationStatus,
    to: ApplicationStatus,
    note: Option<&str>,
) -> Result<ActivityLogEntry, RecorderError> {
    let mut details = format!(
        "Application {id} status changed from {} to {}",
        from.label(),
        to.label()
    );
    if let Some(note) = note {
        details.push_str(&format!(" with note: \"{note}\""));
    }

    record(
        actor,
        "Status Updated",
        details,
        Some(id.clone()),
        ActivityKind::StatusUpdate,
    )
}

pub fn note_added(
    id: &ApplicationId,
    actor: &str,
    note: &str,
) -> Result<ActivityLogEntry, RecorderError> {
    record(
        actor,
        "Note Added",
        format!("Note added to application {id}: \"{note}\""),
        Some(id.clone()),
        ActivityKind::NoteAdd,
    )
}

/// Delete records capture the customer name up front, so the name survives
/// even though the application record itself is about to be discarded.
pub fn application_deleted(
    id: &ApplicationId,
    actor: &str,
    customer_name: &str,
) -> Result<ActivityLogEntry, RecorderError> {
    record(
        actor,
        "Application Deleted",
        format!("Application {id} ({customer_name}) was deleted"),
        Some(id.clone()),
        ActivityKind::Delete,
    )
}

pub fn store_registered(
    actor: &str,
    store_id: &str,
    store_name: &str,
) -> Result<ActivityLogEntry, RecorderError> {
    record(
        actor,
        "Store Registered",
        format!("Store {store_id} ({store_name}) registered"),
        None,
        ActivityKind::Create,
    )
}

pub fn store_status_changed(
    actor: &str,
    store_id: &str,
    status: StoreStatus,
) -> Result<ActivityLogEntry, RecorderError> {
    record(
        actor,
        "Store Status Changed",
        format!("Store {store_id} marked {}", status.label()),
        None,
        ActivityKind::Update,
    )
}
