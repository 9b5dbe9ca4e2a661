use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationStatus, StatusHistoryEntry};

/// One observed field change, rendered into the audit trail as
/// `field: "old" → "new"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDelta {
    pub field: &'static str,
    pub from: String,
    pub to: String,
}

/// Partial update for an application's editable fields.
///
/// Status history is deliberately absent: it can only grow through
/// [`transition`]. Status itself *is* patchable here, mirroring the portal's
/// permissive edit form, and a patched status bypasses the history (only an
/// explicit status update records a transition).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApplicationPatch {
    pub customer_name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub card_number: Option<String>,
    pub client_id: Option<String>,
    pub amount: Option<f64>,
    pub tenure_months: Option<u32>,
    pub status: Option<ApplicationStatus>,
    pub store: Option<String>,
    pub merchant: Option<String>,
    pub approval_code: Option<String>,
    pub notes: Option<String>,
}

/// Report the fields whose patched value differs from the current record.
pub fn diff(current: &Application, patch: &ApplicationPatch) -> Vec<FieldDelta> {
    let mut deltas = Vec::new();

    push_text(&mut deltas, "customer_name", &current.customer_name, &patch.customer_name);
    push_text(&mut deltas, "phone_number", &current.phone_number, &patch.phone_number);
    push_text(&mut deltas, "email", &current.email, &patch.email);
    push_text(&mut deltas, "card_number", &current.card_number, &patch.card_number);
    push_text(&mut deltas, "client_id", &current.client_id, &patch.client_id);

    if let Some(amount) = patch.amount {
        if amount != current.amount {
            deltas.push(FieldDelta {
                field: "amount",
                from: current.amount.to_string(),
                to: amount.to_string(),
            });
        }
    }
    if let Some(tenure) = patch.tenure_months {
        if tenure != current.tenure_months {
            deltas.push(FieldDelta {
                field: "tenure_months",
                from: current.tenure_months.to_string(),
                to: tenure.to_string(),
            });
        }
    }
    if let Some(status) = patch.status {
        if status != current.status {
            deltas.push(FieldDelta {
                field: "status",
                from: current.status.label().to_string(),
                to: status.label().to_string(),
            });
        }
    }

    push_text(&mut deltas, "store", &current.store, &patch.store);
    push_text(&mut deltas, "merchant", &current.merchant, &patch.merchant);
    push_text(&mut deltas, "approval_code", &current.approval_code, &patch.approval_code);
    push_text(&mut deltas, "notes", &current.notes, &patch.notes);

    deltas
}

fn push_text(
    deltas: &mut Vec<FieldDelta>,
    field: &'static str,
    current: &str,
    patched: &Option<String>,
) {
    if let Some(next) = patched {
        if next != current {
            deltas.push(FieldDelta {
                field,
                from: current.to_string(),
                to: next.clone(),
            });
        }
    }
}

/// Apply a patch, producing a new record. The input is never mutated; callers
/// replace their stored value with the returned one.
pub fn apply(current: &Application, patch: &ApplicationPatch) -> Application {
    let mut next = current.clone();

    if let Some(value) = &patch.customer_name {
        next.customer_name = value.clone();
    }
    if let Some(value) = &patch.phone_number {
        next.phone_number = value.clone();
    }
    if let Some(value) = &patch.email {
        next.email = value.clone();
    }
    if let Some(value) = &patch.card_number {
        next.card_number = value.clone();
    }
    if let Some(value) = &patch.client_id {
        next.client_id = value.clone();
    }
    if let Some(value) = patch.amount {
        next.amount = value;
    }
    if let Some(value) = patch.tenure_months {
        next.tenure_months = value;
    }
    if let Some(value) = patch.status {
        next.status = value;
    }
    if let Some(value) = &patch.store {
        next.store = value.clone();
    }
    if let Some(value) = &patch.merchant {
        next.merchant = value.clone();
    }
    if let Some(value) = &patch.approval_code {
        next.approval_code = value.clone();
    }
    if let Some(value) = &patch.notes {
        next.notes = value.clone();
    }

    next
}

/// Append one history entry and move the application to `new_status`.
///
/// Any status may follow any other; the portal records rather than restricts.
/// Returns a new record, history extended by exactly one entry.
pub fn transition(
    current: &Application,
    new_status: ApplicationStatus,
    actor: &str,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Application {
    let mut next = current.clone();
    next.status_history.push(StatusHistoryEntry {
        status: new_status,
        timestamp: now,
        by: actor.to_string(),
        note,
    });
    next.status = new_status;
    next
}

/// Policy switches for lifecycle operations.
///
/// The note requirement is asymmetric on purpose: the merchant add-note flow
/// always demands a note, while the admin quick status change only does when
/// this flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub require_note_on_status_change: bool,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("'{0}' is not a recognized application status")]
    InvalidStatus(String),
    #[error("a note is required for this action")]
    MissingNote,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn application() -> Application {
        use super::super::domain::ApplicationId;

        Application {
            id: ApplicationId("APP-000001".to_string()),
            customer_name: "John".to_string(),
            phone_number: "01712345678".to_string(),
            email: "john@example.com".to_string(),
            card_number: "4242".to_string(),
            client_id: "CL-1".to_string(),
            amount: 50_000.0,
            tenure_months: 12,
            quoted_emi: 4_167,
            submitted_on: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
            status: ApplicationStatus::Pending,
            store: "Tech World".to_string(),
            merchant: "Current Merchant".to_string(),
            approval_code: "AP-1".to_string(),
            notes: String::new(),
            status_history: Vec::new(),
        }
    }

    #[test]
    fn diff_reports_only_changed_fields() {
        let app = application();
        let patch = ApplicationPatch {
            customer_name: Some("Jonathan".to_string()),
            phone_number: Some(app.phone_number.clone()),
            amount: Some(60_000.0),
            ..ApplicationPatch::default()
        };

        let deltas = diff(&app, &patch);
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].field, "customer_name");
        assert_eq!(deltas[0].from, "John");
        assert_eq!(deltas[0].to, "Jonathan");
        assert_eq!(deltas[1].field, "amount");
    }

    #[test]
    fn identical_patch_produces_empty_diff() {
        let app = application();
        let patch = ApplicationPatch {
            customer_name: Some(app.customer_name.clone()),
            status: Some(app.status),
            notes: Some(app.notes.clone()),
            ..ApplicationPatch::default()
        };
        assert!(diff(&app, &patch).is_empty());
    }

    #[test]
    fn apply_returns_a_new_value_without_touching_the_input() {
        let app = application();
        let patch = ApplicationPatch {
            customer_name: Some("Jonathan".to_string()),
            ..ApplicationPatch::default()
        };

        let updated = apply(&app, &patch);
        assert_eq!(updated.customer_name, "Jonathan");
        assert_eq!(app.customer_name, "John");
        assert_eq!(updated.status_history, app.status_history);
    }

    #[test]
    fn patched_status_bypasses_history() {
        let app = application();
        let patch = ApplicationPatch {
            status: Some(ApplicationStatus::Verified),
            ..ApplicationPatch::default()
        };
        let updated = apply(&app, &patch);
        assert_eq!(updated.status, ApplicationStatus::Verified);
        assert!(updated.status_history.is_empty());
    }

    #[test]
    fn transition_appends_exactly_one_history_entry() {
        let app = application();
        let now = Utc::now();
        let updated = transition(
            &app,
            ApplicationStatus::Approved,
            "Admin User",
            Some("all docs verified".to_string()),
            now,
        );

        assert_eq!(updated.status, ApplicationStatus::Approved);
        assert_eq!(updated.status_history.len(), 1);
        let entry = &updated.status_history[0];
        assert_eq!(entry.status, ApplicationStatus::Approved);
        assert_eq!(entry.by, "Admin User");
        assert_eq!(entry.note.as_deref(), Some("all docs verified"));
        assert!(app.status_history.is_empty());
    }

    #[test]
    fn transition_allows_reopening_a_rejected_application() {
        let app = application();
        let now = Utc::now();
        let rejected = transition(&app, ApplicationStatus::Rejected, "Admin User", None, now);
        let reopened = transition(&rejected, ApplicationStatus::Pending, "Admin User", None, now);

        assert_eq!(reopened.status, ApplicationStatus::Pending);
        assert_eq!(reopened.status_history.len(), 2);
        // Earlier entries are untouched by later transitions.
        assert_eq!(
            reopened.status_history[0].status,
            ApplicationStatus::Rejected
        );
    }
}
