use std::collections::HashMap;

use serde::Serialize;

use super::activity::ActivityLogEntry;
use super::domain::{Application, ApplicationStatus};

/// Dashboard roll-up over the current application set.
#[derive(Debug, Clone, Serialize)]
pub struct PortalSummary {
    pub total_applications: usize,
    pub status_counts: Vec<StatusCountEntry>,
    pub total_requested_amount: f64,
    pub total_quoted_emi: u64,
    pub top_stores: Vec<StorePerformanceEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: ApplicationStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorePerformanceEntry {
    pub store: String,
    pub applications: usize,
    pub approved: usize,
    pub approved_amount: f64,
}

/// Aggregate the active applications into the dashboard summary. Counts are
/// reported for all four statuses in lifecycle order, zero or not; stores are
/// ranked by approved amount.
pub fn summarize(applications: &[Application]) -> PortalSummary {
    let status_counts = ApplicationStatus::ALL
        .into_iter()
        .map(|status| StatusCountEntry {
            status,
            label: status.label(),
            count: applications
                .iter()
                .filter(|app| app.status == status)
                .count(),
        })
        .collect();

    let total_requested_amount = applications.iter().map(|app| app.amount).sum();
    let total_quoted_emi = applications.iter().map(|app| app.quoted_emi).sum();

    let mut per_store: HashMap<&str, StorePerformanceEntry> = HashMap::new();
    for app in applications {
        let entry = per_store
            .entry(app.store.as_str())
            .or_insert_with(|| StorePerformanceEntry {
                store: app.store.clone(),
                applications: 0,
                approved: 0,
                approved_amount: 0.0,
            });
        entry.applications += 1;
        if app.status == ApplicationStatus::Approved {
            entry.approved += 1;
            entry.approved_amount += app.amount;
        }
    }

    let mut top_stores: Vec<StorePerformanceEntry> = per_store.into_values().collect();
    top_stores.sort_by(|a, b| {
        b.approved_amount
            .partial_cmp(&a.approved_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.store.cmp(&b.store))
    });

    PortalSummary {
        total_applications: applications.len(),
        status_counts,
        total_requested_amount,
        total_quoted_emi,
        top_stores,
    }
}

/// CSV rendering failures. Layout is cosmetic, not contractual, but a render
/// error must still surface instead of producing a truncated file.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("csv rendering failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer was not valid utf-8")]
    Encoding,
}

pub fn applications_csv(applications: &[Application]) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "customer_name",
        "store",
        "merchant",
        "amount",
        "tenure_months",
        "quoted_emi",
        "status",
        "submitted_on",
    ])?;

    for app in applications {
        writer.write_record([
            app.id.0.as_str(),
            app.customer_name.as_str(),
            app.store.as_str(),
            app.merchant.as_str(),
            &app.amount.to_string(),
            &app.tenure_months.to_string(),
            &app.quoted_emi.to_string(),
            app.status.label(),
            &app.submitted_on.to_string(),
        ])?;
    }

    finish(writer)
}

pub fn activity_csv(entries: &[ActivityLogEntry]) -> Result<String, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id",
        "timestamp",
        "actor",
        "action",
        "kind",
        "application_id",
        "details",
    ])?;

    for entry in entries {
        writer.write_record([
            entry.id.0.as_str(),
            &entry.timestamp.to_rfc3339(),
            entry.actor.as_str(),
            entry.action.as_str(),
            entry.kind.label(),
            entry
                .application_id
                .as_ref()
                .map(|id| id.0.as_str())
                .unwrap_or(""),
            entry.details.as_str(),
        ])?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ReportError> {
    let buffer = writer
        .into_inner()
        .map_err(|err| ReportError::Csv(err.into_error().into()))?;
    String::from_utf8(buffer).map_err(|_| ReportError::Encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::domain::ApplicationId;
    use chrono::NaiveDate;

    fn application(id: &str, store: &str, amount: f64, status: ApplicationStatus) -> Application {
        Application {
            id: ApplicationId(id.to_string()),
            customer_name: "Customer".to_string(),
            phone_number: "01712345678".to_string(),
            email: "customer@example.com".to_string(),
            card_number: "4242".to_string(),
            client_id: "CL-1".to_string(),
            amount,
            tenure_months: 12,
            quoted_emi: (amount / 12.0).round() as u64,
            submitted_on: NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date"),
            status,
            store: store.to_string(),
            merchant: "Merchant".to_string(),
            approval_code: "AP".to_string(),
            notes: String::new(),
            status_history: Vec::new(),
        }
    }

    #[test]
    fn summary_counts_every_status_even_when_zero() {
        let apps = vec![
            application("APP-1", "Tech World", 50_000.0, ApplicationStatus::Approved),
            application("APP-2", "Tech World", 30_000.0, ApplicationStatus::Pending),
        ];

        let summary = summarize(&apps);
        assert_eq!(summary.total_applications, 2);
        assert_eq!(summary.status_counts.len(), 4);
        let rejected = summary
            .status_counts
            .iter()
            .find(|entry| entry.status == ApplicationStatus::Rejected)
            .expect("rejected bucket present");
        assert_eq!(rejected.count, 0);
        assert_eq!(summary.total_requested_amount, 80_000.0);
    }

    #[test]
    fn stores_rank_by_approved_amount() {
        let apps = vec![
            application("APP-1", "Tech World", 50_000.0, ApplicationStatus::Approved),
            application("APP-2", "Gadget Hub", 90_000.0, ApplicationStatus::Approved),
            application("APP-3", "Tech World", 200_000.0, ApplicationStatus::Pending),
        ];

        let summary = summarize(&apps);
        assert_eq!(summary.top_stores[0].store, "Gadget Hub");
        assert_eq!(summary.top_stores[0].approved_amount, 90_000.0);
        assert_eq!(summary.top_stores[1].store, "Tech World");
        assert_eq!(summary.top_stores[1].applications, 2);
        assert_eq!(summary.top_stores[1].approved, 1);
    }

    #[test]
    fn applications_csv_has_header_and_one_row_per_record() {
        let apps = vec![
            application("APP-1", "Tech World", 50_000.0, ApplicationStatus::Approved),
            application("APP-2", "Gadget Hub", 30_000.0, ApplicationStatus::Pending),
        ];

        let rendered = applications_csv(&apps).expect("csv renders");
        let lines: Vec<&str> = rendered.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,customer_name"));
        assert!(lines[1].contains("APP-1"));
        assert!(lines[2].contains("Gadget Hub"));
    }

    #[test]
    fn activity_csv_renders_entries_with_optional_application_id() {
        use crate::portal::activity::{self, ActivityKind};

        let entries = vec![
            activity::record(
                "Admin User",
                "Status Updated",
                "Application APP-1 status changed from pending to approved".to_string(),
                Some(ApplicationId("APP-1".to_string())),
                ActivityKind::StatusUpdate,
            )
            .expect("entry"),
            activity::store_registered("Admin User", "ST-001", "Tech World").expect("entry"),
        ];

        let rendered = activity_csv(&entries).expect("csv renders");
        let lines: Vec<&str> = rendered.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,timestamp"));
        assert!(lines[1].contains("APP-1"));
        // Store entries have no application back-reference; the column is empty.
        assert!(lines[2].contains("Store Registered"));
    }
}
