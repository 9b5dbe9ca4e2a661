use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::emi::{LoanPolicy, TermsError};

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a credit application.
///
/// `Pending` is the only initial state. Everything else is admin-driven and
/// deliberately unordered: the portal is a manually operated back office and
/// trusts the admin actor rather than encoding a fixed transition graph, so a
/// rejected application may be reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Verified,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Verified, Self::Approved, Self::Rejected];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Verified => "verified",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Parse a status received from an API caller.
    pub fn parse(raw: &str) -> Result<Self, super::lifecycle::LifecycleError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(super::lifecycle::LifecycleError::InvalidStatus(
                other.to_string(),
            )),
        }
    }
}

/// A single status transition. Immutable once appended to the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub status: ApplicationStatus,
    pub timestamp: DateTime<Utc>,
    pub by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The central entity: one EMI credit application from a retail store.
///
/// `status_history` is append-only; entries are never edited, reordered, or
/// truncated. The free-text `notes` field is mutable and independent of the
/// history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub customer_name: String,
    pub phone_number: String,
    pub email: String,
    pub card_number: String,
    pub client_id: String,
    /// Purchase amount, BDT.
    pub amount: f64,
    pub tenure_months: u32,
    /// Rounded whole-BDT installment quoted at submission time.
    pub quoted_emi: u64,
    pub submitted_on: NaiveDate,
    pub status: ApplicationStatus,
    pub store: String,
    pub merchant: String,
    pub approval_code: String,
    pub notes: String,
    pub status_history: Vec<StatusHistoryEntry>,
}

impl Application {
    pub fn list_view(&self) -> ApplicationView {
        ApplicationView {
            id: self.id.clone(),
            customer_name: self.customer_name.clone(),
            amount: self.amount,
            tenure_months: self.tenure_months,
            quoted_emi: self.quoted_emi,
            status: self.status.label(),
            store: self.store.clone(),
            submitted_on: self.submitted_on,
        }
    }
}

/// Compact row for table listings.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub customer_name: String,
    pub amount: f64,
    pub tenure_months: u32,
    pub quoted_emi: u64,
    pub status: &'static str,
    pub store: String,
    pub submitted_on: NaiveDate,
}

/// Submission context supplied by the acting merchant session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantContext {
    pub store: String,
    pub merchant: String,
}

/// Validated intake draft for a new application.
///
/// Format checks run here, at the boundary, so the lifecycle machinery only
/// ever sees well-formed records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub customer_name: String,
    pub phone_number: String,
    pub email: String,
    pub card_number: String,
    pub client_id: String,
    pub amount: f64,
    pub tenure_months: u32,
    pub approval_code: String,
    #[serde(default)]
    pub notes: String,
}

impl ApplicationDraft {
    pub fn validate(&self, policy: &LoanPolicy) -> Result<(), DraftError> {
        if self.customer_name.trim().is_empty() {
            return Err(DraftError::MissingCustomerName);
        }
        if !email_pattern().is_match(self.email.trim()) {
            return Err(DraftError::InvalidEmail(self.email.clone()));
        }
        if !phone_pattern().is_match(self.phone_number.trim()) {
            return Err(DraftError::InvalidPhoneNumber(self.phone_number.clone()));
        }
        policy.check(self.amount, self.tenure_months)?;
        Ok(())
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

fn phone_pattern() -> &'static Regex {
    // Bangladeshi mobile format, optional +88 country prefix.
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\+88)?01[3-9]\d{8}$").expect("valid phone pattern"))
}

/// Intake validation errors for application drafts.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DraftError {
    #[error("customer name is required")]
    MissingCustomerName,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("'{0}' is not a valid Bangladeshi mobile number")]
    InvalidPhoneNumber(String),
    #[error(transparent)]
    Terms(#[from] TermsError),
}

/// Retail store registered with the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub manager: String,
    pub status: StoreStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    pub const fn label(self) -> &'static str {
        match self {
            StoreStatus::Active => "active",
            StoreStatus::Inactive => "inactive",
        }
    }
}

/// Registration payload for a new store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDraft {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub manager: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ApplicationDraft {
        ApplicationDraft {
            customer_name: "Anika Rahman".to_string(),
            phone_number: "01712345678".to_string(),
            email: "anika@example.com".to_string(),
            card_number: "4242-0000-1111-2222".to_string(),
            client_id: "CL-4471".to_string(),
            amount: 60_000.0,
            tenure_months: 12,
            approval_code: "AP-9921".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn valid_draft_passes_boundary_checks() {
        assert_eq!(draft().validate(&LoanPolicy::default()), Ok(()));
    }

    #[test]
    fn phone_prefix_variants_are_accepted() {
        let mut d = draft();
        d.phone_number = "+8801912345678".to_string();
        assert_eq!(d.validate(&LoanPolicy::default()), Ok(()));

        d.phone_number = "01112345678".to_string();
        assert!(matches!(
            d.validate(&LoanPolicy::default()),
            Err(DraftError::InvalidPhoneNumber(_))
        ));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut d = draft();
        d.email = "not-an-email".to_string();
        assert!(matches!(
            d.validate(&LoanPolicy::default()),
            Err(DraftError::InvalidEmail(_))
        ));
    }

    #[test]
    fn terms_violations_surface_through_draft_validation() {
        let mut d = draft();
        d.amount = 1_000.0;
        assert!(matches!(
            d.validate(&LoanPolicy::default()),
            Err(DraftError::Terms(TermsError::AmountOutOfRange { .. }))
        ));

        let mut d = draft();
        d.tenure_months = 13;
        assert!(matches!(
            d.validate(&LoanPolicy::default()),
            Err(DraftError::Terms(TermsError::UnsupportedTenure(13)))
        ));
    }

    #[test]
    fn status_parse_recognizes_the_four_states() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::parse(status.label()), Ok(status));
        }
        assert!(ApplicationStatus::parse("declined").is_err());
    }
}
