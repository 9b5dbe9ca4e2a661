use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::emi::{self, EmiError, EmiQuote, LoanPolicy, TermsError};

use super::activity::{self, ActivityLogEntry, LogId, RecorderError};
use super::domain::{
    Application, ApplicationDraft, ApplicationId, ApplicationStatus, DraftError, MerchantContext,
    StatusHistoryEntry, Store, StoreDraft, StoreStatus,
};
use super::lifecycle::{self, ApplicationPatch, FieldDelta, LifecycleError, LifecyclePolicy};
use super::repository::{
    ActivityLogStore, ApplicationRepository, RepositoryError, StoreDirectory,
};
use super::report::{self, PortalSummary};

/// Facade mediating every mutation to application and store records.
///
/// Invariants enforced here: each effective mutation produces exactly one
/// activity log entry; status history only ever grows; the delete audit
/// record is written before the record leaves the repository.
pub struct PortalService<R, L, S> {
    repository: Arc<R>,
    activity: Arc<L>,
    stores: Arc<S>,
    loan_policy: LoanPolicy,
    lifecycle_policy: LifecyclePolicy,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static STORE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("APP-{id:06}"))
}

fn next_store_id() -> String {
    let id = STORE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("ST-{id:03}")
}

/// Result of an edit call: the (possibly unchanged) record plus the deltas
/// that were applied. An empty delta list means the call was a silent no-op.
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub application: Application,
    pub changed: Vec<FieldDelta>,
}

impl<R, L, S> PortalService<R, L, S>
where
    R: ApplicationRepository + 'static,
    L: ActivityLogStore + 'static,
    S: StoreDirectory + 'static,
{
    pub fn new(
        repository: Arc<R>,
        activity: Arc<L>,
        stores: Arc<S>,
        loan_policy: LoanPolicy,
        lifecycle_policy: LifecyclePolicy,
    ) -> Self {
        Self {
            repository,
            activity,
            stores,
            loan_policy,
            lifecycle_policy,
        }
    }

    pub fn loan_policy(&self) -> &LoanPolicy {
        &self.loan_policy
    }

    /// Validate a live calculator request and compute an unrounded quote.
    pub fn quote(
        &self,
        amount: f64,
        tenure_months: u32,
        annual_rate_percent: Option<f64>,
    ) -> Result<EmiQuote, PortalServiceError> {
        self.loan_policy.check(amount, tenure_months)?;
        let rate = annual_rate_percent.unwrap_or(self.loan_policy.annual_rate_percent);
        Ok(emi::compute_emi(amount, tenure_months, rate)?)
    }

    /// Accept a merchant submission: validate the draft, quote the EMI, and
    /// store a pending application with one seeded history entry.
    pub fn submit(
        &self,
        draft: ApplicationDraft,
        context: MerchantContext,
        actor: &str,
    ) -> Result<Application, PortalServiceError> {
        draft.validate(&self.loan_policy)?;

        let quoted_emi = emi::quoted_monthly_emi(
            draft.amount,
            draft.tenure_months,
            self.loan_policy.annual_rate_percent,
        )?;

        let now = Utc::now();
        let id = next_application_id();
        let application = Application {
            id: id.clone(),
            customer_name: draft.customer_name,
            phone_number: draft.phone_number,
            email: draft.email,
            card_number: draft.card_number,
            client_id: draft.client_id,
            amount: draft.amount,
            tenure_months: draft.tenure_months,
            quoted_emi,
            submitted_on: now.date_naive(),
            status: ApplicationStatus::Pending,
            store: context.store,
            merchant: context.merchant,
            approval_code: draft.approval_code,
            notes: draft.notes,
            status_history: vec![StatusHistoryEntry {
                status: ApplicationStatus::Pending,
                timestamp: now,
                by: actor.to_string(),
                note: Some("EMI application submitted for review".to_string()),
            }],
        };

        let stored = self.repository.insert(application)?;
        let entry = activity::application_created(&id, actor, &stored.customer_name)?;
        self.activity.append(entry)?;
        Ok(stored)
    }

    /// Apply a field patch. When nothing actually changes this is a silent
    /// no-op: no repository write, no log entry.
    pub fn edit_fields(
        &self,
        id: &ApplicationId,
        patch: &ApplicationPatch,
        actor: &str,
    ) -> Result<EditOutcome, PortalServiceError> {
        let current = self.fetch_required(id)?;

        let changed = lifecycle::diff(&current, patch);
        if changed.is_empty() {
            return Ok(EditOutcome {
                application: current,
                changed,
            });
        }

        let updated = lifecycle::apply(&current, patch);
        self.repository.update(updated.clone())?;
        let entry = activity::application_edited(id, actor, &changed)?;
        self.activity.append(entry)?;

        Ok(EditOutcome {
            application: updated,
            changed,
        })
    }

    /// Explicit status change. Always appends exactly one history entry and
    /// one log entry, even when the status does not actually move: a user
    /// invoked the action, so the trail records it.
    pub fn update_status(
        &self,
        id: &ApplicationId,
        new_status: ApplicationStatus,
        actor: &str,
        note: Option<String>,
    ) -> Result<Application, PortalServiceError> {
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if self.lifecycle_policy.require_note_on_status_change && note.is_none() {
            return Err(LifecycleError::MissingNote.into());
        }

        let current = self.fetch_required(id)?;
        let previous = current.status;

        let updated = lifecycle::transition(&current, new_status, actor, note.clone(), Utc::now());
        self.repository.update(updated.clone())?;

        let entry = activity::status_updated(id, actor, previous, new_status, note.as_deref())?;
        self.activity.append(entry)?;
        Ok(updated)
    }

    /// Merchant note flow: a non-empty note is always required here,
    /// independent of the status-change policy.
    pub fn add_note(
        &self,
        id: &ApplicationId,
        note: &str,
        actor: &str,
    ) -> Result<Application, PortalServiceError> {
        let note = note.trim();
        if note.is_empty() {
            return Err(LifecycleError::MissingNote.into());
        }

        let current = self.fetch_required(id)?;
        let mut updated = current.clone();
        if updated.notes.is_empty() {
            updated.notes = note.to_string();
        } else {
            updated.notes.push('\n');
            updated.notes.push_str(note);
        }

        self.repository.update(updated.clone())?;
        let entry = activity::note_added(id, actor, note)?;
        self.activity.append(entry)?;
        Ok(updated)
    }

    /// Remove an application from the active set. The audit record is written
    /// first so the customer name outlives the record.
    pub fn delete(&self, id: &ApplicationId, actor: &str) -> Result<(), PortalServiceError> {
        let current = self.fetch_required(id)?;

        let entry = activity::application_deleted(id, actor, &current.customer_name)?;
        self.activity.append(entry)?;
        self.repository.delete(id)?;
        Ok(())
    }

    pub fn get(&self, id: &ApplicationId) -> Result<Application, PortalServiceError> {
        self.fetch_required(id)
    }

    pub fn list(&self) -> Result<Vec<Application>, PortalServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn activity(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ActivityLogEntry>, PortalServiceError> {
        Ok(self.activity.entries(limit)?)
    }

    /// Administrative bulk clear of log entries. Applications are untouched.
    pub fn clear_activity(&self, ids: &[LogId]) -> Result<usize, PortalServiceError> {
        Ok(self.activity.clear(ids)?)
    }

    pub fn register_store(
        &self,
        draft: StoreDraft,
        actor: &str,
    ) -> Result<Store, PortalServiceError> {
        let store = Store {
            id: next_store_id(),
            name: draft.name,
            address: draft.address,
            phone: draft.phone,
            email: draft.email,
            manager: draft.manager,
            status: StoreStatus::Active,
        };

        let stored = self.stores.insert(store)?;
        let entry = activity::store_registered(actor, &stored.id, &stored.name)?;
        self.activity.append(entry)?;
        Ok(stored)
    }

    pub fn set_store_status(
        &self,
        id: &str,
        status: StoreStatus,
        actor: &str,
    ) -> Result<Store, PortalServiceError> {
        let mut store = self
            .stores
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        store.status = status;
        self.stores.update(store.clone())?;

        let entry = activity::store_status_changed(actor, id, status)?;
        self.activity.append(entry)?;
        Ok(store)
    }

    pub fn list_stores(&self) -> Result<Vec<Store>, PortalServiceError> {
        Ok(self.stores.list()?)
    }

    pub fn summary(&self) -> Result<PortalSummary, PortalServiceError> {
        let applications = self.repository.list()?;
        Ok(report::summarize(&applications))
    }

    fn fetch_required(&self, id: &ApplicationId) -> Result<Application, PortalServiceError> {
        Ok(self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?)
    }
}

/// Error raised by the portal service facade.
#[derive(Debug, thiserror::Error)]
pub enum PortalServiceError {
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error(transparent)]
    Terms(#[from] TermsError),
    #[error(transparent)]
    Emi(#[from] EmiError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Recorder(#[from] RecorderError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
