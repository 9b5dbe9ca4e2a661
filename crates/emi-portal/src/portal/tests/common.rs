use std::sync::{Arc, Mutex};

use crate::emi::LoanPolicy;
use crate::portal::activity::{ActivityLogEntry, LogId};
use crate::portal::domain::{
    Application, ApplicationDraft, ApplicationId, MerchantContext, Store,
};
use crate::portal::lifecycle::LifecyclePolicy;
use crate::portal::repository::{
    ActivityLogStore, ApplicationRepository, RepositoryError, StoreDirectory,
};
use crate::portal::service::PortalService;

pub(super) fn draft() -> ApplicationDraft {
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

pub(super) fn merchant_context() -> MerchantContext {
    MerchantContext {
        store: "Tech World".to_string(),
        merchant: "Current Merchant".to_string(),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<Vec<Application>>>,
}

impl ApplicationRepository for MemoryRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|app| app.id == application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(0, application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.iter_mut().find(|app| app.id == application.id) {
            Some(slot) => {
                *slot = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|app| &app.id == id).cloned())
    }

    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|app| &app.id != id);
        if guard.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.records.lock().expect("repository mutex poisoned").clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryActivityLog {
    entries: Arc<Mutex<Vec<ActivityLogEntry>>>,
}

impl MemoryActivityLog {
    pub(super) fn snapshot(&self) -> Vec<ActivityLogEntry> {
        self.entries.lock().expect("log mutex poisoned").clone()
    }
}

impl ActivityLogStore for MemoryActivityLog {
    fn append(&self, entry: ActivityLogEntry) -> Result<(), RepositoryError> {
        self.entries
            .lock()
            .expect("log mutex poisoned")
            .insert(0, entry);
        Ok(())
    }

    fn entries(&self, limit: Option<usize>) -> Result<Vec<ActivityLogEntry>, RepositoryError> {
        let guard = self.entries.lock().expect("log mutex poisoned");
        let take = limit.unwrap_or(guard.len());
        Ok(guard.iter().take(take).cloned().collect())
    }

    fn clear(&self, ids: &[LogId]) -> Result<usize, RepositoryError> {
        let mut guard = self.entries.lock().expect("log mutex poisoned");
        let before = guard.len();
        guard.retain(|entry| !ids.contains(&entry.id));
        Ok(before - guard.len())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStoreDirectory {
    stores: Arc<Mutex<Vec<Store>>>,
}

impl StoreDirectory for MemoryStoreDirectory {
    fn insert(&self, store: Store) -> Result<Store, RepositoryError> {
        let mut guard = self.stores.lock().expect("store mutex poisoned");
        if guard.iter().any(|existing| existing.id == store.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(store.clone());
        Ok(store)
    }

    fn update(&self, store: Store) -> Result<(), RepositoryError> {
        let mut guard = self.stores.lock().expect("store mutex poisoned");
        match guard.iter_mut().find(|existing| existing.id == store.id) {
            Some(slot) => {
                *slot = store;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &str) -> Result<Option<Store>, RepositoryError> {
        let guard = self.stores.lock().expect("store mutex poisoned");
        Ok(guard.iter().find(|store| store.id == id).cloned())
    }

    fn list(&self) -> Result<Vec<Store>, RepositoryError> {
        Ok(self.stores.lock().expect("store mutex poisoned").clone())
    }
}

pub(super) type TestService =
    PortalService<MemoryRepository, MemoryActivityLog, MemoryStoreDirectory>;

pub(super) fn build_service() -> (
    Arc<TestService>,
    Arc<MemoryRepository>,
    Arc<MemoryActivityLog>,
) {
    build_service_with_policy(LifecyclePolicy::default())
}

pub(super) fn build_service_with_policy(
    lifecycle: LifecyclePolicy,
) -> (
    Arc<TestService>,
    Arc<MemoryRepository>,
    Arc<MemoryActivityLog>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let log = Arc::new(MemoryActivityLog::default());
    let stores = Arc::new(MemoryStoreDirectory::default());
    let service = Arc::new(PortalService::new(
        repository.clone(),
        log.clone(),
        stores,
        LoanPolicy::default(),
        lifecycle,
    ));
    (service, repository, log)
}
