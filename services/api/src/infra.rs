use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use metrics_exporter_prometheus::PrometheusHandle;

use emi_portal::portal::activity::{ActivityLogEntry, LogId};
use emi_portal::portal::domain::{Application, ApplicationId, Store};
use emi_portal::portal::repository::{
    ActivityLogStore, ApplicationRepository, RepositoryError, StoreDirectory,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Applications held newest first, the same ordering the portal tables show.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<Vec<Application>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
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
        Ok(self
            .records
            .lock()
            .expect("repository mutex poisoned")
            .clone())
    }
}

/// Reverse-chronological global log: append prepends.
#[derive(Default, Clone)]
pub(crate) struct InMemoryActivityLog {
    entries: Arc<Mutex<Vec<ActivityLogEntry>>>,
}

impl ActivityLogStore for InMemoryActivityLog {
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
pub(crate) struct InMemoryStoreDirectory {
    stores: Arc<Mutex<Vec<Store>>>,
}

impl StoreDirectory for InMemoryStoreDirectory {
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
