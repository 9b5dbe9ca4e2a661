use super::activity::{ActivityLogEntry, LogId};
use super::domain::{Application, ApplicationId, Store};

/// Storage abstraction for application records so the service module can be
/// exercised against any backend. Implementations decide durability; the
/// in-memory backends used by the API binary and tests are the reference.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<Application>, RepositoryError>;
}

/// Append-only store for the global activity log.
///
/// `append` prepends: the log reads newest first. `clear` removes the listed
/// entries only, leaving applications and their embedded histories alone.
pub trait ActivityLogStore: Send + Sync {
    fn append(&self, entry: ActivityLogEntry) -> Result<(), RepositoryError>;
    fn entries(&self, limit: Option<usize>) -> Result<Vec<ActivityLogEntry>, RepositoryError>;
    fn clear(&self, ids: &[LogId]) -> Result<usize, RepositoryError>;
}

/// Registry of retail stores enrolled in the portal.
pub trait StoreDirectory: Send + Sync {
    fn insert(&self, store: Store) -> Result<Store, RepositoryError>;
    fn update(&self, store: Store) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &str) -> Result<Option<Store>, RepositoryError>;
    fn list(&self) -> Result<Vec<Store>, RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
