use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::{Employee, EmployeeDraft, EmployeeForm},
    validation::{validate_form, ValidationError},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod error;
pub mod filter;
pub mod transport;

pub use error::StoreError;
pub use filter::EmployeeQuery;
pub use transport::{DirectoryTransport, HttpDirectoryTransport, DEFAULT_TIMEOUT};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How local state is reconciled after a write the service accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// Patch the collection with the record the service echoed back.
    #[default]
    Merge,
    /// Reload the whole collection.
    Refetch,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub collection_url: String,
    pub timeout: Duration,
    pub policy: SyncPolicy,
}

impl StoreConfig {
    pub fn new(collection_url: impl Into<String>) -> Self {
        Self {
            collection_url: collection_url.into(),
            timeout: DEFAULT_TIMEOUT,
            policy: SyncPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Loaded { count: usize },
    Created(Employee),
    Updated(Employee),
    Deleted { email: String },
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub employees: Vec<Employee>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct StoreState {
    employees: Vec<Employee>,
    error: Option<String>,
}

/// A write the service confirmed, in the shape needed to patch local state.
enum ConfirmedWrite {
    Created(Employee),
    Updated { key: String, employee: Employee },
    Deleted { email: String },
}

impl ConfirmedWrite {
    fn event(&self) -> StoreEvent {
        match self {
            Self::Created(employee) => StoreEvent::Created(employee.clone()),
            Self::Updated { employee, .. } => StoreEvent::Updated(employee.clone()),
            Self::Deleted { email } => StoreEvent::Deleted {
                email: email.clone(),
            },
        }
    }
}

impl StoreState {
    fn merge(&mut self, write: &ConfirmedWrite) {
        match write {
            ConfirmedWrite::Created(employee) => self.upsert(&employee.email, employee.clone()),
            ConfirmedWrite::Updated { key, employee } => self.upsert(key, employee.clone()),
            ConfirmedWrite::Deleted { email } => self.employees.retain(|e| &e.email != email),
        }
    }

    fn upsert(&mut self, key: &str, employee: Employee) {
        match self.employees.iter_mut().find(|e| e.email == key) {
            Some(slot) => *slot = employee,
            None => self.employees.push(employee),
        }
    }
}

/// Owns the employee collection as the front end sees it and is the only
/// component that talks to the directory service.
///
/// The collection is written only when a call resolves, and the state lock is
/// never held across a network request. Overlapping calls are not queued.
pub struct EmployeeStore {
    transport: Arc<dyn DirectoryTransport>,
    policy: SyncPolicy,
    inner: Mutex<StoreState>,
    in_flight: AtomicUsize,
    events: broadcast::Sender<StoreEvent>,
}

/// Counts one call as in flight until dropped, including when the caller
/// abandons the future mid-request.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EmployeeStore {
    pub fn new(transport: Arc<dyn DirectoryTransport>, policy: SyncPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            transport,
            policy,
            inner: Mutex::new(StoreState::default()),
            in_flight: AtomicUsize::new(0),
            events,
        }
    }

    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let transport = HttpDirectoryTransport::new(&config.collection_url, config.timeout)?;
        Ok(Self::new(Arc::new(transport), config.policy))
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let guard = self.inner.lock().await;
        StoreSnapshot {
            employees: guard.employees.clone(),
            loading: self.in_flight.load(Ordering::SeqCst) > 0,
            error: guard.error.clone(),
        }
    }

    pub async fn employees(&self) -> Vec<Employee> {
        self.inner.lock().await.employees.clone()
    }

    pub async fn find(&self, email: &str) -> Option<Employee> {
        let email = email.trim();
        let guard = self.inner.lock().await;
        guard.employees.iter().find(|e| e.email == email).cloned()
    }

    pub async fn search(&self, query: &EmployeeQuery) -> Vec<Employee> {
        let guard = self.inner.lock().await;
        query.apply(&guard.employees).into_iter().cloned().collect()
    }

    pub async fn dismiss_error(&self) {
        self.inner.lock().await.error = None;
    }

    /// Replaces the collection with the service's. On failure the previous
    /// collection stays as it was.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let call = InFlight::enter(&self.in_flight);
        let result = self.transport.list().await;

        let mut guard = self.inner.lock().await;
        drop(call);
        match result {
            Ok(employees) => {
                let count = employees.len();
                guard.employees = employees;
                guard.error = None;
                drop(guard);
                info!(count, "employee directory loaded");
                let _ = self.events.send(StoreEvent::Loaded { count });
                Ok(count)
            }
            Err(err) => Err(self.record_failure(&mut guard, "load", err)),
        }
    }

    pub async fn create(&self, form: &EmployeeForm) -> Result<Employee, StoreError> {
        let draft = self.validated(form, "create").await?;
        let call = InFlight::enter(&self.in_flight);
        let result = self.transport.create(&draft).await;
        self.settle_write(call, "create", result, |employee| {
            ConfirmedWrite::Created(employee.clone())
        })
        .await
    }

    /// Routes to the record whose email is `key`; the form may carry a new
    /// email.
    pub async fn update(&self, key: &str, form: &EmployeeForm) -> Result<Employee, StoreError> {
        let key = self.validated_key(key, "update").await?;
        let draft = self.validated(form, "update").await?;
        let call = InFlight::enter(&self.in_flight);
        let result = self.transport.update(&key, &draft).await;
        self.settle_write(call, "update", result, |employee| ConfirmedWrite::Updated {
            key: key.clone(),
            employee: employee.clone(),
        })
        .await
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = self.validated_key(key, "delete").await?;
        let call = InFlight::enter(&self.in_flight);
        let result = self.transport.delete(&key).await;
        self.settle_write(call, "delete", result, |_| ConfirmedWrite::Deleted {
            email: key.clone(),
        })
        .await
    }

    async fn validated(
        &self,
        form: &EmployeeForm,
        operation: &'static str,
    ) -> Result<EmployeeDraft, StoreError> {
        match validate_form(form) {
            Ok(draft) => Ok(draft),
            Err(err) => {
                let mut guard = self.inner.lock().await;
                Err(self.record_failure(&mut guard, operation, err.into()))
            }
        }
    }

    async fn validated_key(&self, key: &str, operation: &'static str) -> Result<String, StoreError> {
        let key = key.trim();
        if key.is_empty() {
            let mut guard = self.inner.lock().await;
            let err: StoreError = ValidationError::MissingField("email").into();
            return Err(self.record_failure(&mut guard, operation, err));
        }
        Ok(key.to_string())
    }

    /// Applies the sync policy to a resolved write. A failed write leaves the
    /// collection untouched.
    async fn settle_write<T>(
        &self,
        call: InFlight<'_>,
        operation: &'static str,
        result: Result<T, StoreError>,
        confirmed: impl FnOnce(&T) -> ConfirmedWrite,
    ) -> Result<T, StoreError> {
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                let mut guard = self.inner.lock().await;
                drop(call);
                return Err(self.record_failure(&mut guard, operation, err));
            }
        };
        let write = confirmed(&value);

        let reloaded = match self.policy {
            SyncPolicy::Merge => None,
            SyncPolicy::Refetch => Some(self.transport.list().await),
        };

        let mut guard = self.inner.lock().await;
        drop(call);
        let mut reload_error = None;
        match reloaded {
            None => {
                guard.merge(&write);
                guard.error = None;
            }
            Some(Ok(employees)) => {
                guard.employees = employees;
                guard.error = None;
            }
            Some(Err(err)) => {
                // The write stands; patch locally so the list isn't stale.
                guard.merge(&write);
                let message = format!("{operation} succeeded but reloading failed: {err}");
                warn!(operation, error = %err, "reload after write failed");
                guard.error = Some(message.clone());
                reload_error = Some(message);
            }
        }
        drop(guard);

        info!(operation, policy = ?self.policy, "employee write confirmed");
        let _ = self.events.send(write.event());
        if let Some(message) = reload_error {
            let _ = self.events.send(StoreEvent::Error(message));
        }
        Ok(value)
    }

    fn record_failure(
        &self,
        state: &mut StoreState,
        operation: &'static str,
        err: StoreError,
    ) -> StoreError {
        let message = err.to_string();
        if err.is_local() {
            warn!(operation, error = %message, "rejected before sending");
        } else {
            warn!(operation, error = %message, "directory request failed");
        }
        state.error = Some(message.clone());
        let _ = self.events.send(StoreEvent::Error(message));
        err
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
