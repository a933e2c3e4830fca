use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

use enrollment::registration::{
    EnrollmentStatus, Notification, Notifier, NotifierError, ProgramId, Registrant,
    RegistrantId, RegistrantRepository, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("registrant store lock poisoned".to_string()))
}

fn insert_record(
    records: &mut Vec<Registrant>,
    registrant: Registrant,
) -> Result<Registrant, RepositoryError> {
    if records.iter().any(|record| record.email == registrant.email) {
        return Err(RepositoryError::Conflict);
    }
    records.push(registrant.clone());
    Ok(registrant)
}

fn update_record(
    records: &mut [Registrant],
    id: &RegistrantId,
    status: EnrollmentStatus,
) -> Result<Registrant, RepositoryError> {
    let record = records
        .iter_mut()
        .find(|record| &record.email == id)
        .ok_or(RepositoryError::NotFound)?;
    record.status = status;
    Ok(record.clone())
}

fn delete_record(records: &mut Vec<Registrant>, id: &RegistrantId) -> Option<Registrant> {
    records
        .iter()
        .position(|record| &record.email == id)
        .map(|index| records.remove(index))
}

fn select_records(
    records: &[Registrant],
    program: &ProgramId,
    status: EnrollmentStatus,
) -> Vec<Registrant> {
    let mut matching: Vec<Registrant> = records
        .iter()
        .filter(|record| &record.program == program && record.status == status)
        .cloned()
        .collect();
    matching.sort_by_key(Registrant::arrival_key);
    matching
}

fn sorted_records(records: &[Registrant]) -> Vec<Registrant> {
    let mut all = records.to_vec();
    all.sort_by_key(Registrant::arrival_key);
    all
}

/// Process-local registrant store. Contents vanish on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryRegistrantRepository {
    records: Arc<Mutex<Vec<Registrant>>>,
}

impl RegistrantRepository for InMemoryRegistrantRepository {
    fn insert(&self, registrant: Registrant) -> Result<Registrant, RepositoryError> {
        let mut guard = lock(&self.records)?;
        insert_record(&mut guard, registrant)
    }

    fn fetch(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.iter().find(|record| &record.email == id).cloned())
    }

    fn count(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<usize, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .iter()
            .filter(|record| &record.program == program && record.status == status)
            .count())
    }

    fn list(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<Vec<Registrant>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(select_records(&guard, program, status))
    }

    fn update_status(
        &self,
        id: &RegistrantId,
        status: EnrollmentStatus,
    ) -> Result<Registrant, RepositoryError> {
        let mut guard = lock(&self.records)?;
        update_record(&mut guard, id, status)
    }

    fn delete(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        let mut guard = lock(&self.records)?;
        Ok(delete_record(&mut guard, id))
    }

    fn all(&self) -> Result<Vec<Registrant>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(sorted_records(&guard))
    }
}

/// Registrant store mirrored to a JSON snapshot file.
///
/// Every mutation rewrites the snapshot before it becomes visible; a failed write leaves
/// both the file and the in-memory view untouched.
pub(crate) struct JsonFileRegistrantRepository {
    path: PathBuf,
    records: Mutex<Vec<Registrant>>,
}

impl JsonFileRegistrantRepository {
    pub(crate) fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let records = if path.exists() {
            let raw = fs::read(&path).map_err(|err| unavailable(&path, err))?;
            if raw.iter().all(u8::is_ascii_whitespace) {
                Vec::new()
            } else {
                serde_json::from_slice(&raw).map_err(|err| unavailable(&path, err))?
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<Registrant>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let mut next = guard.clone();
        let value = change(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(value)
    }

    fn persist(&self, records: &[Registrant]) -> Result<(), RepositoryError> {
        let staging = self.path.with_extension("json.tmp");
        let payload =
            serde_json::to_vec_pretty(records).map_err(|err| unavailable(&self.path, err))?;
        fs::write(&staging, payload).map_err(|err| unavailable(&staging, err))?;
        fs::rename(&staging, &self.path).map_err(|err| unavailable(&self.path, err))
    }
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable(format!("{}: {err}", path.display()))
}

impl RegistrantRepository for JsonFileRegistrantRepository {
    fn insert(&self, registrant: Registrant) -> Result<Registrant, RepositoryError> {
        self.mutate(|records| insert_record(records, registrant))
    }

    fn fetch(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.iter().find(|record| &record.email == id).cloned())
    }

    fn count(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<usize, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard
            .iter()
            .filter(|record| &record.program == program && record.status == status)
            .count())
    }

    fn list(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<Vec<Registrant>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(select_records(&guard, program, status))
    }

    fn update_status(
        &self,
        id: &RegistrantId,
        status: EnrollmentStatus,
    ) -> Result<Registrant, RepositoryError> {
        self.mutate(|records| update_record(records, id, status))
    }

    fn delete(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        self.mutate(|records| Ok(delete_record(records, id)))
    }

    fn all(&self) -> Result<Vec<Registrant>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(sorted_records(&guard))
    }
}

/// Notifier that writes dispatched notices to the log.
///
/// The serving default keeps nothing in memory; [`LoggingNotifier::recording`] also
/// retains each notice for the demo listing.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier {
    outbox: Option<Arc<Mutex<Vec<Notification>>>>,
}

impl LoggingNotifier {
    pub(crate) fn recording() -> Self {
        Self {
            outbox: Some(Arc::default()),
        }
    }

    pub(crate) fn events(&self) -> Vec<Notification> {
        self.outbox
            .as_ref()
            .and_then(|outbox| outbox.lock().ok().map(|guard| guard.clone()))
            .unwrap_or_default()
    }
}

impl Notifier for LoggingNotifier {
    fn deliver(&self, notification: Notification) -> Result<(), NotifierError> {
        info!(
            template = %notification.template,
            recipient = %notification.recipient,
            params = ?notification.params,
            "notification dispatched"
        );
        if let Some(outbox) = &self.outbox {
            outbox
                .lock()
                .map_err(|_| NotifierError::Transport("notification outbox poisoned".to_string()))?
                .push(notification);
        }
        Ok(())
    }
}

pub(crate) fn parse_status(raw: &str) -> Result<EnrollmentStatus, String> {
    raw.parse()
}
