use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::registration::capacity::ProgramCatalog;
use crate::registration::domain::{
    EnrollmentStatus, ProgramId, Registrant, RegistrantId, RegistrationCandidate,
    StudentProfile,
};
use crate::registration::intake::RegistrationForm;
use crate::registration::ledger::EnrollmentLedger;
use crate::registration::notification::{Notification, Notifier, NotifierError};
use crate::registration::repository::{RegistrantRepository, RepositoryError};
use crate::registration::service::RegistrationService;

pub(super) const CAMP: &str = "Camp";

pub(super) fn seats(value: u32) -> NonZeroU32 {
    NonZeroU32::new(value).expect("non-zero capacity")
}

pub(super) fn catalog(capacity: u32) -> ProgramCatalog {
    ProgramCatalog::new(seats(capacity)).with_program(ProgramId::new(CAMP), seats(capacity))
}

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn minutes(offset: i64) -> DateTime<Utc> {
    base_time() + Duration::minutes(offset)
}

pub(super) fn profile(student_name: &str) -> StudentProfile {
    StudentProfile {
        student_name: student_name.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(2012, 5, 14).expect("valid date"),
        grade: "7th Grade".to_string(),
        parent_name: format!("Parent of {student_name}"),
        phone: "555-0100".to_string(),
        emergency_contact: "Jordan Lee".to_string(),
        emergency_phone: "555-0199".to_string(),
        additional_notes: None,
    }
}

pub(super) fn candidate(email: &str, program: &str) -> RegistrationCandidate {
    RegistrationCandidate {
        email: RegistrantId::new(email),
        program: ProgramId::new(program),
        profile: profile(email.split('@').next().unwrap_or(email)),
    }
}

pub(super) fn form(email: &str) -> RegistrationForm {
    RegistrationForm {
        student_name: "Avery Quinn".to_string(),
        date_of_birth: "2012-05-14".to_string(),
        grade: "7th Grade".to_string(),
        parent_name: "Morgan Quinn".to_string(),
        email: email.to_string(),
        phone: "555-0100".to_string(),
        program: CAMP.to_string(),
        emergency_contact: "Jordan Lee".to_string(),
        emergency_phone: "555-0199".to_string(),
        additional_notes: Some("  Peanut allergy  ".to_string()),
    }
}

pub(super) fn ledger(capacity: u32) -> (EnrollmentLedger<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let ledger =
        EnrollmentLedger::new(repository.clone(), catalog(capacity)).expect("ledger builds");
    (ledger, repository)
}

pub(super) fn build_service(
    capacity: u32,
) -> (
    RegistrationService<MemoryRepository, MemoryNotifier>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifier>,
) {
    let (ledger, repository) = ledger(capacity);
    let notifier = Arc::new(MemoryNotifier::default());
    let service = RegistrationService::new(Arc::new(ledger), notifier.clone());
    (service, repository, notifier)
}

pub(super) fn statuses(repository: &MemoryRepository) -> Vec<(String, EnrollmentStatus)> {
    repository
        .all()
        .expect("list succeeds")
        .into_iter()
        .map(|registrant| (registrant.email.to_string(), registrant.status))
        .collect()
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<Vec<Registrant>>>,
}

impl RegistrantRepository for MemoryRepository {
    fn insert(&self, registrant: Registrant) -> Result<Registrant, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|record| record.email == registrant.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(registrant.clone());
        Ok(registrant)
    }

    fn fetch(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().find(|record| &record.email == id).cloned())
    }

    fn count(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<usize, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
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
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut matching: Vec<Registrant> = guard
            .iter()
            .filter(|record| &record.program == program && record.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(Registrant::arrival_key);
        Ok(matching)
    }

    fn update_status(
        &self,
        id: &RegistrantId,
        status: EnrollmentStatus,
    ) -> Result<Registrant, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard
            .iter_mut()
            .find(|record| &record.email == id)
            .ok_or(RepositoryError::NotFound)?;
        record.status = status;
        Ok(record.clone())
    }

    fn delete(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let position = guard.iter().position(|record| &record.email == id);
        Ok(position.map(|index| guard.remove(index)))
    }

    fn all(&self) -> Result<Vec<Registrant>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records = guard.clone();
        records.sort_by_key(Registrant::arrival_key);
        Ok(records)
    }
}

/// Memory store whose status updates fail, used to exercise withdrawal rollback.
#[derive(Default, Clone)]
pub(super) struct StuckPromotionRepository {
    pub(super) inner: MemoryRepository,
}

impl RegistrantRepository for StuckPromotionRepository {
    fn insert(&self, registrant: Registrant) -> Result<Registrant, RepositoryError> {
        self.inner.insert(registrant)
    }

    fn fetch(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn count(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<usize, RepositoryError> {
        self.inner.count(program, status)
    }

    fn list(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<Vec<Registrant>, RepositoryError> {
        self.inner.list(program, status)
    }

    fn update_status(
        &self,
        _id: &RegistrantId,
        _status: EnrollmentStatus,
    ) -> Result<Registrant, RepositoryError> {
        Err(RepositoryError::Unavailable("write timeout".to_string()))
    }

    fn delete(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        self.inner.delete(id)
    }

    fn all(&self) -> Result<Vec<Registrant>, RepositoryError> {
        self.inner.all()
    }
}

pub(super) struct UnavailableRepository;

impl RegistrantRepository for UnavailableRepository {
    fn insert(&self, _registrant: Registrant) -> Result<Registrant, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        Ok(None)
    }

    fn count(
        &self,
        _program: &ProgramId,
        _status: EnrollmentStatus,
    ) -> Result<usize, RepositoryError> {
        Ok(0)
    }

    fn list(
        &self,
        _program: &ProgramId,
        _status: EnrollmentStatus,
    ) -> Result<Vec<Registrant>, RepositoryError> {
        Ok(Vec::new())
    }

    fn update_status(
        &self,
        _id: &RegistrantId,
        _status: EnrollmentStatus,
    ) -> Result<Registrant, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn all(&self) -> Result<Vec<Registrant>, RepositoryError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn fail_deliveries(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Notifier for MemoryNotifier {
    fn deliver(&self, notification: Notification) -> Result<(), NotifierError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifierError::Transport("smtp relay refused".to_string()));
        }
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
