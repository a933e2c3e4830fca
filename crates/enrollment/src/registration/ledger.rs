use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use super::capacity::ProgramCatalog;
use super::domain::{
    EnrollmentStatus, ProgramId, Registrant, RegistrantId, RegistrationCandidate,
};
use super::repository::{RegistrantRepository, RepositoryError};
use super::roster::{ProgramOccupancy, RosterFilter};

/// Result of a registration: admitted immediately or placed on the waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Enrolled,
    /// `position` is a snapshot taken at registration time.
    Waitlisted { position: u32 },
}

/// Committed registration together with the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub outcome: RegistrationOutcome,
    pub registrant: Registrant,
}

/// Committed withdrawal. `promoted` holds the record after its status flip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdrawal {
    pub removed: Registrant,
    pub promoted: Option<Registrant>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{0} is already registered")]
    DuplicateRegistrant(RegistrantId),
    #[error("no registration found for {0}")]
    NotFound(RegistrantId),
    #[error("registrant email is required")]
    MissingIdentity,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Allocates program seats and promotes waitlisted registrants as seats free up.
///
/// `register` and `withdraw` run under a ledger-wide lock so the count-then-write
/// sequence never interleaves with another mutation.
pub struct EnrollmentLedger<R> {
    repository: Arc<R>,
    catalog: ProgramCatalog,
    writes: Mutex<u64>,
}

impl<R> EnrollmentLedger<R>
where
    R: RegistrantRepository + 'static,
{
    /// Builds a ledger over existing storage, resuming the arrival counter after the
    /// highest stored sequence.
    pub fn new(repository: Arc<R>, catalog: ProgramCatalog) -> Result<Self, LedgerError> {
        let next_sequence = repository
            .all()?
            .iter()
            .map(|registrant| registrant.sequence + 1)
            .max()
            .unwrap_or(1);

        Ok(Self {
            repository,
            catalog,
            writes: Mutex::new(next_sequence),
        })
    }

    pub fn catalog(&self) -> &ProgramCatalog {
        &self.catalog
    }

    pub fn register(&self, candidate: RegistrationCandidate) -> Result<Admission, LedgerError> {
        self.register_at(candidate, Utc::now())
    }

    /// Registers with an explicit creation timestamp.
    pub fn register_at(
        &self,
        candidate: RegistrationCandidate,
        registered_at: DateTime<Utc>,
    ) -> Result<Admission, LedgerError> {
        let RegistrationCandidate {
            email,
            program,
            profile,
        } = candidate;

        if email.is_empty() {
            return Err(LedgerError::MissingIdentity);
        }

        let mut next_sequence = self.lock();

        if self.repository.fetch(&email)?.is_some() {
            debug!(%email, "rejected duplicate registration");
            return Err(LedgerError::DuplicateRegistrant(email));
        }

        let capacity = self.catalog.capacity_for(&program).get() as usize;
        let enrolled = self
            .repository
            .count(&program, EnrollmentStatus::Enrolled)?;

        let (status, outcome) = if enrolled < capacity {
            (EnrollmentStatus::Enrolled, RegistrationOutcome::Enrolled)
        } else {
            let waiting = self
                .repository
                .count(&program, EnrollmentStatus::Waitlisted)?;
            let position = u32::try_from(waiting).unwrap_or(u32::MAX).saturating_add(1);
            (
                EnrollmentStatus::Waitlisted,
                RegistrationOutcome::Waitlisted { position },
            )
        };

        let registrant = Registrant {
            email,
            program,
            status,
            profile,
            registered_at,
            sequence: *next_sequence,
            waitlist_position: match outcome {
                RegistrationOutcome::Waitlisted { position } => Some(position),
                RegistrationOutcome::Enrolled => None,
            },
        };

        let key = registrant.email.clone();
        let stored = match self.repository.insert(registrant) {
            Ok(stored) => stored,
            Err(RepositoryError::Conflict) => return Err(LedgerError::DuplicateRegistrant(key)),
            Err(err) => return Err(err.into()),
        };
        *next_sequence += 1;

        info!(
            email = %stored.email,
            program = %stored.program,
            status = stored.status.label(),
            "registration recorded"
        );

        Ok(Admission {
            outcome,
            registrant: stored,
        })
    }

    /// Removes a registrant and, when a seat was freed, promotes the earliest waitlisted
    /// registrant of the same program.
    pub fn withdraw(&self, id: &RegistrantId) -> Result<Withdrawal, LedgerError> {
        let _writes = self.lock();

        let removed = self
            .repository
            .delete(id)?
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;

        if removed.status != EnrollmentStatus::Enrolled {
            info!(email = %removed.email, program = %removed.program, "waitlisted registrant withdrew");
            return Ok(Withdrawal {
                removed,
                promoted: None,
            });
        }

        match self.promote_next(&removed.program) {
            Ok(promoted) => {
                info!(
                    email = %removed.email,
                    program = %removed.program,
                    promoted = promoted.as_ref().map(|r| r.email.as_str()),
                    "enrolled registrant withdrew"
                );
                Ok(Withdrawal { removed, promoted })
            }
            Err(err) => {
                if let Err(restore) = self.repository.insert(removed.clone()) {
                    error!(email = %removed.email, error = %restore, "failed to restore withdrawn registrant");
                }
                Err(err)
            }
        }
    }

    pub fn fetch(&self, id: &RegistrantId) -> Result<Registrant, LedgerError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| LedgerError::NotFound(id.clone()))
    }

    /// Registrants matching the filter, in arrival order.
    pub fn roster(&self, filter: &RosterFilter) -> Result<Vec<Registrant>, LedgerError> {
        let registrants = self.repository.all()?;
        Ok(registrants
            .into_iter()
            .filter(|registrant| filter.matches(registrant))
            .collect())
    }

    /// Seat usage for every catalogued program plus any program present in storage.
    pub fn occupancy(&self) -> Result<Vec<ProgramOccupancy>, LedgerError> {
        let registrants = self.repository.all()?;
        Ok(ProgramOccupancy::tally(&self.catalog, &registrants))
    }

    fn promote_next(&self, program: &ProgramId) -> Result<Option<Registrant>, LedgerError> {
        let capacity = self.catalog.capacity_for(program).get() as usize;
        let enrolled = self
            .repository
            .count(program, EnrollmentStatus::Enrolled)?;
        if enrolled >= capacity {
            return Ok(None);
        }

        let waitlist = self
            .repository
            .list(program, EnrollmentStatus::Waitlisted)?;
        let Some(next) = waitlist.into_iter().min_by_key(Registrant::arrival_key) else {
            return Ok(None);
        };

        let promoted = self
            .repository
            .update_status(&next.email, EnrollmentStatus::Enrolled)?;
        Ok(Some(promoted))
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
