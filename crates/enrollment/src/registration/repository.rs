use super::domain::{EnrollmentStatus, ProgramId, Registrant, RegistrantId};

/// Storage abstraction backing the enrollment ledger.
///
/// Implementations only need to honor the access patterns below; the ledger serializes
/// every mutation, so stores do not coordinate writers themselves.
pub trait RegistrantRepository: Send + Sync {
    /// Stores a new record. Fails with [`RepositoryError::Conflict`] when the key exists.
    fn insert(&self, registrant: Registrant) -> Result<Registrant, RepositoryError>;
    fn fetch(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError>;
    fn count(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<usize, RepositoryError>;
    /// Records in the program with the given status, earliest arrival first.
    fn list(
        &self,
        program: &ProgramId,
        status: EnrollmentStatus,
    ) -> Result<Vec<Registrant>, RepositoryError>;
    fn update_status(
        &self,
        id: &RegistrantId,
        status: EnrollmentStatus,
    ) -> Result<Registrant, RepositoryError>;
    /// Removes the record, returning it when present.
    fn delete(&self, id: &RegistrantId) -> Result<Option<Registrant>, RepositoryError>;
    /// Every record in arrival order.
    fn all(&self) -> Result<Vec<Registrant>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
