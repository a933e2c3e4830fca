//! Program registration: seat allocation, waitlist promotion, and the surrounding
//! intake, notification, and roster plumbing.

pub mod capacity;
pub mod domain;
pub mod intake;
pub mod ledger;
pub mod notification;
pub mod repository;
pub mod roster;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use capacity::ProgramCatalog;
pub use domain::{
    EnrollmentStatus, ProgramId, Registrant, RegistrantId, RegistrantSummary,
    RegistrationCandidate, StudentProfile,
};
pub use intake::{IntakeGuard, IntakeViolation, RegistrationForm};
pub use ledger::{Admission, EnrollmentLedger, LedgerError, RegistrationOutcome, Withdrawal};
pub use notification::{
    Notification, NotificationKind, NotificationReport, Notifier, NotifierError,
};
pub use repository::{RegistrantRepository, RepositoryError};
pub use roster::{write_roster_csv, ProgramOccupancy, RosterExportError, RosterFilter};
pub use router::registration_router;
pub use service::{
    RegistrationReceipt, RegistrationService, RegistrationServiceError, WithdrawalReceipt,
};
