use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::domain::{
    EnrollmentStatus, Registrant, RegistrantId, RegistrantSummary, RegistrationCandidate,
};
use super::intake::{IntakeGuard, IntakeViolation, RegistrationForm};
use super::ledger::{EnrollmentLedger, LedgerError, RegistrationOutcome};
use super::notification::{Notification, NotificationKind, NotificationReport, Notifier};
use super::repository::RegistrantRepository;
use super::roster::{ProgramOccupancy, RosterFilter};

/// Service composing intake validation, the enrollment ledger, and outbound notices.
///
/// Notifications go out after the ledger has committed; delivery failures are reported
/// on the receipt and never undo the allocation.
pub struct RegistrationService<R, N> {
    intake: IntakeGuard,
    ledger: Arc<EnrollmentLedger<R>>,
    notifier: Arc<N>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReceipt {
    #[serde(flatten)]
    pub outcome: RegistrationOutcome,
    pub registrant: RegistrantSummary,
    pub notification: NotificationReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawalReceipt {
    pub removed: RegistrantId,
    pub promoted: Option<RegistrantSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationReport>,
}

impl<R, N> RegistrationService<R, N>
where
    R: RegistrantRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(ledger: Arc<EnrollmentLedger<R>>, notifier: Arc<N>) -> Self {
        let intake = IntakeGuard::new(ledger.catalog().clone());
        Self {
            intake,
            ledger,
            notifier,
        }
    }

    pub fn ledger(&self) -> &EnrollmentLedger<R> {
        &self.ledger
    }

    /// Validate a raw form and register the resulting candidate.
    pub fn submit(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationReceipt, RegistrationServiceError> {
        let candidate = self.intake.candidate_from_form(form)?;
        self.register(candidate)
    }

    pub fn register(
        &self,
        candidate: RegistrationCandidate,
    ) -> Result<RegistrationReceipt, RegistrationServiceError> {
        let admission = self.ledger.register(candidate)?;

        let kind = match admission.outcome {
            RegistrationOutcome::Enrolled => NotificationKind::Enrolled,
            RegistrationOutcome::Waitlisted { position } => {
                NotificationKind::Waitlisted { position }
            }
        };
        let notification = self.notify(&admission.registrant, kind);

        Ok(RegistrationReceipt {
            outcome: admission.outcome,
            registrant: admission.registrant.summary(),
            notification,
        })
    }

    pub fn withdraw(
        &self,
        id: &RegistrantId,
    ) -> Result<WithdrawalReceipt, RegistrationServiceError> {
        let withdrawal = self.ledger.withdraw(id)?;

        let notification = withdrawal
            .promoted
            .as_ref()
            .map(|promoted| self.notify(promoted, NotificationKind::Promoted));

        Ok(WithdrawalReceipt {
            removed: withdrawal.removed.email,
            promoted: withdrawal.promoted.as_ref().map(Registrant::summary),
            notification,
        })
    }

    /// Re-sends the notice matching the registrant's current status. The ledger is not
    /// touched.
    pub fn resend_notification(
        &self,
        id: &RegistrantId,
    ) -> Result<NotificationReport, RegistrationServiceError> {
        let registrant = self.ledger.fetch(id)?;
        let kind = match (registrant.status, registrant.waitlist_position) {
            (EnrollmentStatus::Waitlisted, position) => NotificationKind::Waitlisted {
                position: position.unwrap_or(1),
            },
            (EnrollmentStatus::Enrolled, Some(_)) => NotificationKind::Promoted,
            (EnrollmentStatus::Enrolled, None) => NotificationKind::Enrolled,
        };
        Ok(self.notify(&registrant, kind))
    }

    pub fn get(&self, id: &RegistrantId) -> Result<Registrant, RegistrationServiceError> {
        Ok(self.ledger.fetch(id)?)
    }

    pub fn roster(
        &self,
        filter: &RosterFilter,
    ) -> Result<Vec<RegistrantSummary>, RegistrationServiceError> {
        let registrants = self.ledger.roster(filter)?;
        Ok(registrants.iter().map(Registrant::summary).collect())
    }

    pub fn occupancy(&self) -> Result<Vec<ProgramOccupancy>, RegistrationServiceError> {
        Ok(self.ledger.occupancy()?)
    }

    fn notify(&self, registrant: &Registrant, kind: NotificationKind) -> NotificationReport {
        let notification = Notification::for_registrant(registrant, kind);
        let template = notification.template.clone();
        let recipient = notification.recipient.clone();

        match self.notifier.deliver(notification) {
            Ok(()) => NotificationReport {
                template,
                recipient,
                delivered: true,
                error: None,
            },
            Err(err) => {
                warn!(%recipient, template = %template, error = %err, "notification delivery failed");
                NotificationReport {
                    template,
                    recipient,
                    delivered: false,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
