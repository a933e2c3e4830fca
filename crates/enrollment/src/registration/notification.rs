use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{Registrant, RegistrantId};

/// Reason a registrant is being contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    Enrolled,
    Waitlisted { position: u32 },
    Promoted,
}

impl NotificationKind {
    pub fn template(self) -> &'static str {
        match self {
            NotificationKind::Enrolled => "enrollment_confirmed",
            NotificationKind::Waitlisted { .. } => "waitlist_confirmed",
            NotificationKind::Promoted => "waitlist_promoted",
        }
    }
}

/// Message handed to a [`Notifier`] for delivery to the registrant's contact address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub template: String,
    pub recipient: RegistrantId,
    pub params: BTreeMap<String, String>,
}

impl Notification {
    pub fn for_registrant(registrant: &Registrant, kind: NotificationKind) -> Self {
        let profile = &registrant.profile;
        let mut params = BTreeMap::new();
        params.insert("to_name".to_string(), profile.parent_name.clone());
        params.insert("to_email".to_string(), registrant.email.to_string());
        params.insert("student_name".to_string(), profile.student_name.clone());
        params.insert("program".to_string(), registrant.program.to_string());
        params.insert("grade".to_string(), profile.grade.clone());
        params.insert(
            "date".to_string(),
            registrant.registered_at.date_naive().to_string(),
        );
        if let NotificationKind::Waitlisted { position } = kind {
            params.insert("position".to_string(), position.to_string());
        }

        Self {
            kind,
            template: kind.template().to_string(),
            recipient: registrant.email.clone(),
            params,
        }
    }
}

/// Outbound delivery hook (e-mail, SMS, or a test double).
pub trait Notifier: Send + Sync {
    fn deliver(&self, notification: Notification) -> Result<(), NotifierError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("recipient {recipient} rejected: {reason}")]
    Rejected {
        recipient: RegistrantId,
        reason: String,
    },
}

/// Delivery result reported next to a committed ledger mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    pub template: String,
    pub recipient: RegistrantId,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
