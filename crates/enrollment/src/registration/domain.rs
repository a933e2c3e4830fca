use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Contact key (email) identifying a registrant across the whole ledger.
///
/// Keys are trimmed and ASCII-lowercased so `Parent@Example.com` and `parent@example.com`
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RegistrantId(String);

impl RegistrantId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RegistrantId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<RegistrantId> for String {
    fn from(id: RegistrantId) -> Self {
        id.0
    }
}

impl fmt::Display for RegistrantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Selector naming the capacity pool a registrant competes for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ProgramId(String);

impl ProgramId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProgramId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<ProgramId> for String {
    fn from(id: ProgramId) -> Self {
        id.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seat allocation state. Only the ledger moves a registrant between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    Waitlisted,
}

impl EnrollmentStatus {
    pub fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Enrolled => "enrolled",
            EnrollmentStatus::Waitlisted => "waitlisted",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "enrolled" => Ok(Self::Enrolled),
            "waitlisted" => Ok(Self::Waitlisted),
            other => Err(format!("unknown enrollment status '{other}'")),
        }
    }
}

/// Profile fields carried with a registration. The ledger never inspects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub student_name: String,
    pub date_of_birth: NaiveDate,
    pub grade: String,
    pub parent_name: String,
    pub phone: String,
    pub emergency_contact: String,
    pub emergency_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

/// Validated request to take a seat in a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCandidate {
    pub email: RegistrantId,
    pub program: ProgramId,
    pub profile: StudentProfile,
}

/// Ledger record for a single registrant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrant {
    pub email: RegistrantId,
    pub program: ProgramId,
    pub status: EnrollmentStatus,
    pub profile: StudentProfile,
    pub registered_at: DateTime<Utc>,
    /// Ledger-assigned arrival counter; breaks ties between equal timestamps.
    pub sequence: u64,
    /// Position reported when the registrant was waitlisted. Never recalculated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<u32>,
}

impl Registrant {
    /// First-come, first-served ordering used for waitlist promotion.
    pub fn arrival_key(&self) -> (DateTime<Utc>, u64) {
        (self.registered_at, self.sequence)
    }

    pub fn summary(&self) -> RegistrantSummary {
        RegistrantSummary {
            email: self.email.clone(),
            program: self.program.clone(),
            status: self.status,
            student_name: self.profile.student_name.clone(),
            parent_name: self.profile.parent_name.clone(),
            grade: self.profile.grade.clone(),
            registered_at: self.registered_at,
            waitlist_position: match self.status {
                EnrollmentStatus::Waitlisted => self.waitlist_position,
                EnrollmentStatus::Enrolled => None,
            },
        }
    }
}

/// Outward-facing view of a registrant used by API responses and notifications.
///
/// `waitlist_position` is only reported while the registrant is still waiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrantSummary {
    pub email: RegistrantId,
    pub program: ProgramId,
    pub status: EnrollmentStatus,
    pub student_name: String,
    pub parent_name: String,
    pub grade: String,
    pub registered_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waitlist_position: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn identifiers_normalize_when_deserialized() {
        let email: RegistrantId = serde_json::from_str("\"  Parent@Example.COM \"").unwrap();
        assert_eq!(email, RegistrantId::new("parent@example.com"));

        let program: ProgramId = serde_json::from_str("\" Camp \"").unwrap();
        assert_eq!(program.as_str(), "Camp");
        assert_eq!(serde_json::to_string(&program).unwrap(), "\"Camp\"");
    }

    #[test]
    fn summary_hides_position_once_enrolled() {
        let mut registrant = Registrant {
            email: RegistrantId::new("a@x.org"),
            program: ProgramId::new("Camp"),
            status: EnrollmentStatus::Waitlisted,
            profile: StudentProfile {
                student_name: "Avery Quinn".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(2012, 5, 14).unwrap(),
                grade: "7th Grade".to_string(),
                parent_name: "Morgan Quinn".to_string(),
                phone: "555-0100".to_string(),
                emergency_contact: "Jordan Lee".to_string(),
                emergency_phone: "555-0199".to_string(),
                additional_notes: None,
            },
            registered_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().unwrap(),
            sequence: 1,
            waitlist_position: Some(2),
        };
        assert_eq!(registrant.summary().waitlist_position, Some(2));

        registrant.status = EnrollmentStatus::Enrolled;
        assert_eq!(registrant.summary().waitlist_position, None);
        assert_eq!(registrant.waitlist_position, Some(2));
    }
}
