use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::capacity::ProgramCatalog;
use super::domain::{ProgramId, RegistrantId, RegistrationCandidate, StudentProfile};

/// Raw registration form as submitted by a parent or guardian.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub student_name: String,
    pub date_of_birth: String,
    pub grade: String,
    pub parent_name: String,
    pub email: String,
    pub phone: String,
    pub program: String,
    pub emergency_contact: String,
    pub emergency_phone: String,
    pub additional_notes: Option<String>,
}

/// Validation errors raised before a form reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("date of birth '{0}' must be a past date formatted YYYY-MM-DD")]
    InvalidDateOfBirth(String),
    #[error("program '{0}' is not offered")]
    UnknownProgram(String),
}

/// Converts raw forms into ledger candidates.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    catalog: ProgramCatalog,
}

impl IntakeGuard {
    pub fn new(catalog: ProgramCatalog) -> Self {
        Self { catalog }
    }

    pub fn candidate_from_form(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationCandidate, IntakeViolation> {
        self.candidate_from_form_on(form, Utc::now().date_naive())
    }

    /// Same as [`candidate_from_form`](Self::candidate_from_form) with an explicit
    /// evaluation date for the date-of-birth check.
    pub fn candidate_from_form_on(
        &self,
        form: RegistrationForm,
        today: NaiveDate,
    ) -> Result<RegistrationCandidate, IntakeViolation> {
        let RegistrationForm {
            student_name,
            date_of_birth,
            grade,
            parent_name,
            email,
            phone,
            program,
            emergency_contact,
            emergency_phone,
            additional_notes,
        } = form;

        let student_name = required("student name", student_name)?;
        let date_of_birth = required("date of birth", date_of_birth)?;
        let grade = required("grade", grade)?;
        let parent_name = required("parent name", parent_name)?;
        let email = required("email", email)?;
        let phone = required("phone", phone)?;
        let program = required("program", program)?;
        let emergency_contact = required("emergency contact", emergency_contact)?;
        let emergency_phone = required("emergency phone", emergency_phone)?;

        if !looks_like_email(&email) {
            return Err(IntakeViolation::InvalidEmail(email));
        }

        let date_of_birth = match NaiveDate::parse_from_str(&date_of_birth, "%Y-%m-%d") {
            Ok(date) if date <= today => date,
            _ => return Err(IntakeViolation::InvalidDateOfBirth(date_of_birth)),
        };

        let program_id = ProgramId::new(&program);
        if !self.catalog.offers(&program_id) {
            return Err(IntakeViolation::UnknownProgram(program));
        }

        let additional_notes = additional_notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty());

        Ok(RegistrationCandidate {
            email: RegistrantId::new(&email),
            program: program_id,
            profile: StudentProfile {
                student_name,
                date_of_birth,
                grade,
                parent_name,
                phone,
                emergency_contact,
                emergency_phone,
                additional_notes,
            },
        })
    }
}

fn required(field: &'static str, value: String) -> Result<String, IntakeViolation> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(IntakeViolation::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
