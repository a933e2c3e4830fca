use std::collections::BTreeMap;
use std::io;

use serde::{Deserialize, Serialize};

use super::capacity::ProgramCatalog;
use super::domain::{EnrollmentStatus, ProgramId, Registrant, RegistrantSummary};

/// Optional status/program filters applied to roster listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RosterFilter {
    #[serde(default)]
    pub status: Option<EnrollmentStatus>,
    #[serde(default)]
    pub program: Option<ProgramId>,
}

impl RosterFilter {
    pub fn matches(&self, registrant: &Registrant) -> bool {
        let status_match = self
            .status
            .map_or(true, |status| registrant.status == status);
        let program_match = self
            .program
            .as_ref()
            .map_or(true, |program| &registrant.program == program);
        status_match && program_match
    }
}

/// Seat usage for a single program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramOccupancy {
    pub program: ProgramId,
    pub capacity: u32,
    pub enrolled: u32,
    pub waitlisted: u32,
    pub seats_available: u32,
}

impl ProgramOccupancy {
    pub fn is_full(&self) -> bool {
        self.seats_available == 0
    }

    pub(crate) fn tally(catalog: &ProgramCatalog, registrants: &[Registrant]) -> Vec<Self> {
        let mut counts: BTreeMap<ProgramId, (u32, u32)> = catalog
            .programs()
            .map(|(program, _)| (program.clone(), (0, 0)))
            .collect();

        for registrant in registrants {
            let entry = counts.entry(registrant.program.clone()).or_default();
            match registrant.status {
                EnrollmentStatus::Enrolled => entry.0 += 1,
                EnrollmentStatus::Waitlisted => entry.1 += 1,
            }
        }

        counts
            .into_iter()
            .map(|(program, (enrolled, waitlisted))| {
                let capacity = catalog.capacity_for(&program).get();
                Self {
                    program,
                    capacity,
                    enrolled,
                    waitlisted,
                    seats_available: capacity.saturating_sub(enrolled),
                }
            })
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RosterExportError {
    #[error("failed to write roster csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush roster csv: {0}")]
    Io(#[from] io::Error),
}

#[derive(Serialize)]
struct RosterRow<'a> {
    email: &'a str,
    student_name: &'a str,
    parent_name: &'a str,
    grade: &'a str,
    program: &'a str,
    status: &'static str,
    registered_at: String,
    waitlist_position: Option<u32>,
}

/// Writes roster summaries as CSV with a header row.
pub fn write_roster_csv<W: io::Write>(
    writer: W,
    registrants: &[RegistrantSummary],
) -> Result<(), RosterExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for summary in registrants {
        csv_writer.serialize(RosterRow {
            email: summary.email.as_str(),
            student_name: &summary.student_name,
            parent_name: &summary.parent_name,
            grade: &summary.grade,
            program: summary.program.as_str(),
            status: summary.status.label(),
            registered_at: summary.registered_at.to_rfc3339(),
            waitlist_position: summary.waitlist_position,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}
