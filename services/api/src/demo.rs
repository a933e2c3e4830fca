use crate::infra::{
    InMemoryRegistrantRepository, JsonFileRegistrantRepository, LoggingNotifier,
};
use clap::Args;
use enrollment::config::AppConfig;
use enrollment::error::AppError;
use enrollment::registration::{
    write_roster_csv, EnrollmentLedger, EnrollmentStatus, ProgramCatalog, ProgramId,
    ProgramOccupancy, RegistrantId, RegistrantSummary, RegistrationForm, RegistrationOutcome,
    RegistrationService, RosterFilter,
};
use std::io;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Program to register the demo students into
    #[arg(long, default_value = "Summer Camp 2025")]
    pub(crate) program: String,
    /// Seats available in the demo program
    #[arg(long, default_value = "1")]
    pub(crate) capacity: NonZeroU32,
    /// Number of students to register before the first one withdraws
    #[arg(long, default_value_t = 3)]
    pub(crate) students: usize,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RosterArgs {
    /// Ledger snapshot to read (defaults to ENROLL_LEDGER_PATH)
    #[arg(long)]
    pub(crate) ledger_path: Option<PathBuf>,
    /// Only list registrants with this status (enrolled or waitlisted)
    #[arg(long, value_parser = crate::infra::parse_status)]
    pub(crate) status: Option<EnrollmentStatus>,
    /// Only list registrants of this program
    #[arg(long)]
    pub(crate) program: Option<String>,
    /// Emit CSV instead of the human-readable listing
    #[arg(long)]
    pub(crate) csv: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        program,
        capacity,
        students,
    } = args;

    let catalog = ProgramCatalog::new(capacity).with_program(ProgramId::new(&program), capacity);
    let repository = Arc::new(InMemoryRegistrantRepository::default());
    let ledger = EnrollmentLedger::new(repository, catalog)?;
    let notifier = Arc::new(LoggingNotifier::recording());
    let service = RegistrationService::new(Arc::new(ledger), notifier.clone());

    println!("Enrollment demo: {program} ({capacity} seat(s))");
    println!("----------------------------------------");

    let mut emails = Vec::with_capacity(students);
    for index in 1..=students {
        let form = demo_form(index, &program);
        emails.push(form.email.clone());
        let receipt = service.submit(form)?;
        let outcome = match receipt.outcome {
            RegistrationOutcome::Enrolled => "enrolled".to_string(),
            RegistrationOutcome::Waitlisted { position } => {
                format!("waitlisted (position {position})")
            }
        };
        println!(
            "register  {:<24} {outcome}",
            receipt.registrant.email.as_str()
        );
    }

    if let Some(first) = emails.first() {
        let receipt = service.withdraw(&RegistrantId::new(first))?;
        match &receipt.promoted {
            Some(promoted) => println!(
                "withdraw  {:<24} promoted {}",
                receipt.removed.as_str(),
                promoted.email.as_str()
            ),
            None => println!(
                "withdraw  {:<24} no one waiting",
                receipt.removed.as_str()
            ),
        }
    }

    println!();
    print_occupancy(&service.occupancy()?);

    println!();
    println!("Notifications dispatched:");
    for event in notifier.events() {
        println!("  - {} -> {}", event.template, event.recipient);
    }

    Ok(())
}

pub(crate) fn run_roster(args: RosterArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let path = args
        .ledger_path
        .or(config.enrollment.ledger_path)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                "no ledger snapshot configured; pass --ledger-path or set ENROLL_LEDGER_PATH",
            )
        })?;

    let repository = Arc::new(JsonFileRegistrantRepository::open(&path)?);
    let ledger = EnrollmentLedger::new(repository, config.enrollment.catalog)?;
    let filter = RosterFilter {
        status: args.status,
        program: args.program.map(ProgramId::new),
    };
    let roster: Vec<RegistrantSummary> = ledger
        .roster(&filter)?
        .iter()
        .map(|registrant| registrant.summary())
        .collect();

    if args.csv {
        write_roster_csv(io::stdout().lock(), &roster)?;
        return Ok(());
    }

    println!("Roster from {}", path.display());
    if roster.is_empty() {
        println!("  (no registrants)");
    }
    for entry in &roster {
        let position = entry
            .waitlist_position
            .map(|position| format!(" #{position}"))
            .unwrap_or_default();
        println!(
            "  {:<28} {:<20} {:<18} {}{position}",
            entry.email.as_str(),
            entry.student_name,
            entry.program.as_str(),
            entry.status.label()
        );
    }

    println!();
    print_occupancy(&ledger.occupancy()?);
    Ok(())
}

fn print_occupancy(programs: &[ProgramOccupancy]) {
    println!("Occupancy:");
    for program in programs {
        let marker = if program.is_full() { " (full)" } else { "" };
        println!(
            "  {}: {}/{} enrolled, {} waitlisted{marker}",
            program.program, program.enrolled, program.capacity, program.waitlisted
        );
    }
}

fn demo_form(index: usize, program: &str) -> RegistrationForm {
    RegistrationForm {
        student_name: format!("Student {index}"),
        date_of_birth: "2012-06-15".to_string(),
        grade: "7th Grade".to_string(),
        parent_name: format!("Parent {index}"),
        email: format!("family{index}@example.com"),
        phone: "555-0100".to_string(),
        program: program.to_string(),
        emergency_contact: format!("Contact {index}"),
        emergency_phone: "555-0199".to_string(),
        additional_notes: None,
    }
}
