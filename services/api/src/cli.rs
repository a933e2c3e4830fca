use crate::demo::{run_demo, run_roster, DemoArgs, RosterArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use enrollment::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Enrollment Ledger",
    about = "Register students, manage waitlists, and serve the enrollment API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk through a register, waitlist, and withdraw sequence in-process
    Demo(DemoArgs),
    /// Print the roster held in a ledger snapshot
    Roster(RosterArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Roster(args) => run_roster(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enrollment::registration::EnrollmentStatus;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["enrollment-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn roster_accepts_status_filter() {
        let cli = Cli::try_parse_from([
            "enrollment-api",
            "roster",
            "--status",
            "waitlisted",
            "--program",
            "Camp",
            "--csv",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Roster(args)) => {
                assert_eq!(args.status, Some(EnrollmentStatus::Waitlisted));
                assert_eq!(args.program.as_deref(), Some("Camp"));
                assert!(args.csv);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
