use crate::scan::{run_scan, ScanArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use sweepline::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Sweepline Field Service",
    about = "Run the Sweepline field-service API and renewal tooling from the command line",
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
    /// Work with the renewal-notification pipeline
    Renewal {
        #[command(subcommand)]
        command: RenewalCommand,
    },
}

#[derive(Subcommand, Debug)]
enum RenewalCommand {
    /// Dry-run the renewal scan against a CSV export of the jobs table
    Scan(ScanArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the in-memory job store from a CSV export (local runs and demos)
    #[arg(long)]
    pub(crate) jobs_csv: Option<std::path::PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Renewal {
            command: RenewalCommand::Scan(args),
        } => run_scan(args),
    }
}
