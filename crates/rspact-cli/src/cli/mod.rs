mod commands;
mod helpers;

use clap::Parser;
use rspact_core::domain::PactError;
use rspact_core::input::GroupRegistry;
use std::path::PathBuf;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let pact_error = error.as_pact_error();
            eprintln!("{}", pact_error.diagnostic_line());
            pact_error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            let registry = helpers::load_registry(cli.groups.as_deref())?;
            dispatch_parsed(cli.command, &registry)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(name = "rspact", version, about = "FISPACT input file builder")]
struct Cli {
    /// Group structure table (JSON, or count-prefixed text blocks) replacing the built-in one
    #[arg(long, global = true, value_name = "path")]
    groups: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Build or inspect a fluxes file
    #[command(subcommand)]
    Fluxes(FluxesCommand),
    /// Write a files manifest pointing at nuclear data
    Files(commands::FilesArgs),
    /// List the registered group structures
    Groups,
}

#[derive(clap::Subcommand)]
enum FluxesCommand {
    /// Create a fluxes file from energy=value pairs
    Create(commands::FluxesCreateArgs),
    /// Read, validate and summarise a fluxes file
    Inspect(commands::FluxesInspectArgs),
}

fn dispatch_parsed(command: CliCommand, registry: &GroupRegistry) -> Result<i32, CliError> {
    match command {
        CliCommand::Fluxes(FluxesCommand::Create(args)) => {
            commands::run_fluxes_create_command(args, registry)
        }
        CliCommand::Fluxes(FluxesCommand::Inspect(args)) => {
            commands::run_fluxes_inspect_command(args, registry)
        }
        CliCommand::Files(args) => commands::run_files_command(args),
        CliCommand::Groups => commands::run_groups_command(registry),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Pact(#[from] PactError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_pact_error(&self) -> PactError {
        match self {
            Self::Usage(message) => PactError::out_of_range("INPUT.CLI_USAGE", message.clone()),
            Self::Pact(error) => error.clone(),
            Self::Internal(error) => PactError::io("IO.CLI", format!("{error:#}")),
        }
    }
}
