mod commands;
mod helpers;

use clap::Parser;
use std::path::PathBuf;
use xas_core::XasError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().collect();

    match parse_and_dispatch(args) {
        Ok(code) => code,
        Err(error) => {
            let error = error.as_xas_error();
            eprintln!("{}", error.diagnostic_line());
            if let Some(summary_line) = error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            error.exit_code()
        }
    }
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            let config = helpers::load_config(cli.config.as_deref())?;
            dispatch_parsed(cli.command, &config)
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
#[command(
    name = "xastools",
    version,
    about = "Accumulate, calibrate, normalize and export XAS scans"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON processing profile with calibration, export and accumulation defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Summarize the channels, scans and metadata of the combined inputs
    Info(commands::InfoArgs),
    /// Align the reference peak of every scan to an edge energy
    Calibrate(commands::CalibrateArgs),
    /// Average the included scans and write one processed file
    Export(commands::ExportArgs),
    /// Print normalized detector curves as a whitespace table
    Normalize(commands::NormalizeArgs),
}

fn dispatch_parsed(
    command: CliCommand,
    config: &xas_core::common::config::ProcessingConfig,
) -> Result<i32, CliError> {
    match command {
        CliCommand::Info(args) => commands::run_info_command(args, config),
        CliCommand::Calibrate(args) => commands::run_calibrate_command(args, config),
        CliCommand::Export(args) => commands::run_export_command(args, config),
        CliCommand::Normalize(args) => commands::run_normalize_command(args, config),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(#[from] XasError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_xas_error(&self) -> XasError {
        match self {
            Self::Usage(message) => XasError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => XasError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, parse_and_dispatch};
    use xas_core::XasError;

    #[test]
    fn usage_errors_map_to_input_validation() {
        let error = parse_and_dispatch(vec!["xastools".into(), "frobnicate".into()])
            .expect_err("unknown subcommand");
        let mapped = error.as_xas_error();
        assert_eq!(mapped.placeholder(), "INPUT.CLI_USAGE");
        assert_eq!(mapped.exit_code(), 2);
    }

    #[test]
    fn help_is_not_an_error() {
        let code = parse_and_dispatch(vec!["xastools".into(), "--help".into()]).expect("help");
        assert_eq!(code, 0);
    }

    #[test]
    fn compute_and_internal_errors_keep_their_categories() {
        let compute = CliError::from(XasError::lookup("LOOKUP.CHANNEL", "channel 'I1' is not present"));
        assert_eq!(compute.as_xas_error().exit_code(), 4);

        let internal = CliError::from(anyhow::anyhow!("stdout closed"));
        let mapped = internal.as_xas_error();
        assert_eq!(mapped.placeholder(), "IO.CLI");
        assert_eq!(mapped.exit_code(), 5);
    }
}
