// stockcheck CLI - control list (Sifarma) vs dispensing robot stock check

mod commands;
mod exit_codes;
mod export;
mod source;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stockcheck_recon::ReconError;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "stockcheck")]
#[command(about = "Reconcile a control-list document against a robot inventory export")]
#[command(version, long_version = long_version())]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the control list against the robot export
    #[command(after_help = "\
Examples:
  stockcheck run --control '01 robot.pdf' --robot stock.csv
  stockcheck run --control lista.txt --robot stock.csv --json
  stockcheck run --control lista.pdf --robot stock.csv --out analise.xlsx
  stockcheck run --control lista.pdf --robot stock.csv --config stockcheck.toml --show-robot-only")]
    Run {
        /// Control document (.pdf via pdftotext, anything else as text)
        #[arg(long)]
        control: PathBuf,

        /// Robot inventory export (semicolon-delimited)
        #[arg(long)]
        robot: PathBuf,

        /// TOML config file
        #[arg(long, env = "STOCKCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Print the full result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Export result (.csv, .json or .xlsx)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,

        /// Fail on robot rows with unparseable dates instead of dropping them
        #[arg(long)]
        strict_dates: bool,

        /// Also report robot codes missing from the control list
        #[arg(long)]
        show_robot_only: bool,

        /// Suppress the summary on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Print the records extracted from a control document
    #[command(after_help = "\
Examples:
  stockcheck extract --control lista.pdf
  stockcheck extract --control lista.txt --json")]
    Extract {
        #[arg(long)]
        control: PathBuf,

        #[arg(long, env = "STOCKCHECK_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Print the per-code summary of a robot export
    #[command(after_help = "\
Examples:
  stockcheck aggregate --robot stock.csv
  stockcheck aggregate --robot stock.csv --json")]
    Aggregate {
        #[arg(long)]
        robot: PathBuf,

        #[arg(long, env = "STOCKCHECK_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .init();
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  stockcheck-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  stockcheck-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            control,
            robot,
            config,
            json,
            out,
            strict_dates,
            show_robot_only,
            quiet,
        } => commands::cmd_run(commands::RunArgs {
            control,
            robot,
            config,
            json,
            out,
            strict_dates,
            show_robot_only,
            quiet,
        }),
        Commands::Extract { control, config, json } => commands::cmd_extract(control, config, json),
        Commands::Aggregate { robot, config, json } => commands::cmd_aggregate(robot, config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Create error from an engine error with the matching exit code.
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::SchemaResolution { .. } => {
                Some("expected a ';'-delimited export with barcode and expiry columns".into())
            }
            ReconError::RowParse { .. } => {
                Some("drop --strict-dates to skip rows with unparseable dates".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        Self::recon(err)
    }
}
