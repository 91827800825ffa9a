//! `stockcheck run | extract | aggregate`.

use std::io::Write;
use std::path::{Path, PathBuf};

use stockcheck_recon::aggregate::aggregate;
use stockcheck_recon::config::{DateMode, RobotOnlyPolicy};
use stockcheck_recon::extract::extract;
use stockcheck_recon::{LineClassifier, ReconConfig, ReconInput, ReconResult};

use crate::exit_codes::{EXIT_DIVERGENCES, EXIT_INVALID_CONFIG};
use crate::{export, source, CliError};

pub struct RunArgs {
    pub control: PathBuf,
    pub robot: PathBuf,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub out: Option<PathBuf>,
    pub strict_dates: bool,
    pub show_robot_only: bool,
    pub quiet: bool,
}

/// Defaults when no file is given.
fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| CliError {
        code: EXIT_INVALID_CONFIG,
        message: format!("cannot read config {}: {}", path.display(), e),
        hint: None,
    })?;
    ReconConfig::from_toml(&text).map_err(|e| {
        CliError::recon(e).with_hint(format!("check {}", path.display()))
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    println!("{json}");
    Ok(())
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let mut config = load_config(args.config.as_deref())?;
    if args.strict_dates {
        config.robot.dates = DateMode::Strict;
    }
    if args.show_robot_only {
        config.join.robot_only = RobotOnlyPolicy::Report;
    }

    // Fail on a bad --out before doing any work
    if let Some(ref out) = args.out {
        export::ExportFormat::from_path(out)?;
    }

    let input = ReconInput {
        document: source::load_control(&args.control)?,
        robot_export: source::load_robot(&args.robot)?,
    };

    let result = stockcheck_recon::run(&config, &input)?;

    if let Some(ref out) = args.out {
        export::write_result(&result, out)?;
        if !args.quiet {
            eprintln!("wrote {}", out.display());
        }
    }

    if args.json {
        print_json(&result)?;
    }

    if !args.quiet {
        print_summary(&result);
    }

    if result.summary.divergent > 0 {
        return Err(CliError {
            code: EXIT_DIVERGENCES,
            message: String::new(),
            hint: None,
        });
    }
    Ok(())
}

/// Human summary to stderr.
fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "{} items: {} matched, {} divergent ({} stock em excesso, {} fora do robot / {} emb)",
        s.total_items, s.matched, s.divergent, s.excess, s.outside_robot, s.outside_robot_units,
    );
    if s.expiry_mismatches > 0 {
        eprintln!("{} item(s) with a different earliest expiry on the robot", s.expiry_mismatches);
    }
    if result.meta.robot_rows_discarded > 0 {
        eprintln!(
            "{} robot row(s) skipped (empty code or unparseable date)",
            result.meta.robot_rows_discarded
        );
    }
    if !result.robot_only.is_empty() {
        eprintln!("{} robot code(s) not on the control list:", result.robot_only.len());
        for r in &result.robot_only {
            eprintln!("  {}  {} emb  {}", r.code, r.unit_count, r.earliest_expiry());
        }
    }
    if s.total_items == 0 {
        eprintln!("no control records found");
    }
}

// ---------------------------------------------------------------------------
// extract / aggregate
// ---------------------------------------------------------------------------

pub fn cmd_extract(control: PathBuf, config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let classifier = LineClassifier::new(&config.extract)?;
    let document = source::load_control(&control)?;
    let records = extract(&document, &classifier);

    if json {
        return print_json(&records);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for r in &records {
        writeln!(out, "{}\t{}\t{}\t{}\t{}", r.order, r.code, r.stock, r.expiry, r.description)
            .map_err(|e| CliError::io(e.to_string()))?;
    }
    eprintln!("{} control records", records.len());
    Ok(())
}

pub fn cmd_aggregate(robot: PathBuf, config: Option<PathBuf>, json: bool) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let bytes = source::load_robot(&robot)?;
    let output = aggregate(&bytes, &config.robot)?;

    if json {
        return print_json(&output.summaries);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for s in &output.summaries {
        writeln!(out, "{}\t{}\t{}", s.code, s.unit_count, s.earliest_expiry())
            .map_err(|e| CliError::io(e.to_string()))?;
    }
    eprintln!(
        "{} codes from {} rows ({} skipped)",
        output.summaries.len(),
        output.rows_read,
        output.rows_discarded
    );
    Ok(())
}
