use crate::aggregate::{aggregate, AggregateOutput};
use crate::classify::LineClassifier;
use crate::config::{ReconConfig, RobotOnlyPolicy};
use crate::error::ReconError;
use crate::extract::{extract, Document};
use crate::model::{ControlRecord, ReconMeta, ReconResult};
use crate::reconcile::{reconcile, robot_only};
use crate::summary::compute_summary;

/// Both sources, already read into memory.
pub struct ReconInput {
    /// Control document text, paginated.
    pub document: Document,
    /// Raw robot export bytes (encoding unknown).
    pub robot_export: Vec<u8>,
}

/// Run the full pipeline per config. Returns reconciled records + summary.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    let classifier = LineClassifier::new(&config.extract)?;
    let controls = extract(&input.document, &classifier);
    let robot = aggregate(&input.robot_export, &config.robot)?;
    Ok(run_parts(config, &controls, &robot))
}

/// Join already-extracted and already-aggregated sources.
pub fn run_parts(
    config: &ReconConfig,
    controls: &[ControlRecord],
    robot: &AggregateOutput,
) -> ReconResult {
    let records = reconcile(controls, &robot.summaries);

    let robot_only = match config.join.robot_only {
        RobotOnlyPolicy::Hide => Vec::new(),
        RobotOnlyPolicy::Report => robot_only(controls, &robot.summaries),
    };
    if !robot_only.is_empty() {
        log::info!("{} robot code(s) absent from the control list", robot_only.len());
    }

    let summary = compute_summary(&records, robot_only.len());

    ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            control_records: controls.len(),
            robot_codes: robot.summaries.len(),
            robot_rows_discarded: robot.rows_discarded,
        },
        summary,
        records,
        robot_only,
    }
}
