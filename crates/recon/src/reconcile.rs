use std::collections::{HashMap, HashSet};

use crate::model::{ControlRecord, Divergence, ReconciledRecord, RobotSummary};

/// Left-join control records on robot summaries by exact (trimmed) code.
///
/// Every control record yields exactly one output row. A code missing from
/// the robot export reads as 0 units with no expiry. Output is sorted by
/// `order`; equal orders keep document order.
pub fn reconcile(controls: &[ControlRecord], robot: &[RobotSummary]) -> Vec<ReconciledRecord> {
    let by_code: HashMap<&str, &RobotSummary> =
        robot.iter().map(|s| (s.code.trim(), s)).collect();

    let mut out: Vec<ReconciledRecord> = controls
        .iter()
        .map(|control| {
            let matched = by_code.get(control.code.trim()).copied();
            let robot_count = matched
                .map(|s| u32::try_from(s.unit_count).unwrap_or(u32::MAX))
                .unwrap_or(0);
            let robot_expiry = matched.map(RobotSummary::earliest_expiry).unwrap_or_default();

            ReconciledRecord {
                order: control.order,
                code: control.code.trim().to_string(),
                description: control.description.clone(),
                stock: control.stock,
                robot_count,
                expiry: control.expiry.clone(),
                robot_expiry,
                status: Divergence::between(control.stock, robot_count),
            }
        })
        .collect();

    out.sort_by_key(|r| r.order);
    out
}

/// Robot summaries whose code appears on no control record, sorted by code.
pub fn robot_only(controls: &[ControlRecord], robot: &[RobotSummary]) -> Vec<RobotSummary> {
    let known: HashSet<&str> = controls.iter().map(|c| c.code.trim()).collect();
    let mut out: Vec<RobotSummary> = robot
        .iter()
        .filter(|s| !known.contains(s.code.trim()))
        .cloned()
        .collect();
    out.sort_by(|a, b| a.code.cmp(&b.code));
    out
}
