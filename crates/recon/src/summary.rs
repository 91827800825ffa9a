use crate::model::{Divergence, ReconSummary, ReconciledRecord};

/// Compute summary statistics from reconciled records.
pub fn compute_summary(records: &[ReconciledRecord], robot_only: usize) -> ReconSummary {
    let mut summary = ReconSummary {
        total_items: records.len(),
        robot_only,
        ..ReconSummary::default()
    };

    for r in records {
        match r.status {
            Divergence::None => summary.matched += 1,
            Divergence::Excess => summary.excess += 1,
            Divergence::OutsideRobot(diff) => {
                summary.outside_robot += 1;
                summary.outside_robot_units += u64::from(diff);
            }
        }
        if r.expiry_agrees() == Some(false) {
            summary.expiry_mismatches += 1;
        }
    }
    summary.divergent = summary.excess + summary.outside_robot;

    summary
}
