use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Month-year layout shared by both sources once normalized.
pub const EXPIRY_FORMAT: &str = "%m-%Y";

// ---------------------------------------------------------------------------
// Control list
// ---------------------------------------------------------------------------

/// One item recovered from the control document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlRecord {
    pub order: u32,
    /// Exactly 7 digits. Join key.
    pub code: String,
    pub description: String,
    pub stock: u32,
    /// `MM-YYYY` as printed on the document.
    pub expiry: String,
}

// ---------------------------------------------------------------------------
// Robot export
// ---------------------------------------------------------------------------

/// One scanned unit from the robot export, after code/date normalization.
#[derive(Debug, Clone)]
pub struct RobotRow {
    pub code: String,
    pub expiry_date: NaiveDate,
}

/// Per-code summary of robot rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RobotSummary {
    pub code: String,
    pub unit_count: usize,
    #[serde(rename = "earliest_expiry", serialize_with = "serialize_month_year")]
    pub earliest_date: NaiveDate,
}

impl RobotSummary {
    /// Earliest expiry truncated to `MM-YYYY`.
    pub fn earliest_expiry(&self) -> String {
        self.earliest_date.format(EXPIRY_FORMAT).to_string()
    }
}

fn serialize_month_year<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format(EXPIRY_FORMAT))
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Stock divergence between the control list and the robot.
///
/// Strict three-way split on exact equality; there is no tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// Counts agree.
    None,
    /// Robot holds more units than the control list declares.
    Excess,
    /// Control list declares this many units more than the robot holds.
    OutsideRobot(u32),
}

impl Divergence {
    pub fn between(sifarma: u32, robot: u32) -> Self {
        use std::cmp::Ordering;
        match sifarma.cmp(&robot) {
            Ordering::Equal => Self::None,
            Ordering::Less => Self::Excess,
            Ordering::Greater => Self::OutsideRobot(sifarma - robot),
        }
    }

    pub fn is_divergent(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Excess => write!(f, "Stock em excesso"),
            Self::OutsideRobot(diff) => write!(f, "{diff} emb fora do Robot"),
        }
    }
}

impl Serialize for Divergence {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// A control record joined with its robot counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledRecord {
    pub order: u32,
    pub code: String,
    pub description: String,
    /// Sifarma stock (control list).
    pub stock: u32,
    /// Robot unit count, 0 when the code is absent from the export.
    pub robot_count: u32,
    /// Sifarma expiry (control list).
    pub expiry: String,
    /// Robot earliest expiry, empty when the code is absent from the export.
    pub robot_expiry: String,
    pub status: Divergence,
}

impl ReconciledRecord {
    /// `None` when the robot has no expiry for this code.
    pub fn expiry_agrees(&self) -> Option<bool> {
        if self.robot_expiry.is_empty() {
            None
        } else {
            Some(self.robot_expiry == self.expiry)
        }
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_items: usize,
    pub matched: usize,
    pub divergent: usize,
    pub excess: usize,
    pub outside_robot: usize,
    /// Sum of shortfalls over all "fora do Robot" rows.
    pub outside_robot_units: u64,
    pub expiry_mismatches: usize,
    pub robot_only: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    pub control_records: usize,
    pub robot_codes: usize,
    pub robot_rows_discarded: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub records: Vec<ReconciledRecord>,
    /// Robot codes with no control record. Empty unless reporting is enabled.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub robot_only: Vec<RobotSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divergence_literals() {
        assert_eq!(Divergence::between(5, 5).to_string(), "");
        assert_eq!(Divergence::between(3, 7).to_string(), "Stock em excesso");
        assert_eq!(Divergence::between(10, 0).to_string(), "10 emb fora do Robot");
        assert_eq!(Divergence::between(10, 4), Divergence::OutsideRobot(6));
    }

    #[test]
    fn divergence_serializes_as_string() {
        let json = serde_json::to_string(&Divergence::OutsideRobot(2)).unwrap();
        assert_eq!(json, "\"2 emb fora do Robot\"");
        let json = serde_json::to_string(&Divergence::None).unwrap();
        assert_eq!(json, "\"\"");
    }

    #[test]
    fn summary_expiry_is_month_year() {
        let s = RobotSummary {
            code: "7654321".into(),
            unit_count: 2,
            earliest_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
        };
        assert_eq!(s.earliest_expiry(), "01-2026");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["earliest_expiry"], "01-2026");
    }
}
