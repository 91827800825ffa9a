//! Line classification for the control document.
//!
//! Two independent policies: [`RecordPattern`] recognizes the structural
//! record-start layout, [`NoiseFilter`] recognizes page boilerplate. The
//! [`LineClassifier`] combines them; record-start is tested first.

use regex::Regex;

use crate::config::ExtractConfig;
use crate::error::ReconError;
use crate::model::ControlRecord;

/// Classification of a single text line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Opens a new record. All fields except the description are final.
    RecordStart(ControlRecord),
    /// Extra description text for the open record.
    Continuation,
    /// Header/footer boilerplate or a blank line.
    Noise,
}

// ---------------------------------------------------------------------------
// Structural pattern
// ---------------------------------------------------------------------------

/// Order number, 7-digit code and the description up to the batch marker.
const RECORD_HEAD: &str = r"^([0-9]+?)\s*([0-9]{7})\s+(.*?)";
/// Batch id, stock count, unit and `MM-YYYY` expiry after the marker.
const RECORD_TAIL: &str = r"\s+[^0-9]+?\s+([0-9]+)\s+[A-Z.]+\s+([0-9]{2}-[0-9]{4})";

/// Record-start layout:
/// `<order><code:7> <description> <MARKER> <batch text> <stock> <UNIT> <MM-YYYY>`.
///
/// The order number is everything before the last 7 digits of the leading
/// digit run, so `1 5323951` and `15323951` both read as order 1, code 5323951.
#[derive(Debug, Clone)]
pub struct RecordPattern {
    re: Regex,
}

impl RecordPattern {
    pub fn new(batch_marker: &str) -> Result<Self, ReconError> {
        let marker = batch_marker.trim();
        if marker.is_empty() {
            return Err(ReconError::ConfigValidation("batch marker must not be empty".into()));
        }
        let pattern = format!("{RECORD_HEAD}{}{RECORD_TAIL}", regex::escape(marker));
        let re = Regex::new(&pattern)
            .map_err(|e| ReconError::ConfigValidation(format!("batch marker: {e}")))?;
        Ok(Self { re })
    }

    /// Parse a trimmed line into a record, or `None` if it is not a record start.
    pub fn parse(&self, line: &str) -> Option<ControlRecord> {
        let caps = self.re.captures(line)?;
        // Oversized digit runs can't be a real order/stock; treat as text.
        let order = caps[1].parse::<u32>().ok()?;
        let stock = caps[4].parse::<u32>().ok()?;
        Some(ControlRecord {
            order,
            code: caps[2].to_string(),
            description: caps[3].trim().to_string(),
            stock,
            expiry: caps[5].to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Boilerplate filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NoiseFilter {
    markers: Vec<String>,
}

impl NoiseFilter {
    pub fn new<S: AsRef<str>>(markers: &[S]) -> Self {
        Self {
            markers: markers
                .iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive substring containment of any marker.
    pub fn is_noise(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.markers.iter().any(|m| lower.contains(m.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LineClassifier {
    pattern: RecordPattern,
    noise: NoiseFilter,
}

impl LineClassifier {
    pub fn new(config: &ExtractConfig) -> Result<Self, ReconError> {
        Ok(Self {
            pattern: RecordPattern::new(&config.batch_marker)?,
            noise: NoiseFilter::new(&config.noise_markers),
        })
    }

    pub fn from_parts(pattern: RecordPattern, noise: NoiseFilter) -> Self {
        Self { pattern, noise }
    }

    pub fn classify(&self, line: &str) -> LineKind {
        let line = line.trim();
        if line.is_empty() {
            return LineKind::Noise;
        }
        if let Some(record) = self.pattern.parse(line) {
            return LineKind::RecordStart(record);
        }
        if self.noise.is_noise(line) {
            return LineKind::Noise;
        }
        LineKind::Continuation
    }
}
