use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// Input document or table missing or unreadable.
    #[error("cannot read {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },
    /// Tabular source rejected by every attempted encoding.
    #[error("cannot decode robot export (tried {})", attempted.join(", "))]
    Decoding { attempted: Vec<String> },
    /// Code/date columns not found by name or position.
    #[error("required columns not found. Available: [{}]", available.join(", "))]
    SchemaResolution { available: Vec<String> },
    /// Unparseable date in strict mode.
    #[error("line {line}: cannot parse date '{value}'")]
    RowParse { line: u64, value: String },
    /// Malformed delimited data.
    #[error("CSV error: {0}")]
    Csv(String),
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (bad delimiter, unknown encoding, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

impl From<csv::Error> for ReconError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}
