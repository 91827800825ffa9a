use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every field has a default, so an empty TOML is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub robot: RobotConfig,
    #[serde(default)]
    pub join: JoinConfig,
}

// ---------------------------------------------------------------------------
// Control document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractConfig {
    /// Literal keyword between the description and the stock columns.
    #[serde(default = "default_batch_marker")]
    pub batch_marker: String,
    /// Boilerplate substrings, matched case-insensitively.
    #[serde(default = "default_noise_markers")]
    pub noise_markers: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            batch_marker: default_batch_marker(),
            noise_markers: default_noise_markers(),
        }
    }
}

fn default_batch_marker() -> String {
    "LOTE".into()
}

fn default_noise_markers() -> Vec<String> {
    [
        "farmacia",
        "nif:",
        "telefone:",
        "lista de controlo",
        "expiram entre",
        "ord. código",
        "lotedesignação",
        "impressão:",
        "página",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ---------------------------------------------------------------------------
// Robot export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RobotConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Encoding label tried after UTF-8 fails (WHATWG label).
    #[serde(default = "default_fallback_encoding")]
    pub fallback_encoding: String,
    #[serde(default = "default_code_columns")]
    pub code_columns: Vec<String>,
    #[serde(default = "default_date_columns")]
    pub date_columns: Vec<String>,
    /// Positional fallback when header names don't resolve.
    #[serde(default = "default_code_index")]
    pub code_index: usize,
    #[serde(default = "default_date_index")]
    pub date_index: usize,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub dates: DateMode,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            fallback_encoding: default_fallback_encoding(),
            code_columns: default_code_columns(),
            date_columns: default_date_columns(),
            code_index: default_code_index(),
            date_index: default_date_index(),
            date_format: default_date_format(),
            dates: DateMode::default(),
        }
    }
}

impl RobotConfig {
    /// Minimum header width for the positional fallback.
    pub fn min_columns(&self) -> usize {
        self.code_index.max(self.date_index) + 1
    }
}

fn default_delimiter() -> char {
    ';'
}

fn default_fallback_encoding() -> String {
    "windows-1252".into()
}

fn default_code_columns() -> Vec<String> {
    vec!["Código de barras".into(), "Codigo de barras".into(), "digo de barras".into()]
}

fn default_date_columns() -> Vec<String> {
    vec!["Data de validade".into()]
}

fn default_code_index() -> usize {
    1
}

fn default_date_index() -> usize {
    5
}

fn default_date_format() -> String {
    "%d-%m-%Y".into()
}

/// What to do with a robot row whose date does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateMode {
    /// Drop the row silently.
    #[default]
    Lenient,
    /// Abort aggregation with a row parse error.
    Strict,
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinConfig {
    #[serde(default)]
    pub robot_only: RobotOnlyPolicy,
}

/// Visibility of robot codes that never appear on the control list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotOnlyPolicy {
    #[default]
    Hide,
    /// Return them in `ReconResult::robot_only`. The reconciled records are unchanged.
    Report,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.extract.batch_marker.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "extract.batch_marker must not be empty".into(),
            ));
        }

        let robot = &self.robot;
        if !robot.delimiter.is_ascii() {
            return Err(ReconError::ConfigValidation(format!(
                "robot.delimiter must be a single ASCII character, got '{}'",
                robot.delimiter
            )));
        }
        if encoding_rs::Encoding::for_label(robot.fallback_encoding.as_bytes()).is_none() {
            return Err(ReconError::ConfigValidation(format!(
                "robot.fallback_encoding: unknown encoding '{}'",
                robot.fallback_encoding
            )));
        }
        if robot.code_columns.is_empty() || robot.date_columns.is_empty() {
            return Err(ReconError::ConfigValidation(
                "robot.code_columns and robot.date_columns need at least one name each".into(),
            ));
        }
        if robot.code_index == robot.date_index {
            return Err(ReconError::ConfigValidation(format!(
                "robot.code_index and robot.date_index must differ (both {})",
                robot.code_index
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.extract.batch_marker, "LOTE");
        assert_eq!(config.robot.delimiter, ';');
        assert_eq!(config.robot.code_index, 1);
        assert_eq!(config.robot.date_index, 5);
        assert_eq!(config.robot.dates, DateMode::Lenient);
        assert_eq!(config.join.robot_only, RobotOnlyPolicy::Hide);
        assert!(config.extract.noise_markers.iter().any(|m| m == "página"));
    }

    #[test]
    fn partial_override() {
        let config = ReconConfig::from_toml(
            r#"
[robot]
dates = "strict"
date_index = 4

[join]
robot_only = "report"
"#,
        )
        .unwrap();
        assert_eq!(config.robot.dates, DateMode::Strict);
        assert_eq!(config.robot.date_index, 4);
        assert_eq!(config.robot.min_columns(), 5);
        assert_eq!(config.join.robot_only, RobotOnlyPolicy::Report);
        assert_eq!(config.robot.fallback_encoding, "windows-1252");
    }

    #[test]
    fn unknown_encoding_rejected() {
        let err = ReconConfig::from_toml("[robot]\nfallback_encoding = \"klingon\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
        assert!(err.to_string().contains("klingon"));
    }

    #[test]
    fn same_indices_rejected() {
        let err = ReconConfig::from_toml("[robot]\ncode_index = 5\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let err = ReconConfig::from_toml("[join]\nmode = \"strict\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn blank_batch_marker_rejected() {
        let err = ReconConfig::from_toml("[extract]\nbatch_marker = \"  \"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigValidation(_)));
    }
}
