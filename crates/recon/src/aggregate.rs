//! Robot export aggregation: delimited bytes → one `RobotSummary` per code.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use encoding_rs::Encoding;

use crate::config::{DateMode, RobotConfig};
use crate::error::ReconError;
use crate::model::{RobotRow, RobotSummary};

/// Placeholder some exporters write into empty code cells.
const NOT_A_VALUE: &str = "nan";

#[derive(Debug, Clone, Default)]
pub struct AggregateOutput {
    /// Sorted by code.
    pub summaries: Vec<RobotSummary>,
    pub rows_read: usize,
    /// Rows dropped for an empty code or an unparseable date.
    pub rows_discarded: usize,
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode as UTF-8, then as `fallback_label`. Errors only if both reject the bytes.
pub fn decode<'a>(bytes: &'a [u8], fallback_label: &str) -> Result<Cow<'a, str>, ReconError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(Cow::Borrowed(text.strip_prefix('\u{feff}').unwrap_or(text)));
    }

    let encoding = Encoding::for_label(fallback_label.as_bytes()).ok_or_else(|| {
        ReconError::ConfigValidation(format!("unknown encoding '{fallback_label}'"))
    })?;

    match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => {
            log::warn!("robot export is not valid UTF-8, decoded as {}", encoding.name());
            Ok(text)
        }
        None => Err(ReconError::Decoding {
            attempted: vec!["UTF-8".into(), encoding.name().into()],
        }),
    }
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub code: usize,
    pub date: usize,
    /// Resolved by position rather than by header name.
    pub positional: bool,
}

/// Best header for a set of accepted names: exact (case-insensitive) match
/// beats substring match, earlier column wins ties.
fn rank_column(headers: &[String], variants: &[String]) -> Option<usize> {
    let mut best: Option<(u8, usize)> = None;
    for (idx, header) in headers.iter().enumerate() {
        let h = header.trim().to_lowercase();
        let score = variants
            .iter()
            .map(|v| {
                let v = v.trim().to_lowercase();
                if h == v {
                    2
                } else if !v.is_empty() && h.contains(&v) {
                    1
                } else {
                    0
                }
            })
            .max()
            .unwrap_or(0);
        if score > 0 && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, idx));
        }
    }
    best.map(|(_, idx)| idx)
}

pub fn resolve_columns(headers: &[String], config: &RobotConfig) -> Result<ColumnMap, ReconError> {
    let code = rank_column(headers, &config.code_columns);
    let date = rank_column(headers, &config.date_columns);

    if let (Some(code), Some(date)) = (code, date) {
        if code != date {
            return Ok(ColumnMap { code, date, positional: false });
        }
    }

    if headers.len() >= config.min_columns() {
        log::warn!(
            "robot columns not found by name, using positions {} (code) and {} (date): {:?}",
            config.code_index,
            config.date_index,
            headers
        );
        return Ok(ColumnMap {
            code: config.code_index,
            date: config.date_index,
            positional: true,
        });
    }

    Err(ReconError::SchemaResolution {
        available: headers.to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// Normalized rows plus the counters reported in `AggregateOutput`.
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub rows: Vec<RobotRow>,
    pub rows_read: usize,
    pub rows_discarded: usize,
}

/// The csv reader takes a single byte; anything outside ASCII is rejected.
fn field_delimiter(config: &RobotConfig) -> Result<u8, ReconError> {
    u8::try_from(config.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| {
            ReconError::ConfigValidation(format!(
                "robot.delimiter must be a single ASCII character, got '{}'",
                config.delimiter
            ))
        })
}

/// Parse decoded text into normalized rows.
pub fn parse_rows(text: &str, config: &RobotConfig) -> Result<ParsedRows, ReconError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(field_delimiter(config)?)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let columns = resolve_columns(&headers, config)?;

    let mut rows = Vec::new();
    let mut read = 0;
    let mut discarded = 0;

    for result in reader.records() {
        let record = result?;
        read += 1;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let code = record.get(columns.code).unwrap_or("").trim();
        if code.is_empty() || code.eq_ignore_ascii_case(NOT_A_VALUE) {
            discarded += 1;
            continue;
        }

        let raw_date = record.get(columns.date).unwrap_or("").trim();
        let expiry_date = match NaiveDate::parse_from_str(raw_date, &config.date_format) {
            Ok(d) => d,
            Err(_) if config.dates == DateMode::Strict => {
                return Err(ReconError::RowParse {
                    line,
                    value: raw_date.to_string(),
                });
            }
            Err(_) => {
                log::debug!("line {line}: dropping row for {code}, bad date {raw_date:?}");
                discarded += 1;
                continue;
            }
        };

        rows.push(RobotRow {
            code: code.to_string(),
            expiry_date,
        });
    }

    Ok(ParsedRows {
        rows,
        rows_read: read,
        rows_discarded: discarded,
    })
}

/// Group rows by code: unit count plus earliest expiry.
pub fn aggregate_rows(rows: &[RobotRow]) -> Vec<RobotSummary> {
    let mut groups: BTreeMap<&str, (usize, NaiveDate)> = BTreeMap::new();

    for row in rows {
        let entry = groups.entry(row.code.as_str()).or_insert((0, row.expiry_date));
        entry.0 += 1;
        if row.expiry_date < entry.1 {
            entry.1 = row.expiry_date;
        }
    }

    groups
        .into_iter()
        .map(|(code, (unit_count, earliest_date))| RobotSummary {
            code: code.to_string(),
            unit_count,
            earliest_date,
        })
        .collect()
}

/// Decode, resolve, normalize and group a robot export.
pub fn aggregate(bytes: &[u8], config: &RobotConfig) -> Result<AggregateOutput, ReconError> {
    let text = decode(bytes, &config.fallback_encoding)?;
    let ParsedRows {
        rows,
        rows_read,
        rows_discarded,
    } = parse_rows(&text, config)?;
    let summaries = aggregate_rows(&rows);

    log::info!(
        "robot export: {rows_read} rows, {rows_discarded} discarded, {} codes",
        summaries.len()
    );

    Ok(AggregateOutput {
        summaries,
        rows_read,
        rows_discarded,
    })
}

/// Read a robot export from disk. A missing or unreadable file is `SourceUnavailable`.
pub fn read_export(path: &Path) -> Result<Vec<u8>, ReconError> {
    std::fs::read(path).map_err(|e| ReconError::SourceUnavailable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn aggregate_file(path: &Path, config: &RobotConfig) -> Result<AggregateOutput, ReconError> {
    let bytes = read_export(path)?;
    aggregate(&bytes, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Ord.;Código de barras;Unidade;Dosagem;Armazenado em;Data de validade;Nome do artigo";

    fn config() -> RobotConfig {
        RobotConfig::default()
    }

    fn run(text: &str) -> AggregateOutput {
        aggregate(text.as_bytes(), &config()).unwrap()
    }

    #[test]
    fn groups_by_code_with_earliest_date() {
        let out = run(&format!(
            "{HEADER}\n1;7654321;UN;;A1;05-03-2026;X\n2;7654321;UN;;A2;10-01-2026;X\n3;1111111;UN;;A3;01-12-2027;Y\n"
        ));
        assert_eq!(out.summaries.len(), 2);
        assert_eq!(out.summaries[0].code, "1111111");
        let s = &out.summaries[1];
        assert_eq!(s.code, "7654321");
        assert_eq!(s.unit_count, 2);
        assert_eq!(s.earliest_expiry(), "01-2026");
        assert_eq!(out.rows_read, 3);
        assert_eq!(out.rows_discarded, 0);
    }

    #[test]
    fn bad_dates_excluded_from_count() {
        let out = run(&format!(
            "{HEADER}\n1;7654321;UN;;A1;05-03-2026;X\n2;7654321;UN;;A2;2026-01-10;X\n3;7654321;UN;;A3;;X\n"
        ));
        assert_eq!(out.summaries.len(), 1);
        assert_eq!(out.summaries[0].unit_count, 1);
        assert_eq!(out.summaries[0].earliest_expiry(), "03-2026");
        assert_eq!(out.rows_discarded, 2);
    }

    #[test]
    fn empty_and_nan_codes_dropped() {
        let out = run(&format!(
            "{HEADER}\n1;;UN;;A1;05-03-2026;X\n2;nan;UN;;A2;05-03-2026;X\n3;  7654321 ;UN;;A3;05-03-2026;X\n"
        ));
        assert_eq!(out.summaries.len(), 1);
        assert_eq!(out.summaries[0].code, "7654321");
        assert_eq!(out.rows_discarded, 2);
    }

    #[test]
    fn all_rows_discarded_is_empty_not_error() {
        let out = run(&format!("{HEADER}\n1;7654321;UN;;A1;not a date;X\n"));
        assert!(out.summaries.is_empty());
        assert_eq!(out.rows_discarded, 1);
    }

    #[test]
    fn strict_dates_fail_on_bad_row() {
        let mut cfg = config();
        cfg.dates = DateMode::Strict;
        let text =
            format!("{HEADER}\n1;7654321;UN;;A1;05-03-2026;X\n2;7654321;UN;;A2;31-02-2026;X\n");
        let err = aggregate(text.as_bytes(), &cfg).unwrap_err();
        match err {
            ReconError::RowParse { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "31-02-2026");
            }
            other => panic!("expected RowParse, got {other:?}"),
        }
    }

    #[test]
    fn latin1_bytes_decode_and_resolve_by_name() {
        // "Código" and "validade" in windows-1252, date column moved to index 2
        let mut bytes = b"Ord.;C\xf3digo de barras;Data de validade\n".to_vec();
        bytes.extend_from_slice(b"1;7654321;10-01-2026\n");
        let out = aggregate(&bytes, &config()).unwrap();
        assert_eq!(out.summaries.len(), 1);
        assert_eq!(out.summaries[0].unit_count, 1);
    }

    #[test]
    fn mojibake_header_matches_by_substring() {
        let headers: Vec<String> = ["Ord.", "Cdigo de barras", "Data de validade"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let map = resolve_columns(&headers, &config()).unwrap();
        assert_eq!(map, ColumnMap { code: 1, date: 2, positional: false });
    }

    #[test]
    fn exact_name_beats_substring() {
        let headers: Vec<String> =
            ["Tipo de codigo de barras", "Data de validade", "Codigo de barras"]
                .iter()
                .map(|s| s.to_string())
                .collect();
        let map = resolve_columns(&headers, &config()).unwrap();
        assert_eq!(map.code, 2);
        assert_eq!(map.date, 1);
    }

    #[test]
    fn positional_fallback() {
        let headers: Vec<String> =
            ["a", "b", "c", "d", "e", "f"].iter().map(|s| s.to_string()).collect();
        let map = resolve_columns(&headers, &config()).unwrap();
        assert_eq!(map, ColumnMap { code: 1, date: 5, positional: true });
    }

    #[test]
    fn schema_failure_lists_columns() {
        let err = aggregate(b"a;b;c\n1;2;3\n", &config()).unwrap_err();
        match &err {
            ReconError::SchemaResolution { available } => assert_eq!(available, &["a", "b", "c"]),
            other => panic!("expected SchemaResolution, got {other:?}"),
        }
        assert!(err.to_string().contains("a, b, c"));
    }

    #[test]
    fn bom_is_stripped() {
        let text = format!("\u{feff}{HEADER}\n1;7654321;UN;;A1;05-03-2026;X\n");
        let decoded = decode(text.as_bytes(), "windows-1252").unwrap();
        assert!(decoded.starts_with("Ord."));
    }

    #[test]
    fn fallback_rejection_names_encodings() {
        // 0xFF is invalid UTF-8 and unmapped in Shift_JIS lead position
        let err = decode(b"\xff\xff\xff", "shift_jis").unwrap_err();
        match err {
            ReconError::Decoding { attempted } => {
                assert_eq!(attempted[0], "UTF-8");
                assert_eq!(attempted[1], "Shift_JIS");
            }
            other => panic!("expected Decoding, got {other:?}"),
        }
    }

    #[test]
    fn short_rows_are_tolerated() {
        let out = run(&format!("{HEADER}\n1;7654321\n2;7654321;UN;;A1;05-03-2026;X\n"));
        assert_eq!(out.summaries[0].unit_count, 1);
        assert_eq!(out.rows_discarded, 1);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = aggregate_file(&dir.path().join("nope.csv"), &config()).unwrap_err();
        assert!(matches!(err, ReconError::SourceUnavailable { .. }));
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        // 'ś' is U+015B; a truncating cast would read it as '['
        let text = "Ord.[Código de barras[Data de validade\n1[7654321[05-03-2026\n";
        for delimiter in ['ś', 'é'] {
            let cfg = RobotConfig {
                delimiter,
                ..RobotConfig::default()
            };
            let err = aggregate(text.as_bytes(), &cfg).unwrap_err();
            assert!(matches!(err, ReconError::ConfigValidation(_)), "{delimiter}: {err:?}");
        }
    }

    #[test]
    fn parse_rows_counts_read_and_discarded() {
        let text = format!("{HEADER}\n1;7654321;UN;;A1;05-03-2026;X\n2;;UN;;A2;05-03-2026;X\n");
        let parsed = parse_rows(&text, &config()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows_read, 2);
        assert_eq!(parsed.rows_discarded, 1);
        assert_eq!(parsed.rows[0].code, "7654321");
    }
}
