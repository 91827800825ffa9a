//! Result export: CSV, JSON or XLSX picked from the output file extension.

use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Color, Format, Workbook};
use stockcheck_recon::{ReconResult, ReconciledRecord};

use crate::CliError;

/// Column headers shared by the CSV and XLSX exports.
pub const HEADERS: [&str; 8] = [
    "Ord.",
    "Codigo",
    "Designacao",
    "Stock",
    "Stock Robot",
    "Validade Sifarma",
    "Validade Real",
    "Stock errado",
];

const SHEET_NAME: &str = "Analise_Stock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("json") => Ok(Self::Json),
            Some("xlsx") => Ok(Self::Xlsx),
            _ => Err(CliError::args(format!(
                "cannot infer export format from {} (expected .csv, .json or .xlsx)",
                path.display()
            ))),
        }
    }
}

/// Write `result` to `path` in the format implied by its extension.
pub fn write_result(result: &ReconResult, path: &Path) -> Result<(), CliError> {
    match ExportFormat::from_path(path)? {
        ExportFormat::Csv => write_csv(&result.records, path),
        ExportFormat::Json => write_json(result, path),
        ExportFormat::Xlsx => write_xlsx(&result.records, path),
    }
}

fn row_fields(r: &ReconciledRecord) -> [String; 8] {
    [
        r.order.to_string(),
        r.code.clone(),
        r.description.clone(),
        r.stock.to_string(),
        r.robot_count.to_string(),
        r.expiry.clone(),
        r.robot_expiry.clone(),
        r.status.to_string(),
    ]
}

/// Semicolon-delimited, UTF-8 with BOM so spreadsheet apps pick the encoding.
fn write_csv(records: &[ReconciledRecord], path: &Path) -> Result<(), CliError> {
    let io_err = |e: &dyn std::fmt::Display| {
        CliError::io(format!("cannot write {}: {}", path.display(), e))
    };

    let mut file = std::fs::File::create(path).map_err(|e| io_err(&e))?;
    file.write_all("\u{feff}".as_bytes()).map_err(|e| io_err(&e))?;

    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(file);
    writer.write_record(HEADERS).map_err(|e| io_err(&e))?;
    for r in records {
        writer.write_record(row_fields(r)).map_err(|e| io_err(&e))?;
    }
    writer.flush().map_err(|e| io_err(&e))?;
    Ok(())
}

fn write_json(result: &ReconResult, path: &Path) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
    std::fs::write(path, json)
        .map_err(|e| CliError::io(format!("cannot write {}: {}", path.display(), e)))
}

/// Single sheet; divergent rows get a red fill.
fn write_xlsx(records: &[ReconciledRecord], path: &Path) -> Result<(), CliError> {
    let xlsx_err = |e: rust_xlsxwriter::XlsxError| {
        CliError::io(format!("cannot write {}: {}", path.display(), e))
    };

    let header_format = Format::new().set_bold().set_background_color(Color::Silver);
    let plain = Format::new();
    let divergent = Format::new().set_background_color(Color::RGB(0xFFCCCC));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(xlsx_err)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(xlsx_err)?;
    }

    for (i, r) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        let format = if r.status.is_divergent() { &divergent } else { &plain };

        sheet.write_number_with_format(row, 0, r.order, format).map_err(xlsx_err)?;
        sheet.write_string_with_format(row, 1, &r.code, format).map_err(xlsx_err)?;
        sheet.write_string_with_format(row, 2, &r.description, format).map_err(xlsx_err)?;
        sheet.write_number_with_format(row, 3, r.stock, format).map_err(xlsx_err)?;
        sheet.write_number_with_format(row, 4, r.robot_count, format).map_err(xlsx_err)?;
        sheet.write_string_with_format(row, 5, &r.expiry, format).map_err(xlsx_err)?;
        sheet.write_string_with_format(row, 6, &r.robot_expiry, format).map_err(xlsx_err)?;
        sheet
            .write_string_with_format(row, 7, r.status.to_string(), format)
            .map_err(xlsx_err)?;
    }

    sheet.set_column_width(2, 48).map_err(xlsx_err)?;
    sheet.set_column_width(7, 22).map_err(xlsx_err)?;

    workbook.save(path).map_err(xlsx_err)?;
    Ok(())
}
