//! Input loading: control document text and robot export bytes.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use stockcheck_recon::aggregate::read_export;
use stockcheck_recon::Document;

use crate::exit_codes::EXIT_IO;
use crate::CliError;

/// Load the control document. PDFs go through `pdftotext`; anything else is
/// read as (lossy) UTF-8 text with form feeds as page breaks.
pub fn load_control(path: &Path) -> Result<Document, CliError> {
    if !path.exists() {
        return Err(CliError::io(format!("cannot read {}: file not found", path.display())));
    }

    let text = if is_pdf(path) {
        run_pdftotext(path)?
    } else {
        let bytes = std::fs::read(path)
            .map_err(|e| CliError::io(format!("cannot read {}: {}", path.display(), e)))?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let document = Document::from_text(&text);
    log::info!("{}: {} page(s) of text", path.display(), document.pages.len());
    Ok(document)
}

/// Read the robot export as raw bytes; the engine deals with the encoding.
pub fn load_robot(path: &Path) -> Result<Vec<u8>, CliError> {
    Ok(read_export(path)?)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// `-layout` keeps each printed table row on one line, which the record
/// pattern needs.
fn pdftotext_args(file: &Path) -> Vec<OsString> {
    vec![
        "-layout".into(),
        "-enc".into(),
        "UTF-8".into(),
        file.as_os_str().to_owned(),
        "-".into(),
    ]
}

/// Run `pdftotext -layout -enc UTF-8 <file> -` and capture stdout.
fn run_pdftotext(file: &Path) -> Result<String, CliError> {
    which::which("pdftotext").map_err(|_| CliError {
        code: EXIT_IO,
        message: "pdftotext not installed (poppler-utils)".to_string(),
        hint: Some("Install with: apt install poppler-utils / brew install poppler".to_string()),
    })?;

    let output = Command::new("pdftotext")
        .args(pdftotext_args(file))
        .output()
        .map_err(|e| CliError::io(format!("failed to run pdftotext: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CliError::io(format!(
            "pdftotext failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            stderr.trim(),
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();

    if text.trim().is_empty() {
        log::warn!("{}: no text extracted (scanned/image-only PDF?)", file.display());
    }

    Ok(text)
}
