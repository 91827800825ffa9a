//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success, no divergences                             |
//! | 1    | Divergences found (like `diff(1)`)                  |
//! | 2    | Usage error (bad args, unknown export format)       |
//! | 3    | Source unavailable (missing file, pdftotext absent) |
//! | 4    | Parse error (decoding, schema, strict date row)     |
//! | 6    | Invalid config file                                 |

use stockcheck_recon::ReconError;

/// Success - command completed, every item agrees.
pub const EXIT_SUCCESS: u8 = 0;

/// At least one control item diverges from the robot.
pub const EXIT_DIVERGENCES: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Input file missing or unreadable; text extraction unavailable.
pub const EXIT_IO: u8 = 3;

/// Input readable but not understood.
pub const EXIT_PARSE: u8 = 4;

/// Config TOML failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::SourceUnavailable { .. } => EXIT_IO,
        ReconError::Decoding { .. }
        | ReconError::SchemaResolution { .. }
        | ReconError::RowParse { .. }
        | ReconError::Csv(_) => EXIT_PARSE,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
    }
}
