//! `stockcheck-recon`: control list vs robot inventory reconciliation.
//!
//! Pure engine crate: receives document text and export bytes, returns
//! reconciled records. No CLI or process dependencies.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod reconcile;
pub mod summary;

pub use classify::{LineClassifier, LineKind};
pub use config::ReconConfig;
pub use engine::{run, ReconInput};
pub use error::ReconError;
pub use extract::Document;
pub use model::{ControlRecord, Divergence, ReconResult, ReconciledRecord, RobotSummary};
