//! SSV Rewards Export
//!
//! Writers for everything a reward run leaves behind: per-round and merged
//! ledgers as JSON, monthly record tables as CSV and the console summary
//! of applied months.

mod csv;
mod json;
mod summary;
mod tables;

pub use csv::CsvTable;
pub use json::{write_ledger, LedgerWriter, TIMESTAMP_FORMAT};
pub use summary::render_summary;
pub use tables::{
    monthly_owner_table, monthly_validator_table, owner_table, owner_totals_table,
    validator_table, validator_totals_table,
};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {what}: {reason}")]
    Encode { what: String, reason: String },

    #[error("CSV row has {got} fields, header has {expected}")]
    RowWidth { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, ExportError>;

pub(crate) fn ensure_dir(path: &std::path::Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| ExportError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_file(path: &std::path::Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    std::fs::write(path, content).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
