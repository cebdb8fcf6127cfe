//! JSON ledger output

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use ssv_rewards_core::Ledger;

use crate::{write_file, ExportError, Result};

/// Timestamp embedded in ledger file names
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Writes labelled ledgers as `<label>-reward-<timestamp>.json`.
///
/// The timestamp is fixed when the writer is created, so every ledger of
/// one run shares it.
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    dir: PathBuf,
    timestamp: String,
}

impl LedgerWriter {
    /// Writer into `dir`, stamped with the current local time
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self::with_timestamp(dir, timestamp)
    }

    pub fn with_timestamp(dir: impl Into<PathBuf>, timestamp: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Path the ledger labelled `label` is written to
    pub fn path_for(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}-reward-{}.json", self.timestamp))
    }

    /// Write `ledger` under `label` and return the file path
    pub fn write(&self, label: &str, ledger: &Ledger) -> Result<PathBuf> {
        let path = self.path_for(label);
        write_ledger(&path, ledger)?;
        info!("Wrote {} ({} participants) to {:?}", label, ledger.len(), path);
        Ok(path)
    }
}

/// Write `ledger` as pretty JSON to an exact path
pub fn write_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    let json = ledger.to_json_string().map_err(|e| ExportError::Encode {
        what: path.display().to_string(),
        reason: e.to_string(),
    })?;
    write_file(path, &json)?;
    debug!("Ledger {:?} fingerprint {}", path, ledger.fingerprint());
    Ok(())
}
