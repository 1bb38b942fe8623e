use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::store::{StoreBackend, StoreState};

/// File-backed store: one pretty-printed JSON document.
///
/// Saves go through a temp file in the same directory followed by a rename,
/// so readers never observe a half-written document.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StoreBackend for JsonFileStore {
    fn load(&self) -> Result<StoreState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            // First run: no document yet
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreState::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading store {}", self.path.display()));
            }
        };

        serde_json::from_str(&raw)
            .with_context(|| format!("decoding store {}", self.path.display()))
    }

    fn save(&self, state: &StoreState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).context("encoding store")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating store directory {}", parent.display()))?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("writing store temp file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing store {}", self.path.display()))?;

        Ok(())
    }
}
