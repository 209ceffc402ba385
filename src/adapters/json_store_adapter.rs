//! JSON file store adapter.
//!
//! The whole store is one JSON object keyed by symbol. Writes go to a
//! `.tmp` sibling first and are renamed into place.

use crate::domain::error::RotatraderError;
use crate::domain::symbol_record::Store;
use crate::ports::store_port::StorePort;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct JsonStoreAdapter {
    path: PathBuf,
}

impl JsonStoreAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn store_error(path: &Path, what: &str, e: impl std::fmt::Display) -> RotatraderError {
    RotatraderError::Store {
        reason: format!("{what} {}: {e}", path.display()),
    }
}

impl StorePort for JsonStoreAdapter {
    fn load(&self) -> Result<Store, RotatraderError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no store file, starting empty");
                return Ok(Store::new());
            }
            Err(e) => return Err(store_error(&self.path, "failed to read", e)),
        };
        if content.trim().is_empty() {
            return Ok(Store::new());
        }
        serde_json::from_str(&content).map_err(|e| store_error(&self.path, "malformed store", e))
    }

    fn save(&self, store: &Store) -> Result<(), RotatraderError> {
        let json = serde_json::to_string_pretty(store)
            .map_err(|e| store_error(&self.path, "failed to serialise", e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| store_error(parent, "failed to create directory", e))?;
        }

        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|e| store_error(&tmp, "failed to write", e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            store_error(&self.path, "failed to replace", e)
        })?;
        debug!(path = %self.path.display(), records = store.len(), "store saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::symbol_record::SymbolRecord;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let adapter = JsonStoreAdapter::new(dir.path().join("bot_store.json"));
        assert!(adapter.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let adapter = JsonStoreAdapter::new(dir.path().join("nested/bot_store.json"));

        let mut store = Store::new();
        let mut record = SymbolRecord::with_prices(vec![10.0, 10.5, 11.0]);
        record.last_trade_date = NaiveDate::from_ymd_opt(2024, 3, 14);
        store.insert("TQQQ", record);

        adapter.save(&store).unwrap();
        assert_eq!(adapter.load().unwrap(), store);
        assert!(!dir.path().join("nested/bot_store.json.tmp").exists());
    }

    #[test]
    fn reads_hand_written_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_store.json");
        fs::write(
            &path,
            r#"{"SOXL": {"prices": [20.0, 21.0], "indicators": {}, "score": -999,
                "last_close_date": "2024-03-14", "last_trade_date": null}}"#,
        )
        .unwrap();

        let store = JsonStoreAdapter::new(&path).load().unwrap();
        let record = store.get("SOXL").unwrap();
        assert_eq!(record.prices.as_slice(), &[20.0, 21.0]);
        assert!(record.indicators.is_none());
        assert_eq!(record.valid_score(), None);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_store.json");
        fs::write(&path, "{not json").unwrap();

        let err = JsonStoreAdapter::new(&path).load().unwrap_err();
        assert!(matches!(err, RotatraderError::Store { .. }));
        // left in place for inspection
        assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
    }
}
