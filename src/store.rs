use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("persisted payload is corrupt: {0}")]
    Corrupt(String),
}

/// A single durable string slot per key. Failures stay behind this seam;
/// callers treat persistence as advisory.
pub trait StorageSlot {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// File-backed slot: one `<key>.json` file under a base directory.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageSlot for FileSlot {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        match fs::read_to_string(self.path(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes via a temp file and rename so readers never observe a
    /// half-written payload.
    fn set(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        fs::create_dir_all(&self.dir)?;
        let final_path = self.path(key);
        let tmp_path = self.dir.join(format!("{key}.json.tmp"));

        fs::write(&tmp_path, value)?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                // Some platforms refuse to rename over an existing file.
                if final_path.exists() {
                    fs::remove_file(&final_path)?;
                    fs::rename(&tmp_path, &final_path)?;
                    Ok(())
                } else {
                    Err(rename_err.into())
                }
            }
        }
    }
}

/// In-memory slot, useful in tests and when no writable disk is available.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    values: HashMap<String, String>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut slot = Self::new();
        slot.values.insert(key.to_string(), value.to_string());
        slot
    }
}

impl StorageSlot for MemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "etalase_store_{prefix}_{}_{}",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn file_slot_returns_none_for_missing_key() {
        let slot = FileSlot::new(temp_dir("missing"));
        assert!(slot.get("wishlist").expect("missing is not an error").is_none());
    }

    #[test]
    fn file_slot_round_trips_and_overwrites() {
        let dir = temp_dir("roundtrip");
        let mut slot = FileSlot::new(&dir);

        slot.set("wishlist", "[1]").expect("first write");
        assert_eq!(slot.get("wishlist").unwrap().as_deref(), Some("[1]"));

        slot.set("wishlist", "[1,2]").expect("overwrite");
        assert_eq!(slot.get("wishlist").unwrap().as_deref(), Some("[1,2]"));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn memory_slot_round_trips() {
        let mut slot = MemorySlot::new();
        assert!(slot.get("wishlist").unwrap().is_none());
        slot.set("wishlist", "[]").unwrap();
        assert_eq!(slot.get("wishlist").unwrap().as_deref(), Some("[]"));
    }
}
