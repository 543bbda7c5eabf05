//! JSON-file persistence for the whitelist and IP bans.
//!
//! Each set is a sorted JSON array of strings in the data directory. A missing
//! file reads as an empty set.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use warden_command::{DirectoryStore, StoreError};

const WHITELIST_FILE: &str = "whitelist.json";
const BANNED_IPS_FILE: &str = "banned-ips.json";

pub struct JsonStore {
    directory: PathBuf,
}

impl JsonStore {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.directory.join(file)
    }
}

impl DirectoryStore for JsonStore {
    fn load_whitelist(&self) -> Result<Vec<String>, StoreError> {
        load_list(&self.path(WHITELIST_FILE))
    }

    fn save_whitelist(&self, names: &[String]) -> Result<(), StoreError> {
        save_list(&self.path(WHITELIST_FILE), names)
    }

    fn load_ip_bans(&self) -> Result<Vec<String>, StoreError> {
        load_list(&self.path(BANNED_IPS_FILE))
    }

    fn save_ip_bans(&self, addresses: &[String]) -> Result<(), StoreError> {
        save_list(&self.path(BANNED_IPS_FILE), addresses)
    }
}

/// Load a JSON array of strings.
fn load_list(path: &Path) -> Result<Vec<String>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path)?;
    let entries: Vec<String> = serde_json::from_str(&contents)
        .map_err(|e| StoreError::Json(format!("{}: {e}", path.display())))?;
    info!("Loaded {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Save strings as a sorted JSON array, creating the directory if needed.
fn save_list(path: &Path, entries: &[String]) -> Result<(), StoreError> {
    let mut sorted: Vec<&String> = entries.iter().collect();
    sorted.sort();
    let json = serde_json::to_string_pretty(&sorted)
        .map_err(|e| StoreError::Json(format!("{}: {e}", path.display())))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}
