use std::{
    collections::HashMap,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::Local;
use directories::ProjectDirs;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    constants::{MAX_BACKUPS, STORAGE_KEYS},
    domain::{Category, Entry},
    error::StorageError,
};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDirectory {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        atomic_write(&self.path_for(key), value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        delete_file_if_exists(&self.path_for(key))
    }
}

/// Reads never fail: a missing, unreadable or malformed value reads as an
/// empty collection.
#[derive(Debug, Clone)]
pub struct Store<B> {
    backend: B,
}

impl<B: KeyValueStore> Store<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(raw) = self.backend.get(key) else {
            return Vec::new();
        };

        match serde_json::from_str::<Option<Vec<T>>>(&raw) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                warn!("Stored value for '{}' is malformed, treating as empty: {}", key, e);
                Vec::new()
            }
        }
    }

    pub fn write<T: Serialize>(&mut self, key: &str, records: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &json)?;
        debug!("Wrote {} records to '{}'", records.len(), key);
        Ok(())
    }

    pub fn categories(&self) -> Vec<Category> {
        self.read(STORAGE_KEYS.categories)
    }

    pub fn save_categories(&mut self, categories: &[Category]) -> Result<(), StorageError> {
        self.write(STORAGE_KEYS.categories, categories)
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.read(STORAGE_KEYS.entries)
    }

    pub fn save_entries(&mut self, entries: &[Entry]) -> Result<(), StorageError> {
        self.write(STORAGE_KEYS.entries, entries)
    }

    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        self.backend.remove(STORAGE_KEYS.categories)?;
        self.backend.remove(STORAGE_KEYS.entries)?;
        debug!("Cleared all stored collections");
        Ok(())
    }
}

pub fn get_data_dir() -> PathBuf {
    let local_categories = Path::new("./fc_categories.json");
    let local_entries = Path::new("./fc_entries.json");
    if local_categories.exists() || local_entries.exists() {
        return PathBuf::from(".");
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "front-counter", "front-counter") {
        proj_dirs.data_dir().to_path_buf()
    } else {
        PathBuf::from(".")
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StorageError::Encode {
        key: path.display().to_string(),
        source,
    })?;
    atomic_write(path, &json)
}

pub fn delete_file_if_exists(path: &Path) -> Result<(), StorageError> {
    if path.exists() {
        fs::remove_file(path).map_err(|source| StorageError::Remove {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

pub fn write_bytes_file(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    fs::write(path, content).map_err(|source| StorageError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn create_backup(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        return Ok(());
    }

    let backup_dir = path.parent().unwrap_or(Path::new(".")).join("backups");
    fs::create_dir_all(&backup_dir).map_err(|source| StorageError::CreateDirectory {
        path: backup_dir.clone(),
        source,
    })?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!(
        "{}.{}",
        path.file_name().unwrap_or_default().to_string_lossy(),
        timestamp
    );
    let backup_path = backup_dir.join(&filename);
    fs::copy(path, &backup_path).map_err(|source| StorageError::Write {
        path: backup_path.clone(),
        source,
    })?;

    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    if let Ok(entries) = fs::read_dir(&backup_dir) {
        let mut backups: Vec<_> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(&*stem))
            .collect();
        backups.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

        while backups.len() > MAX_BACKUPS {
            let oldest = backups.remove(0);
            let _ = fs::remove_file(oldest.path());
        }
    }

    Ok(())
}

pub fn atomic_write(path: &Path, content: &str) -> Result<(), StorageError> {
    if path.exists() {
        create_backup(path)?;
    }

    let write_err = |source: io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let tmp_path = path.with_extension("tmp");
    let mut tmp_file = File::create(&tmp_path).map_err(write_err)?;
    tmp_file.write_all(content.as_bytes()).map_err(write_err)?;
    tmp_file.sync_all().map_err(write_err)?;
    fs::rename(&tmp_path, path).map_err(write_err)?;
    Ok(())
}
