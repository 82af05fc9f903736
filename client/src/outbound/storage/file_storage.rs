//! JSON-file implementation of the `SessionStorage` port.
//!
//! All entries live in one JSON object. Every write replaces the file
//! through a temporary sibling and a rename, so readers never observe a
//! half-written session.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cap_std::{ambient_authority, fs::Dir};
use tracing::warn;

use crate::domain::ports::{SessionStorage, StorageError};

const DEFAULT_DIR_NAME: &str = ".logitrack";
const DEFAULT_FILE_NAME: &str = "session.json";

/// Session storage persisted to a JSON file.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStorage {
    /// Storage backed by the file at `path`; it is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `$HOME/.logitrack/session.json`, when `HOME` is set.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| {
                PathBuf::from(home)
                    .join(DEFAULT_DIR_NAME)
                    .join(DEFAULT_FILE_NAME)
            })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn split(&self) -> Result<(&Path, OsString), StorageError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| StorageError::io(format!("{} has no file name", self.path.display())))?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Ok((parent, file_name.to_os_string()))
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let (parent, file_name) = self.split()?;
        let dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(io_error(parent, &err)),
        };
        let raw = match dir.read_to_string(Path::new(&file_name)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(io_error(&self.path, &err)),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|err| {
            StorageError::corrupt(format!("{}: {err}", self.path.display()))
        })
    }

    /// Entries to rewrite; a corrupt file is replaced rather than patched.
    fn load_for_update(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.load() {
            Err(StorageError::Corrupt { message }) => {
                warn!(%message, "discarding corrupt session file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let (parent, file_name) = self.split()?;
        Dir::create_ambient_dir_all(parent, ambient_authority())
            .map_err(|err| io_error(parent, &err))?;
        let dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| io_error(parent, &err))?;

        let encoded = serde_json::to_vec_pretty(entries)
            .map_err(|err| StorageError::io(format!("encode session: {err}")))?;
        let mut staging = file_name.clone();
        staging.push(".tmp");
        dir.write(Path::new(&staging), encoded)
            .map_err(|err| io_error(&self.path, &err))?;
        dir.rename(Path::new(&staging), &dir, Path::new(&file_name))
            .map_err(|err| io_error(&self.path, &err))
    }
}

fn io_error(path: &Path, err: &io::Error) -> StorageError {
    StorageError::io(format!("{}: {err}", path.display()))
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load_for_update()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load_for_update()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.save(&entries)
    }
}
