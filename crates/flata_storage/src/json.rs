//! JSON file storage for persistent databases.

use crate::backend::{RawDatabase, Storage};
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Options for [`JsonStorage`].
#[derive(Debug, Clone, Default)]
pub struct JsonStorageConfig {
    /// Create missing parent directories when opening.
    pub create_dirs: bool,

    /// Pretty-print with this many spaces of indentation (`None` = compact).
    pub indent: Option<usize>,

    /// Write object keys in sorted order at every nesting level.
    pub sort_keys: bool,
}

impl JsonStorageConfig {
    /// Creates a configuration with compact, unsorted output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }

    /// Sets the pretty-print indentation.
    #[must_use]
    pub const fn indent(mut self, spaces: usize) -> Self {
        self.indent = Some(spaces);
        self
    }

    /// Sets whether to sort object keys.
    #[must_use]
    pub const fn sort_keys(mut self, value: bool) -> Self {
        self.sort_keys = value;
        self
    }
}

/// A storage backed by a single JSON file.
///
/// The file holds one JSON object whose keys are table names. An empty file
/// reads as `None`. Every write truncates the file and rewrites the whole
/// database, then flushes it to the OS.
///
/// # Thread Safety
///
/// The file handle is guarded by a mutex, so the storage can be shared
/// across threads.
///
/// # Example
///
/// ```no_run
/// use flata_storage::{JsonStorage, RawDatabase, Storage};
/// use std::path::Path;
///
/// let storage = JsonStorage::open(Path::new("db.json")).unwrap();
/// storage.write(&RawDatabase::new()).unwrap();
/// storage.close().unwrap();
/// ```
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    config: JsonStorageConfig,
    file: Mutex<Option<File>>,
}

impl JsonStorage {
    /// Opens or creates a JSON storage at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_with_config(path, JsonStorageConfig::default())
    }

    /// Opens or creates a JSON storage with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_config(path: &Path, config: JsonStorageConfig) -> StorageResult<Self> {
        if config.create_dirs {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        tracing::debug!(path = %path.display(), "opened JSON storage");

        Ok(Self {
            path: path.to_path_buf(),
            config,
            file: Mutex::new(Some(file)),
        })
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether the file handle has been released.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.file.lock().is_none()
    }

    fn encode(&self, data: &RawDatabase) -> StorageResult<Vec<u8>> {
        let value = if self.config.sort_keys {
            sorted(Value::Object(data.clone()))
        } else {
            Value::Object(data.clone())
        };

        let mut buffer = Vec::new();
        match self.config.indent {
            Some(spaces) => {
                let indent = vec![b' '; spaces];
                let formatter = PrettyFormatter::with_indent(&indent);
                let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
                value.serialize(&mut serializer)?;
            }
            None => serde_json::to_writer(&mut buffer, &value)?,
        }
        Ok(buffer)
    }
}

/// Rebuilds every object in `value` with its keys in ascending order.
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Storage for JsonStorage {
    fn read(&self) -> StorageResult<Option<RawDatabase>> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(StorageError::Closed)?;

        file.seek(SeekFrom::Start(0))?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(Some(map)),
            other => Err(StorageError::InvalidLayout(format!(
                "expected an object at the top level of {}, found {}",
                self.path.display(),
                kind(&other)
            ))),
        }
    }

    fn write(&self, data: &RawDatabase) -> StorageResult<()> {
        let bytes = self.encode(data)?;

        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(StorageError::Closed)?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&bytes)?;
        file.flush()?;
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        let mut guard = self.file.lock();
        let file = guard.as_mut().ok_or(StorageError::Closed)?;
        file.flush()?;
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        if let Some(file) = self.file.lock().take() {
            file.sync_all()?;
            tracing::debug!(path = %self.path.display(), "closed JSON storage");
        }
        Ok(())
    }
}
