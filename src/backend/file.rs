//! File-backed durable backend.
//!
//! All keys live in a single data file inside the backend directory:
//!
//! ```text
//! magic "HRD\0" | version u8 | body length u64 LE | MessagePack body | crc32 u32 LE
//! ```
//!
//! Writes go to a temp file which is synced and renamed over the data file,
//! so a crash mid-write leaves the previous contents intact.

use super::DurableBackend;
use crate::error::{Result, StoreError};
use fs2::FileExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Magic bytes for the data file.
const DATA_MAGIC: &[u8; 4] = b"HRD\0";

/// Current data file format version.
const DATA_VERSION: u8 = 1;

/// Magic, version and length prefix, plus the checksum trailer.
const FRAME_OVERHEAD: u64 = 4 + 1 + 8 + 4;

const DATA_FILE: &str = "durable.bin";
const TEMP_FILE: &str = "durable.bin.tmp";
const LOCK_FILE: &str = "LOCK";

/// File backend configuration.
#[derive(Clone, Debug)]
pub struct FileBackendConfig {
    /// Directory holding the data and lock files.
    pub path: PathBuf,

    /// Whether to create the directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./herald"),
            create_if_missing: true,
        }
    }
}

/// Durable backend persisting every key to one file on disk.
///
/// Holds an exclusive lock on the directory for its lifetime.
pub struct FileBackend {
    path: PathBuf,
    _lock_file: File,
    values: RwLock<HashMap<String, Value>>,
}

impl FileBackend {
    /// Open an existing backend directory or create a new one.
    pub fn open_or_create(config: FileBackendConfig) -> Result<Self> {
        if config.path.join(DATA_FILE).exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Create a new, empty backend.
    pub fn create(config: FileBackendConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        let lock_file = Self::acquire_lock(&config.path)?;

        let backend = Self {
            path: config.path,
            _lock_file: lock_file,
            values: RwLock::new(HashMap::new()),
        };
        backend.save(&backend.values.read())?;

        tracing::debug!(path = %backend.path.display(), "created file backend");
        Ok(backend)
    }

    /// Open an existing backend.
    pub fn open(config: FileBackendConfig) -> Result<Self> {
        let lock_file = Self::acquire_lock(&config.path)?;
        let values = Self::load(&config.path.join(DATA_FILE))?;

        tracing::debug!(
            path = %config.path.display(),
            keys = values.len(),
            "opened file backend"
        );

        Ok(Self {
            path: config.path,
            _lock_file: lock_file,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, values: &HashMap<String, Value>) -> Result<()> {
        let encoded = rmp_serde::to_vec(values)?;
        let checksum = crc32fast::hash(&encoded);

        let temp_path = self.path.join(TEMP_FILE);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        file.write_all(DATA_MAGIC)?;
        file.write_all(&[DATA_VERSION])?;
        file.write_all(&(encoded.len() as u64).to_le_bytes())?;
        file.write_all(&encoded)?;
        file.write_all(&checksum.to_le_bytes())?;
        file.sync_all()?;

        fs::rename(&temp_path, self.path.join(DATA_FILE))?;
        Ok(())
    }

    fn load(path: &Path) -> Result<HashMap<String, Value>> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != DATA_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid data file magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != DATA_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported data file version: {}",
                version[0]
            )));
        }

        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes);
        let available = file.metadata()?.len().saturating_sub(FRAME_OVERHEAD);
        if len > available {
            return Err(StoreError::InvalidFormat(format!(
                "Data file body length {} exceeds file size ({} bytes available)",
                len, available
            )));
        }

        let mut encoded = vec![0u8; len as usize];
        file.read_exact(&mut encoded)?;

        let mut checksum_bytes = [0u8; 4];
        file.read_exact(&mut checksum_bytes)?;
        let expected = u32::from_le_bytes(checksum_bytes);
        let got = crc32fast::hash(&encoded);
        if expected != got {
            return Err(StoreError::ChecksumMismatch { expected, got });
        }

        Ok(rmp_serde::from_slice(&encoded)?)
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join(LOCK_FILE))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;

        Ok(lock_file)
    }
}

impl DurableBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.values.write();
        let previous = values.insert(key.to_string(), value);
        if let Err(e) = self.save(&values) {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(old) => values.insert(key.to_string(), old),
                None => values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
