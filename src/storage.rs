//! Key-value backends the transaction store persists through.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::error::TrackerError;

/// A local key-value store holding one text blob per key.
pub trait Storage {
    /// Returns `Ok(None)` when nothing has been stored under `key` yet.
    fn read(&self, key: &str) -> Result<Option<String>, TrackerError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), TrackerError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the directory if it does not exist yet.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TrackerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, TrackerError> {
        let path = self.path_for(key);
        debug!("Reading {key} from {path:?}");
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), TrackerError> {
        let path = self.path_for(key);
        let temp = self.dir.join(format!(".{key}.json.tmp"));

        debug!("Writing {key} to temporary file {temp:?}");
        let write_temp = || -> io::Result<()> {
            let mut file = BufWriter::new(File::create(&temp)?);
            file.write_all(value.as_bytes())?;
            file.flush()?;
            Ok(())
        };
        write_temp().map_err(|err| TrackerError::Persist(temp.clone(), err))?;

        debug!("Renaming {temp:?} to {path:?}");
        fs::rename(&temp, &path).map_err(|err| TrackerError::Persist(path, err))
    }
}

/// In-process storage. Counts writes and can be told to refuse them.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    writes: usize,
    fail_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut storage = Self::new();
        storage.entries.insert(key.to_string(), value.to_string());
        storage
    }

    /// Number of successful and failed write attempts so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, TrackerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), TrackerError> {
        self.writes += 1;
        if self.fail_writes {
            return Err(TrackerError::Persist(
                PathBuf::from(key),
                io::Error::other("storage quota exceeded"),
            ));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
