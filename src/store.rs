//! Storage access for scripts
//!
//! The resolver and event scanner only ever open files and list directories,
//! so storage is reduced to the [`ScriptStore`] trait. [`FsStore`] backs it
//! with `std::fs`; tests substitute an in-memory store.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// An open, readable script file. Dropping it closes the handle.
pub trait ScriptSource: Read {
    /// Total length of the source in bytes.
    fn size(&mut self) -> io::Result<u64>;
}

impl ScriptSource for File {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

/// File access used by script resolution and event scanning.
pub trait ScriptStore {
    /// Open a regular file for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn ScriptSource>>;

    /// List the entries of a directory (non-recursive, unordered).
    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// [`ScriptStore`] over the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl ScriptStore for FsStore {
    fn open(&self, path: &Path) -> io::Result<Box<dyn ScriptSource>> {
        // The device filesystem cannot fopen() a directory; keep that behaviour
        if fs::metadata(path)?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is a directory", path.display()),
            ));
        }
        Ok(Box::new(File::open(path)?))
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }
}
