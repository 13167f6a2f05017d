//! Shared fixtures for integration tests
//!
//! `MemoryStore` is an in-memory `ScriptStore` that records every open
//! attempt and counts how many opened sources have been dropped (closed).

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ovms_script::{OutputSink, ScriptSource, ScriptStore, ScriptsConfig};

#[derive(Clone, Default)]
pub struct MemoryStore {
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
    opened: Arc<Mutex<Vec<PathBuf>>>,
    attempts: Arc<Mutex<Vec<PathBuf>>>,
    closed: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, path: &str, content: &str) -> &Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.as_bytes().to_vec());
        self
    }

    /// Every path `open` was called with, in order.
    pub fn attempts(&self) -> Vec<PathBuf> {
        self.attempts.lock().unwrap().clone()
    }

    /// Paths that were opened successfully, in order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap()
            .keys()
            .any(|f| f != path && f.starts_with(path))
    }
}

impl ScriptStore for MemoryStore {
    fn open(&self, path: &Path) -> io::Result<Box<dyn ScriptSource>> {
        self.attempts.lock().unwrap().push(path.to_path_buf());
        if self.is_dir(path) {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "is a directory"));
        }
        let content = self
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(Box::new(MemorySource {
            data: Cursor::new(content),
            closed: Arc::clone(&self.closed),
        }))
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.is_dir(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such directory"));
        }
        let mut entries: Vec<PathBuf> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter_map(|f| {
                let rest = f.strip_prefix(path).ok()?;
                let first = rest.components().next()?;
                Some(path.join(first))
            })
            .collect();
        entries.dedup();
        Ok(entries)
    }
}

struct MemorySource {
    data: Cursor<Vec<u8>>,
    closed: Arc<AtomicUsize>,
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl ScriptSource for MemorySource {
    fn size(&mut self) -> io::Result<u64> {
        Ok(self.data.get_ref().len() as u64)
    }
}

impl Drop for MemorySource {
    fn drop(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sink recording each write separately.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub writes: Vec<Vec<u8>>,
    pub secure: bool,
}

impl RecordingSink {
    pub fn secure() -> Self {
        Self {
            writes: Vec::new(),
            secure: true,
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.writes.concat()).into_owned()
    }
}

impl OutputSink for RecordingSink {
    fn write(&mut self, buf: &[u8]) -> isize {
        self.writes.push(buf.to_vec());
        buf.len() as isize
    }

    fn is_secure(&self) -> bool {
        self.secure
    }
}

/// Two tiers (`/sd` then `/store`), JavaScript as requested.
pub fn two_tier_config(javascript: bool) -> ScriptsConfig {
    ScriptsConfig {
        removable_root: Some(PathBuf::from("/sd")),
        store_root: PathBuf::from("/store"),
        javascript,
        ..ScriptsConfig::default()
    }
}
