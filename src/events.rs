//! Event script discovery
//!
//! When a system event fires, every readable file in
//! `<tier>/events/<event>/` on every tier is run. Discovery is a lazy
//! iterator: tiers are listed one at a time and entries are opened as the
//! consumer asks for them. Entries that cannot be opened (subdirectories,
//! unreadable files) and tiers without an event directory are skipped and
//! logged, never reported.
//!
//! Entry order is whatever the store returns.

use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::config::StorageTier;
use crate::error::{Result, ScriptError};
use crate::resolver::ResolvedScript;
use crate::store::ScriptStore;

/// Finds the scripts registered for an event.
#[derive(Clone, Copy)]
pub struct EventScriptScanner<'a> {
    store: &'a dyn ScriptStore,
    tiers: &'a [StorageTier],
}

impl<'a> EventScriptScanner<'a> {
    pub fn new(store: &'a dyn ScriptStore, tiers: &'a [StorageTier]) -> Self {
        Self { store, tiers }
    }

    /// Iterate over the openable scripts for `event`.
    ///
    /// # Errors
    ///
    /// [`ScriptError::InvalidEventName`] for names that are empty, `.`,
    /// `..` or contain a path separator.
    pub fn scan(&self, event: &str) -> Result<EventScripts<'a>> {
        validate_event_name(event)?;
        Ok(EventScripts {
            store: self.store,
            event: event.to_string(),
            tiers: self.tiers.iter(),
            pending: Vec::new().into_iter(),
        })
    }
}

fn validate_event_name(event: &str) -> Result<()> {
    if event.is_empty() || event == "." || event == ".." || event.contains(['/', '\\']) {
        warn!("Refusing to scan scripts for event {:?}", event);
        return Err(ScriptError::InvalidEventName(event.to_string()));
    }
    Ok(())
}

/// Iterator returned by [`EventScriptScanner::scan`].
pub struct EventScripts<'a> {
    store: &'a dyn ScriptStore,
    event: String,
    tiers: std::slice::Iter<'a, StorageTier>,
    pending: std::vec::IntoIter<PathBuf>,
}

impl EventScripts<'_> {
    /// Move on to the next tier that has an event directory.
    fn next_tier(&mut self) -> bool {
        for tier in self.tiers.by_ref() {
            let dir = tier.events_dir(&self.event);
            match self.store.list_dir(&dir) {
                Ok(entries) => {
                    trace!("{} has {} entries", dir.display(), entries.len());
                    self.pending = entries.into_iter();
                    return true;
                }
                Err(e) => trace!("No event directory {}: {}", dir.display(), e),
            }
        }
        false
    }
}

impl Iterator for EventScripts<'_> {
    type Item = ResolvedScript;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            for path in self.pending.by_ref() {
                match self.store.open(&path) {
                    Ok(source) => return Some(ResolvedScript::new(path, source)),
                    Err(e) => debug!("Skipping {}: {}", path.display(), e),
                }
            }
            if !self.next_tier() {
                return None;
            }
        }
    }
}
