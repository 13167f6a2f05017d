//! Script name resolution across storage tiers.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::config::StorageTier;
use crate::error::{Result, ScriptError};
use crate::store::{ScriptSource, ScriptStore};

/// An opened script and the path it was found at.
///
/// Owning this value means owning the file handle: it is closed when the
/// value (or its `source`) is dropped.
pub struct ResolvedScript {
    pub path: PathBuf,
    pub source: Box<dyn ScriptSource>,
}

impl ResolvedScript {
    pub fn new(path: impl Into<PathBuf>, source: Box<dyn ScriptSource>) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Debug for ResolvedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedScript")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Turns script names into open files.
///
/// Absolute names are opened as given. Relative names are tried against each
/// tier's script directory in order; the first tier that opens wins.
#[derive(Debug, Clone)]
pub struct PathResolver {
    tiers: Vec<StorageTier>,
}

impl PathResolver {
    pub fn new(tiers: Vec<StorageTier>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[StorageTier] {
        &self.tiers
    }

    /// Resolve and open `name`.
    ///
    /// # Errors
    ///
    /// [`ScriptError::NotFound`] when no candidate path could be opened.
    pub fn resolve(&self, store: &dyn ScriptStore, name: &str) -> Result<ResolvedScript> {
        if name.starts_with('/') {
            let path = Path::new(name);
            return match store.open(path) {
                Ok(source) => Ok(ResolvedScript::new(path, source)),
                Err(e) => {
                    debug!("Script {} not opened: {}", name, e);
                    Err(ScriptError::not_found(name))
                }
            };
        }

        for tier in &self.tiers {
            let path = tier.scripts_dir().join(name);
            match store.open(&path) {
                Ok(source) => {
                    trace!("Resolved {} on tier {} as {}", name, tier.name, path.display());
                    return Ok(ResolvedScript::new(path, source));
                }
                Err(e) => trace!("Tier {} has no {}: {}", tier.name, path.display(), e),
            }
        }

        debug!("Script {} not found on any of {} tier(s)", name, self.tiers.len());
        Err(ScriptError::not_found(name))
    }
}
