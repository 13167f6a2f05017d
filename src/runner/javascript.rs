//! JavaScript file runner.

use std::io::Read;

use tracing::debug;

use crate::engine::ScriptEngineContext;
use crate::error::{Result, ScriptError};
use crate::resolver::ResolvedScript;
use crate::sink::OutputSink;

/// Loads a `.js` file and evaluates it on the shared heap.
#[derive(Debug, Clone, Copy)]
pub struct ScriptLanguageRunner {
    max_script_size: u64,
}

impl ScriptLanguageRunner {
    pub fn new(max_script_size: u64) -> Self {
        Self { max_script_size }
    }

    /// Load `script` into memory and run it, discarding its result.
    ///
    /// # Errors
    ///
    /// - [`ScriptError::ScriptTooLarge`] if the file exceeds the load limit
    ///   (nothing is read or evaluated)
    /// - [`ScriptError::Io`] if the file cannot be read
    ///
    /// Exceptions raised by the script are logged by the engine, not returned.
    pub fn run(
        &self,
        script: ResolvedScript,
        engine: &mut ScriptEngineContext,
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        let ResolvedScript { path, mut source } = script;

        let size = source.size()?;
        if size > self.max_script_size {
            return Err(ScriptError::ScriptTooLarge {
                path,
                size,
                limit: self.max_script_size,
            });
        }

        let mut text = Vec::with_capacity(size as usize);
        source.take(self.max_script_size).read_to_end(&mut text)?;

        debug!("Evaluating {} ({} bytes)", path.display(), text.len());
        engine.run(&path.to_string_lossy(), text, sink);
        Ok(())
    }
}
