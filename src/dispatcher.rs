//! Script dispatch: classify, run, close.
//!
//! The dispatcher takes ownership of a [`ResolvedScript`], so its file
//! handle is closed exactly once whichever way the run ends: the runner
//! consumes it, or the dispatcher drops it when no engine can take it.

#[cfg(feature = "javascript")]
use std::cell::RefCell;

use tracing::debug;

use crate::classify::classify;
use crate::command::ShellProvider;
#[cfg(feature = "javascript")]
use crate::engine::ScriptEngineContext;
use crate::error::{Result, ScriptError};
use crate::resolver::ResolvedScript;
use crate::runner::BufferedCommandRunner;
#[cfg(feature = "javascript")]
use crate::runner::ScriptLanguageRunner;
use crate::sink::OutputSink;
use crate::types::{EngineKind, ScriptRequest};

/// Routes resolved scripts to the matching runner.
pub struct ScriptDispatcher<'a> {
    shells: &'a dyn ShellProvider,
    commands: BufferedCommandRunner,
    #[cfg(feature = "javascript")]
    engine: Option<&'a RefCell<ScriptEngineContext>>,
    #[cfg(feature = "javascript")]
    javascript: ScriptLanguageRunner,
}

impl<'a> ScriptDispatcher<'a> {
    /// Dispatcher for command scripts only; `.js` scripts report that no
    /// engine is available.
    pub fn new(shells: &'a dyn ShellProvider, max_line_length: usize) -> Self {
        Self {
            shells,
            commands: BufferedCommandRunner::new(max_line_length),
            #[cfg(feature = "javascript")]
            engine: None,
            #[cfg(feature = "javascript")]
            javascript: ScriptLanguageRunner::new(0),
        }
    }

    /// Attach the shared JavaScript heap.
    #[cfg(feature = "javascript")]
    pub fn with_engine(
        mut self,
        engine: &'a RefCell<ScriptEngineContext>,
        max_script_size: u64,
    ) -> Self {
        self.engine = Some(engine);
        self.javascript = ScriptLanguageRunner::new(max_script_size);
        self
    }

    /// Run `script` with the engine its name selects.
    ///
    /// Failures are written to `sink` as a one-line message and returned.
    pub fn dispatch(
        &self,
        script: ResolvedScript,
        request: &ScriptRequest,
        sink: &mut dyn OutputSink,
    ) -> Result<()> {
        let kind = classify(&script.path);
        debug!("Dispatching {} as {}", script.path.display(), kind);

        let outcome = match kind {
            EngineKind::CommandScript => {
                let mut shell = self.shells.new_shell(request.verbosity);
                self.commands
                    .run(script, shell.as_mut(), request, sink)
                    .map(|_| ())
                    .map_err(ScriptError::from)
            }
            EngineKind::JavaScript => self.run_javascript(script, sink),
        };

        if let Err(e) = &outcome {
            sink.puts(&e.sink_message());
        }
        outcome
    }

    #[cfg(feature = "javascript")]
    fn run_javascript(&self, script: ResolvedScript, sink: &mut dyn OutputSink) -> Result<()> {
        let Some(engine) = self.engine else {
            drop(script);
            return Err(ScriptError::EngineUnavailable);
        };
        let mut engine = engine
            .try_borrow_mut()
            .map_err(|_| ScriptError::EngineBusy)?;
        self.javascript.run(script, &mut engine, sink)
    }

    #[cfg(not(feature = "javascript"))]
    fn run_javascript(&self, script: ResolvedScript, _sink: &mut dyn OutputSink) -> Result<()> {
        drop(script);
        Err(ScriptError::EngineUnavailable)
    }
}
