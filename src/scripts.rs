//! The script subsystem
//!
//! [`Scripts`] is created once at start-up. It owns the storage tiers, the
//! store, and the shared JavaScript heap, and exposes the three ways a
//! script gets run:
//!
//! - [`Scripts::run`]: by name or path (the `script` and `.` commands)
//! - [`Scripts::run_event`]: every script registered for an event
//! - [`Scripts::evaluate`]: a short JavaScript expression (diagnostics)
//!
//! # Mutual Exclusion
//!
//! The heap sits in a `RefCell`. Only one evaluation can borrow it at a
//! time; a nested attempt reports "engine busy" instead of touching a heap
//! that is mid-evaluation.

#[cfg(feature = "javascript")]
use std::cell::RefCell;
use std::fmt;

use tracing::{debug, info};

use crate::command::{CommandRegistry, Invocation, ShellProvider};
use crate::config::ScriptsConfig;
use crate::dispatcher::ScriptDispatcher;
#[cfg(feature = "javascript")]
use crate::engine::ScriptEngineContext;
use crate::error::{Result, ScriptError};
use crate::events::{EventScriptScanner, EventScripts};
use crate::host::Host;
use crate::resolver::{PathResolver, ResolvedScript};
use crate::sink::{LogSink, OutputSink};
use crate::store::{FsStore, ScriptStore};
use crate::types::ScriptRequest;

/// Script resolution and execution for one process.
pub struct Scripts {
    config: ScriptsConfig,
    store: Box<dyn ScriptStore>,
    resolver: PathResolver,
    #[cfg(feature = "javascript")]
    engine: Option<RefCell<ScriptEngineContext>>,
}

impl fmt::Debug for Scripts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scripts")
            .field("tiers", &self.resolver.tiers())
            .field("javascript", &self.has_engine())
            .finish_non_exhaustive()
    }
}

impl Scripts {
    /// Subsystem on the local filesystem.
    pub fn new(config: ScriptsConfig) -> Result<Self> {
        Self::with_store(config, Box::new(FsStore))
    }

    /// Subsystem over any store.
    ///
    /// # Errors
    ///
    /// [`ScriptError::Engine`] if the JavaScript heap cannot be created.
    pub fn with_store(config: ScriptsConfig, store: Box<dyn ScriptStore>) -> Result<Self> {
        info!("Initialising scripts");
        let resolver = PathResolver::new(config.tiers());

        #[cfg(feature = "javascript")]
        let engine = if config.javascript {
            Some(RefCell::new(ScriptEngineContext::new(
                config.engine_memory_limit,
                config.max_script_output,
            )?))
        } else {
            info!("No javascript engines enabled (command scripting only)");
            None
        };
        #[cfg(not(feature = "javascript"))]
        if config.javascript {
            info!("Built without a javascript engine (command scripting only)");
        }

        Ok(Self {
            config,
            store,
            resolver,
            #[cfg(feature = "javascript")]
            engine,
        })
    }

    pub fn config(&self) -> &ScriptsConfig {
        &self.config
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Whether `.js` scripts can run.
    pub fn has_engine(&self) -> bool {
        #[cfg(feature = "javascript")]
        {
            self.engine.is_some()
        }
        #[cfg(not(feature = "javascript"))]
        {
            false
        }
    }

    /// Resolve a script name against the configured tiers.
    pub fn resolve(&self, name: &str) -> Result<ResolvedScript> {
        self.resolver.resolve(self.store.as_ref(), name)
    }

    /// Dispatcher wired to this subsystem's engine and limits.
    pub fn dispatcher<'a>(&'a self, shells: &'a dyn ShellProvider) -> ScriptDispatcher<'a> {
        let dispatcher = ScriptDispatcher::new(shells, self.config.max_line_length);
        #[cfg(feature = "javascript")]
        let dispatcher = match &self.engine {
            Some(engine) => dispatcher.with_engine(engine, self.config.max_script_size),
            None => dispatcher,
        };
        dispatcher
    }

    /// Resolve and run a script.
    ///
    /// Every failure, including "not found", is also reported to `sink`.
    pub fn run(
        &self,
        request: &ScriptRequest,
        sink: &mut dyn OutputSink,
        shells: &dyn ShellProvider,
    ) -> Result<()> {
        let script = match self.resolve(&request.name) {
            Ok(script) => script,
            Err(e) => {
                sink.puts(&e.sink_message());
                return Err(e);
            }
        };
        self.dispatcher(shells).dispatch(script, request, sink)
    }

    /// Openable scripts registered for `event`, across all tiers.
    pub fn event_scripts(&self, event: &str) -> Result<EventScripts<'_>> {
        EventScriptScanner::new(self.store.as_ref(), self.resolver.tiers()).scan(event)
    }

    /// Run all scripts for `event` unattended: minimal verbosity, no echo,
    /// secure mode, output to the log. Returns the number dispatched.
    ///
    /// A failing script never stops the remaining ones.
    pub fn run_event(&self, event: &str, shells: &dyn ShellProvider) -> usize {
        let scripts = match self.event_scripts(event) {
            Ok(scripts) => scripts,
            Err(e) => {
                debug!("Event {} not scanned: {}", event, e);
                return 0;
            }
        };

        let dispatcher = self.dispatcher(shells);
        let mut dispatched = 0;
        for script in scripts {
            let name = script.path.to_string_lossy().into_owned();
            info!("Running script {}", name);
            let request = ScriptRequest::unattended(name.as_str());
            let mut sink = LogSink::new(name.as_str());
            if let Err(e) = dispatcher.dispatch(script, &request, &mut sink) {
                debug!("Event script {} failed: {}", name, e);
            }
            dispatched += 1;
        }
        dispatched
    }

    /// Evaluate a JavaScript expression and return its numeric value.
    pub fn evaluate(&self, expression: &str) -> Result<f64> {
        #[cfg(feature = "javascript")]
        {
            let engine = self.engine.as_ref().ok_or(ScriptError::EngineUnavailable)?;
            let mut engine = engine
                .try_borrow_mut()
                .map_err(|_| ScriptError::EngineBusy)?;
            engine.evaluate_number(expression)
        }
        #[cfg(not(feature = "javascript"))]
        {
            let _ = expression;
            Err(ScriptError::EngineUnavailable)
        }
    }
}

/// Register `script` and `.`.
pub fn register_commands(commands: &mut CommandRegistry) {
    commands.register_command("script", "Run a script", Some(script_run), "<path>", 1, 1, true);
    commands.register_command(".", "Run a script", Some(script_run), "<path>", 1, 1, true);
}

fn script_run(host: &Host, inv: &mut Invocation<'_>) {
    let request = ScriptRequest::interactive(inv.args[0].as_str(), inv.verbosity, inv.secure);
    // Failures were already reported to the writer
    let _ = host.scripts().run(&request, inv.writer, host);
}
