//! OVMS Script Library
//!
//! This library locates, classifies and runs scripts for the vehicle module:
//! command scripts fed line by line into the command shell, JavaScript files
//! evaluated on a shared QuickJS heap, and event scripts run in batches when
//! a system event fires.

pub mod classify;
pub mod cli;
pub mod command;
pub mod config;
pub mod diagnostics;
pub mod dispatcher;
#[cfg(feature = "javascript")]
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod resolver;
pub mod runner;
pub mod scripts;
pub mod sink;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use classify::classify;
pub use command::{CommandRegistry, CommandShell, Invocation, LineShell, ShellProvider};
pub use config::{ScriptsConfig, StorageTier};
pub use dispatcher::ScriptDispatcher;
#[cfg(feature = "javascript")]
pub use engine::ScriptEngineContext;
pub use error::{Result, ScriptError};
pub use events::{EventScriptScanner, EventScripts};
pub use host::Host;
pub use resolver::{PathResolver, ResolvedScript};
pub use runner::{BufferedCommandRunner, CommandRunStats};
#[cfg(feature = "javascript")]
pub use runner::ScriptLanguageRunner;
pub use scripts::Scripts;
pub use sink::{BufferSink, ConsoleSink, InsertCallback, LogSink, OutputSink};
pub use store::{FsStore, ScriptSource, ScriptStore};
pub use types::{EngineKind, ScriptRequest, Verbosity};
