//! Execution engines behind the dispatcher.

pub mod command;
#[cfg(feature = "javascript")]
pub mod javascript;

pub use command::{BufferedCommandRunner, CommandRunStats};
#[cfg(feature = "javascript")]
pub use javascript::ScriptLanguageRunner;
