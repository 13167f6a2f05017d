//! Request types shared by the resolver, runners and dispatcher
//!
//! Verbosity and engine selection are proper enums rather than integer
//! levels and string suffix checks scattered through the code.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How much output a command should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Terse output for unattended or space-limited channels (SMS, events)
    Minimal,
    Small,
    #[default]
    Normal,
    Verbose,
}

/// Execution engine a script is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EngineKind {
    /// One interpreter command per line
    #[strum(serialize = "command script")]
    CommandScript,
    /// Evaluated on the shared JavaScript heap
    #[strum(serialize = "javascript")]
    JavaScript,
}

/// A single script invocation. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    /// Absolute path or name relative to the tier script directories
    pub name: String,
    pub verbosity: Verbosity,
    /// Surface command output after every line instead of once at the end
    pub print_immediately: bool,
    /// Whether secure-only commands may run
    pub secure: bool,
}

impl ScriptRequest {
    /// Request issued from a console or command: output is echoed unless the
    /// caller asked for minimal verbosity.
    pub fn interactive(name: impl Into<String>, verbosity: Verbosity, secure: bool) -> Self {
        Self {
            name: name.into(),
            verbosity,
            print_immediately: verbosity != Verbosity::Minimal,
            secure,
        }
    }

    /// Request for an event script: silent, minimal and always secure.
    pub fn unattended(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verbosity: Verbosity::Minimal,
            print_immediately: false,
            secure: true,
        }
    }
}
