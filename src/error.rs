//! Error handling module for script dispatch
//!
//! Provides the error taxonomy for resolving and running scripts using thiserror.
//! Every dispatch-level failure is reported to the caller's output sink as
//! human-readable text; none of them are fatal to the process.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for script dispatch
#[derive(Error, Debug)]
pub enum ScriptError {
    /// No storage tier yields a readable file for the requested name
    #[error("Script not found: {name}")]
    NotFound { name: String },

    /// A `.js` script was requested but no JavaScript engine is available
    #[error("No javascript engine available")]
    EngineUnavailable,

    /// The JavaScript heap is already running an evaluation
    #[error("Javascript engine busy")]
    EngineBusy,

    /// Script source exceeds the configured load limit
    #[error("Script too large: {} ({size} bytes, limit {limit})", path.display())]
    ScriptTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    /// Event name would escape the event directory
    #[error("Invalid event name: {0:?}")]
    InvalidEventName(String),

    /// JavaScript engine errors (heap creation, interactive evaluation)
    #[error("Javascript error: {0}")]
    Engine(String),

    /// IO errors (open, read, directory listing)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, validation)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for script operations
pub type Result<T> = std::result::Result<T, ScriptError>;

impl ScriptError {
    /// Create a not-found error for a script name
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The one-line message written to an output sink for this failure.
    pub fn sink_message(&self) -> String {
        match self {
            Self::NotFound { .. } => "Error: Script not found".to_string(),
            Self::EngineUnavailable => "Error: No javascript engine available".to_string(),
            Self::EngineBusy => "Error: Javascript engine busy".to_string(),
            Self::ScriptTooLarge { size, limit, .. } => {
                format!("Error: Script too large ({} bytes, limit {})", size, limit)
            }
            other => format!("Error: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScriptError::not_found("boot.ovms");
        assert_eq!(err.to_string(), "Script not found: boot.ovms");

        let err = ScriptError::config("max_line_length must be at least 2");
        assert_eq!(
            err.to_string(),
            "Configuration error: max_line_length must be at least 2"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScriptError = io_err.into();
        assert!(matches!(err, ScriptError::Io(_)));
    }

    #[test]
    fn test_sink_messages() {
        assert_eq!(
            ScriptError::not_found("x").sink_message(),
            "Error: Script not found"
        );
        assert_eq!(
            ScriptError::EngineUnavailable.sink_message(),
            "Error: No javascript engine available"
        );
        let err = ScriptError::ScriptTooLarge {
            path: PathBuf::from("/store/scripts/big.js"),
            size: 70000,
            limit: 65536,
        };
        assert_eq!(
            err.sink_message(),
            "Error: Script too large (70000 bytes, limit 65536)"
        );
    }
}
