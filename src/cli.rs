use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::Verbosity;

/// OVMS script runner - run command scripts, JavaScript and event scripts
#[derive(Parser)]
#[command(name = "ovms-script")]
#[command(about = "Run OVMS command scripts, JavaScript files and event scripts")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON configuration file (storage roots, engine, limits)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output verbosity passed to commands (minimal, small, normal, verbose)
    #[arg(short, long, global = true, default_value = "normal")]
    pub verbosity: Verbosity,

    /// Run without secure mode: secure-only commands are refused.
    #[arg(long, global = true)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script by name or absolute path
    Run {
        /// Script name (searched on each storage tier) or absolute path
        path: String,
    },
    /// Fire an event, running every script in its event directories
    Event {
        /// Event name (e.g. vehicle.locked)
        name: String,
    },
    /// Evaluate a JavaScript expression and print its numeric value
    Eval {
        /// Expression to evaluate (e.g. "1+2")
        expression: String,
    },
    /// Execute a single command line
    Exec {
        /// Command words (e.g. test chargen 5)
        #[arg(required = true, trailing_var_arg = true)]
        words: Vec<String>,
    },
    /// Interactive command console on stdin
    Console,
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
    /// List registered commands
    HelpCommands,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
