//! Host wiring: the command registry plus the script subsystem.

use tracing::info;

use crate::command::{CommandRegistry, CommandShell, Invocation, LineShell, ShellProvider};
use crate::config::ScriptsConfig;
use crate::diagnostics;
use crate::error::Result;
use crate::scripts::{self, Scripts};
use crate::sink::OutputSink;
use crate::types::Verbosity;

/// Owns everything needed to run commands and scripts.
#[derive(Debug)]
pub struct Host {
    commands: CommandRegistry,
    scripts: Scripts,
}

impl Host {
    /// Build the script subsystem from `config` on the local filesystem.
    pub fn new(config: ScriptsConfig) -> Result<Self> {
        Ok(Self::with_scripts(Scripts::new(config)?))
    }

    /// Register the standard commands around an existing subsystem.
    pub fn with_scripts(scripts: Scripts) -> Self {
        let mut commands = CommandRegistry::new();
        commands.register_command("help", "Show available commands", Some(help), "", 0, 0, false);
        scripts::register_commands(&mut commands);
        diagnostics::register_commands(&mut commands);
        Self { commands, scripts }
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Register additional commands (shell extensions, tests).
    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    pub fn scripts(&self) -> &Scripts {
        &self.scripts
    }

    /// Execute one command line, with secure mode taken from `out`.
    pub fn execute_line(&self, line: &str, verbosity: Verbosity, out: &mut dyn OutputSink) {
        let mut shell = LineShell::new(self, verbosity);
        shell.set_secure(out.is_secure());
        shell.process_chars(line.as_bytes(), out);
        shell.process_chars(b"\n", out);
    }

    /// Run every script registered for `event`. Returns how many ran.
    pub fn fire_event(&self, event: &str) -> usize {
        info!("Event {} fired", event);
        self.scripts.run_event(event, self)
    }
}

impl ShellProvider for Host {
    fn new_shell(&self, verbosity: Verbosity) -> Box<dyn CommandShell + '_> {
        Box::new(LineShell::new(self, verbosity))
    }
}

fn help(host: &Host, inv: &mut Invocation<'_>) {
    host.commands().render_help(inv.writer);
}
