//! Command registration and the line shell
//!
//! Scripts are executed *through* the command interpreter, so the crate
//! carries a small one: a tree of registered commands with help text,
//! argument bounds and a secure flag, and a [`LineShell`] that turns a
//! character stream into command invocations.
//!
//! # Shell Contract
//!
//! The command script runner only relies on [`CommandShell`]:
//!
//! - `set_secure()` is called before any input is processed
//! - `process_chars()` receives raw input, line terminators included
//! - all output goes to the sink passed with the input

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::host::Host;
use crate::sink::OutputSink;
use crate::types::Verbosity;

/// A line interpreter fed with raw characters.
pub trait CommandShell {
    /// Allow or deny secure-only commands for all following input.
    fn set_secure(&mut self, secure: bool);

    /// Consume input; complete lines are executed as they arrive.
    fn process_chars(&mut self, chars: &[u8], out: &mut dyn OutputSink);
}

/// Creates fresh shells for script execution.
pub trait ShellProvider {
    fn new_shell(&self, verbosity: Verbosity) -> Box<dyn CommandShell + '_>;
}

/// Command implementation.
pub type CommandHandler = fn(&Host, &mut Invocation<'_>);

/// Everything a handler gets to see about one call.
pub struct Invocation<'a> {
    /// Command name as registered (`cantx` and `canrx` may share a handler)
    pub name: &'a str,
    pub args: &'a [String],
    pub verbosity: Verbosity,
    pub secure: bool,
    pub writer: &'a mut dyn OutputSink,
}

/// One node of the command tree.
pub struct Command {
    name: String,
    title: String,
    usage: String,
    min_args: usize,
    max_args: usize,
    secure: bool,
    handler: Option<CommandHandler>,
    children: BTreeMap<String, Command>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("usage", &self.usage)
            .field("args", &(self.min_args..=self.max_args))
            .field("secure", &self.secure)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Command {
    fn new(
        name: &str,
        title: &str,
        handler: Option<CommandHandler>,
        usage: &str,
        min_args: usize,
        max_args: usize,
        secure: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            usage: usage.to_string(),
            min_args,
            max_args,
            secure,
            handler,
            children: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn subcommand(&self, name: &str) -> Option<&Command> {
        self.children.get(name)
    }

    /// Register a subcommand and return it for further nesting.
    pub fn register_command(
        &mut self,
        name: &str,
        title: &str,
        handler: Option<CommandHandler>,
        usage: &str,
        min_args: usize,
        max_args: usize,
        secure: bool,
    ) -> &mut Command {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| Command::new(name, title, handler, usage, min_args, max_args, secure))
    }
}

/// Root of the command tree.
#[derive(Debug)]
pub struct CommandRegistry {
    root: Command,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            root: Command::new("", "", None, "", 0, 0, false),
        }
    }

    /// Register a top-level command.
    ///
    /// Registering an existing name returns the existing node unchanged.
    pub fn register_command(
        &mut self,
        name: &str,
        title: &str,
        handler: Option<CommandHandler>,
        usage: &str,
        min_args: usize,
        max_args: usize,
        secure: bool,
    ) -> &mut Command {
        self.root
            .register_command(name, title, handler, usage, min_args, max_args, secure)
    }

    pub fn find(&self, name: &str) -> Option<&Command> {
        self.root.subcommand(name)
    }

    /// Write one line per top-level command: name and title.
    pub fn render_help(&self, out: &mut dyn OutputSink) {
        let width = self.root.children.keys().map(String::len).max().unwrap_or(0);
        for command in self.root.children.values() {
            out.printf(format_args!(
                "{:<width$}  {}\n",
                command.name,
                command.title,
                width = width
            ));
        }
    }

    /// Execute a tokenised command line.
    ///
    /// Returns `true` when a handler ran. Every failure is reported to `out`.
    pub fn execute(
        &self,
        host: &Host,
        words: &[String],
        verbosity: Verbosity,
        secure: bool,
        out: &mut dyn OutputSink,
    ) -> bool {
        let Some(first) = words.first() else {
            return false;
        };
        let Some(mut command) = self.root.subcommand(first) else {
            out.printf(format_args!("Unrecognised command: {}\n", first));
            return false;
        };
        let mut path = vec![first.as_str()];
        let mut rest = &words[1..];

        while let Some(child) = rest.first().and_then(|w| command.subcommand(w)) {
            path.push(child.name.as_str());
            command = child;
            rest = &rest[1..];
        }

        if command.secure && !secure {
            out.puts("Error: Secure mode required");
            return false;
        }

        let Some(handler) = command.handler else {
            match rest.first() {
                Some(word) => {
                    out.printf(format_args!("Unrecognised command: {} {}\n", path.join(" "), word))
                }
                None => out.printf(format_args!(
                    "Usage: {} <{}>\n",
                    path.join(" "),
                    command.children.keys().cloned().collect::<Vec<_>>().join("|")
                )),
            };
            return false;
        };

        if rest.len() < command.min_args || rest.len() > command.max_args {
            out.printf(format_args!("Usage: {} {}\n", path.join(" "), command.usage));
            return false;
        }

        debug!("Executing command: {} {:?}", path.join(" "), rest);
        let mut invocation = Invocation {
            name: &command.name,
            args: rest,
            verbosity,
            secure,
            writer: out,
        };
        handler(host, &mut invocation);
        true
    }
}

/// Split a command line into words. Double quotes group words and are
/// removed; there are no escapes.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_word = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Shell executing registered commands line by line.
pub struct LineShell<'a> {
    host: &'a Host,
    verbosity: Verbosity,
    secure: bool,
    line: Vec<u8>,
}

impl<'a> LineShell<'a> {
    pub fn new(host: &'a Host, verbosity: Verbosity) -> Self {
        Self {
            host,
            verbosity,
            secure: false,
            line: Vec::new(),
        }
    }

    fn execute_line(&mut self, out: &mut dyn OutputSink) {
        let raw = std::mem::take(&mut self.line);
        let text = String::from_utf8_lossy(&raw);
        let text = text.trim();
        if text.is_empty() || text.starts_with('#') {
            return;
        }
        let words = tokenize(text);
        self.host
            .commands()
            .execute(self.host, &words, self.verbosity, self.secure, out);
    }
}

impl CommandShell for LineShell<'_> {
    fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    fn process_chars(&mut self, chars: &[u8], out: &mut dyn OutputSink) {
        for &byte in chars {
            match byte {
                b'\n' | b'\r' => self.execute_line(out),
                _ => self.line.push(byte),
            }
        }
    }
}
