//! OVMS script runner - Main entry point
//!
//! Runs scripts, events and single commands against the local filesystem,
//! or drops into an interactive command console.

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Context;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use ovms_script::cli::{Cli, Commands};
use ovms_script::{ConsoleSink, Host, OutputSink, ScriptRequest, ScriptsConfig, Verbosity};

/// Initialize the logger with appropriate settings
fn init_logger() {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Main application entry point
fn main() {
    init_logger();
    info!("OVMS script runner starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        config,
        verbosity,
        insecure,
        command,
    } = cli;
    let secure = !insecure;
    let host = || -> anyhow::Result<Host> {
        let config = load_config(config.as_deref())?;
        Host::new(config).context("Failed to initialise scripts")
    };

    match command {
        Commands::Validate { config } => validate_config(&config)?,
        Commands::Run { path } => {
            let host = host()?;
            let mut sink = ConsoleSink::new(secure);
            let request = ScriptRequest::interactive(path, verbosity, secure);
            host.scripts().run(&request, &mut sink, &host)?;
        }
        Commands::Event { name } => {
            let count = host()?.fire_event(&name);
            println!("✓ Event {} ran {} script(s)", name, count);
        }
        Commands::Eval { expression } => {
            let value = host()?.scripts().evaluate(&expression)?;
            println!("{}", value);
        }
        Commands::Exec { words } => {
            let mut sink = ConsoleSink::new(secure);
            host()?.execute_line(&quote_words(&words), verbosity, &mut sink);
        }
        Commands::Console => run_console(&host()?, verbosity, secure)?,
        Commands::HelpCommands => {
            let mut sink = ConsoleSink::new(secure);
            host()?.commands().render_help(&mut sink);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ScriptsConfig> {
    let config = match path {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            ScriptsConfig::load_from_file(path)?
        }
        None => ScriptsConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn validate_config(path: &Path) -> anyhow::Result<()> {
    info!("Validating configuration file: {:?}", path);
    let config = ScriptsConfig::load_from_file(path)?;
    config.validate()?;
    info!("Configuration validation successful");
    println!("✓ Configuration file is valid: {:?}", path);
    for tier in config.tiers() {
        println!("  {} -> {}", tier.name, tier.scripts_dir().display());
    }
    Ok(())
}

/// Re-join words for the line shell, quoting any that contain whitespace.
fn quote_words(words: &[String]) -> String {
    words
        .iter()
        .map(|w| {
            if w.chars().any(char::is_whitespace) {
                format!("\"{}\"", w)
            } else {
                w.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Interactive console: one command per line until EOF or `exit`.
///
/// While a command holds an insertion hook (e.g. `test echo`), typed
/// characters go to the hook instead of the shell.
fn run_console(host: &Host, verbosity: Verbosity, secure: bool) -> anyhow::Result<()> {
    let mut sink = ConsoleSink::new(secure);
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        if !sink.has_insert_callback() {
            print!("OVMS# ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read console input")?;

        if sink.has_insert_callback() {
            for ch in line.chars().chain(std::iter::once('\n')) {
                if !sink.insert(ch) {
                    break;
                }
                if !sink.has_insert_callback() {
                    sink.write(b"\n");
                    break;
                }
            }
            continue;
        }

        match line.trim() {
            "exit" | "quit" => break,
            _ => host.execute_line(&line, verbosity, &mut sink),
        }
    }

    debug!("Console closed");
    Ok(())
}
