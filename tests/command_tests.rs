//! `script`, `.` and `test` commands through the host's line shell

mod common;

use common::{MemoryStore, two_tier_config};
use ovms_script::{BufferSink, Host, Invocation, ScriptRequest, Scripts, Verbosity};

fn host(store: &MemoryStore) -> Host {
    let scripts = Scripts::with_store(two_tier_config(false), Box::new(store.clone())).unwrap();
    Host::with_scripts(scripts)
}

fn run_line(host: &Host, line: &str, secure: bool) -> String {
    let mut out = BufferSink::with_secure(secure);
    host.execute_line(line, Verbosity::Normal, &mut out);
    out.contents()
}

#[test]
fn test_script_and_dot_commands() {
    let store = MemoryStore::new();
    store.add("/sd/scripts/cmp.ovms", "test strverscmp 3.1.10 3.1.9\n");
    let host = host(&store);

    assert_eq!(run_line(&host, "script cmp.ovms", true), "3.1.10 > 3.1.9\n");
    assert_eq!(run_line(&host, ". cmp.ovms", true), "3.1.10 > 3.1.9\n");
    assert_eq!(store.closed(), 2);
}

#[test]
fn test_script_command_requires_secure_mode() {
    let store = MemoryStore::new();
    store.add("/sd/scripts/cmp.ovms", "test strverscmp 1 2\n");
    let host = host(&store);

    assert_eq!(run_line(&host, "script cmp.ovms", false), "Error: Secure mode required\n");
    assert!(store.attempts().is_empty());
}

#[test]
fn test_script_command_usage() {
    let store = MemoryStore::new();
    let host = host(&store);

    assert_eq!(run_line(&host, "script", true), "Usage: script <path>\n");
    assert_eq!(run_line(&host, "script a b", true), "Usage: script <path>\n");
}

#[test]
fn test_script_command_not_found() {
    let store = MemoryStore::new();
    let host = host(&store);

    assert_eq!(run_line(&host, "script nope.ovms", true), "Error: Script not found\n");
}

#[test]
fn test_nested_command_scripts() {
    let store = MemoryStore::new();
    store.add("/store/scripts/outer.ovms", "test strverscmp 1 1\n. inner.ovms\n");
    store.add("/sd/scripts/inner.ovms", "test strverscmp 2 1\n");
    let host = host(&store);

    assert_eq!(run_line(&host, "script outer.ovms", true), "1 = 1\n2 > 1\n");
    assert_eq!(store.closed(), 2);
}

#[test]
fn test_insecure_script_refuses_secure_lines() {
    let store = MemoryStore::new();
    store.add("/store/scripts/open.ovms", "test strverscmp 1 2\nhelp\n");
    let host = host(&store);

    let mut out = BufferSink::new();
    let request = ScriptRequest::interactive("open.ovms", Verbosity::Normal, false);
    host.scripts().run(&request, &mut out, &host).unwrap();

    let text = out.contents();
    assert!(text.starts_with("Error: Secure mode required\n"));
    assert!(text.contains("script"));
}

#[test]
fn test_unknown_command() {
    let store = MemoryStore::new();
    let host = host(&store);

    assert_eq!(run_line(&host, "frobnicate now", true), "Unrecognised command: frobnicate\n");
    assert_eq!(
        run_line(&host, "test", true),
        "Usage: test <chargen|echo|javascript|strverscmp>\n"
    );
}

#[test]
fn test_javascript_diagnostic_without_engine() {
    let store = MemoryStore::new();
    let host = host(&store);

    assert_eq!(run_line(&host, "test javascript", true), "No javascript engine enabled\n");
}

#[cfg(feature = "javascript")]
#[test]
fn test_javascript_diagnostic() {
    let store = MemoryStore::new();
    let scripts = Scripts::with_store(two_tier_config(true), Box::new(store)).unwrap();
    let host = Host::with_scripts(scripts);

    assert_eq!(run_line(&host, "test javascript", true), "Javascript 1+2=3\n");
}

#[test]
fn test_echo_needs_interactive_sink() {
    let store = MemoryStore::new();
    let host = host(&store);

    assert_eq!(
        run_line(&host, "test echo", true),
        "Error: echo needs an interactive session\n"
    );
}

#[test]
fn test_chargen_line_count() {
    let store = MemoryStore::new();
    let host = host(&store);

    let text = run_line(&host, "test chargen 3", true);
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().all(|l| l.len() == 72));
}

fn greet(_host: &Host, inv: &mut Invocation<'_>) {
    inv.writer.printf(format_args!("hello {}\n", inv.args.join(" ")));
}

#[test]
fn test_registered_extension_commands_run_from_scripts() {
    let store = MemoryStore::new();
    store.add("/store/scripts/greet.ovms", "greet \"big world\"\n");
    let mut host = host(&store);
    host.commands_mut()
        .register_command("greet", "Say hello", Some(greet), "<name>", 1, 1, false);

    assert_eq!(run_line(&host, "script greet.ovms", true), "hello big world\n");
    assert_eq!(run_line(&host, "greet you", false), "hello you\n");
}
