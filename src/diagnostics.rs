//! `test` diagnostic commands
//!
//! Small probes used during bring-up to exercise the script engine and
//! the output channel of the current session.

use std::cmp::Ordering;
use std::thread;
use std::time::Duration;

use crate::command::{CommandRegistry, Invocation};
use crate::host::Host;
use crate::sink::OutputSink;

/// Register the `test` command tree.
pub fn register_commands(commands: &mut CommandRegistry) {
    let test = commands.register_command("test", "Test framework", None, "", 0, 0, true);
    test.register_command("javascript", "Test Javascript", Some(test_javascript), "", 0, 0, true);
    test.register_command(
        "chargen",
        "Character generator [<#lines>] [<delay_ms>]",
        Some(test_chargen),
        "[<#lines>] [<delay_ms>]",
        0,
        2,
        true,
    );
    test.register_command("echo", "Test getchar", Some(test_echo), "", 0, 0, true);
    test.register_command(
        "strverscmp",
        "Test strverscmp function",
        Some(test_strverscmp),
        "<a> <b>",
        2,
        2,
        true,
    );
}

fn test_javascript(host: &Host, inv: &mut Invocation<'_>) {
    if !host.scripts().has_engine() {
        inv.writer.puts("No javascript engine enabled");
        return;
    }
    match host.scripts().evaluate("1+2") {
        Ok(value) => inv
            .writer
            .printf(format_args!("Javascript 1+2={}\n", value as i64)),
        Err(e) => inv.writer.puts(&e.sink_message()),
    };
}

/// RFC 864 style output: 72 printable characters per line, the first
/// character advancing by one on every line.
fn test_chargen(_host: &Host, inv: &mut Invocation<'_>) {
    let lines = inv.args.first().map_or(1000, |a| parse_count(a));
    let delay = inv.args.get(1).map_or(0, |a| parse_count(a));
    chargen(inv.writer, lines, Duration::from_millis(delay as u64));
}

fn parse_count(arg: &str) -> usize {
    arg.trim().parse().unwrap_or(0)
}

/// Write `lines` generator lines; stops early once the sink is closed.
pub fn chargen(out: &mut dyn OutputSink, lines: usize, delay: Duration) {
    let mut start = b'!';
    let mut buf = [0u8; 73];
    buf[72] = b'\n';
    for _ in 0..lines {
        let mut ch = start;
        for slot in buf.iter_mut().take(72) {
            *slot = ch;
            ch = if ch == 0x7E { b' ' } else { ch + 1 };
        }
        if out.write(&buf) <= 0 {
            break;
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        start = if start == 0x7E { b' ' } else { start + 1 };
    }
}

fn echo_insert(out: &mut dyn OutputSink, ch: char) -> bool {
    if ch == '\n' {
        return false;
    }
    let mut utf8 = [0u8; 4];
    out.write(ch.encode_utf8(&mut utf8).as_bytes());
    true
}

fn test_echo(_host: &Host, inv: &mut Invocation<'_>) {
    if inv.writer.register_insert_callback(Box::new(echo_insert)) {
        inv.writer.puts("Type characters to be echoed, end with newline.");
    } else {
        inv.writer.puts("Error: echo needs an interactive session");
    }
}

fn test_strverscmp(_host: &Host, inv: &mut Invocation<'_>) {
    let (a, b) = (&inv.args[0], &inv.args[1]);
    let sign = match version_compare(a, b) {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    };
    inv.writer.printf(format_args!("{} {} {}\n", a, sign, b));
}

/// Version-aware string comparison: runs of digits compare by numeric
/// value, everything else byte by byte. `"3.1.10" > "3.1.9"`.
pub fn version_compare(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let (a_end, b_end) = (digit_run_end(a, i), digit_run_end(b, j));
            let a_num = trim_leading_zeros(&a[i..a_end]);
            let b_num = trim_leading_zeros(&b[j..b_end]);
            let ordering = a_num
                .len()
                .cmp(&b_num.len())
                .then_with(|| a_num.cmp(b_num));
            if ordering != Ordering::Equal {
                return ordering;
            }
            i = a_end;
            j = b_end;
        } else {
            if a[i] != b[j] {
                return a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
    }
    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run_end(s: &[u8], from: usize) -> usize {
    s[from..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(s.len(), |p| from + p)
}

fn trim_leading_zeros(digits: &[u8]) -> &[u8] {
    let first = digits.iter().position(|&d| d != b'0').unwrap_or(digits.len());
    &digits[first..]
}
