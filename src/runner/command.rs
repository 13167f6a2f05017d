//! Command script runner
//!
//! Feeds a script into a [`CommandShell`] one physical line at a time and
//! batches everything the shell prints.
//!
//! # Output Batching
//!
//! Shell output is collected in an internal buffer. With
//! `print_immediately` the buffer is handed to the caller's sink after each
//! line; otherwise the caller sees a single write once the whole file has
//! been consumed. An empty buffer is never written.
//!
//! # Line Length
//!
//! The configured maximum counts content bytes only. Longer lines are
//! truncated: the rest of the physical line is skipped and the kept prefix
//! is executed with the line's own terminator. A last line without a
//! terminator is passed on as-is and never gains one.

use std::io::{self, BufRead, BufReader, Read};

use tracing::{debug, warn};

use crate::command::CommandShell;
use crate::resolver::ResolvedScript;
use crate::sink::{BufferSink, OutputSink};
use crate::types::ScriptRequest;

/// Counters for one command script run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandRunStats {
    /// Physical lines handed to the shell
    pub lines: usize,
    /// Lines cut at the maximum length
    pub truncated: usize,
}

/// Line-by-line command script execution.
#[derive(Debug, Clone, Copy)]
pub struct BufferedCommandRunner {
    max_line_length: usize,
}

impl BufferedCommandRunner {
    /// `max_line_length` counts content bytes, not the terminator; values
    /// below 2 are raised to 2.
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length: max_line_length.max(2),
        }
    }

    /// Run `script` through `shell`, delivering output to `sink`.
    ///
    /// The script's file handle is closed before the final flush. A read
    /// error ends the run early; output collected up to that point is still
    /// delivered before the error is returned.
    pub fn run(
        &self,
        script: ResolvedScript,
        shell: &mut dyn CommandShell,
        request: &ScriptRequest,
        sink: &mut dyn OutputSink,
    ) -> io::Result<CommandRunStats> {
        let ResolvedScript { path, source } = script;
        let mut collected = BufferSink::with_secure(request.secure);
        let mut stats = CommandRunStats::default();

        shell.set_secure(request.secure);

        let mut reader = BufReader::new(source);
        let mut line = Vec::with_capacity(self.max_line_length);
        let outcome = loop {
            match read_bounded_line(&mut reader, self.max_line_length, &mut line) {
                Ok(None) => break Ok(()),
                Ok(Some(truncated)) => {
                    stats.lines += 1;
                    if truncated {
                        stats.truncated += 1;
                        warn!(
                            "{}:{}: line longer than {} bytes truncated",
                            path.display(),
                            stats.lines,
                            self.max_line_length
                        );
                    }
                    shell.process_chars(&line, &mut collected);
                    if request.print_immediately && !collected.is_empty() {
                        sink.write(&collected.take());
                    }
                }
                Err(e) => break Err(e),
            }
        };
        drop(reader);

        if !collected.is_empty() {
            sink.write(&collected.take());
        }

        debug!(
            "Command script {} done: {} line(s), {} truncated",
            path.display(),
            stats.lines,
            stats.truncated
        );
        outcome.map(|()| stats)
    }
}

/// Read one line of at most `max` content bytes into `buf`; the terminator
/// is kept as found and does not count towards `max`.
///
/// Returns `None` at end of input, otherwise whether content was dropped.
/// A cut line keeps its prefix and its original terminator. An unterminated
/// tail stays unterminated whatever its length.
fn read_bounded_line<R: Read>(
    reader: &mut BufReader<R>,
    max: usize,
    buf: &mut Vec<u8>,
) -> io::Result<Option<bool>> {
    buf.clear();
    let read = reader.by_ref().take(max as u64).read_until(b'\n', buf)?;
    if read == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') || read < max {
        return Ok(Some(false));
    }

    let rest = skip_rest_of_line(reader)?;
    buf.extend_from_slice(rest.terminator);
    Ok(Some(rest.dropped > 0))
}

/// What followed the kept prefix of a line.
#[derive(Debug, PartialEq, Eq)]
struct LineRest {
    /// Content bytes discarded
    dropped: usize,
    /// `\n`, `\r\n`, or empty at end of input
    terminator: &'static [u8],
}

/// Consume input up to and including the next newline.
fn skip_rest_of_line<R: Read>(reader: &mut BufReader<R>) -> io::Result<LineRest> {
    let mut dropped = 0;
    let mut last_cr = false;
    loop {
        let available = reader.fill_buf()?;
        if available.is_empty() {
            return Ok(LineRest {
                dropped,
                terminator: b"",
            });
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let cr = if pos > 0 { available[pos - 1] == b'\r' } else { last_cr };
                reader.consume(pos + 1);
                dropped += pos;
                return Ok(if cr {
                    LineRest {
                        dropped: dropped - 1,
                        terminator: b"\r\n",
                    }
                } else {
                    LineRest {
                        dropped,
                        terminator: b"\n",
                    }
                });
            }
            None => {
                let len = available.len();
                last_cr = available[len - 1] == b'\r';
                reader.consume(len);
                dropped += len;
            }
        }
    }
}
