//! Output sinks
//!
//! Scripts never own where their output goes: the caller hands in an
//! [`OutputSink`] and the runners write to it. Three implementations ship
//! with the crate:
//!
//! - [`ConsoleSink`]: stdout, interactive, supports character insertion hooks
//! - [`BufferSink`]: in-memory capture (command script batching, tests)
//! - [`LogSink`]: unattended output routed into `tracing` (event scripts)

use std::fmt;
use std::io::Write;

use tracing::info;

/// Per-character hook registered by an interactive command.
///
/// Returning `false` ends the insertion mode and the hook is dropped.
pub type InsertCallback = Box<dyn FnMut(&mut dyn OutputSink, char) -> bool + Send>;

/// Destination for script and command output.
pub trait OutputSink {
    /// Write raw bytes. Returns the number of bytes accepted; a value of
    /// zero or less means the sink is closed or unwritable.
    fn write(&mut self, buf: &[u8]) -> isize;

    /// Write a line, appending a newline.
    fn puts(&mut self, line: &str) -> isize {
        let written = self.write(line.as_bytes());
        if written < 0 {
            return written;
        }
        let newline = self.write(b"\n");
        if newline <= 0 {
            return newline;
        }
        written + newline
    }

    /// Write formatted text (use with `format_args!`).
    fn printf(&mut self, args: fmt::Arguments<'_>) -> isize {
        match args.as_str() {
            Some(s) => self.write(s.as_bytes()),
            None => self.write(args.to_string().as_bytes()),
        }
    }

    /// Whether the session behind this sink runs in secure mode.
    fn is_secure(&self) -> bool {
        false
    }

    /// Install a character insertion hook. Sinks that cannot deliver typed
    /// characters refuse by returning `false`.
    fn register_insert_callback(&mut self, _callback: InsertCallback) -> bool {
        false
    }

    /// Whether an insertion hook is currently active.
    fn has_insert_callback(&self) -> bool {
        false
    }

    /// Deliver one typed character to the active insertion hook.
    /// Returns `false` if no hook consumed it.
    fn insert(&mut self, _ch: char) -> bool {
        false
    }
}

/// Interactive stdout sink used by the console.
pub struct ConsoleSink {
    secure: bool,
    insert: Option<InsertCallback>,
}

impl ConsoleSink {
    pub fn new(secure: bool) -> Self {
        Self {
            secure,
            insert: None,
        }
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("secure", &self.secure)
            .field("insert_active", &self.insert.is_some())
            .finish()
    }
}

impl OutputSink for ConsoleSink {
    fn write(&mut self, buf: &[u8]) -> isize {
        let mut stdout = std::io::stdout().lock();
        match stdout.write_all(buf).and_then(|_| stdout.flush()) {
            Ok(()) => buf.len() as isize,
            Err(_) => -1,
        }
    }

    fn is_secure(&self) -> bool {
        self.secure
    }

    fn register_insert_callback(&mut self, callback: InsertCallback) -> bool {
        self.insert = Some(callback);
        true
    }

    fn has_insert_callback(&self) -> bool {
        self.insert.is_some()
    }

    fn insert(&mut self, ch: char) -> bool {
        // Taken out for the call so the hook can write through `self`
        let Some(mut callback) = self.insert.take() else {
            return false;
        };
        if callback(self, ch) {
            self.insert = Some(callback);
        }
        true
    }
}

/// In-memory sink.
///
/// An optional byte limit makes the sink report itself closed once full,
/// which lets producers detect a dead channel.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    data: Vec<u8>,
    secure: bool,
    limit: Option<usize>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer that reports the given secure mode to commands.
    pub fn with_secure(secure: bool) -> Self {
        Self {
            secure,
            ..Self::default()
        }
    }

    /// Buffer that stops accepting writes after `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Contents as text (lossy)
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Take the buffered bytes, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }
}

impl OutputSink for BufferSink {
    fn write(&mut self, buf: &[u8]) -> isize {
        let accepted = match self.limit {
            Some(limit) => buf.len().min(limit.saturating_sub(self.data.len())),
            None => buf.len(),
        };
        if accepted == 0 && !buf.is_empty() {
            return 0;
        }
        self.data.extend_from_slice(&buf[..accepted]);
        accepted as isize
    }

    fn is_secure(&self) -> bool {
        self.secure
    }
}

/// Non-interactive sink for unattended scripts.
///
/// Complete lines are logged at `info` under target `script`, tagged with
/// the originating script. A trailing partial line is logged on drop.
#[derive(Debug)]
pub struct LogSink {
    origin: String,
    pending: Vec<u8>,
}

impl LogSink {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            pending: Vec::new(),
        }
    }

    fn emit(&self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end_matches('\r');
        if !text.is_empty() {
            info!(target: "script", origin = %self.origin, "{}", text);
        }
    }
}

impl OutputSink for LogSink {
    fn write(&mut self, buf: &[u8]) -> isize {
        self.pending.extend_from_slice(buf);
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&line[..line.len() - 1]);
        }
        buf.len() as isize
    }

    fn is_secure(&self) -> bool {
        true
    }
}

impl Drop for LogSink {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            self.emit(&rest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_sink_puts_and_printf() {
        let mut sink = BufferSink::new();
        assert_eq!(sink.puts("hello"), 6);
        sink.printf(format_args!("{}+{}={}\n", 1, 2, 3));
        assert_eq!(sink.contents(), "hello\n1+2=3\n");
    }

    #[test]
    fn test_buffer_sink_take_empties() {
        let mut sink = BufferSink::new();
        sink.write(b"abc");
        assert_eq!(sink.take(), b"abc".to_vec());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_buffer_sink_limit_reports_closed() {
        let mut sink = BufferSink::with_limit(4);
        assert_eq!(sink.write(b"abc"), 3);
        assert_eq!(sink.write(b"def"), 1);
        assert_eq!(sink.write(b"g"), 0);
        assert_eq!(sink.contents(), "abcd");
    }

    #[test]
    fn test_buffer_sink_refuses_insert_callback() {
        let mut sink = BufferSink::new();
        assert!(!sink.register_insert_callback(Box::new(|_: &mut dyn OutputSink, _: char| true)));
        assert!(!sink.has_insert_callback());
        assert!(!sink.insert('x'));
    }

    #[test]
    fn test_log_sink_is_secure_and_accepts_everything() {
        let mut sink = LogSink::new("test");
        assert!(sink.is_secure());
        assert_eq!(sink.write(b"line one\nline"), 13);
        assert_eq!(sink.write(b" two\n"), 5);
        assert!(sink.pending.is_empty());
    }

    #[test]
    fn test_console_insert_callback_lifecycle() {
        let mut sink = ConsoleSink::new(true);
        let mut seen = 0;
        assert!(sink.register_insert_callback(Box::new(move |_: &mut dyn OutputSink, ch: char| {
            seen += 1;
            ch != '\n' && seen < 10
        })));
        assert!(sink.has_insert_callback());
        assert!(sink.insert('a'));
        assert!(sink.has_insert_callback());
        assert!(sink.insert('\n'));
        assert!(!sink.has_insert_callback());
        assert!(!sink.insert('b'));
    }
}
