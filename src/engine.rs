//! Shared JavaScript heap
//!
//! One QuickJS runtime and context live for the whole lifetime of the
//! script subsystem; every `.js` script evaluates against the same globals.
//!
//! # Output Redirection
//!
//! Scripts print through the `OvmsPrint(text)` and `print(...)` globals.
//! Both append to a single output slot that is only active while
//! [`ScriptEngineContext::with_output`] runs: the slot is installed on
//! entry, and a drop guard resets it to inactive on every exit path. Text
//! printed while no evaluation holds the slot is dropped, never delivered
//! to a sink belonging to an earlier call.
//!
//! Captured output is capped per evaluation; bytes past the cap are dropped
//! and reported with a warning when the evaluation ends.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rquickjs::convert::Coerced;
use rquickjs::function::Rest;
use rquickjs::{CatchResultExt, Context, Ctx, Function, Runtime, Value};
use tracing::{debug, info, warn};

use crate::error::{Result, ScriptError};
use crate::sink::OutputSink;

type OutputSlot = Rc<RefCell<Option<Capture>>>;

/// Output captured during one evaluation.
#[derive(Debug, Default)]
struct Capture {
    bytes: Vec<u8>,
    limit: usize,
    dropped: usize,
}

impl Capture {
    fn append(&mut self, bytes: &[u8]) {
        let room = self.limit.saturating_sub(self.bytes.len());
        let kept = bytes.len().min(room);
        self.bytes.extend_from_slice(&bytes[..kept]);
        self.dropped += bytes.len() - kept;
    }
}

/// Process-lifetime JavaScript heap with its output slot.
pub struct ScriptEngineContext {
    context: Context,
    runtime: Runtime,
    output: OutputSlot,
    output_limit: usize,
}

impl fmt::Debug for ScriptEngineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEngineContext")
            .field("output_active", &self.is_output_active())
            .finish_non_exhaustive()
    }
}

impl ScriptEngineContext {
    /// Create the heap and register the print primitives.
    ///
    /// `memory_limit` caps the QuickJS heap in bytes, `output_limit` the
    /// output kept from a single evaluation.
    pub fn new(memory_limit: Option<usize>, output_limit: usize) -> Result<Self> {
        let runtime = Runtime::new()
            .map_err(|e| ScriptError::engine(format!("failed to create heap: {}", e)))?;
        if let Some(limit) = memory_limit {
            runtime.set_memory_limit(limit);
        }
        let context = Context::full(&runtime)
            .map_err(|e| ScriptError::engine(format!("failed to create context: {}", e)))?;

        let output: OutputSlot = Rc::new(RefCell::new(None));
        context
            .with(|ctx| register_print(&ctx, &output))
            .map_err(|e| ScriptError::engine(format!("failed to register print: {}", e)))?;

        info!("Using QuickJS javascript engine");
        Ok(Self {
            context,
            runtime,
            output,
            output_limit,
        })
    }

    /// Run `body` with this call's output routed to `sink`.
    ///
    /// Text printed by scripts during `body` is delivered to `sink` before
    /// this returns. The slot is inactive again afterwards, whether `body`
    /// returned normally or unwound.
    pub fn with_output<R>(
        &mut self,
        sink: &mut dyn OutputSink,
        body: impl FnOnce(&Context) -> R,
    ) -> R {
        let guard = OutputGuard::install(&self.output, self.output_limit);
        let result = body(&self.context);
        let captured = guard.release();
        if captured.dropped > 0 {
            warn!(
                "Script output over {} bytes, {} bytes dropped",
                captured.limit, captured.dropped
            );
        }
        if !captured.bytes.is_empty() {
            sink.write(&captured.bytes);
        }
        result
    }

    /// Evaluate a script for its side effects, discarding the result.
    ///
    /// Evaluation failures are logged here and not reported to the caller.
    pub fn run(&mut self, origin: &str, source: Vec<u8>, sink: &mut dyn OutputSink) {
        self.with_output(sink, |context| {
            context.with(|ctx| {
                if let Err(e) = ctx.eval::<Value, _>(source).catch(&ctx) {
                    tracing::warn!("Javascript error in {}: {}", origin, e);
                }
            })
        });
        self.runtime.run_gc();
    }

    /// Evaluate a short expression and return its numeric value.
    ///
    /// Used by diagnostics; output printed by the expression is dropped.
    pub fn evaluate_number(&mut self, expression: &str) -> Result<f64> {
        self.context.with(|ctx| {
            let value = ctx
                .eval::<Value, _>(expression)
                .catch(&ctx)
                .map_err(|e| ScriptError::engine(e.to_string()))?;
            value.as_number().ok_or_else(|| {
                ScriptError::engine(format!("{:?} did not evaluate to a number", expression))
            })
        })
    }

    /// Whether an evaluation currently holds the output slot.
    pub fn is_output_active(&self) -> bool {
        self.output.borrow().is_some()
    }
}

/// Scoped installation of the output slot.
struct OutputGuard<'a> {
    slot: &'a RefCell<Option<Capture>>,
}

impl<'a> OutputGuard<'a> {
    fn install(slot: &'a RefCell<Option<Capture>>, limit: usize) -> Self {
        let previous = slot.borrow_mut().replace(Capture {
            limit,
            ..Capture::default()
        });
        debug_assert!(previous.is_none(), "output slot already held");
        Self { slot }
    }

    /// Take the captured output; the slot is reset when the guard drops.
    fn release(self) -> Capture {
        self.slot.borrow_mut().take().unwrap_or_default()
    }
}

impl Drop for OutputGuard<'_> {
    fn drop(&mut self) {
        self.slot.borrow_mut().take();
    }
}

fn emit(slot: &OutputSlot, bytes: &[u8]) {
    match slot.borrow_mut().as_mut() {
        Some(capture) => capture.append(bytes),
        None => debug!("Dropping {} bytes of script output: no active sink", bytes.len()),
    }
}

fn register_print(ctx: &Ctx<'_>, slot: &OutputSlot) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    let ovms_slot = Rc::clone(slot);
    let ovms_print = Function::new(ctx.clone(), move |text: Coerced<String>| {
        emit(&ovms_slot, text.0.as_bytes());
    })?;
    globals.set("OvmsPrint", ovms_print)?;

    let print_slot = Rc::clone(slot);
    let print = Function::new(ctx.clone(), move |args: Rest<Coerced<String>>| {
        let line = args
            .0
            .into_iter()
            .map(|arg| arg.0)
            .collect::<Vec<_>>()
            .join(" ");
        emit(&print_slot, line.as_bytes());
        emit(&print_slot, b"\n");
    })?;
    globals.set("print", print)?;

    Ok(())
}
