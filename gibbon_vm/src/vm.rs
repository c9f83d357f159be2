//! The bytecode virtual machine.
//!
//! Fetch-decode-execute over the innermost frame's instruction stream.
//! Operands are decoded here, then [`dispatch`](crate::dispatch::dispatch)
//! runs the handler. A run ends when the top-level frame runs off the end
//! of its instructions, executes a `return`, or faults.

use crate::dispatch::{self, ControlFlow};
use crate::error::{VmError, VmResult};
use crate::frame::{DEFAULT_MAX_FRAMES, Frame, FrameStack};
use crate::globals::Globals;
use crate::stack::{DEFAULT_STACK_SIZE, ValueStack};
use gibbon_compiler::{Bytecode, Opcode, read_operands};
use gibbon_runtime::{Closure, CompiledFunction, FreeVars, Value};
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

/// VM limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Value stack capacity.
    pub stack_size: usize,
    /// Maximum call depth, the top-level frame included.
    pub max_frames: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

/// Stack-based bytecode interpreter.
///
/// Globals survive across [`run`](Self::run) calls, so a session can feed
/// it one compiled unit at a time.
pub struct VirtualMachine {
    pub(crate) constants: Vec<Value>,
    pub(crate) stack: ValueStack,
    pub(crate) frames: FrameStack,
    pub(crate) globals: Globals,
    pub(crate) last_popped: Value,
    /// Sink for `puts`.
    pub(crate) output: Box<dyn Write>,
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VirtualMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualMachine")
            .field("sp", &self.stack.sp())
            .field("frames", &self.frames.depth())
            .field("globals", &self.globals.len())
            .finish_non_exhaustive()
    }
}

impl VirtualMachine {
    /// Create a VM with default limits, printing to stdout.
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    /// Create a VM with the given limits, printing to stdout.
    pub fn with_config(config: VmConfig) -> Self {
        Self {
            constants: Vec::new(),
            stack: ValueStack::with_capacity(config.stack_size),
            frames: FrameStack::new(config.max_frames),
            globals: Globals::new(),
            last_popped: Value::Null,
            output: Box::new(io::stdout()),
        }
    }

    /// Redirect `puts` output.
    #[must_use]
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Start from an existing global store.
    #[must_use]
    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    /// The global store.
    #[inline]
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Give up the global store, e.g. to hand it to a fresh VM.
    pub fn into_globals(self) -> Globals {
        self.globals
    }

    /// Current top of the value stack.
    #[inline]
    pub fn stack_top(&self) -> Option<&Value> {
        self.stack.top()
    }

    /// Value most recently removed by `Pop`, or returned by a top-level
    /// `return`. This is the result of the last expression statement.
    #[inline]
    pub fn last_popped(&self) -> &Value {
        &self.last_popped
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Run one compiled unit to completion.
    ///
    /// The stack and frames start empty; globals keep their values from
    /// earlier runs.
    pub fn run(&mut self, bytecode: &Bytecode) -> VmResult<()> {
        self.constants.clone_from(&bytecode.constants);
        self.stack.clear();
        self.frames.clear();
        self.last_popped = Value::Null;

        let main = CompiledFunction::new(
            Some(Rc::from("<main>")),
            bytecode.instructions.clone(),
            0,
            0,
        );
        let closure = Rc::new(Closure::new(Rc::new(main), FreeVars::new()));
        self.frames.push(Frame::new(closure, 0))?;

        log::debug!(
            "run {} bytes, {} constants",
            bytecode.instructions.len(),
            self.constants.len()
        );
        let result = self.execute();
        if let Err(err) = &result {
            log::debug!("run failed at depth {}: {err}", self.frames.depth());
        }
        result
    }

    fn execute(&mut self) -> VmResult<()> {
        loop {
            let Some(frame) = self.frames.current_mut() else {
                return Ok(());
            };
            let ip = frame.ip;
            let instructions = frame.instructions();
            let Some(&byte) = instructions.get(ip) else {
                // Compiled functions always end in a return; only the
                // top-level stream runs off its end.
                if self.frames.depth() <= 1 || self.leave_frame(Value::Null)? {
                    return Ok(());
                }
                continue;
            };

            let opcode = Opcode::from_byte(byte).ok_or(VmError::UnknownOpcode {
                opcode: byte,
                offset: ip,
            })?;
            let (operands, width) = read_operands(opcode, &instructions[ip + 1..])
                .ok_or(VmError::TruncatedInstruction { opcode, offset: ip })?;
            frame.ip = ip + 1 + width;

            match dispatch::dispatch(self, opcode, &operands)? {
                ControlFlow::Continue => {}
                ControlFlow::Jump(target) => {
                    if let Some(frame) = self.frames.current_mut() {
                        frame.ip = target;
                    }
                }
                ControlFlow::Return(value) => {
                    if self.leave_frame(value)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Pop the current frame and hand `value` to the caller. Returns `true`
    /// when the top-level frame was left and the run is over.
    fn leave_frame(&mut self, value: Value) -> VmResult<bool> {
        let Some(frame) = self.frames.pop() else {
            return Ok(true);
        };
        if self.frames.is_empty() {
            self.last_popped = value;
            return Ok(true);
        }

        log::trace!(
            "return from {} to depth {}",
            frame.closure.function.display_name(),
            self.frames.depth()
        );
        // Drop the callee's locals and the callee itself.
        self.stack.set_sp(frame.base_pointer.saturating_sub(1))?;
        self.stack.push(value)?;
        Ok(false)
    }

    #[inline]
    pub(crate) fn frame(&self) -> VmResult<&Frame> {
        self.frames.current().ok_or(VmError::NoActiveFrame)
    }
}
