//! Instruction buffer for one function body.
//!
//! The builder appends encoded instructions, remembers the last two it
//! emitted so a trailing `OpPop` can be dropped or turned into a return, and
//! resolves jump labels when the body is finished.

use super::instruction::{Opcode, make};
use crate::error::{CompileErrorKind, JUMP_LIMIT};

/// A jump target within one function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

/// A jump operand waiting for its label to be bound.
#[derive(Debug)]
struct ForwardRef {
    /// Byte offset of the jump's `u16` operand.
    operand_offset: usize,
    label: Label,
}

/// An instruction already written to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Emitted {
    opcode: Opcode,
    offset: usize,
}

/// Builder for the instruction stream of one function body (or the
/// top-level program).
#[derive(Debug, Default)]
pub struct FunctionBuilder {
    instructions: Vec<u8>,
    last: Option<Emitted>,
    previous: Option<Emitted>,
    /// Bound offset of each label, indexed by label number.
    labels: Vec<Option<usize>>,
    forward_refs: Vec<ForwardRef>,
}

impl FunctionBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current end of the buffer.
    #[inline]
    pub fn current_offset(&self) -> usize {
        self.instructions.len()
    }

    // =========================================================================
    // Emission
    // =========================================================================

    /// Append an instruction and return its offset.
    pub fn emit(&mut self, opcode: Opcode, operands: &[usize]) -> usize {
        let offset = self.instructions.len();
        self.instructions.extend_from_slice(&make(opcode, operands));
        self.previous = self.last;
        self.last = Some(Emitted { opcode, offset });
        offset
    }

    /// Emit a jump (`OpJump` or `OpJumpNotTruthy`) to `label`.
    pub fn emit_jump(&mut self, opcode: Opcode, label: Label) -> usize {
        debug_assert!(matches!(opcode, Opcode::Jump | Opcode::JumpNotTruthy));
        let offset = self.emit(opcode, &[0]);
        self.forward_refs.push(ForwardRef {
            operand_offset: offset + 1,
            label,
        });
        offset
    }

    /// Whether the most recent instruction is `opcode`.
    #[inline]
    pub fn last_is(&self, opcode: Opcode) -> bool {
        self.last.is_some_and(|e| e.opcode == opcode)
    }

    /// Drop a trailing `OpPop` so the popped value stays on the stack.
    /// Returns whether one was removed.
    pub fn remove_last_pop(&mut self) -> bool {
        match self.last {
            Some(Emitted {
                opcode: Opcode::Pop,
                offset,
            }) => {
                self.instructions.truncate(offset);
                self.last = self.previous.take();
                // A label bound after the pop now refers to the end.
                for bound in self.labels.iter_mut().flatten() {
                    *bound = (*bound).min(offset);
                }
                true
            }
            _ => false,
        }
    }

    /// Turn a trailing `OpPop` into `OpReturnValue`.
    pub fn replace_last_pop_with_return(&mut self) -> bool {
        match self.last {
            Some(Emitted {
                opcode: Opcode::Pop,
                offset,
            }) => {
                self.instructions[offset] = Opcode::ReturnValue as u8;
                self.last = Some(Emitted {
                    opcode: Opcode::ReturnValue,
                    offset,
                });
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Labels
    // =========================================================================

    /// Create a new, unbound label.
    pub fn create_label(&mut self) -> Label {
        let label = Label(self.labels.len() as u32);
        self.labels.push(None);
        label
    }

    /// Bind `label` to the current end of the buffer.
    pub fn bind_label(&mut self, label: Label) {
        self.labels[label.0 as usize] = Some(self.instructions.len());
    }

    // =========================================================================
    // Finalization
    // =========================================================================

    /// Patch every jump and return the finished instruction stream.
    pub fn finish(mut self) -> Result<Vec<u8>, CompileErrorKind> {
        for fwd in &self.forward_refs {
            // Unbound labels are a compiler bug; jump to the end rather than panic.
            let target = self.labels[fwd.label.0 as usize].unwrap_or(self.instructions.len());
            if target > JUMP_LIMIT {
                return Err(CompileErrorKind::JumpOutOfRange(target));
            }
            let [hi, lo] = (target as u16).to_be_bytes();
            self.instructions[fwd.operand_offset] = hi;
            self.instructions[fwd.operand_offset + 1] = lo;
        }
        Ok(self.instructions)
    }
}
