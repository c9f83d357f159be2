//! Call frames.
//!
//! A frame is a running closure plus its instruction pointer and the stack
//! index where its locals begin. Arguments are pushed by the caller right
//! above the callee, so parameter `i` is already in local slot `i` when the
//! frame starts.

use crate::error::{VmError, VmResult};
use gibbon_runtime::{Closure, Value};
use std::rc::Rc;

/// Maximum call depth before "call stack exhausted".
pub const DEFAULT_MAX_FRAMES: usize = 1024;

/// Activation record for one closure invocation.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Closure being executed.
    pub closure: Rc<Closure>,
    /// Offset of the next instruction.
    pub ip: usize,
    /// Stack index of local slot 0.
    pub base_pointer: usize,
}

impl Frame {
    #[inline]
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base_pointer,
        }
    }

    /// Instruction stream of the running function.
    #[inline]
    pub fn instructions(&self) -> &[u8] {
        &self.closure.function.instructions
    }

    /// Captured value `index`.
    #[inline]
    pub fn free(&self, index: usize) -> VmResult<Value> {
        self.closure
            .free
            .get(index)
            .cloned()
            .ok_or(VmError::FreeOutOfRange(index))
    }
}

/// Bounded stack of frames. The bottom frame runs the top-level program.
#[derive(Debug)]
pub struct FrameStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl FrameStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::with_capacity(max_depth.min(64)),
            max_depth,
        }
    }

    /// Push a frame, failing once `max_depth` frames are live.
    #[inline]
    pub fn push(&mut self, frame: Frame) -> VmResult<()> {
        if self.frames.len() >= self.max_depth {
            return Err(VmError::FrameOverflow);
        }
        self.frames.push(frame);
        Ok(())
    }

    #[inline]
    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    #[inline]
    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    #[inline]
    pub fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
