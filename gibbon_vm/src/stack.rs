//! Fixed-capacity value stack shared by every frame.
//!
//! Slots at or above the stack pointer always hold `Null`, so dropping
//! values happens as soon as they are popped and reserving local slots is
//! just a pointer bump.

use crate::error::{VmError, VmResult};
use gibbon_runtime::Value;

/// Default number of stack slots.
pub const DEFAULT_STACK_SIZE: usize = 2048;

/// Value stack with a hard capacity.
#[derive(Debug)]
pub struct ValueStack {
    slots: Box<[Value]>,
    /// Index of the next free slot; the top is `slots[sp - 1]`.
    sp: usize,
}

impl Default for ValueStack {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_STACK_SIZE)
    }
}

impl ValueStack {
    /// Create a stack holding at most `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![Value::Null; capacity].into_boxed_slice(),
            sp: 0,
        }
    }

    /// Maximum number of values.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Current stack pointer.
    #[inline]
    pub fn sp(&self) -> usize {
        self.sp
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    /// Push a value. At capacity this fails and the stack is unchanged.
    #[inline]
    pub fn push(&mut self, value: Value) -> VmResult<()> {
        let slot = self.slots.get_mut(self.sp).ok_or(VmError::StackOverflow)?;
        *slot = value;
        self.sp += 1;
        Ok(())
    }

    /// Pop the top value; an empty stack yields `Null`.
    #[inline]
    pub fn pop(&mut self) -> Value {
        if self.sp == 0 {
            return Value::Null;
        }
        self.sp -= 1;
        std::mem::take(&mut self.slots[self.sp])
    }

    /// The top value, if any.
    #[inline]
    pub fn top(&self) -> Option<&Value> {
        self.sp.checked_sub(1).map(|i| &self.slots[i])
    }

    /// The value `distance` slots below the top.
    #[inline]
    pub fn peek(&self, distance: usize) -> Option<&Value> {
        self.sp
            .checked_sub(distance + 1)
            .map(|i| &self.slots[i])
    }

    /// Read an absolute slot; slots past the pointer read as `Null`.
    #[inline]
    pub fn get(&self, index: usize) -> Value {
        if index < self.sp {
            self.slots[index].clone()
        } else {
            Value::Null
        }
    }

    /// Write an absolute slot below the pointer.
    #[inline]
    pub fn set(&mut self, index: usize, value: Value) -> VmResult<()> {
        if index >= self.sp {
            return Err(VmError::StackOverflow);
        }
        self.slots[index] = value;
        Ok(())
    }

    /// The top `count` values, bottom first.
    #[inline]
    pub fn top_slice(&self, count: usize) -> &[Value] {
        let start = self.sp.saturating_sub(count);
        &self.slots[start..self.sp]
    }

    /// Remove the top `count` values and return them, bottom first.
    pub fn take_top(&mut self, count: usize) -> Vec<Value> {
        let start = self.sp.saturating_sub(count);
        let values = self.slots[start..self.sp]
            .iter_mut()
            .map(std::mem::take)
            .collect();
        self.sp = start;
        values
    }

    /// Move the pointer. Growing exposes `Null` slots; shrinking drops
    /// the values above the new pointer.
    pub fn set_sp(&mut self, sp: usize) -> VmResult<()> {
        if sp > self.capacity() {
            return Err(VmError::StackOverflow);
        }
        if sp < self.sp {
            self.slots[sp..self.sp].fill(Value::Null);
        }
        self.sp = sp;
        Ok(())
    }

    /// Drop every value.
    pub fn clear(&mut self) {
        self.slots[..self.sp].fill(Value::Null);
        self.sp = 0;
    }
}
