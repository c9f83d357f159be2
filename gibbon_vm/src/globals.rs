//! Global binding slots.
//!
//! The compiler assigns every top-level `let` a dense slot index, so
//! globals are a flat array rather than a name map. The store belongs to
//! the host session and survives successive runs.

use crate::error::{VmError, VmResult};
use gibbon_runtime::Value;

/// Number of global slots addressable by a `u16` operand.
pub const GLOBALS_SIZE: usize = 1 << 16;

/// Fixed-size global slot array.
#[derive(Debug, Clone)]
pub struct Globals {
    slots: Vec<Value>,
    capacity: usize,
}

impl Default for Globals {
    fn default() -> Self {
        Self::new()
    }
}

impl Globals {
    /// Create the full-size store.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(GLOBALS_SIZE)
    }

    /// Create a store with room for `capacity` slots.
    ///
    /// Slots are materialized on first write.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
        }
    }

    /// Value in `index`; unset slots read as `Null`.
    #[inline]
    pub fn get(&self, index: usize) -> VmResult<Value> {
        if index >= self.capacity {
            return Err(VmError::GlobalOutOfRange(index));
        }
        Ok(self.slots.get(index).cloned().unwrap_or_default())
    }

    /// Store `value` in `index`.
    #[inline]
    pub fn set(&mut self, index: usize, value: Value) -> VmResult<()> {
        if index >= self.capacity {
            return Err(VmError::GlobalOutOfRange(index));
        }
        if index >= self.slots.len() {
            self.slots.resize(index + 1, Value::Null);
        }
        self.slots[index] = value;
        Ok(())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots written so far (highest index + 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
