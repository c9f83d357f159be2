//! Opcode handlers, grouped by concern.
//!
//! Every handler takes the VM plus its decoded operands and returns the
//! [`ControlFlow`](crate::dispatch::ControlFlow) for the run loop.

pub(crate) mod arithmetic;
pub(crate) mod calls;
pub(crate) mod comparison;
pub(crate) mod containers;
pub(crate) mod control;
pub(crate) mod load_store;
