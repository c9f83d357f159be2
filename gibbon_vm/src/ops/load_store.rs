//! Constant, global, local, built-in and captured-variable access.

use crate::dispatch::ControlFlow;
use crate::error::{VmError, VmResult};
use crate::vm::VirtualMachine;
use gibbon_runtime::{Builtin, Value};
use std::rc::Rc;

/// Push a literal.
#[inline(always)]
pub fn push(vm: &mut VirtualMachine, value: Value) -> VmResult<ControlFlow> {
    vm.stack.push(value)?;
    Ok(ControlFlow::Continue)
}

/// Constant: push constants[index]
#[inline(always)]
pub fn constant(vm: &mut VirtualMachine, index: usize) -> VmResult<ControlFlow> {
    let value = vm
        .constants
        .get(index)
        .cloned()
        .ok_or(VmError::ConstantOutOfRange(index))?;
    push(vm, value)
}

/// Pop: discard the top, remembering it as the last popped value.
#[inline(always)]
pub fn pop(vm: &mut VirtualMachine) -> VmResult<ControlFlow> {
    vm.last_popped = vm.stack.pop();
    Ok(ControlFlow::Continue)
}

// =============================================================================
// Globals
// =============================================================================

#[inline(always)]
pub fn get_global(vm: &mut VirtualMachine, index: usize) -> VmResult<ControlFlow> {
    let value = vm.globals.get(index)?;
    push(vm, value)
}

#[inline(always)]
pub fn set_global(vm: &mut VirtualMachine, index: usize) -> VmResult<ControlFlow> {
    let value = vm.stack.pop();
    vm.globals.set(index, value)?;
    Ok(ControlFlow::Continue)
}

// =============================================================================
// Locals
// =============================================================================

/// GetLocal: push stack[bp + slot]
#[inline(always)]
pub fn get_local(vm: &mut VirtualMachine, slot: usize) -> VmResult<ControlFlow> {
    let base = vm.frame()?.base_pointer;
    let value = vm.stack.get(base + slot);
    push(vm, value)
}

/// SetLocal: stack[bp + slot] = pop()
#[inline(always)]
pub fn set_local(vm: &mut VirtualMachine, slot: usize) -> VmResult<ControlFlow> {
    let base = vm.frame()?.base_pointer;
    let value = vm.stack.pop();
    vm.stack.set(base + slot, value)?;
    Ok(ControlFlow::Continue)
}

// =============================================================================
// Built-ins and Captures
// =============================================================================

#[inline(always)]
pub fn get_builtin(vm: &mut VirtualMachine, index: usize) -> VmResult<ControlFlow> {
    let builtin = Builtin::from_index(index).ok_or(VmError::UnknownBuiltin(index))?;
    push(vm, Value::Builtin(builtin))
}

#[inline(always)]
pub fn get_free(vm: &mut VirtualMachine, index: usize) -> VmResult<ControlFlow> {
    let value = vm.frame()?.free(index)?;
    push(vm, value)
}

/// CurrentClosure: push the closure of the running frame (self-reference).
#[inline(always)]
pub fn current_closure(vm: &mut VirtualMachine) -> VmResult<ControlFlow> {
    let closure = Rc::clone(&vm.frame()?.closure);
    push(vm, Value::Closure(closure))
}
