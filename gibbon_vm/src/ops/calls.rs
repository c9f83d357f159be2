//! Function calls and closure creation.
//!
//! Stack layout at a call with `argc` arguments:
//!
//! ```text
//! [ ... | callee | arg0 | arg1 | ... | arg(argc-1) ]
//!                  ^ base pointer of the new frame   ^ sp
//! ```

use crate::dispatch::ControlFlow;
use crate::error::{VmError, VmResult};
use crate::frame::Frame;
use crate::vm::VirtualMachine;
use gibbon_runtime::{Builtin, Closure, FreeVars, Value};
use std::rc::Rc;

// =============================================================================
// Function Calls
// =============================================================================

/// Call: invoke the value below the top `argc` arguments
#[inline(always)]
pub fn call(vm: &mut VirtualMachine, argc: usize) -> VmResult<ControlFlow> {
    let callee = vm.stack.peek(argc).cloned().unwrap_or_default();
    match callee {
        Value::Closure(closure) => call_closure(vm, closure, argc),
        Value::Builtin(builtin) => call_builtin(vm, builtin, argc),
        other => Err(VmError::NotCallable(other.type_name())),
    }
}

fn call_closure(vm: &mut VirtualMachine, closure: Rc<Closure>, argc: usize) -> VmResult<ControlFlow> {
    let want = closure.function.num_parameters;
    if argc != want {
        return Err(VmError::WrongArgumentCount { want, got: argc });
    }

    let base_pointer = vm.stack.sp() - argc;
    let frame_top = base_pointer + closure.function.num_locals;
    log::trace!(
        "call {} at depth {}",
        closure.function.display_name(),
        vm.frames.depth()
    );

    vm.frames.push(Frame::new(closure, base_pointer))?;
    vm.stack.set_sp(frame_top)?;
    Ok(ControlFlow::Continue)
}

fn call_builtin(vm: &mut VirtualMachine, builtin: Builtin, argc: usize) -> VmResult<ControlFlow> {
    let result = builtin.call(vm.stack.top_slice(argc), vm.output.as_mut())?;
    let callee_slot = vm.stack.sp() - argc - 1;
    vm.stack.set_sp(callee_slot)?;
    vm.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

// =============================================================================
// Closure Creation
// =============================================================================

/// Closure: wrap constants[index] with the top `free_count` values
#[inline(always)]
pub fn make_closure(
    vm: &mut VirtualMachine,
    index: usize,
    free_count: usize,
) -> VmResult<ControlFlow> {
    let function = match vm.constants.get(index) {
        Some(Value::CompiledFunction(function)) => Rc::clone(function),
        Some(_) => return Err(VmError::NotAFunction(index)),
        None => return Err(VmError::ConstantOutOfRange(index)),
    };
    let free: FreeVars = vm.stack.take_top(free_count).into_iter().collect();
    vm.stack.push(Value::Closure(Rc::new(Closure::new(function, free))))?;
    Ok(ControlFlow::Continue)
}
