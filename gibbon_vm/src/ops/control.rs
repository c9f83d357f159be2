//! Jumps and returns.

use crate::dispatch::ControlFlow;
use crate::error::VmResult;
use crate::vm::VirtualMachine;
use gibbon_runtime::Value;

/// Jump: continue at `target`
#[inline(always)]
pub fn jump(target: usize) -> VmResult<ControlFlow> {
    Ok(ControlFlow::Jump(target))
}

/// JumpNotTruthy: pop the condition, jump when it is falsy
#[inline(always)]
pub fn jump_not_truthy(vm: &mut VirtualMachine, target: usize) -> VmResult<ControlFlow> {
    let condition = vm.stack.pop();
    if condition.is_truthy() {
        Ok(ControlFlow::Continue)
    } else {
        Ok(ControlFlow::Jump(target))
    }
}

/// ReturnValue: leave the frame with the top of stack
#[inline(always)]
pub fn return_value(vm: &mut VirtualMachine) -> VmResult<ControlFlow> {
    Ok(ControlFlow::Return(vm.stack.pop()))
}

/// Return: leave the frame with null
#[inline(always)]
pub fn return_null() -> VmResult<ControlFlow> {
    Ok(ControlFlow::Return(Value::Null))
}
