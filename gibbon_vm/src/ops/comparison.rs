//! Comparison and logical-not handlers.

use crate::dispatch::ControlFlow;
use crate::error::VmResult;
use crate::vm::VirtualMachine;
use gibbon_runtime::{BinaryOp, Value, ops};

/// Equal / NotEqual / GreaterThan / GreaterEqual / LessThan / LessEqual:
/// push(left op right)
#[inline(always)]
pub fn compare(vm: &mut VirtualMachine, op: BinaryOp) -> VmResult<ControlFlow> {
    let right = vm.stack.pop();
    let left = vm.stack.pop();

    let result = match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            BinaryOp::Equal => Value::Boolean(a == b),
            BinaryOp::NotEqual => Value::Boolean(a != b),
            BinaryOp::Greater => Value::Boolean(a > b),
            BinaryOp::GreaterEqual => Value::Boolean(a >= b),
            BinaryOp::Less => Value::Boolean(a < b),
            BinaryOp::LessEqual => Value::Boolean(a <= b),
            _ => ops::binary(op, &left, &right)?,
        },
        _ => ops::binary(op, &left, &right)?,
    };
    vm.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

/// Bang: push(!truthy(pop()))
#[inline(always)]
pub fn not(vm: &mut VirtualMachine) -> VmResult<ControlFlow> {
    let operand = vm.stack.pop();
    vm.stack.push(ops::not(&operand))?;
    Ok(ControlFlow::Continue)
}
