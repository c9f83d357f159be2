//! Arithmetic opcode handlers.
//!
//! Integer operands take a fast path; everything else, including string
//! concatenation and the type errors, goes through the shared runtime
//! operators.

use crate::dispatch::ControlFlow;
use crate::error::VmResult;
use crate::vm::VirtualMachine;
use gibbon_runtime::{BinaryOp, OperationError, Value, ops};

/// Add / Sub / Mul / Div / Mod: push(left op right)
#[inline(always)]
pub fn binary(vm: &mut VirtualMachine, op: BinaryOp) -> VmResult<ControlFlow> {
    let right = vm.stack.pop();
    let left = vm.stack.pop();

    let result = match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => Value::Integer(integer(op, *a, *b)?),
        _ => ops::binary(op, &left, &right)?,
    };
    vm.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

#[inline(always)]
fn integer(op: BinaryOp, a: i64, b: i64) -> Result<i64, OperationError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(OperationError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Mod => a.checked_rem(b),
        _ => {
            return Err(OperationError::UnsupportedBinary {
                op: op.symbol(),
                left: "INTEGER",
                right: "INTEGER",
            });
        }
    };
    result.ok_or(OperationError::IntegerOverflow(op.symbol()))
}

/// Minus: push(-pop())
#[inline(always)]
pub fn negate(vm: &mut VirtualMachine) -> VmResult<ControlFlow> {
    let operand = vm.stack.pop();
    let result = ops::negate(&operand)?;
    vm.stack.push(result)?;
    Ok(ControlFlow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_fast_path() {
        assert_eq!(integer(BinaryOp::Add, 2, 3), Ok(5));
        assert_eq!(integer(BinaryOp::Mod, 7, 3), Ok(1));
        assert_eq!(integer(BinaryOp::Div, -7, 2), Ok(-3));
        assert_eq!(integer(BinaryOp::Div, 1, 0), Err(OperationError::DivisionByZero));
        assert_eq!(
            integer(BinaryOp::Mul, i64::MAX, 2),
            Err(OperationError::IntegerOverflow("*"))
        );
    }
}
