//! Opcode dispatch.
//!
//! Maps each decoded instruction to its handler in [`crate::ops`]. Handlers
//! report what the run loop should do next through [`ControlFlow`].

use crate::error::VmResult;
use crate::ops::{arithmetic, calls, comparison, containers, control, load_store};
use crate::vm::VirtualMachine;
use gibbon_compiler::bytecode::Operands;
use gibbon_compiler::Opcode;
use gibbon_runtime::{BinaryOp, Value};

/// Outcome of executing one instruction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ControlFlow {
    /// Fall through to the next instruction.
    Continue,
    /// Continue at an absolute offset in the current function.
    Jump(usize),
    /// Leave the current frame with a value.
    Return(Value),
}

/// Execute one instruction whose operands are already decoded.
#[inline]
pub(crate) fn dispatch(
    vm: &mut VirtualMachine,
    opcode: Opcode,
    operands: &Operands,
) -> VmResult<ControlFlow> {
    let operand = |i: usize| operands.get(i).copied().unwrap_or_default();

    match opcode {
        // Loads and stores
        Opcode::Constant => load_store::constant(vm, operand(0)),
        Opcode::Pop => load_store::pop(vm),
        Opcode::True => load_store::push(vm, Value::Boolean(true)),
        Opcode::False => load_store::push(vm, Value::Boolean(false)),
        Opcode::Null => load_store::push(vm, Value::Null),
        Opcode::GetGlobal => load_store::get_global(vm, operand(0)),
        Opcode::SetGlobal => load_store::set_global(vm, operand(0)),
        Opcode::GetLocal => load_store::get_local(vm, operand(0)),
        Opcode::SetLocal => load_store::set_local(vm, operand(0)),
        Opcode::GetBuiltin => load_store::get_builtin(vm, operand(0)),
        Opcode::GetFree => load_store::get_free(vm, operand(0)),
        Opcode::CurrentClosure => load_store::current_closure(vm),

        // Operators
        Opcode::Add => arithmetic::binary(vm, BinaryOp::Add),
        Opcode::Sub => arithmetic::binary(vm, BinaryOp::Sub),
        Opcode::Mul => arithmetic::binary(vm, BinaryOp::Mul),
        Opcode::Div => arithmetic::binary(vm, BinaryOp::Div),
        Opcode::Mod => arithmetic::binary(vm, BinaryOp::Mod),
        Opcode::Minus => arithmetic::negate(vm),
        Opcode::Equal => comparison::compare(vm, BinaryOp::Equal),
        Opcode::NotEqual => comparison::compare(vm, BinaryOp::NotEqual),
        Opcode::GreaterThan => comparison::compare(vm, BinaryOp::Greater),
        Opcode::GreaterEqual => comparison::compare(vm, BinaryOp::GreaterEqual),
        Opcode::LessThan => comparison::compare(vm, BinaryOp::Less),
        Opcode::LessEqual => comparison::compare(vm, BinaryOp::LessEqual),
        Opcode::Bang => comparison::not(vm),

        // Control flow
        Opcode::Jump => control::jump(operand(0)),
        Opcode::JumpNotTruthy => control::jump_not_truthy(vm, operand(0)),
        Opcode::ReturnValue => control::return_value(vm),
        Opcode::Return => control::return_null(),

        // Aggregates
        Opcode::Array => containers::build_array(vm, operand(0)),
        Opcode::Hash => containers::build_hash(vm, operand(0)),
        Opcode::Index => containers::index(vm),

        // Functions
        Opcode::Call => calls::call(vm, operand(0)),
        Opcode::Closure => calls::make_closure(vm, operand(0), operand(1)),
    }
}
