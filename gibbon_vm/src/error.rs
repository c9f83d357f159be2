//! Runtime faults raised by the virtual machine.

use gibbon_compiler::Opcode;
use gibbon_runtime::OperationError;
use thiserror::Error;

/// Result type for VM operations.
pub type VmResult<T> = Result<T, VmError>;

/// A fault that aborts the current run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("stack overflow")]
    StackOverflow,

    #[error("call stack exhausted")]
    FrameOverflow,

    #[error("wrong number of arguments: want={want}, got={got}")]
    WrongArgumentCount { want: usize, got: usize },

    #[error("calling non-function and non-builtin: {0}")]
    NotCallable(&'static str),

    #[error("unknown opcode {opcode:#04x} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("truncated {opcode} at offset {offset}")]
    TruncatedInstruction { opcode: Opcode, offset: usize },

    #[error("constant {0} out of range")]
    ConstantOutOfRange(usize),

    #[error("constant {0} is not a function")]
    NotAFunction(usize),

    #[error("global slot {0} out of range")]
    GlobalOutOfRange(usize),

    #[error("unknown builtin {0}")]
    UnknownBuiltin(usize),

    #[error("free variable {0} out of range")]
    FreeOutOfRange(usize),

    #[error("no active frame")]
    NoActiveFrame,

    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(VmError::StackOverflow.to_string(), "stack overflow");
        assert_eq!(
            VmError::WrongArgumentCount { want: 1, got: 0 }.to_string(),
            "wrong number of arguments: want=1, got=0"
        );
        assert_eq!(
            VmError::UnknownOpcode { opcode: 0xee, offset: 3 }.to_string(),
            "unknown opcode 0xee at offset 3"
        );
        assert_eq!(
            VmError::from(OperationError::DivisionByZero).to_string(),
            "division by zero"
        );
    }
}
