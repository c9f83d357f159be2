//! Instruction encoding.
//!
//! An instruction is one opcode byte followed by zero or more operands.
//! Each opcode has a fixed list of operand widths; multi-byte operands are
//! big-endian.
//!
//! ```text
//! OpConstant 65534      -> [op, 0xFF, 0xFE]
//! OpGetLocal 126        -> [op, 0x7E]
//! OpClosure  65534 255  -> [op, 0xFF, 0xFE, 0xFF]
//! ```

use smallvec::SmallVec;
use std::fmt;

/// Decoded operands. No opcode has more than two.
pub type Operands = SmallVec<[usize; 2]>;

// =============================================================================
// Opcodes
// =============================================================================

/// Bytecode operations.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Push `constants[u16]`.
    Constant = 0,
    /// Pop and discard the top of stack.
    Pop,

    // --- Arithmetic ---
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // --- Literals ---
    True,
    False,
    Null,

    // --- Comparison ---
    Equal,
    NotEqual,
    GreaterThan,
    GreaterEqual,
    LessThan,
    LessEqual,

    // --- Unary ---
    Minus,
    Bang,

    // --- Control flow ---
    /// Pop; jump to absolute offset `u16` if the value is falsy.
    JumpNotTruthy,
    /// Jump to absolute offset `u16`.
    Jump,

    // --- Variables ---
    GetGlobal,
    SetGlobal,
    GetLocal,
    SetLocal,
    GetBuiltin,
    GetFree,
    /// Push the closure of the running frame.
    CurrentClosure,

    // --- Aggregates ---
    /// Build an array from the top `u16` values.
    Array,
    /// Build a hash from the top `u16` values (keys and values interleaved).
    Hash,
    Index,

    // --- Calls ---
    /// Call the callee below the top `u8` arguments.
    Call,
    ReturnValue,
    Return,
    /// Wrap `constants[u16]` with the top `u8` values as captures.
    Closure,
}

impl Opcode {
    const ALL: [Opcode; 34] = [
        Opcode::Constant,
        Opcode::Pop,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::True,
        Opcode::False,
        Opcode::Null,
        Opcode::Equal,
        Opcode::NotEqual,
        Opcode::GreaterThan,
        Opcode::GreaterEqual,
        Opcode::LessThan,
        Opcode::LessEqual,
        Opcode::Minus,
        Opcode::Bang,
        Opcode::JumpNotTruthy,
        Opcode::Jump,
        Opcode::GetGlobal,
        Opcode::SetGlobal,
        Opcode::GetLocal,
        Opcode::SetLocal,
        Opcode::GetBuiltin,
        Opcode::GetFree,
        Opcode::CurrentClosure,
        Opcode::Array,
        Opcode::Hash,
        Opcode::Index,
        Opcode::Call,
        Opcode::ReturnValue,
        Opcode::Return,
        Opcode::Closure,
    ];

    /// Decode an opcode byte.
    #[inline]
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Self::ALL.get(byte as usize).copied()
    }

    /// Byte width of each operand.
    #[must_use]
    pub const fn operand_widths(self) -> &'static [usize] {
        match self {
            Opcode::Constant
            | Opcode::JumpNotTruthy
            | Opcode::Jump
            | Opcode::GetGlobal
            | Opcode::SetGlobal
            | Opcode::Array
            | Opcode::Hash => &[2],
            Opcode::GetLocal
            | Opcode::SetLocal
            | Opcode::GetBuiltin
            | Opcode::GetFree
            | Opcode::Call => &[1],
            Opcode::Closure => &[2, 1],
            _ => &[],
        }
    }

    /// Total encoded size including the opcode byte.
    #[inline]
    #[must_use]
    pub fn encoded_len(self) -> usize {
        1 + self.operand_widths().iter().sum::<usize>()
    }

    /// Mnemonic used by the disassembler.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Constant => "OpConstant",
            Opcode::Pop => "OpPop",
            Opcode::Add => "OpAdd",
            Opcode::Sub => "OpSub",
            Opcode::Mul => "OpMul",
            Opcode::Div => "OpDiv",
            Opcode::Mod => "OpMod",
            Opcode::True => "OpTrue",
            Opcode::False => "OpFalse",
            Opcode::Null => "OpNull",
            Opcode::Equal => "OpEqual",
            Opcode::NotEqual => "OpNotEqual",
            Opcode::GreaterThan => "OpGreaterThan",
            Opcode::GreaterEqual => "OpGreaterEqual",
            Opcode::LessThan => "OpLessThan",
            Opcode::LessEqual => "OpLessEqual",
            Opcode::Minus => "OpMinus",
            Opcode::Bang => "OpBang",
            Opcode::JumpNotTruthy => "OpJumpNotTruthy",
            Opcode::Jump => "OpJump",
            Opcode::GetGlobal => "OpGetGlobal",
            Opcode::SetGlobal => "OpSetGlobal",
            Opcode::GetLocal => "OpGetLocal",
            Opcode::SetLocal => "OpSetLocal",
            Opcode::GetBuiltin => "OpGetBuiltin",
            Opcode::GetFree => "OpGetFree",
            Opcode::CurrentClosure => "OpCurrentClosure",
            Opcode::Array => "OpArray",
            Opcode::Hash => "OpHash",
            Opcode::Index => "OpIndex",
            Opcode::Call => "OpCall",
            Opcode::ReturnValue => "OpReturnValue",
            Opcode::Return => "OpReturn",
            Opcode::Closure => "OpClosure",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode one instruction.
///
/// Operands must fit their widths; callers check limits before emitting.
/// Excess high bits are dropped.
#[must_use]
pub fn make(op: Opcode, operands: &[usize]) -> SmallVec<[u8; 4]> {
    let widths = op.operand_widths();
    debug_assert_eq!(widths.len(), operands.len(), "operand count for {op}");

    let mut bytes = SmallVec::new();
    bytes.push(op as u8);
    for (&operand, &width) in operands.iter().zip(widths) {
        match width {
            2 => bytes.extend_from_slice(&(operand as u16).to_be_bytes()),
            1 => bytes.push(operand as u8),
            _ => unreachable!("unsupported operand width {width}"),
        }
    }
    bytes
}

/// Decode the operands of `op` from `bytes`, which starts just after the
/// opcode byte. Returns the operands and the number of bytes read, or `None`
/// if the stream is truncated.
#[must_use]
pub fn read_operands(op: Opcode, bytes: &[u8]) -> Option<(Operands, usize)> {
    let mut operands = Operands::new();
    let mut offset = 0;
    for &width in op.operand_widths() {
        let operand = match width {
            2 => read_u16(bytes, offset)? as usize,
            _ => read_u8(bytes, offset)? as usize,
        };
        operands.push(operand);
        offset += width;
    }
    Some((operands, offset))
}

/// Read a big-endian `u16` at `offset`.
#[inline]
#[must_use]
pub fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let pair = bytes.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([pair[0], pair[1]]))
}

/// Read a `u8` at `offset`.
#[inline]
#[must_use]
pub fn read_u8(bytes: &[u8], offset: usize) -> Option<u8> {
    bytes.get(offset).copied()
}

// =============================================================================
// Disassembly
// =============================================================================

/// Display adapter that renders an instruction stream one instruction per
/// line, prefixed with its byte offset.
pub struct Disassembly<'a>(pub &'a [u8]);

impl fmt::Display for Disassembly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        let mut ip = 0;
        while ip < bytes.len() {
            let Some(op) = Opcode::from_byte(bytes[ip]) else {
                writeln!(f, "{ip:04} ERROR: unknown opcode {:#04x}", bytes[ip])?;
                ip += 1;
                continue;
            };
            let Some((operands, read)) = read_operands(op, &bytes[ip + 1..]) else {
                writeln!(f, "{ip:04} ERROR: truncated {op}")?;
                break;
            };
            write!(f, "{ip:04} {op}")?;
            for operand in &operands {
                write!(f, " {operand}")?;
            }
            writeln!(f)?;
            ip += 1 + read;
        }
        Ok(())
    }
}

/// Render an instruction stream as text.
#[must_use]
pub fn disassemble(bytes: &[u8]) -> String {
    Disassembly(bytes).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_wide_constant() {
        let bytes = make(Opcode::Constant, &[65534]);
        assert_eq!(bytes.as_slice(), &[Opcode::Constant as u8, 0xFF, 0xFE]);
        let (operands, read) = read_operands(Opcode::Constant, &bytes[1..]).unwrap();
        assert_eq!(operands.as_slice(), &[65534]);
        assert_eq!(read, 2);
    }

    #[test]
    fn test_make_local_slot() {
        let bytes = make(Opcode::SetLocal, &[126]);
        assert_eq!(bytes.as_slice(), &[Opcode::SetLocal as u8, 126]);
        let bytes = make(Opcode::GetLocal, &[255]);
        assert_eq!(bytes.as_slice(), &[Opcode::GetLocal as u8, 255]);
    }

    #[test]
    fn test_make_closure() {
        let bytes = make(Opcode::Closure, &[65534, 255]);
        assert_eq!(bytes.as_slice(), &[Opcode::Closure as u8, 0xFF, 0xFE, 0xFF]);
        let (operands, read) = read_operands(Opcode::Closure, &bytes[1..]).unwrap();
        assert_eq!(operands.as_slice(), &[65534, 255]);
        assert_eq!(read, 3);
    }

    #[test]
    fn test_make_without_operands() {
        assert_eq!(make(Opcode::Add, &[]).as_slice(), &[Opcode::Add as u8]);
    }

    #[test]
    fn test_opcode_bytes_round_trip() {
        for (byte, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(*op as u8 as usize, byte);
            assert_eq!(Opcode::from_byte(byte as u8), Some(*op));
        }
        assert_eq!(Opcode::from_byte(Opcode::ALL.len() as u8), None);
    }

    #[test]
    fn test_encoded_len() {
        assert_eq!(Opcode::Pop.encoded_len(), 1);
        assert_eq!(Opcode::GetLocal.encoded_len(), 2);
        assert_eq!(Opcode::Jump.encoded_len(), 3);
        assert_eq!(Opcode::Closure.encoded_len(), 4);
    }

    #[test]
    fn test_truncated_operands() {
        assert!(read_operands(Opcode::Constant, &[0xFF]).is_none());
        assert!(read_operands(Opcode::Closure, &[0, 1]).is_none());
    }

    #[test]
    fn test_disassemble() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&make(Opcode::Add, &[]));
        bytes.extend_from_slice(&make(Opcode::GetLocal, &[1]));
        bytes.extend_from_slice(&make(Opcode::Constant, &[2]));
        bytes.extend_from_slice(&make(Opcode::Constant, &[65535]));
        bytes.extend_from_slice(&make(Opcode::Closure, &[65535, 255]));
        let expected = "\
0000 OpAdd
0001 OpGetLocal 1
0003 OpConstant 2
0006 OpConstant 65535
0009 OpClosure 65535 255
";
        assert_eq!(disassemble(&bytes), expected);
    }

    #[test]
    fn test_disassemble_unknown_opcode() {
        assert_eq!(disassemble(&[0xEE]), "0000 ERROR: unknown opcode 0xee\n");
    }
}
