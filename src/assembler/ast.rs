//! This AST describes SSMA, the mnemonic language of the stack machine.
//!
//! One instruction or pseudo-instruction per line. Fields are separated by
//! whitespace (commas are accepted too) and a semicolon starts a comment.
//!
//! ```nasm
//! ; declare one variable and set it to 300
//! alloc 4
//! push_4 300
//! dup
//! push_r $RSB
//! store_4
//! pop
//! LABEL Label_0          ; binds Label_0 to the offset of the next instruction
//! push_ra $RSB 4         ; push $RSB + 4
//! jmpz Label_0           ; signed 16-bit displacement, relative to the next instruction
//! SUBROUTINE helper      ; same as LABEL, meant as a `call` target
//! call helper            ; absolute 32-bit offset
//! ```
//!
//! Opcode and register names are case-sensitive.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// How the bytes after an opcode are laid out.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Layout {
    /// No operand.
    None,
    /// Unsigned 8-bit immediate.
    U8,
    /// Unsigned 16-bit immediate.
    U16,
    /// Unsigned 32-bit immediate.
    U32,
    /// One register code.
    Register,
    /// One register code, then an unsigned 16-bit offset.
    RegisterOffset,
    /// Signed 16-bit displacement to a label, relative to the next instruction.
    Relative,
    /// Unsigned 32-bit absolute offset of a label.
    Absolute,
}

impl Layout {
    /// Operand bytes, not counting the opcode.
    pub fn width(&self) -> u32 {
        use Layout::*;
        match self {
            None => 0,
            U8 | Register => 1,
            U16 | Relative => 2,
            RegisterOffset => 3,
            U32 | Absolute => 4,
        }
    }

    /// Number of whitespace-separated operand fields in mnemonic text.
    pub fn fields(&self) -> usize {
        use Layout::*;
        match self {
            None => 0,
            RegisterOffset => 2,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Opcode {
    Term,
    Nop,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    BitRev,
    Not,
    Inc,
    Dec,
    Cmp,
    PushC0,
    PushC1,
    Push1,
    Push4,
    PushR,
    PushRa,
    Pop,
    Swap,
    Dup,
    Rec,
    Store1,
    Store2,
    Store4,
    Load1,
    Load2,
    Load4,
    Alloc,
    Jmp,
    Jmpz,
    Jmpx,
    Jmpn,
    Call,
    Ret,
}

impl Opcode {
    pub const ALL: [Opcode; 38] = {
        use Opcode::*;
        [
            Term, Nop, Add, Sub, Mul, Div, Mod, BitAnd, BitOr, BitXor, BitRev, Not, Inc, Dec, Cmp,
            PushC0, PushC1, Push1, Push4, PushR, PushRa, Pop, Swap, Dup, Rec, Store1,
            Store2, Store4, Load1, Load2, Load4, Alloc, Jmp, Jmpz, Jmpx, Jmpn, Call, Ret,
        ]
    };

    /// Returns the one-byte machine code of the opcode.
    pub fn code(&self) -> u8 {
        use Opcode::*;
        match self {
            Term => 0,
            Nop => 1,
            Add => 2,
            Sub => 3,
            Mul => 4,
            Div => 5,
            Mod => 6,
            BitAnd => 7,
            BitOr => 8,
            BitXor => 9,
            BitRev => 10,
            Not => 11,
            Inc => 12,
            Dec => 13,
            Cmp => 14,
            PushC0 => 20,
            PushC1 => 21,
            Push1 => 22,
            Push4 => 23,
            PushR => 24,
            PushRa => 25,
            Pop => 26,
            Swap => 27,
            Dup => 28,
            Rec => 29,
            Store1 => 30,
            Store2 => 31,
            Store4 => 32,
            Load1 => 33,
            Load2 => 34,
            Load4 => 35,
            Alloc => 36,
            Jmp => 40,
            Jmpz => 41,
            Jmpx => 42,
            Jmpn => 43,
            Call => 44,
            Ret => 45,
        }
    }

    pub fn layout(&self) -> Layout {
        use Opcode::*;
        match self {
            Push1 => Layout::U8,
            Push4 => Layout::U32,
            PushR => Layout::Register,
            PushRa => Layout::RegisterOffset,
            Alloc => Layout::U16,
            Jmp | Jmpz | Jmpx | Jmpn => Layout::Relative,
            Call => Layout::Absolute,
            _ => Layout::None,
        }
    }

    /// Encoded size in bytes, opcode included.
    pub fn size(&self) -> u32 {
        1 + self.layout().width()
    }

    pub fn name(&self) -> &'static str {
        use Opcode::*;
        match self {
            Term => "term",
            Nop => "nop",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Mod => "mod",
            BitAnd => "b_and",
            BitOr => "b_or",
            BitXor => "b_xor",
            BitRev => "b_rev",
            Not => "not",
            Inc => "inc",
            Dec => "dec",
            Cmp => "cmp",
            PushC0 => "push_c0",
            PushC1 => "push_c1",
            Push1 => "push_1",
            Push4 => "push_4",
            PushR => "push_r",
            PushRa => "push_ra",
            Pop => "pop",
            Swap => "swap",
            Dup => "dup",
            Rec => "rec",
            Store1 => "store_1",
            Store2 => "store_2",
            Store4 => "store_4",
            Load1 => "load_1",
            Load2 => "load_2",
            Load4 => "load_4",
            Alloc => "alloc",
            Jmp => "jmp",
            Jmpz => "jmpz",
            Jmpx => "jmpx",
            Jmpn => "jmpn",
            Call => "call",
            Ret => "ret",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Opcode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL
            .iter()
            .find(|op| op.name() == s)
            .copied()
            .ok_or_else(|| format!("`{}` is not an opcode", s))
    }
}

impl TryFrom<u8> for Opcode {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .iter()
            .find(|op| op.code() == code)
            .copied()
            .ok_or_else(|| format!("0x{:02X} is not an opcode", code))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    /// Instruction pointer.
    RIP,
    /// Base of the current stack frame.
    RSB,
    /// Top of the current stack frame.
    RST,
    /// Temporary data, used for argument and return passing.
    RTD,
    /// Base of the current module.
    RMB,
}

impl Register {
    pub fn code(&self) -> u8 {
        use Register::*;
        match self {
            RIP => 0,
            RSB => 1,
            RST => 2,
            RTD => 3,
            RMB => 4,
        }
    }

    /// The register's name in mnemonic text, `$` sigil included.
    pub fn name(&self) -> &'static str {
        use Register::*;
        match self {
            RIP => "$RIP",
            RSB => "$RSB",
            RST => "$RST",
            RTD => "$RTD",
            RMB => "$RMB",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Register {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Register::*;
        match s {
            "$RIP" => Ok(RIP),
            "$RSB" => Ok(RSB),
            "$RST" => Ok(RST),
            "$RTD" => Ok(RTD),
            "$RMB" => Ok(RMB),
            _ => Err(format!("`{}` is not a register", s)),
        }
    }
}

impl TryFrom<u8> for Register {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        use Register::*;
        match code {
            0 => Ok(RIP),
            1 => Ok(RSB),
            2 => Ok(RST),
            3 => Ok(RTD),
            4 => Ok(RMB),
            _ => Err("register codes run from 0 to 4 inclusive".to_owned()),
        }
    }
}

/// Pseudo-instruction that binds a label to the current offset.
pub const LABEL_MACRO: &str = "LABEL";
/// Pseudo-instruction for subroutine entry points; behaves like `LABEL`.
pub const SUBROUTINE_MACRO: &str = "SUBROUTINE";

/// One meaningful line of mnemonic text.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Statement {
    Label(String),
    Instruction { opcode: Opcode, operands: Vec<String> },
}

/// A statement and the 1-based line it was read from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line {
    pub number: usize,
    pub statement: Statement,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Label(name) => write!(f, "{} {}", LABEL_MACRO, name),
            Statement::Instruction { opcode, operands } => {
                write!(f, "{}", opcode)?;
                for operand in operands {
                    write!(f, " {}", operand)?;
                }
                Ok(())
            }
        }
    }
}
