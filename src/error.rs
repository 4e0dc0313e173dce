//! Error types shared by the compiler and the assembler.
//!
//! Every stage fails fast: the first error aborts the stage and is handed
//! back to the caller. Nothing is recovered or retried.

use std::io;
use thiserror::Error;

use crate::compiler::lexer::CharPosition;

/// The scanner met a character that cannot start any token.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum LexError {
    #[error("{position}: unexpected character `{ch}`")]
    UnexpectedCharacter { ch: char, position: CharPosition },
}

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{position}: expected {expected}, found `{found}`")]
    Unexpected {
        expected: String,
        found: String,
        position: CharPosition,
    },

    #[error("expected {expected}, found end of input")]
    UnexpectedEnd { expected: String },

    #[error("{position}: constant `{text}` does not fit in 32 bits")]
    ConstantOutOfRange { text: String, position: CharPosition },
}

/// Failures raised while lowering a parsed program into mnemonics.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum CodegenError {
    #[error("variable `{name}` is already declared")]
    DuplicateDeclaration { name: String },

    #[error("variable `{name}` is used before its declaration")]
    UndeclaredVariable { name: String },

    #[error("`{target}` cannot be assigned to")]
    NotAssignable { target: String },
}

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Parse(ParseError::Lex(err))
    }
}

/// Assembly errors. `line` is always the 1-based line of the mnemonic text.
#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum AssembleError {
    #[error("line {line}: unknown opcode `{opcode}`")]
    UnknownOpcode { line: usize, opcode: String },

    #[error("line {line}: malformed operand {operand:?}")]
    MalformedOperand { line: usize, operand: String },

    #[error("line {line}: operand `{operand}` does not fit in {width}")]
    OverflowedOperand {
        line: usize,
        operand: String,
        width: &'static str,
    },

    #[error("line {line}: unknown register or label `{name}`")]
    UnknownRegisterOrLabel { line: usize, name: String },

    #[error("line {line}: label `{name}` is already defined")]
    DuplicateLabel { line: usize, name: String },
}

impl AssembleError {
    /// Returns the mnemonic source line the error was raised on.
    pub fn line(&self) -> usize {
        use AssembleError::*;
        match self {
            UnknownOpcode { line, .. }
            | MalformedOperand { line, .. }
            | OverflowedOperand { line, .. }
            | UnknownRegisterOrLabel { line, .. }
            | DuplicateLabel { line, .. } => *line,
        }
    }
}

#[derive(Error, Clone, PartialEq, Eq, Debug)]
pub enum DisassembleError {
    #[error("offset 0x{offset:04X}: unknown opcode byte 0x{code:02X}")]
    UnknownOpcode { offset: usize, code: u8 },

    #[error("offset 0x{offset:04X}: unknown register code {code}")]
    UnknownRegister { offset: usize, code: u8 },

    #[error("offset 0x{offset:04X}: jump target {target} lies outside the module")]
    TargetOutOfRange { offset: usize, target: i64 },

    #[error("offset 0x{offset:04X}: `{opcode}` is cut short by the end of the module")]
    Truncated { offset: usize, opcode: String },
}

/// Top-level error for callers driving the whole toolchain.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Disassemble(#[from] DisassembleError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
