//! The Assembler module is in charge of taking SSMA mnemonic
//! text and producing the binary module for the stack machine.
//!
//! It does this in two passes over the lexed lines: the first
//! sizes every instruction and binds labels to byte offsets, the
//! second encodes opcodes and operands with every label known.

pub mod ast;
pub mod disasm;
pub mod encoder;
pub mod labels;
pub mod lexer;
pub mod parser;

pub use encoder::{ListingEntry, Program};

use crate::error::AssembleError;

/// Assembles a whole mnemonic text. Stops at the first error.
pub fn assemble(text: &str) -> Result<Program, AssembleError> {
    let lines = lexer::tokenize(text);
    let first = labels::resolve(&lines)?;
    encoder::encode(first)
}
