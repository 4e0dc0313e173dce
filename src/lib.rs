//! `cssc` compiles C-Simplified programs into SSMA mnemonic text and
//! assembles that text into binary modules for the SSMA stack machine.
//!
//! ```text
//! source ──compiler──▶ mnemonics ──assembler──▶ bytes
//! ```

#[macro_use]
extern crate log;

pub mod assembler;
pub mod compiler;
pub mod error;

pub use assembler::{assemble, Program};
pub use compiler::compile;
pub use error::Error;

/// Runs the whole pipeline on C-Simplified source.
pub fn build(source: &str) -> Result<Program, Error> {
    let mnemonics = compile(source)?;
    Ok(assemble(&mnemonics)?)
}
