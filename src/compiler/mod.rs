//! The Compiler module turns C-Simplified source text into SSMA mnemonic text.
//!
//! It does this with a character-at-a-time scanner, a recursive descent
//! parser with one token of lookahead, and a code generator that walks the
//! resulting AST. All per-program state (declared variables, the label
//! counter) lives in a `CompilationSession`.

pub mod ast;
pub mod codegen;
pub mod emitter;
pub mod lexer;
pub mod parser;
pub mod tables;

pub use codegen::{compile, CompilationSession, SymbolTable};
