//! Lowers the AST into SSMA mnemonics.
//!
//! Every expression leaves exactly one value on the evaluation stack.
//! Variables live in the current frame and are addressed from `$RSB`.
//!
//! Relational operators are built from `cmp`, which pushes a negative, zero
//! or positive value, followed by unary fix-ups so that a true comparison
//! leaves a non-zero value and a false one leaves zero:
//!
//! | operator | sequence           |
//! |----------|--------------------|
//! | `==`     | `cmp not`          |
//! | `!=`     | `cmp`              |
//! | `>`      | `cmp dec not`      |
//! | `>=`     | `cmp inc`          |
//! | `<`      | `cmp inc not`      |
//! | `<=`     | `cmp dec`          |
use std::collections::HashMap;

use super::ast::{BinaryOp, Block, Expr, Stmt, Type};
use super::emitter::Emitter;
use super::parser;
use crate::assembler::ast::{Opcode, Register};
use crate::error::{CodegenError, CompileError};

/// Maps each declared variable to its byte offset from the frame base.
#[derive(Clone, Default, Debug)]
pub struct SymbolTable {
    offsets: HashMap<String, u32>,
    next_offset: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Binds `name` to the next free offset and advances it by the size of `ty`.
    pub fn declare(&mut self, name: &str, ty: Type) -> Result<u32, CodegenError> {
        if self.offsets.contains_key(name) {
            return Err(CodegenError::DuplicateDeclaration { name: name.to_string() });
        }
        let offset = self.next_offset;
        self.offsets.insert(name.to_string(), offset);
        self.next_offset += ty.size();
        Ok(offset)
    }

    pub fn offset(&self, name: &str) -> Option<u32> {
        self.offsets.get(name).copied()
    }

    /// Total bytes allocated so far.
    pub fn frame_size(&self) -> u32 {
        self.next_offset
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Every binding, ordered by offset.
    pub fn entries(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> =
            self.offsets.iter().map(|(name, offset)| (name.as_str(), *offset)).collect();
        entries.sort_by_key(|(_, offset)| *offset);
        entries
    }

    pub fn clear(&mut self) {
        self.offsets.clear();
        self.next_offset = 0;
    }
}

/// State owned by one compilation: the symbol table and the emitter with
/// its label counter. Independent sessions share nothing.
#[derive(Default, Debug)]
pub struct CompilationSession {
    pub symbols: SymbolTable,
    pub emitter: Emitter,
}

impl CompilationSession {
    pub fn new() -> Self {
        CompilationSession {
            symbols: SymbolTable::new(),
            emitter: Emitter::new(),
        }
    }

    /// Parses `source` and lowers it, appending to the mnemonics emitted so far.
    /// On error the session is left exactly as it was before the call.
    pub fn compile(&mut self, source: &str) -> Result<(), CompileError> {
        if let Some(program) = parser::parse(source)? {
            let symbols = self.symbols.clone();
            let emitter = self.emitter.clone();
            if let Err(err) = lower_statement(self, &program) {
                self.symbols = symbols;
                self.emitter = emitter;
                return Err(err.into());
            }
        }
        debug!(
            "lowered program: {} variable(s), {} instruction(s)",
            self.symbols.len(),
            self.emitter.instruction_count()
        );
        Ok(())
    }

    pub fn mnemonics(&self) -> &str {
        self.emitter.as_str()
    }

    pub fn into_mnemonics(self) -> String {
        self.emitter.into_string()
    }

    /// Forgets every declaration and all emitted text.
    pub fn reset(&mut self) {
        self.symbols.clear();
        self.emitter.reset();
    }
}

pub fn lower_statement(session: &mut CompilationSession, stmt: &Stmt) -> Result<(), CodegenError> {
    match stmt {
        Stmt::Declaration { ty, name } => {
            let offset = session.symbols.declare(name, *ty)?;
            trace!("declared `{}` at offset {}", name, offset);
            session.emitter.emit(Opcode::Alloc, &[ty.size().to_string().as_str()]);
        }

        Stmt::Branch { condition, then_branch, else_branch: None } => {
            lower_expression(session, condition)?;
            let end = session.emitter.reserve_label();
            session.emitter.emit(Opcode::Jmpz, &[end.name()]);
            lower_block(session, then_branch)?;
            session.emitter.place_label(&end);
        }

        Stmt::Branch { condition, then_branch, else_branch: Some(else_branch) } => {
            lower_expression(session, condition)?;
            let start_of_else = session.emitter.reserve_label();
            let end = session.emitter.reserve_label();
            session.emitter.emit(Opcode::Jmpz, &[start_of_else.name()]);
            lower_block(session, then_branch)?;
            session.emitter.emit(Opcode::Jmp, &[end.name()]);
            session.emitter.place_label(&start_of_else);
            lower_block(session, else_branch)?;
            session.emitter.place_label(&end);
        }

        Stmt::While { condition, body } => {
            let start = session.emitter.reserve_label();
            let end = session.emitter.reserve_label();
            session.emitter.place_label(&start);
            lower_expression(session, condition)?;
            session.emitter.emit(Opcode::Jmpz, &[end.name()]);
            lower_block(session, body)?;
            session.emitter.emit(Opcode::Jmp, &[start.name()]);
            session.emitter.place_label(&end);
        }

        Stmt::Expression(expr) => {
            lower_expression(session, expr)?;
            session.emitter.emit(Opcode::Pop, &[]);
        }

        // Output is not implemented; the expression is parsed but never evaluated.
        Stmt::Print(_) => session.emitter.insert_comment("print statement is skipped."),

        Stmt::Sequence(first, second) => {
            lower_statement(session, first)?;
            lower_statement(session, second)?;
        }
    }
    Ok(())
}

fn lower_block(session: &mut CompilationSession, block: &Block) -> Result<(), CodegenError> {
    match block {
        Some(stmt) => lower_statement(session, stmt),
        None => Ok(()),
    }
}

pub fn lower_expression(session: &mut CompilationSession, expr: &Expr) -> Result<(), CodegenError> {
    match expr {
        Expr::Identifier(name) => {
            load_variable_address(session, name)?;
            session.emitter.emit(Opcode::Load4, &[]);
        }

        Expr::Constant(value) => push_constant(&mut session.emitter, *value),

        Expr::Binary { left, op: BinaryOp::Assign, right } => {
            if !left.is_assignable() {
                return Err(CodegenError::NotAssignable { target: left.to_string() });
            }
            // an assignable expression displays as the bare variable name
            let target = left.to_string();
            lower_expression(session, right)?;
            // the duplicate is the value of the assignment expression itself
            session.emitter.emit(Opcode::Dup, &[]);
            load_variable_address(session, &target)?;
            session.emitter.emit(Opcode::Store4, &[]);
        }

        Expr::Binary { left, op, right } => {
            lower_expression(session, left)?;
            lower_expression(session, right)?;
            for opcode in binary_sequence(*op) {
                session.emitter.emit(*opcode, &[]);
            }
        }
    }
    Ok(())
}

/// Instructions applied to the two operands on top of the stack.
fn binary_sequence(op: BinaryOp) -> &'static [Opcode] {
    use Opcode::*;
    match op {
        BinaryOp::Add => &[Add],
        BinaryOp::Sub => &[Sub],
        BinaryOp::Mul => &[Mul],
        BinaryOp::Div => &[Div],
        BinaryOp::Mod => &[Mod],
        BinaryOp::BitAnd => &[BitAnd],
        BinaryOp::BitOr => &[BitOr],
        BinaryOp::BitXor => &[BitXor],
        BinaryOp::Equal => &[Cmp, Not],
        BinaryOp::NotEqual => &[Cmp],
        BinaryOp::Greater => &[Cmp, Dec, Not],
        BinaryOp::GreaterEqual => &[Cmp, Inc],
        BinaryOp::Less => &[Cmp, Inc, Not],
        BinaryOp::LessEqual => &[Cmp, Dec],
        // handled by the caller
        BinaryOp::Assign => &[],
    }
}

fn load_variable_address(session: &mut CompilationSession, name: &str) -> Result<(), CodegenError> {
    let offset = session
        .symbols
        .offset(name)
        .ok_or_else(|| CodegenError::UndeclaredVariable { name: name.to_string() })?;

    let base = Register::RSB.name();
    if offset == 0 {
        session.emitter.emit(Opcode::PushR, &[base]);
    } else {
        session.emitter.emit(Opcode::PushRa, &[base, offset.to_string().as_str()]);
    }
    Ok(())
}

fn push_constant(emitter: &mut Emitter, value: u32) {
    match value {
        0 => emitter.emit(Opcode::PushC0, &[]),
        1 => emitter.emit(Opcode::PushC1, &[]),
        2..=255 => emitter.emit(Opcode::Push1, &[value.to_string().as_str()]),
        _ => emitter.emit(Opcode::Push4, &[value.to_string().as_str()]),
    }
}

/// Compiles a whole program in a fresh session and returns its mnemonics.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let mut session = CompilationSession::new();
    session.compile(source)?;
    Ok(session.into_mnemonics())
}
