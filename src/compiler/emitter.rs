//! Accumulates SSMA mnemonic text.
//!
//! The emitter does not validate what it is given; code generation is
//! responsible for pairing each opcode with the operands its layout needs.
use std::fmt;

use crate::assembler::ast::{Opcode, LABEL_MACRO};

/// Handle to a label name handed out by [`Emitter::reserve_label`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Label(String);

impl Label {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Default, Debug)]
pub struct Emitter {
    text: String,
    next_label: usize,
    instructions: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter {
            text: String::with_capacity(4096),
            next_label: 0,
            instructions: 0,
        }
    }

    /// Appends one instruction line: the opcode then each operand, space separated.
    pub fn emit(&mut self, opcode: Opcode, operands: &[&str]) {
        self.text.push_str(opcode.name());
        for operand in operands {
            self.text.push(' ');
            self.text.push_str(operand);
        }
        self.text.push('\n');
        self.instructions += 1;
    }

    pub fn insert_comment(&mut self, comment: &str) {
        self.text.push_str("; ");
        self.text.push_str(comment);
        self.text.push('\n');
    }

    /// Hands out a fresh `Label_<n>` name. Nothing is written until the
    /// label is placed.
    pub fn reserve_label(&mut self) -> Label {
        let label = Label(format!("Label_{}", self.next_label));
        self.next_label += 1;
        label
    }

    /// Marks the offset of the next instruction with `label`.
    pub fn place_label(&mut self, label: &Label) {
        self.text.push_str(LABEL_MACRO);
        self.text.push(' ');
        self.text.push_str(label.name());
        self.text.push('\n');
    }

    /// Number of instruction lines emitted so far. Labels and comments do not count.
    pub fn instruction_count(&self) -> usize {
        self.instructions
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Drops all emitted text and restarts label numbering at zero.
    pub fn reset(&mut self) {
        self.text.clear();
        self.next_label = 0;
        self.instructions = 0;
    }
}
