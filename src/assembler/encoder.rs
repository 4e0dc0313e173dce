//! Second pass: encode every instruction into little-endian machine code.
use std::convert::TryFrom;
use std::ops::Range;

use super::ast::{Layout, Line, Opcode, Statement};
use super::labels::{FirstPass, LabelTable};
use super::parser::{expect_operands, immediate, register};
use crate::error::AssembleError;

/// Growable little-endian byte buffer.
#[derive(Default, Debug)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Encoder { buf: Vec::with_capacity(capacity) }
    }

    pub fn emit_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    pub fn emit_u16(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn emit_i16(&mut self, val: i16) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn emit_u32(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// One encoded instruction, for listings.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ListingEntry {
    pub offset: u32,
    pub line: usize,
    pub text: String,
    pub bytes: Range<usize>,
}

/// An assembled binary module.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Program {
    pub bytes: Vec<u8>,
    pub labels: LabelTable,
    pub listing: Vec<ListingEntry>,
}

impl Program {
    /// The encoded bytes of one listing entry.
    pub fn bytes_of(&self, entry: &ListingEntry) -> &[u8] {
        &self.bytes[entry.bytes.clone()]
    }
}

pub fn encode(pass: FirstPass) -> Result<Program, AssembleError> {
    let FirstPass { lines, labels, size } = pass;
    let mut encoder = Encoder::with_capacity(size as usize);
    let mut listing = Vec::with_capacity(lines.len());
    let mut offset: u32 = 0;

    for line in &lines {
        let (opcode, operands) = match &line.statement {
            Statement::Label(_) => continue,
            Statement::Instruction { opcode, operands } => (*opcode, operands),
        };

        let start = encoder.len();
        let at = offset;
        // Displacements are measured from the end of this instruction.
        offset += opcode.size();

        encoder.emit_u8(opcode.code());
        encode_operands(&mut encoder, line, opcode, operands, offset, &labels)?;
        debug_assert_eq!(encoder.len() - start, opcode.size() as usize);

        trace!("0x{:04X}: {}", at, line.statement);
        listing.push(ListingEntry {
            offset: at,
            line: line.number,
            text: line.statement.to_string(),
            bytes: start..encoder.len(),
        });
    }

    let bytes = encoder.into_bytes();
    debug!("second pass: {} instruction(s), {} byte(s)", listing.len(), bytes.len());
    Ok(Program { bytes, labels, listing })
}

fn encode_operands(
    encoder: &mut Encoder,
    line: &Line,
    opcode: Opcode,
    operands: &[String],
    next: u32,
    labels: &LabelTable,
) -> Result<(), AssembleError> {
    let number = line.number;
    let layout = opcode.layout();
    expect_operands(number, operands, layout.fields())?;

    match layout {
        Layout::None => {}
        Layout::U8 => encoder.emit_u8(immediate(number, &operands[0], "u8")?),
        Layout::U16 => encoder.emit_u16(immediate(number, &operands[0], "u16")?),
        Layout::U32 => encoder.emit_u32(immediate(number, &operands[0], "u32")?),
        Layout::Register => encoder.emit_u8(register(number, &operands[0])?.code()),
        Layout::RegisterOffset => {
            encoder.emit_u8(register(number, &operands[0])?.code());
            encoder.emit_u16(immediate(number, &operands[1], "u16")?);
        }
        Layout::Relative => {
            let target = label(labels, number, &operands[0])?;
            let delta = i64::from(target) - i64::from(next);
            let delta = i16::try_from(delta).map_err(|_| AssembleError::OverflowedOperand {
                line: number,
                operand: operands[0].clone(),
                width: "i16",
            })?;
            encoder.emit_i16(delta);
        }
        Layout::Absolute => encoder.emit_u32(label(labels, number, &operands[0])?),
    }
    Ok(())
}

fn label(labels: &LabelTable, line: usize, name: &str) -> Result<u32, AssembleError> {
    labels
        .get(name)
        .ok_or_else(|| AssembleError::UnknownRegisterOrLabel { line, name: name.to_string() })
}
