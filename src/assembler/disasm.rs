//! Decodes an assembled module back into instructions.
use std::convert::TryFrom;
use std::fmt;

use super::ast::{Layout, Opcode, Register};
use crate::error::DisassembleError;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    None,
    Immediate(u32),
    Register(Register),
    RegisterOffset(Register, u16),
    /// Absolute offset of a jump target, already resolved from the displacement.
    Relative(u32),
    Absolute(u32),
}

/// One decoded instruction and the offset it starts at.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Decoded {
    pub offset: u32,
    pub opcode: Opcode,
    pub operand: Operand,
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        match self.operand {
            Operand::None => Ok(()),
            Operand::Immediate(val) => write!(f, " {}", val),
            Operand::Register(reg) => write!(f, " {}", reg),
            Operand::RegisterOffset(reg, off) => write!(f, " {} {}", reg, off),
            Operand::Relative(target) | Operand::Absolute(target) => write!(f, " 0x{:04X}", target),
        }
    }
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let slice = self.bytes.get(self.pos..self.pos + n)?;
        self.pos += n;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn u16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn i16(&mut self) -> Option<i16> {
        self.take(2).map(|b| i16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Decodes `bytes` from the start to the end. Fails on the first byte that is
/// not an opcode or on an instruction cut short.
pub fn disassemble(bytes: &[u8]) -> Result<Vec<Decoded>, DisassembleError> {
    let mut reader = Reader { bytes, pos: 0 };
    let mut out = Vec::new();

    while reader.pos < bytes.len() {
        let offset = reader.pos;
        let code = bytes[offset];
        reader.pos += 1;
        let opcode =
            Opcode::try_from(code).map_err(|_| DisassembleError::UnknownOpcode { offset, code })?;
        let truncated = || DisassembleError::Truncated {
            offset,
            opcode: opcode.to_string(),
        };

        let operand = match opcode.layout() {
            Layout::None => Operand::None,
            Layout::U8 => Operand::Immediate(u32::from(reader.u8().ok_or_else(truncated)?)),
            Layout::U16 => Operand::Immediate(u32::from(reader.u16().ok_or_else(truncated)?)),
            Layout::U32 => Operand::Immediate(reader.u32().ok_or_else(truncated)?),
            Layout::Register => Operand::Register(decode_register(offset, reader.u8().ok_or_else(truncated)?)?),
            Layout::RegisterOffset => {
                let reg = decode_register(offset, reader.u8().ok_or_else(truncated)?)?;
                Operand::RegisterOffset(reg, reader.u16().ok_or_else(truncated)?)
            }
            Layout::Relative => {
                let delta = reader.i16().ok_or_else(truncated)?;
                let target = reader.pos as i64 + i64::from(delta);
                let target = u32::try_from(target)
                    .map_err(|_| DisassembleError::TargetOutOfRange { offset, target })?;
                Operand::Relative(target)
            }
            Layout::Absolute => Operand::Absolute(reader.u32().ok_or_else(truncated)?),
        };

        out.push(Decoded {
            offset: offset as u32,
            opcode,
            operand,
        });
    }

    debug!("decoded {} instruction(s) from {} byte(s)", out.len(), bytes.len());
    Ok(out)
}

fn decode_register(offset: usize, code: u8) -> Result<Register, DisassembleError> {
    Register::try_from(code).map_err(|_| DisassembleError::UnknownRegister { offset, code })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;

    #[test]
    fn test_disassemble_program() {
        let text = "\
alloc 4
LABEL Top
push_ra $RSB 0
load_4
jmpz End
push_4 70000
call Top
jmp Top
LABEL End
ret
";
        let program = assemble(text).unwrap();
        let decoded = disassemble(&program.bytes).unwrap();
        let lines: Vec<String> = decoded.iter().map(|d| format!("{:04X} {}", d.offset, d)).collect();
        assert_eq!(
            lines,
            vec![
                "0000 alloc 4",
                "0003 push_ra $RSB 0",
                "0007 load_4",
                "0008 jmpz 0x0018",
                "000B push_4 70000",
                "0010 call 0x0003",
                "0015 jmp 0x0003",
                "0018 ret",
            ]
        );
    }

    #[test]
    fn test_offsets_match_listing() {
        let text = "push_c0\npush_1 9\npush_r $RTD\nswap\nterm\n";
        let program = assemble(text).unwrap();
        let decoded = disassemble(&program.bytes).unwrap();
        let offsets: Vec<u32> = decoded.iter().map(|d| d.offset).collect();
        let listed: Vec<u32> = program.listing.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, listed);
        assert_eq!(decoded[2].operand, Operand::Register(Register::RTD));
    }

    #[test]
    fn test_disassemble_errors() {
        assert_eq!(
            disassemble(&[1, 200]),
            Err(DisassembleError::UnknownOpcode { offset: 1, code: 200 })
        );
        assert_eq!(
            disassemble(&[1, 23, 0, 0]),
            Err(DisassembleError::Truncated { offset: 1, opcode: "push_4".to_string() })
        );
        assert_eq!(
            disassemble(&[24, 9]),
            Err(DisassembleError::UnknownRegister { offset: 0, code: 9 })
        );
        assert_eq!(disassemble(&[]), Ok(vec![]));
    }

    #[test]
    fn test_jump_before_module_start() {
        // jmp -32768 from the end of a 3-byte instruction at offset 0
        assert_eq!(
            disassemble(&[40, 0x00, 0x80]),
            Err(DisassembleError::TargetOutOfRange { offset: 0, target: -32765 })
        );
        // landing exactly on offset 0 is fine
        let decoded = disassemble(&[1, 40, 0xFC, 0xFF]).unwrap();
        assert_eq!(decoded[1].operand, Operand::Relative(0));
    }
}
