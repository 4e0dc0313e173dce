//! The Parser module classifies lexed lines and decodes operand fields.
use once_cell::sync::Lazy;
use regex::Regex;
use std::convert::TryFrom;

use super::ast::*;
use super::lexer::SourceLine;
use crate::error::AssembleError;

/// Optional sign, then decimal, `0x` hexadecimal or `0b` binary digits.
static NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<sign>[+-])?(?:0[xX](?P<hex>[0-9A-Fa-f]+)|0[bB](?P<bin>[01]+)|(?P<dec>[0-9]+))$")
        .expect("operand pattern must compile")
});

/// Turns one lexed line into a label binding or an instruction.
/// Operands are kept as text until they are encoded.
pub fn parse_line(line: &SourceLine) -> Result<Line, AssembleError> {
    let (head, operands) = match line.fields.split_first() {
        Some(split) => split,
        None => {
            return Err(AssembleError::MalformedOperand {
                line: line.number,
                operand: String::new(),
            })
        }
    };

    let statement = match head.as_str() {
        LABEL_MACRO | SUBROUTINE_MACRO => match operands {
            [name] => Statement::Label(name.clone()),
            [] => return Err(AssembleError::MalformedOperand { line: line.number, operand: String::new() }),
            [_, extra, ..] => {
                return Err(AssembleError::MalformedOperand { line: line.number, operand: extra.clone() })
            }
        },
        op => match op.parse::<Opcode>() {
            Ok(opcode) => Statement::Instruction {
                opcode,
                operands: operands.to_vec(),
            },
            Err(_) => {
                return Err(AssembleError::UnknownOpcode {
                    line: line.number,
                    opcode: op.to_string(),
                })
            }
        },
    };

    Ok(Line { number: line.number, statement })
}

/// Checks that `operands` has exactly `count` entries.
pub fn expect_operands(line: usize, operands: &[String], count: usize) -> Result<(), AssembleError> {
    if operands.len() < count {
        Err(AssembleError::MalformedOperand { line, operand: String::new() })
    } else if operands.len() > count {
        Err(AssembleError::MalformedOperand { line, operand: operands[count].clone() })
    } else {
        Ok(())
    }
}

/// Parses an unsigned immediate of type `T`. `width` names the type in errors.
pub fn immediate<T: TryFrom<u64>>(line: usize, text: &str, width: &'static str) -> Result<T, AssembleError> {
    let malformed = || AssembleError::MalformedOperand { line, operand: text.to_string() };
    let overflowed = || AssembleError::OverflowedOperand { line, operand: text.to_string(), width };

    let caps = NUMBER.captures(text).ok_or_else(malformed)?;
    let (digits, radix) = if let Some(m) = caps.name("hex") {
        (m.as_str(), 16)
    } else if let Some(m) = caps.name("bin") {
        (m.as_str(), 2)
    } else if let Some(m) = caps.name("dec") {
        (m.as_str(), 10)
    } else {
        return Err(malformed());
    };

    // The pattern admits only valid digits, so the only failure left is overflow.
    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| overflowed())?;
    let negative = caps.name("sign").map_or(false, |m| m.as_str() == "-");
    if negative && magnitude != 0 {
        return Err(overflowed());
    }

    T::try_from(magnitude).map_err(|_| overflowed())
}

pub fn register(line: usize, text: &str) -> Result<Register, AssembleError> {
    text.parse::<Register>()
        .map_err(|_| AssembleError::UnknownRegisterOrLabel { line, name: text.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(number: usize, fields: &[&str]) -> SourceLine {
        SourceLine {
            number,
            fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line(&source(3, &["push_ra", "$RSB", "4"])),
            Ok(Line {
                number: 3,
                statement: Statement::Instruction {
                    opcode: Opcode::PushRa,
                    operands: vec!["$RSB".to_string(), "4".to_string()],
                },
            })
        );
        assert_eq!(
            parse_line(&source(1, &["LABEL", "Start"])).map(|l| l.statement),
            Ok(Statement::Label("Start".to_string()))
        );
        assert_eq!(
            parse_line(&source(1, &["SUBROUTINE", "helper"])).map(|l| l.statement),
            Ok(Statement::Label("helper".to_string()))
        );
    }

    #[test]
    fn test_parse_line_errors() {
        assert_eq!(
            parse_line(&source(9, &["PUSH_1", "3"])),
            Err(AssembleError::UnknownOpcode { line: 9, opcode: "PUSH_1".to_string() })
        );
        assert_eq!(
            parse_line(&source(2, &["LABEL"])),
            Err(AssembleError::MalformedOperand { line: 2, operand: String::new() })
        );
        assert_eq!(
            parse_line(&source(2, &["LABEL", "a", "b"])),
            Err(AssembleError::MalformedOperand { line: 2, operand: "b".to_string() })
        );
    }

    #[test]
    fn test_expect_operands() {
        let ops = vec!["a".to_string(), "b".to_string()];
        assert_eq!(expect_operands(1, &ops, 2), Ok(()));
        assert_eq!(
            expect_operands(1, &ops, 1),
            Err(AssembleError::MalformedOperand { line: 1, operand: "b".to_string() })
        );
        assert_eq!(
            expect_operands(1, &ops, 3),
            Err(AssembleError::MalformedOperand { line: 1, operand: String::new() })
        );
    }

    #[test]
    fn test_immediate() {
        assert_eq!(immediate::<u8>(1, "0", "u8"), Ok(0));
        assert_eq!(immediate::<u8>(1, "255", "u8"), Ok(255));
        assert_eq!(immediate::<u8>(1, "+7", "u8"), Ok(7));
        assert_eq!(immediate::<u8>(1, "-0", "u8"), Ok(0));
        assert_eq!(immediate::<u8>(1, "0x7f", "u8"), Ok(0x7F));
        assert_eq!(immediate::<u8>(1, "0B101", "u8"), Ok(5));
        assert_eq!(immediate::<u16>(1, "65535", "u16"), Ok(65535));
        assert_eq!(immediate::<u32>(1, "4294967295", "u32"), Ok(u32::MAX));
    }

    #[test]
    fn test_immediate_errors() {
        let overflowed = |operand: &str, width: &'static str| AssembleError::OverflowedOperand {
            line: 4,
            operand: operand.to_string(),
            width,
        };
        let malformed = |operand: &str| AssembleError::MalformedOperand {
            line: 4,
            operand: operand.to_string(),
        };

        assert_eq!(immediate::<u8>(4, "256", "u8"), Err(overflowed("256", "u8")));
        assert_eq!(immediate::<u8>(4, "-1", "u8"), Err(overflowed("-1", "u8")));
        assert_eq!(immediate::<u16>(4, "65536", "u16"), Err(overflowed("65536", "u16")));
        assert_eq!(
            immediate::<u32>(4, "99999999999999999999999", "u32"),
            Err(overflowed("99999999999999999999999", "u32"))
        );

        assert_eq!(immediate::<u8>(4, "12a", "u8"), Err(malformed("12a")));
        assert_eq!(immediate::<u8>(4, "0x", "u8"), Err(malformed("0x")));
        assert_eq!(immediate::<u8>(4, "0b12", "u8"), Err(malformed("0b12")));
        assert_eq!(immediate::<u8>(4, "$RSB", "u8"), Err(malformed("$RSB")));
        assert_eq!(immediate::<u8>(4, "", "u8"), Err(malformed("")));
    }

    #[test]
    fn test_register() {
        assert_eq!(register(1, "$RMB"), Ok(Register::RMB));
        assert_eq!(
            register(6, "$R9"),
            Err(AssembleError::UnknownRegisterOrLabel { line: 6, name: "$R9".to_string() })
        );
    }
}
