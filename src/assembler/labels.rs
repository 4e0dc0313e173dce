//! First pass: walk the lines, size every instruction and bind labels.
use std::collections::HashMap;

use super::ast::{Line, Statement};
use super::lexer::SourceLine;
use super::parser::parse_line;
use crate::error::AssembleError;

/// Label name to the byte offset of the instruction following it.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct LabelTable {
    offsets: HashMap<String, u32>,
}

impl LabelTable {
    pub fn new() -> Self {
        LabelTable::default()
    }

    /// Binds `name`, failing if it is already bound.
    pub fn bind(&mut self, line: usize, name: &str, offset: u32) -> Result<(), AssembleError> {
        if self.offsets.contains_key(name) {
            return Err(AssembleError::DuplicateLabel { line, name: name.to_string() });
        }
        self.offsets.insert(name.to_string(), offset);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.offsets.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Every binding, ordered by offset then name.
    pub fn entries(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> =
            self.offsets.iter().map(|(name, offset)| (name.as_str(), *offset)).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        entries
    }
}

/// Result of the first pass: the parsed lines and the label table.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FirstPass {
    pub lines: Vec<Line>,
    pub labels: LabelTable,
    /// Total size in bytes of the module.
    pub size: u32,
}

pub fn resolve(source: &[SourceLine]) -> Result<FirstPass, AssembleError> {
    let mut lines = Vec::with_capacity(source.len());
    let mut labels = LabelTable::new();
    let mut offset: u32 = 0;

    for raw in source {
        let line = parse_line(raw)?;
        match &line.statement {
            Statement::Label(name) => {
                labels.bind(line.number, name, offset)?;
                trace!("label `{}` => 0x{:04X}", name, offset);
            }
            Statement::Instruction { opcode, .. } => offset += opcode.size(),
        }
        lines.push(line);
    }

    debug!("first pass: {} label(s), {} byte(s)", labels.len(), offset);
    Ok(FirstPass { lines, labels, size: offset })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::lexer::tokenize;

    #[test]
    fn test_label_offsets() {
        let text = "\
LABEL Start
alloc 4
push_4 1000
LABEL Middle
jmpz Start
SUBROUTINE helper
ret
LABEL End
";
        let pass = resolve(&tokenize(text)).unwrap();
        assert_eq!(pass.labels.get("Start"), Some(0));
        assert_eq!(pass.labels.get("Middle"), Some(8));
        assert_eq!(pass.labels.get("helper"), Some(11));
        assert_eq!(pass.labels.get("End"), Some(12));
        assert_eq!(pass.labels.get("Nowhere"), None);
        assert_eq!(pass.size, 12);
        assert_eq!(pass.lines.len(), 8);
        assert_eq!(
            pass.labels.entries(),
            vec![("Start", 0), ("Middle", 8), ("helper", 11), ("End", 12)]
        );
    }

    #[test]
    fn test_duplicate_label() {
        let text = "LABEL Start\nnop\nLABEL Start\n";
        assert_eq!(
            resolve(&tokenize(text)),
            Err(AssembleError::DuplicateLabel { line: 3, name: "Start".to_string() })
        );

        // LABEL and SUBROUTINE share one namespace
        let text = "SUBROUTINE f\nret\nLABEL f\n";
        assert_eq!(resolve(&tokenize(text)).unwrap_err().line(), 3);
    }

    #[test]
    fn test_unknown_opcode_reports_line() {
        let text = "; comment\nnop\n\nfrobnicate 3\n";
        assert_eq!(
            resolve(&tokenize(text)),
            Err(AssembleError::UnknownOpcode { line: 4, opcode: "frobnicate".to_string() })
        );
    }

    #[test]
    fn test_first_error_wins() {
        let text = "LABEL a\nLABEL a\nbogus\n";
        assert!(matches!(resolve(&tokenize(text)), Err(AssembleError::DuplicateLabel { .. })));
    }
}
