//! This lexer splits SSMA mnemonic text into lines of fields.

/// The fields of one non-empty line, with its 1-based line number.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceLine {
    pub number: usize,
    pub fields: Vec<String>,
}

/// Lines that start with a semicolon or are shorter than two characters are
/// dropped entirely, as are lines with no fields left after comment removal.
pub fn tokenize(text: &str) -> Vec<SourceLine> {
    let mut out = Vec::new();

    for (index, line) in text.lines().enumerate() {
        if line.starts_with(';') || line.chars().count() < 2 {
            continue;
        }

        let fields = tokenize_line(line);
        if !fields.is_empty() {
            out.push(SourceLine { number: index + 1, fields });
        }
    }

    debug!("read {} mnemonic line(s)", out.len());
    out
}

fn tokenize_line(line: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(3);

    let mut sb = String::new();
    'mainloop: for c in line.chars() {
        match c {
            ';' => break 'mainloop,
            // Whitespace and commas bound fields and are otherwise ignored.
            c if c.is_whitespace() || c == ',' => {
                if !sb.is_empty() {
                    out.push(sb.clone());
                    sb.clear();
                }
            }
            _ => sb.push(c),
        }
    }
    if !sb.is_empty() {
        out.push(sb);
    }

    out
}
