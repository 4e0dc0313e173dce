//! This lexer tokenizes C-Simplified source text.
use std::fmt;
use std::str::Chars;

use super::tables;
use crate::error::LexError;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Operator,
    Constant,
    Symbol,
}

/// A 1-based line and the column of a character within it.
/// Column 0 is the position before the first character of a line.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CharPosition {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for CharPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: CharPosition,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: CharPosition) -> Self {
        Token { kind, text: text.into(), position }
    }

    /// True if the token's text is exactly `text`, whatever its kind.
    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Reads source one character at a time and hands out classified tokens.
///
/// The scanner holds a single token of lookahead: a token handed back with
/// [`Scanner::put_back`] is returned by the next call to [`Scanner::scan`].
pub struct Scanner<'a> {
    chars: Chars<'a>,
    current: Option<char>,
    position: CharPosition,
    lookahead: Option<Token>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner {
            chars: source.chars(),
            current: None,
            position: CharPosition { line: 1, column: 0 },
            lookahead: None,
        };
        scanner.next_char();
        scanner
    }

    /// True once the source is exhausted and no token is held back.
    pub fn is_at_end(&self) -> bool {
        self.current.is_none() && self.lookahead.is_none()
    }

    /// Hands a token back to the scanner. Only one token may be held at a time.
    pub fn put_back(&mut self, token: Token) {
        debug_assert!(self.lookahead.is_none(), "scanner lookahead slot already occupied");
        self.lookahead = Some(token);
    }

    /// Returns the next token, or `None` at end of stream.
    pub fn scan(&mut self) -> Result<Option<Token>, LexError> {
        if let Some(token) = self.lookahead.take() {
            return Ok(Some(token));
        }

        while let Some(c) = self.current {
            let position = self.position;

            if c.is_ascii_digit() {
                let text = self.take_while(c, |ch| ch.is_ascii_digit());
                return Ok(Some(Token::new(TokenKind::Constant, text, position)));
            }

            if c.is_alphabetic() || c == '_' {
                let text = self.take_while(c, |ch| ch.is_alphanumeric() || ch == '_');
                let kind = if tables::is_keyword(&text) {
                    TokenKind::Keyword
                } else {
                    TokenKind::Identifier
                };
                return Ok(Some(Token::new(kind, text, position)));
            }

            if tables::starts_punctuation(c) {
                return Ok(Some(self.punctuation(c, position)));
            }

            if c.is_whitespace() {
                self.next_char();
                continue;
            }

            return Err(LexError::UnexpectedCharacter { ch: c, position });
        }

        Ok(None)
    }

    /// Two-character operator first, then one-character operator, then symbol.
    fn punctuation(&mut self, first: char, position: CharPosition) -> Token {
        let single = first.to_string();
        self.next_char();

        if let Some(second) = self.current {
            let double = format!("{}{}", first, second);
            if tables::is_operator(&double) {
                self.next_char();
                return Token::new(TokenKind::Operator, double, position);
            }
        }

        if tables::is_operator(&single) {
            Token::new(TokenKind::Operator, single, position)
        } else {
            Token::new(TokenKind::Symbol, single, position)
        }
    }

    /// Collects `first` and every following character accepted by `accept`.
    fn take_while(&mut self, first: char, accept: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        text.push(first);
        self.next_char();
        while let Some(c) = self.current {
            if !accept(c) {
                break;
            }
            text.push(c);
            self.next_char();
        }
        text
    }

    fn next_char(&mut self) {
        loop {
            match self.chars.next() {
                // Carriage returns are invisible to the rest of the scanner.
                Some('\r') => continue,
                Some('\n') => {
                    self.position.line += 1;
                    self.position.column = 0;
                    self.current = Some('\n');
                }
                Some(c) => {
                    self.position.column += 1;
                    self.current = Some(c);
                }
                None => self.current = None,
            }
            return;
        }
    }
}

/// Scans `source` from the beginning and collects every token.
pub fn scan_all(source: &str) -> Result<Vec<Token>, LexError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = scanner.scan()? {
        tokens.push(token);
    }
    debug!("scanned {} token(s)", tokens.len());
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(line: usize, column: usize) -> CharPosition {
        CharPosition { line, column }
    }

    fn kinds_and_text(source: &str) -> Vec<(TokenKind, String)> {
        scan_all(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_scan_declaration() {
        let tokens = scan_all("int x;").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::new(TokenKind::Keyword, "int", pos(1, 1)),
                Token::new(TokenKind::Identifier, "x", pos(1, 5)),
                Token::new(TokenKind::Symbol, ";", pos(1, 6)),
            ]
        );
    }

    #[test]
    fn test_scan_operators() {
        use TokenKind::*;
        let expected: Vec<(TokenKind, String)> = vec![
            (Identifier, "a"),
            (Operator, ">="),
            (Constant, "10"),
            (Operator, "=="),
            (Operator, "="),
            (Operator, "<"),
            (Operator, "!="),
            (Operator, "-"),
            (Symbol, "!"),
            (Symbol, "("),
        ]
        .into_iter()
        .map(|(k, s)| (k, s.to_string()))
        .collect();
        assert_eq!(kinds_and_text("a>=10=== < != - ! ("), expected);
    }

    #[test]
    fn test_scan_identifiers_and_keywords() {
        use TokenKind::*;
        assert_eq!(
            kinds_and_text("while_ _x1 while if2 else print"),
            vec![
                (Identifier, "while_".to_string()),
                (Identifier, "_x1".to_string()),
                (Keyword, "while".to_string()),
                (Identifier, "if2".to_string()),
                (Keyword, "else".to_string()),
                (Keyword, "print".to_string()),
            ]
        );
    }

    #[test]
    fn test_digits_then_letters_split() {
        use TokenKind::*;
        assert_eq!(
            kinds_and_text("12ab"),
            vec![(Constant, "12".to_string()), (Identifier, "ab".to_string())]
        );
    }

    #[test]
    fn test_positions_across_lines() {
        let tokens = scan_all("int a;\r\n  a = 1;\n").unwrap();
        let positions: Vec<CharPosition> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(
            positions,
            vec![pos(1, 1), pos(1, 5), pos(1, 6), pos(2, 3), pos(2, 5), pos(2, 7), pos(2, 8)]
        );
    }

    #[test]
    fn test_newline_separates_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds_and_text("int\nx"),
            vec![(Keyword, "int".to_string()), (Identifier, "x".to_string())]
        );
    }

    #[test]
    fn test_unreachable_operators_are_lex_errors() {
        for (source, ch) in [("a % b", '%'), ("a & b", '&'), ("a | b", '|'), ("a ^ b", '^')].iter() {
            assert_eq!(
                scan_all(source),
                Err(LexError::UnexpectedCharacter { ch: *ch, position: pos(1, 3) })
            );
        }
        assert!(scan_all("x = 1 # 2").is_err());
    }

    #[test]
    fn test_put_back() {
        let mut scanner = Scanner::new("a b");
        let a = scanner.scan().unwrap().unwrap();
        scanner.put_back(a.clone());
        assert_eq!(scanner.scan().unwrap(), Some(a));
        assert_eq!(scanner.scan().unwrap().unwrap().text, "b");
        assert_eq!(scanner.scan().unwrap(), None);
    }

    #[test]
    fn test_is_at_end() {
        let mut scanner = Scanner::new("x;");
        assert!(!scanner.is_at_end());
        let x = scanner.scan().unwrap().unwrap();
        let semi = scanner.scan().unwrap().unwrap();
        assert!(scanner.is_at_end());
        scanner.put_back(semi);
        assert!(!scanner.is_at_end());
        assert_eq!(x.text, "x");

        let mut scanner = Scanner::new("   \n\t ");
        assert!(!scanner.is_at_end());
        assert_eq!(scanner.scan().unwrap(), None);
        assert!(scanner.is_at_end());

        assert!(Scanner::new("").is_at_end());
    }

    #[test]
    fn test_scan_all_restarts_from_scratch() {
        let source = "if (x) { print x; }";
        assert_eq!(scan_all(source).unwrap(), scan_all(source).unwrap());
        assert_eq!(scan_all(source).unwrap().len(), 9);
    }
}
