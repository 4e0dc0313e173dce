//! Static classification tables for C-Simplified source text.
//!
//! The operator table is the one the scanner consults when it decides between
//! a two-character operator, a one-character operator and a bare symbol. It
//! does not contain `%`, `&`, `|` or `^`, and none of those characters can
//! start a token, so the modulo and bitwise opcodes supported by code
//! generation are unreachable from source text.

pub const KW_INT: &str = "int";
pub const KW_WHILE: &str = "while";
pub const KW_IF: &str = "if";
pub const KW_ELSE: &str = "else";
pub const KW_PRINT: &str = "print";

pub const KEYWORDS: [&str; 5] = [KW_INT, KW_WHILE, KW_IF, KW_ELSE, KW_PRINT];

pub const OPERATORS: [&str; 11] = ["=", "+", "-", "*", "/", ">", ">=", "<", "<=", "==", "!="];

pub const LEFT_PARENTHESIS: &str = "(";
pub const RIGHT_PARENTHESIS: &str = ")";
pub const LEFT_BRACE: &str = "{";
pub const RIGHT_BRACE: &str = "}";
pub const SEMICOLON: &str = ";";


pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

pub fn is_operator(s: &str) -> bool {
    OPERATORS.contains(&s)
}

/// Characters that begin an operator or symbol token.
pub fn starts_punctuation(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '=' | '>' | '<' | '!' | '(' | ')' | '{' | '}' | ';'
    )
}
