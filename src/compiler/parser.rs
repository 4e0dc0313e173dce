//! The Parser module pulls tokens from a Scanner and builds the program AST.
//!
//! It is a plain recursive-descent parser with one token of lookahead, held
//! in the scanner's pushback slot.
use super::ast::*;
use super::lexer::{Scanner, Token, TokenKind};
use super::tables::*;
use crate::error::ParseError;

pub struct Parser<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(scanner: Scanner<'a>) -> Self {
        Parser { scanner }
    }

    /// Run the parser, consuming itself and returning the whole program.
    /// An empty program yields `None`.
    pub fn run(mut self) -> Result<Option<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        while !self.scanner.is_at_end() {
            if let Some(stmt) = self.statement()? {
                stmts.push(stmt);
            }
        }
        debug!("parsed {} top-level statement(s)", stmts.len());
        Ok(Stmt::sequence(stmts))
    }

    /// Parses one statement. Returns `None` at end of input.
    fn statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        let token = match self.consume()? {
            Some(token) => token,
            None => return Ok(None),
        };

        let stmt = match token.kind {
            TokenKind::Keyword => match token.text.as_str() {
                KW_INT => {
                    let name = self.identifier()?;
                    self.discard_or_fail(SEMICOLON)?;
                    Stmt::Declaration { ty: Type::Int, name }
                }
                KW_IF => {
                    let condition = self.parenthesized()?;
                    let then_branch = self.braced_block()?;
                    let else_branch = if self.discard_if_matches(KW_ELSE)? {
                        Some(self.braced_block()?)
                    } else {
                        None
                    };
                    Stmt::Branch { condition, then_branch, else_branch }
                }
                KW_WHILE => {
                    let condition = self.parenthesized()?;
                    let body = self.braced_block()?;
                    Stmt::While { condition, body }
                }
                KW_PRINT => {
                    let expr = self.expression()?;
                    self.discard_or_fail(SEMICOLON)?;
                    Stmt::Print(expr)
                }
                _ => return Err(unexpected("a statement", &token)),
            },
            TokenKind::Identifier => {
                self.scanner.put_back(token);
                let expr = self.expression()?;
                self.discard_or_fail(SEMICOLON)?;
                Stmt::Expression(expr)
            }
            _ => return Err(unexpected("a statement", &token)),
        };

        trace!("statement: {:?}", stmt);
        Ok(Some(stmt))
    }

    /// `operand [operator expression]`, where the operand is an identifier,
    /// a constant or a parenthesized expression. Everything after an operator
    /// becomes its right-hand side.
    fn expression(&mut self) -> Result<Expr, ParseError> {
        let token = self.expect_token("an expression")?;

        let left = match token.kind {
            TokenKind::Identifier => Expr::Identifier(token.text),
            TokenKind::Constant => Expr::Constant(constant(&token)?),
            TokenKind::Symbol if token.is(LEFT_PARENTHESIS) => {
                self.scanner.put_back(token);
                self.parenthesized()?
            }
            _ => return Err(unexpected("an expression", &token)),
        };

        match self.consume()? {
            Some(token) if token.kind == TokenKind::Operator => {
                let op = token
                    .text
                    .parse::<BinaryOp>()
                    .map_err(|_| unexpected("a binary operator", &token))?;
                let right = self.expression()?;
                Ok(Expr::binary(left, op, right))
            }
            Some(token) => {
                self.scanner.put_back(token);
                Ok(left)
            }
            None => Ok(left),
        }
    }

    fn parenthesized(&mut self) -> Result<Expr, ParseError> {
        self.discard_or_fail(LEFT_PARENTHESIS)?;
        let expr = self.expression()?;
        self.discard_or_fail(RIGHT_PARENTHESIS)?;
        Ok(expr)
    }

    fn braced_block(&mut self) -> Result<Block, ParseError> {
        self.discard_or_fail(LEFT_BRACE)?;

        let mut stmts = Vec::new();
        while !self.discard_if_matches(RIGHT_BRACE)? {
            match self.statement()? {
                Some(stmt) => stmts.push(stmt),
                None => return Err(end_of_input(RIGHT_BRACE)),
            }
        }

        Ok(Stmt::sequence(stmts).map(Box::new))
    }

    fn identifier(&mut self) -> Result<String, ParseError> {
        let token = self.expect_token("an identifier")?;
        if token.kind == TokenKind::Identifier {
            Ok(token.text)
        } else {
            Err(unexpected("an identifier", &token))
        }
    }

    /// Consumes the next token if its text is `text`, otherwise leaves it
    /// for the next read.
    fn discard_if_matches(&mut self, text: &str) -> Result<bool, ParseError> {
        match self.consume()? {
            Some(token) if token.is(text) => Ok(true),
            Some(token) => {
                self.scanner.put_back(token);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn discard_or_fail(&mut self, text: &str) -> Result<(), ParseError> {
        match self.consume()? {
            Some(token) if token.is(text) => Ok(()),
            Some(token) => Err(unexpected(&format!("`{}`", text), &token)),
            None => Err(end_of_input(text)),
        }
    }

    fn expect_token(&mut self, expected: &str) -> Result<Token, ParseError> {
        match self.consume()? {
            Some(token) => Ok(token),
            None => Err(ParseError::UnexpectedEnd { expected: expected.to_string() }),
        }
    }

    #[inline]
    fn consume(&mut self) -> Result<Option<Token>, ParseError> {
        Ok(self.scanner.scan()?)
    }
}

/// Parses a whole program read from `scanner`.
pub fn parse_program(scanner: Scanner) -> Result<Option<Stmt>, ParseError> {
    Parser::new(scanner).run()
}

pub fn parse(source: &str) -> Result<Option<Stmt>, ParseError> {
    parse_program(Scanner::new(source))
}

fn constant(token: &Token) -> Result<u32, ParseError> {
    token.text.parse::<u32>().map_err(|_| ParseError::ConstantOutOfRange {
        text: token.text.clone(),
        position: token.position,
    })
}

fn unexpected(expected: &str, token: &Token) -> ParseError {
    ParseError::Unexpected {
        expected: expected.to_string(),
        found: token.text.clone(),
        position: token.position,
    }
}

fn end_of_input(symbol: &str) -> ParseError {
    ParseError::UnexpectedEnd { expected: format!("`{}`", symbol) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::CharPosition;
    use crate::error::LexError;

    fn id(name: &str) -> Expr {
        Expr::Identifier(name.to_string())
    }

    fn parse_expr(source: &str) -> Expr {
        let mut parser = Parser::new(Scanner::new(source));
        parser.expression().unwrap()
    }

    fn single(source: &str) -> Stmt {
        parse(source).unwrap().unwrap()
    }

    #[test]
    fn test_expression_operands() {
        assert_eq!(parse_expr("x"), id("x"));
        assert_eq!(parse_expr("42"), Expr::Constant(42));
        assert_eq!(parse_expr("((7))"), Expr::Constant(7));
        assert_eq!(parse_expr("4294967295"), Expr::Constant(u32::MAX));
    }

    #[test]
    fn test_expression_is_right_associative() {
        // a - b + c groups as a - (b + c)
        assert_eq!(
            parse_expr("a - b + c"),
            Expr::binary(id("a"), BinaryOp::Sub, Expr::binary(id("b"), BinaryOp::Add, id("c")))
        );
        // no precedence: a * b + c groups as a * (b + c)
        assert_eq!(
            parse_expr("a * b + c"),
            Expr::binary(id("a"), BinaryOp::Mul, Expr::binary(id("b"), BinaryOp::Add, id("c")))
        );
        assert_eq!(
            parse_expr("(a * b) + c"),
            Expr::binary(Expr::binary(id("a"), BinaryOp::Mul, id("b")), BinaryOp::Add, id("c"))
        );
    }

    #[test]
    fn test_expression_leaves_terminator() {
        let mut parser = Parser::new(Scanner::new("x = 1; y"));
        assert_eq!(
            parser.expression().unwrap(),
            Expr::binary(id("x"), BinaryOp::Assign, Expr::Constant(1))
        );
        assert!(parser.discard_if_matches(";").unwrap());
        assert!(!parser.discard_if_matches(";").unwrap());
        assert_eq!(parser.identifier().unwrap(), "y");
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            single("int counter;"),
            Stmt::Declaration { ty: Type::Int, name: "counter".to_string() }
        );
        assert!(matches!(parse("int 5;"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("int x"), Err(ParseError::UnexpectedEnd { .. })));
    }

    #[test]
    fn test_branch() {
        assert_eq!(
            single("if (x) { y = 1; }"),
            Stmt::Branch {
                condition: id("x"),
                then_branch: Some(Box::new(Stmt::Expression(Expr::binary(
                    id("y"),
                    BinaryOp::Assign,
                    Expr::Constant(1)
                )))),
                else_branch: None,
            }
        );
        assert_eq!(
            single("if (x == 0) {} else { print x; }"),
            Stmt::Branch {
                condition: Expr::binary(id("x"), BinaryOp::Equal, Expr::Constant(0)),
                then_branch: None,
                else_branch: Some(Some(Box::new(Stmt::Print(id("x"))))),
            }
        );
        assert_eq!(
            single("if (x) {} else {}"),
            Stmt::Branch { condition: id("x"), then_branch: None, else_branch: Some(None) }
        );
    }

    #[test]
    fn test_while() {
        let stmt = single("while (i < 10) { i = i + 1; print i; }");
        match stmt {
            Stmt::While { condition, body } => {
                assert_eq!(condition, Expr::binary(id("i"), BinaryOp::Less, Expr::Constant(10)));
                assert_eq!(body.unwrap().statements().len(), 2);
            }
            other => panic!("expected a while loop, got {:?}", other),
        }
    }

    #[test]
    fn test_program_sequence() {
        let program = parse("int x;\nx = 1;\nprint x;\n").unwrap().unwrap();
        let stmts = program.statements();
        assert_eq!(stmts.len(), 3);
        assert!(matches!(stmts[0], Stmt::Declaration { .. }));
        assert!(matches!(stmts[1], Stmt::Expression(_)));
        assert!(matches!(stmts[2], Stmt::Print(_)));
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("  \r\n\t").unwrap(), None);
    }

    #[test]
    fn test_unterminated_parenthesis() {
        assert_eq!(
            parse("int x; x = (1 + 2;"),
            Err(ParseError::Unexpected {
                expected: "`)`".to_string(),
                found: ";".to_string(),
                position: CharPosition { line: 1, column: 18 },
            })
        );
    }

    #[test]
    fn test_statement_errors() {
        assert!(matches!(parse("else { }"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("5;"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("x = 1"), Err(ParseError::UnexpectedEnd { .. })));
        assert!(matches!(parse("x = ;"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("x = !y;"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("while x { }"), Err(ParseError::Unexpected { .. })));
        assert!(matches!(parse("if (x) y = 1;"), Err(ParseError::Unexpected { .. })));
        assert_eq!(
            parse("while (x) { x = 0;"),
            Err(ParseError::UnexpectedEnd { expected: "`}`".to_string() })
        );
    }

    #[test]
    fn test_constant_out_of_range() {
        assert_eq!(
            parse("x = 4294967296;"),
            Err(ParseError::ConstantOutOfRange {
                text: "4294967296".to_string(),
                position: CharPosition { line: 1, column: 5 },
            })
        );
    }

    #[test]
    fn test_lex_error_propagates() {
        assert_eq!(
            parse("x = 5 % 2;"),
            Err(ParseError::Lex(LexError::UnexpectedCharacter {
                ch: '%',
                position: CharPosition { line: 1, column: 7 },
            }))
        );
    }
}
