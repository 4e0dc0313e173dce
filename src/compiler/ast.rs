//! This AST describes a parsed C-Simplified program.
//!
//! The language has a single integer type, global variables declared with
//! `int`, `if`/`else`, `while`, expression statements and `print`.
//!
//! ```text
//! int x;
//! x = 1;
//! if (x == 1) { x = x + 2; } else { x = 0; }
//! while (x < 10) { x = x + 1; }
//! print x;
//! ```
//!
//! Binary expressions have no precedence: `a - b + c` is read as
//! `a - (b + c)`, and every operator groups to the right.

use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BinaryOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Equal,
    NotEqual,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            Assign => "=",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            BitAnd => "&",
            BitOr => "|",
            BitXor => "^",
            Greater => ">",
            GreaterEqual => ">=",
            Less => "<",
            LessEqual => "<=",
            Equal => "==",
            NotEqual => "!=",
        }
    }
}

impl FromStr for BinaryOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use BinaryOp::*;
        match s {
            "=" => Ok(Assign),
            "+" => Ok(Add),
            "-" => Ok(Sub),
            "*" => Ok(Mul),
            "/" => Ok(Div),
            "%" => Ok(Mod),
            "&" => Ok(BitAnd),
            "|" => Ok(BitOr),
            "^" => Ok(BitXor),
            ">" => Ok(Greater),
            ">=" => Ok(GreaterEqual),
            "<" => Ok(Less),
            "<=" => Ok(LessEqual),
            "==" => Ok(Equal),
            "!=" => Ok(NotEqual),
            _ => Err(format!("`{}` is not a binary operator", s)),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Expr {
    Identifier(String),
    Constant(u32),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Only a bare identifier may appear on the left of `=`.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Identifier(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::Binary { left, op, right } => write!(f, "({} {} {})", left, op, right),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Type {
    Int,
}

impl Type {
    /// Frame bytes reserved for one variable of this type.
    pub fn size(&self) -> u32 {
        match self {
            Type::Int => 4,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
        }
    }
}

/// `None` stands for "no statements", e.g. the body of an empty block.
pub type Block = Option<Box<Stmt>>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Stmt {
    Declaration { ty: Type, name: String },
    Branch {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    While { condition: Expr, body: Block },
    Expression(Expr),
    Print(Expr),
    Sequence(Box<Stmt>, Box<Stmt>),
}

impl Stmt {
    /// Folds statements into a right-leaning `Sequence`; `None` if empty.
    pub fn sequence(stmts: Vec<Stmt>) -> Option<Stmt> {
        stmts.into_iter().rev().fold(None, |rest, stmt| match rest {
            None => Some(stmt),
            Some(rest) => Some(Stmt::Sequence(Box::new(stmt), Box::new(rest))),
        })
    }

    /// Flattens a sequence into its statements, in program order.
    #[cfg(test)]
    pub fn statements(&self) -> Vec<&Stmt> {
        let mut out = Vec::new();
        let mut cur = self;
        while let Stmt::Sequence(first, second) = cur {
            out.extend(first.statements());
            cur = second.as_ref();
        }
        out.push(cur);
        out
    }
}
