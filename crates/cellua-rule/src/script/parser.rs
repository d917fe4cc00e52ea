//! Recursive-descent parser for rule-script transitions.
//!
//! ```text
//! transition := ("let" IDENT "=" expr ";")* expr
//! expr       := "if" expr "then" expr "else" expr | or
//! or         := and ("||" and)*
//! and        := cmp ("&&" cmp)*
//! cmp        := sum (("==" | "!=" | "<" | "<=" | ">" | ">=") sum)*
//! sum        := product (("+" | "-") product)*
//! product    := unary (("*" | "/" | "%") unary)*
//! unary      := ("-" | "!") unary | primary
//! primary    := INT | NAME | NAME "[" expr "]" | NAME "(" args ")" | "(" expr ")"
//! ```
//!
//! Names are resolved while parsing, so an evaluated program never looks
//! anything up by string.

use super::error::{ScriptError, Span};
use super::lexer::{tokenize, Token, TokenClass};

/// Nesting limit for expressions. Every operator in a chain counts as one
/// level, since chains build left-nested trees.
const MAX_DEPTH: usize = 256;

/// Scalar inputs available to every script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Builtin {
    State,
    Live,
    Size,
    Gen,
}

/// Indexable inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Sequence {
    Neighbors,
    Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Func {
    Count,
    Sum,
    Min,
    Max,
    Abs,
    Bit,
}

impl Func {
    fn lookup(name: &str) -> Option<(Func, usize)> {
        Some(match name {
            "count" => (Func::Count, 1),
            "sum" => (Func::Sum, 0),
            "min" => (Func::Min, 2),
            "max" => (Func::Max, 2),
            "abs" => (Func::Abs, 1),
            "bit" => (Func::Bit, 2),
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum UnOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Expr {
    Int(i128),
    Builtin(Builtin),
    Local(usize),
    Index(Sequence, Box<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

/// A parsed transition: `let` bindings evaluated in order into local
/// slots, then the result expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Program {
    pub lets: Vec<Expr>,
    pub body: Expr,
}

const RESERVED: &[&str] = &[
    "state", "live", "size", "gen", "nb", "pos", "count", "sum", "min", "max", "abs", "bit",
];

/// Parse the transition section. `base` is the section's byte offset in
/// the whole script.
pub(crate) fn parse_transition(
    source: &str,
    base: usize,
    aware: bool,
) -> Result<Program, ScriptError> {
    let tokens = tokenize(source, base)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        locals: Vec::new(),
        aware,
        depth: 0,
    };
    parser.program()
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    locals: Vec<&'a str>,
    aware: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_punct(&self, p: &str) -> bool {
        matches!(self.peek(), Some(Token { class: TokenClass::Punct(q), .. }) if q == p)
    }

    fn at_keyword(&self, k: &str) -> bool {
        matches!(self.peek(), Some(Token { class: TokenClass::Keyword(q), .. }) if q == k)
    }

    fn unexpected(&self, expected: &'static str) -> ScriptError {
        match self.peek() {
            Some(tok) => ScriptError::Unexpected {
                span: tok.span,
                expected,
                found: tok.text().to_string(),
            },
            None => ScriptError::UnexpectedEnd { expected },
        }
    }

    fn expect_punct(&mut self, p: &str, expected: &'static str) -> Result<Span, ScriptError> {
        if self.at_punct(p) {
            Ok(self.advance().map(|t| t.span).unwrap_or_default())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_keyword(&mut self, k: &str, expected: &'static str) -> Result<(), ScriptError> {
        if self.at_keyword(k) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn enter(&mut self) -> Result<(), ScriptError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let span = self.peek().map(|t| t.span).unwrap_or_default();
            return Err(ScriptError::TooDeep { span });
        }
        Ok(())
    }

    fn program(&mut self) -> Result<Program, ScriptError> {
        let mut lets = Vec::new();
        while self.at_keyword("let") {
            self.advance();
            let (name, span) = match self.peek() {
                Some(Token {
                    class: TokenClass::Ident(name),
                    span,
                }) => (name, span),
                _ => return Err(self.unexpected("a name after `let`")),
            };
            self.advance();
            if RESERVED.contains(&name) || self.locals.contains(&name) {
                return Err(ScriptError::Redefined {
                    span,
                    name: name.to_string(),
                });
            }
            self.expect_punct("=", "`=`")?;
            let value = self.expr()?;
            self.expect_punct(";", "`;` after a binding")?;
            self.locals.push(name);
            lets.push(value);
        }
        let body = self.expr()?;
        if self.peek().is_some() {
            return Err(self.unexpected("end of transition"));
        }
        Ok(Program { lets, body })
    }

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        self.enter()?;
        let result = if self.at_keyword("if") {
            self.advance();
            let cond = self.expr()?;
            self.expect_keyword("then", "`then`")?;
            let then = self.expr()?;
            self.expect_keyword("else", "`else`")?;
            let otherwise = self.expr()?;
            Expr::If(Box::new(cond), Box::new(then), Box::new(otherwise))
        } else {
            self.or()?
        };
        self.depth -= 1;
        Ok(result)
    }

    /// Parse a left-associative chain of `ops` over `operand`.
    fn chain(
        &mut self,
        ops: &[(&str, BinOp)],
        operand: fn(&mut Self) -> Result<Expr, ScriptError>,
    ) -> Result<Expr, ScriptError> {
        let mark = self.depth;
        let mut left = operand(self)?;
        while let Some(&(_, op)) = ops.iter().find(|(p, _)| self.at_punct(p)) {
            self.advance();
            self.enter()?;
            let right = operand(self)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = mark;
        Ok(left)
    }

    fn or(&mut self) -> Result<Expr, ScriptError> {
        self.chain(&[("||", BinOp::Or)], Self::and)
    }

    fn and(&mut self) -> Result<Expr, ScriptError> {
        self.chain(&[("&&", BinOp::And)], Self::cmp)
    }

    fn cmp(&mut self) -> Result<Expr, ScriptError> {
        self.chain(
            &[
                ("==", BinOp::Eq),
                ("!=", BinOp::Ne),
                ("<=", BinOp::Le),
                (">=", BinOp::Ge),
                ("<", BinOp::Lt),
                (">", BinOp::Gt),
            ],
            Self::sum,
        )
    }

    fn sum(&mut self) -> Result<Expr, ScriptError> {
        self.chain(&[("+", BinOp::Add), ("-", BinOp::Sub)], Self::product)
    }

    fn product(&mut self) -> Result<Expr, ScriptError> {
        self.chain(
            &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Rem)],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = if self.at_punct("-") {
            UnOp::Neg
        } else if self.at_punct("!") {
            UnOp::Not
        } else {
            return self.primary();
        };
        self.advance();
        self.enter()?;
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let Some(tok) = self.peek() else {
            return Err(self.unexpected("an expression"));
        };
        match tok.class {
            TokenClass::Int(text) => {
                self.advance();
                text.parse::<i128>()
                    .map(Expr::Int)
                    .map_err(|_| ScriptError::LiteralTooLarge { span: tok.span })
            }
            TokenClass::Punct("(") => {
                self.advance();
                let inner = self.expr()?;
                self.expect_punct(")", "`)`")?;
                Ok(inner)
            }
            TokenClass::Keyword("if") => self.expr(),
            TokenClass::Ident(name) => {
                self.advance();
                self.name(name, tok.span)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn name(&mut self, name: &'a str, span: Span) -> Result<Expr, ScriptError> {
        let require_aware = |aware: bool| {
            if aware {
                Ok(())
            } else {
                Err(ScriptError::NotAware {
                    span,
                    name: name.to_string(),
                })
            }
        };
        if self.at_punct("(") {
            let Some((func, arity)) = Func::lookup(name) else {
                return Err(ScriptError::UnknownName {
                    span,
                    name: name.to_string(),
                });
            };
            self.advance();
            let mut args = Vec::new();
            if !self.at_punct(")") {
                loop {
                    args.push(self.expr()?);
                    if !self.at_punct(",") {
                        break;
                    }
                    self.advance();
                }
            }
            let close = self.expect_punct(")", "`,` or `)`")?;
            if args.len() != arity {
                return Err(ScriptError::Arity {
                    span: span.merge(close),
                    name: name.to_string(),
                    expected: arity,
                    found: args.len(),
                });
            }
            return Ok(Expr::Call(func, args));
        }
        let seq = match name {
            "nb" => Some(Sequence::Neighbors),
            "pos" => {
                require_aware(self.aware)?;
                Some(Sequence::Position)
            }
            _ => None,
        };
        if let Some(seq) = seq {
            self.expect_punct("[", "`[` after a sequence name")?;
            let index = self.expr()?;
            self.expect_punct("]", "`]`")?;
            return Ok(Expr::Index(seq, Box::new(index)));
        }
        let builtin = match name {
            "state" => Builtin::State,
            "live" => Builtin::Live,
            "size" => Builtin::Size,
            "gen" => {
                require_aware(self.aware)?;
                Builtin::Gen
            }
            _ => {
                return match self.locals.iter().rposition(|&l| l == name) {
                    Some(slot) => Ok(Expr::Local(slot)),
                    None => Err(ScriptError::UnknownName {
                        span,
                        name: name.to_string(),
                    }),
                }
            }
        };
        Ok(Expr::Builtin(builtin))
    }
}
