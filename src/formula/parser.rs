//! Recursive-descent parser for pricing formulas.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! comparison     := additive (CMP additive)?
//! additive       := multiplicative (("+" | "-") multiplicative)*
//! multiplicative := unary (("*" | "/") unary)*
//! unary          := ("-" | "+") unary | power
//! power          := primary ("^" unary)?
//! primary        := NUMBER | IDENT | "(" comparison ")"
//!                 | "SI" "(" comparison ";" comparison ";" comparison ")"
//! ```

use crate::error::FormulaError;

use super::ast::{BinaryOp, Expr};
use super::lexer::{Spanned, Token, tokenize};

/// Maximum nesting of parentheses and conditionals, and maximum height of
/// the parsed tree.
pub const MAX_NESTING_DEPTH: usize = 64;

/// The name of the conditional primitive, matched case-insensitively.
pub const CONDITIONAL_KEYWORD: &str = "SI";

/// Parses formula text into an expression tree.
///
/// # Examples
///
/// ```
/// use freight_tariff_engine::formula::parse;
///
/// let expr = parse("SI(Palets > 10; Valor * 0,9; Valor)").unwrap();
/// assert_eq!(expr.to_string(), "((Palets > 10) ? (Valor * 0.9) : Valor)");
///
/// assert!(parse("SI(Palets > 10; Valor").is_err());
/// ```
pub fn parse(source: &str) -> Result<Expr, FormulaError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(FormulaError::Empty);
    }
    check_balanced(&tokens)?;

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let node = parser.comparison()?;
    match parser.peek() {
        None => Ok(node.expr),
        Some(spanned) => Err(unexpected(spanned)),
    }
}

fn check_balanced(tokens: &[Spanned]) -> Result<(), FormulaError> {
    let mut open = 0usize;
    for spanned in tokens {
        match spanned.token {
            Token::LParen => open += 1,
            Token::RParen => {
                open = open
                    .checked_sub(1)
                    .ok_or(FormulaError::UnbalancedParentheses)?;
            }
            _ => {}
        }
    }
    if open == 0 {
        Ok(())
    } else {
        Err(FormulaError::UnbalancedParentheses)
    }
}

fn unexpected(spanned: &Spanned) -> FormulaError {
    FormulaError::UnexpectedToken {
        found: spanned.token.to_string(),
        position: spanned.position,
    }
}

struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    depth: usize,
}

/// A parsed subtree and its height, leaves counting as one.
struct Node {
    expr: Expr,
    height: usize,
}

impl Node {
    fn leaf(expr: Expr) -> Self {
        Self { expr, height: 1 }
    }

    fn branch(expr: Expr, height: usize) -> Result<Self, FormulaError> {
        if height > MAX_NESTING_DEPTH {
            return Err(FormulaError::TooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        Ok(Self { expr, height })
    }
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&'t Token> {
        self.peek().map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<&'t Spanned> {
        let spanned = self.tokens.get(self.pos);
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    fn expect(&mut self, expected: &Token) -> Result<(), FormulaError> {
        match self.advance() {
            Some(spanned) if &spanned.token == expected => Ok(()),
            Some(spanned) => Err(unexpected(spanned)),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, FormulaError>,
    ) -> Result<T, FormulaError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(FormulaError::TooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn comparison(&mut self) -> Result<Node, FormulaError> {
        let lhs = self.additive()?;
        if let Some(Token::Compare(op)) = self.peek_token() {
            self.pos += 1;
            let rhs = self.additive()?;
            return binary(BinaryOp::Compare(*op), lhs, rhs);
        }
        Ok(lhs)
    }

    // Operator chains grow the tree one level per term, so a long flat
    // sum hits the height limit like deep parentheses do.
    fn additive(&mut self) -> Result<Node, FormulaError> {
        let mut node = self.multiplicative()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(node),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            node = binary(op, node, rhs)?;
        }
    }

    fn multiplicative(&mut self) -> Result<Node, FormulaError> {
        let mut node = self.unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(node),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            node = binary(op, node, rhs)?;
        }
    }

    fn unary(&mut self) -> Result<Node, FormulaError> {
        match self.peek_token() {
            Some(Token::Minus) => {
                self.pos += 1;
                let inner = self.nested(|p| p.unary())?;
                Node::branch(Expr::Neg(Box::new(inner.expr)), inner.height + 1)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(|p| p.unary())
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Node, FormulaError> {
        let base = self.primary()?;
        if let Some(Token::Caret) = self.peek_token() {
            self.pos += 1;
            let exponent = self.nested(|p| p.unary())?;
            return binary(BinaryOp::Pow, base, exponent);
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Node, FormulaError> {
        let spanned = self.advance().ok_or(FormulaError::UnexpectedEnd)?;
        match &spanned.token {
            Token::Number(value) => Ok(Node::leaf(Expr::Num(*value))),
            Token::Ident(name)
                if name.eq_ignore_ascii_case(CONDITIONAL_KEYWORD)
                    && self.peek_token() == Some(&Token::LParen) =>
            {
                self.nested(|p| p.conditional())
            }
            Token::Ident(name) => Ok(Node::leaf(Expr::Var(name.clone()))),
            Token::LParen => {
                let inner = self.nested(|p| p.comparison())?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            _ => Err(unexpected(spanned)),
        }
    }

    /// Parses the argument list of `SI`, positioned at its opening parenthesis.
    fn conditional(&mut self) -> Result<Node, FormulaError> {
        self.expect(&Token::LParen)?;
        let mut args = Vec::with_capacity(3);
        loop {
            args.push(self.comparison()?);
            match self.advance() {
                Some(Spanned {
                    token: Token::Semicolon,
                    ..
                }) => continue,
                Some(Spanned {
                    token: Token::RParen,
                    ..
                }) => break,
                Some(spanned) => return Err(unexpected(spanned)),
                None => return Err(FormulaError::UnexpectedEnd),
            }
        }

        let found = args.len();
        let mut args = args.into_iter();
        match (args.next(), args.next(), args.next(), args.next()) {
            (Some(condition), Some(when_true), Some(when_false), None) => {
                let height = 1 + condition
                    .height
                    .max(when_true.height)
                    .max(when_false.height);
                Node::branch(
                    Expr::Ternary {
                        condition: Box::new(condition.expr),
                        when_true: Box::new(when_true.expr),
                        when_false: Box::new(when_false.expr),
                    },
                    height,
                )
            }
            _ => Err(FormulaError::ConditionalArity { found }),
        }
    }
}

fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Result<Node, FormulaError> {
    let height = 1 + lhs.height.max(rhs.height);
    Node::branch(
        Expr::BinOp {
            op,
            lhs: Box::new(lhs.expr),
            rhs: Box::new(rhs.expr),
        },
        height,
    )
}
