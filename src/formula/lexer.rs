//! Tokenizer for pricing formulas.
//!
//! Both `.` and `,` are accepted as decimal separators inside numeric
//! literals. A comma anywhere else is rejected, since `;` separates
//! conditional arguments.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::FormulaError;

/// Comparison operators usable inside `SI` conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=` or `==`
    Eq,
    /// `<>` or `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparison {
    /// Returns the canonical operator text.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "<>",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Numeric literal.
    Number(Decimal),
    /// Identifier: a variable name or `SI`.
    Ident(String),
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `^`
    Caret,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `;`
    Semicolon,
    /// A comparison operator.
    Compare(Comparison),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Ident(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::Caret => f.write_str("^"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Semicolon => f.write_str(";"),
            Token::Compare(op) => f.write_str(op.symbol()),
        }
    }
}

/// A token with its byte offset in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    /// The token.
    pub token: Token,
    /// Byte offset of the token's first character.
    pub position: usize,
}

/// Splits a formula into tokens.
///
/// # Examples
///
/// ```
/// use freight_tariff_engine::formula::{Token, tokenize};
/// use rust_decimal::Decimal;
///
/// let tokens = tokenize("Valor * 1,5").unwrap();
/// assert_eq!(tokens[0].token, Token::Ident("Valor".to_string()));
/// assert_eq!(tokens[1].token, Token::Star);
/// assert_eq!(tokens[2].token, Token::Number(Decimal::new(15, 1)));
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, FormulaError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (position, ch) = chars[i];

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        if ch.is_ascii_digit() || (is_separator(ch) && next_is_digit(&chars, i)) {
            let start = i;
            let mut seen_separator = false;
            while i < chars.len() {
                let c = chars[i].1;
                if c.is_ascii_digit() {
                    i += 1;
                } else if is_separator(c) && !seen_separator && next_is_digit(&chars, i) {
                    seen_separator = true;
                    i += 1;
                } else {
                    break;
                }
            }
            let mut literal: String = chars[start..i]
                .iter()
                .map(|&(_, c)| if c == ',' { '.' } else { c })
                .collect();
            if literal.starts_with('.') {
                literal.insert(0, '0');
            }
            let value = Decimal::from_str(&literal)
                .map_err(|_| FormulaError::InvalidNumber { literal })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                position,
            });
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let start = i;
            while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                i += 1;
            }
            let name: String = chars[start..i].iter().map(|&(_, c)| c).collect();
            tokens.push(Spanned {
                token: Token::Ident(name),
                position,
            });
            continue;
        }

        let next = chars.get(i + 1).map(|&(_, c)| c);
        let (token, width) = match (ch, next) {
            ('<', Some('=')) => (Token::Compare(Comparison::Le), 2),
            ('<', Some('>')) => (Token::Compare(Comparison::Ne), 2),
            ('>', Some('=')) => (Token::Compare(Comparison::Ge), 2),
            ('=', Some('=')) => (Token::Compare(Comparison::Eq), 2),
            ('!', Some('=')) => (Token::Compare(Comparison::Ne), 2),
            ('<', _) => (Token::Compare(Comparison::Lt), 1),
            ('>', _) => (Token::Compare(Comparison::Gt), 1),
            ('=', _) => (Token::Compare(Comparison::Eq), 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('^', _) => (Token::Caret, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (';', _) => (Token::Semicolon, 1),
            _ => return Err(FormulaError::UnexpectedCharacter { ch, position }),
        };
        tokens.push(Spanned { token, position });
        i += width;
    }

    Ok(tokens)
}

fn is_separator(ch: char) -> bool {
    ch == '.' || ch == ','
}

fn next_is_digit(chars: &[(usize, char)], i: usize) -> bool {
    chars.get(i + 1).is_some_and(|&(_, c)| c.is_ascii_digit())
}
