//! Expression tree for parsed formulas.

use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;

use super::lexer::Comparison;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Pow,
    /// A comparison yielding 1 or 0.
    Compare(Comparison),
}

impl BinaryOp {
    /// Returns the operator text.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
            BinaryOp::Compare(op) => op.symbol(),
        }
    }
}

/// A parsed formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Numeric literal.
    Num(Decimal),
    /// Variable reference.
    Var(String),
    /// Unary negation.
    Neg(Box<Expr>),
    /// Binary operation.
    BinOp {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `SI(condition; when_true; when_false)`.
    Ternary {
        /// Condition; true when non-zero.
        condition: Box<Expr>,
        /// Value when the condition holds.
        when_true: Box<Expr>,
        /// Value otherwise.
        when_false: Box<Expr>,
    },
}

impl Expr {
    /// Returns every variable name referenced by the expression.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Num(_) => {}
            Expr::Var(name) => {
                names.insert(name.as_str());
            }
            Expr::Neg(inner) => inner.collect_variables(names),
            Expr::BinOp { lhs, rhs, .. } => {
                lhs.collect_variables(names);
                rhs.collect_variables(names);
            }
            Expr::Ternary {
                condition,
                when_true,
                when_false,
            } => {
                condition.collect_variables(names);
                when_true.collect_variables(names);
                when_false.collect_variables(names);
            }
        }
    }

    /// Returns true if `name` is a positively-signed term of the top-level sum.
    ///
    /// `Valor * Palets + Peaje` adds `Peaje`; `(Valor + Peaje) * Palets` and
    /// `Valor - Peaje` do not.
    pub fn adds_variable(&self, name: &str) -> bool {
        match self {
            Expr::Var(var) => var == name,
            Expr::BinOp {
                op: BinaryOp::Add,
                lhs,
                rhs,
            } => lhs.adds_variable(name) || rhs.adds_variable(name),
            Expr::BinOp {
                op: BinaryOp::Sub,
                lhs,
                ..
            } => lhs.adds_variable(name),
            _ => false,
        }
    }
}

impl fmt::Display for Expr {
    /// Renders the desugared form, with conditionals as `(c ? a : b)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Var(name) => f.write_str(name),
            Expr::Neg(inner) => write!(f, "-{}", inner),
            Expr::BinOp { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Expr::Ternary {
                condition,
                when_true,
                when_false,
            } => write!(f, "({} ? {} : {})", condition, when_true, when_false),
        }
    }
}
