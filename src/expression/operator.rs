use crate::expression::ast::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// `(` sentinel; never reduced.
    Group,
}

/// One row of the static operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    pub symbol: &'static str,
    pub kind: OperatorKind,
    pub precedence: u16,
    pub associativity: Associativity,
}

impl Operator {
    pub fn is_unary(&self) -> bool {
        matches!(self.kind, OperatorKind::Unary(_))
    }
}

const fn binary(symbol: &'static str, op: BinaryOp, precedence: u16) -> Operator {
    Operator {
        symbol,
        kind: OperatorKind::Binary(op),
        precedence,
        associativity: Associativity::Left,
    }
}

pub const GROUP: Operator = Operator {
    symbol: "(",
    kind: OperatorKind::Group,
    precedence: 5,
    associativity: Associativity::None,
};

pub const OPERATORS: &[Operator] = &[
    binary(">", BinaryOp::Gt, 2),
    binary(">=", BinaryOp::Ge, 2),
    binary("<", BinaryOp::Lt, 2),
    binary("<=", BinaryOp::Le, 2),
    binary("+", BinaryOp::Add, 2),
    binary("-", BinaryOp::Sub, 2),
    binary("*", BinaryOp::Mul, 3),
    binary("/", BinaryOp::Div, 3),
    binary("%", BinaryOp::Mod, 3),
    Operator {
        symbol: "-",
        kind: OperatorKind::Unary(UnaryOp::Neg),
        precedence: 2000,
        associativity: Associativity::Right,
    },
];

pub fn find(symbol: &str, unary: bool) -> Option<&'static Operator> {
    OPERATORS
        .iter()
        .find(|o| o.symbol == symbol && o.is_unary() == unary)
}

pub fn binary_precedence(op: BinaryOp) -> u16 {
    OPERATORS
        .iter()
        .find(|o| o.kind == OperatorKind::Binary(op))
        .map_or(0, |o| o.precedence)
}

/// Longest operator symbol that prefixes `rest`.
pub fn match_symbol(rest: &str) -> Option<&'static str> {
    OPERATORS
        .iter()
        .map(|o| o.symbol)
        .filter(|s| rest.starts_with(s))
        .max_by_key(|s| s.len())
}
