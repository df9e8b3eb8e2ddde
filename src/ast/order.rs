use serde::{Deserialize, Serialize};
use std::fmt;

/// Binding strength of a compiled expression, from tightest to loosest.
///
/// The derive order is the precedence order: a variant that compares greater
/// binds more loosely. An expression of order `o` placed in a position that
/// requires `r` is parenthesized iff `o > r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Order {
    /// Literals, names and already-parenthesized text.
    Atomic,
    /// Calls, member access and subscripts.
    FunctionCall,
    /// `**`
    Exponentiation,
    /// Unary sign, `-x`.
    Unary,
    /// `*`, `/`, `//`, `%`
    Multiplicative,
    /// `+`, `-`
    Additive,
    /// Comparisons.
    Relational,
    /// `not x`
    LogicalNot,
    /// `and`
    LogicalAnd,
    /// `or`
    LogicalOr,
    /// `a if c else b`
    Conditional,
    /// The loosest position: a full expression statement or a call argument.
    None,
}

impl Order {
    /// Whether an expression of order `self` must be parenthesized in a position requiring `required`.
    pub fn needs_parens_in(self, required: Order) -> bool {
        self > required
    }

    /// The next tighter level, used for the non-associative side of binary operators.
    pub fn tighter(self) -> Order {
        match self {
            Order::Atomic | Order::FunctionCall => Order::Atomic,
            Order::Exponentiation => Order::FunctionCall,
            Order::Unary => Order::Exponentiation,
            Order::Multiplicative => Order::Unary,
            Order::Additive => Order::Multiplicative,
            Order::Relational => Order::Additive,
            Order::LogicalNot => Order::Relational,
            Order::LogicalAnd => Order::LogicalNot,
            Order::LogicalOr => Order::LogicalAnd,
            Order::Conditional => Order::LogicalOr,
            Order::None => Order::Conditional,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Order::Atomic => "ATOMIC",
            Order::FunctionCall => "FUNCTION_CALL",
            Order::Exponentiation => "EXPONENTIATION",
            Order::Unary => "UNARY",
            Order::Multiplicative => "MULTIPLICATIVE",
            Order::Additive => "ADDITIVE",
            Order::Relational => "RELATIONAL",
            Order::LogicalNot => "LOGICAL_NOT",
            Order::LogicalAnd => "LOGICAL_AND",
            Order::LogicalOr => "LOGICAL_OR",
            Order::Conditional => "CONDITIONAL",
            Order::None => "NONE",
        };
        f.write_str(name)
    }
}
