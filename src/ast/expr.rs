use super::Order;
use std::fmt;

/// A compiled expression: its source text and the binding strength of its outermost operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr {
    pub text: String,
    pub order: Order,
}

impl Expr {
    pub fn new(text: impl Into<String>, order: Order) -> Self {
        Self {
            text: text.into(),
            order,
        }
    }

    pub fn atomic(text: impl Into<String>) -> Self {
        Self::new(text, Order::Atomic)
    }

    /// The inert value used wherever an expression cannot be produced.
    pub fn none_literal() -> Self {
        Self::atomic("None")
    }

    pub fn needs_parens_in(&self, required: Order) -> bool {
        self.order.needs_parens_in(required)
    }

    /// Places the expression in a position requiring `required`.
    ///
    /// Parentheses are added only when the expression binds more loosely than
    /// the position allows; a wrapped expression is atomic.
    pub fn wrap_for(self, required: Order) -> Expr {
        if self.needs_parens_in(required) {
            Expr::atomic(format!("({})", self.text))
        } else {
            self
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
