//! Declarative code templates for block rules.
//!
//! Most block rules are a fixed arrangement of literal text, compiled operands
//! and field values. A [`Template`] captures that arrangement once, and the
//! block compiler fills it in per block.

use super::blocks::BlockCompiler;
use super::rules::{StatementRule, ValueRule};
use crate::ast::{Expr, Order, to_literal_with};
use crate::block::Block;
use crate::ident::sanitize_with_prefix;
use serde_json::Value;

/// The literal used when a value socket is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Fallback {
    pub literal: Value,
    pub order: Order,
}

impl Fallback {
    pub fn new(literal: impl Into<Value>) -> Self {
        let literal = literal.into();
        let negative = literal
            .as_f64()
            .is_some_and(|n| n.is_sign_negative() && n != 0.0);
        Self {
            order: if negative { Order::Unary } else { Order::Atomic },
            literal,
        }
    }

    pub fn none() -> Self {
        Self {
            literal: Value::Null,
            order: Order::Atomic,
        }
    }

    pub fn to_expr(&self, unit: &str) -> Expr {
        Expr::new(to_literal_with(&self.literal, 0, unit), self.order)
    }
}

/// One piece of a [`Template`].
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    /// A compiled value socket, parenthesized when looser than `order`.
    Operand {
        socket: String,
        order: Order,
        fallback: Fallback,
    },
    /// A field rendered as a literal.
    Field { name: String, default: Value },
    /// A field rendered as a bare identifier, such as a method name.
    Identifier { name: String, default: String },
    /// A field naming a script variable.
    Variable { name: String },
    /// The result of the previous stage of a [`StagedTemplate`].
    Previous(Order),
}

/// A value template producing an expression of a fixed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    order: Order,
    pieces: Vec<Piece>,
}

impl Template {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            pieces: Vec::new(),
        }
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.pieces.push(Piece::Text(text.into()));
        self
    }

    pub fn operand(mut self, socket: impl Into<String>, order: Order, fallback: Fallback) -> Self {
        self.pieces.push(Piece::Operand {
            socket: socket.into(),
            order,
            fallback,
        });
        self
    }

    pub fn field(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.pieces.push(Piece::Field {
            name: name.into(),
            default: default.into(),
        });
        self
    }

    pub fn identifier(mut self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.pieces.push(Piece::Identifier {
            name: name.into(),
            default: default.into(),
        });
        self
    }

    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.pieces.push(Piece::Variable { name: name.into() });
        self
    }

    pub fn previous(mut self, order: Order) -> Self {
        self.pieces.push(Piece::Previous(order));
        self
    }

    /// Fills the template in for `block`. `previous` feeds [`Piece::Previous`].
    pub fn render(&self, block: &Block, cx: &mut BlockCompiler<'_>, previous: Option<&Expr>) -> Expr {
        let mut text = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Text(s) => text.push_str(s),
                Piece::Operand {
                    socket,
                    order,
                    fallback,
                } => text.push_str(&cx.value(block, socket, *order, fallback)),
                Piece::Field { name, default } => {
                    let value = block.field(name).unwrap_or(default);
                    text.push_str(&to_literal_with(value, 0, cx.indent()));
                }
                Piece::Identifier { name, default } => {
                    let raw = block.field_str(name).unwrap_or(default);
                    text.push_str(&sanitize_with_prefix(raw, "", default));
                }
                Piece::Variable { name } => {
                    let variable = block.field_str(name).unwrap_or("item");
                    text.push_str(&cx.variable(variable));
                }
                Piece::Previous(order) => match previous {
                    Some(expr) => text.push_str(&expr.clone().wrap_for(*order).text),
                    None => text.push_str(&Expr::none_literal().text),
                },
            }
        }
        Expr::new(text, self.order)
    }
}

impl ValueRule for Template {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr {
        self.render(block, cx, None)
    }
}

/// A value rule computed in stages, each stage consuming the previous stage's result.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedTemplate {
    stages: Vec<Template>,
}

impl StagedTemplate {
    pub fn new(first: Template) -> Self {
        Self {
            stages: vec![first],
        }
    }

    pub fn then(mut self, stage: Template) -> Self {
        self.stages.push(stage);
        self
    }
}

impl ValueRule for StagedTemplate {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr {
        let mut result: Option<Expr> = None;
        for stage in &self.stages {
            result = Some(stage.render(block, cx, result.as_ref()));
        }
        result.unwrap_or_else(Expr::none_literal)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Code(Template),
    Body(String),
}

/// A statement template: code lines interleaved with indented statement bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementTemplate {
    lines: Vec<Line>,
}

impl StatementTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: Template) -> Self {
        self.lines.push(Line::Code(line));
        self
    }

    /// The statement chain in `socket`, one level deeper. Empty bodies become `pass`.
    pub fn body(mut self, socket: impl Into<String>) -> Self {
        self.lines.push(Line::Body(socket.into()));
        self
    }
}

impl StatementRule for StatementTemplate {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> String {
        let mut code = String::new();
        for line in &self.lines {
            match line {
                Line::Code(template) => {
                    code.push_str(&template.render(block, cx, None).text);
                    code.push('\n');
                }
                Line::Body(socket) => code.push_str(&cx.statements(block, socket)),
            }
        }
        code
    }
}
