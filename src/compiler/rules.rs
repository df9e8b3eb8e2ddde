use super::DiagnosticKind;
use super::blocks::BlockCompiler;
use super::template::{Fallback, StagedTemplate, StatementTemplate, Template};
use super::writer::comment_text;
use crate::ast::{Expr, Order, float_literal, number_literal};
use crate::block::Block;
use ahash::AHashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Compiles a value block into an expression of a declared [`Order`].
pub trait ValueRule: Send + Sync {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr;
}

/// Compiles a statement block into newline-terminated lines of code.
///
/// Only the block itself is compiled; the compiler follows `next`.
pub trait StatementRule: Send + Sync {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> String;
}

/// The registered capability of one block tag.
#[derive(Clone)]
pub enum Rule {
    Value(Arc<dyn ValueRule>),
    Statement(Arc<dyn StatementRule>),
}

impl Rule {
    pub fn value(rule: impl ValueRule + 'static) -> Self {
        Rule::Value(Arc::new(rule))
    }

    pub fn statement(rule: impl StatementRule + 'static) -> Self {
        Rule::Statement(Arc::new(rule))
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Rule::Value(_))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Value(_) => f.write_str("Rule::Value"),
            Rule::Statement(_) => f.write_str("Rule::Statement"),
        }
    }
}

/// The capability every unregistered tag resolves to.
pub struct UnknownBlockRule;

impl UnknownBlockRule {
    fn report(block: &Block, cx: &mut BlockCompiler<'_>) {
        cx.diagnose(
            block,
            DiagnosticKind::UnknownBlockType,
            format!("unknown block type '{}'", block.type_tag),
        );
    }
}

impl ValueRule for UnknownBlockRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr {
        Self::report(block, cx);
        Expr::none_literal()
    }
}

impl StatementRule for UnknownBlockRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> String {
        Self::report(block, cx);
        format!(
            "# Unknown block type '{}' ({})\n",
            comment_text(&block.type_tag),
            comment_text(&block.id)
        )
    }
}

/// A binary operator: its symbol, its own order and the order each side requires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operator {
    pub symbol: &'static str,
    pub order: Order,
    pub left: Order,
    pub right: Order,
}

/// A binary block whose operator is chosen by a dropdown field.
pub struct OperatorRule {
    field: &'static str,
    left_socket: &'static str,
    right_socket: &'static str,
    fallback: Fallback,
    operators: &'static [(&'static str, Operator)],
}

impl OperatorRule {
    fn operator(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Option<Operator> {
        let name = block.field_str(self.field);
        let found = name.and_then(|name| {
            self.operators
                .iter()
                .find(|(op, _)| *op == name)
                .map(|(_, op)| *op)
        });
        if found.is_none() && name.is_some() {
            cx.diagnose(
                block,
                DiagnosticKind::InvalidField,
                format!("unknown operator '{}'", name.unwrap_or_default()),
            );
        }
        found.or_else(|| self.operators.first().map(|(_, op)| *op))
    }
}

impl ValueRule for OperatorRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr {
        let Some(op) = self.operator(block, cx) else {
            return Expr::none_literal();
        };
        let left = cx.value(block, self.left_socket, op.left, &self.fallback);
        let right = cx.value(block, self.right_socket, op.right, &self.fallback);
        Expr::new(format!("{}{}{}", left, op.symbol, right), op.order)
    }
}

/// Defines a static operator table for every dropdown-driven binary block and
/// the function registering those blocks.
macro_rules! define_operator_rules {
    (
        $(
            $tag:literal ( $field:literal, $left:literal, $right:literal, fallback = $fallback:expr ) {
                $( $name:literal => ($symbol:literal, $order:ident, $lhs:ident, $rhs:ident) ),* $(,)?
            }
        )*
    ) => {
        fn register_operator_rules(registry: &mut AHashMap<String, Rule>) {
            $(
                {
                    const OPERATORS: &[(&str, Operator)] = &[
                        $( ($name, Operator {
                            symbol: $symbol,
                            order: Order::$order,
                            left: Order::$lhs,
                            right: Order::$rhs,
                        }), )*
                    ];
                    registry.insert(
                        $tag.to_string(),
                        Rule::value(OperatorRule {
                            field: $field,
                            left_socket: $left,
                            right_socket: $right,
                            fallback: $fallback,
                            operators: OPERATORS,
                        }),
                    );
                }
            )*
        }
    };
}

define_operator_rules! {
    "math_arithmetic" ("OP", "A", "B", fallback = Fallback::new(0)) {
        "ADD" => (" + ", Additive, Additive, Additive),
        "MINUS" => (" - ", Additive, Additive, Multiplicative),
        "MULTIPLY" => (" * ", Multiplicative, Multiplicative, Unary),
        "DIVIDE" => (" / ", Multiplicative, Multiplicative, Unary),
        "POWER" => (" ** ", Exponentiation, FunctionCall, Exponentiation),
    }
    "logic_compare" ("OP", "A", "B", fallback = Fallback::new(0)) {
        "EQ" => (" == ", Relational, Additive, Additive),
        "NEQ" => (" != ", Relational, Additive, Additive),
        "LT" => (" < ", Relational, Additive, Additive),
        "LTE" => (" <= ", Relational, Additive, Additive),
        "GT" => (" > ", Relational, Additive, Additive),
        "GTE" => (" >= ", Relational, Additive, Additive),
    }
    "logic_operation" ("OP", "A", "B", fallback = Fallback::new(false)) {
        "AND" => (" and ", LogicalAnd, LogicalAnd, LogicalAnd),
        "OR" => (" or ", LogicalOr, LogicalOr, LogicalOr),
    }
}

/// How a unary function block wraps its operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionForm {
    pub prefix: &'static str,
    pub suffix: &'static str,
    pub order: Order,
    pub operand: Order,
    pub import: Option<&'static str>,
}

const fn call(name: &'static str, import: Option<&'static str>) -> FunctionForm {
    FunctionForm {
        prefix: name,
        suffix: ")",
        order: Order::FunctionCall,
        operand: Order::None,
        import,
    }
}

const SINGLE_FORMS: &[(&str, FunctionForm)] = &[
    ("ROOT", call("math.sqrt(", Some("math"))),
    ("ABS", call("abs(", None)),
    (
        "NEG",
        FunctionForm {
            prefix: "-",
            suffix: "",
            order: Order::Unary,
            operand: Order::Unary,
            import: None,
        },
    ),
    ("LN", call("math.log(", Some("math"))),
    ("LOG10", call("math.log10(", Some("math"))),
    ("EXP", call("math.exp(", Some("math"))),
    (
        "POW10",
        FunctionForm {
            prefix: "10 ** ",
            suffix: "",
            order: Order::Exponentiation,
            operand: Order::Exponentiation,
            import: None,
        },
    ),
];

const ROUND_FORMS: &[(&str, FunctionForm)] = &[
    ("ROUND", call("round(", None)),
    ("ROUNDUP", call("math.ceil(", Some("math"))),
    ("ROUNDDOWN", call("math.floor(", Some("math"))),
];

/// A single-operand block whose function is chosen by a dropdown field.
pub struct FunctionRule {
    field: &'static str,
    socket: &'static str,
    fallback: Fallback,
    forms: &'static [(&'static str, FunctionForm)],
}

impl ValueRule for FunctionRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr {
        let name = block.field_str(self.field);
        let found = name.and_then(|name| {
            self.forms
                .iter()
                .find(|(op, _)| *op == name)
                .map(|(_, form)| *form)
        });
        if let (None, Some(name)) = (found, name) {
            cx.diagnose(
                block,
                DiagnosticKind::InvalidField,
                format!("unknown function '{}'", name),
            );
        }
        let Some(form) = found.or_else(|| self.forms.first().map(|(_, form)| *form)) else {
            return Expr::none_literal();
        };
        if let Some(module) = form.import {
            cx.require_import(module);
        }
        let operand = cx.value(block, self.socket, form.operand, &self.fallback);
        Expr::new(format!("{}{}{}", form.prefix, operand, form.suffix), form.order)
    }
}

/// `math_number`: the `NUM` field as a numeric literal.
struct NumberRule;

impl ValueRule for NumberRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr {
        let text = match block.field("NUM") {
            Some(Value::Number(n)) => number_literal(n),
            Some(Value::String(s)) => match (s.trim().parse::<i64>(), s.trim().parse::<f64>()) {
                (Ok(i), _) => i.to_string(),
                (_, Ok(f)) if f.is_finite() => float_literal(f),
                _ => {
                    cx.diagnose(
                        block,
                        DiagnosticKind::InvalidField,
                        format!("'{}' is not a number", s),
                    );
                    "0".to_string()
                }
            },
            Some(other) => {
                cx.diagnose(
                    block,
                    DiagnosticKind::InvalidField,
                    format!("{} is not a number", other),
                );
                "0".to_string()
            }
            None => "0".to_string(),
        };
        let order = if text.starts_with('-') {
            Order::Unary
        } else {
            Order::Atomic
        };
        Expr::new(text, order)
    }
}

struct BooleanRule;

impl ValueRule for BooleanRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr {
        let value = match (block.field("BOOL"), block.field_bool("BOOL")) {
            (_, Some(value)) => value,
            (None, None) => true,
            (Some(other), None) => {
                cx.diagnose(
                    block,
                    DiagnosticKind::InvalidField,
                    format!("{} is not a boolean", other),
                );
                true
            }
        };
        Expr::atomic(if value { "True" } else { "False" })
    }
}

/// Unconnected slots emitted past the connected ones before a declared count is clamped.
const SPARE_SLOTS: usize = 8;

/// The indices `N` of sockets named `<prefix>N`.
fn slot_indices<'a>(sockets: impl Iterator<Item = &'a String>, prefix: &str) -> Vec<usize> {
    sockets
        .filter_map(|name| name.strip_prefix(prefix)?.parse::<usize>().ok())
        .collect()
}

/// The count a mutation field such as `ITEMS` declares, saturating on huge values.
fn declared_count(block: &Block, field: &str) -> usize {
    block
        .field_f64(field)
        .filter(|n| *n > 0.0)
        .map_or(0, |n| n as usize)
}

/// Limits `wanted` slots to the `connected` ones plus [`SPARE_SLOTS`].
fn clamp_slots(
    block: &Block,
    cx: &mut BlockCompiler<'_>,
    field: &str,
    wanted: usize,
    connected: usize,
) -> usize {
    let limit = connected + SPARE_SLOTS;
    if wanted <= limit {
        return wanted;
    }
    cx.diagnose(
        block,
        DiagnosticKind::InvalidField,
        format!("{} asks for {} slots, compiling {}", field, wanted, limit),
    );
    limit
}

/// `text_join`: `ADD0..ADDn` converted with `str()` and concatenated.
struct TextJoinRule;

impl ValueRule for TextJoinRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> Expr {
        let indices = slot_indices(block.inputs.keys(), "ADD");
        let highest = indices.iter().max().map_or(0, |n| n.saturating_add(1));
        let wanted = declared_count(block, "ITEMS").max(highest);
        let count = clamp_slots(block, cx, "ITEMS", wanted, indices.len());

        let mut parts = Vec::new();
        for index in 0..count {
            let part = match block.input(&format!("ADD{}", index)) {
                Some(child) if child.type_tag == "text" => cx.compile_value(child, Order::Additive),
                Some(child) => {
                    let inner = cx.compile_value(child, Order::None);
                    Expr::new(format!("str({})", inner.text), Order::FunctionCall)
                }
                None => Expr::atomic("\"\""),
            };
            parts.push(part);
        }

        match parts.len() {
            0 => Expr::atomic("\"\""),
            1 => parts.remove(0),
            _ => Expr::new(
                parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join(" + "),
                Order::Additive,
            ),
        }
    }
}

/// `controls_if`: `IF0`/`DO0`, any number of `IFn`/`DOn` elif branches, optional `ELSE`.
struct IfRule;

impl StatementRule for IfRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> String {
        let mut indices = slot_indices(block.inputs.keys(), "IF");
        indices.extend(slot_indices(block.statements.keys(), "DO"));
        indices.sort_unstable();
        indices.dedup();
        let last = indices
            .last()
            .copied()
            .unwrap_or(0)
            .max(declared_count(block, "ELSEIF"));
        let branches = clamp_slots(block, cx, "ELSEIF", last.saturating_add(1), indices.len());

        let mut code = String::new();
        for index in 0..branches {
            let keyword = if index == 0 { "if" } else { "elif" };
            let condition = cx.value(
                block,
                &format!("IF{}", index),
                Order::None,
                &Fallback::new(false),
            );
            code.push_str(&format!("{} {}:\n", keyword, condition));
            code.push_str(&cx.statements(block, &format!("DO{}", index)));
        }
        if block.statements.contains_key("ELSE") || block.field_bool("HAS_ELSE") == Some(true) {
            code.push_str("else:\n");
            code.push_str(&cx.statements(block, "ELSE"));
        }
        code
    }
}

/// `controls_whileUntil`: `MODE` WHILE or UNTIL over condition `BOOL`.
struct WhileUntilRule;

impl StatementRule for WhileUntilRule {
    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> String {
        let fallback = Fallback::new(false);
        let header = match block.field_str("MODE") {
            Some("UNTIL") => format!(
                "while not {}:\n",
                cx.value(block, "BOOL", Order::LogicalNot, &fallback)
            ),
            mode => {
                if let Some(mode) = mode.filter(|m| *m != "WHILE") {
                    cx.diagnose(
                        block,
                        DiagnosticKind::InvalidField,
                        format!("unknown loop mode '{}'", mode),
                    );
                }
                format!("while {}:\n", cx.value(block, "BOOL", Order::None, &fallback))
            }
        };
        header + &cx.statements(block, "DO")
    }
}

fn celsius_to_fahrenheit() -> StagedTemplate {
    StagedTemplate::new(
        Template::new(Order::Multiplicative)
            .operand("CELSIUS", Order::Multiplicative, Fallback::new(0))
            .text(" * 1.8"),
    )
    .then(
        Template::new(Order::Additive)
            .previous(Order::Additive)
            .text(" + 32"),
    )
}

fn fahrenheit_to_kelvin() -> StagedTemplate {
    StagedTemplate::new(
        Template::new(Order::Additive)
            .operand("FAHRENHEIT", Order::Additive, Fallback::new(32))
            .text(" - 32"),
    )
    .then(
        Template::new(Order::Multiplicative)
            .previous(Order::Multiplicative)
            .text(" * 5 / 9"),
    )
    .then(
        Template::new(Order::Additive)
            .previous(Order::Additive)
            .text(" + 273.15"),
    )
}

pub(super) fn register_default_rules(registry: &mut AHashMap<String, Rule>) {
    register_operator_rules(registry);

    let mut register = |tag: &str, rule: Rule| {
        registry.insert(tag.to_string(), rule);
    };

    register("math_number", Rule::value(NumberRule));
    register("logic_boolean", Rule::value(BooleanRule));
    register("text_join", Rule::value(TextJoinRule));
    register(
        "math_single",
        Rule::value(FunctionRule {
            field: "OP",
            socket: "NUM",
            fallback: Fallback::new(0),
            forms: SINGLE_FORMS,
        }),
    );
    register(
        "math_round",
        Rule::value(FunctionRule {
            field: "OP",
            socket: "NUM",
            fallback: Fallback::new(0),
            forms: ROUND_FORMS,
        }),
    );
    register(
        "text",
        Rule::value(Template::new(Order::Atomic).field("TEXT", "")),
    );
    register("logic_null", Rule::value(Template::new(Order::Atomic).text("None")));
    register(
        "logic_negate",
        Rule::value(
            Template::new(Order::LogicalNot)
                .text("not ")
                .operand("BOOL", Order::LogicalNot, Fallback::new(true)),
        ),
    );
    register(
        "logic_ternary",
        Rule::value(
            Template::new(Order::Conditional)
                .operand("THEN", Order::LogicalOr, Fallback::none())
                .text(" if ")
                .operand("IF", Order::LogicalOr, Fallback::new(false))
                .text(" else ")
                .operand("ELSE", Order::Conditional, Fallback::none()),
        ),
    );
    register(
        "math_modulo",
        Rule::value(
            Template::new(Order::Multiplicative)
                .operand("DIVIDEND", Order::Multiplicative, Fallback::new(0))
                .text(" % ")
                .operand("DIVISOR", Order::Unary, Fallback::new(1)),
        ),
    );
    register(
        "variables_get",
        Rule::value(Template::new(Order::Atomic).variable("VAR")),
    );
    register(
        "daq_get_input",
        Rule::value(
            Template::new(Order::FunctionCall)
                .text("get_input(")
                .field("PORT", "input1")
                .text(")"),
        ),
    );
    register(
        "daq_scale",
        Rule::value(
            Template::new(Order::Additive)
                .operand("VALUE", Order::Multiplicative, Fallback::new(0))
                .text(" * ")
                .operand("SCALE", Order::Unary, Fallback::new(1))
                .text(" + ")
                .operand("OFFSET", Order::Additive, Fallback::new(0)),
        ),
    );
    register("daq_celsius_to_fahrenheit", Rule::value(celsius_to_fahrenheit()));
    register("daq_fahrenheit_to_kelvin", Rule::value(fahrenheit_to_kelvin()));

    register("controls_if", Rule::statement(IfRule));
    register("controls_whileUntil", Rule::statement(WhileUntilRule));
    register(
        "controls_repeat_ext",
        Rule::statement(
            StatementTemplate::new()
                .line(
                    Template::new(Order::None)
                        .text("for _ in range(int(")
                        .operand("TIMES", Order::None, Fallback::new(10))
                        .text(")):"),
                )
                .body("DO"),
        ),
    );
    register(
        "variables_set",
        Rule::statement(
            StatementTemplate::new().line(
                Template::new(Order::None)
                    .variable("VAR")
                    .text(" = ")
                    .operand("VALUE", Order::None, Fallback::none()),
            ),
        ),
    );
    register(
        "text_print",
        Rule::statement(
            StatementTemplate::new().line(
                Template::new(Order::None)
                    .text("print(")
                    .operand("TEXT", Order::None, Fallback::new(""))
                    .text(")"),
            ),
        ),
    );
    register(
        "daq_set_output",
        Rule::statement(
            StatementTemplate::new().line(
                Template::new(Order::None)
                    .text("set_output(")
                    .field("PORT", "output1")
                    .text(", ")
                    .operand("VALUE", Order::None, Fallback::none())
                    .text(")"),
            ),
        ),
    );
    register(
        "daq_log",
        Rule::statement(
            StatementTemplate::new().line(
                Template::new(Order::None)
                    .text("logger.")
                    .identifier("LEVEL", "info")
                    .text("(")
                    .operand("MESSAGE", Order::None, Fallback::new(""))
                    .text(")"),
            ),
        ),
    );
}
