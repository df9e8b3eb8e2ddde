//! The block-definition meta-compiler.
//!
//! A definition is itself a block tree: a `factory_base` root whose `INPUTS`
//! chain lists input descriptors, each with an optional `FIELDS` chain of field
//! descriptors. It compiles into the JSON schema the editor loads and a Rust
//! rule stub to be completed by hand and registered with the toolchain.

use super::derive_class_name;
use crate::block::{Block, Workspace};
use crate::ident::sanitize_with_prefix;
use ahash::AHashSet;
use itertools::Itertools;
use serde::Serialize;
use serde_json::{Value, json};

const ROOT_TYPE: &str = "factory_base";
const PLACEHOLDER: &str = "// No block definition found.";
const DEFAULT_COLOUR: u64 = 230;

/// The editor-facing JSON definition of a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSchema {
    #[serde(rename = "type")]
    pub type_name: String,
    pub message0: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args0: Vec<Value>,
    /// `Some(Value::Null)` for an output accepting any type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(rename = "previousStatement", skip_serializing_if = "Option::is_none")]
    pub previous_statement: Option<Value>,
    #[serde(rename = "nextStatement", skip_serializing_if = "Option::is_none")]
    pub next_statement: Option<Value>,
    pub colour: Value,
    pub tooltip: String,
    #[serde(rename = "helpUrl")]
    pub help_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaOutput {
    /// Pretty-printed [`BlockSchema`] JSON, or a placeholder comment.
    pub schema: String,
    /// Rust source of a rule stub, or a placeholder comment.
    pub stub: String,
    pub definition: Option<BlockSchema>,
    pub warnings: Vec<String>,
}

impl SchemaOutput {
    fn placeholder() -> Self {
        Self {
            schema: PLACEHOLDER.to_string(),
            stub: PLACEHOLDER.to_string(),
            definition: None,
            warnings: vec![format!("no '{}' root block", ROOT_TYPE)],
        }
    }
}

/// What the generated rule must read from a block, in declaration order.
#[derive(Debug, Clone, PartialEq)]
enum Extraction {
    Value(String),
    Statement(String),
    Text(String),
    Number(String),
    Choice(String),
    Checkbox(String),
}

#[derive(Default)]
struct Collector {
    message: Vec<String>,
    args: Vec<Value>,
    extractions: Vec<Extraction>,
    names: AHashSet<String>,
    warnings: Vec<String>,
}

impl Collector {
    fn push_arg(&mut self, arg: Value) {
        self.args.push(arg);
        self.message.push(format!("%{}", self.args.len()));
    }

    fn claim(&mut self, name: &str) {
        if !self.names.insert(name.to_string()) {
            self.warnings
                .push(format!("duplicate input or field name '{}'", name));
        }
    }

    fn add_input(&mut self, input: &Block) {
        let kind = input.type_tag.as_str();
        if !matches!(kind, "input_value" | "input_statement" | "input_dummy") {
            self.warnings.push(format!(
                "'{}' ({}) is not an input descriptor",
                kind, input.id
            ));
            return;
        }
        for field in input.statement("FIELDS").into_iter().flat_map(Block::chain) {
            self.add_field(field);
        }

        let name = input.field_str("INPUTNAME").unwrap_or("NAME").to_string();
        match kind {
            "input_value" => {
                self.claim(&name);
                let mut arg = json!({"type": "input_value", "name": name});
                if let Some(check) = input.field_str("CHECK").filter(|c| !c.is_empty()) {
                    arg["check"] = Value::from(check);
                }
                self.push_arg(arg);
                self.extractions.push(Extraction::Value(name));
            }
            "input_statement" => {
                self.claim(&name);
                self.push_arg(json!({"type": "input_statement", "name": name}));
                self.extractions.push(Extraction::Statement(name));
            }
            _ => self.push_arg(json!({"type": "input_dummy"})),
        }
    }

    fn add_field(&mut self, field: &Block) {
        let name = field.field_str("FIELDNAME").unwrap_or("NAME").to_string();
        match field.type_tag.as_str() {
            "field_static" => {
                let text = field.field_str("TEXT").unwrap_or_default();
                if !text.is_empty() {
                    self.message.push(text.replace('%', "%%"));
                }
            }
            "field_input" => {
                self.claim(&name);
                let text = field.field_str("TEXT").unwrap_or_default();
                self.push_arg(json!({"type": "field_input", "name": name, "text": text}));
                self.extractions.push(Extraction::Text(name));
            }
            "field_number" => {
                self.claim(&name);
                let value = field.field_f64("VALUE").unwrap_or(0.0);
                self.push_arg(json!({"type": "field_number", "name": name, "value": value}));
                self.extractions.push(Extraction::Number(name));
            }
            "field_dropdown" => {
                self.claim(&name);
                let options = self.dropdown_options(field);
                self.push_arg(json!({"type": "field_dropdown", "name": name, "options": options}));
                self.extractions.push(Extraction::Choice(name));
            }
            "field_checkbox" => {
                self.claim(&name);
                let checked = field.field_bool("CHECKED").unwrap_or(true);
                self.push_arg(json!({"type": "field_checkbox", "name": name, "checked": checked}));
                self.extractions.push(Extraction::Checkbox(name));
            }
            other => self.warnings.push(format!(
                "'{}' ({}) is not a field descriptor",
                other, field.id
            )),
        }
    }

    /// `OPTIONS` as `[[label, value], ...]`; malformed entries are dropped.
    fn dropdown_options(&mut self, field: &Block) -> Vec<Value> {
        let options: Vec<Value> = field
            .field("OPTIONS")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| {
                        entry
                            .as_array()
                            .is_some_and(|pair| pair.len() == 2 && pair.iter().all(Value::is_string))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if options.is_empty() {
            self.warnings
                .push(format!("dropdown '{}' has no valid options", field.id));
            return vec![json!(["option", "OPTION"])];
        }
        options
    }
}

/// Compiles block definitions into schemas and rule stubs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCompiler;

impl SchemaCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compiles the first `factory_base` chain head of `workspace`.
    pub fn compile_workspace(&self, workspace: &Workspace) -> SchemaOutput {
        self.compile_schema(
            workspace
                .blocks()
                .iter()
                .find(|block| block.type_tag == ROOT_TYPE),
        )
    }

    pub fn compile_schema(&self, root: Option<&Block>) -> SchemaOutput {
        let Some(root) = root.filter(|block| block.type_tag == ROOT_TYPE) else {
            tracing::warn!("schema compilation without a {} root", ROOT_TYPE);
            return SchemaOutput::placeholder();
        };

        let mut collector = Collector::default();
        for input in root.statement("INPUTS").into_iter().flat_map(Block::chain) {
            collector.add_input(input);
        }

        let type_name = sanitize_with_prefix(
            root.field_str("NAME").unwrap_or_default(),
            &root.id,
            "block",
        );
        let mut schema = BlockSchema {
            type_name,
            message0: collector.message.join(" "),
            args0: collector.args,
            output: None,
            previous_statement: None,
            next_statement: None,
            colour: colour(root),
            tooltip: root.field_str("TOOLTIP").unwrap_or_default().to_string(),
            help_url: root.field_str("HELPURL").unwrap_or_default().to_string(),
        };
        match root.field_str("CONNECTIONS").unwrap_or("NONE") {
            "LEFT" => {
                schema.output = Some(
                    root.field_str("OUTPUT_CHECK")
                        .filter(|check| !check.is_empty())
                        .map_or(Value::Null, Value::from),
                );
            }
            "TOP" => schema.previous_statement = Some(Value::Null),
            "BOTTOM" => schema.next_statement = Some(Value::Null),
            "BOTH" => {
                schema.previous_statement = Some(Value::Null);
                schema.next_statement = Some(Value::Null);
            }
            "NONE" => {}
            other => collector
                .warnings
                .push(format!("unknown connection kind '{}'", other)),
        }

        let stub = render_stub(&schema, &collector.extractions);
        let json = serde_json::to_string_pretty(&schema)
            .unwrap_or_else(|err| format!("// Failed to render schema: {}", err));
        tracing::debug!(
            block_type = %schema.type_name,
            args = schema.args0.len(),
            warnings = collector.warnings.len(),
            "compiled block schema"
        );
        SchemaOutput {
            schema: json,
            stub,
            definition: Some(schema),
            warnings: collector.warnings,
        }
    }
}

fn colour(root: &Block) -> Value {
    match root.field("COLOUR") {
        Some(Value::Number(hue)) => Value::Number(hue.clone()),
        Some(Value::String(s)) if s.starts_with('#') => Value::from(s.as_str()),
        Some(Value::String(s)) => s
            .parse::<u64>()
            .map_or(Value::from(DEFAULT_COLOUR), Value::from),
        _ => Value::from(DEFAULT_COLOUR),
    }
}

fn local_name(prefix: &str, name: &str, index: usize) -> String {
    format!(
        "{}_{}",
        prefix,
        sanitize_with_prefix(name, &index.to_string(), "item")
    )
}

fn render_stub(schema: &BlockSchema, extractions: &[Extraction]) -> String {
    let is_value = schema.output.is_some();
    let rule_name = derive_class_name(&schema.type_name, "Rule");
    let (trait_name, return_type, builder_call) = if is_value {
        ("ValueRule", "Expr", "with_value_rule")
    } else {
        ("StatementRule", "String", "with_statement_rule")
    };

    let mut lines = vec![
        "use daqgen::prelude::*;".to_string(),
        String::new(),
        format!(
            "// Register with: Toolchain::builder().{}({:?}, {})",
            builder_call, schema.type_name, rule_name
        ),
        format!("pub struct {};", rule_name),
        String::new(),
        format!("impl {} for {} {{", trait_name, rule_name),
        "    #[allow(unused_variables)]".to_string(),
        format!(
            "    fn compile(&self, block: &Block, cx: &mut BlockCompiler<'_>) -> {} {{",
            return_type
        ),
    ];
    lines.extend(
        extractions
            .iter()
            .enumerate()
            .map(|(index, extraction)| format!("        {}", extraction_line(extraction, index))),
    );
    lines.push("        // TODO: compose the generated code.".to_string());
    lines.push(if is_value {
        "        Expr::none_literal()".to_string()
    } else {
        "        String::new()".to_string()
    });
    lines.push("    }".to_string());
    lines.push("}".to_string());
    format!("{}\n", lines.iter().join("\n"))
}

fn extraction_line(extraction: &Extraction, index: usize) -> String {
    match extraction {
        Extraction::Value(name) => format!(
            "let {} = cx.value(block, {:?}, Order::None, &Fallback::none());",
            local_name("value", name, index),
            name
        ),
        Extraction::Statement(name) => format!(
            "let {} = cx.statements(block, {:?});",
            local_name("statements", name, index),
            name
        ),
        Extraction::Text(name) => format!(
            "let {} = block.field_str({:?}).unwrap_or_default();",
            local_name("text", name, index),
            name
        ),
        Extraction::Number(name) => format!(
            "let {} = block.field_f64({:?}).unwrap_or_default();",
            local_name("number", name, index),
            name
        ),
        Extraction::Choice(name) => format!(
            "let {} = block.field_str({:?}).unwrap_or_default();",
            local_name("choice", name, index),
            name
        ),
        Extraction::Checkbox(name) => format!(
            "let {} = block.field_bool({:?}).unwrap_or_default();",
            local_name("checked", name, index),
            name
        ),
    }
}
