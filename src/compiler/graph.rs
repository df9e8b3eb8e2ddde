use super::blocks::BlockCompiler;
use super::writer::{CodeWriter, comment_text};
use super::{Diagnostic, DiagnosticKind, Toolchain};
use crate::ast::{float_literal, map_literal, quote_string};
use crate::block::Workspace;
use crate::error::LoadError;
use crate::ident::{IdentifierScope, sanitize};
use crate::project::{ComponentNode, IntoGraph, ProgramGraph, ProjectDocument, Wire};
use ahash::AHashMap;
use serde_json::{Map, Value};

/// Names used by the program scaffold itself.
const SCAFFOLD_NAMES: [&str; 7] = [
    "engine",
    "logger",
    "logging",
    "time",
    "sys",
    "create_engine",
    "main",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledProgram {
    pub source: String,
    /// Resolved class names, each once, in first-seen order.
    pub classes: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// One planned `Class("id", {...})` instantiation.
struct Instance<'g> {
    node: &'g ComponentNode,
    variable: String,
    class_name: String,
    config: Map<String, Value>,
}

/// Compiles a [`ProgramGraph`] into a runnable engine program.
pub struct GraphCompiler<'a> {
    toolchain: &'a Toolchain,
}

impl<'a> GraphCompiler<'a> {
    pub fn new(toolchain: &'a Toolchain) -> Self {
        Self { toolchain }
    }

    /// Loads a `.daq` project document and compiles its logic graph.
    pub fn compile_document(&self, json: &str) -> Result<CompiledProgram, LoadError> {
        let graph = ProjectDocument::from_json(json)?.into_graph()?;
        Ok(self.compile_program(&graph))
    }

    pub fn compile_program(&self, graph: &ProgramGraph) -> CompiledProgram {
        let mut diagnostics = Vec::new();
        let (classes, class_of) = self.resolve_classes(graph, &mut diagnostics);
        let instances = self.plan_instances(graph, &class_of, &mut diagnostics);

        let mut w = CodeWriter::new(&self.toolchain.options().indent);
        self.write_header(&mut w, graph);
        self.write_imports(&mut w, &classes);
        self.write_logging(&mut w);
        self.write_create_engine(&mut w, &instances, graph.wires());
        self.write_main(&mut w, graph);

        tracing::debug!(
            nodes = graph.nodes().len(),
            wires = graph.wires().len(),
            classes = classes.len(),
            "compiled program graph"
        );
        CompiledProgram {
            source: w.finish(),
            classes,
            diagnostics,
        }
    }

    /// Resolves every distinct component type once, in first-seen order.
    fn resolve_classes<'g>(
        &self,
        graph: &'g ProgramGraph,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<String>, AHashMap<&'g str, String>) {
        let mut classes: Vec<String> = Vec::new();
        let mut class_of: AHashMap<&'g str, String> = AHashMap::new();
        for node in graph.nodes() {
            if class_of.contains_key(node.component_type.as_str()) {
                continue;
            }
            let resolved = self.toolchain.resolve_class(&node.component_type);
            if resolved.derived {
                tracing::debug!(
                    component_type = %node.component_type,
                    class_name = %resolved.class_name,
                    "derived class name for unregistered component type"
                );
                diagnostics.push(Diagnostic {
                    subject_id: node.id.clone(),
                    kind: DiagnosticKind::UnresolvedComponentType,
                    message: format!(
                        "component type '{}' is not registered; using '{}'",
                        node.component_type, resolved.class_name
                    ),
                });
            }
            let class_name = resolved.class_name.into_owned();
            if !classes.contains(&class_name) {
                classes.push(class_name.clone());
            }
            class_of.insert(node.component_type.as_str(), class_name);
        }
        (classes, class_of)
    }

    fn plan_instances<'g>(
        &self,
        graph: &'g ProgramGraph,
        class_of: &AHashMap<&'g str, String>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Instance<'g>> {
        let mut scope = IdentifierScope::with_reserved(SCAFFOLD_NAMES);
        graph
            .nodes()
            .iter()
            .map(|node| {
                let label = if node.label.is_empty() {
                    &node.id
                } else {
                    &node.label
                };
                Instance {
                    node,
                    variable: scope.claim(&sanitize(label, &node.id)),
                    class_name: class_of
                        .get(node.component_type.as_str())
                        .cloned()
                        .unwrap_or_default(),
                    config: self.node_config(node, diagnostics),
                }
            })
            .collect()
    }

    /// The configuration passed to the runtime: node properties, compiled
    /// script output, then class defaults the node does not override.
    fn node_config(&self, node: &ComponentNode, diagnostics: &mut Vec<Diagnostic>) -> Map<String, Value> {
        let options = self.toolchain.options();
        let state_key = options.script_state_key.as_str();
        let mut config: Map<String, Value> = node
            .properties
            .iter()
            .filter(|(key, _)| key.as_str() != state_key)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if let Some(state) = node.properties.get(state_key) {
            match load_script_state(state) {
                Ok(workspace) => {
                    let output = BlockCompiler::new(self.toolchain).compile_workspace(&workspace);
                    diagnostics.extend(output.diagnostics);
                    config.insert(options.generated_code_key.clone(), Value::String(output.code));
                }
                Err(err) => {
                    tracing::warn!(node_id = %node.id, error = %err, "invalid script state");
                    diagnostics.push(Diagnostic {
                        subject_id: node.id.clone(),
                        kind: DiagnosticKind::InvalidScriptState,
                        message: err.to_string(),
                    });
                }
            }
        }

        if let Some(defaults) = self.toolchain.resolve_class(&node.component_type).defaults {
            for (key, value) in defaults {
                if !config.contains_key(key) {
                    config.insert(key.clone(), value.clone());
                }
            }
        }
        config
    }

    fn write_header(&self, w: &mut CodeWriter<'_>, graph: &ProgramGraph) {
        let meta = &graph.meta;
        w.line(0, "\"\"\"");
        w.line(0, format!("{} v{}", docstring_text(&meta.name), docstring_text(&meta.version)));
        if !meta.description.is_empty() {
            w.blank();
            w.line(0, docstring_text(&meta.description));
        }
        w.blank();
        w.line(0, "Generated from the project graph. Do not edit by hand.");
        w.line(0, "\"\"\"");
        w.blank();
    }

    fn write_imports(&self, w: &mut CodeWriter<'_>, classes: &[String]) {
        let options = self.toolchain.options();
        w.line(0, "import logging");
        w.line(0, "import time");
        w.blank();
        w.line(
            0,
            format!("from {} import {}", options.engine_module, options.engine_class),
        );
        if !classes.is_empty() {
            w.line(0, format!("from {} import (", options.component_module));
            for class in classes {
                w.line(1, format!("{},", class));
            }
            w.line(0, ")");
        }
        w.blank();
    }

    fn write_logging(&self, w: &mut CodeWriter<'_>) {
        w.line(0, "logging.basicConfig(");
        w.line(1, "level=logging.INFO,");
        w.line(1, "format=\"%(asctime)s [%(levelname)s] %(name)s: %(message)s\",");
        w.line(0, ")");
        w.line(0, "logger = logging.getLogger(__name__)");
        w.blank();
        w.blank();
    }

    fn write_create_engine(&self, w: &mut CodeWriter<'_>, instances: &[Instance<'_>], wires: &[Wire]) {
        let options = self.toolchain.options();
        let unit = options.indent.as_str();
        w.line(0, "def create_engine():");
        w.line(1, format!("engine = {}()", options.engine_class));
        w.blank();
        for instance in instances {
            w.line(
                1,
                format!(
                    "# {} ({})",
                    comment_text(&instance.node.component_type),
                    comment_text(&instance.node.id)
                ),
            );
            w.line(
                1,
                format!(
                    "{} = {}({}, {})",
                    instance.variable,
                    instance.class_name,
                    quote_string(&instance.node.id),
                    map_literal(&instance.config, 1, unit)
                ),
            );
            w.line(1, format!("engine.add_component({})", instance.variable));
            w.blank();
        }
        for wire in wires {
            w.line(
                1,
                format!(
                    "engine.connect({}, {}, {}, {})",
                    quote_string(&wire.source.node_id),
                    quote_string(&wire.source.port_id),
                    quote_string(&wire.target.node_id),
                    quote_string(&wire.target.port_id)
                ),
            );
        }
        if !wires.is_empty() {
            w.blank();
        }
        w.line(1, "return engine");
        w.blank();
        w.blank();
    }

    fn write_main(&self, w: &mut CodeWriter<'_>, graph: &ProgramGraph) {
        let sleep = float_literal(self.toolchain.options().idle_sleep_seconds);
        w.line(0, "def main():");
        w.line(1, "engine = None");
        w.line(1, "try:");
        w.line(2, "engine = create_engine()");
        w.line(2, "engine.start()");
        w.line(
            2,
            format!(
                "logger.info(\"Running %s, press Ctrl+C to stop\", {})",
                quote_string(&graph.meta.name)
            ),
        );
        w.line(2, "while True:");
        w.line(3, format!("time.sleep({})", sleep));
        w.line(1, "except KeyboardInterrupt:");
        w.line(2, "logger.info(\"Interrupted, stopping engine\")");
        w.line(1, "except Exception:");
        w.line(2, "logger.exception(\"Engine failed\")");
        w.line(2, "raise");
        w.line(1, "finally:");
        w.line(2, "if engine is not None:");
        w.line(3, "engine.stop()");
        w.blank();
        w.blank();
        w.line(0, "if __name__ == \"__main__\":");
        w.line(1, "main()");
    }
}

/// A script state is either embedded JSON or a JSON string holding it.
fn load_script_state(state: &Value) -> Result<Workspace, LoadError> {
    match state {
        Value::String(json) => Workspace::from_state(json),
        other => Workspace::from_state_value(other.clone()),
    }
}

/// Makes text safe inside a triple-quoted docstring.
fn docstring_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"")
}
