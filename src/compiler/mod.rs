//! The three text compilers and the rule table they share.
//!
//! A [`Toolchain`] is assembled once with [`Toolchain::builder`] and is read-only
//! afterwards. Every compiler borrows it, so independent compilations can run
//! concurrently without coordination.

use crate::config::CodegenOptions;
use ahash::AHashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;

mod blocks;
mod classes;
mod graph;
pub mod rules;
mod schema;
pub mod template;
mod writer;

pub use blocks::{BlockCompiler, BlockOutput};
pub use graph::{CompiledProgram, GraphCompiler};
pub use rules::{Rule, StatementRule, UnknownBlockRule, ValueRule};
pub use schema::{BlockSchema, SchemaCompiler, SchemaOutput};
pub use template::{Fallback, Piece, StagedTemplate, StatementTemplate, Template};

/// What kind of best-effort recovery a compiler performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    /// A block tag with no registered rule; compiled as an inert placeholder.
    UnknownBlockType,
    /// A statement block in a value socket.
    MisplacedBlock,
    /// A field value the rule could not interpret; its default was used.
    InvalidField,
    /// A component type missing from the class table; its class name was derived.
    UnresolvedComponentType,
    /// A script-bearing node whose block state could not be loaded.
    InvalidScriptState,
}

/// A recoverable condition absorbed during compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Id of the block or component node concerned.
    pub subject_id: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}: {}", self.kind, self.subject_id, self.message)
    }
}

/// A runtime class registered for a component type.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentClass {
    pub class_name: String,
    /// Configuration entries added when a node does not set them itself.
    pub defaults: Map<String, Value>,
}

/// The outcome of looking up a component type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedClass<'a> {
    pub class_name: Cow<'a, str>,
    pub defaults: Option<&'a Map<String, Value>>,
    /// `true` when the name was derived because the type is not registered.
    pub derived: bool,
}

/// The read-only rule table: block rules, component classes and output options.
pub struct Toolchain {
    rules: AHashMap<String, Rule>,
    classes: AHashMap<String, ComponentClass>,
    options: CodegenOptions,
}

pub struct ToolchainBuilder {
    rules: AHashMap<String, Rule>,
    classes: AHashMap<String, ComponentClass>,
    options: CodegenOptions,
}

impl ToolchainBuilder {
    /// A builder preloaded with the default block rules and component classes.
    pub fn new() -> Self {
        let mut builder = Self::empty();
        rules::register_default_rules(&mut builder.rules);
        classes::register_default_classes(&mut builder.classes);
        builder
    }

    /// A builder with no rules or classes registered.
    pub fn empty() -> Self {
        Self {
            rules: AHashMap::new(),
            classes: AHashMap::new(),
            options: CodegenOptions::default(),
        }
    }

    pub fn register_rule(&mut self, type_tag: &str, rule: Rule) {
        self.rules.insert(type_tag.to_string(), rule);
    }

    pub fn register_class(&mut self, component_type: &str, class_name: &str) {
        self.classes.insert(
            component_type.to_string(),
            ComponentClass {
                class_name: class_name.to_string(),
                defaults: Map::new(),
            },
        );
    }

    pub fn with_rule(mut self, type_tag: &str, rule: Rule) -> Self {
        self.register_rule(type_tag, rule);
        self
    }

    pub fn with_value_rule(self, type_tag: &str, rule: impl ValueRule + 'static) -> Self {
        self.with_rule(type_tag, Rule::value(rule))
    }

    pub fn with_statement_rule(self, type_tag: &str, rule: impl StatementRule + 'static) -> Self {
        self.with_rule(type_tag, Rule::statement(rule))
    }

    /// Makes `alias` compile exactly like the already registered `existing` tag.
    pub fn with_rule_alias(mut self, alias: &str, existing: &str) -> Self {
        if let Some(rule) = self.rules.get(existing).cloned() {
            self.rules.insert(alias.to_string(), rule);
        }
        self
    }

    pub fn with_class(mut self, component_type: &str, class_name: &str) -> Self {
        self.register_class(component_type, class_name);
        self
    }

    pub fn with_class_defaults(
        mut self,
        component_type: &str,
        class_name: &str,
        defaults: Map<String, Value>,
    ) -> Self {
        self.classes.insert(
            component_type.to_string(),
            ComponentClass {
                class_name: class_name.to_string(),
                defaults,
            },
        );
        self
    }

    pub fn with_options(mut self, options: CodegenOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Toolchain {
        Toolchain {
            rules: self.rules,
            classes: self.classes,
            options: self.options,
        }
    }
}

impl Default for ToolchainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolchain {
    pub fn builder() -> ToolchainBuilder {
        ToolchainBuilder::new()
    }

    /// Starts a new builder holding everything registered here, for appending rules.
    pub fn extend(&self) -> ToolchainBuilder {
        ToolchainBuilder {
            rules: self.rules.clone(),
            classes: self.classes.clone(),
            options: self.options.clone(),
        }
    }

    pub fn rule(&self, type_tag: &str) -> Option<&Rule> {
        self.rules.get(type_tag)
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    /// Looks a component type up by its full tag, then by its bare (un-namespaced) tag.
    pub fn class(&self, component_type: &str) -> Option<&ComponentClass> {
        self.classes
            .get(component_type)
            .or_else(|| self.classes.get(bare_type_tag(component_type)))
    }

    /// Resolves a component type to a class name. Never fails: unregistered
    /// types get a name derived from the tag.
    pub fn resolve_class(&self, component_type: &str) -> ResolvedClass<'_> {
        match self.class(component_type) {
            Some(class) => ResolvedClass {
                class_name: Cow::Borrowed(class.class_name.as_str()),
                defaults: Some(&class.defaults),
                derived: false,
            },
            None => ResolvedClass {
                class_name: Cow::Owned(derive_class_name(
                    bare_type_tag(component_type),
                    &self.options.class_suffix,
                )),
                defaults: None,
                derived: true,
            },
        }
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Strips a `namespace:` prefix from a type tag (`daq:timer` -> `timer`).
pub fn bare_type_tag(tag: &str) -> &str {
    tag.rsplit_once(':').map_or(tag, |(_, bare)| bare)
}

/// Derives a class name from a type tag: each alphanumeric segment is
/// capitalized and the segments are joined before `suffix` is appended.
///
/// `widget_gizmo` with suffix `Component` becomes `WidgetGizmoComponent`.
pub fn derive_class_name(tag: &str, suffix: &str) -> String {
    let mut name: String = tag
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name.push_str(suffix);
    name
}
