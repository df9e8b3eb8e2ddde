use super::rules::{Rule, StatementRule, UnknownBlockRule, ValueRule};
use super::template::Fallback;
use super::writer::indent_lines;
use super::{Diagnostic, DiagnosticKind, Toolchain};
use crate::ast::{Expr, Order};
use crate::block::{Block, Workspace};
use crate::ident::{IdentifierScope, sanitize_with_prefix};
use ahash::AHashMap;
use itertools::Itertools;

/// Names a script variable may never shadow: builtins and runtime helpers the
/// generated code calls.
const RESERVED_NAMES: &[&str] = &[
    "abs", "float", "get_input", "int", "len", "logger", "math", "print", "range", "round",
    "set_output", "str",
];

/// The result of compiling a block workspace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockOutput {
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// The state of one block compilation: rule lookup, collected imports,
/// declared variables and diagnostics.
///
/// Rules receive the compiler as their context and call back into it for
/// child sockets.
pub struct BlockCompiler<'a> {
    toolchain: &'a Toolchain,
    imports: Vec<String>,
    variables: Vec<String>,
    variable_names: AHashMap<String, String>,
    scope: IdentifierScope,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> BlockCompiler<'a> {
    pub fn new(toolchain: &'a Toolchain) -> Self {
        Self {
            toolchain,
            imports: Vec::new(),
            variables: Vec::new(),
            variable_names: AHashMap::new(),
            scope: IdentifierScope::with_reserved(RESERVED_NAMES.iter().copied()),
            diagnostics: Vec::new(),
        }
    }

    pub fn toolchain(&self) -> &'a Toolchain {
        self.toolchain
    }

    /// One indentation level of the output dialect.
    pub fn indent(&self) -> &'a str {
        &self.toolchain.options().indent
    }

    /// Compiles a value block, parenthesized if it binds looser than `context`.
    pub fn compile_value(&mut self, block: &Block, context: Order) -> Expr {
        let toolchain = self.toolchain;
        let expr = match toolchain.rule(&block.type_tag) {
            Some(Rule::Value(rule)) => rule.compile(block, self),
            Some(Rule::Statement(_)) => {
                self.diagnose(
                    block,
                    DiagnosticKind::MisplacedBlock,
                    format!("statement block '{}' used as a value", block.type_tag),
                );
                Expr::none_literal()
            }
            None => ValueRule::compile(&UnknownBlockRule, block, self),
        };
        expr.wrap_for(context)
    }

    /// Compiles `head` and every block after it. An absent chain compiles to "".
    pub fn compile_statement_chain(&mut self, head: Option<&Block>) -> String {
        let mut code = String::new();
        for block in head.into_iter().flat_map(Block::chain) {
            let mut text = self.compile_statement(block);
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            code.push_str(&text);
        }
        code
    }

    fn compile_statement(&mut self, block: &Block) -> String {
        let toolchain = self.toolchain;
        match toolchain.rule(&block.type_tag) {
            Some(Rule::Statement(rule)) => rule.compile(block, self),
            Some(Rule::Value(rule)) => rule.compile(block, self).text,
            None => StatementRule::compile(&UnknownBlockRule, block, self),
        }
    }

    /// The text of value socket `socket` at `required` order, or its fallback literal.
    pub fn value(
        &mut self,
        block: &Block,
        socket: &str,
        required: Order,
        fallback: &Fallback,
    ) -> String {
        match block.input(socket) {
            Some(child) => self.compile_value(child, required).text,
            None => fallback.to_expr(self.indent()).wrap_for(required).text,
        }
    }

    /// The statement chain in `socket`, indented one level.
    ///
    /// Bodies with no executable line get a `pass`.
    pub fn statements(&mut self, block: &Block, socket: &str) -> String {
        let mut body = self.compile_statement_chain(block.statement(socket));
        let executable = body.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !executable {
            body.push_str("pass\n");
        }
        indent_lines(&body, self.indent())
    }

    /// The identifier of script variable `name`, declared on first use.
    pub fn variable(&mut self, name: &str) -> String {
        if let Some(ident) = self.variable_names.get(name) {
            return ident.clone();
        }
        let index = (self.variables.len() + 1).to_string();
        let ident = self
            .scope
            .claim(&sanitize_with_prefix(name, &index, "variable"));
        self.variable_names.insert(name.to_string(), ident.clone());
        self.variables.push(ident.clone());
        ident
    }

    /// Records that the generated code needs `import <module>`.
    pub fn require_import(&mut self, module: &str) {
        if !self.imports.iter().any(|m| m == module) {
            self.imports.push(module.to_string());
        }
    }

    pub fn diagnose(&mut self, block: &Block, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(block_id = %block.id, kind = ?kind, "{}", message);
        self.diagnostics.push(Diagnostic {
            subject_id: block.id.clone(),
            kind,
            message,
        });
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Compiles every top-level chain of `workspace` into one script.
    ///
    /// The script starts with its imports and variable declarations, followed
    /// by the chains in workspace order, separated by blank lines.
    pub fn compile_workspace(mut self, workspace: &Workspace) -> BlockOutput {
        let chains: Vec<String> = workspace
            .blocks()
            .iter()
            .map(|head| self.compile_statement_chain(Some(head)))
            .filter(|chain| !chain.is_empty())
            .collect();

        let mut sections = Vec::new();
        if !self.imports.is_empty() {
            sections.push(
                self.imports
                    .iter()
                    .map(|module| format!("import {}\n", module))
                    .join(""),
            );
        }
        if !self.variables.is_empty() {
            sections.push(
                self.variables
                    .iter()
                    .map(|name| format!("{} = None\n", name))
                    .join(""),
            );
        }
        sections.extend(chains);

        tracing::debug!(
            chains = workspace.blocks().len(),
            diagnostics = self.diagnostics.len(),
            "compiled block workspace"
        );
        BlockOutput {
            code: sections.join("\n"),
            diagnostics: self.diagnostics,
        }
    }
}
