//! Prelude module for convenient imports
//!
//! Re-exports the types needed to build a toolchain, edit block trees and
//! program graphs, compile them, and write custom block rules.
//!
//! # Example
//!
//! ```rust
//! use daqgen::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let workspace = Workspace::from_state(
//!     r#"{"blocks": [{"id": "p", "type": "text_print",
//!        "inputs": {"TEXT": {"id": "t", "type": "text", "fields": {"TEXT": "hi"}}}}]}"#,
//! )?;
//! let toolchain = Toolchain::default();
//! let output = BlockCompiler::new(&toolchain).compile_workspace(&workspace);
//! assert_eq!(output.code, "print(\"hi\")\n");
//! # Ok(())
//! # }
//! # run_example().unwrap();
//! ```

// Compilers and the rule table
pub use crate::compiler::{
    BlockCompiler, BlockOutput, CompiledProgram, Diagnostic, DiagnosticKind, GraphCompiler,
    SchemaCompiler, SchemaOutput, Toolchain, ToolchainBuilder,
};

// Writing block rules
pub use crate::ast::{Expr, Order};
pub use crate::compiler::{
    Fallback, Rule, StagedTemplate, StatementRule, StatementTemplate, Template, ValueRule,
};

// Editable models
pub use crate::block::{Block, Workspace};
pub use crate::project::{
    ComponentNode, IntoGraph, PortRef, ProgramGraph, ProjectDocument, ProjectMeta, Wire,
};

// Configuration and errors
pub use crate::config::CodegenOptions;
pub use crate::error::{EditError, LoadError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
