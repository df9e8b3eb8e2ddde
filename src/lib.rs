//! # daqgen - Visual Program Compiler for DAQ Projects
//!
//! **daqgen** turns the visual representation of a data-acquisition program into
//! Python source for the `daq_core` runtime. It covers three compilers that share
//! one recursive tree-to-text walk:
//!
//! - the **block compiler** ([`compiler::BlockCompiler`]) turns block trees from
//!   script nodes into precedence-correct expressions and statements,
//! - the **graph compiler** ([`compiler::GraphCompiler`]) turns a component graph
//!   into a program that builds, wires and runs the engine,
//! - the **schema compiler** ([`compiler::SchemaCompiler`]) turns a block
//!   definition into a block schema and a rule stub.
//!
//! ## Core Workflow
//!
//! 1.  **Build a Toolchain**: [`compiler::Toolchain::builder`] registers block rules,
//!     component classes and output options once at startup.
//! 2.  **Load or Edit**: load a `.daq` document into a [`project::ProgramGraph`] or a
//!     state blob into a [`block::Workspace`]. Both only change through checked
//!     mutations, so the compilers never see cycles or dangling references.
//! 3.  **Compile**: every compiler is a pure function of its input and the toolchain.
//!     Recoverable problems come back as [`compiler::Diagnostic`]s next to the text.
//!
//! ## Quick Start
//!
//! ```rust
//! use daqgen::prelude::*;
//!
//! let toolchain = Toolchain::default();
//!
//! let mut graph = ProgramGraph::new();
//! graph.add_node(ComponentNode::new("n1", "mock_device").with_label("Sensor 1")).unwrap();
//! graph.add_node(ComponentNode::new("n2", "threshold_alarm").with_label("Alarm 1")).unwrap();
//! graph
//!     .connect(Wire::new(PortRef::new("n1", "value"), PortRef::new("n2", "value")))
//!     .unwrap();
//!
//! let program = GraphCompiler::new(&toolchain).compile_program(&graph);
//! assert!(program.source.contains("sensor_1 = MockDeviceComponent(\"n1\""));
//! assert!(program.source.contains("engine.connect(\"n1\", \"value\", \"n2\", \"value\")"));
//! ```

pub mod ast;
pub mod block;
pub mod compiler;
pub mod config;
pub mod error;
pub mod ident;
mod json;
pub mod prelude;
pub mod project;

#[cfg(feature = "python-bindings")]
mod python;
