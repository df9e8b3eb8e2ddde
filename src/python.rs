use crate::block::Workspace;
use crate::compiler::{BlockCompiler, GraphCompiler, SchemaCompiler, Toolchain};
use crate::ident;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyErr::new::<PyValueError, _>(err.to_string())
}

/// Compiles a `.daq` project document into a runnable Python program.
///
/// Args:
///     project_json (str): The project document, including its `meta` and
///         `logic` sections.
///
/// Returns:
///     str: The generated program source.
///
/// Raises:
///     ValueError: If the document is malformed or its graph is invalid
///         (duplicate node ids, dangling or cyclic wires).
#[pyfunction]
fn compile_project(project_json: &str) -> PyResult<String> {
    let toolchain = Toolchain::default();
    let program = GraphCompiler::new(&toolchain)
        .compile_document(project_json)
        .map_err(value_error)?;
    Ok(program.source)
}

/// Compiles a block-workspace state blob into a script.
///
/// Raises:
///     ValueError: If the state is malformed or repeats a block id.
#[pyfunction]
fn compile_blocks(state_json: &str) -> PyResult<String> {
    let workspace = Workspace::from_state(state_json).map_err(value_error)?;
    let toolchain = Toolchain::default();
    Ok(BlockCompiler::new(&toolchain).compile_workspace(&workspace).code)
}

/// Compiles a block-definition workspace into `(schema_json, rule_stub)`.
#[pyfunction]
fn compile_schema(state_json: &str) -> PyResult<(String, String)> {
    let workspace = Workspace::from_state(state_json).map_err(value_error)?;
    let output = SchemaCompiler::new().compile_workspace(&workspace);
    Ok((output.schema, output.stub))
}

/// Converts a label into the identifier the program compiler would use.
#[pyfunction]
fn sanitize(label: &str, node_id: &str) -> String {
    ident::sanitize(label, node_id)
}

/// Compilers for visual DAQ programs.
///
/// This module exposes the Rust compilers to the editor, which calls them on
/// every edit to refresh its code preview.
#[pymodule]
fn daqgen(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(compile_project, m)?)?;
    m.add_function(wrap_pyfunction!(compile_blocks, m)?)?;
    m.add_function(wrap_pyfunction!(compile_schema, m)?)?;
    m.add_function(wrap_pyfunction!(sanitize, m)?)?;
    Ok(())
}
