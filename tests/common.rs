//! Common test utilities for building block trees and program graphs.
use daqgen::prelude::*;
use serde_json::Value;

/// A `math_number` block.
#[allow(dead_code)]
pub fn number(id: &str, value: impl Into<Value>) -> Block {
    Block::new(id, "math_number").with_field("NUM", value)
}

/// A `math_arithmetic` block with both operands connected.
#[allow(dead_code)]
pub fn arithmetic(id: &str, op: &str, a: Block, b: Block) -> Block {
    Block::new(id, "math_arithmetic")
        .with_field("OP", op)
        .with_input("A", a)
        .with_input("B", b)
}

#[allow(dead_code)]
pub fn boolean(id: &str, value: bool) -> Block {
    Block::new(id, "logic_boolean").with_field("BOOL", if value { "TRUE" } else { "FALSE" })
}

#[allow(dead_code)]
pub fn text(id: &str, value: &str) -> Block {
    Block::new(id, "text").with_field("TEXT", value)
}

#[allow(dead_code)]
pub fn print(id: &str, value: Block) -> Block {
    Block::new(id, "text_print").with_input("TEXT", value)
}

/// A statement chain of `len` blocks printing `0..len`, linked through `next`.
#[allow(dead_code)]
pub fn print_chain(len: usize) -> Block {
    (0..len)
        .rev()
        .map(|i| print(&format!("p{}", i), number(&format!("n{}", i), i as u64)))
        .reduce(|tail, head| head.with_next(tail))
        .expect("chain length must be positive")
}

/// Compiles one value block at the loosest context with the default toolchain.
#[allow(dead_code)]
pub fn compile_value(block: &Block) -> (Expr, Vec<Diagnostic>) {
    let toolchain = Toolchain::default();
    let mut cx = BlockCompiler::new(&toolchain);
    let expr = cx.compile_value(block, Order::None);
    (expr, cx.diagnostics().to_vec())
}

/// Compiles top-level chains with the default toolchain.
#[allow(dead_code)]
pub fn compile_blocks(chains: Vec<Block>) -> BlockOutput {
    let mut workspace = Workspace::new();
    for chain in chains {
        workspace.add_block(chain).unwrap();
    }
    let toolchain = Toolchain::default();
    BlockCompiler::new(&toolchain).compile_workspace(&workspace)
}

/// Two nodes, "Sensor 1" feeding "Alarm 1" through one wire.
#[allow(dead_code)]
pub fn create_sensor_alarm_graph() -> ProgramGraph {
    let mut graph = ProgramGraph::new();
    graph
        .add_node(ComponentNode::new("n1", "mock_device").with_label("Sensor 1"))
        .unwrap();
    graph
        .add_node(
            ComponentNode::new("n2", "threshold_alarm")
                .with_label("Alarm 1")
                .with_property("threshold", 30),
        )
        .unwrap();
    graph
        .connect(Wire::new(
            PortRef::new("n1", "value"),
            PortRef::new("n2", "value"),
        ))
        .unwrap();
    graph
}

#[allow(dead_code)]
pub fn compile_graph(graph: &ProgramGraph) -> CompiledProgram {
    let toolchain = Toolchain::default();
    GraphCompiler::new(&toolchain).compile_program(graph)
}

/// A project document with a sensor, a script node and a storage node.
#[allow(dead_code)]
pub const PROJECT_JSON: &str = r#"{
    "meta": {"name": "Lab Bench", "version": "1.2.0", "schemaVersion": "0.1.0"},
    "devices": [],
    "logic": {
        "nodes": [
            {"id": "dev1", "type": "daq:mock_device", "label": "Bench Sensor",
             "properties": {"wave_type": "square"}},
            {"id": "script1", "type": "daq:custom_script", "label": "To Fahrenheit",
             "properties": {"blocks": {"blocks": [
                {"id": "out", "type": "daq_set_output",
                 "fields": {"PORT": "output1"},
                 "inputs": {"VALUE": {"id": "conv", "type": "daq_celsius_to_fahrenheit",
                     "inputs": {"CELSIUS": {"id": "in", "type": "daq_get_input",
                                            "fields": {"PORT": "input1"}}}}}}
             ]}}},
            {"id": "csv1", "type": "daq:csv_storage", "label": "Log File", "properties": {}}
        ],
        "wires": [
            {"id": "w1", "source": {"nodeId": "dev1", "portId": "value"},
             "target": {"nodeId": "script1", "portId": "input1"}},
            {"id": "w2", "source": {"nodeId": "script1", "portId": "output1"},
             "target": {"nodeId": "csv1", "portId": "value"}}
        ]
    },
    "ui": {"widgets": []}
}"#;
