// tests/toolchain.rs
mod common;
use common::*;
use daqgen::prelude::*;
use serde_json::{Map, json};

#[test]
fn test_rule_alias_compiles_like_the_original() {
    let toolchain = Toolchain::builder()
        .with_rule_alias("daq_arithmetic", "math_arithmetic")
        .build();
    let block = Block::new("x", "daq_arithmetic")
        .with_field("OP", "MULTIPLY")
        .with_input("A", number("a", 6))
        .with_input("B", number("b", 7));
    let mut cx = BlockCompiler::new(&toolchain);
    assert_eq!(cx.compile_value(&block, Order::None).text, "6 * 7");
    assert!(cx.diagnostics().is_empty());
}

#[test]
fn test_alias_of_unregistered_tag_is_ignored() {
    let toolchain = Toolchain::builder().with_rule_alias("a", "missing").build();
    assert!(toolchain.rule("a").is_none());
}

#[test]
fn test_custom_template_rule() {
    let toolchain = Toolchain::builder()
        .with_value_rule(
            "double",
            Template::new(Order::Multiplicative)
                .operand("X", Order::Multiplicative, Fallback::new(0))
                .text(" * 2"),
        )
        .build();
    let block = arithmetic(
        "add",
        "ADD",
        Block::new("d", "double").with_input(
            "X",
            arithmetic("inner", "ADD", number("a", 1), number("b", 2)),
        ),
        number("c", 1),
    );
    let mut cx = BlockCompiler::new(&toolchain);
    assert_eq!(cx.compile_value(&block, Order::None).text, "(1 + 2) * 2 + 1");
}

#[test]
fn test_custom_statement_template_with_body() {
    let toolchain = Toolchain::builder()
        .with_statement_rule(
            "every",
            StatementTemplate::new()
                .line(
                    Template::new(Order::None)
                        .text("for _tick in ticker(")
                        .operand("PERIOD", Order::None, Fallback::new(1.0))
                        .text("):"),
                )
                .body("DO"),
        )
        .build();
    let mut workspace = Workspace::new();
    workspace
        .add_block(Block::new("e", "every").with_statement("DO", print("p", text("t", "x"))))
        .unwrap();
    let output = BlockCompiler::new(&toolchain).compile_workspace(&workspace);
    assert_eq!(output.code, "for _tick in ticker(1.0):\n    print(\"x\")\n");
}

#[test]
fn test_empty_toolchain_treats_everything_as_unknown() {
    let toolchain = ToolchainBuilder::empty().build();
    let mut workspace = Workspace::new();
    workspace.add_block(print("p", text("t", "x"))).unwrap();
    let output = BlockCompiler::new(&toolchain).compile_workspace(&workspace);
    assert_eq!(output.code, "# Unknown block type 'text_print' (p)\n");
    assert_eq!(
        toolchain.resolve_class("mock_device").class_name,
        "MockDeviceComponent"
    );
    assert!(toolchain.resolve_class("mock_device").derived);
}

#[test]
fn test_class_registration_overrides_defaults() {
    let mut defaults = Map::new();
    defaults.insert("rate".to_string(), json!(10));
    let toolchain = Toolchain::builder()
        .with_class("widget_gizmo", "GizmoDriver")
        .with_class_defaults("mock_device", "SimulatedSensor", defaults)
        .build();

    let gizmo = toolchain.resolve_class("daq:widget_gizmo");
    assert_eq!(gizmo.class_name, "GizmoDriver");
    assert!(!gizmo.derived);

    let sensor = toolchain.resolve_class("mock_device");
    assert_eq!(sensor.class_name, "SimulatedSensor");
    assert_eq!(sensor.defaults.unwrap()["rate"], json!(10));
}

#[test]
fn test_extend_keeps_existing_registrations() {
    let base = Toolchain::builder().with_class("widget_gizmo", "GizmoDriver").build();
    let extended = base
        .extend()
        .with_rule_alias("math_plus", "math_arithmetic")
        .build();
    assert!(extended.rule("math_plus").is_some());
    assert!(extended.rule("controls_if").is_some());
    assert_eq!(extended.resolve_class("widget_gizmo").class_name, "GizmoDriver");
}

#[test]
fn test_indent_option_reaches_block_bodies() {
    let options = CodegenOptions {
        indent: "\t".to_string(),
        ..CodegenOptions::default()
    };
    let toolchain = Toolchain::builder().with_options(options).build();
    let mut workspace = Workspace::new();
    workspace
        .add_block(
            Block::new("w", "controls_whileUntil")
                .with_input("BOOL", boolean("b", true))
                .with_statement("DO", print("p", text("t", "x"))),
        )
        .unwrap();
    let output = BlockCompiler::new(&toolchain).compile_workspace(&workspace);
    assert_eq!(output.code, "while True:\n\tprint(\"x\")\n");
}

#[test]
fn test_toolchain_is_shared_across_threads() {
    let toolchain = std::sync::Arc::new(Toolchain::default());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let toolchain = toolchain.clone();
            std::thread::spawn(move || {
                let mut workspace = Workspace::new();
                workspace.add_block(print("p", number("n", i))).unwrap();
                BlockCompiler::new(&toolchain).compile_workspace(&workspace).code
            })
        })
        .collect();
    let outputs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outputs, ["print(0)\n", "print(1)\n", "print(2)\n", "print(3)\n"]);
}
