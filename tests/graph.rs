// tests/graph.rs
mod common;
use common::*;
use daqgen::prelude::*;
use serde_json::json;

const TIMER_PROGRAM: &str = r#""""
Untitled v1.0.0

Generated from the project graph. Do not edit by hand.
"""

import logging
import time

from daq_core.engine import DAQEngine
from daq_core.components import (
    TimerComponent,
)

logging.basicConfig(
    level=logging.INFO,
    format="%(asctime)s [%(levelname)s] %(name)s: %(message)s",
)
logger = logging.getLogger(__name__)


def create_engine():
    engine = DAQEngine()

    # timer (t1)
    tick = TimerComponent("t1", {
        "interval_ms": 500
    })
    engine.add_component(tick)

    return engine


def main():
    engine = None
    try:
        engine = create_engine()
        engine.start()
        logger.info("Running %s, press Ctrl+C to stop", "Untitled")
        while True:
            time.sleep(1.0)
    except KeyboardInterrupt:
        logger.info("Interrupted, stopping engine")
    except Exception:
        logger.exception("Engine failed")
        raise
    finally:
        if engine is not None:
            engine.stop()


if __name__ == "__main__":
    main()
"#;

#[test]
fn test_full_program_layout() {
    let mut graph = ProgramGraph::new();
    graph
        .add_node(
            ComponentNode::new("t1", "timer")
                .with_label("Tick")
                .with_property("interval_ms", 500),
        )
        .unwrap();
    let program = compile_graph(&graph);
    assert_eq!(program.source, TIMER_PROGRAM);
    assert_eq!(program.classes, ["TimerComponent"]);
    assert!(program.diagnostics.is_empty());
}

#[test]
fn test_single_node_scenario() {
    let mut graph = ProgramGraph::new();
    graph
        .add_node(ComponentNode::new("n1", "mock_device").with_label("Sensor 1"))
        .unwrap();
    let source = compile_graph(&graph).source;

    assert!(source.contains("sensor_1 = MockDeviceComponent(\"n1\", {"));
    assert_eq!(source.matches("MockDeviceComponent(").count(), 1);
    assert_eq!(source.matches("engine.add_component(sensor_1)").count(), 1);
    assert!(!source.contains("engine.connect("));
    for scaffold in [
        "def main():",
        "engine.start()",
        "except KeyboardInterrupt:",
        "except Exception:",
        "finally:",
        "engine.stop()",
        "if __name__ == \"__main__\":",
    ] {
        assert!(source.contains(scaffold), "missing {:?}", scaffold);
    }
}

#[test]
fn test_wiring_references_node_ids() {
    let source = compile_graph(&create_sensor_alarm_graph()).source;
    let connects: Vec<&str> = source
        .lines()
        .filter(|line| line.contains("engine.connect("))
        .collect();
    assert_eq!(
        connects,
        ["    engine.connect(\"n1\", \"value\", \"n2\", \"value\")"]
    );
    assert!(source.contains("alarm_1 = ThresholdAlarmComponent(\"n2\", {"));
}

#[test]
fn test_unicode_label_falls_back_to_node_id() {
    let mut graph = ProgramGraph::new();
    graph
        .add_node(ComponentNode::new("n7", "mock_device").with_label("温度传感器-1"))
        .unwrap();
    let source = compile_graph(&graph).source;
    assert!(source.contains("component_n7 = MockDeviceComponent(\"n7\""));
}

#[test]
fn test_unregistered_type_gets_derived_class() {
    let mut graph = ProgramGraph::new();
    graph
        .add_node(ComponentNode::new("g1", "widget_gizmo").with_label("Gizmo"))
        .unwrap();
    graph
        .add_node(ComponentNode::new("g2", "daq:widget_gizmo").with_label("Gizmo"))
        .unwrap();
    let program = compile_graph(&graph);

    assert_eq!(program.classes, ["WidgetGizmoComponent"]);
    assert_eq!(program.source.matches("    WidgetGizmoComponent,\n").count(), 1);
    assert!(program.source.contains("gizmo = WidgetGizmoComponent(\"g1\", {})"));
    assert!(program.source.contains("gizmo_2 = WidgetGizmoComponent(\"g2\", {})"));
    assert!(
        program
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::UnresolvedComponentType)
    );
    assert_eq!(program.diagnostics.len(), 2);
}

#[test]
fn test_classes_import_once_in_first_seen_order() {
    let mut graph = ProgramGraph::new();
    for (id, component_type) in [
        ("a", "csv_storage"),
        ("b", "mock_device"),
        ("c", "csv_write"),
        ("d", "math"),
        ("e", "scale"),
    ] {
        graph
            .add_node(ComponentNode::new(id, component_type))
            .unwrap();
    }
    let program = compile_graph(&graph);
    assert_eq!(
        program.classes,
        ["CSVStorageComponent", "MockDeviceComponent", "MathOperationComponent"]
    );
}

#[test]
fn test_identifiers_avoid_scaffold_names_and_each_other() {
    let mut graph = ProgramGraph::new();
    for (id, label) in [("a", "engine"), ("b", "Sensor"), ("c", "sensor"), ("d", "")] {
        graph
            .add_node(ComponentNode::new(id, "timer").with_label(label))
            .unwrap();
    }
    let source = compile_graph(&graph).source;
    assert!(source.contains("engine_2 = TimerComponent(\"a\""));
    assert!(source.contains("sensor = TimerComponent(\"b\""));
    assert!(source.contains("sensor_2 = TimerComponent(\"c\""));
    assert!(source.contains("    d = TimerComponent(\"d\""));
}

#[test]
fn test_class_defaults_follow_node_properties() {
    let mut graph = ProgramGraph::new();
    graph
        .add_node(
            ComponentNode::new("n1", "mock_device")
                .with_label("Sensor")
                .with_property("wave_type", "square"),
        )
        .unwrap();
    let source = compile_graph(&graph).source;
    let expected = "    sensor = MockDeviceComponent(\"n1\", {\n        \"wave_type\": \"square\",\n        \"broker_host\": \"localhost\",\n        \"broker_port\": 1883,\n        \"topic\": \"sensors/mock\",\n        \"interval_ms\": 1000\n    })\n";
    assert!(source.contains(expected), "{}", source);
}

#[test]
fn test_script_node_embeds_generated_code() {
    let mut graph = ProgramGraph::new();
    graph
        .add_node(
            ComponentNode::new("s1", "custom_script")
                .with_label("Script")
                .with_property("timeout", 5)
                .with_property(
                    "blocks",
                    json!({"blocks": [{"id": "p", "type": "text_print",
                        "inputs": {"TEXT": {"id": "t", "type": "text", "fields": {"TEXT": "hi"}}}}]}),
                ),
        )
        .unwrap();
    let program = compile_graph(&graph);
    assert!(
        program.source.contains(
            "script = CustomScriptComponent(\"s1\", {\n        \"timeout\": 5,\n        \"generatedCode\": \"print(\\\"hi\\\")\\n\"\n    })"
        ),
        "{}",
        program.source
    );
    assert!(!program.source.contains("\"blocks\""));
    assert!(program.diagnostics.is_empty());
}

#[test]
fn test_script_state_as_json_string() {
    let state = r#"{"blocks": [{"id": "x", "type": "mystery"}]}"#;
    let mut graph = ProgramGraph::new();
    graph
        .add_node(ComponentNode::new("s1", "custom_script").with_property("blocks", state))
        .unwrap();
    let program = compile_graph(&graph);
    assert!(
        program
            .source
            .contains("\"generatedCode\": \"# Unknown block type 'mystery' (x)\\n\"")
    );
    assert_eq!(program.diagnostics.len(), 1);
    assert_eq!(program.diagnostics[0].subject_id, "x");
}

#[test]
fn test_invalid_script_state_is_diagnosed() {
    let mut graph = ProgramGraph::new();
    graph
        .add_node(ComponentNode::new("s1", "custom_script").with_property("blocks", "not json"))
        .unwrap();
    let program = compile_graph(&graph);
    assert!(!program.source.contains("generatedCode"));
    assert!(program.source.contains("CustomScriptComponent(\"s1\", {})"));
    assert_eq!(program.diagnostics.len(), 1);
    assert_eq!(
        program.diagnostics[0].kind,
        DiagnosticKind::InvalidScriptState
    );
}

#[test]
fn test_custom_options_change_the_dialect_surface() {
    let options = CodegenOptions::from_json(
        r#"{"indent": "  ", "engineModule": "rt.engine", "engineClass": "Engine",
            "componentModule": "rt.parts", "idleSleepSeconds": 0.5}"#,
    )
    .unwrap();
    let toolchain = Toolchain::builder().with_options(options).build();
    let program = GraphCompiler::new(&toolchain).compile_program(&create_sensor_alarm_graph());

    assert!(program.source.contains("from rt.engine import Engine\n"));
    assert!(program.source.contains("from rt.parts import (\n  MockDeviceComponent,\n"));
    assert!(program.source.contains("      time.sleep(0.5)\n"));
    assert!(program.source.contains("  engine = Engine()\n"));
}

#[test]
fn test_graph_compilation_is_deterministic() {
    let graph = create_sensor_alarm_graph();
    assert_eq!(compile_graph(&graph), compile_graph(&graph));
}

#[test]
fn test_header_escapes_project_name() {
    let meta = ProjectMeta {
        name: "Say \"\"\"hi\"\"\"".to_string(),
        ..ProjectMeta::default()
    };
    let source = compile_graph(&ProgramGraph::with_meta(meta)).source;
    assert!(source.starts_with("\"\"\"\nSay \\\"\\\"\\\"hi\\\"\\\"\\\" v1.0.0\n"));
    assert!(source.contains("logger.info(\"Running %s, press Ctrl+C to stop\", \"Say \\\"\\\"\\\"hi\\\"\\\"\\\"\")"));
    assert!(!source.contains("from daq_core.components import"));
}
