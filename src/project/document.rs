use super::graph::{ComponentNode, Position, ProgramGraph, ProjectMeta, Wire};
use crate::error::LoadError;
use crate::json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;

/// The persisted project document (`.daq` JSON).
///
/// Devices and dashboard widgets are carried through untouched; only the
/// `logic` section is compiled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub meta: ProjectMeta,
    #[serde(default)]
    pub devices: Vec<Value>,
    pub logic: LogicSection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicSection {
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub wires: Vec<Wire>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSection {
    #[serde(default)]
    pub widgets: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// A trait for project formats that can be converted into a [`ProgramGraph`].
///
/// Implementations must build the graph through its checked mutation API so
/// that structurally invalid documents are rejected before compilation.
pub trait IntoGraph {
    fn into_graph(self) -> Result<ProgramGraph, LoadError>;
}

const REQUIRED_SECTIONS: [&str; 2] = ["meta", "logic"];

impl ProjectDocument {
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let value: Value = json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        for section in REQUIRED_SECTIONS {
            if value.get(section).is_none() {
                return Err(LoadError::MissingSection(section));
            }
        }
        Ok(json::from_value(value)?)
    }

    pub fn from_file(path: &str) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Captures the logic of `graph` as a document with no devices or widgets.
    pub fn from_graph(graph: &ProgramGraph) -> Self {
        Self {
            meta: graph.meta.clone(),
            devices: Vec::new(),
            logic: LogicSection {
                nodes: graph
                    .nodes()
                    .iter()
                    .map(|node| NodeDocument {
                        id: node.id.clone(),
                        component_type: node.component_type.clone(),
                        label: node.label.clone(),
                        position: node.position,
                        properties: node.properties.clone(),
                    })
                    .collect(),
                wires: graph.wires().to_vec(),
            },
            ui: UiSection::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl IntoGraph for ProjectDocument {
    fn into_graph(self) -> Result<ProgramGraph, LoadError> {
        let mut graph = ProgramGraph::with_meta(self.meta);
        for node in self.logic.nodes {
            graph.add_node(ComponentNode {
                id: node.id,
                component_type: node.component_type,
                label: node.label,
                properties: node.properties,
                position: node.position,
            })?;
        }
        for wire in self.logic.wires {
            graph.connect(wire)?;
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditError;

    const DOCUMENT: &str = r#"{
        "meta": {"name": "Demo", "version": "2.0.0", "schemaVersion": "0.1.0"},
        "devices": [],
        "logic": {
            "nodes": [
                {"id": "n1", "type": "daq:mock_device", "label": "Sensor 1",
                 "position": {"x": 10, "y": 20}, "properties": {"wave_type": "sine"}},
                {"id": "n2", "type": "daq:debug_print", "label": "Out"}
            ],
            "wires": [
                {"id": "w1", "source": {"nodeId": "n1", "portId": "value"},
                 "target": {"nodeId": "n2", "portId": "data"}}
            ]
        },
        "ui": {"widgets": []}
    }"#;

    #[test]
    fn test_document_converts_to_graph() {
        let graph = ProjectDocument::from_json(DOCUMENT)
            .unwrap()
            .into_graph()
            .unwrap();
        assert_eq!(graph.meta.name, "Demo");
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.nodes()[0].position, Position { x: 10.0, y: 20.0 });
        assert_eq!(graph.wires()[0].id, "w1");
    }

    #[test]
    fn test_missing_section() {
        let err = ProjectDocument::from_json(r#"{"meta": {}}"#).unwrap_err();
        assert!(matches!(err, LoadError::MissingSection("logic")));
    }

    #[test]
    fn test_dangling_wire_is_rejected_on_load() {
        let json = r#"{"meta": {}, "logic": {"nodes": [{"id": "a", "type": "timer"}],
            "wires": [{"source": {"nodeId": "a", "portId": "o"},
                       "target": {"nodeId": "gone", "portId": "i"}}]}}"#;
        let err = ProjectDocument::from_json(json)
            .unwrap()
            .into_graph()
            .unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidStructure(EditError::DanglingWire { .. })
        ));
    }

    #[test]
    fn test_graph_round_trips_through_document() {
        let graph = ProjectDocument::from_json(DOCUMENT)
            .unwrap()
            .into_graph()
            .unwrap();
        let json = ProjectDocument::from_graph(&graph).to_json().unwrap();
        let restored = ProjectDocument::from_json(&json)
            .unwrap()
            .into_graph()
            .unwrap();
        assert_eq!(graph, restored);
    }
}
