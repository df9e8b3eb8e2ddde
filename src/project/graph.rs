use crate::error::EditError;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Project-level metadata carried into the generated program header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default = "default_project_version")]
    pub version: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub description: String,
}

fn default_project_name() -> String {
    "Untitled".to_string()
}

fn default_project_version() -> String {
    "1.0.0".to_string()
}

fn default_schema_version() -> String {
    "0.1.0".to_string()
}

impl Default for ProjectMeta {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            version: default_project_version(),
            schema_version: default_schema_version(),
            description: String::new(),
        }
    }
}

/// Canvas position of a node. Kept only so documents round-trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// An instance of a typed DAQ building block.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentNode {
    pub id: String,
    pub component_type: String,
    pub label: String,
    pub properties: Map<String, Value>,
    pub position: Position,
}

impl ComponentNode {
    pub fn new(id: impl Into<String>, component_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            component_type: component_type.into(),
            label: String::new(),
            properties: Map::new(),
            position: Position::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Position { x, y };
        self
    }
}

/// One end of a wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    pub node_id: String,
    pub port_id: String,
}

impl PortRef {
    pub fn new(node_id: impl Into<String>, port_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            port_id: port_id.into(),
        }
    }
}

/// A directed connection from an output port to an input port.
///
/// Endpoints are referenced by node id, never by the generated variable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    #[serde(default)]
    pub id: String,
    pub source: PortRef,
    pub target: PortRef,
}

impl Wire {
    pub fn new(source: PortRef, target: PortRef) -> Self {
        let id = format!(
            "{}.{}->{}.{}",
            source.node_id, source.port_id, target.node_id, target.port_id
        );
        Self { id, source, target }
    }

    fn same_endpoints(&self, other: &Wire) -> bool {
        self.source == other.source && self.target == other.target
    }

    fn dangling(&self) -> EditError {
        EditError::DanglingWire {
            source_node_id: self.source.node_id.clone(),
            source_port_id: self.source.port_id.clone(),
            target_node_id: self.target.node_id.clone(),
            target_port_id: self.target.port_id.clone(),
        }
    }

    fn duplicate(&self) -> EditError {
        EditError::DuplicateWire {
            source_node_id: self.source.node_id.clone(),
            source_port_id: self.source.port_id.clone(),
            target_node_id: self.target.node_id.clone(),
            target_port_id: self.target.port_id.clone(),
        }
    }
}

/// The dataflow program: nodes and wires in insertion order.
///
/// Insertion order is emission order. Every mutation keeps the graph
/// reference-valid (no wire names a missing node) and acyclic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramGraph {
    pub meta: ProjectMeta,
    nodes: Vec<ComponentNode>,
    wires: Vec<Wire>,
}

impl ProgramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meta(meta: ProjectMeta) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> &[ComponentNode] {
        &self.nodes
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn node(&self, id: &str) -> Option<&ComponentNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn incoming_wires(&self, node_id: &str) -> impl Iterator<Item = &Wire> {
        self.wires.iter().filter(move |w| w.target.node_id == node_id)
    }

    pub fn outgoing_wires(&self, node_id: &str) -> impl Iterator<Item = &Wire> {
        self.wires.iter().filter(move |w| w.source.node_id == node_id)
    }

    pub fn add_node(&mut self, node: ComponentNode) -> Result<(), EditError> {
        if self.node(&node.id).is_some() {
            return Err(EditError::DuplicateNodeId(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Removes a node together with every wire attached to it.
    pub fn remove_node(&mut self, id: &str) -> Result<ComponentNode, EditError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| EditError::NodeNotFound(id.to_string()))?;
        self.wires
            .retain(|w| w.source.node_id != id && w.target.node_id != id);
        Ok(self.nodes.remove(index))
    }

    pub fn set_label(&mut self, id: &str, label: impl Into<String>) -> Result<(), EditError> {
        self.node_mut(id)?.label = label.into();
        Ok(())
    }

    pub fn set_property(&mut self, id: &str, name: &str, value: Value) -> Result<(), EditError> {
        self.node_mut(id)?.properties.insert(name.to_string(), value);
        Ok(())
    }

    /// Adds a wire after checking both endpoints exist and the wire closes no cycle.
    pub fn connect(&mut self, wire: Wire) -> Result<(), EditError> {
        if self.node(&wire.source.node_id).is_none() || self.node(&wire.target.node_id).is_none()
        {
            return Err(wire.dangling());
        }
        if self.wires.iter().any(|w| w.same_endpoints(&wire)) {
            return Err(wire.duplicate());
        }
        if self.reaches(&wire.target.node_id, &wire.source.node_id) {
            return Err(EditError::CyclicWiring {
                source_node_id: wire.source.node_id,
                target_node_id: wire.target.node_id,
            });
        }
        self.wires.push(wire);
        Ok(())
    }

    pub fn disconnect(&mut self, source: &PortRef, target: &PortRef) -> Option<Wire> {
        let index = self
            .wires
            .iter()
            .position(|w| &w.source == source && &w.target == target)?;
        Some(self.wires.remove(index))
    }

    fn node_mut(&mut self, id: &str) -> Result<&mut ComponentNode, EditError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| EditError::NodeNotFound(id.to_string()))
    }

    /// Whether `to` is reachable from `from` along existing wires.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited: AHashSet<&str> = AHashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.outgoing_wires(current).map(|w| w.target.node_id.as_str()));
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> ProgramGraph {
        let mut graph = ProgramGraph::new();
        graph.add_node(ComponentNode::new("a", "mock_device")).unwrap();
        graph.add_node(ComponentNode::new("b", "math")).unwrap();
        graph.add_node(ComponentNode::new("c", "csv_storage")).unwrap();
        graph
            .connect(Wire::new(PortRef::new("a", "value"), PortRef::new("b", "input1")))
            .unwrap();
        graph
            .connect(Wire::new(PortRef::new("b", "result"), PortRef::new("c", "value")))
            .unwrap();
        graph
    }

    #[test]
    fn test_remove_node_cascades_wires() {
        let mut graph = graph();
        graph.remove_node("b").unwrap();
        assert!(graph.wires().is_empty());
        assert_eq!(graph.nodes().len(), 2);
    }

    #[test]
    fn test_connect_rejects_invalid_wires() {
        let mut graph = graph();
        let dangling = Wire::new(PortRef::new("a", "value"), PortRef::new("ghost", "in"));
        assert!(matches!(graph.connect(dangling), Err(EditError::DanglingWire { .. })));

        let duplicate = Wire::new(PortRef::new("a", "value"), PortRef::new("b", "input1"));
        assert!(matches!(graph.connect(duplicate), Err(EditError::DuplicateWire { .. })));

        let back_edge = Wire::new(PortRef::new("c", "out"), PortRef::new("a", "trigger"));
        assert!(matches!(graph.connect(back_edge), Err(EditError::CyclicWiring { .. })));

        let self_loop = Wire::new(PortRef::new("b", "result"), PortRef::new("b", "input2"));
        assert!(matches!(graph.connect(self_loop), Err(EditError::CyclicWiring { .. })));
    }

    #[test]
    fn test_duplicate_node_id() {
        let mut graph = graph();
        let err = graph.add_node(ComponentNode::new("a", "timer")).unwrap_err();
        assert_eq!(err, EditError::DuplicateNodeId("a".into()));
    }
}
