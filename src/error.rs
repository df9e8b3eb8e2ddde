use thiserror::Error;

/// Errors raised at the mutation boundary of a block workspace or a program graph.
///
/// The compilers assume acyclic, reference-valid inputs; every edit that could
/// break that assumption is rejected here instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("A block with id '{0}' already exists in the workspace")]
    DuplicateBlockId(String),

    #[error("Block '{0}' not found in the workspace")]
    BlockNotFound(String),

    #[error("Attaching block '{child_id}' under '{parent_id}' would create a cycle")]
    WouldCreateCycle { parent_id: String, child_id: String },

    #[error("A component node with id '{0}' already exists in the graph")]
    DuplicateNodeId(String),

    #[error("Component node '{0}' not found in the graph")]
    NodeNotFound(String),

    #[error("Wire {source_node_id}.{source_port_id} -> {target_node_id}.{target_port_id} references a missing node")]
    DanglingWire {
        source_node_id: String,
        source_port_id: String,
        target_node_id: String,
        target_port_id: String,
    },

    #[error("Wire {source_node_id}.{source_port_id} -> {target_node_id}.{target_port_id} already exists")]
    DuplicateWire {
        source_node_id: String,
        source_port_id: String,
        target_node_id: String,
        target_port_id: String,
    },

    #[error("Wiring '{source_node_id}' to '{target_node_id}' would close a dependency cycle")]
    CyclicWiring {
        source_node_id: String,
        target_node_id: String,
    },
}

/// Errors that can occur while loading a project document or a workspace state blob.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to parse JSON document: {0}")]
    JsonParseError(String),

    #[error("Project document is missing the required '{0}' section")]
    MissingSection(&'static str),

    #[error("Document describes an invalid structure: {0}")]
    InvalidStructure(#[from] EditError),

    #[error("Could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::JsonParseError(err.to_string())
    }
}
