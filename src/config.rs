use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::fs;

/// Output-dialect settings shared by every compiler.
///
/// Every field has a default, so a configuration file only needs to name the
/// settings it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodegenOptions {
    /// One level of indentation in generated code.
    pub indent: String,
    /// Module that provides the runtime engine class.
    pub engine_module: String,
    pub engine_class: String,
    /// Module that provides the component classes.
    pub component_module: String,
    /// Suffix appended to derived class names of unregistered component types.
    pub class_suffix: String,
    /// Node property holding a block-workspace state for script-bearing nodes.
    pub script_state_key: String,
    /// Node property receiving the compiled script.
    pub generated_code_key: String,
    /// Seconds slept per idle iteration of the generated main loop.
    pub idle_sleep_seconds: f64,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            engine_module: "daq_core.engine".to_string(),
            engine_class: "DAQEngine".to_string(),
            component_module: "daq_core.components".to_string(),
            class_suffix: "Component".to_string(),
            script_state_key: "blocks".to_string(),
            generated_code_key: "generatedCode".to_string(),
            idle_sleep_seconds: 1.0,
        }
    }
}

impl CodegenOptions {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &str) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }
}
