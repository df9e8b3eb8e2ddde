pub mod document;
pub mod graph;

pub use document::*;
pub use graph::*;
