//! Block trees: the nested expression/statement structure edited inside script nodes.
//!
//! A [`Block`] exclusively owns every block reachable through its value sockets,
//! its statement sockets and its `next` pointer, so a tree can never contain a
//! cycle or a shared child. The [`Workspace`] owns the top-level chains and is
//! the only place where blocks are moved between owners.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub mod workspace;

pub use workspace::Workspace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    /// Connected value sockets. An unconnected socket is simply absent.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, Block>,
    /// Connected statement sockets, each holding the head of a nested chain.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub statements: BTreeMap<String, Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<Block>>,
}

impl Block {
    pub fn new(id: impl Into<String>, type_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_tag: type_tag.into(),
            fields: Map::new(),
            inputs: BTreeMap::new(),
            statements: BTreeMap::new(),
            next: None,
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_input(mut self, socket: impl Into<String>, child: Block) -> Self {
        self.inputs.insert(socket.into(), child);
        self
    }

    pub fn with_statement(mut self, socket: impl Into<String>, head: Block) -> Self {
        self.statements.insert(socket.into(), head);
        self
    }

    pub fn with_next(mut self, next: Block) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Reads a numeric field, accepting numbers stored as strings.
    pub fn field_f64(&self, name: &str) -> Option<f64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reads a boolean field, accepting the editor's `"TRUE"`/`"FALSE"` spelling.
    pub fn field_bool(&self, name: &str) -> Option<bool> {
        match self.fields.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    pub fn input(&self, socket: &str) -> Option<&Block> {
        self.inputs.get(socket)
    }

    pub fn statement(&self, socket: &str) -> Option<&Block> {
        self.statements.get(socket)
    }

    /// Iterates this block followed by every block linked through `next`.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            current: Some(self),
        }
    }

    /// Links `tail` after the last block of this chain.
    pub fn append_to_chain(&mut self, tail: Block) {
        match self.next {
            Some(ref mut next) => next.append_to_chain(tail),
            None => self.next = Some(Box::new(tail)),
        }
    }

    /// Finds `id` in this block, its sockets or its trailing chain.
    pub fn find(&self, id: &str) -> Option<&Block> {
        for block in self.chain() {
            if block.id == id {
                return Some(block);
            }
            for child in block.inputs.values().chain(block.statements.values()) {
                if let Some(found) = child.find(id) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Block> {
        if self.id == id {
            return Some(self);
        }
        for child in self.inputs.values_mut().chain(self.statements.values_mut()) {
            if let Some(found) = child.find_mut(id) {
                return Some(found);
            }
        }
        self.next.as_deref_mut().and_then(|next| next.find_mut(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Visits every block owned by this one (itself included) in document order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Block)) {
        for block in self.chain() {
            visit(block);
            for child in block.inputs.values().chain(block.statements.values()) {
                child.walk(visit);
            }
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        self.walk(&mut |block| ids.push(block.id.as_str()));
        ids
    }

    /// Locates the slot that directly holds the descendant `id`.
    pub(crate) fn slot_of(&self, id: &str) -> Option<Slot> {
        for block in self.chain() {
            for (socket, child) in &block.inputs {
                if child.id == id {
                    return Some(Slot::Input(block.id.clone(), socket.clone()));
                }
                if let Some(slot) = child.slot_of(id) {
                    return Some(slot);
                }
            }
            for (socket, child) in &block.statements {
                if child.id == id {
                    return Some(Slot::Statement(block.id.clone(), socket.clone()));
                }
                if let Some(slot) = child.slot_of(id) {
                    return Some(slot);
                }
            }
            if block.next.as_ref().is_some_and(|next| next.id == id) {
                return Some(Slot::Next(block.id.clone()));
            }
        }
        None
    }
}

/// Iterator over a statement chain.
pub struct Chain<'a> {
    current: Option<&'a Block>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.current?;
        self.current = block.next.as_deref();
        Some(block)
    }
}

/// Where a block lives inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    TopLevel(usize),
    Input(String, String),
    Statement(String, String),
    Next(String),
}
