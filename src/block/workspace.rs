use super::{Block, Slot};
use crate::error::{EditError, LoadError};
use crate::json;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The set of top-level block chains being edited.
///
/// Every structural edit goes through this type. Edits that would duplicate an
/// id, reference a missing block or make a block its own ancestor are rejected
/// with an [`EditError`] and leave the workspace unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workspace {
    blocks: Vec<Block>,
}

/// The persisted shape of a workspace. Loading goes through the checked API.
#[derive(Deserialize)]
struct WorkspaceState {
    #[serde(default)]
    blocks: Vec<Block>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a workspace from its JSON state blob.
    pub fn from_state(state: &str) -> Result<Self, LoadError> {
        let state: WorkspaceState = json::from_str(state)?;
        Self::from_blocks(state.blocks)
    }

    /// Restores a workspace from an already-parsed state value.
    pub fn from_state_value(value: Value) -> Result<Self, LoadError> {
        let state: WorkspaceState = json::from_value(value)?;
        Self::from_blocks(state.blocks)
    }

    fn from_blocks(blocks: Vec<Block>) -> Result<Self, LoadError> {
        let mut workspace = Self::new();
        for block in blocks {
            workspace.add_block(block)?;
        }
        Ok(workspace)
    }

    /// Serializes the workspace into the state blob accepted by [`Workspace::from_state`].
    pub fn to_state(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// The top-level chain heads, in workspace order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find_map(|block| block.find(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Adds a new top-level chain. Every id in it must be new to the workspace.
    pub fn add_block(&mut self, block: Block) -> Result<(), EditError> {
        let mut seen: AHashSet<&str> = AHashSet::new();
        for id in block.ids() {
            if !seen.insert(id) || self.contains(id) {
                return Err(EditError::DuplicateBlockId(id.to_string()));
            }
        }
        self.blocks.push(block);
        Ok(())
    }

    pub fn set_field(&mut self, id: &str, name: &str, value: Value) -> Result<(), EditError> {
        let block = self
            .find_mut(id)
            .ok_or_else(|| EditError::BlockNotFound(id.to_string()))?;
        block.fields.insert(name.to_string(), value);
        Ok(())
    }

    /// Plugs `child_id` into the value socket `socket` of `parent_id`.
    ///
    /// A block already in that socket is bumped to the top level.
    pub fn connect_value(
        &mut self,
        parent_id: &str,
        socket: &str,
        child_id: &str,
    ) -> Result<(), EditError> {
        let child = self.take_for_attach(parent_id, child_id)?;
        let parent = self.parent_mut(parent_id)?;
        if let Some(bumped) = parent.inputs.insert(socket.to_string(), child) {
            self.blocks.push(bumped);
        }
        Ok(())
    }

    /// Makes the chain starting at `child_id` the body of statement socket `socket`.
    ///
    /// A chain already in that socket is re-linked after the inserted chain.
    pub fn connect_statement(
        &mut self,
        parent_id: &str,
        socket: &str,
        child_id: &str,
    ) -> Result<(), EditError> {
        let mut child = self.take_for_attach(parent_id, child_id)?;
        let parent = self.parent_mut(parent_id)?;
        if let Some(previous) = parent.statements.remove(socket) {
            child.append_to_chain(previous);
        }
        parent.statements.insert(socket.to_string(), child);
        Ok(())
    }

    /// Links the chain starting at `child_id` directly after `parent_id`.
    pub fn connect_next(&mut self, parent_id: &str, child_id: &str) -> Result<(), EditError> {
        let mut child = self.take_for_attach(parent_id, child_id)?;
        let parent = self.parent_mut(parent_id)?;
        if let Some(previous) = parent.next.take() {
            child.append_to_chain(*previous);
        }
        parent.next = Some(Box::new(child));
        Ok(())
    }

    /// Moves `id`, with everything it owns and its trailing chain, to the top level.
    pub fn detach(&mut self, id: &str) -> Result<(), EditError> {
        match self.locate(id) {
            Some(Slot::TopLevel(_)) => Ok(()),
            Some(slot) => {
                if let Some(block) = self.take_at(&slot) {
                    self.blocks.push(block);
                }
                Ok(())
            }
            None => Err(EditError::BlockNotFound(id.to_string())),
        }
    }

    /// Removes `id` and its sockets; its trailing chain moves up into the vacated slot.
    pub fn delete(&mut self, id: &str) -> Result<Block, EditError> {
        let slot = self
            .locate(id)
            .ok_or_else(|| EditError::BlockNotFound(id.to_string()))?;
        let mut block = self
            .take_at(&slot)
            .ok_or_else(|| EditError::BlockNotFound(id.to_string()))?;
        if let Some(trailing) = block.next.take() {
            self.put_at(&slot, *trailing);
        }
        Ok(block)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.iter_mut().find_map(|block| block.find_mut(id))
    }

    fn parent_mut(&mut self, parent_id: &str) -> Result<&mut Block, EditError> {
        self.find_mut(parent_id)
            .ok_or_else(|| EditError::BlockNotFound(parent_id.to_string()))
    }

    /// Validates an attach edit and detaches the child subtree from its current slot.
    fn take_for_attach(&mut self, parent_id: &str, child_id: &str) -> Result<Block, EditError> {
        if !self.contains(parent_id) {
            return Err(EditError::BlockNotFound(parent_id.to_string()));
        }
        let child = self
            .find(child_id)
            .ok_or_else(|| EditError::BlockNotFound(child_id.to_string()))?;
        if child.contains(parent_id) {
            return Err(EditError::WouldCreateCycle {
                parent_id: parent_id.to_string(),
                child_id: child_id.to_string(),
            });
        }
        let slot = self
            .locate(child_id)
            .ok_or_else(|| EditError::BlockNotFound(child_id.to_string()))?;
        self.take_at(&slot)
            .ok_or_else(|| EditError::BlockNotFound(child_id.to_string()))
    }

    fn locate(&self, id: &str) -> Option<Slot> {
        if let Some(index) = self.blocks.iter().position(|block| block.id == id) {
            return Some(Slot::TopLevel(index));
        }
        self.blocks.iter().find_map(|block| block.slot_of(id))
    }

    fn take_at(&mut self, slot: &Slot) -> Option<Block> {
        match slot {
            Slot::TopLevel(index) => {
                (*index < self.blocks.len()).then(|| self.blocks.remove(*index))
            }
            Slot::Input(parent, socket) => self.find_mut(parent)?.inputs.remove(socket),
            Slot::Statement(parent, socket) => self.find_mut(parent)?.statements.remove(socket),
            Slot::Next(parent) => self.find_mut(parent)?.next.take().map(|next| *next),
        }
    }

    fn put_at(&mut self, slot: &Slot, block: Block) {
        let parent_id = match slot {
            Slot::TopLevel(index) => {
                let index = (*index).min(self.blocks.len());
                self.blocks.insert(index, block);
                return;
            }
            Slot::Input(parent, _) | Slot::Statement(parent, _) | Slot::Next(parent) => parent,
        };
        match self.find_mut(parent_id) {
            Some(parent) => match slot {
                Slot::Input(_, socket) => {
                    parent.inputs.insert(socket.clone(), block);
                }
                Slot::Statement(_, socket) => {
                    parent.statements.insert(socket.clone(), block);
                }
                _ => parent.next = Some(Box::new(block)),
            },
            None => self.blocks.push(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        let mut ws = Workspace::new();
        ws.add_block(
            Block::new("loop", "controls_whileUntil")
                .with_statement("DO", Block::new("p1", "text_print")),
        )
        .unwrap();
        ws.add_block(Block::new("p2", "text_print")).unwrap();
        ws.add_block(Block::new("n", "math_number").with_field("NUM", 1))
            .unwrap();
        ws
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut ws = workspace();
        let err = ws.add_block(Block::new("p1", "text_print")).unwrap_err();
        assert_eq!(err, EditError::DuplicateBlockId("p1".into()));

        let nested = Block::new("x", "text_print").with_next(Block::new("x", "text_print"));
        assert!(ws.add_block(nested).is_err());
    }

    #[test]
    fn test_connect_statement_relinks_previous_body() {
        let mut ws = workspace();
        ws.connect_statement("loop", "DO", "p2").unwrap();
        let body = ws.find("loop").unwrap().statement("DO").unwrap();
        let order: Vec<_> = body.chain().map(|b| b.id.as_str()).collect();
        assert_eq!(order, ["p2", "p1"]);
        assert_eq!(ws.blocks().len(), 2);
    }

    #[test]
    fn test_attaching_under_own_descendant_is_rejected() {
        let mut ws = workspace();
        let before = ws.clone();
        let err = ws.connect_next("p1", "loop").unwrap_err();
        assert!(matches!(err, EditError::WouldCreateCycle { .. }));
        let err = ws.connect_value("loop", "COND", "loop").unwrap_err();
        assert!(matches!(err, EditError::WouldCreateCycle { .. }));
        assert_eq!(ws, before);
    }

    #[test]
    fn test_value_socket_bumps_previous_occupant() {
        let mut ws = workspace();
        ws.add_block(Block::new("m", "math_number")).unwrap();
        ws.connect_value("loop", "BOOL", "n").unwrap();
        ws.connect_value("loop", "BOOL", "m").unwrap();
        assert_eq!(ws.find("loop").unwrap().input("BOOL").unwrap().id, "m");
        assert!(ws.blocks().iter().any(|b| b.id == "n"));
    }

    #[test]
    fn test_delete_heals_chain() {
        let mut ws = workspace();
        ws.connect_next("p1", "p2").unwrap();
        let removed = ws.delete("p1").unwrap();
        assert_eq!(removed.id, "p1");
        assert!(removed.next.is_none());
        let body = ws.find("loop").unwrap().statement("DO").unwrap();
        assert_eq!(body.id, "p2");
    }

    #[test]
    fn test_detach_moves_to_top_level() {
        let mut ws = workspace();
        ws.detach("p1").unwrap();
        assert!(ws.find("loop").unwrap().statement("DO").is_none());
        assert_eq!(ws.blocks().last().unwrap().id, "p1");
        assert!(matches!(ws.detach("ghost"), Err(EditError::BlockNotFound(_))));
    }
}
