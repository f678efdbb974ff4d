//! Copy, cut and paste of node selections.
//!
//! The clipboard stores positions and the links internal to the selection,
//! never ids. Pasting creates fresh nodes offset from the originals and
//! records the whole paste as a single undoable edit.

use crate::command::{roll_back, Command};
use crate::error::EditError;
use crate::history::CommandLog;
use std::collections::HashMap;
use topotrace_graph::GraphStore;
use topotrace_types::NodeId;
use tracing::debug;

/// Default paste offset in canvas units (one grid cell).
pub const PASTE_OFFSET: i32 = 20;

/// Snapshot of a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    /// Node positions in selection order.
    nodes: Vec<(i32, i32)>,
    /// Links between copied nodes, as indices into `nodes`.
    links: Vec<(usize, usize)>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes held.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links held.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Replace the contents with the live nodes in `selection`.
    ///
    /// Unknown and repeated ids are ignored. Only links with both endpoints
    /// in the selection are kept. Returns the number of nodes copied.
    pub fn copy(&mut self, store: &GraphStore, selection: &[NodeId]) -> usize {
        self.nodes.clear();
        self.links.clear();

        let mut index = HashMap::new();
        for &id in selection {
            if index.contains_key(&id) {
                continue;
            }
            if let Some(node) = store.node(id) {
                index.insert(id, self.nodes.len());
                self.nodes.push(node.position());
            }
        }
        for link in store.links() {
            if let (Some(&a), Some(&b)) = (index.get(&link.node1), index.get(&link.node2)) {
                self.links.push((a, b));
            }
        }

        debug!(nodes = self.nodes.len(), links = self.links.len(), "Copied selection");
        self.nodes.len()
    }

    /// Paste with the default offset.
    pub fn paste(
        &self,
        log: &mut CommandLog,
        store: &mut GraphStore,
    ) -> Result<Vec<NodeId>, EditError> {
        self.paste_at_offset(log, store, PASTE_OFFSET)
    }

    /// Create copies of the held nodes shifted by `offset` on both axes.
    ///
    /// Returns the new ids in copy order. Nothing is recorded when the
    /// clipboard is empty.
    pub fn paste_at_offset(
        &self,
        log: &mut CommandLog,
        store: &mut GraphStore,
        offset: i32,
    ) -> Result<Vec<NodeId>, EditError> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut parts = Vec::with_capacity(self.nodes.len() + self.links.len());
        let mut ids = Vec::with_capacity(self.nodes.len());

        for &(x, y) in &self.nodes {
            let mut cmd = Command::add_node(x.saturating_add(offset), y.saturating_add(offset));
            if let Err(e) = cmd.execute(store) {
                roll_back(&mut parts, store);
                return Err(e);
            }
            if let Some(id) = cmd.created_node() {
                ids.push(id);
            }
            parts.push(cmd);
        }
        for &(a, b) in &self.links {
            let mut cmd = Command::add_link(ids[a], ids[b]);
            if let Err(e) = cmd.execute(store) {
                roll_back(&mut parts, store);
                return Err(e);
            }
            parts.push(cmd);
        }

        debug!(nodes = ids.len(), links = self.links.len(), "Pasted selection");
        log.push_applied(Command::composite(parts));
        Ok(ids)
    }

    /// Copy the selection, then delete it as one undoable edit.
    pub fn cut(
        &mut self,
        log: &mut CommandLog,
        store: &mut GraphStore,
        selection: &[NodeId],
    ) -> Result<usize, EditError> {
        let copied = self.copy(store, selection);
        if copied == 0 {
            return Ok(0);
        }
        let mut live: Vec<NodeId> = Vec::with_capacity(copied);
        for &id in selection {
            if store.contains_node(id) && !live.contains(&id) {
                live.push(id);
            }
        }
        let delete = Command::remove_nodes(store, &live)?;
        log.execute(store, delete)?;
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(store: &mut GraphStore) -> [NodeId; 3] {
        let a = store.add_node(0, 0).id;
        let b = store.add_node(40, 0).id;
        let c = store.add_node(20, 40).id;
        store.add_link(a, b).unwrap();
        store.add_link(b, c).unwrap();
        store.add_link(c, a).unwrap();
        [a, b, c]
    }

    #[test]
    fn test_copy_keeps_internal_links_only() {
        let mut store = GraphStore::new();
        let [a, b, _] = triangle(&mut store);
        let mut clip = Clipboard::new();
        assert_eq!(clip.copy(&store, &[a, b, a, NodeId(99)]), 2);
        assert_eq!(clip.link_count(), 1);
    }

    #[test]
    fn test_paste_offsets_and_links() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        let [a, b, _] = triangle(&mut store);
        let mut clip = Clipboard::new();
        clip.copy(&store, &[a, b]);

        let pasted = clip.paste(&mut log, &mut store).unwrap();
        assert_eq!(pasted.len(), 2);
        assert_eq!(store.node(pasted[0]).unwrap().position(), (20, 20));
        assert_eq!(store.node(pasted[1]).unwrap().position(), (60, 20));
        assert!(store.are_adjacent(pasted[0], pasted[1]));
        assert_eq!(log.undo_len(), 1);

        log.undo(&mut store).unwrap();
        assert_eq!(store.node_count(), 3);
        assert_eq!(store.link_count(), 3);
    }

    #[test]
    fn test_paste_saturates_at_coordinate_limit() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        let edge = store.add_node(i32::MAX - 5, i32::MIN).id;

        let mut clipboard = Clipboard::new();
        clipboard.copy(&store, &[edge]);
        let pasted = clipboard.paste(&mut log, &mut store).unwrap();
        assert_eq!(
            store.node(pasted[0]).unwrap().position(),
            (i32::MAX, i32::MIN + 20)
        );

        let pasted = clipboard.paste_at_offset(&mut log, &mut store, -40).unwrap();
        assert_eq!(
            store.node(pasted[0]).unwrap().position(),
            (i32::MAX - 45, i32::MIN)
        );
    }

    #[test]
    fn test_paste_empty_records_nothing() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        let clip = Clipboard::new();
        assert!(clip.paste(&mut log, &mut store).unwrap().is_empty());
        assert!(!log.can_undo());
    }

    #[test]
    fn test_cut_then_undo() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        let [a, b, c] = triangle(&mut store);
        let mut clip = Clipboard::new();

        assert_eq!(clip.cut(&mut log, &mut store, &[a, c]).unwrap(), 2);
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.link_count(), 0);
        assert_eq!(clip.link_count(), 1);

        log.undo(&mut store).unwrap();
        assert_eq!(store.node_count(), 3);
        assert!(store.are_adjacent(a, b));
        assert!(store.are_adjacent(b, c));
        assert!(store.are_adjacent(c, a));
    }

    #[test]
    fn test_paste_twice_creates_distinct_nodes() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        let a = store.add_node(0, 0).id;
        let mut clip = Clipboard::new();
        clip.copy(&store, &[a]);

        let first = clip.paste(&mut log, &mut store).unwrap();
        let second = clip.paste_at_offset(&mut log, &mut store, 40).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.node(second[0]).unwrap().position(), (40, 40));
        assert_eq!(store.node_count(), 3);
    }
}
