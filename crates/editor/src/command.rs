//! Reversible edit commands.
//!
//! Each variant carries everything it needs to apply itself and to reverse
//! itself exactly. Commands are built only from ids that are live when the
//! command is constructed.
//!
//! # Id lifecycle
//!
//! | command      | execute                         | undo                              |
//! |--------------|---------------------------------|-----------------------------------|
//! | `AddNode`    | allocate (or reclaim) an id     | remove node + its links, release  |
//! | `RemoveNode` | record links, remove, release   | reclaim id (or reassign), restore |
//! | `MoveNode`   | -                               | -                                 |
//! | `AddLink`    | -                               | -                                 |
//!
//! Reclaiming goes through `reserve_id`. When the original id has been taken
//! by an unrelated node in the meantime, a fresh id is drawn instead and a
//! warning names both ids.

use crate::error::EditError;
use topotrace_graph::{GraphError, GraphStore};
use topotrace_types::{Link, LinkId, Node, NodeId};
use tracing::{debug, warn};

/// Create a node at a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddNode {
    x: i32,
    y: i32,
    /// Id from the most recent execution.
    created: Option<NodeId>,
}

/// Delete a node together with the links touching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveNode {
    /// Snapshot of the node; its id tracks any reassignment on undo.
    node: Node,
    /// Links cascaded by the most recent execution.
    removed_links: Vec<Link>,
}

/// Move a node between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveNode {
    id: NodeId,
    from: (i32, i32),
    to: (i32, i32),
}

/// Join two nodes with a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLink {
    a: NodeId,
    b: NodeId,
    /// Link from the most recent execution.
    created: Option<LinkId>,
}

/// A reversible edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddNode(AddNode),
    RemoveNode(RemoveNode),
    MoveNode(MoveNode),
    AddLink(AddLink),
    /// Ordered sub-edits applied in order and reversed last-first.
    Composite(Vec<Command>),
}

impl Command {
    /// Add a node at `(x, y)`.
    pub fn add_node(x: i32, y: i32) -> Self {
        Command::AddNode(AddNode {
            x,
            y,
            created: None,
        })
    }

    /// Remove a live node.
    pub fn remove_node(store: &GraphStore, id: NodeId) -> Result<Self, EditError> {
        let node = *store.node(id).ok_or(GraphError::NodeNotFound(id))?;
        Ok(Command::RemoveNode(RemoveNode {
            node,
            removed_links: Vec::new(),
        }))
    }

    /// Move a node from `from` to `to`.
    pub fn move_node(id: NodeId, from: (i32, i32), to: (i32, i32)) -> Self {
        Command::MoveNode(MoveNode { id, from, to })
    }

    /// Link two nodes.
    pub fn add_link(a: NodeId, b: NodeId) -> Self {
        Command::AddLink(AddLink {
            a,
            b,
            created: None,
        })
    }

    /// Group edits into one undoable unit.
    pub fn composite(parts: Vec<Command>) -> Self {
        Command::Composite(parts)
    }

    /// Remove every node in `ids` as one unit.
    pub fn remove_nodes(store: &GraphStore, ids: &[NodeId]) -> Result<Self, EditError> {
        let parts = ids
            .iter()
            .map(|&id| Command::remove_node(store, id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Command::Composite(parts))
    }

    /// Short label for menus and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Command::AddNode(_) => "add node",
            Command::RemoveNode(_) => "remove node",
            Command::MoveNode(_) => "move node",
            Command::AddLink(_) => "add link",
            Command::Composite(_) => "edit group",
        }
    }

    /// Id created by the last execution of an `AddNode`.
    pub fn created_node(&self) -> Option<NodeId> {
        match self {
            Command::AddNode(cmd) => cmd.created,
            _ => None,
        }
    }

    /// Link created by the last execution of an `AddLink`.
    pub fn created_link(&self) -> Option<LinkId> {
        match self {
            Command::AddLink(cmd) => cmd.created,
            _ => None,
        }
    }

    /// Current id of the node a `RemoveNode` operates on.
    pub fn removed_node(&self) -> Option<NodeId> {
        match self {
            Command::RemoveNode(cmd) => Some(cmd.node.id),
            _ => None,
        }
    }

    /// Apply the edit.
    ///
    /// On error the store is left as it was before the call.
    pub fn execute(&mut self, store: &mut GraphStore) -> Result<(), EditError> {
        match self {
            Command::AddNode(cmd) => {
                let id = match cmd.created {
                    None => store.add_node(cmd.x, cmd.y).id,
                    Some(previous) => reinstate(store, cmd.x, cmd.y, previous)?,
                };
                cmd.created = Some(id);
                Ok(())
            }
            Command::RemoveNode(cmd) => {
                let (node, links) = store.remove_node(cmd.node.id)?;
                store.release_id(node.id);
                cmd.node = node;
                cmd.removed_links = links;
                Ok(())
            }
            Command::MoveNode(cmd) => {
                store.move_node(cmd.id, cmd.to.0, cmd.to.1)?;
                Ok(())
            }
            Command::AddLink(cmd) => {
                let link = store.add_link(cmd.a, cmd.b)?;
                cmd.created = Some(link.id);
                Ok(())
            }
            Command::Composite(parts) => {
                for i in 0..parts.len() {
                    if let Err(e) = parts[i].execute(store) {
                        roll_back(&mut parts[..i], store);
                        return Err(e);
                    }
                }
                Ok(())
            }
        }
    }

    /// Reverse the edit.
    ///
    /// On error the store is left as it was before the call.
    pub fn undo(&mut self, store: &mut GraphStore) -> Result<(), EditError> {
        match self {
            Command::AddNode(cmd) => {
                // Not executed yet: nothing to reverse.
                let Some(id) = cmd.created else {
                    return Ok(());
                };
                let (node, dropped) = store.remove_node(id)?;
                store.release_id(node.id);
                if !dropped.is_empty() {
                    debug!(node = id.0, links = dropped.len(), "Dropped links with undone node");
                }
                Ok(())
            }
            Command::RemoveNode(cmd) => {
                let original = cmd.node.id;
                let id = reinstate(store, cmd.node.x, cmd.node.y, original)?;

                let links: Vec<Link> = cmd
                    .removed_links
                    .iter()
                    .map(|l| l.with_endpoint_renamed(original, id))
                    .collect();
                for (i, link) in links.iter().enumerate() {
                    if let Err(e) = store.restore_link(*link) {
                        for restored in &links[..i] {
                            if let Err(undo_err) = store.remove_link(restored.id) {
                                warn!(
                                    link = restored.id.0,
                                    error = %undo_err,
                                    "Rollback step failed"
                                );
                            }
                        }
                        if let Err(undo_err) = store.remove_node(id) {
                            warn!(node = id.0, error = %undo_err, "Rollback step failed");
                        }
                        store.release_id(id);
                        return Err(e.into());
                    }
                }

                cmd.node.id = id;
                cmd.removed_links = links;
                Ok(())
            }
            Command::MoveNode(cmd) => {
                store.move_node(cmd.id, cmd.from.0, cmd.from.1)?;
                Ok(())
            }
            Command::AddLink(cmd) => {
                let Some(link) = cmd.created else {
                    return Ok(());
                };
                store.remove_link(link)?;
                Ok(())
            }
            Command::Composite(parts) => {
                for i in (0..parts.len()).rev() {
                    if let Err(e) = parts[i].undo(store) {
                        roll_forward(&mut parts[i + 1..], store);
                        return Err(e);
                    }
                }
                Ok(())
            }
        }
    }
}

/// Put a node back, preferring the id it had before.
fn reinstate(store: &mut GraphStore, x: i32, y: i32, wanted: NodeId) -> Result<NodeId, EditError> {
    let id = if store.reserve_id(wanted) {
        wanted
    } else {
        let fresh = store.next_id();
        warn!(
            original_id = wanted.0,
            assigned_id = fresh.0,
            "Original node id is in use, reinstating node under a new id"
        );
        fresh
    };
    if let Err(e) = store.add_node_with_id(x, y, id) {
        store.release_id(id);
        return Err(e.into());
    }
    Ok(id)
}

/// Reverse already-applied parts, last first.
pub(crate) fn roll_back(parts: &mut [Command], store: &mut GraphStore) {
    for part in parts.iter_mut().rev() {
        if let Err(e) = part.undo(store) {
            warn!(command = part.label(), error = %e, "Rollback step failed");
        }
    }
}

/// Re-apply already-reversed parts, first to last.
fn roll_forward(parts: &mut [Command], store: &mut GraphStore) {
    for part in parts.iter_mut() {
        if let Err(e) = part.execute(store) {
            warn!(command = part.label(), error = %e, "Roll-forward step failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_add_node_execute_and_undo() {
        let mut store = GraphStore::new();
        let mut cmd = Command::add_node(3, 4);
        cmd.execute(&mut store).unwrap();
        let id = cmd.created_node().unwrap();
        assert_eq!(store.node(id).unwrap().position(), (3, 4));

        cmd.undo(&mut store).unwrap();
        assert!(!store.contains_node(id));
        assert!(store.allocator().is_free(id));
    }

    #[test]
    fn test_add_node_redo_reclaims_id() {
        let mut store = GraphStore::new();
        let mut cmd = Command::add_node(0, 0);
        cmd.execute(&mut store).unwrap();
        let id = cmd.created_node().unwrap();
        cmd.undo(&mut store).unwrap();
        cmd.execute(&mut store).unwrap();
        assert_eq!(cmd.created_node(), Some(id));
        assert!(!store.allocator().is_free(id));
    }

    #[test]
    fn test_add_node_undo_drops_links() {
        let mut store = GraphStore::new();
        let other = store.add_node(10, 10).id;
        let mut cmd = Command::add_node(0, 0);
        cmd.execute(&mut store).unwrap();
        let id = cmd.created_node().unwrap();
        store.add_link(id, other).unwrap();

        cmd.undo(&mut store).unwrap();
        assert_eq!(store.link_count(), 0);
        assert!(store.neighbors(other).is_empty());
    }

    #[test]
    fn test_remove_node_round_trip() {
        let mut store = GraphStore::new();
        let a = store.add_node(0, 0).id;
        let b = store.add_node(5, 5).id;
        let link = store.add_link(a, b).unwrap();

        let mut cmd = Command::remove_node(&store, a).unwrap();
        cmd.execute(&mut store).unwrap();
        assert!(!store.contains_node(a));
        assert_eq!(store.link_count(), 0);
        assert!(store.allocator().is_free(a));

        cmd.undo(&mut store).unwrap();
        assert_eq!(store.node(a).unwrap().position(), (0, 0));
        assert_eq!(store.link(link.id), Some(&link));
        assert!(!store.allocator().is_free(a));
    }

    #[traced_test]
    #[test]
    fn test_remove_node_undo_reassigns_taken_id() {
        let mut store = GraphStore::new();
        let a = store.add_node(0, 0).id;
        let b = store.add_node(5, 5).id;
        store.add_link(a, b).unwrap();

        let mut cmd = Command::remove_node(&store, a).unwrap();
        cmd.execute(&mut store).unwrap();

        // An unrelated node takes the released id.
        let squatter = store.add_node(100, 100).id;
        assert_eq!(squatter, a);

        cmd.undo(&mut store).unwrap();
        let restored = cmd.removed_node().unwrap();
        assert_ne!(restored, a);
        assert_eq!(store.node(restored).unwrap().position(), (0, 0));
        assert_eq!(store.node(squatter).unwrap().position(), (100, 100));
        // The cascaded link follows the new identity.
        assert!(store.are_adjacent(restored, b));
        assert!(!store.are_adjacent(squatter, b));
        assert!(logs_contain("reinstating node under a new id"));
    }

    #[test]
    #[traced_test]
    fn test_remove_node_undo_rolls_back_on_missing_neighbor() {
        let mut store = GraphStore::new();
        let a = store.add_node(0, 0).id;
        let b = store.add_node(10, 0).id;
        let c = store.add_node(20, 0).id;
        store.add_link(a, b).unwrap();
        store.add_link(a, c).unwrap();

        let mut cmd = Command::remove_node(&store, a).unwrap();
        cmd.execute(&mut store).unwrap();
        store.remove_node(c).unwrap();

        assert_eq!(
            cmd.undo(&mut store),
            Err(EditError::Graph(GraphError::NodeNotFound(c)))
        );
        assert!(!store.contains_node(a));
        assert!(store.contains_node(b));
        assert_eq!(store.link_count(), 0);
        assert!(store.allocator().is_free(a));
        assert!(!logs_contain("Rollback step failed"));
    }

    #[test]
    fn test_remove_unknown_node_rejected_at_construction() {
        let store = GraphStore::new();
        assert_eq!(
            Command::remove_node(&store, NodeId(3)),
            Err(EditError::Graph(GraphError::NodeNotFound(NodeId(3))))
        );
    }

    #[test]
    fn test_move_node() {
        let mut store = GraphStore::new();
        let a = store.add_node(1, 1).id;
        let mut cmd = Command::move_node(a, (1, 1), (9, 9));
        cmd.execute(&mut store).unwrap();
        assert_eq!(store.node(a).unwrap().position(), (9, 9));
        cmd.undo(&mut store).unwrap();
        assert_eq!(store.node(a).unwrap().position(), (1, 1));
        assert_eq!(store.allocator().counter(), 2);
    }

    #[test]
    fn test_add_link_undo_removes_exact_link() {
        let mut store = GraphStore::new();
        let a = store.add_node(0, 0).id;
        let b = store.add_node(1, 1).id;
        let existing = store.add_link(a, b).unwrap();

        let mut cmd = Command::add_link(a, b);
        cmd.execute(&mut store).unwrap();
        let created = cmd.created_link().unwrap();
        assert_ne!(created, existing.id);

        cmd.undo(&mut store).unwrap();
        assert!(store.link(created).is_none());
        assert!(store.link(existing.id).is_some());
    }

    #[test]
    fn test_composite_undo_is_lifo() {
        let mut store = GraphStore::new();
        let a = store.add_node(0, 0).id;
        let b = store.add_node(5, 0).id;
        let c = store.add_node(10, 0).id;
        store.add_link(a, b).unwrap();
        store.add_link(b, c).unwrap();
        let before_links: Vec<Link> = store.links().copied().collect();

        let mut cmd = Command::remove_nodes(&store, &[a, b]).unwrap();
        cmd.execute(&mut store).unwrap();
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.link_count(), 0);

        cmd.undo(&mut store).unwrap();
        assert_eq!(store.node_count(), 3);
        let after_links: Vec<Link> = store.links().copied().collect();
        assert_eq!(before_links, after_links);
    }

    #[test]
    fn test_composite_failure_rolls_back() {
        let mut store = GraphStore::new();
        let a = store.add_node(0, 0).id;
        let mut cmd = Command::composite(vec![
            Command::add_node(1, 1),
            Command::move_node(a, (0, 0), (4, 4)),
            Command::add_link(a, NodeId(77)),
        ]);

        let err = cmd.execute(&mut store).unwrap_err();
        assert_eq!(err, EditError::Graph(GraphError::NodeNotFound(NodeId(77))));
        assert_eq!(store.node_count(), 1);
        assert_eq!(store.node(a).unwrap().position(), (0, 0));
        assert_eq!(store.link_count(), 0);
    }
}
