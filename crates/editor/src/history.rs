//! Undo/redo history.

use crate::command::Command;
use crate::error::EditError;
use topotrace_graph::GraphStore;
use tracing::debug;

/// Single-timeline undo/redo over a [`GraphStore`].
///
/// A command reaches the undo stack only after it has applied successfully.
/// Executing a new command discards the redo stack.
#[derive(Debug, Default)]
pub struct CommandLog {
    undo: Vec<Command>,
    redo: Vec<Command>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a new user action and record it.
    pub fn execute(
        &mut self,
        store: &mut GraphStore,
        mut command: Command,
    ) -> Result<(), EditError> {
        command.execute(store)?;
        debug!(command = command.label(), "Executed");
        self.push_applied(command);
        Ok(())
    }

    /// Record a command that has already been applied to the store.
    pub(crate) fn push_applied(&mut self, command: Command) {
        self.undo.push(command);
        if !self.redo.is_empty() {
            debug!(discarded = self.redo.len(), "Cleared redo history");
            self.redo.clear();
        }
    }

    /// Reverse the most recent command.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. A command whose
    /// reversal fails stays on the undo stack.
    pub fn undo(&mut self, store: &mut GraphStore) -> Result<bool, EditError> {
        let Some(mut command) = self.undo.pop() else {
            return Ok(false);
        };
        if let Err(e) = command.undo(store) {
            self.undo.push(command);
            return Err(e);
        }
        debug!(command = command.label(), "Undone");
        self.redo.push(command);
        Ok(true)
    }

    /// Re-apply the most recently undone command.
    ///
    /// Returns `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self, store: &mut GraphStore) -> Result<bool, EditError> {
        let Some(mut command) = self.redo.pop() else {
            return Ok(false);
        };
        if let Err(e) = command.execute(store) {
            self.redo.push(command);
            return Err(e);
        }
        debug!(command = command.label(), "Redone");
        self.undo.push(command);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// The command `undo` would reverse next.
    pub fn last_applied(&self) -> Option<&Command> {
        self.undo.last()
    }

    /// Label of the command `undo` would reverse next.
    pub fn peek_undo(&self) -> Option<&'static str> {
        self.undo.last().map(Command::label)
    }

    /// Label of the command `redo` would re-apply next.
    pub fn peek_redo(&self) -> Option<&'static str> {
        self.redo.last().map(Command::label)
    }

    /// Forget all history. The store is untouched.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use topotrace_graph::GraphError;
    use topotrace_types::NodeId;

    fn linked_pair(store: &mut GraphStore, log: &mut CommandLog) -> (NodeId, NodeId) {
        let mut add_a = Command::add_node(0, 0);
        let mut add_b = Command::add_node(50, 0);
        add_a.execute(store).unwrap();
        add_b.execute(store).unwrap();
        let a = add_a.created_node().unwrap();
        let b = add_b.created_node().unwrap();
        log.push_applied(add_a);
        log.push_applied(add_b);
        log.execute(store, Command::add_link(a, b)).unwrap();
        (a, b)
    }

    #[test]
    fn test_empty_log() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        assert_eq!(log.undo(&mut store), Ok(false));
        assert_eq!(log.redo(&mut store), Ok(false));
        assert!(!log.can_undo());
        assert!(!log.can_redo());
    }

    #[test]
    fn test_composite_delete_undo_redo() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        let (a, b) = linked_pair(&mut store, &mut log);

        let delete = Command::remove_nodes(&store, &[a, b]).unwrap();
        log.execute(&mut store, delete).unwrap();
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.link_count(), 0);

        assert_eq!(log.undo(&mut store), Ok(true));
        assert_eq!(store.node(a).unwrap().position(), (0, 0));
        assert_eq!(store.node(b).unwrap().position(), (50, 0));
        assert!(store.are_adjacent(a, b));

        assert_eq!(log.redo(&mut store), Ok(true));
        assert_eq!(store.node_count(), 0);
        assert_eq!(store.link_count(), 0);

        assert_eq!(log.undo(&mut store), Ok(true));
        assert!(store.are_adjacent(a, b));
        assert!(log.can_redo());

        log.execute(&mut store, Command::add_node(9, 9)).unwrap();
        assert!(!log.can_redo());
        assert_eq!(log.redo(&mut store), Ok(false));
        assert_eq!(store.node_count(), 3);
    }

    #[test]
    fn test_failed_execute_not_recorded() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        let a = store.add_node(0, 0).id;

        let err = log
            .execute(&mut store, Command::add_link(a, NodeId(40)))
            .unwrap_err();
        assert_eq!(err, EditError::Graph(GraphError::NodeNotFound(NodeId(40))));
        assert_eq!(log.undo_len(), 0);
        assert_eq!(store.link_count(), 0);
    }

    #[test]
    fn test_failed_execute_keeps_redo() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        log.execute(&mut store, Command::add_node(1, 1)).unwrap();
        log.undo(&mut store).unwrap();

        assert!(log
            .execute(&mut store, Command::move_node(NodeId(99), (0, 0), (1, 1)))
            .is_err());
        assert_eq!(log.redo_len(), 1);
    }

    #[test]
    fn test_undo_redo_sequence_restores_ids() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        for i in 0..3 {
            log.execute(&mut store, Command::add_node(i, i)).unwrap();
        }
        let ids: Vec<NodeId> = store.nodes().map(|n| n.id).collect();

        while log.undo(&mut store).unwrap() {}
        assert_eq!(store.node_count(), 0);
        assert_eq!(log.redo_len(), 3);

        while log.redo(&mut store).unwrap() {}
        let again: Vec<NodeId> = store.nodes().map(|n| n.id).collect();
        assert_eq!(ids, again);
        assert_eq!(log.peek_undo(), Some("add node"));
        assert_eq!(
            log.last_applied().and_then(Command::created_node),
            ids.last().copied()
        );
        assert_eq!(log.peek_redo(), None);
    }

    #[test]
    fn test_clear_leaves_store() {
        let mut store = GraphStore::new();
        let mut log = CommandLog::new();
        log.execute(&mut store, Command::add_node(0, 0)).unwrap();
        log.clear();
        assert!(!log.can_undo());
        assert_eq!(store.node_count(), 1);
    }
}
