//! Canonical node and link collections.
//!
//! The store owns the [`IdAllocator`] and an incidence index from node id to
//! the links touching it. Nodes and links only ever refer to each other by
//! id. Removing a node cascades to its links and hands them back to the
//! caller so the removal can be reversed exactly; no other structural cleanup
//! is performed.

use crate::allocator::IdAllocator;
use crate::error::GraphError;
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use topotrace_types::{Link, LinkId, Node, NodeId};
use tracing::debug;

/// Node/link store with central adjacency.
#[derive(Debug, Clone)]
pub struct GraphStore {
    allocator: IdAllocator,
    /// Live nodes in canvas draw order.
    nodes: IndexMap<NodeId, Node>,
    /// Links by id. Link ids grow monotonically, so this is creation order.
    links: BTreeMap<LinkId, Link>,
    /// node id -> ids of links with that node as an endpoint.
    incidence: HashMap<NodeId, BTreeSet<LinkId>>,
    /// Next link id. Link ids are never reused.
    next_link_id: u64,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            allocator: IdAllocator::new(),
            nodes: IndexMap::new(),
            links: BTreeMap::new(),
            incidence: HashMap::new(),
            next_link_id: 1,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Id lifecycle
    // ═══════════════════════════════════════════════════════════════════════════

    /// Read-only view of the allocator.
    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Draw a fresh node id.
    pub fn next_id(&mut self) -> NodeId {
        self.allocator.next_id()
    }

    /// Return a node id to the free pool.
    pub fn release_id(&mut self, id: NodeId) {
        self.allocator.release_id(id);
    }

    /// Claim a specific node id. See [`IdAllocator::reserve_id`].
    pub fn reserve_id(&mut self, id: NodeId) -> bool {
        self.allocator.reserve_id(id)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Nodes
    // ═══════════════════════════════════════════════════════════════════════════

    /// Insert a node under a freshly allocated id.
    pub fn add_node(&mut self, x: i32, y: i32) -> Node {
        let id = self.allocator.next_id();
        let node = Node::new(id, x, y);
        self.nodes.insert(id, node);
        debug!(node = id.0, x, y, "Added node");
        node
    }

    /// Insert a node under an id the caller has already claimed.
    ///
    /// Does not touch the allocator.
    pub fn add_node_with_id(&mut self, x: i32, y: i32, id: NodeId) -> Result<Node, GraphError> {
        if id.0 == 0 {
            return Err(GraphError::InvalidNodeId);
        }
        if self.nodes.contains_key(&id) {
            return Err(GraphError::NodeAlreadyLive(id));
        }
        let node = Node::new(id, x, y);
        self.nodes.insert(id, node);
        debug!(node = id.0, x, y, "Reinstated node");
        Ok(node)
    }

    /// Remove a node and every link touching it.
    ///
    /// Returns the removed node and the cascaded links in creation order. The
    /// node's id is not released; that is the caller's decision.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(Node, Vec<Link>), GraphError> {
        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::NodeNotFound(id))?;

        let link_ids: Vec<LinkId> = self
            .incidence
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        let mut removed = Vec::with_capacity(link_ids.len());
        for link_id in link_ids {
            if let Some(link) = self.detach_link(link_id) {
                removed.push(link);
            }
        }

        debug!(node = id.0, cascaded_links = removed.len(), "Removed node");
        Ok((node, removed))
    }

    /// Move a node, returning its previous position.
    pub fn move_node(&mut self, id: NodeId, x: i32, y: i32) -> Result<(i32, i32), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        let previous = node.position();
        node.x = x;
        node.y = y;
        Ok(previous)
    }

    /// Look up a live node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Whether a node id is live.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Live nodes in draw order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Links
    // ═══════════════════════════════════════════════════════════════════════════

    /// Create a link between two live nodes.
    pub fn add_link(&mut self, a: NodeId, b: NodeId) -> Result<Link, GraphError> {
        for id in [a, b] {
            if !self.nodes.contains_key(&id) {
                return Err(GraphError::NodeNotFound(id));
            }
        }
        let link = Link::new(LinkId(self.next_link_id), a, b);
        self.next_link_id += 1;
        self.attach_link(link);
        debug!(link = link.id.0, a = a.0, b = b.0, "Added link");
        Ok(link)
    }

    /// Put back a link captured by an earlier removal, keeping its id.
    ///
    /// Both endpoints must be live.
    pub fn restore_link(&mut self, link: Link) -> Result<(), GraphError> {
        if self.links.contains_key(&link.id) {
            return Err(GraphError::LinkAlreadyPresent(link.id));
        }
        for endpoint in [link.node1, link.node2] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(GraphError::NodeNotFound(endpoint));
            }
        }
        if link.id.0 >= self.next_link_id {
            self.next_link_id = link.id.0 + 1;
        }
        self.attach_link(link);
        Ok(())
    }

    /// Remove one link.
    pub fn remove_link(&mut self, id: LinkId) -> Result<Link, GraphError> {
        self.detach_link(id).ok_or(GraphError::LinkNotFound(id))
    }

    /// Look up a link.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// All links in creation order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links touching `id`, in creation order.
    pub fn links_of(&self, id: NodeId) -> Vec<&Link> {
        self.incidence
            .get(&id)
            .map(|set| set.iter().filter_map(|l| self.links.get(l)).collect())
            .unwrap_or_default()
    }

    /// Ids adjacent to `id` through at least one link.
    pub fn neighbors(&self, id: NodeId) -> BTreeSet<NodeId> {
        self.links_of(id)
            .into_iter()
            .filter_map(|link| link.other(id))
            .collect()
    }

    /// Whether at least one link joins `a` and `b`.
    pub fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.neighbors(a).contains(&b)
    }

    fn attach_link(&mut self, link: Link) {
        for endpoint in [link.node1, link.node2] {
            self.incidence.entry(endpoint).or_default().insert(link.id);
        }
        self.links.insert(link.id, link);
    }

    fn detach_link(&mut self, id: LinkId) -> Option<Link> {
        let link = self.links.remove(&id)?;
        for endpoint in [link.node1, link.node2] {
            if let Some(set) = self.incidence.get_mut(&endpoint) {
                set.remove(&id);
                if set.is_empty() {
                    self.incidence.remove(&endpoint);
                }
            }
        }
        Some(link)
    }
}
