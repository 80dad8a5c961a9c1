//! Arena of record nodes with parent links.
//!
//! Every node knows its parent by index. A node's reference is its parent's
//! reference plus `/<collection>/id/<local id>`; roots carry a fixed
//! reference. References are computed on first access and cached until the
//! node or one of its ancestors is renamed.

use once_cell::unsync::OnceCell;

use crate::protocol::error::{FbaError, Result};

/// Index of a node inside an [`ObjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
enum Segment {
    Root(String),
    Child { collection: String, local_id: String },
}

#[derive(Debug)]
struct GraphNode {
    parent: Option<NodeId>,
    segment: Segment,
    children: Vec<NodeId>,
    reference: OnceCell<String>,
}

#[derive(Debug, Default)]
pub struct ObjectGraph {
    nodes: Vec<GraphNode>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_root(&mut self, reference: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            parent: None,
            segment: Segment::Root(reference.into()),
            children: Vec::new(),
            reference: OnceCell::new(),
        });
        id
    }

    pub fn add_child(&mut self, parent: NodeId, collection: &str, local_id: &str) -> Result<NodeId> {
        self.node(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            parent: Some(parent),
            segment: Segment::Child {
                collection: collection.to_string(),
                local_id: local_id.to_string(),
            },
            children: Vec::new(),
            reference: OnceCell::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    fn node(&self, id: NodeId) -> Result<&GraphNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| FbaError::Record(format!("unknown graph node {}", id.0)))
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    pub fn root_of(&self, mut id: NodeId) -> Result<NodeId> {
        while let Some(parent) = self.node(id)?.parent {
            id = parent;
        }
        Ok(id)
    }

    /// Returns the node's hierarchical reference, computing and caching it on
    /// first access.
    pub fn reference(&self, id: NodeId) -> Result<&str> {
        let node = self.node(id)?;
        let reference = node.reference.get_or_try_init(|| -> Result<String> {
            match &node.segment {
                Segment::Root(reference) => Ok(reference.clone()),
                Segment::Child { collection, local_id } => {
                    // add_child validates parents, so the walk ends at a root.
                    let parent = node.parent.ok_or_else(|| {
                        FbaError::Record(format!("graph node {} has no parent", id.0))
                    })?;
                    Ok(format!("{}/{}/id/{}", self.reference(parent)?, collection, local_id))
                }
            }
        })?;
        Ok(reference.as_str())
    }

    /// Whether the node's reference is currently cached.
    pub fn is_cached(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.0)
            .is_some_and(|node| node.reference.get().is_some())
    }

    /// Changes a child's local id (or a root's reference) and drops cached
    /// references for the node and everything below it.
    pub fn rename(&mut self, id: NodeId, new_local_id: &str) -> Result<()> {
        self.node(id)?;
        match &mut self.nodes[id.0].segment {
            Segment::Root(reference) => *reference = new_local_id.to_string(),
            Segment::Child { local_id, .. } => *local_id = new_local_id.to_string(),
        }
        self.invalidate(id);
        Ok(())
    }

    fn invalidate(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.reference.take();
            stack.extend(node.children.iter().copied());
        }
    }
}
