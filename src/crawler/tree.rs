use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// One crawled (or discovered) page and the same-host pages found on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlNode {
    pub url: String,
    /// In discovery order
    #[serde(default)]
    pub links: Vec<UrlNode>,
}

impl UrlNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            links: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`
    pub fn len(&self) -> usize {
        1 + self.links.iter().map(UrlNode::len).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.links.is_empty()
    }

    /// Longest root-to-leaf edge count (0 for a lone root)
    pub fn depth(&self) -> usize {
        self.links
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Pre-order walk yielding each node with its depth below `self`
    pub fn walk(&self) -> Vec<(usize, &UrlNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.links.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

/// Handle of a node inside a [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Slot {
    url: String,
    children: Vec<NodeId>,
}

/// Arena holding the tree while tasks are still appending to it.
///
/// Parents own their children through [`NodeId`]s. Appends take the write lock for
/// one push; snapshots take the read lock.
#[derive(Debug)]
pub struct Tree {
    slots: RwLock<Vec<Slot>>,
}

pub type TreeRef = Arc<Tree>;

impl Tree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn with_root(url: impl Into<String>) -> Self {
        Self {
            slots: RwLock::new(vec![Slot {
                url: url.into(),
                children: Vec::new(),
            }]),
        }
    }

    /// Creates a child of `parent` and returns its handle.
    pub fn attach(&self, parent: NodeId, url: impl Into<String>) -> NodeId {
        let mut slots = self.slots.write();
        let id = NodeId(slots.len());
        slots.push(Slot {
            url: url.into(),
            children: Vec::new(),
        });
        slots[parent.0].children.push(id);
        id
    }

    pub fn url(&self, id: NodeId) -> Option<String> {
        self.slots.read().get(id.0).map(|slot| slot.url.clone())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.slots
            .read()
            .get(id.0)
            .map(|slot| slot.children.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Owned copy of the whole tree as it stands right now
    pub fn snapshot(&self) -> UrlNode {
        let slots = self.slots.read();
        build_node(&slots, Self::ROOT)
    }
}

fn build_node(slots: &[Slot], id: NodeId) -> UrlNode {
    let slot = &slots[id.0];
    UrlNode {
        url: slot.url.clone(),
        links: slot
            .children
            .iter()
            .map(|child| build_node(slots, *child))
            .collect(),
    }
}
