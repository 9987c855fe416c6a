//! Arena-backed ordered trees for pattern matching
//!
//! A `Tree` stores labeled nodes in an arena addressed by `NodeId`.
//! Nodes carry no parent pointers: the parent of a node, like its leaf
//! span, is always computed relative to an explicitly supplied root.
//! The same node can therefore participate in queries rooted at
//! different subtrees without any stored state going stale.

/// Unique identifier for a node (index into the tree arena)
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
struct TreeNode {
    label: String,
    children: Vec<NodeId>,
}

/// An ordered, labeled tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a node with the given label, returning its id
    pub fn add_node(&mut self, label: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            label: label.to_string(),
            children: Vec::new(),
        });
        id
    }

    /// Append `child` to `parent`'s ordered child list
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent].children.push(child);
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Label of a node
    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id].label
    }

    /// Ordered children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// True if the node has no children
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id].children.is_empty()
    }

    /// Position of `child` in `parent`'s child list
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Parent of `node` relative to `root`
    ///
    /// Computed by scanning down from `root`; returns `None` if `node`
    /// is `root` itself or is not in `root`'s subtree.
    pub fn parent_of(&self, root: NodeId, node: NodeId) -> Option<NodeId> {
        if node == root {
            return None;
        }
        self.descendants(root)
            .find(|&c| self.children(c).contains(&node))
    }

    /// Pre-order traversal of the subtree rooted at `id`, inclusive
    pub fn descendants(&self, id: NodeId) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: vec![id],
        }
    }

    /// True if `node` is in the subtree rooted at `root` (inclusive)
    pub fn contains(&self, root: NodeId, node: NodeId) -> bool {
        self.descendants(root).any(|c| c == node)
    }

    /// True if `a` is a strict ancestor of `b`
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        a != b && self.contains(a, b)
    }

    /// Ancestors of `node` relative to `root`, nearest first
    pub fn ancestors(&self, root: NodeId, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            root,
            cur: node,
        }
    }

    /// Left-to-right terminals of the subtree rooted at `id`
    ///
    /// A leaf yields itself.
    pub fn leaves(&self, id: NodeId) -> impl Iterator<Item = NodeId> {
        self.descendants(id).filter(|&n| self.is_leaf(n))
    }

    /// Leaf span of `node` relative to `root`
    ///
    /// Returns `(left, right)` where `left` is the index of the node's
    /// leftmost terminal among `root`'s terminals and `right` is the
    /// index one past its rightmost terminal. `None` if `node` is not
    /// in `root`'s subtree.
    pub fn span(&self, root: NodeId, node: NodeId) -> Option<(usize, usize)> {
        let mut count = 0;
        let mut stack = vec![root];
        while let Some(cur) = stack.pop() {
            if cur == node {
                let width = self.leaves(node).count();
                return Some((count, count + width));
            }
            if self.is_leaf(cur) {
                count += 1;
            } else {
                for &c in self.children(cur).iter().rev() {
                    stack.push(c);
                }
            }
        }
        None
    }
}

/// Pre-order iterator over a subtree
pub struct PreOrder<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        for &c in self.tree.children(id).iter().rev() {
            self.stack.push(c);
        }
        Some(id)
    }
}

/// Iterator over the ancestor path from a node up to a root
pub struct Ancestors<'a> {
    tree: &'a Tree,
    root: NodeId,
    cur: NodeId,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let parent = self.tree.parent_of(self.root, self.cur)?;
        self.cur = parent;
        Some(parent)
    }
}
