//! Arena-backed visual hierarchy.
//!
//! Scope resolution needs "walk to the nearest ancestor satisfying a
//! predicate" over whatever hierarchy the host application maintains. This
//! module provides that as a freestanding arena tree so the walk can be
//! exercised with synthetic trees in tests, decoupled from any renderer.

/// Stable identifier for a node in a [`VisualTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena index.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct Node<T> {
    payload: T,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A tree of nodes with parent pointers and ordered children.
///
/// Nodes are never deallocated; `detach` only unlinks a subtree from its
/// parent. This keeps `NodeId`s stable for the lifetime of the tree, which is
/// what scope bookkeeping relies on.
#[derive(Debug, Default)]
pub struct VisualTree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> VisualTree<T> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Insert a node, optionally linked under a parent.
    ///
    /// Returns the new node's id. A missing parent id is ignored and the node
    /// becomes a root.
    pub fn insert(&mut self, payload: T, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            payload,
            parent: None,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.attach(id, parent);
        }
        id
    }

    /// Link a detached node under a new parent.
    ///
    /// Detaches from the current parent first, so repeated calls are safe.
    pub fn attach(&mut self, node: NodeId, parent: NodeId) {
        if node == parent || parent.0 >= self.nodes.len() {
            return;
        }
        self.detach(node);
        self.nodes[node.0].parent = Some(parent);
        self.nodes[parent.0].children.push(node);
    }

    /// Unlink a node from its parent. Idempotent.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != node);
    }

    /// The node's parent, if attached.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// The node's children in insertion order.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Shared access to a node's payload.
    pub fn payload(&self, node: NodeId) -> &T {
        &self.nodes[node.0].payload
    }

    /// Mutable access to a node's payload.
    pub fn payload_mut(&mut self, node: NodeId) -> &mut T {
        &mut self.nodes[node.0].payload
    }

    /// Iterate over strict ancestors, nearest first.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            next: self.parent(node),
        }
    }

    /// Find the nearest strict ancestor whose payload satisfies `pred`.
    pub fn nearest_ancestor(&self, node: NodeId, pred: impl Fn(&T) -> bool) -> Option<NodeId> {
        self.ancestors(node).find(|&a| pred(self.payload(a)))
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a, T> {
    tree: &'a VisualTree<T>,
    next: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (VisualTree<&'static str>, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = VisualTree::new();
        let root = tree.insert("root", None);
        let panel = tree.insert("panel", Some(root));
        let grid_a = tree.insert("grid-a", Some(panel));
        let grid_b = tree.insert("grid-b", Some(panel));
        (tree, root, panel, grid_a, grid_b)
    }

    #[test]
    fn insert_links_parent_and_children() {
        let (tree, root, panel, grid_a, grid_b) = sample();
        assert_eq!(tree.parent(panel), Some(root));
        assert_eq!(tree.children(panel), &[grid_a, grid_b]);
        assert_eq!(tree.parent(root), None);
    }

    #[test]
    fn ancestors_walk_nearest_first() {
        let (tree, root, panel, grid_a, _) = sample();
        let chain: Vec<_> = tree.ancestors(grid_a).collect();
        assert_eq!(chain, vec![panel, root]);
    }

    #[test]
    fn detach_is_idempotent() {
        let (mut tree, _, panel, grid_a, grid_b) = sample();
        tree.detach(grid_a);
        tree.detach(grid_a);
        assert_eq!(tree.parent(grid_a), None);
        assert_eq!(tree.children(panel), &[grid_b]);
    }

    #[test]
    fn attach_moves_between_parents() {
        let (mut tree, root, panel, grid_a, _) = sample();
        tree.attach(grid_a, root);
        assert_eq!(tree.parent(grid_a), Some(root));
        assert!(!tree.children(panel).contains(&grid_a));
        assert!(tree.children(root).contains(&grid_a));
    }

    #[test]
    fn attach_to_self_is_rejected() {
        let (mut tree, _, _, grid_a, _) = sample();
        tree.attach(grid_a, grid_a);
        assert_ne!(tree.parent(grid_a), Some(grid_a));
    }

    #[test]
    fn nearest_ancestor_finds_closest_match() {
        let (tree, _, panel, grid_a, _) = sample();
        let hit = tree.nearest_ancestor(grid_a, |p| p.starts_with("pa") || *p == "root");
        assert_eq!(hit, Some(panel));
    }

    #[test]
    fn nearest_ancestor_excludes_self() {
        let (tree, _, _, grid_a, _) = sample();
        assert_eq!(tree.nearest_ancestor(grid_a, |p| *p == "grid-a"), None);
    }

    #[test]
    fn payload_access() {
        let (mut tree, root, ..) = sample();
        assert_eq!(*tree.payload(root), "root");
        *tree.payload_mut(root) = "window";
        assert_eq!(*tree.payload(root), "window");
    }
}
