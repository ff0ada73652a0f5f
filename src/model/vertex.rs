//! Vertex records stored in the arena of a [Phylogeny](crate::model::Phylogeny).

/// Edge length assumed for every node of a tree without lengths.
pub const DEFAULT_LENGTH: f64 = 1.0;

/// Stable handle of a vertex slot in the arena of a
/// [Phylogeny](crate::model::Phylogeny).
///
/// Unlike the public node index, a `NodeId` does not change when the tree
/// is reindexed. It is only meaningful for the tree that created it, and
/// the slot of a node removed by an edit may later be reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the slot number in the arena.
    pub fn slot(&self) -> usize {
        self.0
    }
}

// =#========================================================================#=
// VERTEX
// =#========================================================================#=
/// Represents a vertex (node) in a phylogenetic tree.
///
/// A vertex is a leaf if it has no children and the root if it has no
/// parent. Besides structure, it holds the length of the edge to its parent,
/// an optional name, and the cached sizes of its subtree.
///
/// # Invariants
/// - `parent` and `children` refer to live slots of the same arena
/// - `num_leaves` and `num_nodes` count the subtree rooted here
///   (both are 1 for a leaf)
/// - `length` is meaningful for the root only if the tree has lengths
#[derive(PartialEq, Debug, Clone)]
pub struct Vertex {
    /// Slot of the parent vertex
    parent: Option<NodeId>,
    /// Slots of the children, in order
    children: Vec<NodeId>,
    /// Distance to parent
    length: f64,
    /// Name, mandatory for leaves of parsed trees
    name: Option<String>,
    /// Number of leaves in subtree
    pub(crate) num_leaves: usize,
    /// Number of vertices in subtree
    pub(crate) num_nodes: usize,
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new()
    }
}

impl Vertex {
    /// Creates a new parentless, childless vertex with default length.
    pub fn new() -> Self {
        Vertex {
            parent: None,
            children: Vec::new(),
            length: DEFAULT_LENGTH,
            name: None,
            num_leaves: 1,
            num_nodes: 1,
        }
    }

    /// Returns the slot of the parent, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the slots of the children in order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the number of children.
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Returns the length of the edge to the parent.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Returns the name, if set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` if this vertex has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` if this vertex has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Number of leaves in the subtree of this vertex.
    pub fn num_leaves_in_subtree(&self) -> usize {
        self.num_leaves
    }

    /// Number of vertices in the subtree of this vertex, itself included.
    pub fn num_nodes_in_subtree(&self) -> usize {
        self.num_nodes
    }

    // ------------------------------------------------------------------------
    // Mutators for the owning tree
    // ------------------------------------------------------------------------

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn set_length(&mut self, length: f64) {
        self.length = length;
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Appends a child, growing the child list by half its size when full.
    pub(crate) fn push_child(&mut self, child: NodeId) {
        let len = self.children.len();
        if len == self.children.capacity() {
            let target = (len + len / 2).max(len + 1).max(2);
            self.children.reserve_exact(target - len);
        }
        self.children.push(child);
    }

    /// Position of `child` in the child list.
    pub(crate) fn child_position(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    pub(crate) fn remove_child_at(&mut self, pos: usize) -> NodeId {
        self.children.remove(pos)
    }

    pub(crate) fn replace_child_at(&mut self, pos: usize, child: NodeId) {
        self.children[pos] = child;
    }

    /// Replaces the child at `pos` by the given sequence of children, in order.
    pub(crate) fn splice_children(&mut self, pos: usize, replacement: Vec<NodeId>) {
        self.children.splice(pos..=pos, replacement);
    }

    pub(crate) fn take_children(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_list_grows_by_half() {
        let mut vertex = Vertex::new();
        vertex.push_child(NodeId(0));
        assert_eq!(vertex.children.capacity(), 2);
        vertex.push_child(NodeId(1));
        vertex.push_child(NodeId(2));
        assert_eq!(vertex.children.capacity(), 3);
        vertex.push_child(NodeId(3));
        assert_eq!(vertex.children.capacity(), 4);
        vertex.push_child(NodeId(4));
        assert_eq!(vertex.children.capacity(), 6);
        assert_eq!(vertex.child_position(NodeId(3)), Some(3));
    }

    #[test]
    fn test_splice_children() {
        let mut vertex = Vertex::new();
        for i in 0..3 {
            vertex.push_child(NodeId(i));
        }
        vertex.splice_children(1, vec![NodeId(7), NodeId(8)]);
        assert_eq!(vertex.children(), &[NodeId(0), NodeId(7), NodeId(8), NodeId(2)]);
    }
}
