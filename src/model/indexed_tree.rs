//! Contract of a rooted tree with indexed nodes.
//!
//! All tree consumers (traversals, writers, rate models) only rely on
//! [IndexedTree], so they work the same for every implementation.
//!
//! # Index invariants
//! For a tree with `n` nodes and `m` leaves:
//! - leaves have indices `0..m`, internal nodes `m..n`
//! - the root has index `n - 1`
//! - every non-root node has a smaller index than its parent
//!
//! Since an edge is identified by its lower endpoint, edges of a tree are
//! indexed by `0..n-1`.

// =#========================================================================#=
// INDEXED TREE (trait)
// =#========================================================================T=
/// A rooted tree whose nodes are addressed by index.
///
/// Implementors provide the primitive accessors; the provided methods are
/// derived from them and must not be overridden with different semantics.
///
/// # Panics
/// Accessors taking a node index may panic if the index is not in
/// `0..num_nodes()`, like slice indexing does.
pub trait IndexedTree {
    /// Node type returned by [node](Self::node).
    type Node;

    /// Number of nodes.
    fn num_nodes(&self) -> usize;

    /// Number of leaves.
    fn num_leaves(&self) -> usize;

    /// Node at the given index.
    fn node(&self, index: usize) -> &Self::Node;

    /// Index of the parent, or `None` for the root.
    fn parent_index(&self, index: usize) -> Option<usize>;

    /// Number of children of a node.
    fn num_children(&self, index: usize) -> usize;

    /// Index of the child at `position` in the (ordered) child list.
    fn child_index(&self, index: usize, position: usize) -> usize;

    /// Length of the edge to the parent.
    fn length(&self, index: usize) -> f64;

    /// Name of a node, if set.
    fn name(&self, index: usize) -> Option<&str>;

    /// Whether edge lengths are part of the tree.
    fn has_length(&self) -> bool;

    /// Index of the root, or `None` for the empty tree.
    fn root_index(&self) -> Option<usize> {
        self.num_nodes().checked_sub(1)
    }

    /// Number of edges, i.e. number of nodes minus one (zero when empty).
    fn num_edges(&self) -> usize {
        self.num_nodes().saturating_sub(1)
    }

    /// Returns `true` if the node has no children.
    fn is_leaf(&self, index: usize) -> bool {
        self.num_children(index) == 0
    }

    /// Returns `true` if the node is the root.
    fn is_root(&self, index: usize) -> bool {
        self.parent_index(index).is_none()
    }

    /// Indices of the children, in order.
    fn children(&self, index: usize) -> Vec<usize> {
        (0..self.num_children(index))
            .map(|position| self.child_index(index, position))
            .collect()
    }
}
