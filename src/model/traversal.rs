//! Traversals and per-node summaries over any [IndexedTree].
//!
//! The index invariants (children before parents) make most summaries a
//! single sweep over the indices; only the order-sensitive traversals
//! ([post_order], [pre_order], [traverse]) walk the tree structure.

use crate::model::indexed_tree::IndexedTree;

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
/// Returns an iterator over node indices in post-order (children before parents).
///
/// # Example
/// ```
/// use phylocount::model::traversal::post_order;
/// use phylocount::newick::parse_str;
///
/// let tree = parse_str("((A,B)X,C)R;").unwrap();
/// let order: Vec<usize> = post_order(&tree).collect();
/// assert_eq!(order, vec![0, 1, 3, 2, 4]);
/// ```
pub fn post_order<T: IndexedTree + ?Sized>(tree: &T) -> PostOrderIter<'_, T> {
    PostOrderIter::new(tree)
}

/// Returns an iterator over node indices in pre-order (parents before children).
pub fn pre_order<T: IndexedTree + ?Sized>(tree: &T) -> PreOrderIter<'_, T> {
    PreOrderIter::new(tree)
}

/// Iterator for post-order traversal (children before parents).
///
/// This iterator uses a stack-based approach to traverse the tree without recursion.
/// Each node is visited after all its descendants have been visited.
pub struct PostOrderIter<'a, T: IndexedTree + ?Sized> {
    tree: &'a T,
    stack: Vec<(usize, bool)>, // (index, children_visited)
}

impl<'a, T: IndexedTree + ?Sized> PostOrderIter<'a, T> {
    fn new(tree: &'a T) -> Self {
        let stack = tree.root_index().map(|root| vec![(root, false)]).unwrap_or_default();
        PostOrderIter { tree, stack }
    }
}

impl<T: IndexedTree + ?Sized> Iterator for PostOrderIter<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, children_visited)) = self.stack.pop() {
            if children_visited || self.tree.is_leaf(index) {
                return Some(index);
            }

            self.stack.push((index, true));
            // Push children in reverse, so the first child is processed first
            for position in (0..self.tree.num_children(index)).rev() {
                self.stack.push((self.tree.child_index(index, position), false));
            }
        }
        None
    }
}

/// Iterator for pre-order traversal (parents before children).
///
/// This iterator uses a stack-based approach to traverse the tree without recursion.
/// Each node is visited before any of its descendants.
pub struct PreOrderIter<'a, T: IndexedTree + ?Sized> {
    tree: &'a T,
    stack: Vec<usize>,
}

impl<'a, T: IndexedTree + ?Sized> PreOrderIter<'a, T> {
    fn new(tree: &'a T) -> Self {
        let stack = tree.root_index().into_iter().collect();
        PreOrderIter { tree, stack }
    }
}

impl<T: IndexedTree + ?Sized> Iterator for PreOrderIter<'_, T> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        for position in (0..self.tree.num_children(index)).rev() {
            self.stack.push(self.tree.child_index(index, position));
        }
        Some(index)
    }
}

// =#========================================================================#=
// DEPTH-FIRST TRAVERSAL WITH CALLBACKS
// =#========================================================================#=
/// Callbacks for [traverse]. All methods default to doing nothing.
pub trait NodeVisitor {
    /// Called when a node is entered, before any of its children.
    fn prefix(&mut self, _index: usize) {}

    /// Called between two consecutive children of a node; `position` is the
    /// position of the child that follows.
    fn infix(&mut self, _index: usize, _position: usize) {}

    /// Called when a node is left, after all of its children.
    fn postfix(&mut self, _index: usize) {}
}

/// Depth-first traversal from the root calling the visitor's callbacks.
///
/// Iterative, so deep (caterpillar) trees do not exhaust the call stack.
pub fn traverse<T: IndexedTree + ?Sized, V: NodeVisitor>(tree: &T, visitor: &mut V) {
    let Some(root) = tree.root_index() else {
        return;
    };

    // (index, position of next child to enter)
    let mut stack = vec![(root, 0usize)];
    visitor.prefix(root);

    while let Some(top) = stack.last_mut() {
        let (index, position) = *top;
        if position < tree.num_children(index) {
            top.1 += 1;
            if position > 0 {
                visitor.infix(index, position);
            }
            let child = tree.child_index(index, position);
            visitor.prefix(child);
            stack.push((child, 0));
        } else {
            visitor.postfix(index);
            stack.pop();
        }
    }
}

// =#========================================================================#=
// PER-NODE SUMMARIES
// =#========================================================================#=
/// Number of nodes in the subtree of each node.
pub fn subtree_sizes<T: IndexedTree + ?Sized>(tree: &T) -> Vec<usize> {
    let n = tree.num_nodes();
    let mut sizes = vec![1; n];
    // Children have smaller indices, so their counts are final here
    for index in 0..n {
        if let Some(parent) = tree.parent_index(index) {
            sizes[parent] += sizes[index];
        }
    }
    sizes
}

/// Number of edges between each node and the root.
pub fn depths<T: IndexedTree + ?Sized>(tree: &T) -> Vec<usize> {
    let n = tree.num_nodes();
    let mut depths = vec![0; n];
    for index in (0..n).rev() {
        if let Some(parent) = tree.parent_index(index) {
            depths[index] = depths[parent] + 1;
        }
    }
    depths
}

/// Maximum number of edges between each node and a leaf of its subtree.
pub fn heights<T: IndexedTree + ?Sized>(tree: &T) -> Vec<usize> {
    let n = tree.num_nodes();
    let mut heights = vec![0; n];
    for index in 0..n {
        if let Some(parent) = tree.parent_index(index) {
            heights[parent] = heights[parent].max(heights[index] + 1);
        }
    }
    heights
}

/// Sum of edge lengths between each node and the root.
pub fn scaled_depths<T: IndexedTree + ?Sized>(tree: &T) -> Vec<f64> {
    let n = tree.num_nodes();
    let mut depths = vec![0.0; n];
    for index in (0..n).rev() {
        if let Some(parent) = tree.parent_index(index) {
            depths[index] = depths[parent] + tree.length(index);
        }
    }
    depths
}

/// Names of the leaves, in leaf index order.
pub fn leaf_names<T: IndexedTree + ?Sized>(tree: &T) -> Vec<Option<&str>> {
    (0..tree.num_leaves()).map(|leaf| tree.name(leaf)).collect()
}

/// Returns `true` if `ancestor` lies on the path from `index` to the root
/// (a node counts as its own ancestor).
pub fn is_ancestor<T: IndexedTree + ?Sized>(tree: &T, ancestor: usize, index: usize) -> bool {
    let mut current = Some(index);
    while let Some(node) = current {
        if node == ancestor {
            return true;
        }
        if node > ancestor {
            // Indices only grow towards the root
            return false;
        }
        current = tree.parent_index(node);
    }
    false
}
