//! Mutable rooted phylogeny with indexed nodes.
//!
//! This module provides [Phylogeny], the concrete [IndexedTree] of this
//! crate, together with its structural edits (fuse, prune and regraft,
//! reroot) and the [TreeEditError] they report.

use crate::model::indexed_tree::IndexedTree;
use crate::model::vertex::{DEFAULT_LENGTH, NodeId, Vertex};
use crate::newick::writer::{NewickFormat, newick_tree};
use std::cell::OnceCell;
use std::fmt;
use tracing::debug;

/// Index of slots that do not hold a node of the tree.
const NOT_IN_TREE: usize = usize::MAX;

// =#========================================================================#=
// TREE EDIT ERROR
// =#========================================================================€=
/// Violated precondition of a structural edit.
///
/// Edits check all preconditions before touching the tree, so a tree is
/// unchanged after an edit returned one of these.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeEditError {
    #[error("Cannot fuse leaf {0} into its parent")]
    FuseLeaf(usize),
    #[error("Cannot fuse the root into a parent")]
    FuseRoot,
    #[error("Cannot move the root")]
    MoveRoot,
    #[error("Cannot graft node {node} into its own subtree at node {target}")]
    GraftIntoOwnSubtree { node: usize, target: usize },
    #[error("Cannot graft into leaf {0}")]
    GraftIntoLeaf(usize),
    #[error("Node {0} is the only child of its parent")]
    OnlyChild(usize),
    #[error("Cannot reroot at leaf {0}")]
    RerootAtLeaf(usize),
    #[error("Node index {index} out of range for tree with {num_nodes} nodes")]
    NodeOutOfRange { index: usize, num_nodes: usize },
    #[error("Tree is empty")]
    EmptyTree,
}

// =#========================================================================#=
// TREE INDEX
// =#========================================================================#=
/// Mapping between public node indices and arena slots.
#[derive(Debug, Clone)]
struct TreeIndex {
    /// Slot of the node with a given index
    order: Vec<NodeId>,
    /// Index of the node in a given slot, `NOT_IN_TREE` for free slots
    index_of: Vec<usize>,
}

impl TreeIndex {
    fn index(&self, id: NodeId) -> Option<usize> {
        self.index_of.get(id.0).copied().filter(|&i| i != NOT_IN_TREE)
    }
}

// =#========================================================================#=
// PHYLOGENY
// =#========================================================================#=
/// A rooted phylogeny with arbitrary degrees, stored as an arena of [Vertex]
/// records.
///
/// Vertices reference each other by their [NodeId] (arena slot), which stays
/// stable across edits. The public node index required by [IndexedTree] is
/// computed from the structure: leaves get `0..m` from left to right, and
/// internal nodes get `m..n` in post-order, so that the root is `n - 1`.
///
/// # Index state
/// The index is cached and dropped by every structural change. It is
/// recomputed in one post-order pass on the next read of an index, so a
/// sequence of edits costs only one reindexing.
///
/// # Edits
/// - [fuse_into_parent](Self::fuse_into_parent)
/// - [move_node](Self::move_node) (subtree prune and regraft)
/// - [reroot](Self::reroot)
/// - [clean_singular_nodes](Self::clean_singular_nodes)
///
/// Edits take node *indices* as they are before the edit; indices
/// obtained before an edit must not be reused after it.
///
/// # Example
/// ```
/// use phylocount::model::IndexedTree;
/// use phylocount::newick::parse_str;
///
/// let mut tree = parse_str("((A:1,B:1):0.5,(C:1,D:1):0.5,E:2);").unwrap();
/// assert_eq!(tree.num_nodes(), 8);
///
/// let ab = tree.parent_index(0).unwrap();
/// tree.reroot(ab).unwrap();
/// assert_eq!(tree.num_children(tree.root_index().unwrap()), 3);
/// assert_eq!(tree.num_leaves(), 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Phylogeny {
    /// Vertex records (arena pattern)
    vertices: Vec<Vertex>,
    /// Slots released by edits, reused for new vertices
    free_slots: Vec<NodeId>,
    /// Slot of the root, `None` for the empty tree
    root: Option<NodeId>,
    /// Whether edge lengths were given
    has_length: bool,
    /// Cached index; empty when the tree needs reindexing
    index: OnceCell<TreeIndex>,
}

// ============================================================================
// Construction (pub)
// ============================================================================
impl Phylogeny {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards all vertices and starts over with a single root vertex.
    ///
    /// # Returns
    /// The slot of the new root.
    pub fn init_root(&mut self) -> NodeId {
        self.vertices.clear();
        self.free_slots.clear();
        self.has_length = false;
        let root = self.alloc(Vertex::new());
        self.root = Some(root);
        self.invalidate();
        root
    }

    /// Removes all vertices, leaving the empty tree.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.free_slots.clear();
        self.root = None;
        self.invalidate();
    }

    /// Appends a new leaf as the last child of `parent`.
    ///
    /// Subtree counts of all ancestors are updated on the way.
    ///
    /// # Returns
    /// The slot of the new vertex.
    pub fn add_child(&mut self, parent: NodeId) -> NodeId {
        let child = self.alloc(Vertex::new());
        // A leaf that gets its first child does not gain a leaf
        let leaf_delta = usize::from(!self.v(parent).is_leaf());
        self.attach(parent, child);

        let mut current = Some(parent);
        while let Some(ancestor) = current {
            let vertex = self.v_mut(ancestor);
            vertex.num_nodes += 1;
            vertex.num_leaves += leaf_delta;
            current = vertex.parent();
        }

        self.invalidate();
        child
    }

    /// Sets the name of a vertex.
    pub fn set_name(&mut self, id: NodeId, name: Option<String>) {
        self.v_mut(id).set_name(name);
    }

    /// Sets the length of the edge above a vertex.
    pub fn set_length(&mut self, id: NodeId, length: f64) {
        self.v_mut(id).set_length(length);
    }

    /// Declares whether edge lengths are part of this tree.
    pub fn set_has_length(&mut self, has_length: bool) {
        self.has_length = has_length;
    }

    /// Deep copy of any [IndexedTree] with names, lengths (if present) and
    /// topology.
    ///
    /// Nodes keep their indices if the source respects the index invariants.
    pub fn copy_from_tree<T: IndexedTree + ?Sized>(source: &T) -> Self {
        let n = source.num_nodes();
        let mut tree = Phylogeny {
            vertices: Vec::with_capacity(n),
            has_length: source.has_length(),
            ..Default::default()
        };

        for index in 0..n {
            let mut vertex = Vertex::new();
            vertex.set_name(source.name(index).map(str::to_owned));
            if tree.has_length {
                vertex.set_length(source.length(index));
            }
            tree.vertices.push(vertex);
        }
        for index in 0..n {
            for position in 0..source.num_children(index) {
                let child = source.child_index(index, position);
                tree.attach(NodeId(index), NodeId(child));
            }
        }
        tree.root = source.root_index().map(NodeId);
        tree.recount();

        debug!(num_nodes = n, "Copied tree");
        tree
    }
}

// ============================================================================
// Getters / Accessors (pub)
// ============================================================================
impl Phylogeny {
    /// Returns the root vertex, or `None` for the empty tree.
    pub fn root(&self) -> Option<&Vertex> {
        self.root.map(|id| self.v(id))
    }

    /// Returns the slot of the root, or `None` for the empty tree.
    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    /// Returns the vertex with the given index.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn vertex(&self, index: usize) -> &Vertex {
        &self[index]
    }

    /// Returns the vertex in the given slot.
    pub fn vertex_by_id(&self, id: NodeId) -> &Vertex {
        self.v(id)
    }

    /// Slot of the node with the given index.
    pub fn node_id(&self, index: usize) -> Option<NodeId> {
        self.tree_index().order.get(index).copied()
    }

    /// Index of the node in the given slot, `None` for slots not in the tree.
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.tree_index().index(id)
    }

    /// Index of the first node (in index order) with the given name.
    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        self.tree_index()
            .order
            .iter()
            .position(|&id| self.v(id).name() == Some(name))
    }

    /// Returns whether the index needs to be recomputed before the next read.
    pub fn needs_reindex(&self) -> bool {
        self.index.get().is_none()
    }

    /// Recomputes the index now rather than on the next read.
    pub fn reindex(&mut self) {
        self.invalidate();
        self.tree_index();
    }

    /// Sum of all edge lengths below the root.
    pub fn total_length(&self) -> f64 {
        (0..self.num_edges()).map(|edge| self.length(edge)).sum()
    }

    /// Converts the tree into a Newick string.
    ///
    /// # Example
    /// ```
    /// use phylocount::newick::{parse_str, NewickFormat};
    ///
    /// let tree = parse_str("(Apteryx_mantelli:1,Apteryx_owenii:2);").unwrap();
    /// assert_eq!(
    ///     tree.to_newick(&NewickFormat::default()),
    ///     "('Apteryx mantelli':1,'Apteryx owenii':2);"
    /// );
    /// ```
    pub fn to_newick(&self, format: &NewickFormat) -> String {
        newick_tree(self, format)
    }
}

// ============================================================================
// Structural edits (pub)
// ============================================================================
impl Phylogeny {
    /// Removes an internal node, splicing its children into the child list
    /// of its parent at its former position.
    ///
    /// With lengths, the length of the removed node is added to each of its
    /// children, so path lengths between leaves are kept.
    ///
    /// # Errors
    /// * [TreeEditError::FuseLeaf] if the node is a leaf
    /// * [TreeEditError::FuseRoot] if the node is the root
    pub fn fuse_into_parent(&mut self, index: usize) -> Result<(), TreeEditError> {
        let id = self.resolve(index)?;
        if self.v(id).is_leaf() {
            return Err(TreeEditError::FuseLeaf(index));
        }
        let Some((parent, position)) = self.position_at_parent(id) else {
            return Err(TreeEditError::FuseRoot);
        };

        let length = self.v(id).length();
        let children = self.v_mut(id).take_children();
        for &child in &children {
            let has_length = self.has_length;
            let vertex = self.v_mut(child);
            vertex.set_parent(Some(parent));
            if has_length {
                vertex.set_length(vertex.length() + length);
            }
        }
        self.v_mut(parent).splice_children(position, children);

        let mut current = Some(parent);
        while let Some(ancestor) = current {
            let vertex = self.v_mut(ancestor);
            vertex.num_nodes -= 1;
            current = vertex.parent();
        }

        self.release(id);
        self.invalidate();
        debug!(node = index, "Fused node into parent");
        Ok(())
    }

    /// Subtree prune and regraft: cuts the subtree of `index` and attaches it
    /// at `target`.
    ///
    /// With `graft_into`, the node becomes the last child of `target`.
    /// Otherwise a new node is inserted on the edge above `target` (or above
    /// the root), with `target` and the moved node as its two children; with
    /// lengths, the length of the split edge is halved between the two parts.
    /// Nodes left with a single child are removed afterwards.
    ///
    /// # Errors
    /// * [TreeEditError::MoveRoot] if the node is the root
    /// * [TreeEditError::GraftIntoOwnSubtree] if `target` is in the subtree of the node
    /// * [TreeEditError::OnlyChild] if the node is the only child of its parent
    /// * [TreeEditError::GraftIntoLeaf] if grafting into a leaf
    pub fn move_node(&mut self, index: usize, target_index: usize, graft_into: bool) -> Result<(), TreeEditError> {
        let node = self.resolve(index)?;
        let target = self.resolve(target_index)?;
        let Some((parent, position)) = self.position_at_parent(node) else {
            return Err(TreeEditError::MoveRoot);
        };
        if self.is_in_subtree(target, node) {
            return Err(TreeEditError::GraftIntoOwnSubtree {
                node: index,
                target: target_index,
            });
        }
        if self.v(parent).num_children() == 1 {
            return Err(TreeEditError::OnlyChild(index));
        }
        if graft_into && self.v(target).is_leaf() {
            return Err(TreeEditError::GraftIntoLeaf(target_index));
        }

        self.v_mut(parent).remove_child_at(position);
        self.v_mut(node).set_parent(None);

        if graft_into {
            self.attach(target, node);
        } else {
            let joint = self.alloc(Vertex::new());
            let target_length = self.v(target).length();
            match self.position_at_parent(target) {
                None => {
                    self.v_mut(joint).set_length(target_length);
                    if !self.has_length {
                        self.v_mut(target).set_length(DEFAULT_LENGTH);
                    }
                    self.root = Some(joint);
                }
                Some((grandparent, target_position)) => {
                    if self.has_length {
                        let half = target_length / 2.0;
                        self.v_mut(target).set_length(half);
                        self.v_mut(joint).set_length(half);
                    }
                    self.v_mut(grandparent).replace_child_at(target_position, joint);
                    self.v_mut(joint).set_parent(Some(grandparent));
                }
            }
            self.attach(joint, target);
            self.attach(joint, node);
        }

        self.collapse_singular_nodes();
        self.recount();
        self.invalidate();
        debug!(node = index, target = target_index, graft_into, "Moved subtree");
        Ok(())
    }

    /// Roots the tree at an internal node.
    ///
    /// Parent and child are swapped along the path from the node to the old
    /// root, each edge keeping its length. The new root takes the length of
    /// the old root. Nodes left with a single child are removed afterwards.
    ///
    /// # Errors
    /// * [TreeEditError::RerootAtLeaf] if the node is a leaf
    pub fn reroot(&mut self, index: usize) -> Result<(), TreeEditError> {
        let node = self.resolve(index)?;
        if self.v(node).is_leaf() {
            return Err(TreeEditError::RerootAtLeaf(index));
        }
        let Some(old_root) = self.root else {
            return Err(TreeEditError::EmptyTree);
        };
        if node == old_root {
            return Ok(());
        }

        let root_length = self.v(old_root).length();
        let mut current = node;
        let mut current_length = self.v(node).length();
        let mut next = self.v(node).parent();
        self.v_mut(node).set_parent(None);

        while let Some(parent) = next {
            let parent_length = self.v(parent).length();
            next = self.v(parent).parent();
            if let Some(position) = self.v(parent).child_position(current) {
                self.v_mut(parent).remove_child_at(position);
            }
            // Former parent now hangs below, on the edge that was above `current`
            self.attach(current, parent);
            self.v_mut(parent).set_length(current_length);
            current = parent;
            current_length = parent_length;
        }

        self.v_mut(node).set_length(root_length);
        self.root = Some(node);
        self.collapse_singular_nodes();
        self.recount();
        self.invalidate();
        debug!(node = index, "Rerooted tree");
        Ok(())
    }

    /// Removes every non-root node with exactly one child, connecting that
    /// child to its grandparent (lengths summed if present). While the root
    /// has a single child, that child becomes the root and takes the length
    /// of the old root.
    pub fn clean_singular_nodes(&mut self) {
        if self.collapse_singular_nodes() {
            self.recount();
            self.invalidate();
        }
    }
}

// ============================================================================
// Arena helpers
// ============================================================================
impl Phylogeny {
    #[inline]
    fn v(&self, id: NodeId) -> &Vertex {
        &self.vertices[id.0]
    }

    #[inline]
    fn v_mut(&mut self, id: NodeId) -> &mut Vertex {
        &mut self.vertices[id.0]
    }

    fn alloc(&mut self, vertex: Vertex) -> NodeId {
        match self.free_slots.pop() {
            Some(id) => {
                self.vertices[id.0] = vertex;
                id
            }
            None => {
                self.vertices.push(vertex);
                NodeId(self.vertices.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.vertices[id.0] = Vertex::new();
        self.free_slots.push(id);
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.v_mut(parent).push_child(child);
        self.v_mut(child).set_parent(Some(parent));
    }

    fn invalidate(&mut self) {
        self.index.take();
    }

    /// Parent of a vertex and its position in the parent's child list.
    fn position_at_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.v(id).parent()?;
        let position = self.v(parent).child_position(id)?;
        Some((parent, position))
    }

    /// Whether `id` lies in the subtree of `ancestor` (itself included).
    fn is_in_subtree(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.v(node).parent();
        }
        false
    }

    fn resolve(&self, index: usize) -> Result<NodeId, TreeEditError> {
        if self.root.is_none() {
            return Err(TreeEditError::EmptyTree);
        }
        self.node_id(index).ok_or(TreeEditError::NodeOutOfRange {
            index,
            num_nodes: self.num_nodes(),
        })
    }

    /// Slots in post-order, computed from the structure alone.
    fn post_order_ids(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.vertices.len());
        let mut stack: Vec<(NodeId, bool)> = self.root.map(|r| vec![(r, false)]).unwrap_or_default();
        while let Some((id, children_visited)) = stack.pop() {
            let vertex = self.v(id);
            if children_visited || vertex.is_leaf() {
                order.push(id);
            } else {
                stack.push((id, true));
                for &child in vertex.children().iter().rev() {
                    stack.push((child, false));
                }
            }
        }
        order
    }

    /// Recomputes subtree leaf and node counts of every vertex.
    fn recount(&mut self) {
        for id in self.post_order_ids() {
            let (leaves, nodes) = if self.v(id).is_leaf() {
                (1, 1)
            } else {
                self.v(id)
                    .children()
                    .iter()
                    .fold((0, 1), |(l, n), &c| (l + self.v(c).num_leaves, n + self.v(c).num_nodes))
            };
            let vertex = self.v_mut(id);
            vertex.num_leaves = leaves;
            vertex.num_nodes = nodes;
        }
    }

    /// Collapses singular nodes without touching counts or index.
    ///
    /// # Returns
    /// `true` if any node was removed.
    fn collapse_singular_nodes(&mut self) -> bool {
        let Some(root) = self.root else {
            return false;
        };

        let mut changed = false;
        for id in self.post_order_ids() {
            if id == root || self.v(id).num_children() != 1 {
                continue;
            }
            let Some((parent, position)) = self.position_at_parent(id) else {
                continue;
            };
            let child = self.v(id).children()[0];
            if self.has_length {
                let length = self.v(child).length() + self.v(id).length();
                self.v_mut(child).set_length(length);
            }
            self.v_mut(parent).replace_child_at(position, child);
            self.v_mut(child).set_parent(Some(parent));
            self.release(id);
            changed = true;
        }

        while let Some(root) = self.root {
            if self.v(root).num_children() != 1 {
                break;
            }
            let child = self.v(root).children()[0];
            let length = self.v(root).length();
            let vertex = self.v_mut(child);
            vertex.set_length(length);
            vertex.set_parent(None);
            self.release(root);
            self.root = Some(child);
            changed = true;
        }

        changed
    }

    /// Returns the index, computing it first if the tree changed.
    fn tree_index(&self) -> &TreeIndex {
        self.index.get_or_init(|| self.compute_index())
    }

    /// Leaves get `0..m` in left-to-right order, internal nodes `m..n`
    /// in post-order.
    fn compute_index(&self) -> TreeIndex {
        let post_order = self.post_order_ids();
        let num_leaves = post_order.iter().filter(|&&id| self.v(id).is_leaf()).count();

        let mut order = vec![NodeId(0); post_order.len()];
        let mut index_of = vec![NOT_IN_TREE; self.vertices.len()];
        let mut next_leaf = 0;
        let mut next_internal = num_leaves;
        for id in post_order {
            let index = if self.v(id).is_leaf() {
                next_leaf += 1;
                next_leaf - 1
            } else {
                next_internal += 1;
                next_internal - 1
            };
            order[index] = id;
            index_of[id.0] = index;
        }

        debug!(num_nodes = order.len(), num_leaves, "Reindexed tree");
        TreeIndex { order, index_of }
    }
}

// ============================================================================
// Indexed tree contract
// ============================================================================
impl IndexedTree for Phylogeny {
    type Node = Vertex;

    fn num_nodes(&self) -> usize {
        self.root().map_or(0, |r| r.num_nodes)
    }

    fn num_leaves(&self) -> usize {
        self.root().map_or(0, |r| r.num_leaves)
    }

    fn node(&self, index: usize) -> &Vertex {
        &self[index]
    }

    fn parent_index(&self, index: usize) -> Option<usize> {
        let tree_index = self.tree_index();
        let parent = self.v(tree_index.order[index]).parent()?;
        tree_index.index(parent)
    }

    fn num_children(&self, index: usize) -> usize {
        self[index].num_children()
    }

    fn child_index(&self, index: usize, position: usize) -> usize {
        let tree_index = self.tree_index();
        let child = self.v(tree_index.order[index]).children()[position];
        tree_index.index_of[child.0]
    }

    fn length(&self, index: usize) -> f64 {
        self[index].length()
    }

    fn name(&self, index: usize) -> Option<&str> {
        self[index].name()
    }

    fn has_length(&self) -> bool {
        self.has_length
    }
}

impl std::ops::Index<usize> for Phylogeny {
    type Output = Vertex;

    fn index(&self, index: usize) -> &Self::Output {
        self.v(self.tree_index().order[index])
    }
}

// ============================================================================
// Printing
// ============================================================================
/// Indented drawing of the tree, one node per line.
///
/// # Example Output
/// ```text
/// Tree with 3 leaves (5 nodes total):
/// [4] root
///   ├─ [3] (length: 0.500)
///   │  ├─ [0] "A" (length: 0.100)
///   │  └─ [1] "B" (length: 0.200)
///   └─ [2] "C" (length: 0.400)
/// ```
impl fmt::Display for Phylogeny {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn write_node(
            tree: &Phylogeny,
            f: &mut fmt::Formatter,
            index: usize,
            prefix: &str,
            is_last: bool,
        ) -> fmt::Result {
            let connector = if prefix.is_empty() { "" } else if is_last { "└─ " } else { "├─ " };
            write!(f, "{}{}[{}]", prefix, connector, index)?;
            if let Some(name) = tree.name(index) {
                write!(f, " \"{}\"", name)?;
            }
            if tree.is_root(index) {
                writeln!(f, " root")?;
            } else if tree.has_length() {
                writeln!(f, " (length: {:.3})", tree.length(index))?;
            } else {
                writeln!(f)?;
            }

            let children = tree.children(index);
            let new_prefix = if prefix.is_empty() {
                "  ".to_string()
            } else {
                format!("{}{}  ", prefix, if is_last { " " } else { "│" })
            };
            for (position, &child) in children.iter().enumerate() {
                write_node(tree, f, child, &new_prefix, position + 1 == children.len())?;
            }
            Ok(())
        }

        writeln!(f, "Tree with {} leaves ({} nodes total):", self.num_leaves(), self.num_nodes())?;
        match self.root_index() {
            Some(root) => write_node(self, f, root, "", true),
            None => writeln!(f, "(empty)"),
        }
    }
}
