//! Trait for constructing phylogenetic trees during parsing.
//!
//! The [`TreeBuilder`] trait decouples the Newick parser from concrete tree
//! representations. The parser walks the Newick string as a state machine
//! and reports each structural step as a callback; the builder assembles
//! whatever tree structure it wants.
//!
//! # Builder lifecycle
//! The builder always has a *current node*, starting at the root:
//!
//! ```text
//! init_next() ──→ start_children / next_child / end_children
//!                 set_name / set_length (apply to current node) ──→ end_tree()
//! ```
//!
//! A builder can construct multiple trees sequentially.

use crate::model::indexed_tree::IndexedTree;
use crate::model::phylogeny::Phylogeny;
use crate::model::traversal::leaf_names;
use crate::model::vertex::NodeId;
use crate::parser::ParsingErrorType;
use tracing::{debug, warn};

/// Separator joining the names of a node named twice in relaxed mode.
pub const NAME_JOINER: &str = " && ";

// =#========================================================================#=
// TREE BUILDER (trait)
// =#========================================================================T=
/// Abstraction for constructing trees during parsing.
///
/// # Implementing this trait
/// Implementors keep track of the node under construction.
/// The parser drives the lifecycle:
///
/// 1. [`init_next`](Self::init_next) -> prepare for a new tree, the current
///    node is the root
/// 2. [`start_children`](Self::start_children) on `(`,
///    [`next_child`](Self::next_child) on `,`,
///    [`end_children`](Self::end_children) on `)` -> build structure
/// 3. [`set_name`](Self::set_name) and [`set_length`](Self::set_length)
///    -> decorate the current node
/// 4. [`end_tree`](Self::end_tree) on `;` -> finalize and return the tree
pub trait TreeBuilder {
    /// The tree type produced by this builder.
    type Tree;

    /// Prepares the builder for constructing a new tree.
    fn init_next(&mut self);

    /// Adds a first child to the current node and makes it current.
    fn start_children(&mut self);

    /// Adds a sibling after the current node and makes it current.
    fn next_child(&mut self);

    /// Makes the parent of the current node current.
    fn end_children(&mut self);

    /// Sets the length of the edge above the current node.
    fn set_length(&mut self, length: f64);

    /// Names the current node.
    ///
    /// # Arguments
    /// * `name` - Name as parsed (unquoted, underscores translated)
    /// * `relaxed` - Whether a second name for the same node is tolerated
    ///
    /// # Errors
    /// [ParsingErrorType::NamedTwice] if the node is already named and
    /// `relaxed` is off.
    fn set_name(&mut self, name: String, relaxed: bool) -> Result<(), ParsingErrorType>;

    /// Finalizes the building process and returns the resulting tree.
    ///
    /// # Errors
    /// Implementations may reject trees that are structurally complete but
    /// unusable, e.g. with unnamed leaves.
    fn end_tree(&mut self) -> Result<Self::Tree, ParsingErrorType>;
}

// =#========================================================================#=
// PHYLOGENY BUILDER
// =#========================================================================€=
/// [TreeBuilder] for [Phylogeny].
///
/// - Lengths: the first length seen turns on lengths for the tree and
///   sets the root length to 0.
/// - The Newick string `;` gives the empty tree.
/// - Trees with unnamed leaves are rejected.
#[derive(Debug, Default)]
pub struct PhylogenyBuilder {
    tree: Phylogeny,
    current: Option<NodeId>,
}

impl PhylogenyBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TreeBuilder for PhylogenyBuilder {
    type Tree = Phylogeny;

    fn init_next(&mut self) {
        self.tree = Phylogeny::new();
        self.current = Some(self.tree.init_root());
    }

    fn start_children(&mut self) {
        if let Some(current) = self.current {
            self.current = Some(self.tree.add_child(current));
        }
    }

    fn next_child(&mut self) {
        let parent = self.current.and_then(|id| self.tree.vertex_by_id(id).parent());
        if let Some(parent) = parent {
            self.current = Some(self.tree.add_child(parent));
        }
    }

    fn end_children(&mut self) {
        let parent = self.current.and_then(|id| self.tree.vertex_by_id(id).parent());
        if parent.is_some() {
            self.current = parent;
        }
    }

    fn set_length(&mut self, length: f64) {
        if !self.tree.has_length() {
            self.tree.set_has_length(true);
            if let Some(root) = self.tree.root_id() {
                self.tree.set_length(root, 0.0);
            }
        }
        if let Some(current) = self.current {
            self.tree.set_length(current, length);
        }
    }

    fn set_name(&mut self, name: String, relaxed: bool) -> Result<(), ParsingErrorType> {
        let Some(current) = self.current else {
            return Ok(());
        };
        let joined = match self.tree.vertex_by_id(current).name() {
            None => name,
            Some(existing) if relaxed => {
                warn!(first = existing, second = %name, "Node named twice, joining names");
                format!("{}{}{}", existing, NAME_JOINER, name)
            }
            Some(existing) => return Err(ParsingErrorType::NamedTwice(existing.to_string())),
        };
        self.tree.set_name(current, Some(joined));
        Ok(())
    }

    fn end_tree(&mut self) -> Result<Phylogeny, ParsingErrorType> {
        self.current = None;
        let mut tree = std::mem::take(&mut self.tree);

        // ";" describes the empty tree
        if tree.root().is_some_and(|root| root.is_leaf() && root.name().is_none()) {
            tree.clear();
        }
        if leaf_names(&tree).iter().any(Option::is_none) {
            return Err(ParsingErrorType::UnnamedLeaves);
        }

        tree.reindex();
        debug!(num_nodes = tree.num_nodes(), "Built tree");
        Ok(tree)
    }
}
