//! Data model for rooted phylogenetic trees.
//!
//! # Tree representation
//! Consumers see trees through the [IndexedTree] contract: nodes are
//! addressed by index, leaves come first, and every node has a smaller index
//! than its parent. [Phylogeny] is the concrete, editable implementation; it
//! stores [Vertex] records in an arena addressed by [NodeId] and derives the
//! indices lazily.
//!
//! # Building trees
//! Trees are typically constructed during parsing via the [TreeBuilder]
//! trait, which decouples the Newick parser from concrete tree types:
//!
//! - [PhylogenyBuilder] → [Phylogeny]
//!
//! Trees can also be built programmatically ([Phylogeny::init_root],
//! [Phylogeny::add_child]) or copied from any other [IndexedTree]
//! ([Phylogeny::copy_from_tree]).
//!
//! # Traversals
//! See [traversal] for pre-/post-order iterators, a depth-first traversal
//! with callbacks, and per-node summaries.

pub mod indexed_tree;
pub mod leaf_label_map;
pub mod phylogeny;
pub mod traversal;
pub mod tree_builder;
pub mod vertex;

pub use indexed_tree::IndexedTree;
pub use leaf_label_map::{LabelError, LabelIndex, LeafLabelMap};
pub use phylogeny::{Phylogeny, TreeEditError};
pub use tree_builder::{PhylogenyBuilder, TreeBuilder};
pub use vertex::{NodeId, Vertex};
