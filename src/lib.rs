//! Phylocount is a library for gene family size evolution along
//! phylogenetic trees.
//!
//! Core functionality provided:
//! - Tree model: [Phylogeny], an arena-backed rooted tree of arbitrary
//!   degree behind the [IndexedTree](crate::model::IndexedTree) contract
//!   (leaves first, parents after children), with structural edits
//!   (prune and regraft, reroot, fuse).
//! - Newick: a configurable parser for one or many trees, and a writer with
//!   controlled number formatting. See [crate::newick].
//! - Rates: linear birth-death models with immigration (gain, loss,
//!   duplication) per edge, closed-form transient distributions of family
//!   sizes, and discretized rate variation across families.
//!   See [crate::rates].
//! - Rate files: read and write a model together with its variation
//!   settings.
//! - Configurability: parser and writer options from a TOML file,
//!   see [crate::config].
//!
//! Limitations:
//! - Single-threaded; a tree is edited through `&mut` only
//! - No likelihood computation beyond per-edge distributions
//!
//! # Usage patterns
//!
//! ## Parse and edit a tree
//! ```
//! use phylocount::model::IndexedTree;
//! use phylocount::parse_newick_str;
//!
//! let mut tree = parse_newick_str("(A:1,B:2,(C:1,D:1):1);").unwrap();
//! assert_eq!(tree.num_leaves(), 4);
//! assert_eq!(tree.root_index(), Some(5));
//!
//! let c = tree.index_of_name("C").unwrap();
//! tree.move_node(c, 0, false).unwrap();
//! assert_eq!(tree.num_leaves(), 4);
//! ```
//!
//! ## Transients from a rate file
//! ```no_run
//! use phylocount::rates::{read_rates_file, transient::transient0};
//!
//! let tree = phylocount::parse_newick_file("families.nwk")?.remove(0);
//! let variation = read_rates_file("families.rates", tree)?;
//! let model = variation.class_model(0)?;
//! println!("{}", transient0(&model, 0, 0.0)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod model;
pub mod newick;
pub mod parser;
pub mod rates;

use crate::model::Phylogeny;
use crate::parser::parsing_error::ParsingError;
use std::path::Path;

// ============================================================================
// Quick Newick API
// ============================================================================
/// Parse a Newick string using default settings,
/// returning a [Phylogeny].
///
/// See [`newick::parse_str`] for full documentation of this convenience function.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> Result<Phylogeny, ParsingError> {
    newick::parse_str(newick)
}

/// Parse a file containing a semicolon-separated list of Newick strings
/// using default settings, returning all trees.
///
/// See [`newick::parse_file`] for full documentation of this convenience function.
pub fn parse_newick_file<P: AsRef<Path>>(path: P) -> Result<Vec<Phylogeny>, ParsingError> {
    newick::parse_file(path)
}
