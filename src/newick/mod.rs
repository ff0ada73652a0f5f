//! Newick format parser and writer for phylogenetic trees.
//!
//! This module provides [`NewickParser`] to parse Newick format strings
//! into tree structures. The parser reports to a
//! [`TreeBuilder`](crate::model::TreeBuilder), so it can produce any tree type.
//!
//! # Quick API
//! For simple use cases with default settings:
//! * [`parse_file`] - parses a file, returns all [`Phylogeny`] trees
//! * [`parse_str`] - parses a single string, returns a [`Phylogeny`]
//! * [`newick_tree`] - writes any tree as a Newick string
//!
//! # Full API
//! For more control, configure a [`NewickParser`] and provide a [`ByteParser`]:
//! * [`NewickParser::parse_tree`] - parse a single tree
//! * [`NewickParser::parse_all`] - parse all trees until EOF
//! * [`NewickParser::into_iter`] - obtain an iterator over trees
//!
//! # Format
//! * `tree ::= node ';'`
//! * `node ::= [ '(' node { ',' node } ')' ] [ name ] [ ':' length ]`
//! * `name ::= unquoted | "'" quoted "'" | '"' quoted '"'`
//!
//! Furthermore:
//! * Whitespace and comments can occur between all elements,
//!   just not within an unquoted name or an edge length
//! * Comments are square brackets, optionally nested, and by default `#`
//!   up to the end of the line
//! * Underscores in unquoted names stand for spaces; inside quoted names,
//!   a doubled quote stands for the quote itself
//! * An empty edge length is 0; `NaN`, `Inf` and `-Inf` are accepted
//!
//! # Error codes
//! | code | problem |
//! |------|---------|
//! | 0    | I/O error |
//! | 1    | `(` after a name, length or child list |
//! | 2    | `,` outside of all child lists |
//! | 3    | `,` after the end of the tree |
//! | 4    | More `)` than `(` |
//! | 5    | `)` after the end of the tree |
//! | 6    | Unclosed `[` comment |
//! | 7    | `:` after an edge length |
//! | 8    | `;` inside a child list |
//! | 9    | Node named twice (strict names) |
//! | 10   | Name after an edge length |
//! | 11   | Missing `;` |
//! | 12   | Leaf without a name |
//! | 13   | `]` without `[` |
//! | 99   | Edge length is not a number |

mod defs;
mod parser;
pub mod writer;

pub use self::parser::{NewickIterator, NewickParser};
pub use self::writer::{NewickFormat, format_name, newick_tree, to_ieee_format, write_newick_file};

use crate::model::Phylogeny;
use crate::parser::ParsingError;
use crate::parser::byte_parser::ByteParser;
use crate::parser::in_memory_byte_source::InMemoryByteSource;
use std::path::Path;
use tracing::info;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a Newick file eagerly and returns all trees.
///
/// This is a convenience function to parse a file containing a list of
/// Newick strings, using default settings and thus not requiring
/// configuration of a parser.
///
/// # Arguments
/// * `path` - Path to the file (accepting `&str`, `String`, `Path`, or `PathBuf`)
///
/// # Returns
/// * `Vec<Phylogeny>` - All parsed trees
/// * [`ParsingError`] - If file reading fails or Newick format is invalid
///
/// # Example
/// ```ignore
/// use phylocount::newick::parse_file;
///
/// let trees = parse_file("anseriformes.nwk")?;
/// println!("Parsed {} trees", trees.len());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Phylogeny>, ParsingError> {
    let path = path.as_ref();
    let source = InMemoryByteSource::from_file(path)?;
    let byte_parser = ByteParser::new(source);

    let trees = NewickParser::default().parse_all(byte_parser)?;
    info!(path = %path.display(), num_trees = trees.len(), "Parsed Newick file");
    Ok(trees)
}

/// Parses a single Newick string to obtain a [`Phylogeny`].
///
/// # Example
/// ```
/// use phylocount::model::IndexedTree;
/// use phylocount::newick::parse_str;
///
/// let tree = parse_str("(Fratercula_cirrhata,(Fratercula_arctica,Fratercula_corniculata));").unwrap();
/// assert_eq!(tree.num_leaves(), 3);
/// assert_eq!(tree.name(2), Some("Fratercula corniculata"));
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<Phylogeny, ParsingError> {
    NewickParser::default().parse_str(newick.as_ref())
}
