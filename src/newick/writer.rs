//! Newick format writing for any [IndexedTree].
//!
//! - [newick_tree]: one tree as a Newick string
//! - [write_newick_file]: many trees to a file, one per line
//! - [format_name] and [to_ieee_format]: the quoting and number formatting
//!   rules used for names and edge lengths

use crate::config::FormatConfig;
use crate::model::indexed_tree::IndexedTree;
use crate::model::traversal::{NodeVisitor, traverse};
use crate::newick::defs::{NEED_QUOTE_FOR, QUOTE_WHEN_WRITING};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Default number of decimals for edge lengths
pub const DEFAULT_DECIMALS: usize = 3;

/// Default threshold below which edge lengths are written as (almost) zero
pub const DEFAULT_TOO_SHORT: f64 = 1e-8;

/// Fraction of the too-short threshold written for lengths below it
const PRACTICALLY_ZERO_FRACTION: f64 = 0.099;

/// Extra buffer in Newick string length/capacity estimate
const BUFFER_CHARS: usize = 10;

// =#========================================================================#=
// NEWICK FORMAT
// =#========================================================================$=
/// Output options for Newick strings.
///
/// # Example
/// ```
/// use phylocount::newick::{parse_str, newick_tree, NewickFormat};
///
/// let tree = parse_str("((A:0.12345,B:0.0004):2,C:3);").unwrap();
/// let format = NewickFormat { decimals: 2, ..NewickFormat::default() };
/// assert_eq!(newick_tree(&tree, &format), "((A:0.12,B:0.00045):2,C:3);");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewickFormat {
    /// Quote every name, and write `''` for unnamed leaves
    pub always_quote: bool,
    /// Write `:length` after every non-root node (if the tree has lengths)
    pub edge_lengths: bool,
    /// Start a new line after every `,`
    pub line_breaks: bool,
    /// Annotate nodes with their indices in comments
    pub node_ids: bool,
    /// Decimals kept for edge lengths of normal magnitude
    pub decimals: usize,
    /// Edge lengths below this are written as a small fraction of it
    pub too_short: f64,
}

impl Default for NewickFormat {
    fn default() -> Self {
        Self {
            always_quote: false,
            edge_lengths: true,
            line_breaks: false,
            node_ids: false,
            decimals: DEFAULT_DECIMALS,
            too_short: DEFAULT_TOO_SHORT,
        }
    }
}

impl NewickFormat {
    /// Output options from the `[format]` section of the configuration.
    pub fn from_config(config: &FormatConfig) -> Self {
        Self {
            always_quote: config.always_quote,
            edge_lengths: config.edge_lengths,
            line_breaks: config.line_breaks,
            node_ids: config.node_ids,
            decimals: config.decimals,
            too_short: config.too_short,
        }
    }
}

// =#========================================================================#=
// FORMATTING NAMES AND NUMBERS
// =#========================================================================$=
/// Formats a node name for Newick output.
///
/// A name is quoted with `'` if `always_quote` is set or if it contains
/// whitespace or one of `'()`,`;:[]`. An underscore, `"` and `#` also force
/// quotes, since unquoted they would be read back as a space, a `"` quote or
/// a comment. Quotes inside quoted names are doubled.
/// A missing name is written as nothing, or `''` if `always_quote` is set.
///
/// # Example
/// ```
/// use phylocount::newick::format_name;
///
/// assert_eq!(format_name(Some("Corvus"), false), "Corvus");
/// assert_eq!(format_name(Some("Corvus corax"), false), "'Corvus corax'");
/// assert_eq!(format_name(Some("O'Brien"), false), "'O''Brien'");
/// assert_eq!(format_name(Some("#2"), false), "'#2'");
/// assert_eq!(format_name(None, true), "''");
/// ```
pub fn format_name(name: Option<&str>, always_quote: bool) -> String {
    let Some(name) = name else {
        return if always_quote { "''".to_string() } else { String::new() };
    };

    let need_quote = always_quote
        || name
            .chars()
            .any(|c| c.is_whitespace() || (c.is_ascii() && needs_quote(c as u8)));

    if need_quote {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

fn needs_quote(b: u8) -> bool {
    NEED_QUOTE_FOR.contains(&b) || QUOTE_WHEN_WRITING.contains(&b)
}

/// Formats an edge length with limited precision.
///
/// - `NaN`, `Inf`, `-Inf` and `0` are written literally.
/// - Lengths of normal magnitude keep `decimals` decimals (rounded half up).
/// - Lengths below `too_short` become a small fraction of it, so they stay
///   distinguishable from 0.
/// - Other tiny lengths keep a single significant digit.
///
/// # Example
/// ```
/// use phylocount::newick::to_ieee_format;
///
/// assert_eq!(to_ieee_format(0.12345, 3, 1e-8), "0.123");
/// assert_eq!(to_ieee_format(2.0, 3, 1e-8), "2");
/// assert_eq!(to_ieee_format(1.234e-6, 3, 1e-8), "0.0000015");
/// assert_eq!(to_ieee_format(f64::INFINITY, 3, 1e-8), "Inf");
/// ```
pub fn to_ieee_format(d: f64, decimals: usize, too_short: f64) -> String {
    if d.is_nan() {
        return "NaN".to_string();
    }
    if d == f64::INFINITY {
        return "Inf".to_string();
    }
    if d == f64::NEG_INFINITY {
        return "-Inf".to_string();
    }
    if d == 0.0 {
        return "0".to_string();
    }

    let decimals = decimals as i32;
    let magnitude = (d.abs().log10() + 0.01).floor() as i32;

    let value = if magnitude >= -(decimals + 1) {
        let factor = 10f64.powi(decimals);
        (d * factor + 0.5).trunc() / factor
    } else if d < too_short {
        PRACTICALLY_ZERO_FRACTION * too_short
    } else {
        let factor = 10f64.powi(-magnitude);
        ((d * factor).trunc() + 0.5) / factor
    };
    value.to_string()
}

// =#========================================================================#=
// WRITING TREES
// =#========================================================================$=
/// Returns the Newick representation of a tree with closing semicolon.
///
/// The empty tree is written as `;`.
///
/// # Example
/// ```
/// use phylocount::newick::{parse_str, newick_tree, NewickFormat};
///
/// let tree = parse_str("((Apteryx_haastii:1,Apteryx_owenii:1)Kiwi:0.5,Casuarius:1.5);").unwrap();
/// let newick = newick_tree(&tree, &NewickFormat::default());
/// assert_eq!(newick, "(('Apteryx haastii':1,'Apteryx owenii':1)Kiwi:0.5,Casuarius:1.5);");
/// ```
pub fn newick_tree<T: IndexedTree + ?Sized>(tree: &T, format: &NewickFormat) -> String {
    let capacity = estimate_newick_len(tree, format);
    newick_tree_with_capacity(tree, format, capacity)
}

/// Writes given list of trees to a file in Newick format, one tree per line.
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick_file<T: IndexedTree>(file: File, trees: &[T], format: &NewickFormat) -> io::Result<()> {
    let Some(first) = trees.first() else {
        return Ok(());
    };

    let mut writer = BufWriter::new(file);
    let estimated_capacity = estimate_newick_len(first, format);
    for tree in trees {
        let newick = newick_tree_with_capacity(tree, format, estimated_capacity);
        writer.write_all(newick.as_bytes())?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}

/// Returns the Newick representation of a tree with pre-allocated capacity.
pub(crate) fn newick_tree_with_capacity<T: IndexedTree + ?Sized>(
    tree: &T,
    format: &NewickFormat,
    estimated_capacity: usize,
) -> String {
    let mut writer = NewickWriter {
        tree,
        format,
        show_lengths: format.edge_lengths && tree.has_length(),
        newick: String::with_capacity(estimated_capacity),
    };
    traverse(tree, &mut writer);
    writer.newick.push(';');
    writer.newick
}

/// Estimates the length of a Newick string for a given tree.
///
/// Structure, names and edge lengths are counted; comments for node ids
/// are not.
pub(crate) fn estimate_newick_len<T: IndexedTree + ?Sized>(tree: &T, format: &NewickFormat) -> usize {
    // Each internal node: "()" plus a separator per extra child
    const INTERNAL_NODE_CHARS: usize = 2;
    // Edge lengths: ":" plus a few digits
    const EDGE_LENGTH_CHARS: usize = 8;

    let num_nodes = tree.num_nodes();
    let num_leaves = tree.num_leaves();

    let structure_capacity = (num_nodes - num_leaves) * INTERNAL_NODE_CHARS + tree.num_edges();
    let name_capacity: usize = (0..num_nodes)
        .filter_map(|index| tree.name(index))
        .map(|name| name.len() + 2)
        .sum();
    let length_capacity = if format.edge_lengths && tree.has_length() {
        tree.num_edges() * EDGE_LENGTH_CHARS
    } else {
        0
    };

    structure_capacity + name_capacity + length_capacity + BUFFER_CHARS
}

/// Builds the Newick string during a depth-first traversal.
struct NewickWriter<'a, T: ?Sized> {
    tree: &'a T,
    format: &'a NewickFormat,
    show_lengths: bool,
    newick: String,
}

impl<T: IndexedTree + ?Sized> NewickWriter<'_, T> {
    /// `L3` for leaf 3, `N5` for internal node 5
    fn id_info(&self, index: usize) -> String {
        let kind = if self.tree.is_leaf(index) { 'L' } else { 'N' };
        format!("{}{}", kind, index)
    }
}

impl<T: IndexedTree + ?Sized> NodeVisitor for NewickWriter<'_, T> {
    fn prefix(&mut self, index: usize) {
        if self.format.node_ids {
            let info = self.id_info(index);
            self.newick.push_str(&format!("[<<< {}]", info));
        }
        if !self.tree.is_leaf(index) {
            self.newick.push('(');
        }
    }

    fn infix(&mut self, index: usize, _position: usize) {
        self.newick.push(',');
        if self.format.line_breaks {
            self.newick.push('\n');
        }
        if self.format.node_ids {
            let info = self.id_info(index);
            self.newick.push_str(&format!("[=== {}]", info));
        }
    }

    fn postfix(&mut self, index: usize) {
        let tree = self.tree;
        if !tree.is_leaf(index) {
            self.newick.push(')');
        }

        let name = tree.name(index);
        if tree.is_leaf(index) || name.is_some() {
            self.newick.push_str(&format_name(name, self.format.always_quote));
        }

        if self.show_lengths && !tree.is_root(index) {
            self.newick.push(':');
            let length = to_ieee_format(tree.length(index), self.format.decimals, self.format.too_short);
            self.newick.push_str(&length);
        }

        if self.format.node_ids {
            let info = self.id_info(index);
            self.newick.push_str(&format!("[>>> {}]", info));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;

    #[test]
    fn test_to_ieee_format_rounding() {
        assert_eq!(to_ieee_format(0.0016, 3, 1e-8), "0.002");
        assert_eq!(to_ieee_format(0.0004, 3, 1e-8), "0");
        assert_eq!(to_ieee_format(12.3456, 1, 1e-8), "12.3");
        assert_eq!(to_ieee_format(0.0, 3, 1e-8), "0");
        assert_eq!(to_ieee_format(f64::NAN, 3, 1e-8), "NaN");
        assert_eq!(to_ieee_format(f64::NEG_INFINITY, 3, 1e-8), "-Inf");
    }

    #[test]
    fn test_to_ieee_format_too_short() {
        let written: f64 = to_ieee_format(1e-12, 3, 1e-8).parse().unwrap();
        assert!(written > 0.0 && written < 1e-8);
    }

    #[test]
    fn test_format_name_reserved_chars() {
        assert_eq!(format_name(Some("a,b"), false), "'a,b'");
        assert_eq!(format_name(Some("x[1]"), false), "'x[1]'");
        assert_eq!(format_name(Some("plain"), true), "'plain'");
        assert_eq!(format_name(Some("a_b"), false), "'a_b'");
        assert_eq!(format_name(None, false), "");
    }

    #[test]
    fn test_no_lengths_when_tree_has_none() {
        let tree = parse_str("((A,B),C);").unwrap();
        assert_eq!(newick_tree(&tree, &NewickFormat::default()), "((A,B),C);");
    }

    #[test]
    fn test_line_breaks_and_node_ids() {
        let tree = parse_str("(A,B);").unwrap();
        let format = NewickFormat {
            line_breaks: true,
            node_ids: true,
            ..NewickFormat::default()
        };
        assert_eq!(
            newick_tree(&tree, &format),
            "[<<< N2]([<<< L0]A[>>> L0],\n[=== N2][<<< L1]B[>>> L1])[>>> N2];"
        );
    }

    #[test]
    fn test_empty_tree() {
        let tree = parse_str(";").unwrap();
        assert_eq!(newick_tree(&tree, &NewickFormat::default()), ";");
    }

    #[test]
    fn test_written_tree_parses_back() {
        let input = "(('it''s':0.5,'a b':1.25)inner:2,(C:1,D:1,E:1):0.75)root;";
        let tree = parse_str(input).unwrap();
        let written = newick_tree(&tree, &NewickFormat::default());
        let reparsed = parse_str(&written).unwrap();
        assert_eq!(newick_tree(&reparsed, &NewickFormat::default()), written);
        assert_eq!(reparsed.name(0), Some("it's"));
        assert_eq!(reparsed.length(1), 1.25);
    }
}
