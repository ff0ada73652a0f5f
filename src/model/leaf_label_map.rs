//! Leaf label module: mapping between leaf names and leaf indices.
//!
//! - `LeafLabelMap`: lookup of leaves by (normalized) name, used to line up
//!   name-keyed inputs, such as family size tables, with a tree.

use crate::model::indexed_tree::IndexedTree;
use std::collections::HashMap;
use std::fmt;

/// Index of a leaf in its tree.
pub type LabelIndex = usize;

/// Problems lining up leaf names with a tree.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    #[error("Leaf {0} has no name")]
    UnnamedLeaf(LabelIndex),
    #[error("Leaf name '{0}' is not unique")]
    DuplicateLabel(String),
    #[error("No leaf is named '{0}'")]
    UnknownLabel(String),
}

/// Normalizes a leaf name the way unquoted Newick names are read:
/// underscores become spaces.
///
/// # Example
/// ```
/// use phylocount::model::leaf_label_map::normalize_label;
///
/// assert_eq!(normalize_label("Gallus_gallus"), "Gallus gallus");
/// ```
pub fn normalize_label(label: &str) -> String {
    label.replace('_', " ")
}

// =#========================================================================#=
// LEAF LABEL MAP
// =#========================================================================#=
/// Maps leaf labels (strings) to the leaf indices of a tree.
///
/// Labels are compared after normalization, so `Gallus_gallus` and
/// `Gallus gallus` are the same label.
///
/// # Example
/// ```
/// use phylocount::model::leaf_label_map::LeafLabelMap;
/// use phylocount::newick::parse_str;
///
/// let tree = parse_str("((Gallus_gallus,Meleagris_gallopavo),Anas_platyrhynchos);").unwrap();
/// let labels = LeafLabelMap::from_tree(&tree).unwrap();
///
/// assert_eq!(labels.get_index("Meleagris gallopavo"), Some(1));
/// assert_eq!(labels.get_index("Anas_platyrhynchos"), Some(2));
/// assert_eq!(labels.get_label(0), Some("Gallus gallus"));
/// ```
#[derive(Debug, Clone)]
pub struct LeafLabelMap {
    /// Normalized labels in leaf index order
    labels: Vec<String>,
    /// Map from normalized label to its leaf index
    map: HashMap<String, LabelIndex>,
}

impl LeafLabelMap {
    /// Collects the leaf names of a tree.
    ///
    /// # Errors
    /// * [LabelError::UnnamedLeaf] if a leaf has no name
    /// * [LabelError::DuplicateLabel] if two leaves share a normalized name
    pub fn from_tree<T: IndexedTree + ?Sized>(tree: &T) -> Result<Self, LabelError> {
        let num_leaves = tree.num_leaves();
        let mut labels = Vec::with_capacity(num_leaves);
        let mut map = HashMap::with_capacity(num_leaves);

        for leaf in 0..num_leaves {
            let name = tree.name(leaf).ok_or(LabelError::UnnamedLeaf(leaf))?;
            let label = normalize_label(name);
            if map.insert(label.clone(), leaf).is_some() {
                return Err(LabelError::DuplicateLabel(label));
            }
            labels.push(label);
        }

        Ok(LeafLabelMap { labels, map })
    }

    /// Retrieves the leaf index for a given label.
    ///
    /// # Arguments
    /// * `label` - The label to look up, normalized before lookup
    ///
    /// # Returns
    /// `Some(index)` if the label exists, `None` otherwise
    pub fn get_index(&self, label: &str) -> Option<LabelIndex> {
        self.map.get(&normalize_label(label)).copied()
    }

    /// Retrieves the (normalized) leaf label for a given index.
    ///
    /// # Returns
    /// `Some(&str)` if the index is valid, `None` otherwise
    pub fn get_label(&self, index: LabelIndex) -> Option<&str> {
        self.labels.get(index).map(|s| s.as_str())
    }

    /// Checks if a label exists in the map.
    pub fn contains_label(&self, label: &str) -> bool {
        self.get_index(label).is_some()
    }

    /// Returns the number of labels, i.e. the number of leaves.
    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Returns reference to the labels in leaf index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Lines up name-keyed rows with the leaves.
    ///
    /// Leaves without a row get `None`; a later row for the same leaf
    /// replaces an earlier one.
    ///
    /// # Errors
    /// [LabelError::UnknownLabel] for a row naming no leaf.
    ///
    /// # Example
    /// ```
    /// use phylocount::model::leaf_label_map::LeafLabelMap;
    /// use phylocount::newick::parse_str;
    ///
    /// let tree = parse_str("(Pica_pica,Corvus_corax,Garrulus_glandarius);").unwrap();
    /// let labels = LeafLabelMap::from_tree(&tree).unwrap();
    ///
    /// let sizes = labels.arrange([("Corvus corax", 3), ("Pica_pica", 1)]).unwrap();
    /// assert_eq!(sizes, vec![Some(1), Some(3), None]);
    /// ```
    pub fn arrange<S, V, I>(&self, rows: I) -> Result<Vec<Option<V>>, LabelError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, V)>,
    {
        let mut arranged: Vec<Option<V>> = std::iter::repeat_with(|| None).take(self.num_labels()).collect();
        for (label, value) in rows {
            let label = label.as_ref();
            let index = self
                .get_index(label)
                .ok_or_else(|| LabelError::UnknownLabel(label.to_string()))?;
            arranged[index] = Some(value);
        }
        Ok(arranged)
    }
}

impl fmt::Display for LeafLabelMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "LeafLabelMap ({} labels):", self.labels.len())?;
        for (idx, label) in self.labels.iter().enumerate() {
            writeln!(f, "  [{}] {}", idx, label)?;
        }
        Ok(())
    }
}

impl std::ops::Index<LabelIndex> for LeafLabelMap {
    type Output = str;

    fn index(&self, index: LabelIndex) -> &Self::Output {
        &self.labels[index]
    }
}
