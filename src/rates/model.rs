//! Linear birth-death models with immigration over a phylogeny.
//!
//! Every non-root node `e` stands for the edge above it and carries a gain
//! (immigration) rate, a duplication (birth) rate, a loss (death) rate and
//! a length. [BirthDeathModel] is the read-only view consumed by the
//! transient calculations; [TreeWithRates] is the editable model.

use crate::model::indexed_tree::IndexedTree;
use crate::model::phylogeny::Phylogeny;
use crate::model::traversal::scaled_depths;
use crate::rates::distribution::Distribution;
use crate::rates::error::ModelError;
use std::rc::Rc;
use tracing::debug;

/// Default gain rate
pub const DEFAULT_GAIN_RATE: f64 = 0.2;
/// Default loss rate
pub const DEFAULT_LOSS_RATE: f64 = 1.0;
/// Default duplication rate
pub const DEFAULT_DUPLICATION_RATE: f64 = 0.5;

// =#========================================================================#=
// BIRTH-DEATH MODEL (trait)
// =#========================================================================T=
/// Per-edge rates and lengths of a birth-death model.
///
/// Edges are addressed by the index of their lower node.
pub trait BirthDeathModel {
    /// The phylogeny the rates live on.
    fn tree(&self) -> &Phylogeny;

    fn gain_rate(&self, edge: usize) -> f64;

    fn loss_rate(&self, edge: usize) -> f64;

    fn duplication_rate(&self, edge: usize) -> f64;

    fn edge_length(&self, edge: usize) -> f64;

    fn has_lineage_specific_gain(&self) -> bool;

    fn has_lineage_specific_loss(&self) -> bool;

    fn has_lineage_specific_duplication(&self) -> bool;

    fn has_lineage_specific_length(&self) -> bool;

    /// Family size distribution at the root, if the model has one.
    fn root_distribution(&self) -> Option<&Distribution>;
}

macro_rules! forward_birth_death_model {
    ($($wrapper:ty),*) => {
        $(
            impl<M: BirthDeathModel + ?Sized> BirthDeathModel for $wrapper {
                fn tree(&self) -> &Phylogeny {
                    (**self).tree()
                }
                fn gain_rate(&self, edge: usize) -> f64 {
                    (**self).gain_rate(edge)
                }
                fn loss_rate(&self, edge: usize) -> f64 {
                    (**self).loss_rate(edge)
                }
                fn duplication_rate(&self, edge: usize) -> f64 {
                    (**self).duplication_rate(edge)
                }
                fn edge_length(&self, edge: usize) -> f64 {
                    (**self).edge_length(edge)
                }
                fn has_lineage_specific_gain(&self) -> bool {
                    (**self).has_lineage_specific_gain()
                }
                fn has_lineage_specific_loss(&self) -> bool {
                    (**self).has_lineage_specific_loss()
                }
                fn has_lineage_specific_duplication(&self) -> bool {
                    (**self).has_lineage_specific_duplication()
                }
                fn has_lineage_specific_length(&self) -> bool {
                    (**self).has_lineage_specific_length()
                }
                fn root_distribution(&self) -> Option<&Distribution> {
                    (**self).root_distribution()
                }
            }
        )*
    };
}

forward_birth_death_model!(&M, Rc<M>);

// =#========================================================================#=
// EDGE VALUES
// =#========================================================================#=
/// One quantity over all edges: a common value, or one value per edge once
/// an edge was set individually.
#[derive(Debug, Clone, PartialEq)]
struct EdgeValues {
    common: f64,
    per_edge: Option<Vec<f64>>,
}

impl EdgeValues {
    fn uniform(value: f64) -> Self {
        Self {
            common: value,
            per_edge: None,
        }
    }

    fn get(&self, edge: usize) -> f64 {
        match &self.per_edge {
            Some(values) => values[edge],
            None => self.common,
        }
    }

    fn set_all(&mut self, value: f64) {
        self.common = value;
        self.per_edge = None;
    }

    fn set(&mut self, edge: usize, value: f64, num_edges: usize) -> Result<(), ModelError> {
        if edge >= num_edges {
            return Err(ModelError::EdgeOutOfRange { edge, num_edges });
        }
        let common = self.common;
        let values = self.per_edge.get_or_insert_with(|| vec![common; num_edges]);
        values[edge] = value;
        Ok(())
    }

    fn is_lineage_specific(&self) -> bool {
        self.per_edge.is_some()
    }
}

// =#========================================================================#=
// TREE WITH RATES
// =#========================================================================$=
/// Birth-death model with its own rates on every edge of a phylogeny.
///
/// Each quantity is either common to all edges or lineage-specific. Setting
/// a single edge makes the quantity lineage-specific (the other edges keep
/// the previous common value); setting a common value drops the per-edge
/// values.
///
/// # Example
/// ```
/// use phylocount::newick::parse_str;
/// use phylocount::rates::{BirthDeathModel, TreeWithRates};
///
/// let tree = parse_str("((A:20,B:20):10,C:30);").unwrap();
/// let mut model = TreeWithRates::new(tree);
///
/// // Lengths are scaled so that the deepest leaf sits at depth 3
/// assert_eq!(model.edge_length(0), 2.0);
/// assert_eq!(model.gain_rate(0), 0.2);
///
/// model.set_edge_gain_rate(1, 0.7).unwrap();
/// assert!(model.has_lineage_specific_gain());
/// assert_eq!(model.gain_rate(0), 0.2);
/// assert_eq!(model.gain_rate(1), 0.7);
/// ```
#[derive(Debug, Clone)]
pub struct TreeWithRates {
    tree: Phylogeny,
    gain: EdgeValues,
    loss: EdgeValues,
    duplication: EdgeValues,
    length: EdgeValues,
    root_distribution: Option<Distribution>,
}

impl TreeWithRates {
    /// Creates a model with default rates over the given tree.
    ///
    /// Edge lengths are taken from the tree, multiplied by the power of ten
    /// that brings the maximal root-to-leaf depth into [1, 10).
    pub fn new(tree: Phylogeny) -> Self {
        let factor = edge_normalizing_factor(&tree);
        let num_edges = tree.num_edges();

        let mut length = EdgeValues::uniform(1.0);
        if num_edges > 0 {
            length.per_edge = Some((0..num_edges).map(|edge| tree.length(edge) * factor).collect());
        }
        debug!(num_edges, factor, "Initialized edge lengths");

        Self {
            tree,
            gain: EdgeValues::uniform(DEFAULT_GAIN_RATE),
            loss: EdgeValues::uniform(DEFAULT_LOSS_RATE),
            duplication: EdgeValues::uniform(DEFAULT_DUPLICATION_RATE),
            length,
            root_distribution: None,
        }
    }

    /// Consumes the model and returns the tree.
    pub fn into_tree(self) -> Phylogeny {
        self.tree
    }

    /// Sets the gain rate of all edges.
    pub fn set_gain_rate(&mut self, rate: f64) {
        self.gain.set_all(rate);
    }

    /// Sets the loss rate of all edges.
    pub fn set_loss_rate(&mut self, rate: f64) {
        self.loss.set_all(rate);
    }

    /// Sets the duplication rate of all edges.
    pub fn set_duplication_rate(&mut self, rate: f64) {
        self.duplication.set_all(rate);
    }

    /// Sets the length of all edges.
    pub fn set_length(&mut self, length: f64) {
        self.length.set_all(length);
    }

    /// Sets the gain rate of one edge.
    ///
    /// # Errors
    /// [ModelError::EdgeOutOfRange] if `edge` is not an edge of the tree.
    pub fn set_edge_gain_rate(&mut self, edge: usize, rate: f64) -> Result<(), ModelError> {
        let num_edges = self.tree.num_edges();
        self.gain.set(edge, rate, num_edges)
    }

    /// Sets the loss rate of one edge.
    ///
    /// # Errors
    /// [ModelError::EdgeOutOfRange] if `edge` is not an edge of the tree.
    pub fn set_edge_loss_rate(&mut self, edge: usize, rate: f64) -> Result<(), ModelError> {
        let num_edges = self.tree.num_edges();
        self.loss.set(edge, rate, num_edges)
    }

    /// Sets the duplication rate of one edge.
    ///
    /// # Errors
    /// [ModelError::EdgeOutOfRange] if `edge` is not an edge of the tree.
    pub fn set_edge_duplication_rate(&mut self, edge: usize, rate: f64) -> Result<(), ModelError> {
        let num_edges = self.tree.num_edges();
        self.duplication.set(edge, rate, num_edges)
    }

    /// Sets the length of one edge.
    ///
    /// # Errors
    /// [ModelError::EdgeOutOfRange] if `edge` is not an edge of the tree.
    pub fn set_edge_length(&mut self, edge: usize, length: f64) -> Result<(), ModelError> {
        let num_edges = self.tree.num_edges();
        self.length.set(edge, length, num_edges)
    }

    /// Sets (or removes) the family size distribution at the root.
    pub fn set_root_distribution(&mut self, distribution: Option<Distribution>) {
        self.root_distribution = distribution;
    }
}

/// Power of ten bringing the maximal leaf depth into [1, 10).
///
/// Trees without positive finite depth are left unscaled.
fn edge_normalizing_factor<T: IndexedTree + ?Sized>(tree: &T) -> f64 {
    let depths = scaled_depths(tree);
    let max_depth = depths[..tree.num_leaves()].iter().copied().fold(0.0, f64::max);
    if !(max_depth > 0.0 && max_depth.is_finite()) {
        return 1.0;
    }
    10f64.powi(-(max_depth.log10().floor() as i32))
}

impl BirthDeathModel for TreeWithRates {
    fn tree(&self) -> &Phylogeny {
        &self.tree
    }

    fn gain_rate(&self, edge: usize) -> f64 {
        self.gain.get(edge)
    }

    fn loss_rate(&self, edge: usize) -> f64 {
        self.loss.get(edge)
    }

    fn duplication_rate(&self, edge: usize) -> f64 {
        self.duplication.get(edge)
    }

    fn edge_length(&self, edge: usize) -> f64 {
        self.length.get(edge)
    }

    fn has_lineage_specific_gain(&self) -> bool {
        self.gain.is_lineage_specific()
    }

    fn has_lineage_specific_loss(&self) -> bool {
        self.loss.is_lineage_specific()
    }

    fn has_lineage_specific_duplication(&self) -> bool {
        self.duplication.is_lineage_specific()
    }

    fn has_lineage_specific_length(&self) -> bool {
        self.length.is_lineage_specific()
    }

    fn root_distribution(&self) -> Option<&Distribution> {
        self.root_distribution.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;

    #[test]
    fn test_normalizing_factor() {
        let small = parse_str("((A:0.02,B:0.02):0.01,C:0.03);").unwrap();
        assert_eq!(edge_normalizing_factor(&small), 100.0);

        let exact = parse_str("(A:1,B:0.5);").unwrap();
        assert_eq!(edge_normalizing_factor(&exact), 1.0);

        let flat = parse_str("(A:0,B:0);").unwrap();
        assert_eq!(edge_normalizing_factor(&flat), 1.0);
    }

    #[test]
    fn test_uniform_setter_drops_per_edge_values() {
        let tree = parse_str("((A,B),C);").unwrap();
        let mut model = TreeWithRates::new(tree);
        model.set_edge_loss_rate(2, 3.0).unwrap();
        assert!(model.has_lineage_specific_loss());
        assert_eq!(model.loss_rate(0), DEFAULT_LOSS_RATE);
        assert_eq!(model.loss_rate(2), 3.0);

        model.set_loss_rate(0.25);
        assert!(!model.has_lineage_specific_loss());
        assert_eq!(model.loss_rate(2), 0.25);
    }

    #[test]
    fn test_edge_out_of_range() {
        let tree = parse_str("(A,B);").unwrap();
        let mut model = TreeWithRates::new(tree);
        assert_eq!(
            model.set_edge_duplication_rate(2, 1.0),
            Err(ModelError::EdgeOutOfRange { edge: 2, num_edges: 2 })
        );
    }

    #[test]
    fn test_lengths_per_edge_without_tree_lengths() {
        // Without lengths every edge counts 1, depth 2 needs no scaling
        let tree = parse_str("((A,B),C);").unwrap();
        let model = TreeWithRates::new(tree);
        assert!(model.has_lineage_specific_length());
        for edge in 0..4 {
            assert_eq!(model.edge_length(edge), 1.0);
        }
    }
}
