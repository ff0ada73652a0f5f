//! Birth-death model with all rates and lengths multiplied by constants.

use crate::model::phylogeny::Phylogeny;
use crate::rates::distribution::Distribution;
use crate::rates::model::BirthDeathModel;
use std::fmt;

/// Multipliers for the four quantities of a birth-death model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub gain: f64,
    pub loss: f64,
    pub duplication: f64,
    pub length: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            gain: 1.0,
            loss: 1.0,
            duplication: 1.0,
            length: 1.0,
        }
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "length x{:.4}, duplication x{:.4}, loss x{:.4}, gain x{:.4}",
            self.length, self.duplication, self.loss, self.gain
        )
    }
}

/// View of a [BirthDeathModel] with scaled rates and lengths.
///
/// The underlying model is not copied: `M` is usually a reference or an
/// `Rc`. The root distribution is taken over from the underlying model at
/// construction.
///
/// # Example
/// ```
/// use phylocount::newick::parse_str;
/// use phylocount::rates::{BirthDeathModel, ScaledModel, TreeWithRates};
///
/// let model = TreeWithRates::new(parse_str("(A:1,B:1);").unwrap());
/// let mut scaled = ScaledModel::new(&model);
/// scaled.set_loss_multiplier(3.0);
///
/// assert_eq!(scaled.loss_rate(0), 3.0);
/// assert_eq!(scaled.gain_rate(0), model.gain_rate(0));
/// ```
#[derive(Debug, Clone)]
pub struct ScaledModel<M: BirthDeathModel> {
    model: M,
    scaling: Scaling,
    root_distribution: Option<Distribution>,
}

impl<M: BirthDeathModel> ScaledModel<M> {
    /// Wraps a model with all multipliers 1.
    pub fn new(model: M) -> Self {
        let root_distribution = model.root_distribution().copied();
        Self {
            model,
            scaling: Scaling::default(),
            root_distribution,
        }
    }

    /// Replaces all multipliers.
    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn set_gain_multiplier(&mut self, multiplier: f64) {
        self.scaling.gain = multiplier;
    }

    pub fn set_loss_multiplier(&mut self, multiplier: f64) {
        self.scaling.loss = multiplier;
    }

    pub fn set_duplication_multiplier(&mut self, multiplier: f64) {
        self.scaling.duplication = multiplier;
    }

    pub fn set_length_multiplier(&mut self, multiplier: f64) {
        self.scaling.length = multiplier;
    }

    /// Current multipliers.
    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    /// The underlying model.
    pub fn base(&self) -> &M {
        &self.model
    }
}

impl<M: BirthDeathModel> BirthDeathModel for ScaledModel<M> {
    fn tree(&self) -> &Phylogeny {
        self.model.tree()
    }

    fn gain_rate(&self, edge: usize) -> f64 {
        self.model.gain_rate(edge) * self.scaling.gain
    }

    fn loss_rate(&self, edge: usize) -> f64 {
        self.model.loss_rate(edge) * self.scaling.loss
    }

    fn duplication_rate(&self, edge: usize) -> f64 {
        self.model.duplication_rate(edge) * self.scaling.duplication
    }

    fn edge_length(&self, edge: usize) -> f64 {
        self.model.edge_length(edge) * self.scaling.length
    }

    fn has_lineage_specific_gain(&self) -> bool {
        self.model.has_lineage_specific_gain()
    }

    fn has_lineage_specific_loss(&self) -> bool {
        self.model.has_lineage_specific_loss()
    }

    fn has_lineage_specific_duplication(&self) -> bool {
        self.model.has_lineage_specific_duplication()
    }

    fn has_lineage_specific_length(&self) -> bool {
        self.model.has_lineage_specific_length()
    }

    fn root_distribution(&self) -> Option<&Distribution> {
        self.root_distribution.as_ref()
    }
}
