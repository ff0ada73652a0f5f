//! Rate variation across families: a finite mixture of scaled models.
//!
//! Each of duplication, loss, gain and length gets its own discretization:
//! `k` gamma categories with shape α and mean 1, and (except for length) a
//! forbidden category with multiplier 0. A rate class picks one category
//! per dimension; its model is the main model scaled by the four
//! multipliers, and its prior probability is the product of the four
//! category probabilities.
//!
//! Classes are numbered in mixed radix with duplication varying fastest:
//!
//! ```text
//! class = dup + nd·(loss + nl·(gain + ng·length))
//! ```
//!
//! where `nd`, `nl`, `ng` count the forbidden category.

use crate::rates::discrete_gamma::partition_means;
use crate::rates::error::VariationError;
use crate::rates::model::TreeWithRates;
use crate::rates::scaled::{ScaledModel, Scaling};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// =#========================================================================#=
// RATE DIMENSION
// =#========================================================================#=
/// The four quantities that vary across rate classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateDimension {
    Duplication,
    Loss,
    Gain,
    Length,
}

impl RateDimension {
    /// Order of `|variation` lines in rate files
    pub const FILE_ORDER: [RateDimension; 4] = [
        RateDimension::Loss,
        RateDimension::Duplication,
        RateDimension::Gain,
        RateDimension::Length,
    ];

    /// Name in rate files.
    pub fn name(&self) -> &'static str {
        match self {
            RateDimension::Duplication => "duplication",
            RateDimension::Loss => "loss",
            RateDimension::Gain => "gain",
            RateDimension::Length => "length",
        }
    }

    /// Whether the dimension has a forbidden (multiplier 0) category.
    pub fn has_forbidden(&self) -> bool {
        !matches!(self, RateDimension::Length)
    }
}

impl fmt::Display for RateDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RateDimension {
    type Err = String;

    /// Parses a rate-file name; `transfer` is accepted for gain.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "duplication" => Ok(RateDimension::Duplication),
            "loss" => Ok(RateDimension::Loss),
            "gain" | "transfer" => Ok(RateDimension::Gain),
            "length" => Ok(RateDimension::Length),
            _ => Err(s.to_string()),
        }
    }
}

// =#========================================================================#=
// DISCRETIZATION (one dimension)
// =#========================================================================#=
#[derive(Debug, Clone, PartialEq)]
struct Discretization {
    dimension: RateDimension,
    alpha: f64,
    forbidden: f64,
    /// Gamma category means, followed by 0 for the forbidden category
    multipliers: Vec<f64>,
}

impl Discretization {
    /// No variation: a single category with multiplier 1.
    fn none(dimension: RateDimension) -> Self {
        let mut multipliers = vec![1.0];
        if dimension.has_forbidden() {
            multipliers.push(0.0);
        }
        Self {
            dimension,
            alpha: 1.0,
            forbidden: 0.0,
            multipliers,
        }
    }

    fn num_gamma_categories(&self) -> usize {
        self.multipliers.len() - usize::from(self.dimension.has_forbidden())
    }

    /// Number of categories, counting the forbidden one.
    fn num_slots(&self) -> usize {
        self.multipliers.len()
    }

    fn set_gamma(&mut self, k: usize, alpha: f64) -> Result<(), VariationError> {
        if k == 0 {
            return Err(VariationError::NoCategories(self.dimension));
        }
        let mut multipliers = partition_means(alpha, k).ok_or(VariationError::InvalidShape {
            dimension: self.dimension,
            alpha,
        })?;
        if self.dimension.has_forbidden() {
            multipliers.push(0.0);
        }
        self.alpha = alpha;
        self.multipliers = multipliers;
        Ok(())
    }

    fn probability(&self, slot: usize) -> f64 {
        let k = self.num_gamma_categories();
        if slot < k {
            (1.0 - self.forbidden) / k as f64
        } else {
            self.forbidden
        }
    }
}

// =#========================================================================#=
// RATE CLASS
// =#========================================================================#=
/// Category indices of a rate class, one per dimension.
///
/// For duplication, loss and gain, the index one past the last gamma
/// category is the forbidden category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateClass {
    pub duplication: usize,
    pub loss: usize,
    pub gain: usize,
    pub length: usize,
}

// =#========================================================================#=
// RATE VARIATION
// =#========================================================================$=
/// Rate classes over a shared main model.
///
/// Changing the number of categories of a dimension rebuilds the class
/// table; changing only the shape or a forbidden probability refreshes it
/// in place.
///
/// # Example
/// ```
/// use phylocount::newick::parse_str;
/// use phylocount::rates::{BirthDeathModel, RateDimension, RateVariation, TreeWithRates};
///
/// let model = TreeWithRates::new(parse_str("(A:1,B:1);").unwrap());
/// let mut variation = RateVariation::new(model);
/// variation.set_discretization_loss(3, 0.5).unwrap();
/// variation.set_forbidden_gain(0.1).unwrap();
///
/// // (1 + 1) duplication x (3 + 1) loss x (1 + 1) gain x 1 length
/// assert_eq!(variation.num_classes(), 16);
/// let total: f64 = (0..16).map(|c| variation.class_probability(c).unwrap()).sum();
/// assert!((total - 1.0).abs() < 1e-12);
///
/// // class 2 is in the second loss category
/// let class_model = variation.class_model(2).unwrap();
/// let multiplier = variation.multipliers(RateDimension::Loss)[1];
/// assert_eq!(class_model.loss_rate(0), variation.main_model().loss_rate(0) * multiplier);
/// ```
#[derive(Debug, Clone)]
pub struct RateVariation {
    main: TreeWithRates,
    duplication: Discretization,
    loss: Discretization,
    gain: Discretization,
    length: Discretization,
    class_scalings: Vec<Scaling>,
    class_probabilities: Vec<f64>,
}

impl RateVariation {
    /// Creates rate variation without any variation: every dimension has
    /// one gamma category and forbidden probability 0.
    pub fn new(main: TreeWithRates) -> Self {
        let mut variation = Self {
            main,
            duplication: Discretization::none(RateDimension::Duplication),
            loss: Discretization::none(RateDimension::Loss),
            gain: Discretization::none(RateDimension::Gain),
            length: Discretization::none(RateDimension::Length),
            class_scalings: Vec::new(),
            class_probabilities: Vec::new(),
        };
        variation.rebuild_classes();
        variation
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Sets the number of gamma categories and the gamma shape of a dimension.
    ///
    /// # Errors
    /// * [VariationError::NoCategories] if `k` is 0
    /// * [VariationError::InvalidShape] if `alpha` is not positive and finite
    pub fn set_discretization(&mut self, dimension: RateDimension, k: usize, alpha: f64) -> Result<(), VariationError> {
        let discretization = self.discretization_mut(dimension);
        let same_k = discretization.num_gamma_categories() == k;
        discretization.set_gamma(k, alpha)?;
        if same_k {
            self.update_class_scalings();
        } else {
            self.rebuild_classes();
        }
        Ok(())
    }

    pub fn set_discretization_duplication(&mut self, k: usize, alpha: f64) -> Result<(), VariationError> {
        self.set_discretization(RateDimension::Duplication, k, alpha)
    }

    pub fn set_discretization_loss(&mut self, k: usize, alpha: f64) -> Result<(), VariationError> {
        self.set_discretization(RateDimension::Loss, k, alpha)
    }

    pub fn set_discretization_gain(&mut self, k: usize, alpha: f64) -> Result<(), VariationError> {
        self.set_discretization(RateDimension::Gain, k, alpha)
    }

    pub fn set_discretization_length(&mut self, k: usize, alpha: f64) -> Result<(), VariationError> {
        self.set_discretization(RateDimension::Length, k, alpha)
    }

    /// Sets the probability of the forbidden category of a dimension.
    ///
    /// # Errors
    /// * [VariationError::NoForbiddenCategory] for [RateDimension::Length]
    /// * [VariationError::InvalidForbidden] if `p` is not in [0, 1]
    pub fn set_forbidden(&mut self, dimension: RateDimension, p: f64) -> Result<(), VariationError> {
        if !dimension.has_forbidden() {
            return Err(VariationError::NoForbiddenCategory(dimension));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(VariationError::InvalidForbidden { dimension, p });
        }
        self.discretization_mut(dimension).forbidden = p;
        self.update_class_probabilities();
        self.update_class_scalings();
        Ok(())
    }

    pub fn set_forbidden_duplication(&mut self, p: f64) -> Result<(), VariationError> {
        self.set_forbidden(RateDimension::Duplication, p)
    }

    pub fn set_forbidden_loss(&mut self, p: f64) -> Result<(), VariationError> {
        self.set_forbidden(RateDimension::Loss, p)
    }

    pub fn set_forbidden_gain(&mut self, p: f64) -> Result<(), VariationError> {
        self.set_forbidden(RateDimension::Gain, p)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Number of gamma categories (without the forbidden one).
    pub fn num_gamma_categories(&self, dimension: RateDimension) -> usize {
        self.discretization(dimension).num_gamma_categories()
    }

    /// Gamma shape of a dimension.
    pub fn alpha(&self, dimension: RateDimension) -> f64 {
        self.discretization(dimension).alpha
    }

    /// Forbidden probability of a dimension (0 for length).
    pub fn forbidden(&self, dimension: RateDimension) -> f64 {
        self.discretization(dimension).forbidden
    }

    /// Multipliers of the categories of a dimension, forbidden one last.
    pub fn multipliers(&self, dimension: RateDimension) -> &[f64] {
        &self.discretization(dimension).multipliers
    }

    /// Number of rate classes.
    pub fn num_classes(&self) -> usize {
        self.class_probabilities.len()
    }

    /// Decodes a class index into its categories.
    ///
    /// # Errors
    /// [VariationError::ClassOutOfRange] for an unknown class.
    pub fn class_indices(&self, class: usize) -> Result<RateClass, VariationError> {
        self.check_class(class)?;
        Ok(self.decode(class))
    }

    /// Prior probability of a class.
    ///
    /// # Errors
    /// [VariationError::ClassOutOfRange] for an unknown class.
    pub fn class_probability(&self, class: usize) -> Result<f64, VariationError> {
        self.check_class(class)?;
        Ok(self.class_probabilities[class])
    }

    /// Whether a class has positive prior probability.
    pub fn is_pertinent_class(&self, class: usize) -> bool {
        self.class_probabilities.get(class).is_some_and(|&p| p > 0.0)
    }

    /// Multipliers of a class.
    ///
    /// # Errors
    /// [VariationError::ClassOutOfRange] for an unknown class.
    pub fn class_scaling(&self, class: usize) -> Result<Scaling, VariationError> {
        self.check_class(class)?;
        Ok(self.class_scalings[class])
    }

    /// Model of a class: the main model with the class multipliers.
    ///
    /// # Errors
    /// [VariationError::ClassOutOfRange] for an unknown class.
    pub fn class_model(&self, class: usize) -> Result<ScaledModel<&TreeWithRates>, VariationError> {
        let scaling = self.class_scaling(class)?;
        Ok(ScaledModel::new(&self.main).with_scaling(scaling))
    }

    /// The shared main model.
    pub fn main_model(&self) -> &TreeWithRates {
        &self.main
    }

    /// Mutable access to the main model; class models see the changes.
    pub fn main_model_mut(&mut self) -> &mut TreeWithRates {
        &mut self.main
    }

    /// Consumes the rate variation and returns the main model.
    pub fn into_main_model(self) -> TreeWithRates {
        self.main
    }

    // ------------------------------------------------------------------------
    // Class table
    // ------------------------------------------------------------------------

    fn discretization(&self, dimension: RateDimension) -> &Discretization {
        match dimension {
            RateDimension::Duplication => &self.duplication,
            RateDimension::Loss => &self.loss,
            RateDimension::Gain => &self.gain,
            RateDimension::Length => &self.length,
        }
    }

    fn discretization_mut(&mut self, dimension: RateDimension) -> &mut Discretization {
        match dimension {
            RateDimension::Duplication => &mut self.duplication,
            RateDimension::Loss => &mut self.loss,
            RateDimension::Gain => &mut self.gain,
            RateDimension::Length => &mut self.length,
        }
    }

    fn check_class(&self, class: usize) -> Result<(), VariationError> {
        if class < self.num_classes() {
            Ok(())
        } else {
            Err(VariationError::ClassOutOfRange {
                class,
                num_classes: self.num_classes(),
            })
        }
    }

    fn decode(&self, class: usize) -> RateClass {
        let nd = self.duplication.num_slots();
        let nl = self.loss.num_slots();
        let ng = self.gain.num_slots();
        RateClass {
            duplication: class % nd,
            loss: (class / nd) % nl,
            gain: (class / (nd * nl)) % ng,
            length: class / (nd * nl * ng),
        }
    }

    fn rebuild_classes(&mut self) {
        let num_classes =
            self.duplication.num_slots() * self.loss.num_slots() * self.gain.num_slots() * self.length.num_slots();
        self.class_scalings = vec![Scaling::default(); num_classes];
        self.class_probabilities = vec![0.0; num_classes];
        self.update_class_probabilities();
        self.update_class_scalings();
        debug!(num_classes, "Rebuilt rate classes");
    }

    fn update_class_probabilities(&mut self) {
        for class in 0..self.class_probabilities.len() {
            let c = self.decode(class);
            self.class_probabilities[class] = self.duplication.probability(c.duplication)
                * self.loss.probability(c.loss)
                * self.gain.probability(c.gain)
                * self.length.probability(c.length);
        }
    }

    fn update_class_scalings(&mut self) {
        for class in 0..self.class_scalings.len() {
            let c = self.decode(class);
            self.class_scalings[class] = Scaling {
                duplication: self.duplication.multipliers[c.duplication],
                loss: self.loss.multipliers[c.loss],
                gain: self.gain.multipliers[c.gain],
                length: self.length.multipliers[c.length],
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;
    use approx::assert_abs_diff_eq;

    fn variation() -> RateVariation {
        RateVariation::new(TreeWithRates::new(parse_str("((A:1,B:1):1,C:2);").unwrap()))
    }

    #[test]
    fn test_no_variation() {
        let v = variation();
        // forbidden categories still count as classes, with probability 0
        assert_eq!(v.num_classes(), 8);
        assert_eq!(v.class_probability(0), Ok(1.0));
        assert!((1..8).all(|c| !v.is_pertinent_class(c)));
        assert_eq!(v.class_scaling(0), Ok(Scaling::default()));
    }

    #[test]
    fn test_class_decoding() {
        let mut v = variation();
        v.set_discretization_duplication(2, 1.0).unwrap();
        v.set_discretization_length(2, 1.0).unwrap();
        // nd = 3, nl = 2, ng = 2, nlen = 2
        assert_eq!(v.num_classes(), 24);
        assert_eq!(
            v.class_indices(3 * 2 * 2 + 3 * 1 + 2).unwrap(),
            RateClass {
                duplication: 2,
                loss: 1,
                gain: 0,
                length: 1
            }
        );
        assert!(v.class_indices(24).is_err());
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let mut v = variation();
        v.set_discretization_duplication(3, 0.7).unwrap();
        v.set_discretization_loss(2, 1.5).unwrap();
        v.set_discretization_length(4, 0.3).unwrap();
        v.set_forbidden_duplication(0.2).unwrap();
        v.set_forbidden_loss(0.05).unwrap();
        let total: f64 = (0..v.num_classes()).map(|c| v.class_probability(c).unwrap()).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_length_class_probability_uses_length_categories() {
        let mut v = variation();
        v.set_discretization_loss(3, 1.0).unwrap();
        v.set_discretization_length(2, 1.0).unwrap();
        // class 0: first category everywhere; loss has 3 gamma categories
        assert_abs_diff_eq!(v.class_probability(0).unwrap(), 1.0 / 3.0 * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_forbidden_class_scaling() {
        let mut v = variation();
        v.set_forbidden_gain(0.25).unwrap();
        // gain slot 1 is forbidden: class = 0 + 2 * (0 + 2 * 1)
        assert_eq!(v.class_probability(4), Ok(0.25));
        assert_eq!(v.class_scaling(4).unwrap().gain, 0.0);
    }

    #[test]
    fn test_same_k_refreshes_multipliers_only() {
        let mut v = variation();
        v.set_discretization_gain(2, 1.0).unwrap();
        let before = v.class_scaling(0).unwrap().gain;
        v.set_discretization_gain(2, 5.0).unwrap();
        assert_eq!(v.num_classes(), 2 * 2 * 3);
        assert!(v.class_scaling(0).unwrap().gain > before);
        assert_eq!(v.alpha(RateDimension::Gain), 5.0);
    }

    #[test]
    fn test_invalid_settings() {
        let mut v = variation();
        assert_eq!(
            v.set_discretization_loss(0, 1.0),
            Err(VariationError::NoCategories(RateDimension::Loss))
        );
        assert!(matches!(
            v.set_discretization_gain(2, -1.0),
            Err(VariationError::InvalidShape { .. })
        ));
        assert!(matches!(
            v.set_forbidden_loss(1.5),
            Err(VariationError::InvalidForbidden { .. })
        ));
        assert_eq!(
            v.set_forbidden(RateDimension::Length, 0.1),
            Err(VariationError::NoForbiddenCategory(RateDimension::Length))
        );
        // failed settings leave the classes alone
        assert_eq!(v.num_classes(), 8);
    }
}
