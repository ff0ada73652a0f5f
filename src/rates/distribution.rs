//! Discrete distributions on family sizes.
//!
//! [Distribution] is a closed set of the distributions arising as transients
//! of a linear birth-death process, or used as root priors. The
//! [DistributionFamily] table gives each family its rate-file name and its
//! number of parameters.

use crate::rates::error::ModelError;
use statrs::function::factorial::ln_factorial;
use statrs::function::gamma::ln_gamma;
use std::fmt;

// =#========================================================================#=
// DISTRIBUTION FAMILY
// =#========================================================================#=
/// Tag of a [Distribution] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionFamily {
    Poisson,
    NegativeBinomial,
    PointMass,
    ShiftedGeometric,
}

/// (family, file-format name, number of parameters)
static FAMILIES: [(DistributionFamily, &str, usize); 4] = [
    (DistributionFamily::Poisson, "Poisson", 1),
    (DistributionFamily::NegativeBinomial, "NegativeBinomial", 2),
    (DistributionFamily::PointMass, "PointDistribution", 1),
    (DistributionFamily::ShiftedGeometric, "ShiftedGeometric", 2),
];

impl DistributionFamily {
    /// All families.
    pub const ALL: [DistributionFamily; 4] = [
        DistributionFamily::Poisson,
        DistributionFamily::NegativeBinomial,
        DistributionFamily::PointMass,
        DistributionFamily::ShiftedGeometric,
    ];

    fn entry(&self) -> &'static (DistributionFamily, &'static str, usize) {
        // FAMILIES lists every variant once, in declaration order
        &FAMILIES[*self as usize]
    }

    /// Name of the family in rate files.
    pub fn name(&self) -> &'static str {
        self.entry().1
    }

    /// Number of parameters of the family.
    pub fn num_parameters(&self) -> usize {
        self.entry().2
    }

    /// Looks up a family by its rate-file name.
    ///
    /// # Example
    /// ```
    /// use phylocount::rates::DistributionFamily;
    ///
    /// assert_eq!(DistributionFamily::from_name("PointDistribution"), Some(DistributionFamily::PointMass));
    /// assert_eq!(DistributionFamily::from_name("Binomial"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        FAMILIES
            .iter()
            .find(|(_, family_name, _)| *family_name == name)
            .map(|(family, _, _)| *family)
    }
}

impl fmt::Display for DistributionFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =#========================================================================#=
// DISTRIBUTION
// =#========================================================================€=
/// Discrete distribution on {0, 1, 2, ...}.
///
/// * `Poisson`: P(k) = e^{-λ} λ^k / k!
/// * `NegativeBinomial`: P(k) = Γ(r+k)/(Γ(r) k!) · (1-q)^r · q^k
/// * `PointMass`: P(0) = p0, P(1) = 1 - p0
/// * `ShiftedGeometric`: P(0) = p, P(k) = (1-p)(1-q) q^{k-1} for k ≥ 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    Poisson { lambda: f64 },
    NegativeBinomial { size: f64, q: f64 },
    PointMass { p0: f64 },
    ShiftedGeometric { p: f64, q: f64 },
}

impl Distribution {
    /// Builds a distribution from its family and parameters in file order.
    ///
    /// # Errors
    /// [ModelError::WrongParameterCount] if the number of parameters does not
    /// match the family.
    ///
    /// # Example
    /// ```
    /// use phylocount::rates::{Distribution, DistributionFamily};
    ///
    /// let d = Distribution::from_parameters(DistributionFamily::NegativeBinomial, &[0.4, 0.25]).unwrap();
    /// assert_eq!(d, Distribution::NegativeBinomial { size: 0.4, q: 0.25 });
    /// ```
    pub fn from_parameters(family: DistributionFamily, params: &[f64]) -> Result<Self, ModelError> {
        if params.len() != family.num_parameters() {
            return Err(ModelError::WrongParameterCount {
                family: family.name(),
                expected: family.num_parameters(),
                found: params.len(),
            });
        }
        Ok(match family {
            DistributionFamily::Poisson => Distribution::Poisson { lambda: params[0] },
            DistributionFamily::NegativeBinomial => Distribution::NegativeBinomial {
                size: params[0],
                q: params[1],
            },
            DistributionFamily::PointMass => Distribution::PointMass { p0: params[0] },
            DistributionFamily::ShiftedGeometric => Distribution::ShiftedGeometric {
                p: params[0],
                q: params[1],
            },
        })
    }

    /// Family tag of this distribution.
    pub fn family(&self) -> DistributionFamily {
        match self {
            Distribution::Poisson { .. } => DistributionFamily::Poisson,
            Distribution::NegativeBinomial { .. } => DistributionFamily::NegativeBinomial,
            Distribution::PointMass { .. } => DistributionFamily::PointMass,
            Distribution::ShiftedGeometric { .. } => DistributionFamily::ShiftedGeometric,
        }
    }

    /// Parameters in file order.
    pub fn parameters(&self) -> Vec<f64> {
        match *self {
            Distribution::Poisson { lambda } => vec![lambda],
            Distribution::NegativeBinomial { size, q } => vec![size, q],
            Distribution::PointMass { p0 } => vec![p0],
            Distribution::ShiftedGeometric { p, q } => vec![p, q],
        }
    }

    /// Probability of `k`.
    pub fn pmf(&self, k: u64) -> f64 {
        match *self {
            Distribution::Poisson { lambda } => {
                if lambda == 0.0 {
                    return if k == 0 { 1.0 } else { 0.0 };
                }
                let k_f = k as f64;
                (k_f * lambda.ln() - lambda - ln_factorial(k)).exp()
            }
            Distribution::NegativeBinomial { size, q } => {
                if q == 0.0 {
                    return if k == 0 { 1.0 } else { 0.0 };
                }
                let k_f = k as f64;
                let ln_coefficient = ln_gamma(size + k_f) - ln_gamma(size) - ln_factorial(k);
                (ln_coefficient + size * (-q).ln_1p() + k_f * q.ln()).exp()
            }
            Distribution::PointMass { p0 } => match k {
                0 => p0,
                1 => 1.0 - p0,
                _ => 0.0,
            },
            Distribution::ShiftedGeometric { p, q } => {
                if k == 0 {
                    p
                } else {
                    (1.0 - p) * (1.0 - q) * q.powi((k - 1) as i32)
                }
            }
        }
    }

    /// Probabilities of `0..n`.
    ///
    /// # Example
    /// ```
    /// use phylocount::rates::Distribution;
    ///
    /// let d = Distribution::ShiftedGeometric { p: 0.5, q: 0.5 };
    /// assert_eq!(d.pmf_range(3), vec![0.5, 0.25, 0.125]);
    /// ```
    pub fn pmf_range(&self, n: usize) -> Vec<f64> {
        (0..n as u64).map(|k| self.pmf(k)).collect()
    }

    /// Expected value.
    pub fn mean(&self) -> f64 {
        match *self {
            Distribution::Poisson { lambda } => lambda,
            Distribution::NegativeBinomial { size, q } => size * q / (1.0 - q),
            Distribution::PointMass { p0 } => 1.0 - p0,
            Distribution::ShiftedGeometric { p, q } => (1.0 - p) / (1.0 - q),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters().iter().map(|p| p.to_string()).collect();
        write!(f, "{}({})", self.family().name(), params.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn total(d: &Distribution, n: usize) -> f64 {
        d.pmf_range(n).iter().sum()
    }

    #[test]
    fn test_family_table_matches_variants() {
        for family in DistributionFamily::ALL {
            assert_eq!(DistributionFamily::from_name(family.name()), Some(family));
        }
        assert_eq!(DistributionFamily::PointMass.num_parameters(), 1);
        assert_eq!(DistributionFamily::ShiftedGeometric.num_parameters(), 2);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let distributions = [
            Distribution::Poisson { lambda: 2.5 },
            Distribution::NegativeBinomial { size: 0.4, q: 0.6 },
            Distribution::PointMass { p0: 0.3 },
            Distribution::ShiftedGeometric { p: 0.2, q: 0.7 },
        ];
        for d in distributions {
            assert_abs_diff_eq!(total(&d, 400), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_poisson_pmf() {
        let d = Distribution::Poisson { lambda: 2.0 };
        assert_abs_diff_eq!(d.pmf(0), (-2.0f64).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(d.pmf(3), 8.0 / 6.0 * (-2.0f64).exp(), epsilon = 1e-12);
        assert_eq!(Distribution::Poisson { lambda: 0.0 }.pmf(0), 1.0);
    }

    #[test]
    fn test_negative_binomial_with_size_one_is_geometric() {
        let d = Distribution::NegativeBinomial { size: 1.0, q: 0.25 };
        assert_abs_diff_eq!(d.pmf(0), 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(d.pmf(2), 0.75 * 0.0625, epsilon = 1e-12);
        assert_abs_diff_eq!(d.mean(), 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_parameter_count() {
        let err = Distribution::from_parameters(DistributionFamily::Poisson, &[1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ModelError::WrongParameterCount {
                family: "Poisson",
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_display() {
        let d = Distribution::NegativeBinomial { size: 0.4, q: 0.25 };
        assert_eq!(d.to_string(), "NegativeBinomial(0.4, 0.25)");
    }
}
