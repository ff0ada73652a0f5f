//! Closed-form transient distributions of the linear birth-death process
//! with immigration.
//!
//! On an edge of length `t` with gain rate κ, duplication rate λ and loss
//! rate μ, the number of copies at the end of the edge is
//! * distributed by [transient0] if the edge starts with no copies
//!   (copies brought in by gain, i.e. xenologs), and
//! * distributed by [transient1] per copy the edge starts with (the
//!   descendants of one ancestral copy, i.e. inparalogs).
//!
//! Both take the probability `extinction` that a copy at the end of the edge
//! leaves no observed descendants, and condition on observation.

use crate::rates::distribution::Distribution;
use crate::rates::error::ModelError;
use crate::rates::model::BirthDeathModel;

/// Family size at the end of `edge` when it starts with no copies.
///
/// * No gain or zero length: no copies for sure.
/// * No duplication: Poisson.
/// * Otherwise negative binomial with size κ/λ.
///
/// # Errors
/// [ModelError::NotANumber] if the rates produce a NaN parameter.
///
/// # Example
/// ```
/// use phylocount::newick::parse_str;
/// use phylocount::rates::{Distribution, TreeWithRates, transient::transient0};
///
/// let mut model = TreeWithRates::new(parse_str("(A:1,B:1);").unwrap());
/// model.set_duplication_rate(0.0);
/// model.set_loss_rate(1.0);
/// model.set_gain_rate(0.5);
///
/// let Distribution::Poisson { lambda } = transient0(&model, 0, 0.0).unwrap() else {
///     panic!("expected a Poisson distribution");
/// };
/// assert!((lambda - 0.5 * (1.0 - (-1.0f64).exp())).abs() < 1e-12);
/// ```
pub fn transient0<M: BirthDeathModel + ?Sized>(
    model: &M,
    edge: usize,
    extinction: f64,
) -> Result<Distribution, ModelError> {
    let gain = model.gain_rate(edge);
    let t = model.edge_length(edge);
    if gain == 0.0 || t == 0.0 {
        return Ok(Distribution::PointMass { p0: 1.0 });
    }

    let duplication = model.duplication_rate(edge);
    let loss = model.loss_rate(edge);

    if duplication == 0.0 {
        let mut lambda = if loss > 0.0 {
            gain * (-(-loss * t).exp_m1()) / loss
        } else {
            gain * t
        };
        lambda *= 1.0 - extinction;
        if lambda.is_nan() {
            return Err(ModelError::NotANumber {
                edge,
                p: lambda,
                q: f64::NAN,
            });
        }
        return Ok(if lambda == 0.0 {
            Distribution::PointMass { p0: 1.0 }
        } else {
            Distribution::Poisson { lambda }
        });
    }

    let size = gain / duplication;
    let q = if duplication == loss {
        let dt = duplication * t;
        dt / (1.0 + dt)
    } else {
        duplication * beta(loss, duplication, t)
    };
    let q = (q * (1.0 - extinction) / (1.0 - q * extinction)).clamp(0.0, 1.0);
    if q.is_nan() || size.is_nan() {
        return Err(ModelError::NotANumber { edge, p: size, q });
    }

    Ok(if q == 0.0 {
        Distribution::PointMass { p0: 1.0 }
    } else {
        Distribution::NegativeBinomial { size, q }
    })
}

/// Number of descendants at the end of `edge` of one copy at its start.
///
/// * No duplication: zero or one copy.
/// * Otherwise shifted geometric.
///
/// # Errors
/// [ModelError::NotANumber] if the rates produce a NaN parameter.
pub fn transient1<M: BirthDeathModel + ?Sized>(
    model: &M,
    edge: usize,
    extinction: f64,
) -> Result<Distribution, ModelError> {
    let duplication = model.duplication_rate(edge);
    let loss = model.loss_rate(edge);
    let t = model.edge_length(edge);

    if duplication == 0.0 {
        let survival = ((-loss * t).exp() * (1.0 - extinction)).clamp(0.0, 1.0);
        if survival.is_nan() {
            return Err(ModelError::NotANumber {
                edge,
                p: survival,
                q: f64::NAN,
            });
        }
        return Ok(Distribution::PointMass { p0: 1.0 - survival });
    }

    let (p, q) = if duplication == loss {
        let dt = duplication * t;
        let p = dt / (1.0 + dt);
        (p, p)
    } else {
        let b = beta(loss, duplication, t);
        (loss * b, duplication * b)
    };

    let d = 1.0 - q * extinction;
    let p = ((p * (1.0 - extinction) + (1.0 - q) * extinction) / d).clamp(0.0, 1.0);
    let q = (q * (1.0 - extinction) / d).clamp(0.0, 1.0);
    if p.is_nan() || q.is_nan() {
        return Err(ModelError::NotANumber { edge, p, q });
    }

    Ok(Distribution::ShiftedGeometric { p, q })
}

/// β(t) = (1 − e^{−(μ−λ)t}) / (μ − λ e^{−(μ−λ)t}) for loss rate μ and
/// duplication rate λ.
///
/// When λ exceeds μ by a lot, the rearranged form
/// (1 − (μ−λ)/(μ − λ e^{−(μ−λ)t})) / λ avoids ∞/∞.
pub fn beta(loss: f64, duplication: f64, t: f64) -> f64 {
    let d = loss - duplication;
    let x = -d * t;
    let e = x.exp();
    let y = loss - duplication * e;
    if x < 1.0 {
        -x.exp_m1() / y
    } else {
        (1.0 - d / y) / duplication
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_str;
    use crate::rates::model::TreeWithRates;
    use approx::assert_abs_diff_eq;

    fn model(gain: f64, duplication: f64, loss: f64) -> TreeWithRates {
        let mut model = TreeWithRates::new(parse_str("(A:1,B:1);").unwrap());
        model.set_gain_rate(gain);
        model.set_duplication_rate(duplication);
        model.set_loss_rate(loss);
        model
    }

    #[test]
    fn test_beta_both_branches_agree_at_switch() {
        // x = (λ - μ) t crosses 1 between these
        let below = beta(1.0, 1.999_999, 1.0);
        let above = beta(1.0, 2.000_001, 1.0);
        assert_abs_diff_eq!(below, above, epsilon = 1e-5);
    }

    #[test]
    fn test_beta_limit_matches_equal_rates() {
        // β(t) → t / (1 + λt) as μ → λ
        let b = beta(1.0 + 1e-9, 1.0, 2.0);
        assert_abs_diff_eq!(b, 2.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_gain_is_point_mass() {
        let m = model(0.0, 0.5, 1.0);
        assert_eq!(transient0(&m, 0, 0.0).unwrap(), Distribution::PointMass { p0: 1.0 });
    }

    #[test]
    fn test_equal_rates() {
        let m = model(0.2, 1.0, 1.0);
        let d = transient1(&m, 0, 0.0).unwrap();
        assert_eq!(d, Distribution::ShiftedGeometric { p: 0.5, q: 0.5 });
        let d = transient0(&m, 0, 0.0).unwrap();
        assert_eq!(d, Distribution::NegativeBinomial { size: 0.2, q: 0.5 });
    }

    #[test]
    fn test_pure_death_survival() {
        let m = model(0.2, 0.0, 2.0);
        let Distribution::PointMass { p0 } = transient1(&m, 0, 0.0).unwrap() else {
            panic!("expected a point mass");
        };
        assert_abs_diff_eq!(p0, 1.0 - (-2.0f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_nan_is_reported() {
        let m = model(0.2, f64::NAN, 1.0);
        assert!(matches!(transient1(&m, 0, 0.0), Err(ModelError::NotANumber { edge: 0, .. })));
    }
}
