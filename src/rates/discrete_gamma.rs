//! Discretized gamma distribution with mean 1.
//!
//! The gamma distribution with shape α and rate α is cut into `k` categories
//! of equal probability; each category is represented by its mean.

use statrs::distribution::{ContinuousCDF, Gamma};
use statrs::function::gamma::gamma_lr;

/// Means of the `k` equiprobable categories of Gamma(α, α).
///
/// The means average to 1. A single category has mean 1 for any α.
/// Returns `None` if `alpha` is not positive and finite or `k` is 0.
///
/// # Example
/// ```
/// use phylocount::rates::discrete_gamma::partition_means;
///
/// let means = partition_means(0.5, 4).unwrap();
/// assert_eq!(means.len(), 4);
/// assert!(means.windows(2).all(|w| w[0] < w[1]));
/// let average = means.iter().sum::<f64>() / 4.0;
/// assert!((average - 1.0).abs() < 1e-6);
/// ```
pub fn partition_means(alpha: f64, k: usize) -> Option<Vec<f64>> {
    if k == 0 || !(alpha > 0.0 && alpha.is_finite()) {
        return None;
    }
    if k == 1 {
        return Some(vec![1.0]);
    }

    let gamma = Gamma::new(alpha, alpha).ok()?;

    // Mass of Gamma(α+1, α) below each cut point; the mean of a category is
    // k times the Gamma(α+1, α) mass between its cut points
    let mut lower_mass = Vec::with_capacity(k + 1);
    lower_mass.push(0.0);
    for i in 1..k {
        let cut = quantile(&gamma, i as f64 / k as f64);
        lower_mass.push(gamma_lr(alpha + 1.0, alpha * cut));
    }
    lower_mass.push(1.0);

    let k_f = k as f64;
    Some(lower_mass.windows(2).map(|w| k_f * (w[1] - w[0])).collect())
}

/// Bisection steps for quantiles; enough to exhaust f64 precision
const MAX_BISECTIONS: usize = 200;

/// Quantile of a gamma distribution for `p` in (0, 1), by bisection on the
/// cumulative distribution function.
fn quantile(gamma: &Gamma, p: f64) -> f64 {
    let mut low = 0.0;
    let mut high = 1.0;
    while gamma.cdf(high) < p {
        low = high;
        high *= 2.0;
    }
    for _ in 0..MAX_BISECTIONS {
        let mid = 0.5 * (low + high);
        if mid <= low || mid >= high {
            break;
        }
        if gamma.cdf(mid) < p {
            low = mid;
        } else {
            high = mid;
        }
    }
    0.5 * (low + high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quantile_of_exponential() {
        let gamma = Gamma::new(1.0, 1.0).unwrap();
        assert_abs_diff_eq!(quantile(&gamma, 0.5), std::f64::consts::LN_2, epsilon = 1e-10);
    }

    #[test]
    fn test_single_category() {
        assert_eq!(partition_means(0.3, 1), Some(vec![1.0]));
    }

    #[test]
    fn test_invalid_arguments() {
        assert_eq!(partition_means(0.0, 4), None);
        assert_eq!(partition_means(f64::INFINITY, 4), None);
        assert_eq!(partition_means(1.0, 0), None);
    }

    #[test]
    fn test_exponential_two_categories() {
        // α = 1 is the exponential distribution with median ln 2
        let means = partition_means(1.0, 2).unwrap();
        let ln2 = std::f64::consts::LN_2;
        assert_abs_diff_eq!(means[0], 1.0 - ln2, epsilon = 1e-6);
        assert_abs_diff_eq!(means[1], 1.0 + ln2, epsilon = 1e-6);
    }

    #[test]
    fn test_large_shape_concentrates_at_one() {
        let means = partition_means(1000.0, 3).unwrap();
        for mean in means {
            assert_abs_diff_eq!(mean, 1.0, epsilon = 0.1);
        }
    }
}
