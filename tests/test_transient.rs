use approx::{assert_abs_diff_eq, assert_relative_eq};
use phylocount::newick::parse_str;
use phylocount::rates::transient::{transient0, transient1};
use phylocount::rates::{BirthDeathModel, Distribution, ModelError, ScaledModel, TreeWithRates};

fn model(gain: f64, duplication: f64, loss: f64, length: f64) -> TreeWithRates {
    let mut model = TreeWithRates::new(parse_str("(A:1,B:1);").unwrap());
    model.set_gain_rate(gain);
    model.set_duplication_rate(duplication);
    model.set_loss_rate(loss);
    model.set_length(length);
    model
}

fn total(distribution: &Distribution) -> f64 {
    distribution.pmf_range(5_000).iter().sum()
}

#[test]
fn test_poisson_without_duplication() {
    let m = model(0.5, 0.0, 1.0, 1.0);
    let Distribution::Poisson { lambda } = transient0(&m, 0, 0.0).unwrap() else {
        panic!("expected a Poisson distribution");
    };
    assert_abs_diff_eq!(lambda, 0.5 * (1.0 - (-1.0f64).exp()), epsilon = 1e-12);
    assert_abs_diff_eq!(lambda, 0.3161, epsilon = 1e-4);
}

#[test]
fn test_poisson_without_loss() {
    let m = model(0.5, 0.0, 0.0, 2.0);
    assert_eq!(transient0(&m, 1, 0.0).unwrap(), Distribution::Poisson { lambda: 1.0 });
}

#[test]
fn test_zero_length_edge() {
    let m = model(0.5, 0.3, 1.0, 0.0);
    assert_eq!(transient0(&m, 0, 0.0).unwrap(), Distribution::PointMass { p0: 1.0 });
    let d = transient1(&m, 0, 0.0).unwrap();
    assert_abs_diff_eq!(d.pmf(1), 1.0, epsilon = 1e-12);
}

#[test]
fn test_transients_sum_to_one() {
    let rates = [0.0, 0.1, 0.5, 1.0, 2.0];
    let lengths = [0.0, 0.3, 1.0];
    let extinctions = [0.0, 0.25, 0.9];
    for &gain in &rates {
        for &duplication in &rates {
            for &loss in &rates {
                for &length in &lengths {
                    let m = model(gain, duplication, loss, length);
                    for &extinction in &extinctions {
                        let d0 = transient0(&m, 0, extinction).unwrap();
                        let d1 = transient1(&m, 0, extinction).unwrap();
                        assert_abs_diff_eq!(total(&d0), 1.0, epsilon = 1e-8);
                        assert_abs_diff_eq!(total(&d1), 1.0, epsilon = 1e-8);
                    }
                }
            }
        }
    }
}

#[test]
fn test_equal_rates_limit_is_continuous() {
    let equal = transient1(&model(0.2, 1.0, 1.0, 1.0), 0, 0.1).unwrap();
    let close = transient1(&model(0.2, 1.0, 1.0 + 1e-7, 1.0), 0, 0.1).unwrap();
    for k in 0..20 {
        assert_abs_diff_eq!(equal.pmf(k), close.pmf(k), epsilon = 1e-6);
    }
}

#[test]
fn test_mean_of_inparalogs() {
    // Without conditioning, the expected number of copies is e^{(λ-μ)t}
    let m = model(0.0, 0.5, 1.0, 2.0);
    let d = transient1(&m, 0, 0.0).unwrap();
    assert_relative_eq!(d.mean(), (-1.0f64).exp(), max_relative = 1e-12);
}

#[test]
fn test_scaled_model_matches_scaled_rates() {
    let base = model(0.2, 0.5, 1.0, 1.0);
    let mut scaled = ScaledModel::new(&base);
    scaled.set_duplication_multiplier(2.0);
    scaled.set_length_multiplier(0.5);
    let expected = model(0.2, 1.0, 1.0, 0.5);

    assert_eq!(scaled.duplication_rate(0), 1.0);
    assert_eq!(transient0(&scaled, 0, 0.2).unwrap(), transient0(&expected, 0, 0.2).unwrap());
    assert_eq!(transient1(&scaled, 1, 0.2).unwrap(), transient1(&expected, 1, 0.2).unwrap());
}

#[test]
fn test_per_edge_rates() {
    let mut m = model(0.2, 0.0, 1.0, 1.0);
    m.set_edge_gain_rate(1, 0.0).unwrap();
    assert!(matches!(transient0(&m, 0, 0.0).unwrap(), Distribution::Poisson { .. }));
    assert_eq!(transient0(&m, 1, 0.0).unwrap(), Distribution::PointMass { p0: 1.0 });
}

#[test]
fn test_not_a_number() {
    let m = model(0.2, 0.5, f64::NAN, 1.0);
    assert!(matches!(
        transient0(&m, 0, 0.0),
        Err(ModelError::NotANumber { edge: 0, .. })
    ));
}
