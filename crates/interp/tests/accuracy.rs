//! Integration tests for interpolation accuracy

use approx::assert_relative_eq;
use egstools_interp::{Interpolator, DEFAULT_ACCURACY, DEFAULT_MAX_BINS};
use rstest::rstest;

/// Low-discrepancy points in [0, 1) for repeatable "random" sampling
fn sample_points(n: usize) -> impl Iterator<Item = f64> {
    const GOLDEN: f64 = 0.618_033_988_749_894_9;
    (1..=n).map(|i| (i as f64 * GOLDEN).fract())
}

#[rstest]
#[case(2.0, 1.0, 0.0, 1.0, 2)]
#[case(-0.5, 3.0, -10.0, 10.0, 17)]
#[case(1e3, -4.0, 1e-3, 1.0, 128)]
#[case(0.0, 7.5, -2.0, -1.0, 5)]
fn linear_functions_are_exact(
    #[case] m: f64,
    #[case] c: f64,
    #[case] xmin: f64,
    #[case] xmax: f64,
    #[case] nbin: usize,
) {
    let f = |x: f64| m * x + c;
    let table = Interpolator::from_fn(nbin, xmin, xmax, f).unwrap();

    for t in sample_points(500) {
        let x = xmin + t * (xmax - xmin);
        assert_relative_eq!(
            table.interpolate(x),
            f(x),
            epsilon = 1e-9,
            max_relative = 1e-12
        );
    }

    // clamped, not extrapolated
    let width = xmax - xmin;
    assert_relative_eq!(table.interpolate(xmin - width), f(xmin), epsilon = 1e-12);
    assert_relative_eq!(table.interpolate(xmax + width), f(xmax), epsilon = 1e-12);
    assert_relative_eq!(table.interpolate(xmin), f(xmin), epsilon = 1e-12);
    assert_relative_eq!(table.interpolate(xmax), f(xmax), epsilon = 1e-12);
}

#[rstest]
#[case(0.0, 5.0)]
#[case(-3.0, 3.0)]
#[case(0.1, 0.2)]
fn adaptive_meets_tolerance(#[case] xmin: f64, #[case] xmax: f64) {
    let f = |x: f64| 1.0 / (1.0 + x * x);
    let table = Interpolator::adaptive(xmin, xmax, f).unwrap();

    assert!(table.bins() <= DEFAULT_MAX_BINS);

    let worst = sample_points(1000)
        .map(|t| xmin + t * (xmax - xmin))
        .map(|x| (table.interpolate(x) / f(x) - 1.0).abs())
        .fold(0.0, f64::max);

    assert!(
        worst <= 5.0 * DEFAULT_ACCURACY,
        "worst relative error {worst:e} with {} bins",
        table.bins()
    );
}

#[test]
fn adaptive_inverse_stopping_power_shape() {
    // typical 1/(dE/dx) against ln(E) over the electron range
    let f = |lne: f64| {
        let e = lne.exp();
        0.1 + e / (1.0 + 0.5 * e.sqrt())
    };
    let (xmin, xmax) = (1e-3_f64.ln(), 10.0_f64.ln());
    let table = Interpolator::adaptive(xmin, xmax, f).unwrap();

    assert!(table.bins() <= DEFAULT_MAX_BINS);
    for t in sample_points(200) {
        let x = xmin + t * (xmax - xmin);
        assert_relative_eq!(table.interpolate(x), f(x), max_relative = 1e-2);
    }
}
