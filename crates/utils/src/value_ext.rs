use crate::f;

/// Extends primitives with more specific formatting options
pub trait ValueExt {
    /// Better scientific number formatting
    ///
    /// The default is not very consistent for scientific in particular, so this
    /// allows easy definition of the mantissa precision and exponent padding.
    ///
    /// ```rust
    /// # use egstools_utils::ValueExt;
    /// assert_eq!((-1.0_f64).sci(5, 2), "-1.00000e+00".to_string());
    /// assert_eq!(1.6021773e-10_f64.sci(4, 2), "1.6022e-10".to_string());
    /// ```
    fn sci(&self, precision: usize, exp_pad: usize) -> String;

    /// Relative uncertainty as a percentage
    ///
    /// Follows the reporting convention where any non-positive result is
    /// given a 100% relative uncertainty.
    ///
    /// ```rust
    /// # use egstools_utils::ValueExt;
    /// assert_eq!(2.0_f64.rel_percent(0.1), 5.0);
    /// assert_eq!(0.0_f64.rel_percent(0.1), 100.0);
    /// ```
    fn rel_percent(&self, uncertainty: f64) -> f64;
}

impl ValueExt for f64 {
    fn sci(&self, precision: usize, exp_pad: usize) -> String {
        let num = f!("{:.precision$e}", self, precision = precision);
        let Some((mantissa, exp)) = num.split_once('e') else {
            return num;
        };
        // make sure the exponent is signed
        let (sign, exp) = match exp.strip_prefix('-') {
            Some(exp) => ('-', exp),
            None => ('+', exp),
        };
        f!("{}e{}{:0>pad$}", mantissa, sign, exp, pad = exp_pad)
    }

    fn rel_percent(&self, uncertainty: f64) -> f64 {
        if *self > 0.0 {
            100.0 * uncertainty / self
        } else {
            100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 3, 2, "0.000e+00")]
    #[case(123.456, 2, 2, "1.23e+02")]
    #[case(1.0e-123, 1, 2, "1.0e-123")]
    #[case(4.5e7, 3, 3, "4.500e+007")]
    fn scientific_formatting(
        #[case] value: f64,
        #[case] precision: usize,
        #[case] pad: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(value.sci(precision, pad), expected);
    }

    #[test]
    fn negative_results_are_fully_uncertain() {
        assert_eq!((-3.0_f64).rel_percent(1.0), 100.0);
    }
}
