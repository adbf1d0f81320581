//! Display formatting for physical quantities
//!
//! Material dumps and diagnostics print mixed-magnitude quantities
//! (densities in g/cm³, cross sections in barn, d-spacings in angstrom),
//! so a couple of consistent renderings are kept here.

/// Extends floats with quantity-oriented formatting
pub trait QuantityExt {
    /// Scientific form with a signed, zero-padded two-digit exponent
    ///
    /// Cross sections and structure factors span many decades, and the
    /// default `{:e}` output varies in width; this pins the layout for
    /// aligned dump columns.
    ///
    /// ```rust
    /// # use nxtal_utils::QuantityExt;
    /// assert_eq!(2.338.sci(3), "2.338e+00");
    /// assert_eq!(0.00052.sci(2), "5.20e-04");
    /// assert_eq!((-49700.0).sci(1), "-5.0e+04");
    /// ```
    fn sci(&self, precision: usize) -> String;

    /// Value with a unit suffix, trailing zeros trimmed
    ///
    /// ```rust
    /// # use nxtal_utils::QuantityExt;
    /// assert_eq!(4.04958.with_unit("Aa"), "4.04958 Aa");
    /// assert_eq!(293.150000.with_unit("K"), "293.15 K");
    /// assert_eq!(90.0.with_unit("deg"), "90 deg");
    /// ```
    fn with_unit(&self, unit: &str) -> String;
}

impl QuantityExt for f64 {
    fn sci(&self, precision: usize) -> String {
        if !self.is_finite() {
            return format!("{self}");
        }
        let raw = format!("{:.precision$e}", self, precision = precision);
        let (mantissa, exponent) = raw.split_once('e').expect("{:e} always emits an exponent");
        let exponent: i32 = exponent.parse().expect("exponent is a small integer");
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }

    fn with_unit(&self, unit: &str) -> String {
        let mut num = format!("{:.6}", self);
        if num.contains('.') {
            num.truncate(num.trim_end_matches('0').trim_end_matches('.').len());
        }
        format!("{num} {unit}")
    }
}

/// Extends optional quantities for dump output
pub trait OptQuantityExt {
    /// Like [QuantityExt::with_unit], with `n/a` for absent values
    ///
    /// ```rust
    /// # use nxtal_utils::OptQuantityExt;
    /// assert_eq!(Some(410.4).with_unit_or_na("K"), "410.4 K");
    /// assert_eq!(None::<f64>.with_unit_or_na("K"), "n/a");
    /// ```
    fn with_unit_or_na(&self, unit: &str) -> String;
}

impl OptQuantityExt for Option<f64> {
    fn with_unit_or_na(&self, unit: &str) -> String {
        match self {
            Some(value) => value.with_unit(unit),
            None => "n/a".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sci_handles_edge_magnitudes() {
        assert_eq!(0.0.sci(2), "0.00e+00");
        assert_eq!(1.0.sci(0), "1e+00");
        assert_eq!(f64::INFINITY.sci(3), "inf");
        // three-digit exponents keep their width
        assert_eq!(1.5e-120.sci(1), "1.5e-120");
    }

    #[test]
    fn with_unit_keeps_significant_digits() {
        assert_eq!(0.178577.with_unit("kg/m3"), "0.178577 kg/m3");
        assert_eq!(1e-7.with_unit("b"), "0 b");
    }
}
