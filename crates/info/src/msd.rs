//! Mean-square displacements from the isotropic Debye model

/// ħ²/(amu·kB) in Aa²·K, the natural unit block of the Debye MSD formula
const HBAR_SQ_OVER_AMU_KB: f64 = 48.5086;

/// Atomic mean-square displacement \[Aa²\] in the isotropic Debye model
///
/// This is the displacement projected onto a linear axis, for direct use in
/// isotropic Debye–Waller factors:
///
/// `msd = 3ħ²/(M·kB·θD) · ( 1/4 + (T/θD)² ∫₀^{θD/T} x/(eˣ−1) dx )`
///
/// The 1/4 term is the zero-point motion; the integral term the thermal
/// part.
///
/// ```rust
/// # use nxtal_info::debye_msd;
/// // aluminium at room temperature, B-factor ~ 0.8 Aa²
/// let msd = debye_msd(410.4, 293.15, 26.98);
/// let b_factor = 8.0 * std::f64::consts::PI.powi(2) * msd;
/// assert!(b_factor > 0.6 && b_factor < 1.0, "B = {b_factor}");
/// ```
pub fn debye_msd(debye_temp: f64, temperature: f64, mass_amu: f64) -> f64 {
    debug_assert!(debye_temp > 0.0 && temperature >= 0.0 && mass_amu > 0.0);
    let y = debye_temp / temperature.max(1e-300);
    let thermal = if temperature <= 0.0 {
        0.0
    } else {
        debye_integral(y) / (y * y)
    };
    3.0 * HBAR_SQ_OVER_AMU_KB / (mass_amu * debye_temp) * (0.25 + thermal)
}

// ∫₀^upper x/(eˣ−1) dx by composite Simpson; the integrand tends to 1 at
// x=0 and decays exponentially, so modest resolution is plenty
fn debye_integral(upper: f64) -> f64 {
    let upper = upper.min(500.0);
    let n = 256; // even
    let h = upper / n as f64;
    let f = |x: f64| -> f64 {
        if x < 1e-8 {
            1.0 - 0.5 * x
        } else {
            x / x.exp_m1()
        }
    };
    let mut sum = f(0.0) + f(upper);
    for i in 1..n {
        let w = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += w * f(h * i as f64);
    }
    sum * h / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_point_limit() {
        // at T->0 only the 1/4 term survives
        let cold = debye_msd(400.0, 1e-6, 27.0);
        let expected = 3.0 * HBAR_SQ_OVER_AMU_KB / (27.0 * 400.0) * 0.25;
        assert!((cold - expected).abs() < 1e-6 * expected);
    }

    #[test]
    fn high_temperature_limit_is_classical() {
        // for T >> thetaD: msd -> 3*hbar^2*T/(M*kB*thetaD^2)
        let t = 4000.0;
        let theta = 200.0;
        let m = 50.0;
        let msd = debye_msd(theta, t, m);
        let classical = 3.0 * HBAR_SQ_OVER_AMU_KB * t / (m * theta * theta);
        assert!((msd - classical).abs() < 0.02 * classical, "{msd} vs {classical}");
    }

    #[test]
    fn msd_grows_with_temperature() {
        let a = debye_msd(410.4, 100.0, 26.98);
        let b = debye_msd(410.4, 293.15, 26.98);
        let c = debye_msd(410.4, 600.0, 26.98);
        assert!(a < b && b < c);
    }
}
