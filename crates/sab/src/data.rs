//! Kernel table formats and canonicalization

// crate modules
use crate::error::{Error, Result};

// nxtal modules
use nxtal_utils::GridExt;

/// Tabulation convention of an input scattering kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnlType {
    /// Canonical asymmetric S(α,β)
    Sab,
    /// `S_scaled = S·exp(β/2)` over the full β range
    ScaledSab,
    /// `S_scaled` with only β ≥ 0 stored, to be mirrored by detailed balance
    ScaledSymSab,
    /// S(q,ω) tables, which no code path can consume yet
    Sqw,
}

/// A scattering kernel as it arrives from a data source
#[derive(Debug, Clone, PartialEq)]
pub struct ScatKnlData {
    /// Strictly increasing α grid (unitless)
    pub alpha: Vec<f64>,
    /// Strictly increasing β grid; for [KnlType::ScaledSymSab] only β ≥ 0
    pub beta: Vec<f64>,
    /// Dense table of shape |β|·|α|, α fastest
    pub sab: Vec<f64>,
    /// Material temperature \[K\]
    pub temperature: f64,
    /// Bound scattering cross section \[barn\]
    pub bound_xs: f64,
    /// Mass of the scattering element \[amu\]
    pub mass_amu: f64,
    /// Tabulation convention
    pub knltype: KnlType,
    /// Upper energy \[eV\] the table is intended for, when the source says
    pub suggested_emax: Option<f64>,
}

/// The canonical asymmetric kernel
///
/// Invariants: grids strictly increasing with at least two points each, S
/// non-negative of shape |β|·|α| (α fastest), and detailed balance
/// `S(α,β) = S(α,−β)·exp(−β)` wherever both sides are tabulated.
#[derive(Debug, Clone, PartialEq)]
pub struct SabData {
    /// Strictly increasing α grid (unitless)
    pub alpha: Vec<f64>,
    /// Strictly increasing β grid spanning negative and positive transfers
    pub beta: Vec<f64>,
    /// Dense table of shape |β|·|α|, α fastest
    pub sab: Vec<f64>,
    /// Material temperature \[K\]
    pub temperature: f64,
    /// Bound scattering cross section \[barn\]
    pub bound_xs: f64,
    /// Mass of the scattering element \[amu\]
    pub mass_amu: f64,
    /// Upper energy \[eV\] the table is intended for, when the source says
    pub suggested_emax: Option<f64>,
}

impl SabData {
    /// One row of S values (all α) at a β grid index
    pub fn beta_row(&self, ibeta: usize) -> &[f64] {
        let n = self.alpha.len();
        &self.sab[ibeta * n..(ibeta + 1) * n]
    }

    /// Structural validation of the canonical invariants
    pub fn validate(&self) -> Result<()> {
        validate_table(&self.alpha, &self.beta, &self.sab)?;
        if !(self.temperature > 0.0) {
            return Err(Error::BadKernel("temperature must be positive".into()));
        }
        if !(self.bound_xs >= 0.0) {
            return Err(Error::BadKernel("bound cross section must be non-negative".into()));
        }
        if !(self.mass_amu > 0.0) {
            return Err(Error::BadKernel("element mass must be positive".into()));
        }
        Ok(())
    }
}

fn validate_table(alpha: &[f64], beta: &[f64], sab: &[f64]) -> Result<()> {
    if alpha.len() < 2 || !alpha.is_grid() || alpha[0] < 0.0 {
        return Err(Error::BadKernel(
            "alpha grid must be strictly increasing, non-negative, with at least 2 points".into(),
        ));
    }
    if beta.len() < 2 || !beta.is_grid() {
        return Err(Error::BadKernel(
            "beta grid must be strictly increasing with at least 2 points".into(),
        ));
    }
    if sab.len() != alpha.len() * beta.len() {
        return Err(Error::BadKernel(format!(
            "table size {} does not match |alpha|*|beta| = {}",
            sab.len(),
            alpha.len() * beta.len()
        )));
    }
    if sab.iter().any(|s| !s.is_finite() || *s < 0.0) {
        return Err(Error::BadKernel(
            "table entries must be finite and non-negative".into(),
        ));
    }
    Ok(())
}

impl ScatKnlData {
    /// Structural validation of the raw kernel
    pub fn validate(&self) -> Result<()> {
        validate_table(&self.alpha, &self.beta, &self.sab)?;
        if self.knltype == KnlType::ScaledSymSab && self.beta[0] != 0.0 {
            return Err(Error::BadKernel(
                "symmetric kernels must tabulate beta starting at exactly 0".into(),
            ));
        }
        if !(self.temperature > 0.0) {
            return Err(Error::BadKernel("temperature must be positive".into()));
        }
        Ok(())
    }
}

// Mirror a β ≥ 0 table onto the full β range using S(α,−β) := S(α,β),
// which is the correct reflection for the *scaled* symmetric form.
fn expand_symmetric(beta_half: &[f64], alpha: &[f64], sab_half: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let nalpha = alpha.len();
    let npos = beta_half.len() - 1;

    let mut beta = Vec::with_capacity(2 * npos + 1);
    for b in beta_half.iter().rev() {
        beta.push(-b);
    }
    // canonicalise the midpoint to +0, not -0
    *beta.last_mut().expect("grid is non-empty") = 0.0;
    beta.extend_from_slice(&beta_half[1..]);

    let mut sab = Vec::with_capacity((2 * npos + 1) * nalpha);
    for i in (1..=npos).rev() {
        sab.extend_from_slice(&sab_half[i * nalpha..(i + 1) * nalpha]);
    }
    sab.extend_from_slice(sab_half);

    (beta, sab)
}

/// Convert any input tabulation to the canonical asymmetric [SabData]
///
/// Symmetric input is mirrored over β=0 first; scaled input is then
/// multiplied by `exp(−β/2)`. Where that factor overflows at double
/// precision (argument beyond 700) the cancellation is carried out in log
/// space, `exp(−β/2 + ln S_scaled)`, with zero table entries passing
/// through as zero. If even the combined argument overflows the input data
/// is broken and a typed error is returned.
pub fn canonicalize(mut input: ScatKnlData) -> Result<SabData> {
    input.validate()?;

    if input.knltype == KnlType::ScaledSymSab {
        let (beta, sab) = expand_symmetric(&input.beta, &input.alpha, &input.sab);
        input.beta = beta;
        input.sab = sab;
        input.knltype = KnlType::ScaledSab;
    }

    if input.knltype == KnlType::ScaledSab {
        let nalpha = input.alpha.len();
        for (ibeta, beta) in input.beta.iter().enumerate() {
            let row = &mut input.sab[ibeta * nalpha..(ibeta + 1) * nalpha];
            let exparg = -0.5 * beta;
            if exparg < 700.0 {
                let factor = exparg.exp();
                for s in row.iter_mut() {
                    *s *= factor;
                }
            } else {
                // The factor exp(-beta/2) overflows. This normally happens
                // where S_scaled is itself tiny, so the cancellation is done
                // in log space instead.
                for s in row.iter_mut() {
                    if *s == 0.0 {
                        continue;
                    }
                    let combined = exparg + s.ln();
                    if combined < 700.0 {
                        *s = combined.exp();
                    } else {
                        return Err(Error::UnscaleOverflow {
                            s_scaled: *s,
                            beta: *beta,
                            arg: combined,
                        });
                    }
                }
            }
        }
        input.knltype = KnlType::Sab;
    }

    if input.knltype == KnlType::Sqw {
        return Err(Error::SqwNotImplemented);
    }

    let out = SabData {
        alpha: input.alpha,
        beta: input.beta,
        sab: input.sab,
        temperature: input.temperature,
        bound_xs: input.bound_xs,
        mass_amu: input.mass_amu,
        suggested_emax: input.suggested_emax,
    };
    out.validate()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symmetric_input() -> ScatKnlData {
        // two alpha points, three half-beta points (0, 1, 2)
        ScatKnlData {
            alpha: vec![0.5, 1.5],
            beta: vec![0.0, 1.0, 2.0],
            sab: vec![1.0, 2.0, 0.3, 0.6, 0.1, 0.2],
            temperature: 293.15,
            bound_xs: 4.0,
            mass_amu: 1.0,
            knltype: KnlType::ScaledSymSab,
            suggested_emax: None,
        }
    }

    #[test]
    fn symmetric_mirrors_and_unscales() {
        let out = canonicalize(symmetric_input()).unwrap();
        assert_eq!(out.beta, vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        assert!(out.beta[2].is_sign_positive());
        // detailed balance: S(a,b) = S(a,-b)*exp(-b)
        let nalpha = out.alpha.len();
        for ib in 0..out.beta.len() {
            let b = out.beta[ib];
            let ib_neg = out.beta.iter().position(|x| *x == -b).unwrap();
            for ia in 0..nalpha {
                let lhs = out.sab[ib * nalpha + ia];
                let rhs = out.sab[ib_neg * nalpha + ia] * (-b).exp();
                assert!(
                    (lhs - rhs).abs() <= 1e-6 * lhs.abs().max(rhs.abs()).max(1e-300),
                    "detailed balance broken at beta={b}"
                );
            }
        }
    }

    #[test]
    fn plain_sab_passes_through() {
        let mut input = symmetric_input();
        input.knltype = KnlType::Sab;
        input.beta = vec![-1.0, 0.0, 1.0];
        let out = canonicalize(input.clone()).unwrap();
        assert_eq!(out.sab, input.sab);
    }

    #[test]
    fn log_space_fallback_handles_huge_negative_beta() {
        // beta = -1500 would need exp(750); with S_scaled ~ exp(-760) the
        // cancellation must survive in log space
        let tiny = (-760.0_f64).exp();
        let input = ScatKnlData {
            alpha: vec![0.5, 1.5],
            beta: vec![-1500.0, 0.0, 1.0],
            sab: vec![tiny, 0.0, 1.0, 2.0, 0.5, 1.0],
            temperature: 293.15,
            bound_xs: 4.0,
            mass_amu: 1.0,
            knltype: KnlType::ScaledSab,
            suggested_emax: None,
        };
        let out = canonicalize(input).unwrap();
        let expected = (750.0 - 760.0_f64).exp();
        assert!((out.sab[0] - expected).abs() < 1e-12 * expected);
        assert_eq!(out.sab[1], 0.0);
    }

    #[test]
    fn log_space_overflow_is_an_error() {
        let input = ScatKnlData {
            alpha: vec![0.5, 1.5],
            beta: vec![-1500.0, 0.0, 1.0],
            sab: vec![1.0, 0.0, 1.0, 2.0, 0.5, 1.0],
            temperature: 293.15,
            bound_xs: 4.0,
            mass_amu: 1.0,
            knltype: KnlType::ScaledSab,
            suggested_emax: None,
        };
        assert!(matches!(
            canonicalize(input),
            Err(Error::UnscaleOverflow { .. })
        ));
    }

    #[test]
    fn sqw_is_rejected() {
        let mut input = symmetric_input();
        input.knltype = KnlType::Sqw;
        input.beta = vec![-1.0, 0.0, 1.0];
        assert!(matches!(canonicalize(input), Err(Error::SqwNotImplemented)));
    }
}
