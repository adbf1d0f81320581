//! Phonon expansion of a density of states to S(α,β)

// crate modules
use crate::error::{Error, Result};
use crate::regularize::VdosData;

// external crates
use log::debug;

// nxtal modules
use nxtal_sab::{canonicalize, KnlType, SabData, ScatKnlData};
use nxtal_utils::{StableSum, BOLTZMANN, NEUTRON_MASS_AMU};

/// Parameters of a kernel expansion
#[derive(Debug, Clone, Copy)]
pub struct ExpandCfg {
    /// Material temperature \[K\]
    pub temperature: f64,
    /// Bound scattering cross section of the element \[barn\]
    pub bound_xs: f64,
    /// Element mass \[amu\]
    pub mass_amu: f64,
    /// Quality level 0..=5 steering grid sizes and expansion order
    pub vdoslux: u32,
}

// Grid sizing per luxury level
fn expansion_order(vdoslux: u32) -> usize {
    3 + 2 * vdoslux as usize
}

fn beta_points_per_eps(vdoslux: u32) -> f64 {
    12.0 * (vdoslux + 1) as f64
}

fn alpha_points(vdoslux: u32) -> usize {
    40 * (vdoslux as usize + 1)
}

/// Expand a regularized VDOS to a canonical asymmetric kernel
///
/// The one-phonon profile is derived from the spectrum, Debye–Waller λ is
/// its integral, and higher orders are built by repeated self-convolution:
///
/// `S(α,β) = Σ_{n≥1} e^{−αλ}·(αλ)ⁿ/n! · Tₙ(β)`
///
/// Each `Tₙ` obeys detailed balance, so the assembled kernel does too. The
/// elastic n=0 term is deliberately absent; elastic physics is handled by
/// dedicated processes.
pub fn expand_to_sab(vdos: &VdosData, cfg: &ExpandCfg) -> Result<SabData> {
    if !(cfg.temperature > 0.0) {
        return Err(Error::BadVdos("temperature must be positive".into()));
    }
    if !(cfg.mass_amu > 0.0) {
        return Err(Error::BadVdos("element mass must be positive".into()));
    }
    if cfg.vdoslux > 5 {
        return Err(Error::BadVdos(format!(
            "vdoslux {} outside range [0,5]",
            cfg.vdoslux
        )));
    }

    let kt = BOLTZMANN * cfg.temperature;
    let eps_max = vdos.emax() / kt;
    let order = expansion_order(cfg.vdoslux);

    // symmetric beta grid covering the n-phonon reach
    let beta_max = eps_max * order as f64;
    let dbeta = eps_max / beta_points_per_eps(cfg.vdoslux);
    let nhalf = (beta_max / dbeta).ceil() as usize;
    let nbeta = 2 * nhalf + 1;
    let beta: Vec<f64> = (0..nbeta)
        .map(|i| (i as isize - nhalf as isize) as f64 * dbeta)
        .collect();

    // one-phonon profile T1 and Debye-Waller lambda
    let t1 = one_phonon_profile(vdos, kt, &beta);
    let lambda = {
        let mut sum = StableSum::default();
        for v in &t1 {
            sum.add(*v);
        }
        sum.total() * dbeta
    };
    if !(lambda > 0.0) {
        return Err(Error::BadVdos("one-phonon profile integrates to zero".into()));
    }
    let t1: Vec<f64> = t1.iter().map(|v| v / lambda).collect();

    // alpha grid sized to the kernel's useful energy reach, denser at the
    // low-alpha end where S varies fastest
    let suggested_emax = 0.5 * kt * beta_max;
    let mass_ratio = cfg.mass_amu / NEUTRON_MASS_AMU;
    let e_red = suggested_emax / kt;
    let alpha_max = {
        let s = e_red.sqrt() + (e_red + beta_max).sqrt();
        s * s / mass_ratio
    };
    let nalpha = alpha_points(cfg.vdoslux);
    let alpha: Vec<f64> = (1..=nalpha)
        .map(|k| {
            let t = k as f64 / nalpha as f64;
            alpha_max * t * t
        })
        .collect();

    debug!(
        "expanding VDOS: order {order}, {nbeta} beta points to |beta|<={beta_max:.2}, \
         {nalpha} alpha points to {alpha_max:.2}"
    );

    // orders T2..TN by repeated convolution with T1 on the uniform grid
    let mut orders: Vec<Vec<f64>> = Vec::with_capacity(order);
    orders.push(t1);
    for _ in 1..order {
        let prev = orders.last().expect("at least T1 present");
        orders.push(convolve(prev, &orders[0], dbeta));
    }

    // log-factorials for the overflow-safe Poisson-like weights
    let mut ln_fact = vec![0.0_f64; order + 1];
    for n in 1..=order {
        ln_fact[n] = ln_fact[n - 1] + (n as f64).ln();
    }

    let mut sab = vec![0.0_f64; nalpha * nbeta];
    for (ib, row) in sab.chunks_mut(nalpha).enumerate() {
        for (ia, entry) in row.iter_mut().enumerate() {
            let al = alpha[ia] * lambda;
            let ln_al = al.ln();
            let mut sum = StableSum::default();
            for (n, tn) in orders.iter().enumerate() {
                let weight = (((n + 1) as f64) * ln_al - al - ln_fact[n + 1]).exp();
                sum.add(weight * tn[ib]);
            }
            *entry = sum.total().max(0.0);
        }
    }

    let data = canonicalize(ScatKnlData {
        alpha,
        beta,
        sab,
        temperature: cfg.temperature,
        bound_xs: cfg.bound_xs,
        mass_amu: cfg.mass_amu,
        knltype: KnlType::Sab,
        suggested_emax: Some(suggested_emax),
    })?;
    Ok(data)
}

// The asymmetric one-phonon profile on the beta grid:
// T1(β) ∝ ρ(|β|kT)·kT / (2·|β|·sinh(|β|/2)) · exp(−β/2),
// finite at β=0 thanks to the quadratic onset of the spectrum.
fn one_phonon_profile(vdos: &VdosData, kt: f64, beta: &[f64]) -> Vec<f64> {
    let de = vdos.spacing();
    let emax = vdos.emax();
    // quadratic-onset coefficient from the first regularized point
    let onset = vdos.density[0] / (de * de);

    let density_at = |energy: f64| -> f64 {
        if energy >= emax {
            return 0.0;
        }
        if energy <= de {
            return onset * energy * energy;
        }
        let idx = ((energy / de) - 1.0).floor() as usize;
        let idx = idx.min(vdos.density.len() - 2);
        let e0 = de * (idx + 1) as f64;
        let t = (energy - e0) / de;
        vdos.density[idx] + t * (vdos.density[idx + 1] - vdos.density[idx])
    };

    beta.iter()
        .map(|b| {
            let abs_b = b.abs();
            let sym = if abs_b < 1e-8 {
                // limit value: rho -> onset*E^2 cancels the 1/beta^2 pole
                onset * kt * kt * kt
            } else {
                let rho_beta = density_at(abs_b * kt) * kt;
                rho_beta / (2.0 * abs_b * (0.5 * abs_b).sinh())
            };
            sym * (-0.5 * b).exp()
        })
        .collect()
}

// Discrete convolution on a uniform symmetric grid, truncated to the grid
fn convolve(a: &[f64], b: &[f64], dbeta: f64) -> Vec<f64> {
    let n = a.len();
    let half = (n - 1) as isize / 2;
    let mut out = vec![0.0; n];
    for (i, o) in out.iter_mut().enumerate() {
        let bi = i as isize - half;
        let mut sum = StableSum::default();
        for (j, av) in a.iter().enumerate() {
            if *av == 0.0 {
                continue;
            }
            let bj = bi - (j as isize - half);
            let k = bj + half;
            if k >= 0 && (k as usize) < n {
                sum.add(av * b[k as usize]);
            }
        }
        *o = sum.total() * dbeta;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_kernel(vdoslux: u32) -> SabData {
        let vdos = VdosData::debye(350.0).unwrap();
        let cfg = ExpandCfg {
            temperature: 293.15,
            bound_xs: 5.0,
            mass_amu: 27.0,
            vdoslux,
        };
        expand_to_sab(&vdos, &cfg).unwrap()
    }

    #[test]
    fn kernel_satisfies_detailed_balance() {
        let data = toy_kernel(0);
        let nalpha = data.alpha.len();
        let nbeta = data.beta.len();
        for ib in 0..nbeta {
            let b = data.beta[ib];
            if b <= 0.0 {
                continue;
            }
            let ib_neg = nbeta - 1 - ib;
            assert!((data.beta[ib_neg] + b).abs() < 1e-10);
            for ia in (0..nalpha).step_by(7) {
                let up = data.sab[ib * nalpha + ia];
                let down = data.sab[ib_neg * nalpha + ia];
                let expect = up * b.exp();
                if up < 1e-300 && down < 1e-300 {
                    continue;
                }
                assert!(
                    (down - expect).abs() <= 1e-6 * expect.abs().max(down.abs()),
                    "detailed balance broken at beta={b}, alpha={}",
                    data.alpha[ia]
                );
            }
        }
    }

    #[test]
    fn one_phonon_term_dominates_at_small_alpha() {
        let data = toy_kernel(0);
        // at the smallest alpha the multi-phonon weights are negligible, so
        // S should be close to alpha*lambda*T1, i.e. scale ~linearly with
        // alpha between the two smallest grid points
        let nalpha = data.alpha.len();
        let ib = data.beta.len() / 2; // beta ~ 0
        let s0 = data.sab[ib * nalpha];
        let s1 = data.sab[ib * nalpha + 1];
        let ratio = s1 / s0;
        let alpha_ratio = data.alpha[1] / data.alpha[0];
        assert!(
            (ratio - alpha_ratio).abs() < 0.1 * alpha_ratio,
            "low-alpha scaling {ratio} vs {alpha_ratio}"
        );
    }

    #[test]
    fn higher_lux_extends_the_grid() {
        let lo = toy_kernel(0);
        let hi = toy_kernel(2);
        assert!(hi.alpha.len() > lo.alpha.len());
        assert!(hi.beta.len() > lo.beta.len());
        assert!(hi.beta.last().unwrap() > lo.beta.last().unwrap());
        assert!(hi.suggested_emax.unwrap() > lo.suggested_emax.unwrap());
    }
}
