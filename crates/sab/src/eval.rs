//! Cross sections and (α,β) sampling from a canonical kernel

// crate modules
use crate::data::SabData;
use crate::integrate::{integrate_alpha_interval, invert_alpha_interval, tailed_breakdown};
use crate::kinematics::{active_grid_cells, alpha_limits, mass_ratio};

// external crates
use log::warn;

// nxtal modules
use nxtal_utils::{StableSum, BOLTZMANN};

// standard library
use std::sync::Arc;

/// Evaluator precomputing what the per-energy integrals need
///
/// Holds the log-table and per-β-row cumulative α integrals alongside the
/// kernel. The cross section at incident energy E is
///
/// `σ(E) = σ_b/(4·E/kT) · ∬ S(α,β) dα dβ`
///
/// with the double integral running over the kinematically accessible
/// region. Sampling draws a β cell by its contribution to that integral,
/// then α by inverse CDF on the accessible slice of the corresponding row.
#[derive(Debug, Clone)]
pub struct SabEval {
    data: Arc<SabData>,
    logsab: Vec<f64>,
    // cumulative per-row alpha integrals: entry [ib*nalpha + ia] is the
    // integral of row ib from the grid start through alpha grid point ia
    alpha_cumul: Vec<f64>,
    mass_ratio: f64,
}

impl SabEval {
    /// Precompute tables for the given kernel
    pub fn new(data: Arc<SabData>) -> Self {
        let nalpha = data.alpha.len();
        let logsab: Vec<f64> = data
            .sab
            .iter()
            .map(|s| if *s > 0.0 { s.ln() } else { f64::NEG_INFINITY })
            .collect();

        let mut alpha_cumul = vec![0.0; data.sab.len()];
        for ib in 0..data.beta.len() {
            let row = &data.sab[ib * nalpha..(ib + 1) * nalpha];
            let logrow = &logsab[ib * nalpha..(ib + 1) * nalpha];
            let mut sum = StableSum::default();
            for ia in 1..nalpha {
                sum.add(integrate_alpha_interval(
                    data.alpha[ia - 1],
                    row[ia - 1],
                    data.alpha[ia],
                    row[ia],
                    logrow[ia - 1],
                    logrow[ia],
                ));
                alpha_cumul[ib * nalpha + ia] = sum.total();
            }
        }

        Self {
            mass_ratio: mass_ratio(&data),
            data,
            logsab,
            alpha_cumul,
        }
    }

    /// The wrapped kernel
    pub fn data(&self) -> &Arc<SabData> {
        &self.data
    }

    /// kT of the kernel's temperature \[eV\]
    pub fn kt(&self) -> f64 {
        BOLTZMANN * self.data.temperature
    }

    // Integral over the accessible alpha slice of row `ib` at reduced
    // energy e and energy transfer beta.
    fn row_integral(
        &self,
        ib: usize,
        e: f64,
        beta: f64,
        range: (usize, usize),
    ) -> crate::integrate::TailedBreakdown {
        let nalpha = self.data.alpha.len();
        let (alow, aupp) = alpha_limits(e, beta, self.mass_ratio);
        let row = &self.data.sab[ib * nalpha..(ib + 1) * nalpha];
        let logrow = &self.logsab[ib * nalpha..(ib + 1) * nalpha];
        let cumul = &self.alpha_cumul[ib * nalpha..(ib + 1) * nalpha];
        tailed_breakdown(
            &self.data.alpha,
            row,
            logrow,
            cumul,
            alow,
            aupp,
            range.0.min(nalpha - 1),
            range.1.min(nalpha - 1),
        )
    }

    // Weight of each active beta cell in the double integral, with the cell
    // geometry needed to sample from it later.
    fn cell_weights(&self, ekin: f64) -> (Vec<CellWeight>, f64) {
        let e = ekin / self.kt();
        let nalpha = self.data.alpha.len();
        let (cells, ibeta_low) = active_grid_cells(&self.data, e);

        let mut weights = Vec::with_capacity(cells.len());
        let mut total = StableSum::default();
        for (i, range) in cells.iter().enumerate() {
            if range.0 >= nalpha {
                continue; // empty cell
            }
            let ib_lo = ibeta_low + i;
            let beta_lo = self.data.beta[ib_lo].max(-e);
            let beta_hi = self.data.beta[ib_lo + 1];
            if beta_hi <= beta_lo {
                continue;
            }
            let f_lo = if self.data.beta[ib_lo] >= -e {
                self.row_integral(ib_lo, e, self.data.beta[ib_lo], *range).total()
            } else {
                0.0
            };
            let f_hi = self.row_integral(ib_lo + 1, e, beta_hi, *range).total();
            let weight = 0.5 * (f_lo + f_hi) * (beta_hi - beta_lo);
            if weight > 0.0 {
                total.add(weight);
                weights.push(CellWeight {
                    ib_lo,
                    range: *range,
                    beta_lo,
                    beta_hi,
                    f_lo,
                    f_hi,
                    weight,
                });
            }
        }
        (weights, total.total())
    }

    /// Cross section \[barn\] at incident energy `ekin` \[eV\]
    pub fn cross_section(&self, ekin: f64) -> f64 {
        if !(ekin > 0.0) {
            return 0.0;
        }
        let e = ekin / self.kt();
        let (_, integral) = self.cell_weights(ekin);
        self.data.bound_xs / (4.0 * e) * integral
    }

    /// Draw an (α, β) pair at incident energy `ekin` \[eV\]
    ///
    /// `rng` yields uniforms in (0,1). Returns `None` when nothing is
    /// kinematically accessible (σ = 0 there).
    pub fn sample_alpha_beta(
        &self,
        ekin: f64,
        rng: &mut dyn FnMut() -> f64,
    ) -> Option<(f64, f64)> {
        if !(ekin > 0.0) {
            return None;
        }
        let e = ekin / self.kt();
        let (weights, total) = self.cell_weights(ekin);
        if weights.is_empty() || !(total > 0.0) {
            return None;
        }

        // pick a beta cell by weight
        let mut target = rng() * total;
        let mut chosen = &weights[weights.len() - 1];
        for w in &weights {
            if target < w.weight {
                chosen = w;
                break;
            }
            target -= w.weight;
        }

        // beta inside the cell from the linear density between f_lo and f_hi
        let u = rng();
        let t = sample_linear_density(chosen.f_lo, chosen.f_hi, u);
        let beta = chosen.beta_lo + t * (chosen.beta_hi - chosen.beta_lo);

        // stochastic interpolation between the bracketing rows keeps the
        // marginal unbiased without rebuilding a row at this exact beta
        let ib = if rng() < t { chosen.ib_lo + 1 } else { chosen.ib_lo };

        let tb = self.row_integral(ib, e, beta, chosen.range);
        let row_total = tb.total();
        if !(row_total > 0.0) {
            warn!("kernel row integral vanished at beta={beta}, falling back to alpha-");
            let (alow, _) = alpha_limits(e, beta, self.mass_ratio);
            return Some((alow, beta));
        }
        let alpha = self.invert_row_cdf(ib, &tb, rng() * row_total);
        Some((alpha, beta))
    }

    fn invert_row_cdf(
        &self,
        ib: usize,
        tb: &crate::integrate::TailedBreakdown,
        mut target: f64,
    ) -> f64 {
        let nalpha = self.data.alpha.len();
        let grid = &self.data.alpha;
        let row = &self.data.sab[ib * nalpha..(ib + 1) * nalpha];
        let logrow = &self.logsab[ib * nalpha..(ib + 1) * nalpha];

        if tb.narrow {
            return invert_alpha_interval(
                tb.front.alpha,
                tb.front.sval,
                tb.back.alpha,
                tb.back.sval,
                tb.front.logsval,
                tb.back.logsval,
                target,
            );
        }

        if target < tb.xs_front {
            let ia = tb.imiddle_low - 1;
            return invert_alpha_interval(
                tb.front.alpha,
                tb.front.sval,
                grid[ia + 1],
                row[ia + 1],
                tb.front.logsval,
                logrow[ia + 1],
                target,
            );
        }
        target -= tb.xs_front;

        if target < tb.xs_middle {
            // walk whole bins of the middle section
            for ia in tb.imiddle_low..tb.imiddle_upp {
                let bin = integrate_alpha_interval(
                    grid[ia],
                    row[ia],
                    grid[ia + 1],
                    row[ia + 1],
                    logrow[ia],
                    logrow[ia + 1],
                );
                if target < bin {
                    return invert_alpha_interval(
                        grid[ia],
                        row[ia],
                        grid[ia + 1],
                        row[ia + 1],
                        logrow[ia],
                        logrow[ia + 1],
                        target,
                    );
                }
                target -= bin;
            }
        } else {
            target -= tb.xs_middle;
        }

        if tb.xs_back > 0.0 {
            let ia = tb.imiddle_upp;
            return invert_alpha_interval(
                grid[ia],
                row[ia],
                tb.back.alpha,
                tb.back.sval,
                logrow[ia],
                tb.back.logsval,
                target.min(tb.xs_back),
            );
        }
        tb.back.alpha.max(grid[tb.imiddle_upp])
    }
}

#[derive(Debug, Clone, Copy)]
struct CellWeight {
    ib_lo: usize,
    range: (usize, usize),
    beta_lo: f64,
    beta_hi: f64,
    f_lo: f64,
    f_hi: f64,
    weight: f64,
}

// Inverse CDF of the density (1-t)*f0 + t*f1 on t in [0,1]
fn sample_linear_density(f0: f64, f1: f64, u: f64) -> f64 {
    let total = f0 + f1;
    if !(total > 0.0) {
        return u;
    }
    let k = f1 - f0;
    if k.abs() < 1e-12 * total {
        return u;
    }
    // CDF: (f0*t + 0.5*k*t^2) / (0.5*total) = u
    let target = u * 0.5 * total;
    let d = (f0 * f0 + 2.0 * k * target).max(0.0);
    ((d.sqrt() - f0) / k).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{canonicalize, KnlType, ScatKnlData};

    // A smooth symmetric-input kernel over a decent grid
    fn toy_eval() -> SabEval {
        let alpha: Vec<f64> = (1..=60).map(|i| 0.1 * i as f64).collect();
        let beta_half: Vec<f64> = (0..=30).map(|i| 0.2 * i as f64).collect();
        let mut sab = Vec::new();
        for b in &beta_half {
            for a in &alpha {
                // roughly gaussian in alpha, decaying in |beta|
                sab.push((-(a - 1.5) * (a - 1.5) / 0.8 - 0.3 * b).exp());
            }
        }
        let data = canonicalize(ScatKnlData {
            alpha,
            beta: beta_half,
            sab,
            temperature: 293.15,
            bound_xs: 5.0,
            mass_amu: 12.0,
            knltype: KnlType::ScaledSymSab,
            suggested_emax: None,
        })
        .unwrap();
        SabEval::new(Arc::new(data))
    }

    #[test]
    fn cross_section_positive_and_finite() {
        let eval = toy_eval();
        for ekin in [1e-4, 1e-3, 0.0253, 0.1] {
            let xs = eval.cross_section(ekin);
            assert!(xs.is_finite() && xs > 0.0, "xs={xs} at E={ekin}");
        }
        assert_eq!(eval.cross_section(0.0), 0.0);
    }

    #[test]
    fn sampled_pairs_are_kinematically_allowed() {
        let eval = toy_eval();
        let ekin = 0.0253;
        let e = ekin / eval.kt();
        let mut state = 0x9e3779b97f4a7c15_u64;
        let mut rng = move || {
            // xorshift-style test generator, fixed sequence
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        for _ in 0..500 {
            let (alpha, beta) = eval.sample_alpha_beta(ekin, &mut rng).unwrap();
            assert!(beta >= -e - 1e-12);
            let (alow, aupp) = alpha_limits(e, beta, eval.data().mass_amu / nxtal_utils::NEUTRON_MASS_AMU);
            // sampled alpha must lie in the accessible interval clipped to
            // the grid
            let glo = eval.data().alpha[0];
            let ghi = *eval.data().alpha.last().unwrap();
            assert!(alpha >= alow.max(glo) - 1e-9, "alpha {alpha} below {alow}");
            assert!(alpha <= aupp.min(ghi) + 1e-9, "alpha {alpha} above {aupp}");
        }
    }

    #[test]
    fn cross_section_scales_with_bound_xs() {
        let eval = toy_eval();
        let mut data2 = (**eval.data()).clone();
        data2.bound_xs *= 2.0;
        let eval2 = SabEval::new(Arc::new(data2));
        let e = 0.0253;
        let ratio = eval2.cross_section(e) / eval.cross_section(e);
        assert!((ratio - 2.0).abs() < 1e-12);
    }
}
