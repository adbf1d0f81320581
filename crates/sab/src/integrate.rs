//! Interpolation and integration primitives over α intervals
//!
//! Within a grid interval S is interpolated log-linearly in α (exponential
//! through the endpoints), falling back to linear interpolation when either
//! endpoint vanishes. Log-linear behaves far better than polynomials on the
//! many-decades dynamic range of real kernels.

/// Interpolate S at `alpha` inside `[a0,a1]`, given the endpoint values and
/// their (precomputed) logarithms
pub fn interp_loglin(a0: f64, s0: f64, a1: f64, s1: f64, alpha: f64, logs0: f64, logs1: f64) -> f64 {
    debug_assert!(a0 <= alpha && alpha <= a1);
    if a1 == a0 {
        return s0;
    }
    let t = (alpha - a0) / (a1 - a0);
    if s0 > 0.0 && s1 > 0.0 {
        (logs0 + t * (logs1 - logs0)).exp()
    } else {
        s0 + t * (s1 - s0)
    }
}

/// Integral of the interpolant over the full interval `[a0,a1]`
pub fn integrate_alpha_interval(a0: f64, s0: f64, a1: f64, s1: f64, logs0: f64, logs1: f64) -> f64 {
    let width = a1 - a0;
    if width <= 0.0 {
        return 0.0;
    }
    if s0 > 0.0 && s1 > 0.0 {
        let r = logs1 - logs0;
        if r.abs() > 1e-9 {
            return width * (s1 - s0) / r;
        }
    }
    0.5 * (s0 + s1) * width
}

/// Invert the interval integral: the α at which the running integral from
/// `a0` reaches `target` (0 ≤ target ≤ full interval integral)
pub(crate) fn invert_alpha_interval(
    a0: f64,
    s0: f64,
    a1: f64,
    s1: f64,
    logs0: f64,
    logs1: f64,
    target: f64,
) -> f64 {
    let width = a1 - a0;
    if width <= 0.0 || target <= 0.0 {
        return a0;
    }
    if s0 > 0.0 && s1 > 0.0 {
        let r = (logs1 - logs0) / width;
        if r.abs() > 1e-9 / width.max(1e-300) {
            // S(x) = s0*exp(r*(x-a0)); integral = s0/r*(exp(r*d)-1) = target
            let arg = 1.0 + target * r / s0;
            if arg > 0.0 {
                return (a0 + arg.ln() / r).clamp(a0, a1);
            }
        }
    }
    // linear form: s0*d + 0.5*k*d^2 = target with k the slope
    let k = (s1 - s0) / width;
    if k.abs() < 1e-300 {
        if s0 > 0.0 {
            return (a0 + target / s0).clamp(a0, a1);
        }
        return a1;
    }
    let disc = (s0 * s0 + 2.0 * k * target).max(0.0);
    (a0 + (disc.sqrt() - s0) / k).clamp(a0, a1)
}

/// One clipped tail point of an integration range
#[derive(Debug, Default, Clone, Copy)]
pub struct TailPoint {
    /// The α value of the point
    pub alpha: f64,
    /// Interpolated S value there
    pub sval: f64,
    /// `ln(S)`, −∞ when S vanishes
    pub logsval: f64,
}

/// Breakdown of an α-range integral into front tail, precomputed middle,
/// and back tail
///
/// "Narrow" ranges touch a single grid bin and integrate front-to-back
/// directly (the entire result sits in `xs_front`). Otherwise the middle
/// part spans whole grid bins and is looked up in a cumulative-integral
/// table, with partial bins at each end handled explicitly.
#[derive(Debug, Default, Clone)]
pub struct TailedBreakdown {
    /// Single-bin case: everything is in `xs_front`
    pub narrow: bool,
    /// Clipped entry point
    pub front: TailPoint,
    /// Clipped exit point
    pub back: TailPoint,
    /// Integral over the front partial bin (or the whole narrow range)
    pub xs_front: f64,
    /// Integral over the back partial bin
    pub xs_back: f64,
    /// Integral over the whole-bin middle section
    pub xs_middle: f64,
    /// First α grid index of the middle section
    pub imiddle_low: usize,
    /// Last α grid index of the middle section
    pub imiddle_upp: usize,
}

impl TailedBreakdown {
    /// Total integral over the clipped range
    pub fn total(&self) -> f64 {
        self.xs_front + self.xs_middle + self.xs_back
    }
}

fn tail_point(grid: &[f64], sab: &[f64], logsab: &[f64], idx: usize, alpha: f64) -> TailPoint {
    let sval = interp_loglin(
        grid[idx],
        sab[idx],
        grid[idx + 1],
        sab[idx + 1],
        alpha,
        logsab[idx],
        logsab[idx + 1],
    );
    TailPoint {
        alpha,
        sval,
        logsval: if sval > 0.0 { sval.ln() } else { f64::NEG_INFINITY },
    }
}

/// Build the tailed breakdown of `∫ S dα` over `[alpha_low, alpha_upp]`
///
/// `aidx_low`/`aidx_upp` bracket the range on the grid (as produced by the
/// kinematics module) and `cumul[i]` holds the integral of the row from the
/// grid start through grid point `i`. Values outside the grid count as zero,
/// so the range is clamped to the grid first.
pub(crate) fn tailed_breakdown(
    grid: &[f64],
    sab: &[f64],
    logsab: &[f64],
    cumul: &[f64],
    alpha_low: f64,
    alpha_upp: f64,
    aidx_low: usize,
    aidx_upp: usize,
) -> TailedBreakdown {
    debug_assert!(alpha_low <= alpha_upp);
    debug_assert!(aidx_low <= aidx_upp && aidx_upp < grid.len());

    let alpha_low = alpha_low.clamp(grid[0], grid[grid.len() - 1]);
    let alpha_upp = alpha_upp.clamp(grid[0], grid[grid.len() - 1]);

    let mut tb = TailedBreakdown::default();
    if aidx_low == aidx_upp || alpha_low == alpha_upp {
        return tb; // vanishing range
    }

    if aidx_low + 1 == aidx_upp {
        // narrow case, only one bin touched
        tb.narrow = true;
        tb.front = tail_point(grid, sab, logsab, aidx_low, alpha_low);
        tb.back = tail_point(grid, sab, logsab, aidx_low, alpha_upp);
        tb.xs_front = integrate_alpha_interval(
            tb.front.alpha,
            tb.front.sval,
            tb.back.alpha,
            tb.back.sval,
            tb.front.logsval,
            tb.back.logsval,
        );
        return tb;
    }

    tb.imiddle_low = aidx_low;
    tb.imiddle_upp = aidx_upp;

    // front tail is absent when alpha_low clamps to the grid edge
    if alpha_low >= grid[aidx_low] {
        tb.front = tail_point(grid, sab, logsab, aidx_low, alpha_low);
        tb.xs_front = integrate_alpha_interval(
            tb.front.alpha,
            tb.front.sval,
            grid[aidx_low + 1],
            sab[aidx_low + 1],
            tb.front.logsval,
            logsab[aidx_low + 1],
        );
        tb.imiddle_low += 1;
    }
    // back tail is absent when alpha_upp clamps to the grid edge
    if alpha_upp <= grid[aidx_upp] {
        tb.back = tail_point(grid, sab, logsab, aidx_upp - 1, alpha_upp);
        tb.xs_back = integrate_alpha_interval(
            grid[aidx_upp - 1],
            sab[aidx_upp - 1],
            tb.back.alpha,
            tb.back.sval,
            logsab[aidx_upp - 1],
            tb.back.logsval,
        );
        tb.imiddle_upp -= 1;
    }
    if tb.imiddle_upp > tb.imiddle_low {
        tb.xs_middle = cumul[tb.imiddle_upp] - cumul[tb.imiddle_low];
    }
    tb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loglin_is_exact_on_exponentials() {
        // S = exp(-2*alpha) through two points
        let (a0, a1) = (1.0, 2.0);
        let (s0, s1) = ((-2.0_f64).exp(), (-4.0_f64).exp());
        let s = interp_loglin(a0, s0, a1, s1, 1.5, s0.ln(), s1.ln());
        assert!((s - (-3.0_f64).exp()).abs() < 1e-14);

        let integral = integrate_alpha_interval(a0, s0, a1, s1, s0.ln(), s1.ln());
        let exact = 0.5 * ((-2.0_f64).exp() - (-4.0_f64).exp());
        assert!((integral - exact).abs() < 1e-14);
    }

    #[test]
    fn linear_fallback_with_zero_endpoint() {
        let integral = integrate_alpha_interval(0.0, 0.0, 1.0, 2.0, f64::NEG_INFINITY, 2.0_f64.ln());
        assert!((integral - 1.0).abs() < 1e-14);
    }

    #[test]
    fn inversion_matches_forward_integral() {
        let (a0, a1) = (0.5, 1.7);
        let (s0, s1): (f64, f64) = (2.0, 0.3);
        let (l0, l1) = (s0.ln(), s1.ln());
        let total = integrate_alpha_interval(a0, s0, a1, s1, l0, l1);
        for frac in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let alpha = invert_alpha_interval(a0, s0, a1, s1, l0, l1, frac * total);
            let partial = integrate_alpha_interval(
                a0,
                s0,
                alpha,
                interp_loglin(a0, s0, a1, s1, alpha, l0, l1),
                l0,
                if s0 > 0.0 { interp_loglin(a0, s0, a1, s1, alpha, l0, l1).ln() } else { f64::NEG_INFINITY },
            );
            assert!(
                (partial - frac * total).abs() < 1e-10 * total.max(1e-300),
                "inversion off at frac={frac}"
            );
        }
    }

    #[test]
    fn tailed_breakdown_sums_to_direct_integral() {
        // row S = exp(-alpha) on a uniform grid
        let grid: Vec<f64> = (0..11).map(|i| 0.2 * i as f64).collect();
        let sab: Vec<f64> = grid.iter().map(|a| (-a).exp()).collect();
        let logsab: Vec<f64> = sab.iter().map(|s| s.ln()).collect();
        let mut cumul = vec![0.0; grid.len()];
        for i in 1..grid.len() {
            cumul[i] = cumul[i - 1]
                + integrate_alpha_interval(
                    grid[i - 1],
                    sab[i - 1],
                    grid[i],
                    sab[i],
                    logsab[i - 1],
                    logsab[i],
                );
        }

        let tb = tailed_breakdown(&grid, &sab, &logsab, &cumul, 0.3, 1.7, 1, 9);
        let exact = 0.5 * ((-0.3_f64).exp() - (-1.7_f64).exp()) * 2.0;
        // loglin is exact on the exponential, so agreement is tight
        assert!((tb.total() - exact).abs() < 1e-12, "{} vs {exact}", tb.total());

        // narrow case agrees too
        let tb = tailed_breakdown(&grid, &sab, &logsab, &cumul, 0.45, 0.55, 2, 3);
        let exact = (-0.45_f64).exp() - (-0.55_f64).exp();
        assert!(tb.narrow);
        assert!((tb.total() - exact).abs() < 1e-12);
    }
}
