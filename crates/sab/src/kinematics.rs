//! Kinematically accessible regions of a tabulated kernel

// crate modules
use crate::data::SabData;

// nxtal modules
use nxtal_utils::NEUTRON_MASS_AMU;

/// Inclusive index pair `(i_lo, i_hi)` into the α grid
///
/// The α interval `[grid[i_lo], grid[i_hi]]` covers the accessible range; an
/// empty range is encoded as `(n, n)` with `n` the grid length.
pub type AlphaRange = (usize, usize);

/// Kinematic α limits at reduced energy `e = E/kT` and energy transfer β
///
/// `α±= (√e ± √(e+β))²/A` with A the target-to-neutron mass ratio. Returns
/// `(α⁻, α⁺)`; callers must ensure `β > −e` (otherwise the final energy
/// would be negative and nothing is accessible).
pub fn alpha_limits(ekin_div_kt: f64, beta: f64, mass_ratio: f64) -> (f64, f64) {
    let sqrt_e = ekin_div_kt.sqrt();
    let sqrt_ef = (ekin_div_kt + beta).max(0.0).sqrt();
    let lo = sqrt_e - sqrt_ef;
    let hi = sqrt_e + sqrt_ef;
    (lo * lo / mass_ratio, hi * hi / mass_ratio)
}

pub(crate) fn mass_ratio(data: &SabData) -> f64 {
    data.mass_amu / NEUTRON_MASS_AMU
}

/// Per-β-point accessible α grid ranges at reduced energy `e = E/kT`
///
/// Returns the ranges for β grid indices from `ibeta_low` upward (β points
/// below it have nothing accessible). At each β grid point, the search for
/// the bracketing α grid points starts from the result at the previous β
/// point; the kinematic boundaries are smooth so this walk is cheap.
pub fn active_grid_ranges(data: &SabData, ekin_div_kt: f64) -> (Vec<AlphaRange>, usize) {
    let grid = &data.alpha;
    let n = grid.len();
    let a_ratio = mass_ratio(data);
    let front = grid[0];
    let back = grid[n - 1];

    let mut out: Vec<AlphaRange> = Vec::new();
    let mut ibeta_low = 0usize;
    let mut ilow = 0usize;
    let mut iupp = n - 1;

    for (ibeta, beta) in data.beta.iter().enumerate() {
        let (mut alow, mut aupp) = (-1.0, -2.0);
        if *beta > -ekin_div_kt {
            (alow, aupp) = alpha_limits(ekin_div_kt, *beta, a_ratio);
        }
        if back <= alow || front >= aupp || aupp < alow {
            // no accessible alpha range at this beta point (or the energy is
            // so low that numerical imprecision gave aupp == alow)
            if out.is_empty() {
                ibeta_low = ibeta + 1;
            } else {
                out.push((n, n));
            }
            continue;
        }

        while grid[ilow] > alow && ilow > 0 {
            ilow -= 1;
        }
        while ilow < n - 1 && grid[ilow + 1] <= alow {
            ilow += 1;
        }
        if iupp < ilow {
            iupp = ilow;
        }
        while grid[iupp] < aupp && iupp < n - 1 {
            iupp += 1;
        }
        while iupp > 0 && grid[iupp - 1] >= aupp {
            iupp -= 1;
        }
        out.push((ilow, iupp));
    }

    (out, ibeta_low)
}

/// Accessible α ranges per β *cell* at reduced energy `e = E/kT`
///
/// A cell spans two consecutive β grid points; its range is the union of the
/// ranges at the endpoints. Returns the cell ranges from `ibeta_low` upward,
/// where cell `i` lies between β indices `ibeta_low+i` and `ibeta_low+i+1`.
///
/// Any cell containing β=0 is extended down to the first α grid point: the
/// slope of α⁻(β) changes sign there, so the true minimum over the cell lies
/// below both endpoint values.
pub fn active_grid_cells(data: &SabData, ekin_div_kt: f64) -> (Vec<AlphaRange>, usize) {
    let n = data.alpha.len();
    let (ranges, ibeta_low_1d) = active_grid_ranges(data, ekin_div_kt);

    let mut out: Vec<AlphaRange> = Vec::new();
    if ranges.is_empty() {
        return (out, data.beta.len());
    }

    let mut ibeta_low = ibeta_low_1d;
    let straddles_zero = |ib: usize| -> bool {
        let lo = data.beta[ib];
        let hi = data.beta[ib + 1];
        lo <= 0.0 && 0.0 <= hi
    };

    if ibeta_low_1d > 0 {
        // the first cell reaches one bin below the first active grid point
        // and only its upper edge carries an active range
        ibeta_low -= 1;
        out.push(ranges[0]);
        if straddles_zero(ibeta_low) {
            out.last_mut().expect("pushed above").0 = 0;
        }
    }

    for i in 0..ranges.len().saturating_sub(1) {
        let r0 = ranges[i];
        let r1 = ranges[i + 1];
        let r0_empty = r0.0 >= n;
        let r1_empty = r1.0 >= n;
        let merged = if r0_empty {
            r1 // both empty is still correct: an empty cell
        } else if r1_empty {
            r0
        } else {
            (r0.0.min(r1.0), r0.1.max(r1.1))
        };
        out.push(merged);
        let cell_ib = ibeta_low_1d + i;
        if straddles_zero(cell_ib) {
            out.last_mut().expect("pushed above").0 = 0;
        }
    }

    (out, ibeta_low)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_data() -> SabData {
        let alpha: Vec<f64> = (1..=40).map(|i| 0.05 * i as f64).collect();
        let beta: Vec<f64> = (-20..=20).map(|i| 0.25 * i as f64).collect();
        let sab = vec![1.0; alpha.len() * beta.len()];
        SabData {
            alpha,
            beta,
            sab,
            temperature: 293.15,
            bound_xs: 1.0,
            mass_amu: NEUTRON_MASS_AMU, // mass ratio 1 keeps numbers simple
            suggested_emax: None,
        }
    }

    #[test]
    fn limits_bracket_the_elastic_point() {
        // at beta=0 the limits are 0 and 4e/A
        let (lo, hi) = alpha_limits(2.0, 0.0, 1.0);
        assert!(lo.abs() < 1e-14);
        assert!((hi - 8.0).abs() < 1e-12);
    }

    #[test]
    fn ranges_cover_accessible_band() {
        let data = toy_data();
        let e = 1.0;
        let (ranges, ibeta_low) = active_grid_ranges(&data, e);
        assert_eq!(ranges.len() + ibeta_low, data.beta.len());
        // all betas above -e are at least partly accessible here
        for (i, range) in ranges.iter().enumerate() {
            let beta = data.beta[ibeta_low + i];
            let (alow, aupp) = alpha_limits(e, beta, 1.0);
            assert!(range.0 < data.alpha.len(), "empty range at beta={beta}");
            // the bracketing grid points sit just outside the limits
            if range.0 > 0 {
                assert!(data.alpha[range.0] <= alow.max(data.alpha[0]) + 1e-12);
            }
            if range.1 < data.alpha.len() - 1 {
                assert!(data.alpha[range.1] >= aupp.min(*data.alpha.last().unwrap()) - 1e-12);
            }
        }
    }

    #[test]
    fn enlarging_energy_only_adds_cells() {
        let data = toy_data();
        let mut previous = 0usize;
        for e in [0.05, 0.2, 0.5, 1.0, 2.0, 5.0] {
            let (cells, _) = active_grid_cells(&data, e);
            let active = cells.iter().filter(|c| c.0 < data.alpha.len()).count();
            assert!(
                active >= previous,
                "active cell count shrank from {previous} to {active} at e={e}"
            );
            previous = active;
        }
    }

    #[test]
    fn zero_straddling_cell_reaches_lowest_alpha() {
        let data = toy_data();
        let (cells, ibeta_low) = active_grid_cells(&data, 0.6);
        for (i, cell) in cells.iter().enumerate() {
            let lo = data.beta[ibeta_low + i];
            let hi = data.beta[ibeta_low + i + 1];
            if lo <= 0.0 && 0.0 <= hi {
                assert_eq!(cell.0, 0, "cell [{lo},{hi}] does not reach alpha grid start");
            }
        }
    }
}
