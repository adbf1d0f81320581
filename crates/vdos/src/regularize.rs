//! Regularization of tabulated phonon spectra

// crate modules
use crate::error::{Error, Result};

// nxtal modules
use nxtal_utils::{GridExt, BOLTZMANN};

/// A phonon density of states on a regular grid
///
/// The working grid is linear with spacing `de` and commensurate with zero
/// (`egrid[k] = (k+1)·de`, last point at `emax`), with the density
/// normalized to unit integral assuming a quadratic onset below the first
/// point. The original tabulation is kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct VdosData {
    /// Regular energy grid \[eV\], `egrid[k] = (k+1)·de`
    pub egrid: Vec<f64>,
    /// Normalized density on [VdosData::egrid]
    pub density: Vec<f64>,
    /// The energy grid as supplied (possibly the `[emin,emax]` pair form)
    pub orig_egrid: Vec<f64>,
    /// The density as supplied
    pub orig_density: Vec<f64>,
}

impl VdosData {
    /// Build from raw tabulation
    ///
    /// `egrid` is either the two-value `[emin,emax]` form (with `density`
    /// defining an implicit linear grid between them) or a full grid
    /// matching `density` point-wise.
    pub fn from_raw(egrid: &[f64], density: &[f64]) -> Result<Self> {
        let (in_egrid, in_density): (Vec<f64>, Vec<f64>) = match egrid.len() {
            2 => {
                if !(egrid[0] >= 0.0 && egrid[0] < egrid[1]) {
                    return Err(Error::BadVdos(
                        "two-value energy grid must be an increasing [emin,emax] pair".into(),
                    ));
                }
                if density.len() < 5 {
                    return Err(Error::BadVdos(
                        "density needs at least 5 points for an [emin,emax] grid".into(),
                    ));
                }
                let n = density.len();
                let de = (egrid[1] - egrid[0]) / (n - 1) as f64;
                let grid = (0..n).map(|i| egrid[0] + de * i as f64).collect();
                (grid, density.to_vec())
            }
            _ => {
                if !egrid.is_grid() || egrid[0] < 0.0 {
                    return Err(Error::BadVdos(
                        "energy grid must be strictly increasing and non-negative".into(),
                    ));
                }
                if egrid.len() != density.len() {
                    return Err(Error::BadVdos(format!(
                        "density has {} entries but the energy grid has {}",
                        density.len(),
                        egrid.len()
                    )));
                }
                (egrid.to_vec(), density.to_vec())
            }
        };
        if in_density.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(Error::BadVdos(
                "density values must be finite and non-negative".into(),
            ));
        }
        if !in_density.iter().any(|d| *d > 0.0) {
            return Err(Error::BadVdos(
                "density must contain at least one positive value".into(),
            ));
        }

        let emax = *in_egrid.last().expect("grid is non-empty");
        let emin = in_egrid[0].max(emax * 1e-6);

        // pick a spacing that keeps the input resolution and makes the grid
        // commensurate with zero
        let in_spacing = (emax - in_egrid[0]) / (in_egrid.len() - 1).max(1) as f64;
        let nbins = (emax / in_spacing.max(emax * 1e-4)).ceil() as usize;
        let nbins = nbins.clamp(10, 20_000);
        let de = emax / nbins as f64;

        let egrid: Vec<f64> = (1..=nbins).map(|k| de * k as f64).collect();
        let mut density: Vec<f64> = {
            let interp = |e: f64| -> f64 {
                if e <= emin {
                    // quadratic onset anchored to the first tabulated point
                    let first = in_density[0];
                    return first * (e / emin) * (e / emin);
                }
                match in_egrid.find_interval(e) {
                    Some(i) => {
                        let t = (e - in_egrid[i]) / (in_egrid[i + 1] - in_egrid[i]);
                        in_density[i] + t * (in_density[i + 1] - in_density[i])
                    }
                    None => 0.0,
                }
            };
            egrid.iter().map(|e| interp(*e)).collect()
        };

        // unit normalization, counting the quadratic onset bin
        let mut integral = density[0] * egrid[0] / 3.0;
        for i in 1..density.len() {
            integral += 0.5 * (density[i - 1] + density[i]) * de;
        }
        if !(integral > 0.0) {
            return Err(Error::BadVdos("density integrates to zero".into()));
        }
        for d in &mut density {
            *d /= integral;
        }

        Ok(Self {
            egrid,
            density,
            orig_egrid: in_egrid,
            orig_density: in_density,
        })
    }

    /// The idealized Debye spectrum for the given Debye temperature \[K\]
    ///
    /// Density rises quadratically up to the cutoff `kB·θD` and vanishes
    /// above it.
    pub fn debye(debye_temp: f64) -> Result<Self> {
        if !(debye_temp > 0.0) {
            return Err(Error::BadVdos("Debye temperature must be positive".into()));
        }
        let cutoff = BOLTZMANN * debye_temp;
        let n = 200;
        let egrid: Vec<f64> = (0..n).map(|i| cutoff * (i + 1) as f64 / n as f64).collect();
        let density: Vec<f64> = egrid.iter().map(|e| e * e).collect();
        Self::from_raw(&egrid, &density)
    }

    /// Upper end of the spectrum \[eV\]
    pub fn emax(&self) -> f64 {
        *self.egrid.last().expect("grid is non-empty")
    }

    /// Grid spacing \[eV\]
    pub fn spacing(&self) -> f64 {
        self.egrid[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regularized_grid_is_zero_anchored() {
        let egrid = [0.002, 0.04];
        let density = [0.1, 0.4, 0.9, 1.6, 2.0, 1.2, 0.3];
        let vdos = VdosData::from_raw(&egrid, &density).unwrap();
        let de = vdos.spacing();
        for (k, e) in vdos.egrid.iter().enumerate() {
            assert!((e - de * (k + 1) as f64).abs() < 1e-12);
        }
        assert!((vdos.emax() - 0.04).abs() < 1e-12);
    }

    #[test]
    fn density_is_normalized() {
        let vdos = VdosData::debye(400.0).unwrap();
        let de = vdos.spacing();
        let mut integral = vdos.density[0] * vdos.egrid[0] / 3.0;
        for i in 1..vdos.density.len() {
            integral += 0.5 * (vdos.density[i - 1] + vdos.density[i]) * de;
        }
        assert!((integral - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(VdosData::from_raw(&[0.04, 0.002], &[1.0; 7]).is_err());
        assert!(VdosData::from_raw(&[0.002, 0.04], &[1.0; 3]).is_err());
        assert!(VdosData::from_raw(&[0.0, 0.01, 0.02], &[0.0, 0.0, 0.0]).is_err());
        assert!(VdosData::debye(-1.0).is_err());
    }
}
