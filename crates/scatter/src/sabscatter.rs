//! Inelastic scattering driven by an S(α,β) kernel

// crate modules
use crate::error::{Error, Result};
use crate::process::{direction_at_mu, Outcome, Scatter};
use crate::rng::RngSource;

// external crates
use nalgebra::Vector3;

// nxtal modules
use nxtal_sab::{SabData, SabEval};
use nxtal_utils::NEUTRON_MASS_AMU;

// standard library
use std::sync::Arc;

/// Kernel-driven inelastic scattering
///
/// Cross sections come from the kernel evaluator's active-range integral;
/// sampling draws a (β, α) pair by inverse CDF on the accessible region and
/// converts it back to the outgoing state:
///
/// `E' = E + β·kT`, `μ = (E + E' − α·A·kT)/(2·√(E·E'))`.
#[derive(Debug, Clone)]
pub struct SabScatter {
    eval: SabEval,
    mass_ratio: f64,
}

impl SabScatter {
    /// Wrap a canonical kernel
    pub fn new(data: Arc<SabData>) -> Result<Self> {
        data.validate()?;
        let mass_ratio = data.mass_amu / NEUTRON_MASS_AMU;
        Ok(Self {
            eval: SabEval::new(data),
            mass_ratio,
        })
    }
}

impl Scatter for SabScatter {
    fn name(&self) -> &'static str {
        "sabscatter"
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    fn cross_section(&self, ekin: f64, _direction: &Vector3<f64>) -> Result<f64> {
        Ok(self.eval.cross_section(ekin))
    }

    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        rng: &mut dyn RngSource,
    ) -> Result<Outcome> {
        let mut draw = || rng.generate();
        let (alpha, beta) = self
            .eval
            .sample_alpha_beta(ekin, &mut draw)
            .ok_or_else(|| {
                Error::CalcError(format!(
                    "kernel sampling requested at energy {ekin} where the cross section \
                     vanishes"
                ))
            })?;

        let kt = self.eval.kt();
        let ekin_out = (ekin + beta * kt).max(1e-12 * ekin);
        let mu = (ekin + ekin_out - alpha * self.mass_ratio * kt)
            / (2.0 * (ekin * ekin_out).sqrt());
        Ok(Outcome {
            direction: direction_at_mu(direction, mu, rng),
            ekin: ekin_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxtal_utils::BOLTZMANN;
    use nxtal_vdos::{expand_to_sab, ExpandCfg, VdosData};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn aluminium_kernel() -> SabScatter {
        let vdos = VdosData::debye(410.4).unwrap();
        let cfg = ExpandCfg {
            temperature: 293.15,
            bound_xs: 1.503, // bound scattering xs of Al
            mass_amu: 26.98,
            vdoslux: 1,
        };
        let data = expand_to_sab(&vdos, &cfg).unwrap();
        SabScatter::new(Arc::new(data)).unwrap()
    }

    #[test]
    fn cross_section_behaviour() {
        let knl = aluminium_kernel();
        let dir = Vector3::z();
        let thermal = knl.cross_section(0.0253, &dir).unwrap();
        assert!(thermal.is_finite() && thermal > 0.0);
        assert_eq!(knl.cross_section(0.0, &dir).unwrap(), 0.0);
    }

    #[test]
    fn sampling_conserves_detailed_kinematics() {
        let knl = aluminium_kernel();
        let dir = Vector3::z();
        let ekin = 0.0253;
        let kt = BOLTZMANN * 293.15;
        let mut rng = StdRng::seed_from_u64(31);
        for _ in 0..300 {
            let out = knl.sample_scatter(ekin, &dir, &mut rng).unwrap();
            assert!(out.ekin > 0.0);
            assert!((out.direction.norm() - 1.0).abs() < 1e-9);
            // energy transfer must stay within the kernel's beta reach
            let beta = (out.ekin - ekin) / kt;
            assert!(beta.abs() < 100.0, "unphysical transfer beta={beta}");
        }
    }

    #[test]
    fn thermal_equilibrium_has_balanced_transfers() {
        // at E ~ kT, both up- and down-scattering must occur
        let knl = aluminium_kernel();
        let dir = Vector3::z();
        let ekin = 0.0253;
        let mut rng = StdRng::seed_from_u64(17);
        let (mut up, mut down) = (0, 0);
        for _ in 0..500 {
            let out = knl.sample_scatter(ekin, &dir, &mut rng).unwrap();
            if out.ekin > ekin {
                up += 1;
            } else {
                down += 1;
            }
        }
        assert!(up > 50 && down > 50, "up={up} down={down}");
    }
}
