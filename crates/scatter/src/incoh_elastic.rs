//! Incoherent-elastic scattering with Debye–Waller suppression

// crate modules
use crate::error::{Error, Result};
use crate::process::{direction_at_mu, Outcome, Scatter};
use crate::rng::RngSource;

// external crates
use nalgebra::Vector3;

// nxtal modules
use nxtal_info::Info;
use nxtal_utils::ekin2ksq;

// One element's contribution: bound incoherent xs and its displacement
#[derive(Debug, Clone, Copy)]
struct ElementTerm {
    weight_xs: f64,
    msd: f64,
}

/// Incoherent-elastic scattering
///
/// With an isotropic Debye–Waller factor `exp(−q²·msd)` the angular
/// average has a closed form: per element,
///
/// `σ(E) = σ_inc·(1 − e^(−4k²·msd))/(4k²·msd)`
///
/// which tends to the full bound value at low energy and is suppressed as
/// displacements blur the interference. Sampling inverts the analytic
/// angular CDF, `p(μ) ∝ exp(−2k²·msd·(1−μ))`, and leaves the energy
/// unchanged.
#[derive(Debug)]
pub struct IncohElastic {
    terms: Vec<ElementTerm>,
}

impl IncohElastic {
    /// Build from a material's composition and mean-square displacements
    pub fn new(info: &Info) -> Result<Self> {
        let mut terms = Vec::new();
        for (fraction, atom) in info.composition() {
            let weight_xs = fraction * atom.data.incoherent_xs();
            if weight_xs <= 0.0 {
                continue;
            }
            // displacements from the atom roles; a missing MSD leaves the
            // element unsuppressed (the msd -> 0 limit)
            let msd = info
                .atoms()
                .iter()
                .find(|ai| ai.atom.index == atom.index)
                .and_then(|ai| ai.msd)
                .unwrap_or(0.0);
            terms.push(ElementTerm { weight_xs, msd });
        }
        if terms.is_empty() {
            return Err(Error::BadSetup(
                "material has no incoherent scattering power".to_string(),
            ));
        }
        Ok(Self { terms })
    }

    fn term_xs(term: &ElementTerm, ksq: f64) -> f64 {
        let arg = 4.0 * ksq * term.msd;
        if arg < 1e-9 {
            term.weight_xs
        } else {
            term.weight_xs * (1.0 - (-arg).exp()) / arg
        }
    }
}

impl Scatter for IncohElastic {
    fn name(&self) -> &'static str {
        "incohelastic"
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    fn cross_section(&self, ekin: f64, _direction: &Vector3<f64>) -> Result<f64> {
        if !(ekin > 0.0) {
            return Ok(0.0);
        }
        let ksq = ekin2ksq(ekin);
        Ok(self.terms.iter().map(|t| Self::term_xs(t, ksq)).sum())
    }

    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        rng: &mut dyn RngSource,
    ) -> Result<Outcome> {
        let ksq = ekin2ksq(ekin);
        let total: f64 = self.terms.iter().map(|t| Self::term_xs(t, ksq)).sum();
        if !(total > 0.0) {
            return Err(Error::CalcError(
                "incoherent-elastic sampling with vanishing cross section".to_string(),
            ));
        }
        let mut target = rng.generate() * total;
        let mut chosen = self.terms[self.terms.len() - 1];
        for term in &self.terms {
            let xs = Self::term_xs(term, ksq);
            if target < xs {
                chosen = *term;
                break;
            }
            target -= xs;
        }

        // invert p(mu) ~ exp(-a*(1-mu)) on [-1,1] with a = 2k^2 msd
        let a = 2.0 * ksq * chosen.msd;
        let mu = if a < 1e-9 {
            2.0 * rng.generate() - 1.0
        } else {
            let u = rng.generate();
            let t = -(1.0 - u * (1.0 - (-2.0 * a).exp())).ln() / a;
            (1.0 - t).clamp(-1.0, 1.0)
        };
        Ok(Outcome {
            direction: direction_at_mu(direction, mu, rng),
            ekin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxtal_info::{load_ncmat, NcmatLoadCfg};
    use nxtal_ncmat::parse_ncmat;
    use nxtal_textsrc::MemorySource;
    use nxtal_utils::wl2ekin;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const V_CRYSTAL: &str = "NCMAT v2
@CELL
lengths 3.024 3.024 3.024
angles 90 90 90
@SPACEGROUP
229
@ATOMPOSITIONS
V 0 0 0
V 1/2 1/2 1/2
@DEBYETEMPERATURE
V 380.0
";

    fn vanadium() -> IncohElastic {
        let data = parse_ncmat(Box::new(MemorySource::new("V.ncmat", V_CRYSTAL))).unwrap();
        let cfg = NcmatLoadCfg {
            dcutoff: 1.0,
            ..Default::default()
        };
        let info = load_ncmat(&data, &cfg).unwrap();
        IncohElastic::new(&info).unwrap()
    }

    #[test]
    fn bound_value_at_low_energy_and_suppression_at_high() {
        let incoh = vanadium();
        let dir = Vector3::z();
        let low = incoh.cross_section(1e-6, &dir).unwrap();
        // vanadium sigma_inc = 5.08 b
        assert!((low - 5.08).abs() < 0.01, "low-E xs {low}");

        let thermal = incoh.cross_section(wl2ekin(1.8), &dir).unwrap();
        let hot = incoh.cross_section(1.0, &dir).unwrap();
        assert!(thermal < low);
        assert!(hot < thermal);
        assert!(hot > 0.0);
    }

    #[test]
    fn sampling_is_elastic_and_forward_biased_when_suppressed() {
        let incoh = vanadium();
        let dir = Vector3::z();
        let ekin = 1.0;
        let mut rng = StdRng::seed_from_u64(5);
        let mut mu_sum = 0.0;
        let n = 2000;
        for _ in 0..n {
            let out = incoh.sample_scatter(ekin, &dir, &mut rng).unwrap();
            assert_eq!(out.ekin, ekin);
            mu_sum += out.direction.dot(&dir);
        }
        // Debye-Waller damping favours small momentum transfer
        assert!(mu_sum / n as f64 > 0.05, "mean mu {}", mu_sum / n as f64);
    }
}
