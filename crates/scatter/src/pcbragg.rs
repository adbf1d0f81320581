//! Coherent Bragg diffraction on powders

// crate modules
use crate::error::{Error, Result};
use crate::process::{direction_at_mu, Outcome, Scatter};
use crate::rng::RngSource;

// external crates
use nalgebra::Vector3;

// nxtal modules
use nxtal_info::Info;
use nxtal_utils::{ekin2wl, wl2ekin};

/// Powder Bragg diffraction
///
/// For an ideal powder, the coherent-elastic cross section per atom is
///
/// `σ(λ) = λ²/(2·V·N) · Σ_i m_i·d_i·|F_i|²`
///
/// summed over plane families with `2·d_i ≥ λ`, so σ drops to zero beyond
/// the longest Bragg edge at `λ = 2·d_max`. Sampling picks a family with
/// probability proportional to its term and emits the outgoing direction on
/// the Debye–Scherrer cone, `cos 2θ = 1 − λ²/(2·d²)`.
#[derive(Debug)]
pub struct PcBragg {
    // families sorted by d descending: (dspacing, m·d·|F|²)
    planes: Vec<(f64, f64)>,
    // 1/(2·V·N) prefactor
    xs_factor: f64,
    // energy below which no plane can satisfy Bragg
    threshold_ekin: f64,
}

impl PcBragg {
    /// Build from a material with structure and HKL information
    pub fn new(info: &Info) -> Result<Self> {
        let structure = info
            .structure()
            .ok_or_else(|| Error::BadSetup("powder Bragg needs structure info".to_string()))?;
        let hkl = info
            .hkl()
            .ok_or_else(|| Error::BadSetup("powder Bragg needs an HKL list".to_string()))?;
        if hkl.list.is_empty() {
            return Err(Error::BadSetup(
                "powder Bragg needs a non-empty HKL list".to_string(),
            ));
        }
        let planes: Vec<(f64, f64)> = hkl
            .list
            .iter()
            .map(|f| {
                (
                    f.dspacing,
                    f.multiplicity as f64 * f.dspacing * f.fsquared,
                )
            })
            .collect();
        let dmax = planes[0].0;
        Ok(Self {
            planes,
            xs_factor: 1.0 / (2.0 * structure.volume * structure.n_atoms as f64),
            threshold_ekin: wl2ekin(2.0 * dmax),
        })
    }

    // iterate families satisfying Bragg at this wavelength
    fn active(&self, wavelength: f64) -> impl Iterator<Item = &(f64, f64)> {
        self.planes
            .iter()
            .take_while(move |(d, _)| 2.0 * d >= wavelength)
    }
}

impl Scatter for PcBragg {
    fn name(&self) -> &'static str {
        "pcbragg"
    }

    fn domain(&self) -> (f64, f64) {
        (self.threshold_ekin, f64::INFINITY)
    }

    fn cross_section(&self, ekin: f64, _direction: &Vector3<f64>) -> Result<f64> {
        if ekin < self.threshold_ekin || !(ekin > 0.0) {
            return Ok(0.0);
        }
        let wl = ekin2wl(ekin);
        let sum: f64 = self.active(wl).map(|(_, fdm)| fdm).sum();
        Ok(wl * wl * self.xs_factor * sum)
    }

    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        rng: &mut dyn RngSource,
    ) -> Result<Outcome> {
        let wl = ekin2wl(ekin);
        let total: f64 = self.active(wl).map(|(_, fdm)| fdm).sum();
        if !(total > 0.0) {
            return Err(Error::CalcError(format!(
                "powder Bragg sampling requested at energy {ekin} where the cross \
                 section vanishes"
            )));
        }
        let mut target = rng.generate() * total;
        let mut dspacing = self.planes[0].0;
        for (d, fdm) in self.active(wl) {
            dspacing = *d;
            if target < *fdm {
                break;
            }
            target -= fdm;
        }
        // cos(2*theta) on the Debye-Scherrer cone
        let mu = 1.0 - wl * wl / (2.0 * dspacing * dspacing);
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
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const AL: &str = "NCMAT v2
@CELL
lengths 4.04958 4.04958 4.04958
angles 90 90 90
@SPACEGROUP
225
@ATOMPOSITIONS
Al 0 0 0
Al 0 1/2 1/2
Al 1/2 0 1/2
Al 1/2 1/2 0
@DEBYETEMPERATURE
Al 410.4
";

    fn al_powder() -> PcBragg {
        let data = parse_ncmat(Box::new(MemorySource::new("Al.ncmat", AL))).unwrap();
        let cfg = NcmatLoadCfg {
            dcutoff: 0.5,
            ..Default::default()
        };
        let info = load_ncmat(&data, &cfg).unwrap();
        PcBragg::new(&info).unwrap()
    }

    #[test]
    fn bragg_edge_at_2dmax() {
        let powder = al_powder();
        let d111 = 4.04958 / 3.0_f64.sqrt();
        let dir = Vector3::z();

        // finite below the edge wavelength, zero above it
        let xs = powder.cross_section(wl2ekin(2.0), &dir).unwrap();
        assert!(xs.is_finite() && xs > 0.0, "xs = {xs}");
        let beyond = powder.cross_section(wl2ekin(2.0 * d111 + 0.01), &dir).unwrap();
        assert_eq!(beyond, 0.0);

        // the domain encodes the same threshold
        assert!((powder.domain().0 - wl2ekin(2.0 * d111)).abs() < 1e-12);
    }

    #[test]
    fn cross_section_jumps_at_edges() {
        let powder = al_powder();
        let d111 = 4.04958 / 3.0_f64.sqrt();
        let dir = Vector3::z();
        let just_below = powder.cross_section(wl2ekin(2.0 * d111 - 1e-6), &dir).unwrap();
        let just_above = powder.cross_section(wl2ekin(2.0 * d111 + 1e-6), &dir).unwrap();
        assert!(just_below > 0.0);
        assert_eq!(just_above, 0.0);
    }

    #[test]
    fn sampling_lies_on_debye_scherrer_cones() {
        let powder = al_powder();
        let wl = 2.0;
        let ekin = wl2ekin(wl);
        let dir = Vector3::z();
        let mut rng = StdRng::seed_from_u64(42);
        // collect the allowed cone cosines
        let allowed: Vec<f64> = powder
            .active(wl)
            .map(|(d, _)| 1.0 - wl * wl / (2.0 * d * d))
            .collect();
        for _ in 0..200 {
            let out = powder.sample_scatter(ekin, &dir, &mut rng).unwrap();
            assert_eq!(out.ekin, ekin);
            let mu = out.direction.dot(&dir);
            assert!(
                allowed.iter().any(|m| (m - mu).abs() < 1e-9),
                "mu={mu} not on any allowed cone"
            );
        }
    }

    #[test]
    fn elastic_and_isotropic_interface() {
        let powder = al_powder();
        assert!(!powder.is_oriented());
        let ekin = wl2ekin(1.5);
        let iso = powder.cross_section_isotropic(ekin).unwrap();
        let dir = powder.cross_section(ekin, &Vector3::x()).unwrap();
        assert_eq!(iso, dir);
    }
}
