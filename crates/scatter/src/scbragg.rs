//! Coherent Bragg diffraction on oriented single crystals

// crate modules
use crate::error::{Error, Result};
use crate::gaussmos::GaussMos;
use crate::process::{direction_at_mu, Outcome, Scatter};
use crate::rng::RngSource;

// external crates
use nalgebra::{Rotation3, Vector3};

// nxtal modules
use nxtal_info::Info;
use nxtal_utils::{ekin2wl, wl2ekin};

// standard library
use std::sync::Mutex;

// One oriented plane family: lab-frame demi-normals share d and |F|²
#[derive(Debug, Clone)]
struct ScPlane {
    dspacing: f64,
    fsquared: f64,
    normals: Vec<Vector3<f64>>,
}

// A selectable reflection for the sampling step
#[derive(Debug, Clone, Copy)]
struct PickEntry {
    cum_xs: f64,
    // signed normal of the chosen demi-plane
    normal: Vector3<f64>,
    inv2d: f64,
}

// Cross sections evaluated for one neutron state, kept for the sampling
// call that typically follows immediately
#[derive(Debug, Clone)]
struct ScCache {
    ekin_bits: u64,
    dir_bits: [u64; 3],
    total: f64,
    iso_xs: f64,
    picks: Vec<PickEntry>,
}

/// Single-crystal Bragg diffraction with a Gaussian mosaic
///
/// The orientation is fixed by two direction pairs (see
/// [determine_orientation](crate::determine_orientation)); mosaicity
/// spreads each plane normal into a truncated Gaussian on the sphere. The
/// per-plane cross section integrates that distribution along the locus of
/// crystallite orientations satisfying the Bragg condition.
///
/// Families with `2·d` below the `sccutoff` d-spacing are numerous, weak
/// and quasi-isotropic; they are treated with the powder formula instead of
/// per-normal mosaic integrals.
#[derive(Debug)]
pub struct ScBragg {
    planes: Vec<ScPlane>,
    // short-d families handled isotropically: (d, m·d·|F|²)
    iso_planes: Vec<(f64, f64)>,
    mos: GaussMos,
    // 1/(V·N)
    xs_factor: f64,
    threshold_ekin: f64,
    cache: Mutex<Option<ScCache>>,
}

impl ScBragg {
    /// Build from a material with HKL demi-normals and a crystal→lab
    /// rotation
    pub fn new(
        info: &Info,
        orientation: Rotation3<f64>,
        mosaicity: f64,
        mosaicity_is_fwhm: bool,
        mosprec: f64,
        sccutoff: f64,
    ) -> Result<Self> {
        let structure = info
            .structure()
            .ok_or_else(|| Error::BadSetup("single-crystal Bragg needs structure info".into()))?;
        let hkl = info
            .hkl()
            .ok_or_else(|| Error::BadSetup("single-crystal Bragg needs an HKL list".into()))?;
        if hkl.list.iter().any(|f| f.demi_normals.is_empty()) {
            return Err(Error::BadSetup(
                "single-crystal Bragg needs demi-normals on every HKL family".into(),
            ));
        }

        let mos = GaussMos::new(mosaicity, mosaicity_is_fwhm, mosprec)?;

        let mut planes = Vec::new();
        let mut iso_planes = Vec::new();
        let mut dmax = 0.0_f64;
        for family in &hkl.list {
            dmax = dmax.max(family.dspacing);
            if family.dspacing < sccutoff {
                iso_planes.push((
                    family.dspacing,
                    family.multiplicity as f64 * family.dspacing * family.fsquared,
                ));
            } else {
                planes.push(ScPlane {
                    dspacing: family.dspacing,
                    fsquared: family.fsquared,
                    normals: family
                        .demi_normals
                        .iter()
                        .map(|n| orientation * Vector3::new(n[0], n[1], n[2]))
                        .collect(),
                });
            }
        }
        if planes.is_empty() && iso_planes.is_empty() {
            return Err(Error::BadSetup("no usable HKL families".into()));
        }

        Ok(Self {
            planes,
            iso_planes,
            mos,
            xs_factor: 1.0 / (structure.volume * structure.n_atoms as f64),
            threshold_ekin: wl2ekin(2.0 * dmax),
            cache: Mutex::new(None),
        })
    }

    // Evaluate all contributions for one neutron state.
    fn evaluate(&self, ekin: f64, direction: &Vector3<f64>) -> ScCache {
        let dir_bits = [
            direction.x.to_bits(),
            direction.y.to_bits(),
            direction.z.to_bits(),
        ];
        {
            let cache = self.cache.lock().expect("sc cache mutex poisoned");
            if let Some(c) = cache.as_ref() {
                if c.ekin_bits == ekin.to_bits() && c.dir_bits == dir_bits {
                    return c.clone();
                }
            }
        }

        let wl = ekin2wl(ekin);
        let k = direction.normalize();
        let mut picks: Vec<PickEntry> = Vec::new();
        let mut total = 0.0_f64;

        for plane in &self.planes {
            let sin_theta_b = wl / (2.0 * plane.dspacing);
            if sin_theta_b > 1.0 {
                continue;
            }
            let cos_theta_b = (1.0 - sin_theta_b * sin_theta_b).max(0.0).sqrt();
            let sin_2theta = 2.0 * sin_theta_b * cos_theta_b;
            if sin_2theta <= 0.0 {
                continue;
            }
            // per-plane reflectivity scale (the rocking-curve integral)
            let q = wl.powi(3) * plane.fsquared * self.xs_factor / sin_2theta;
            // the Bragg circle: crystallite normals at k·u = -sin(theta_B)
            let cos_tc = -sin_theta_b;
            let sin_tc = cos_theta_b;

            for normal in &plane.normals {
                let cos_gamma = k.dot(normal).clamp(-1.0, 1.0);
                let sin_gamma = (1.0 - cos_gamma * cos_gamma).max(0.0).sqrt();
                // both signs of the demi-normal can satisfy Bragg
                for (sign, cg) in [(1.0, cos_gamma), (-1.0, -cos_gamma)] {
                    let ci = self.mos.circle_integral(cg, sin_gamma, cos_tc, sin_tc);
                    if ci <= 0.0 {
                        continue;
                    }
                    let xs = q * sin_tc * ci;
                    total += xs;
                    picks.push(PickEntry {
                        cum_xs: total,
                        normal: normal * sign,
                        inv2d: 1.0 / (2.0 * plane.dspacing),
                    });
                }
            }
        }

        // short-d families as an isotropic powder contribution
        let mut iso_xs = 0.0;
        for (d, fdm) in &self.iso_planes {
            if 2.0 * d >= wl {
                iso_xs += fdm;
            }
        }
        iso_xs *= wl * wl * self.xs_factor / 2.0;
        total += iso_xs;

        let result = ScCache {
            ekin_bits: ekin.to_bits(),
            dir_bits,
            total,
            iso_xs,
            picks,
        };
        *self.cache.lock().expect("sc cache mutex poisoned") = Some(result.clone());
        result
    }
}

impl Scatter for ScBragg {
    fn name(&self) -> &'static str {
        "scbragg"
    }

    fn domain(&self) -> (f64, f64) {
        (self.threshold_ekin, f64::INFINITY)
    }

    fn is_oriented(&self) -> bool {
        true
    }

    fn cross_section(&self, ekin: f64, direction: &Vector3<f64>) -> Result<f64> {
        if ekin < self.threshold_ekin || !(ekin > 0.0) {
            return Ok(0.0);
        }
        Ok(self.evaluate(ekin, direction).total)
    }

    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        rng: &mut dyn RngSource,
    ) -> Result<Outcome> {
        let state = self.evaluate(ekin, direction);
        if !(state.total > 0.0) {
            return Err(Error::CalcError(format!(
                "single-crystal sampling requested at energy {ekin} where the cross \
                 section vanishes"
            )));
        }
        let wl = ekin2wl(ekin);
        let k = direction.normalize();
        let target = rng.generate() * state.total;

        // the isotropic short-d part occupies the upper end of the range
        if target > state.total - state.iso_xs {
            let mut iso_target = rng.generate()
                * self
                    .iso_planes
                    .iter()
                    .filter(|(d, _)| 2.0 * d >= wl)
                    .map(|(_, fdm)| fdm)
                    .sum::<f64>();
            let mut dspacing = self.iso_planes[0].0;
            for (d, fdm) in &self.iso_planes {
                if 2.0 * d < wl {
                    continue;
                }
                dspacing = *d;
                if iso_target < *fdm {
                    break;
                }
                iso_target -= fdm;
            }
            let mu = 1.0 - wl * wl / (2.0 * dspacing * dspacing);
            return Ok(Outcome {
                direction: direction_at_mu(direction, mu, rng),
                ekin,
            });
        }

        let pick = state
            .picks
            .iter()
            .find(|p| target < p.cum_xs)
            .or(state.picks.last())
            .ok_or_else(|| Error::CalcError("no reflection selectable".to_string()))?;

        // rebuild the Bragg-circle geometry for the chosen demi-plane
        let sin_theta_b = wl * pick.inv2d;
        let cos_theta_b = (1.0 - sin_theta_b * sin_theta_b).max(0.0).sqrt();
        let cos_tc = -sin_theta_b;
        let sin_tc = cos_theta_b;
        let cos_gamma = k.dot(&pick.normal).clamp(-1.0, 1.0);
        let sin_gamma = (1.0 - cos_gamma * cos_gamma).max(0.0).sqrt();

        // transverse basis with the normal's azimuth at phi = 0
        let n_perp = pick.normal - k * cos_gamma;
        let t1 = if n_perp.norm() > 1e-12 {
            n_perp.normalize()
        } else {
            // normal parallel to the beam: any transverse direction works
            let seed = if k.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
            k.cross(&seed).normalize()
        };
        let t2 = k.cross(&t1);

        let phi = self
            .mos
            .sample_circle_azimuth(cos_gamma, sin_gamma, cos_tc, sin_tc, rng);
        let u = k * cos_tc + (t1 * phi.cos() + t2 * phi.sin()) * sin_tc;

        // mirror the wavevector in the crystallite plane
        let out = k - u * (2.0 * k.dot(&u));
        Ok(Outcome {
            direction: out.normalize(),
            ekin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::{determine_orientation, OrientationSpec};
    use nxtal_info::{load_ncmat, NcmatLoadCfg};
    use nxtal_ncmat::parse_ncmat;
    use nxtal_textsrc::MemorySource;
    use nxtal_utils::DEG;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

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

    // restrict to the {111} family so every reflection shares one Bragg
    // angle, making the geometric assertions below unambiguous
    fn al_crystal() -> Arc<nxtal_info::Info> {
        let data = parse_ncmat(Box::new(MemorySource::new("Al.ncmat", AL))).unwrap();
        let cfg = NcmatLoadCfg {
            dcutoff: 2.1,
            ..Default::default()
        };
        load_ncmat(&data, &cfg).unwrap()
    }

    fn aligned_crystal() -> ScBragg {
        // crystal axes aligned with the lab frame
        let spec = OrientationSpec {
            dir1_crystal: Vector3::z(),
            dir1_lab: Vector3::z(),
            dir2_crystal: Vector3::x(),
            dir2_lab: Vector3::x(),
            dirtol: 1e-4,
        };
        let rot = determine_orientation(&spec).unwrap();
        ScBragg::new(&al_crystal(), rot, 0.5 * DEG, true, 1e-3, 0.4).unwrap()
    }

    #[test]
    fn peaked_at_the_bragg_orientation() {
        let sc = aligned_crystal();
        let d111 = 4.04958 / 3.0_f64.sqrt();
        let wl = 2.5;
        let ekin = wl2ekin(wl);
        let sin_tb = wl / (2.0 * d111);
        let theta_b = sin_tb.asin();

        // beam oriented so the (111) normal sits exactly on the Bragg
        // circle: angle between beam and normal = 90 + theta_B
        let n = Vector3::new(1.0, 1.0, 1.0).normalize();
        // pick any direction at the correct angle to n
        let seed = Vector3::z();
        let t = (seed - n * seed.dot(&n)).normalize();
        let gamma: f64 = std::f64::consts::FRAC_PI_2 + theta_b;
        let beam = n * gamma.cos() + t * gamma.sin();

        let on_peak = sc.cross_section(ekin, &beam).unwrap();
        assert!(on_peak > 0.0, "no intensity at the Bragg condition");

        // find a tilt where no {111} demi-normal sits near its Bragg
        // circle, then demand exactly zero intensity there
        let info = al_crystal();
        let normals: Vec<Vector3<f64>> = info.hkl().unwrap().list[0]
            .demi_normals
            .iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect();
        let clear_of_all_circles = |dir: &Vector3<f64>| {
            normals.iter().all(|nv| {
                let cos_gamma: f64 = dir.dot(nv);
                // both demi-normal signs
                [cos_gamma, -cos_gamma].iter().all(|cg| {
                    (cg.acos() - gamma).abs() > 3.0 * DEG
                })
            })
        };
        let far = (5..40)
            .map(|i| {
                let g = gamma + i as f64 * DEG;
                n * g.cos() + t * g.sin()
            })
            .find(|d| clear_of_all_circles(d))
            .expect("some tilt avoids every Bragg circle");
        let off_peak = sc.cross_section(ekin, &far).unwrap();
        assert_eq!(off_peak, 0.0, "expected zero far from every Bragg circle");
    }

    #[test]
    fn oriented_interface() {
        let sc = aligned_crystal();
        assert!(sc.is_oriented());
        assert!(matches!(
            sc.cross_section_isotropic(0.025),
            Err(Error::NotIsotropic(_))
        ));
    }

    #[test]
    fn sampling_reflects_across_a_crystallite_plane() {
        let sc = aligned_crystal();
        let d111 = 4.04958 / 3.0_f64.sqrt();
        let wl = 2.5;
        let ekin = wl2ekin(wl);
        let sin_tb = wl / (2.0 * d111);
        let theta_b = sin_tb.asin();
        let n = Vector3::new(1.0, 1.0, 1.0).normalize();
        let t = (Vector3::z() - n * Vector3::z().dot(&n)).normalize();
        let gamma: f64 = std::f64::consts::FRAC_PI_2 + theta_b;
        let beam = n * gamma.cos() + t * gamma.sin();

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let out = sc.sample_scatter(ekin, &beam, &mut rng).unwrap();
            assert_eq!(out.ekin, ekin);
            assert!((out.direction.norm() - 1.0).abs() < 1e-9);
            // elastic Bragg: scattering angle is 2*theta_B, so the cosine
            // to the incident beam is cos(2 theta_B) within mosaic spread
            let mu = out.direction.dot(&beam);
            let expected = (2.0 * theta_b).cos();
            assert!(
                (mu - expected).abs() < 5.0 * DEG,
                "mu {mu} far from cos(2 theta_B) {expected}"
            );
        }
    }
}
