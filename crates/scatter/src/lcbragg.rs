//! Coherent Bragg diffraction on layered crystals

// crate modules
use crate::error::{Error, Result};
use crate::process::{Outcome, Scatter};
use crate::rng::RngSource;
use crate::scbragg::ScBragg;

// external crates
use nalgebra::{Rotation3, Unit, Vector3};

/// Layered-crystal Bragg diffraction
///
/// Crystallites share a preferred axis (`lcaxis`, e.g. the c-axis of
/// pyrolytic graphite) but are rotated uniformly about it. Cross sections
/// are therefore the single-crystal result averaged over that rotation:
/// `lcmode=0` evaluates the average with an adaptively refined periodic
/// rule (exact for the smooth periodic integrand), while `lcmode=n>0`
/// averages exactly n reference orientations, reproducing a discretized
/// reference material.
#[derive(Debug)]
pub struct LcBragg {
    sc: ScBragg,
    // preferred axis in the lab frame
    axis: Unit<Vector3<f64>>,
    lcmode: i64,
}

impl LcBragg {
    /// Wrap a single-crystal process with rotational averaging
    pub fn new(sc: ScBragg, lab_axis: Vector3<f64>, lcmode: i64) -> Result<Self> {
        let norm = lab_axis.norm();
        if !(norm > 0.0) || !norm.is_finite() {
            return Err(Error::BadSetup("lcaxis must be a usable vector".into()));
        }
        if lcmode < 0 {
            return Err(Error::BadSetup("lcmode must be >= 0".into()));
        }
        Ok(Self {
            sc,
            axis: Unit::new_normalize(lab_axis),
            lcmode,
        })
    }

    // sample the single-crystal xs at rotation psi about the axis
    fn xs_at(&self, psi: f64, ekin: f64, direction: &Vector3<f64>) -> Result<f64> {
        // rotating the crystal by psi is rotating the neutron by -psi
        let rot = Rotation3::from_axis_angle(&self.axis, -psi);
        self.sc.cross_section(ekin, &(rot * direction))
    }

    fn nodes(&self, n: usize, ekin: f64, direction: &Vector3<f64>) -> Result<(Vec<f64>, f64)> {
        let mut weights = Vec::with_capacity(n);
        let mut total = 0.0;
        for i in 0..n {
            let psi = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            let xs = self.xs_at(psi, ekin, direction)?;
            weights.push(xs);
            total += xs;
        }
        Ok((weights, total / n as f64))
    }

    fn average(&self, ekin: f64, direction: &Vector3<f64>) -> Result<(Vec<f64>, f64)> {
        if self.lcmode > 0 {
            return self.nodes(self.lcmode as usize, ekin, direction);
        }
        // closed-form mode: the periodic rule converges fast on the smooth
        // rotational average, so refine until stable
        let mut n = 64;
        let (mut weights, mut mean) = self.nodes(n, ekin, direction)?;
        loop {
            let (w2, m2) = self.nodes(n * 2, ekin, direction)?;
            let close = (m2 - mean).abs() <= 1e-4 * m2.abs().max(1e-300);
            weights = w2;
            mean = m2;
            n *= 2;
            if close || n >= 1024 {
                return Ok((weights, mean));
            }
        }
    }
}

impl Scatter for LcBragg {
    fn name(&self) -> &'static str {
        "lcbragg"
    }

    fn domain(&self) -> (f64, f64) {
        self.sc.domain()
    }

    fn is_oriented(&self) -> bool {
        true
    }

    fn cross_section(&self, ekin: f64, direction: &Vector3<f64>) -> Result<f64> {
        if ekin < self.domain().0 || !(ekin > 0.0) {
            return Ok(0.0);
        }
        Ok(self.average(ekin, direction)?.1)
    }

    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        rng: &mut dyn RngSource,
    ) -> Result<Outcome> {
        let (weights, mean) = self.average(ekin, direction)?;
        let n = weights.len();
        if !(mean > 0.0) {
            return Err(Error::CalcError(format!(
                "layered-crystal sampling requested at energy {ekin} where the cross \
                 section vanishes"
            )));
        }
        let total: f64 = weights.iter().sum();
        let mut target = rng.generate() * total;
        let mut chosen = 0;
        for (i, w) in weights.iter().enumerate() {
            chosen = i;
            if target < *w {
                break;
            }
            target -= w;
        }
        let psi = 2.0 * std::f64::consts::PI * chosen as f64 / n as f64;
        let to_frame = Rotation3::from_axis_angle(&self.axis, -psi);
        let out = self
            .sc
            .sample_scatter(ekin, &(to_frame * direction), rng)?;
        // rotate the outgoing direction back to the lab frame
        Ok(Outcome {
            direction: to_frame.inverse() * out.direction,
            ekin: out.ekin,
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
    use nxtal_utils::{wl2ekin, DEG};

    // graphite-like hexagonal cell (pyrolytic graphite layers)
    const GRAPHITE: &str = "NCMAT v2
@CELL
lengths 2.464 2.464 6.711
angles 90 90 120
@SPACEGROUP
194
@ATOMPOSITIONS
C 0 0 1/4
C 0 0 3/4
C 1/3 2/3 1/4
C 2/3 1/3 3/4
@DEBYETEMPERATURE
C 1000.0
";

    fn layered() -> LcBragg {
        let data = parse_ncmat(Box::new(MemorySource::new("C.ncmat", GRAPHITE))).unwrap();
        let cfg = NcmatLoadCfg {
            dcutoff: 1.5,
            ..Default::default()
        };
        let info = load_ncmat(&data, &cfg).unwrap();
        let spec = OrientationSpec {
            dir1_crystal: Vector3::z(),
            dir1_lab: Vector3::z(),
            dir2_crystal: Vector3::x(),
            dir2_lab: Vector3::x(),
            dirtol: 1e-4,
        };
        let rot = determine_orientation(&spec).unwrap();
        let sc = ScBragg::new(&info, rot, 2.0 * DEG, true, 1e-3, 0.4).unwrap();
        LcBragg::new(sc, Vector3::z(), 0).unwrap()
    }

    #[test]
    fn invariant_under_rotation_about_the_axis() {
        let lc = layered();
        let ekin = wl2ekin(3.0);
        // two beams related by a rotation about the preferred axis see the
        // same averaged cross section
        let d1 = Vector3::new(0.3, 0.0, 0.954).normalize();
        let rot = Rotation3::from_axis_angle(&Unit::new_normalize(Vector3::z()), 1.234);
        let d2 = rot * d1;
        let a = lc.cross_section(ekin, &d1).unwrap();
        let b = lc.cross_section(ekin, &d2).unwrap();
        // the averages use rotated node sets, so agreement is limited by
        // the refinement tolerance
        assert!(
            (a - b).abs() <= 0.02 * a.abs().max(b.abs()).max(1e-300),
            "{a} vs {b}"
        );
    }

    #[test]
    fn reference_mode_uses_n_orientations() {
        let data = parse_ncmat(Box::new(MemorySource::new("C.ncmat", GRAPHITE))).unwrap();
        let cfg = NcmatLoadCfg {
            dcutoff: 1.5,
            ..Default::default()
        };
        let info = load_ncmat(&data, &cfg).unwrap();
        let spec = OrientationSpec {
            dir1_crystal: Vector3::z(),
            dir1_lab: Vector3::z(),
            dir2_crystal: Vector3::x(),
            dir2_lab: Vector3::x(),
            dirtol: 1e-4,
        };
        let rot = determine_orientation(&spec).unwrap();
        let sc = ScBragg::new(&info, rot, 2.0 * DEG, true, 1e-3, 0.4).unwrap();
        let lc = LcBragg::new(sc, Vector3::z(), 3).unwrap();
        // n reference orientations still produce a usable cross section
        let xs = lc
            .cross_section(wl2ekin(3.0), &Vector3::new(0.3, 0.0, 0.954).normalize())
            .unwrap();
        assert!(xs.is_finite() && xs >= 0.0);

        assert!(LcBragg::new(
            ScBragg::new(&info, rot, 2.0 * DEG, true, 1e-3, 0.4).unwrap(),
            Vector3::zeros(),
            0
        )
        .is_err());
    }
}
