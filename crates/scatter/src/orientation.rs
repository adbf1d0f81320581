//! Single-crystal orientation from two direction pairs

// crate modules
use crate::error::{Error, Result};

// external crates
use nalgebra::{Matrix3, Rotation3, Vector3};

/// The two (crystal frame, lab frame) direction pairs fixing an orientation
///
/// Crystal-frame vectors must already be in direct crystal coordinates;
/// callers resolve `crys_hkl` inputs through the reciprocal lattice before
/// filling in this struct.
#[derive(Debug, Clone, Copy)]
pub struct OrientationSpec {
    /// Primary crystal-frame direction
    pub dir1_crystal: Vector3<f64>,
    /// Primary lab-frame direction
    pub dir1_lab: Vector3<f64>,
    /// Secondary crystal-frame direction
    pub dir2_crystal: Vector3<f64>,
    /// Secondary lab-frame direction
    pub dir2_lab: Vector3<f64>,
    /// Accepted angular mismatch \[rad\] between the pairs
    pub dirtol: f64,
}

/// Determine the crystal→lab rotation from two direction pairs
///
/// The primary pair is honoured exactly; the secondary fixes the remaining
/// roll angle. The rotation is accepted only when the angle between the
/// crystal directions matches the angle between the lab directions to
/// within `dirtol`.
pub fn determine_orientation(spec: &OrientationSpec) -> Result<Rotation3<f64>> {
    let c1 = unit(spec.dir1_crystal, "primary crystal direction")?;
    let c2 = unit(spec.dir2_crystal, "secondary crystal direction")?;
    let l1 = unit(spec.dir1_lab, "primary lab direction")?;
    let l2 = unit(spec.dir2_lab, "secondary lab direction")?;

    let angle_crystal = c1.dot(&c2).clamp(-1.0, 1.0).acos();
    let angle_lab = l1.dot(&l2).clamp(-1.0, 1.0).acos();
    if (angle_crystal - angle_lab).abs() > spec.dirtol {
        return Err(Error::BadSetup(format!(
            "angle between primary and secondary directions differs between crystal \
             ({angle_crystal} rad) and lab ({angle_lab} rad) frames by more than \
             dirtol ({} rad)",
            spec.dirtol
        )));
    }

    let crystal_basis = orthonormal_triad(&c1, &c2)?;
    let lab_basis = orthonormal_triad(&l1, &l2)?;
    // R maps the crystal triad onto the lab triad; the product of two
    // orthonormal triads is itself orthonormal
    let rotation = lab_basis * crystal_basis.transpose();
    Ok(Rotation3::from_matrix(&rotation))
}

fn unit(v: Vector3<f64>, what: &str) -> Result<Vector3<f64>> {
    let norm = v.norm();
    if !(norm > 0.0) || !norm.is_finite() {
        return Err(Error::BadSetup(format!("{what} is not a usable vector: {v:?}")));
    }
    Ok(v / norm)
}

fn orthonormal_triad(u1: &Vector3<f64>, u2: &Vector3<f64>) -> Result<Matrix3<f64>> {
    let e1 = *u1;
    let e2_raw = u2 - e1 * u2.dot(&e1);
    let norm = e2_raw.norm();
    if !(norm > 1e-12) {
        return Err(Error::BadSetup(
            "orientation directions are parallel".to_string(),
        ));
    }
    let e2 = e2_raw / norm;
    let e3 = e1.cross(&e2);
    Ok(Matrix3::from_columns(&[e1, e2, e3]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxtal_utils::DEG;

    #[test]
    fn exact_pairs_reproduce_directions() {
        let spec = OrientationSpec {
            dir1_crystal: Vector3::new(0.0, 0.0, 1.0),
            dir1_lab: Vector3::new(1.0, 0.0, 0.0),
            dir2_crystal: Vector3::new(1.0, 0.0, 0.0),
            dir2_lab: Vector3::new(0.0, 1.0, 0.0),
            dirtol: 1e-4,
        };
        let rot = determine_orientation(&spec).unwrap();
        let mapped = rot * Vector3::new(0.0, 0.0, 1.0);
        assert!((mapped - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
        let mapped2 = rot * Vector3::new(1.0, 0.0, 0.0);
        assert!((mapped2 - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn mismatched_pairs_rejected_by_dirtol() {
        // crystal pair at 90 degrees, lab pair at 80: far outside 1e-4
        let spec = OrientationSpec {
            dir1_crystal: Vector3::new(0.0, 0.0, 1.0),
            dir1_lab: Vector3::new(0.0, 0.0, 1.0),
            dir2_crystal: Vector3::new(1.0, 0.0, 0.0),
            dir2_lab: Vector3::new((10.0 * DEG).sin(), 0.0, (10.0 * DEG).cos()),
            dirtol: 1e-4,
        };
        assert!(determine_orientation(&spec).is_err());

        // but accepted with a generous tolerance, honouring dir1 exactly
        let spec = OrientationSpec {
            dirtol: 0.3,
            ..spec
        };
        let rot = determine_orientation(&spec).unwrap();
        let mapped = rot * Vector3::new(0.0, 0.0, 1.0);
        assert!((mapped - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn parallel_directions_rejected() {
        let spec = OrientationSpec {
            dir1_crystal: Vector3::new(0.0, 0.0, 1.0),
            dir1_lab: Vector3::new(0.0, 0.0, 1.0),
            dir2_crystal: Vector3::new(0.0, 0.0, 2.0),
            dir2_lab: Vector3::new(0.0, 1.0, 0.0),
            dirtol: 1.0,
        };
        assert!(determine_orientation(&spec).is_err());
    }
}
