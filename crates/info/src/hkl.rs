//! Enumeration of HKL plane families with structure factors

// crate modules
use crate::error::{Error, Result};
use crate::types::{AtomInfo, HklInfo, HklList, StructureInfo};

// external crates
use itertools::Itertools;
use log::debug;
use nalgebra::{Matrix3, Vector3};

// nxtal modules
use nxtal_utils::StableSum;

use std::f64::consts::PI;

/// Options of an HKL enumeration
#[derive(Debug, Clone, Copy)]
pub struct HklCfg {
    /// Lower d-spacing bound \[Aa\]
    pub dcutoff: f64,
    /// Upper d-spacing bound \[Aa\]
    pub dcutoffup: f64,
    /// Also record per-family equivalent (h,k,l) tables
    pub expand_hkl: bool,
    /// Families weaker than this ratio of the strongest |F|² are dropped
    pub fsquare_cut_ratio: f64,
}

impl Default for HklCfg {
    fn default() -> Self {
        Self {
            dcutoff: 0.5,
            dcutoffup: f64::INFINITY,
            expand_hkl: false,
            fsquare_cut_ratio: 1e-5,
        }
    }
}

/// Direct lattice vectors as matrix columns, from lengths and angles
///
/// Standard triclinic construction: a along x, b in the xy plane.
pub fn lattice_matrix(structure: &StructureInfo) -> Matrix3<f64> {
    let (a, b, c) = (structure.lattice_a, structure.lattice_b, structure.lattice_c);
    let (ca, cb, cg) = (
        (structure.alpha * PI / 180.0).cos(),
        (structure.beta * PI / 180.0).cos(),
        (structure.gamma * PI / 180.0).cos(),
    );
    let sg = (structure.gamma * PI / 180.0).sin();
    let v = (1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg).max(0.0).sqrt();

    Matrix3::from_columns(&[
        Vector3::new(a, 0.0, 0.0),
        Vector3::new(b * cg, b * sg, 0.0),
        Vector3::new(c * cb, c * (ca - cb * cg) / sg, c * v / sg),
    ])
}

/// Cell volume \[Aa³\] from lengths and angles
pub fn cell_volume(structure: &StructureInfo) -> f64 {
    lattice_matrix(structure).determinant().abs()
}

/// Reciprocal basis (no 2π), columns a*, b*, c*; `g = M*·(h,k,l)`, `d = 1/|g|`
pub fn reciprocal_matrix(structure: &StructureInfo) -> Result<Matrix3<f64>> {
    lattice_matrix(structure)
        .try_inverse()
        .map(|inv| inv.transpose())
        .ok_or_else(|| Error::bad("degenerate unit cell".to_string()))
}

/// Enumerate plane families in the window `d ∈ [dcutoff, dcutoffup]`
///
/// Walks the half-space of Miller indices (the first nonzero index
/// positive), computes each plane's d-spacing and Debye–Waller-damped
/// structure factor, groups planes into families by matching (d, |F|²),
/// applies the |F|² floor relative to the strongest family, and returns the
/// list sorted by d-spacing, largest first.
pub fn enumerate_hkl(
    structure: &StructureInfo,
    atoms: &[AtomInfo],
    cfg: &HklCfg,
) -> Result<HklList> {
    if !(cfg.dcutoff > 0.0) || cfg.dcutoff >= cfg.dcutoffup {
        return Err(Error::bad(format!(
            "invalid d-spacing window [{}, {}]",
            cfg.dcutoff, cfg.dcutoffup
        )));
    }
    if atoms.iter().any(|ai| ai.positions.len() != ai.count as usize) {
        return Err(Error::missing(
            "atom positions are required for HKL enumeration".to_string(),
        ));
    }

    let rec = reciprocal_matrix(structure)?;

    // Cauchy-Schwarz bound: |h| = |g·a_vec| <= |g|·a <= a/dcutoff
    let hmax = (structure.lattice_a / cfg.dcutoff).floor() as i32;
    let kmax = (structure.lattice_b / cfg.dcutoff).floor() as i32;
    let lmax = (structure.lattice_c / cfg.dcutoff).floor() as i32;

    struct Plane {
        hkl: [i32; 3],
        dspacing: f64,
        fsquared: f64,
        normal: [f64; 3],
    }
    let mut planes: Vec<Plane> = Vec::new();

    for h in 0..=hmax {
        for k in -kmax..=kmax {
            for l in -lmax..=lmax {
                // half space only: the first nonzero index is positive
                let leading_ok = h > 0 || (h == 0 && (k > 0 || (k == 0 && l > 0)));
                if !leading_ok {
                    continue;
                }
                let g = rec * Vector3::new(h as f64, k as f64, l as f64);
                let glen = g.norm();
                let dspacing = 1.0 / glen;
                if dspacing < cfg.dcutoff || dspacing > cfg.dcutoffup {
                    continue;
                }

                // F = sum_j b_j * exp(-W_j) * exp(2*pi*i*(h,k,l)·r_j)
                let inv_dsq = glen * glen;
                let mut re = StableSum::default();
                let mut im = StableSum::default();
                for ai in atoms {
                    let b_coh = ai.atom.data.coherent_scat_length();
                    let dw = match ai.msd {
                        Some(msd) => (-2.0 * PI * PI * msd * inv_dsq).exp(),
                        None => 1.0,
                    };
                    for pos in &ai.positions {
                        let phase = 2.0 * PI
                            * (h as f64 * pos[0] + k as f64 * pos[1] + l as f64 * pos[2]);
                        re.add(b_coh * dw * phase.cos());
                        im.add(b_coh * dw * phase.sin());
                    }
                }
                let (re, im) = (re.total(), im.total());
                // 0.01 converts fm² to barn
                let fsquared = 0.01 * (re * re + im * im);

                let normal = g / glen;
                planes.push(Plane {
                    hkl: [h, k, l],
                    dspacing,
                    fsquared,
                    normal: [normal.x, normal.y, normal.z],
                });
            }
        }
    }

    // the |F|² floor is relative to the strongest plane
    let fsq_max = planes.iter().fold(0.0_f64, |m, p| m.max(p.fsquared));
    let fsq_cut = fsq_max * cfg.fsquare_cut_ratio;
    let n_before = planes.len();
    planes.retain(|p| p.fsquared > fsq_cut);
    debug!(
        "hkl enumeration kept {} of {n_before} planes in d=[{}, {}]",
        planes.len(),
        cfg.dcutoff,
        cfg.dcutoffup
    );

    // group into families by (d, |F|²) within tolerance
    planes.sort_by(|a, b| {
        b.dspacing
            .partial_cmp(&a.dspacing)
            .expect("d-spacings are finite")
    });
    let mut families: Vec<HklInfo> = Vec::new();
    for plane in &planes {
        let family = families.iter_mut().find(|f| {
            (f.dspacing - plane.dspacing).abs() <= 1e-6 * f.dspacing
                && (f.fsquared - plane.fsquared).abs()
                    <= 1e-6 * f.fsquared.max(plane.fsquared).max(1e-300)
        });
        match family {
            Some(f) => {
                f.multiplicity += 2;
                f.demi_normals.push(plane.normal);
                if let Some(eqv) = &mut f.eqv_hkl {
                    eqv.push([plane.hkl[0] as i16, plane.hkl[1] as i16, plane.hkl[2] as i16]);
                }
            }
            None => families.push(HklInfo {
                dspacing: plane.dspacing,
                fsquared: plane.fsquared,
                h: plane.hkl[0],
                k: plane.hkl[1],
                l: plane.hkl[2],
                multiplicity: 2,
                demi_normals: vec![plane.normal],
                eqv_hkl: cfg.expand_hkl.then(|| {
                    vec![[plane.hkl[0] as i16, plane.hkl[1] as i16, plane.hkl[2] as i16]]
                }),
            }),
        }
    }

    // already sorted by d descending since the planes were
    debug_assert!(families
        .iter()
        .tuple_windows()
        .all(|(a, b)| a.dspacing >= b.dspacing));

    Ok(HklList {
        dlower: cfg.dcutoff,
        dupper: cfg.dcutoffup,
        list: families,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AtomIndex, IndexedAtom};
    use nxtal_atomdb::AtomDb;

    fn fcc_al() -> (StructureInfo, Vec<AtomInfo>) {
        let a = 4.04958;
        let structure = StructureInfo {
            spacegroup: Some(225),
            lattice_a: a,
            lattice_b: a,
            lattice_c: a,
            alpha: 90.0,
            beta: 90.0,
            gamma: 90.0,
            volume: a * a * a,
            n_atoms: 4,
        };
        let al = AtomDb::with_defaults().lookup("Al").unwrap();
        let atoms = vec![AtomInfo {
            atom: IndexedAtom {
                index: AtomIndex(0),
                data: al,
            },
            count: 4,
            debye_temp: Some(410.4),
            positions: vec![
                [0.0, 0.0, 0.0],
                [0.0, 0.5, 0.5],
                [0.5, 0.0, 0.5],
                [0.5, 0.5, 0.0],
            ],
            msd: Some(crate::msd::debye_msd(410.4, 293.15, 26.9815386)),
        }];
        (structure, atoms)
    }

    #[test]
    fn fcc_selection_rules() {
        let (structure, atoms) = fcc_al();
        let cfg = HklCfg {
            dcutoff: 0.8,
            ..Default::default()
        };
        let list = enumerate_hkl(&structure, &atoms, &cfg).unwrap();
        assert!(!list.list.is_empty());

        // strongest-d family is {111} at a/sqrt(3)
        let first = &list.list[0];
        let d111 = structure.lattice_a / 3.0_f64.sqrt();
        assert!((first.dspacing - d111).abs() < 1e-9, "d={}", first.dspacing);
        assert_eq!(first.multiplicity, 8);
        assert_eq!(first.demi_normals.len(), 4);

        // mixed-parity indices are extinct in fcc: (100) and (110) absent
        for f in &list.list {
            let parities = [f.h & 1, f.k & 1, f.l & 1];
            assert!(
                parities == [0, 0, 0] || parities == [1, 1, 1],
                "forbidden family ({},{},{}) survived",
                f.h,
                f.k,
                f.l
            );
        }

        // sorted by d descending and inside the window
        for pair in list.list.windows(2) {
            assert!(pair[0].dspacing >= pair[1].dspacing);
        }
        for f in &list.list {
            assert!(f.dspacing >= 0.8);
            assert!(f.fsquared >= 0.0);
            assert_eq!(f.multiplicity as usize, 2 * f.demi_normals.len());
        }
    }

    #[test]
    fn second_family_is_200() {
        let (structure, atoms) = fcc_al();
        let cfg = HklCfg {
            dcutoff: 1.0,
            expand_hkl: true,
            ..Default::default()
        };
        let list = enumerate_hkl(&structure, &atoms, &cfg).unwrap();
        let second = &list.list[1];
        assert!((second.dspacing - structure.lattice_a / 2.0).abs() < 1e-9);
        assert_eq!(second.multiplicity, 6);
        let eqv = second.eqv_hkl.as_ref().unwrap();
        assert_eq!(eqv.len(), 3);
    }

    #[test]
    fn window_limits_are_respected() {
        let (structure, atoms) = fcc_al();
        let cfg = HklCfg {
            dcutoff: 1.5,
            dcutoffup: 2.0,
            ..Default::default()
        };
        let list = enumerate_hkl(&structure, &atoms, &cfg).unwrap();
        for f in &list.list {
            assert!(f.dspacing >= 1.5 && f.dspacing <= 2.0);
        }
        // {111} at 2.338 is above the window
        assert!(list.list.iter().all(|f| (f.h, f.k, f.l) != (1, 1, 1)));
    }
}
