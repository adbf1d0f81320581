//! Interpretation of parsed NCMAT records into sealed materials

// crate modules
use crate::dynamics::{DynCommon, DynamicInfo};
use crate::error::{Error, Result};
use crate::hkl::{cell_volume, enumerate_hkl, HklCfg};
use crate::info::{Info, InfoBuilder};
use crate::msd::debye_msd;
use crate::types::{AtomIndex, AtomInfo, IndexedAtom, StructureInfo};

// external crates
use log::{debug, warn};
use once_cell::sync::OnceCell;

// nxtal modules
use nxtal_atomdb::AtomDb;
use nxtal_ncmat::{DensityUnit, DynInfoData, DynType, NcmatData};
use nxtal_sab::{KnlType, ScatKnlData};
use nxtal_vdos::VdosData;

// standard library
use std::collections::BTreeMap;
use std::sync::Arc;

/// The configuration subset relevant to building an [Info] from NCMAT data
#[derive(Debug, Clone)]
pub struct NcmatLoadCfg {
    /// Temperature \[K\]; −1 selects the default of 293.15 K
    pub temp: f64,
    /// Lower d-spacing cutoff \[Aa\]; 0 selects automatically, −1 disables
    /// HKL lists entirely
    pub dcutoff: f64,
    /// Upper d-spacing cutoff \[Aa\]
    pub dcutoffup: f64,
    /// Record equivalent-(h,k,l) tables alongside demi-normals
    pub expand_hkl: bool,
    /// Atom data override lines from the configuration layer
    pub atomdb_lines: Vec<Vec<String>>,
}

impl Default for NcmatLoadCfg {
    fn default() -> Self {
        Self {
            temp: -1.0,
            dcutoff: 0.0,
            dcutoffup: f64::INFINITY,
            expand_hkl: false,
            atomdb_lines: Vec::new(),
        }
    }
}

const DEFAULT_TEMPERATURE: f64 = 293.15;
const AUTO_DCUTOFF: f64 = 0.15;

/// Build a sealed [Info] from a parsed NCMAT record
///
/// Composition is resolved against the built-in atom database, overridden
/// first by the file's `@ATOMDB` lines and then by configuration-level
/// lines. Derived quantities (cell volume, densities, MSDs, the HKL list)
/// are computed here; the result is sealed before being returned.
pub fn load_ncmat(data: &NcmatData, cfg: &NcmatLoadCfg) -> Result<Arc<Info>> {
    let db = resolve_atomdb(data, cfg)?;
    let temperature = if cfg.temp == -1.0 {
        DEFAULT_TEMPERATURE
    } else {
        cfg.temp
    };
    if !(temperature > 0.0) {
        return Err(Error::bad(format!("invalid temperature {temperature}")));
    }

    let mut builder = InfoBuilder::new();
    builder.set_temperature(temperature);
    if let Some(t) = data.debye_global {
        builder.set_debye_temp_global(t);
    }

    // stable role indices in order of first appearance
    let mut order: Vec<String> = Vec::new();
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for (name, _) in &data.atompos {
        if !order.contains(name) {
            order.push(name.clone());
        }
        *counts.entry(name.clone()).or_insert(0) += 1;
    }
    for di in &data.dyninfos {
        if !order.contains(&di.element) {
            order.push(di.element.clone());
        }
    }
    let indexed: BTreeMap<String, IndexedAtom> = order
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let atom = db.require(name)?;
            Ok((
                name.clone(),
                IndexedAtom {
                    index: AtomIndex(i as u32),
                    data: atom,
                },
            ))
        })
        .collect::<Result<_>>()?;

    let debye_for = |name: &str| -> Option<f64> {
        data.debye_per_element
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
            .or(data.debye_global)
    };

    // unit cell, atom roles and number density for crystals
    let crystalline = data.has_unit_cell();
    let mut atom_infos: Vec<AtomInfo> = Vec::new();
    let mut structure_info: Option<StructureInfo> = None;
    if crystalline {
        let cell = data.cell.as_ref().expect("validated cell presence");
        let mut structure = StructureInfo {
            spacegroup: data.spacegroup,
            lattice_a: cell.lengths[0],
            lattice_b: cell.lengths[1],
            lattice_c: cell.lengths[2],
            alpha: cell.angles[0],
            beta: cell.angles[1],
            gamma: cell.angles[2],
            volume: 0.0,
            n_atoms: data.atompos.len() as u32,
        };
        structure.volume = cell_volume(&structure);
        structure_info = Some(structure);
        let structure = structure_info.as_ref().expect("just set");

        for name in &order {
            let count = counts.get(name).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            let positions: Vec<[f64; 3]> = data
                .atompos
                .iter()
                .filter(|(n, _)| n == name)
                .map(|(_, p)| *p)
                .collect();
            let atom = indexed[name].clone();
            let debye_temp = data
                .debye_per_element
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, t)| *t);
            let msd = debye_for(name)
                .map(|theta| debye_msd(theta, temperature, atom.data.mass_amu()));
            atom_infos.push(AtomInfo {
                atom,
                count,
                debye_temp,
                positions,
                msd,
            });
        }

        builder.set_number_density(structure.n_atoms as f64 / structure.volume);
        builder.set_structure(*structure);
    } else {
        let (value, unit) = data
            .density
            .ok_or_else(|| Error::missing("non-crystalline material without density".to_string()))?;
        match unit {
            DensityUnit::AtomsPerAa3 => {
                builder.set_number_density(value);
            }
            DensityUnit::KgPerM3 => {
                builder.set_density(value * 1e-3);
            }
        }
    }

    // composition: unit-cell counts for crystals, fractions otherwise
    let composition: Vec<(f64, IndexedAtom)> = if crystalline {
        let total: u32 = counts.values().sum();
        order
            .iter()
            .filter(|name| counts.contains_key(*name))
            .map(|name| {
                (
                    counts[name] as f64 / total as f64,
                    indexed[name].clone(),
                )
            })
            .collect()
    } else {
        data.dyninfos
            .iter()
            .map(|di| (di.fraction, indexed[&di.element].clone()))
            .collect()
    };

    // cross-check dyninfo fractions against the cell when both are present
    if crystalline && !data.dyninfos.is_empty() {
        let total: u32 = counts.values().sum();
        for di in &data.dyninfos {
            let cell_frac = counts.get(&di.element).copied().unwrap_or(0) as f64 / total as f64;
            if (cell_frac - di.fraction).abs() > 1e-6 {
                warn!(
                    "@DYNINFO fraction {} for element {} differs from unit-cell fraction \
                     {cell_frac}",
                    di.fraction, di.element
                );
            }
        }
    }

    // composition-weighted reference cross sections
    let xs_free: f64 = composition
        .iter()
        .map(|(f, a)| f * a.data.free_scattering_xs())
        .sum();
    let xs_abs: f64 = composition
        .iter()
        .map(|(f, a)| f * a.data.absorption_xs())
        .sum();
    builder.set_xs_free(xs_free);
    builder.set_xs_absorption(xs_abs);

    // dynamics: declared sections, or a Debye-model fallback for crystals
    if !data.dyninfos.is_empty() {
        for di in &data.dyninfos {
            let common = DynCommon {
                fraction: di.fraction,
                atom: indexed[&di.element].clone(),
                temperature,
            };
            builder.add_dynamics(build_dynamics(di, common, temperature, debye_for(&di.element))?);
        }
    } else if crystalline {
        // older files carry no @DYNINFO; the Debye temperature drives an
        // idealized spectrum for each element instead
        let total: u32 = counts.values().sum();
        for name in &order {
            let count = counts.get(name).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            let debye_temp = debye_for(name).ok_or_else(|| {
                Error::missing(format!(
                    "no Debye temperature available for element \"{name}\""
                ))
            })?;
            builder.add_dynamics(DynamicInfo::VdosDebye {
                common: DynCommon {
                    fraction: count as f64 / total as f64,
                    atom: indexed[name].clone(),
                    temperature,
                },
                debye_temp,
            });
        }
    }

    // HKL list for crystals, unless disabled with dcutoff=-1
    if crystalline && cfg.dcutoff != -1.0 {
        let dcutoff = if cfg.dcutoff == 0.0 {
            debug!("dcutoff=0, selecting automatic cutoff {AUTO_DCUTOFF}");
            AUTO_DCUTOFF
        } else {
            cfg.dcutoff
        };
        let structure = structure_info.expect("crystalline materials have a structure");
        let hkl_cfg = HklCfg {
            dcutoff,
            dcutoffup: cfg.dcutoffup,
            expand_hkl: cfg.expand_hkl,
            ..Default::default()
        };
        builder.set_hkl(enumerate_hkl(&structure, &atom_infos, &hkl_cfg)?);
    }

    for ai in atom_infos {
        builder.add_atom(ai);
    }
    builder.set_composition(composition);
    for (name, lines) in &data.custom_sections {
        builder.add_custom_section(name.clone(), lines.clone());
    }

    builder.build()
}

fn resolve_atomdb(data: &NcmatData, cfg: &NcmatLoadCfg) -> Result<AtomDb> {
    let mut db = AtomDb::from_lines(&data.atomdb_lines)?;
    let cfg_lines = &cfg.atomdb_lines;
    let nodefaults = cfg_lines
        .first()
        .is_some_and(|line| line.len() == 1 && line[0] == "nodefaults");
    if nodefaults {
        db = AtomDb::empty();
        db.apply_lines(&cfg_lines[1..])?;
    } else {
        db.apply_lines(cfg_lines)?;
    }
    Ok(db)
}

fn build_dynamics(
    di: &DynInfoData,
    common: DynCommon,
    temperature: f64,
    debye_temp: Option<f64>,
) -> Result<DynamicInfo> {
    let out = match di.dtype {
        DynType::Sterile => DynamicInfo::Sterile(common),
        DynType::FreeGas => DynamicInfo::FreeGas(common),
        DynType::VdosDebye => {
            let debye_temp = debye_temp.ok_or_else(|| {
                Error::missing(format!(
                    "@DYNINFO type \"vdosdebye\" for element \"{}\" needs a Debye temperature",
                    di.element
                ))
            })?;
            DynamicInfo::VdosDebye { common, debye_temp }
        }
        DynType::Vdos => {
            let vdos_egrid = di
                .field("vdos_egrid")
                .ok_or_else(|| Error::missing("vdos_egrid missing".to_string()))?;
            let vdos_density = di
                .field("vdos_density")
                .ok_or_else(|| Error::missing("vdos_density missing".to_string()))?;
            DynamicInfo::Vdos {
                vdos: VdosData::from_raw(vdos_egrid, vdos_density)?,
                egrid: di.field("egrid").map(<[f64]>::to_vec),
                common,
            }
        }
        DynType::ScatKnl => {
            let alpha = di
                .field("alphagrid")
                .ok_or_else(|| Error::missing("alphagrid missing".to_string()))?
                .to_vec();
            let beta = di
                .field("betagrid")
                .ok_or_else(|| Error::missing("betagrid missing".to_string()))?
                .to_vec();
            let (table, knltype) = match (di.field("sab"), di.field("sab_scaled")) {
                (Some(t), None) => (t.to_vec(), KnlType::Sab),
                (None, Some(t)) => {
                    // a scaled table starting at beta=0 is the symmetric form
                    let knltype = if beta[0] == 0.0 {
                        KnlType::ScaledSymSab
                    } else {
                        KnlType::ScaledSab
                    };
                    (t.to_vec(), knltype)
                }
                _ => {
                    return Err(Error::bad(
                        "scatknl needs exactly one of sab / sab_scaled".to_string(),
                    ))
                }
            };
            let knl = ScatKnlData {
                alpha,
                beta,
                sab: table,
                temperature,
                bound_xs: common.atom.data.scattering_xs(),
                mass_amu: common.atom.data.mass_amu(),
                knltype,
                suggested_emax: None,
            };
            DynamicInfo::ScatKnlDirect {
                common,
                knl,
                egrid: di.field("egrid").map(<[f64]>::to_vec),
                sab: OnceCell::new(),
            }
        }
        DynType::Undefined => {
            return Err(Error::bad("dyninfo with undefined type".to_string()))
        }
    };
    Ok(out)
}
