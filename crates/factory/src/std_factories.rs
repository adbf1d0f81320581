//! The standard factory set

// crate modules
use crate::error::{Error, Result};
use crate::registry::{AbsorptionFactory, InfoFactory, ScatterFactory};

// external crates
use log::{debug, warn};
use nalgebra::{Rotation3, Vector3};

// nxtal modules
use nxtal_cfg::{AccessRecorder, CrystalAxis, MatCfg, Param};
use nxtal_info::{load_ncmat, reciprocal_matrix, DynamicInfo, Info, NcmatLoadCfg};
use nxtal_ncmat::parse_ncmat;
use nxtal_scatter::{
    determine_orientation, Absorption, Composite, FreeAbsorption, FreeGas, IncohElastic, LcBragg,
    OrientationSpec, SabScatter, ScBragg, Scatter,
};
use nxtal_textsrc::create_source;
use nxtal_utils::DEG;
use nxtal_vdos::{expand_to_sab, ExpandCfg, VdosData};

// standard library
use std::sync::Arc;

/// The parameter subset that influences material (Info) building
pub const INFO_PARAMS: [Param; 6] = [
    Param::atomdb,
    Param::dcutoff,
    Param::dcutoffup,
    Param::infofactory,
    Param::overridefileext,
    Param::temp,
];

// Default mosaicity for layered crystals configured without explicit
// single-crystal parameters (a preferred axis alone suffices to ask for
// the layered model)
const LC_DEFAULT_MOS_FWHM: f64 = 1.0 * DEG;

/// The standard loader for `.ncmat` data files
pub(crate) struct StdNcmatInfoFactory;

impl InfoFactory for StdNcmatInfoFactory {
    fn name(&self) -> &'static str {
        "stdncmat"
    }

    fn rank(&self, cfg: &MatCfg) -> u32 {
        if cfg.data_extension() == "ncmat" {
            100
        } else {
            0
        }
    }

    fn create_info(&self, cfg: &MatCfg) -> Result<Arc<Info>> {
        cfg.infofact_validate(&["expandhkl"]).map_err(Error::Cfg)?;

        // record which parameters actually influence this build
        let recorder = Arc::new(AccessRecorder::default());
        let cfg = cfg.with_recorder(recorder.clone());

        let source = create_source(cfg.data_name())?;
        let data = parse_ncmat(source)?;
        let load_cfg = NcmatLoadCfg {
            temp: cfg.temp(),
            dcutoff: cfg.dcutoff(),
            dcutoffup: cfg.dcutoffup(),
            expand_hkl: cfg.infofact_flag("expandhkl").map_err(Error::Cfg)?,
            atomdb_lines: cfg.atomdb_parsed(),
        };
        let info = load_ncmat(&data, &load_cfg)?;
        debug!(
            "stdncmat used parameters {:?} for \"{}\"",
            recorder.accessed(),
            cfg.data_name()
        );
        Ok(info)
    }
}

/// The standard scatter-process composer
pub(crate) struct StdScatterFactory;

// Resolve the (dir1, dir2, dirtol) configuration into a crystal→lab
// rotation, mapping hkl-specified axes through the reciprocal lattice.
fn orientation_from_cfg(cfg: &MatCfg, info: &Info) -> Result<Rotation3<f64>> {
    let structure = info.structure().ok_or_else(|| {
        Error::Process(nxtal_scatter::Error::BadSetup(
            "oriented crystals need structure info".into(),
        ))
    })?;
    let resolve = |axis: CrystalAxis| -> Result<Vector3<f64>> {
        match axis {
            CrystalAxis::Direction(v) => Ok(Vector3::new(v[0], v[1], v[2])),
            CrystalAxis::Hkl(v) => {
                let rec = reciprocal_matrix(structure)?;
                Ok(rec * Vector3::new(v[0], v[1], v[2]))
            }
        }
    };
    let dir1 = cfg.dir1().map_err(Error::Cfg)?;
    let dir2 = cfg.dir2().map_err(Error::Cfg)?;
    let spec = OrientationSpec {
        dir1_crystal: resolve(dir1.crystal)?,
        dir1_lab: Vector3::from(dir1.lab),
        dir2_crystal: resolve(dir2.crystal)?,
        dir2_lab: Vector3::from(dir2.lab),
        dirtol: cfg.dirtol(),
    };
    Ok(determine_orientation(&spec)?)
}

fn build_inelastic(
    cfg: &MatCfg,
    info: &Info,
    packfact: f64,
    composite: &mut Composite,
) -> Result<()> {
    let mode = cfg.inelas();
    if mode == "none" {
        return Ok(());
    }
    if !matches!(mode.as_str(), "auto" | "freegas" | "vdosdebye") {
        return Err(Error::Cfg(nxtal_cfg::Error::BadInput(format!(
            "unknown inelas mode \"{mode}\""
        ))));
    }

    for dynamics in info.dynamics() {
        let fraction = dynamics.fraction();
        let atom = dynamics.atom();
        let temperature = dynamics.temperature();

        // forced models short-circuit the per-element defaults
        if mode == "freegas" {
            composite.add(
                packfact * fraction,
                Box::new(FreeGas::new(
                    temperature,
                    atom.data.mass_amu(),
                    atom.data.free_scattering_xs(),
                )?),
            );
            continue;
        }
        if mode == "vdosdebye" {
            let debye_temp = info.debye_temp_by_index(atom.index).ok_or_else(|| {
                Error::Process(nxtal_scatter::Error::BadSetup(
                    "inelas=vdosdebye needs Debye temperatures".into(),
                ))
            })?;
            composite.add(
                packfact * fraction,
                Box::new(kernel_process(
                    &VdosData::debye(debye_temp)?,
                    cfg,
                    temperature,
                    atom.data.scattering_xs(),
                    atom.data.mass_amu(),
                )?),
            );
            continue;
        }

        match dynamics {
            DynamicInfo::Sterile(_) => {}
            DynamicInfo::FreeGas(_) => {
                composite.add(
                    packfact * fraction,
                    Box::new(FreeGas::new(
                        temperature,
                        atom.data.mass_amu(),
                        atom.data.free_scattering_xs(),
                    )?),
                );
            }
            DynamicInfo::ScatKnlDirect { .. } => {
                let sab = dynamics
                    .sab()
                    .expect("direct kernels expose a table")
                    .map_err(Error::Material)?;
                composite.add(packfact * fraction, Box::new(SabScatter::new(sab)?));
            }
            DynamicInfo::Vdos { vdos, .. } => {
                composite.add(
                    packfact * fraction,
                    Box::new(kernel_process(
                        vdos,
                        cfg,
                        temperature,
                        atom.data.scattering_xs(),
                        atom.data.mass_amu(),
                    )?),
                );
            }
            DynamicInfo::VdosDebye { debye_temp, .. } => {
                composite.add(
                    packfact * fraction,
                    Box::new(kernel_process(
                        &VdosData::debye(*debye_temp)?,
                        cfg,
                        temperature,
                        atom.data.scattering_xs(),
                        atom.data.mass_amu(),
                    )?),
                );
            }
        }
    }
    Ok(())
}

fn kernel_process(
    vdos: &VdosData,
    cfg: &MatCfg,
    temperature: f64,
    bound_xs: f64,
    mass_amu: f64,
) -> Result<SabScatter> {
    let data = expand_to_sab(
        vdos,
        &ExpandCfg {
            temperature,
            bound_xs,
            mass_amu,
            vdoslux: cfg.vdoslux() as u32,
        },
    )?;
    Ok(SabScatter::new(Arc::new(data))?)
}

impl ScatterFactory for StdScatterFactory {
    fn name(&self) -> &'static str {
        "stdscat"
    }

    fn rank(&self, _cfg: &MatCfg) -> u32 {
        100
    }

    fn create_scatter(&self, cfg: &MatCfg, info: &Arc<Info>) -> Result<Arc<dyn Scatter>> {
        cfg.scatfact_validate(&[]).map_err(Error::Cfg)?;
        let mut composite = Composite::new();
        let packfact = cfg.packfact();

        let has_hkl = info.hkl().map(|h| !h.list.is_empty()).unwrap_or(false);
        if cfg.coh_elas() && has_hkl {
            if cfg.is_single_crystal() || cfg.is_layered_crystal() {
                // layered crystals configured with only the preferred axis
                // fall back to a default mosaic width and the identity
                // orientation
                let (orientation, mos) = if cfg.is_single_crystal() {
                    (orientation_from_cfg(cfg, info)?, cfg.mos().map_err(Error::Cfg)?)
                } else {
                    warn!(
                        "layered crystal configured without mos/dir1/dir2; using the \
                         identity orientation and a {LC_DEFAULT_MOS_FWHM} rad default \
                         mosaicity"
                    );
                    (Rotation3::identity(), LC_DEFAULT_MOS_FWHM)
                };
                let sc = ScBragg::new(
                    info,
                    orientation,
                    mos,
                    true,
                    cfg.mosprec(),
                    cfg.sccutoff(),
                )?;
                if cfg.is_layered_crystal() {
                    let axis = cfg.lcaxis().map_err(Error::Cfg)?;
                    let lab_axis = orientation * Vector3::from(axis);
                    composite.add(
                        packfact,
                        Box::new(LcBragg::new(sc, lab_axis, cfg.lcmode())?),
                    );
                } else {
                    composite.add(packfact, Box::new(sc));
                }
            } else {
                composite.add(packfact, Box::new(nxtal_scatter::PcBragg::new(info)?));
            }
        }

        if cfg.incoh_elas() {
            // materials with no incoherent power simply skip the component
            match IncohElastic::new(info) {
                Ok(process) => composite.add(packfact, Box::new(process)),
                Err(nxtal_scatter::Error::BadSetup(_)) => {}
                Err(other) => return Err(other.into()),
            }
        }

        build_inelastic(cfg, info, packfact, &mut composite)?;

        Ok(Arc::new(composite))
    }
}

/// The standard 1/v absorption factory
pub(crate) struct StdAbsorptionFactory;

impl AbsorptionFactory for StdAbsorptionFactory {
    fn name(&self) -> &'static str {
        "stdabs"
    }

    fn rank(&self, _cfg: &MatCfg) -> u32 {
        100
    }

    fn create_absorption(&self, cfg: &MatCfg, info: &Arc<Info>) -> Result<Arc<dyn Absorption>> {
        cfg.absnfact_validate(&[]).map_err(Error::Cfg)?;
        Ok(Arc::new(FreeAbsorption::from_info(info)))
    }
}
