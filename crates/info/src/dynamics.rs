//! Per-element dynamics of a material

// crate modules
use crate::error::Result;
use crate::types::IndexedAtom;

// external crates
use once_cell::sync::OnceCell;

// nxtal modules
use nxtal_sab::{canonicalize, SabData, ScatKnlData};
use nxtal_vdos::VdosData;

// standard library
use std::sync::Arc;

/// Fields shared by every dynamics variant
#[derive(Debug, Clone)]
pub struct DynCommon {
    /// Fraction of atoms covered, in (0,1]
    pub fraction: f64,
    /// The atom role
    pub atom: IndexedAtom,
    /// Material temperature \[K\] (same as on the owning Info)
    pub temperature: f64,
}

/// How one element of the material scatters inelastically
///
/// A closed set of model variants. Variants that can produce a scattering
/// kernel do so on demand; for a pre-tabulated kernel the conversion is
/// done at most once per object, concurrent callers block on the first
/// build and share its result.
#[derive(Debug)]
pub enum DynamicInfo {
    /// No inelastic scattering for this element
    Sterile(DynCommon),
    /// Ideal-gas kinematics from temperature and mass
    FreeGas(DynCommon),
    /// Explicit pre-tabulated S(α,β)
    ScatKnlDirect {
        /// Common fields
        common: DynCommon,
        /// The kernel as tabulated in the data source
        knl: ScatKnlData,
        /// Caller-requested energy grid: `[emin,emax,npts]` or a full grid
        egrid: Option<Vec<f64>>,
        /// Lazily built canonical kernel
        sab: OnceCell<Arc<SabData>>,
    },
    /// Tabulated phonon density of states, expanded downstream
    Vdos {
        /// Common fields
        common: DynCommon,
        /// Regularized spectrum (original curves inside)
        vdos: VdosData,
        /// Caller-requested energy grid
        egrid: Option<Vec<f64>>,
    },
    /// Idealised quadratic density of states from a Debye temperature
    VdosDebye {
        /// Common fields
        common: DynCommon,
        /// The Debye temperature \[K\]
        debye_temp: f64,
    },
}

impl DynamicInfo {
    /// The fields shared by all variants
    pub fn common(&self) -> &DynCommon {
        match self {
            DynamicInfo::Sterile(c) | DynamicInfo::FreeGas(c) => c,
            DynamicInfo::ScatKnlDirect { common, .. }
            | DynamicInfo::Vdos { common, .. }
            | DynamicInfo::VdosDebye { common, .. } => common,
        }
    }

    /// Fraction of the material's atoms this entry covers
    pub fn fraction(&self) -> f64 {
        self.common().fraction
    }

    /// The atom role
    pub fn atom(&self) -> &IndexedAtom {
        &self.common().atom
    }

    /// Material temperature \[K\]
    pub fn temperature(&self) -> f64 {
        self.common().temperature
    }

    /// The canonical kernel of a pre-tabulated variant
    ///
    /// Builds on first call (kernel conversion can be expensive), then
    /// hands out the shared result. Returns `None` for variants that carry
    /// no direct kernel.
    pub fn sab(&self) -> Option<Result<Arc<SabData>>> {
        match self {
            DynamicInfo::ScatKnlDirect { knl, sab, .. } => Some(
                sab.get_or_try_init(|| Ok(Arc::new(canonicalize(knl.clone())?)))
                    .cloned(),
            ),
            _ => None,
        }
    }

    /// The caller-requested energy grid, when the source dictated one
    pub fn energy_grid(&self) -> Option<&[f64]> {
        match self {
            DynamicInfo::ScatKnlDirect { egrid, .. } | DynamicInfo::Vdos { egrid, .. } => {
                egrid.as_deref()
            }
            _ => None,
        }
    }
}
