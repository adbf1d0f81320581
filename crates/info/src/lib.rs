//! The canonical material model
//!
//! An [Info] gathers everything the physics processes need about one
//! material: the crystal structure and atom roles, the HKL reflection list,
//! the per-element dynamics, composition, densities and temperatures. It is
//! built mutably through an [InfoBuilder] (typically by a factory reading a
//! data file), sealed by move into an immutable shared value, and from then
//! on only read.
//!
//! ```rust
//! # use nxtal_textsrc::MemorySource;
//! # use nxtal_ncmat::parse_ncmat;
//! # use nxtal_info::{load_ncmat, NcmatLoadCfg};
//! let content = "NCMAT v2\n@DYNINFO\nelement He\nfraction 1\ntype freegas\n@DENSITY\n0.178577 kg_per_m3\n";
//! let data = parse_ncmat(Box::new(MemorySource::new("He.ncmat", content))).unwrap();
//! let info = load_ncmat(&data, &NcmatLoadCfg::default()).unwrap();
//! assert!(!info.is_crystalline());
//! assert!((info.density() - 0.000178577).abs() < 1e-12);
//! ```

// Split into subfiles for development, but anything important is re-exported
mod dynamics;
mod error;
mod hkl;
mod info;
mod loader;
mod msd;
mod types;

#[doc(inline)]
pub use types::{AtomIndex, AtomInfo, HklInfo, HklList, IndexedAtom, StructureInfo};

#[doc(inline)]
pub use dynamics::{DynCommon, DynamicInfo};

#[doc(inline)]
pub use info::{Info, InfoBuilder};

#[doc(inline)]
pub use hkl::{cell_volume, enumerate_hkl, lattice_matrix, reciprocal_matrix, HklCfg};

#[doc(inline)]
pub use msd::debye_msd;

#[doc(inline)]
pub use loader::{load_ncmat, NcmatLoadCfg};

#[doc(inline)]
pub use error::{Error, Result};
