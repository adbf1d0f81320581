//! The material configuration grammar and its typed representation
//!
//! A configuration string is `source[;ignorefilecfg][;key=value]*`, where
//! the source names a data file or in-memory entry and the keys are drawn
//! from a fixed, typed parameter table. Values are unit-aware (`temp=20C`,
//! `dcutoff=0.5Aa`, `mos=0.3deg`), and a data file may embed a default
//! configuration in a `NCRYSTALMATCFG[...]` magic comment which merges in
//! unless `ignorefilecfg` is given.
//!
//! [MatCfg] is a persistent value type: clones share storage and writes
//! copy on demand, so factories can normalize a caller's configuration
//! without surprises. Reads can be observed through an [AccessRecorder] to
//! learn which parameters actually influenced a build.
//!
//! ```rust
//! # use nxtal_cfg::MatCfg;
//! # nxtal_textsrc::register_memory_entry("quick.ncmat", "NCMAT v2\n@DYNINFO\nelement He\nfraction 1\ntype freegas\n@DENSITY\n1.0 kg_per_m3\n");
//! let cfg = MatCfg::new("quick.ncmat;temp=20C;dcutoff=0.5Aa").unwrap();
//! assert!((cfg.temp() - 293.15).abs() < 1e-12);
//! assert!((cfg.dcutoff() - 0.5).abs() < 1e-12);
//! ```

// Split into subfiles for development, but anything important is re-exported
mod embedded;
mod error;
mod matcfg;
mod orient;
mod param;
mod recorder;

#[doc(inline)]
pub use matcfg::MatCfg;

#[doc(inline)]
pub use orient::{CrystalAxis, OrientDir};

#[doc(inline)]
pub use param::Param;

#[doc(inline)]
pub use recorder::AccessRecorder;

#[doc(inline)]
pub use error::{Error, Result};
