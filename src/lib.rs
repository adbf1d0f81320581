//! `nxtal` computes thermal-neutron interaction cross sections and samples
//! scattering outcomes for crystalline and non-crystalline materials
//!
#![doc = include_str!("../readme.md")]
#![deny(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

// Re-exports of toolkit crates.
#[doc(inline)]
pub use nxtal_utils as utils;

#[cfg(feature = "atomdb")]
#[cfg_attr(docsrs, doc(cfg(feature = "atomdb")))]
#[doc(inline)]
pub use nxtal_atomdb as atomdb;

#[cfg(feature = "textsrc")]
#[cfg_attr(docsrs, doc(cfg(feature = "textsrc")))]
#[doc(inline)]
pub use nxtal_textsrc as textsrc;

#[cfg(feature = "ncmat")]
#[cfg_attr(docsrs, doc(cfg(feature = "ncmat")))]
#[doc(inline)]
pub use nxtal_ncmat as ncmat;

#[cfg(feature = "cfg")]
#[cfg_attr(docsrs, doc(cfg(feature = "cfg")))]
#[doc(inline)]
pub use nxtal_cfg as cfg;

#[cfg(feature = "info")]
#[cfg_attr(docsrs, doc(cfg(feature = "info")))]
#[doc(inline)]
pub use nxtal_info as info;

#[cfg(feature = "sab")]
#[cfg_attr(docsrs, doc(cfg(feature = "sab")))]
#[doc(inline)]
pub use nxtal_sab as sab;

#[cfg(feature = "vdos")]
#[cfg_attr(docsrs, doc(cfg(feature = "vdos")))]
#[doc(inline)]
pub use nxtal_vdos as vdos;

#[cfg(feature = "scatter")]
#[cfg_attr(docsrs, doc(cfg(feature = "scatter")))]
#[doc(inline)]
pub use nxtal_scatter as scatter;

#[cfg(feature = "factory")]
#[cfg_attr(docsrs, doc(cfg(feature = "factory")))]
#[doc(inline)]
pub use nxtal_factory as factory;
