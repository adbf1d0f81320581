//! Vibrational density-of-states handling
//!
//! Solid materials carry their inelastic physics as a phonon spectrum
//! (VDOS). This crate regularizes tabulated spectra onto a zero-anchored
//! linear grid and expands them into full S(α,β) scattering kernels through
//! the phonon (Sjölander) expansion, with the `vdoslux` level steering grid
//! resolution and expansion order.

// Split into subfiles for development, but anything important is re-exported
mod error;
mod expand;
mod regularize;

#[doc(inline)]
pub use regularize::VdosData;

#[doc(inline)]
pub use expand::{expand_to_sab, ExpandCfg};

#[doc(inline)]
pub use error::{Error, Result};
