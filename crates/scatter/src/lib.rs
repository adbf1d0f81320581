//! Thermal-neutron physics processes
//!
//! A [Scatter] process answers two questions per scattering site: the total
//! cross section at a given neutron energy and direction, and a sampled
//! outgoing direction and energy. The process set is closed: coherent
//! Bragg diffraction on powders ([PcBragg]), oriented single crystals
//! ([ScBragg]) and layered crystals ([LcBragg]); incoherent-elastic
//! scattering ([IncohElastic]); free-gas ([FreeGas]) and kernel-driven
//! ([SabScatter]) inelastic scattering; the null process ([Sterile]); and
//! the weighted [Composite] that transport codes usually talk to.
//!
//! Random numbers come from the caller through [RngSource], so processes
//! hold no hidden generator state and are shareable across threads.

// Split into subfiles for development, but anything important is re-exported
mod absorption;
mod error;
mod freegas;
mod gaussmos;
mod incoh_elastic;
mod lcbragg;
mod orientation;
mod pcbragg;
mod process;
mod rng;
mod sabscatter;
mod scbragg;

#[doc(inline)]
pub use process::{Composite, Outcome, Scatter, Sterile};

#[doc(inline)]
pub use absorption::{Absorption, FreeAbsorption};

#[doc(inline)]
pub use rng::RngSource;

#[doc(inline)]
pub use orientation::{determine_orientation, OrientationSpec};

#[doc(inline)]
pub use gaussmos::GaussMos;

#[doc(inline)]
pub use pcbragg::PcBragg;

#[doc(inline)]
pub use lcbragg::LcBragg;

#[doc(inline)]
pub use incoh_elastic::IncohElastic;

#[doc(inline)]
pub use freegas::FreeGas;

#[doc(inline)]
pub use sabscatter::SabScatter;

#[doc(inline)]
pub use scbragg::ScBragg;

#[doc(inline)]
pub use error::{Error, Result};
