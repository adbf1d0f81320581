//! Neutron scattering data for isotopes and natural elements
//!
//! Atoms are described by their coherent scattering length, incoherent and
//! absorption cross sections, and molar mass. A curated built-in table covers
//! the elements commonly met in thermal-neutron work, and every value can be
//! overridden (or supplied from scratch) through `@ATOMDB`-style data lines.

// Split into subfiles for development, but anything important is re-exported
mod atom;
mod db;
mod error;
mod table;

#[doc(inline)]
pub use atom::{AtomData, IsotopeFraction};

#[doc(inline)]
pub use db::{validate_atomdb_line, validate_element_name, AtomDb};

#[doc(inline)]
pub use error::{Error, Result};
