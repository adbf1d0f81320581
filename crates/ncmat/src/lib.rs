//! Parser for the NCMAT material text format
//!
//! NCMAT files are line oriented. The first line must read `NCMAT vN` with
//! N in {1,2,3}, and the rest of the file is organised into sections opened
//! by a `@NAME` marker in column 1. Parsing produces a raw [NcmatData]
//! record; interpretation into a material model is left to downstream crates
//! so that the strict format rules stay in one place.
//!
//! The parser operates in a single pass with per-section handlers. A handler
//! receives an empty token list when its section closes, which is where
//! intra-section validation runs so errors can cite the section and line.
//!
//! Minimal example:
//! ```rust
//! # use nxtal_textsrc::MemorySource;
//! # use nxtal_ncmat::parse_ncmat;
//! let content = "NCMAT v2\n@DYNINFO\nelement He\nfraction 1\ntype freegas\n@DENSITY\n0.178577 kg_per_m3\n";
//! let data = parse_ncmat(Box::new(MemorySource::new("He.ncmat", content))).unwrap();
//! assert_eq!(data.version, 2);
//! assert_eq!(data.dyninfos.len(), 1);
//! ```

// Split into subfiles for development, but anything important is re-exported
mod data;
mod error;
mod parser;
mod tokens;
mod writer;

#[doc(inline)]
pub use data::{CellData, DensityUnit, DynInfoData, DynType, NcmatData};

#[doc(inline)]
pub use parser::parse_ncmat;

#[doc(inline)]
pub use writer::write_ncmat;

#[doc(inline)]
pub use error::{Error, Result};
