//! Uniform line-by-line access to named text inputs
//!
//! Material data may live on disk or in memory (generated files, embedded
//! databases). Parsers in the toolkit never open files directly; they consume
//! a [TextSource] resolved by name through [create_source], which routes to a
//! registered in-memory entry first and the file system second.

// Split into subfiles for development, but anything important is re-exported
mod error;
mod registry;
mod source;

#[doc(inline)]
pub use source::{full_description, FileSource, MemorySource, TextSource};

#[doc(inline)]
pub use registry::{clear_memory_entries, create_source, register_memory_entry};

#[doc(inline)]
pub use error::{Error, Result};
