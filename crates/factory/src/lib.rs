//! Factories and process-wide caches
//!
//! Turning a configuration string into physics objects is expensive
//! (parsing, HKL enumeration, kernel expansion), so the work is done by
//! named, ranked factories behind process-wide caches:
//!
//! - the `Info` cache is keyed by the data source plus the parameter
//!   subset relevant to material building,
//! - the scatter and absorption caches are keyed by the material's unique
//!   id plus the full canonical parameter signature.
//!
//! Two threads requesting the same key receive the same object, with the
//! build executed exactly once; distinct keys build in parallel.
//! [clear_caches] empties every cache (and any registered invalidation
//! hooks); objects already handed out remain valid.
//!
//! ```rust,no_run
//! use nxtal_factory::{create_scatter, create_absorption};
//! let scatter = create_scatter("Al_sg225.ncmat;temp=293.15").unwrap();
//! let absorption = create_absorption("Al_sg225.ncmat").unwrap();
//! ```

// Split into subfiles for development, but anything important is re-exported
mod cache;
mod error;
mod registry;
mod std_factories;

#[doc(inline)]
pub use registry::{
    create_absorption, create_absorption_cfg, create_info, create_scatter, create_scatter_cfg,
    register_absorption_factory, register_info_factory, register_scatter_factory,
    AbsorptionFactory, InfoFactory, ScatterFactory,
};

#[doc(inline)]
pub use cache::{clear_caches, register_cache_invalidator};

#[doc(inline)]
pub use std_factories::INFO_PARAMS;

#[doc(inline)]
pub use error::{Error, Result};
