//! Common utility for extended `std` types and neutron physics constants
//!
//! These are left public for convenience.
//!
//! For example, converting between neutron wavelength and kinetic energy or
//! rendering physical quantities for material dumps are useful everywhere.

// Alias for the format! macro
pub use std::format as f;

// Modules
mod constants;
mod error;
mod grid_ext;
mod math;
mod quantity_ext;
mod string_ext;

// Flatten
pub use constants::*;
pub use error::{Error, Result};
pub use grid_ext::GridExt;
pub use math::{erf, neumaier_sum, romberg, StableSum};
pub use quantity_ext::{OptQuantityExt, QuantityExt};
pub use string_ext::StringExt;
