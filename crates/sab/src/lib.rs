//! S(α,β) scattering-kernel handling
//!
//! Scattering kernels arrive in several tabulated forms (`SAB`,
//! `SCALED_SAB`, `SCALED_SYM_SAB`); this crate normalizes them to the
//! canonical asymmetric S(α,β), works out which part of a kernel is
//! kinematically reachable for a given neutron energy, and integrates the
//! table over that region to produce cross sections and sampled (α,β)
//! pairs.
//!
//! α and β are the dimensionless momentum- and energy-transfer variables,
//! `α = Q²ħ²/(2·M·kT)` and `β = ΔE/kT`.

// Split into subfiles for development, but anything important is re-exported
mod data;
mod error;
mod eval;
mod integrate;
mod kinematics;

#[doc(inline)]
pub use data::{canonicalize, KnlType, SabData, ScatKnlData};

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use eval::SabEval;

#[doc(inline)]
pub use integrate::{integrate_alpha_interval, interp_loglin, TailedBreakdown};

#[doc(inline)]
pub use kinematics::{active_grid_cells, active_grid_ranges, alpha_limits, AlphaRange};
