//! Absorption processes

// crate modules
use crate::error::Result;

// nxtal modules
use nxtal_info::Info;
use nxtal_utils::EKIN_2200M_S;

/// An absorption process: a cross section without outgoing particles
pub trait Absorption: Send + Sync + std::fmt::Debug {
    /// Short identifying name
    fn name(&self) -> &'static str;

    /// Energy domain `(E_low, E_high)` \[eV\]; σ vanishes outside
    fn domain(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    /// Absorption cross section \[barn\] at the given energy
    fn cross_section(&self, ekin: f64) -> Result<f64>;
}

/// The standard 1/v absorption model
///
/// Thermal-neutron absorption overwhelmingly follows the 1/v law, so the
/// tabulated 2200 m/s value extrapolates as `σ(E) = σ₂₂₀₀·√(E₂₂₀₀/E)`.
///
/// ```rust
/// # use nxtal_scatter::{Absorption, FreeAbsorption};
/// let abs = FreeAbsorption::new(0.231); // aluminium
/// let at_ref = abs.cross_section(0.0253).unwrap();
/// assert!((at_ref - 0.231).abs() < 1e-3);
/// // colder neutrons absorb more
/// assert!(abs.cross_section(0.001).unwrap() > at_ref);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FreeAbsorption {
    xs_2200: f64,
}

impl FreeAbsorption {
    /// From the 2200 m/s cross section \[barn\]
    pub fn new(xs_2200: f64) -> Self {
        Self { xs_2200 }
    }

    /// From a material's composition-weighted absorption cross section
    pub fn from_info(info: &Info) -> Self {
        let xs_2200 = info.xs_absorption().unwrap_or_else(|| {
            info.composition()
                .iter()
                .map(|(f, a)| f * a.data.absorption_xs())
                .sum()
        });
        Self { xs_2200 }
    }
}

impl Absorption for FreeAbsorption {
    fn name(&self) -> &'static str {
        "freeabsorption"
    }

    fn cross_section(&self, ekin: f64) -> Result<f64> {
        if !(ekin > 0.0) {
            return Ok(0.0);
        }
        Ok(self.xs_2200 * (EKIN_2200M_S / ekin).sqrt())
    }
}
