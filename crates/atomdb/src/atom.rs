//! Module for the fundamental atom data model

// crate modules
use crate::error::{Error, Result};

// standard library
use std::fmt;
use std::sync::Arc;

/// Fractional isotope contribution to a natural element or mixture
#[derive(Debug, Clone)]
pub struct IsotopeFraction {
    /// Fraction of this component, in (0, 1]
    pub fraction: f64,
    /// The component atom
    pub atom: Arc<AtomData>,
}

/// Neutron interaction data for a single isotope, a natural element, or a
/// synthetic mixture
///
/// All quantities refer to the bound atom at rest:
///
/// - coherent scattering length in femtometre (signed),
/// - incoherent cross section in barn,
/// - absorption cross section at 2200 m/s in barn,
/// - molar mass in atomic mass units.
///
/// A natural element carries `a == 0` and, when the breakdown is known, a
/// fraction-weighted isotope list. Mixtures built from override lines carry
/// `z == 0` as well.
#[derive(Debug, Clone)]
pub struct AtomData {
    coh_scat_len: f64,
    incoherent_xs: f64,
    absorption_xs: f64,
    mass_amu: f64,
    z: u32,
    a: u32,
    components: Vec<IsotopeFraction>,
}

impl AtomData {
    /// Create atom data after validating the physical invariants
    pub fn new(
        coh_scat_len_fm: f64,
        incoherent_xs_barn: f64,
        absorption_xs_barn: f64,
        mass_amu: f64,
        z: u32,
        a: u32,
    ) -> Result<Self> {
        if !(mass_amu > 0.0) || !mass_amu.is_finite() {
            return Err(Error::BadDataValue {
                name: "mass",
                reason: format!("must be a positive finite number, got {mass_amu}"),
            });
        }
        if !(incoherent_xs_barn >= 0.0) {
            return Err(Error::BadDataValue {
                name: "incoherent cross section",
                reason: format!("must be non-negative, got {incoherent_xs_barn}"),
            });
        }
        if !(absorption_xs_barn >= 0.0) {
            return Err(Error::BadDataValue {
                name: "absorption cross section",
                reason: format!("must be non-negative, got {absorption_xs_barn}"),
            });
        }
        if !coh_scat_len_fm.is_finite() {
            return Err(Error::BadDataValue {
                name: "coherent scattering length",
                reason: "must be finite".to_string(),
            });
        }
        Ok(Self {
            coh_scat_len: coh_scat_len_fm,
            incoherent_xs: incoherent_xs_barn,
            absorption_xs: absorption_xs_barn,
            mass_amu,
            z,
            a,
            components: Vec::new(),
        })
    }

    /// Attach the isotope breakdown of a natural element or mixture
    ///
    /// Fractions must sum to unity within 1e-9.
    pub fn with_components(mut self, components: Vec<IsotopeFraction>) -> Result<Self> {
        let total: f64 = components.iter().map(|c| c.fraction).sum();
        if !components.is_empty() && (total - 1.0).abs() > 1e-9 {
            return Err(Error::BadDataValue {
                name: "isotope fractions",
                reason: format!("must sum to 1, got {total}"),
            });
        }
        if components.iter().any(|c| !(c.fraction > 0.0 && c.fraction <= 1.0)) {
            return Err(Error::BadDataValue {
                name: "isotope fractions",
                reason: "each fraction must be in (0,1]".to_string(),
            });
        }
        self.components = components;
        Ok(self)
    }

    /// Coherent scattering length \[fm\] (signed)
    pub fn coherent_scat_length(&self) -> f64 {
        self.coh_scat_len
    }

    /// Coherent cross section `4π·b²` \[barn\]
    ///
    /// The factor 0.01 converts fm² to barn.
    pub fn coherent_xs(&self) -> f64 {
        0.01 * 4.0 * std::f64::consts::PI * self.coh_scat_len * self.coh_scat_len
    }

    /// Incoherent cross section \[barn\]
    pub fn incoherent_xs(&self) -> f64 {
        self.incoherent_xs
    }

    /// Total bound scattering cross section \[barn\]
    pub fn scattering_xs(&self) -> f64 {
        self.coherent_xs() + self.incoherent_xs
    }

    /// Free-atom scattering cross section \[barn\]
    ///
    /// The bound value scaled by `(A/(A+1))²` with A the mass in neutron
    /// masses.
    pub fn free_scattering_xs(&self) -> f64 {
        let a = self.mass_amu / nxtal_utils::NEUTRON_MASS_AMU;
        let k = a / (a + 1.0);
        self.scattering_xs() * k * k
    }

    /// Absorption cross section at 2200 m/s \[barn\]
    pub fn absorption_xs(&self) -> f64 {
        self.absorption_xs
    }

    /// Molar mass \[amu\]
    pub fn mass_amu(&self) -> f64 {
        self.mass_amu
    }

    /// Proton number, 0 for synthetic mixtures
    pub fn z(&self) -> u32 {
        self.z
    }

    /// Mass number, 0 for natural elements and mixtures
    pub fn a(&self) -> u32 {
        self.a
    }

    /// True when this is a single isotope
    pub fn is_single_isotope(&self) -> bool {
        self.z > 0 && self.a > 0
    }

    /// True when this is a natural element
    pub fn is_natural_element(&self) -> bool {
        self.z > 0 && self.a == 0
    }

    /// True when this is a synthetic mixture from override lines
    pub fn is_composite(&self) -> bool {
        self.z == 0
    }

    /// Isotope breakdown, empty when not known
    pub fn components(&self) -> &[IsotopeFraction] {
        &self.components
    }

    /// Element symbol, or `Xx123` for a single isotope, `mix` for composites
    pub fn symbol(&self) -> String {
        if self.is_composite() {
            return "mix".to_string();
        }
        let sym = crate::table::element_symbol(self.z).unwrap_or("??");
        if self.a > 0 {
            format!("{sym}{}", self.a)
        } else {
            sym.to_string()
        }
    }
}

impl fmt::Display for AtomData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}(b_coh={}fm, sigma_inc={}b, sigma_abs={}b, m={}u)",
            self.symbol(),
            self.coh_scat_len,
            self.incoherent_xs,
            self.absorption_xs,
            self.mass_amu
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coherent_xs_from_scat_length() {
        // vanadium-like: nearly pure incoherent scatterer
        let v = AtomData::new(-0.3824, 5.08, 5.08, 50.9415, 23, 0).unwrap();
        assert!((v.coherent_xs() - 0.0184).abs() < 1e-3);
        assert!(v.scattering_xs() > 5.0);
    }

    #[test]
    fn rejects_negative_mass() {
        assert!(AtomData::new(1.0, 0.0, 0.0, -2.0, 1, 0).is_err());
    }

    #[test]
    fn component_fractions_must_sum_to_unity() {
        let b10 = Arc::new(AtomData::new(-0.1, 3.0, 3835.0, 10.0129, 5, 10).unwrap());
        let b11 = Arc::new(AtomData::new(6.65, 0.21, 0.0055, 11.0093, 5, 11).unwrap());
        let nat = AtomData::new(5.30, 1.70, 767.0, 10.81, 5, 0).unwrap();
        let result = nat.with_components(vec![
            IsotopeFraction { fraction: 0.199, atom: b10.clone() },
            IsotopeFraction { fraction: 0.700, atom: b11.clone() },
        ]);
        assert!(result.is_err());

        let nat = AtomData::new(5.30, 1.70, 767.0, 10.81, 5, 0).unwrap();
        let result = nat.with_components(vec![
            IsotopeFraction { fraction: 0.199, atom: b10 },
            IsotopeFraction { fraction: 0.801, atom: b11 },
        ]);
        assert!(result.is_ok());
    }
}
