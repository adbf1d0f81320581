//! Physical constants and unit conversions for thermal neutron work
//!
//! Internal units are angstrom for lengths, eV for energies, kelvin for
//! temperatures, barn for cross sections and amu for masses.

/// Avogadro constant \[1/mol\]
pub const AVOGADRO: f64 = 6.022140857e23;

/// Boltzmann constant \[eV/K\]
pub const BOLTZMANN: f64 = 8.6173303e-5;

/// Neutron mass \[amu\]
pub const NEUTRON_MASS_AMU: f64 = 1.00866491588;

/// Conversion constant between wavelength and kinetic energy \[eV·Aa²\]
///
/// `ekin = WL2EKIN / wavelength²` for wavelength in angstrom.
pub const WL2EKIN: f64 = 0.081804209605330899;

/// Kinetic energy of a 2200 m/s neutron \[eV\]
///
/// The reference speed at which absorption cross sections are tabulated.
pub const EKIN_2200M_S: f64 = 0.0252988616;

/// Converts amu per cubic angstrom to g/cm³
pub const AMU_PER_AA3_TO_G_PER_CM3: f64 = 1.660539040;

/// One degree in radians
pub const DEG: f64 = std::f64::consts::PI / 180.0;

/// One arc minute in radians
pub const ARCMIN: f64 = DEG / 60.0;

/// One arc second in radians
pub const ARCSEC: f64 = DEG / 3600.0;

/// Kinetic energy \[eV\] of a neutron with the given wavelength \[Aa\]
///
/// ```rust
/// # use nxtal_utils::wl2ekin;
/// // thermal reference point, 1.798 Aa ~ 25.3 meV
/// assert!((wl2ekin(1.798) - 0.0253).abs() < 1e-4);
/// ```
pub fn wl2ekin(wavelength: f64) -> f64 {
    if wavelength == 0.0 {
        f64::INFINITY
    } else {
        WL2EKIN / (wavelength * wavelength)
    }
}

/// Wavelength \[Aa\] of a neutron with the given kinetic energy \[eV\]
///
/// ```rust
/// # use nxtal_utils::{ekin2wl, wl2ekin};
/// let wl = 2.0;
/// assert!((ekin2wl(wl2ekin(wl)) - wl).abs() < 1e-12);
/// ```
pub fn ekin2wl(ekin: f64) -> f64 {
    if ekin == 0.0 {
        f64::INFINITY
    } else {
        (WL2EKIN / ekin).sqrt()
    }
}

/// Squared neutron wavevector `k² = (2π/λ)²` \[1/Aa²\] at the given energy \[eV\]
pub fn ekin2ksq(ekin: f64) -> f64 {
    4.0 * std::f64::consts::PI * std::f64::consts::PI * ekin / WL2EKIN
}
