//! Built-in neutron data table
//!
//! A curated subset of elements and isotopes met in thermal-neutron
//! instrument and moderator materials. Values are 2200 m/s reference data:
//! coherent scattering length \[fm\], incoherent cross section \[barn\],
//! absorption cross section \[barn\], molar mass \[amu\].

// Natural elements: (symbol, Z, mass, b_coh, sigma_inc, sigma_abs)
pub(crate) const NATURAL_ELEMENTS: &[(&str, u32, f64, f64, f64, f64)] = &[
    ("H", 1, 1.00794, -3.7390, 80.26, 0.3326),
    ("He", 2, 4.002602, 3.26, 0.0, 0.00747),
    ("Li", 3, 6.941, -1.90, 0.92, 70.5),
    ("Be", 4, 9.012182, 7.79, 0.0018, 0.0076),
    ("B", 5, 10.811, 5.30, 1.70, 767.0),
    ("C", 6, 12.0107, 6.6460, 0.001, 0.0035),
    ("N", 7, 14.0067, 9.36, 0.50, 1.90),
    ("O", 8, 15.9994, 5.803, 0.0008, 0.00019),
    ("F", 9, 18.9984032, 5.654, 0.0008, 0.0096),
    ("Na", 11, 22.98976928, 3.63, 1.62, 0.530),
    ("Mg", 12, 24.3050, 5.375, 0.08, 0.063),
    ("Al", 13, 26.9815386, 3.449, 0.0082, 0.231),
    ("Si", 14, 28.0855, 4.1491, 0.004, 0.171),
    ("P", 15, 30.973762, 5.13, 0.005, 0.172),
    ("S", 16, 32.065, 2.847, 0.007, 0.53),
    ("Cl", 17, 35.453, 9.5770, 5.3, 33.5),
    ("K", 19, 39.0983, 3.67, 0.27, 2.1),
    ("Ca", 20, 40.078, 4.70, 0.05, 0.43),
    ("Ti", 22, 47.867, -3.438, 2.87, 6.09),
    ("V", 23, 50.9415, -0.3824, 5.08, 5.08),
    ("Cr", 24, 51.9961, 3.635, 1.83, 3.05),
    ("Mn", 25, 54.938045, -3.73, 0.40, 13.3),
    ("Fe", 26, 55.845, 9.45, 0.40, 2.56),
    ("Co", 27, 58.933195, 2.49, 4.8, 37.18),
    ("Ni", 28, 58.6934, 10.3, 5.2, 4.49),
    ("Cu", 29, 63.546, 7.718, 0.55, 3.78),
    ("Zn", 30, 65.38, 5.680, 0.077, 1.11),
    ("Ge", 32, 72.64, 8.185, 0.18, 2.2),
    ("Zr", 40, 91.224, 7.16, 0.02, 0.185),
    ("Nb", 41, 92.90638, 7.054, 0.0024, 1.15),
    ("Mo", 42, 95.96, 6.715, 0.04, 2.48),
    ("Ag", 47, 107.8682, 5.922, 0.58, 63.3),
    ("Cd", 48, 112.411, 4.87, 3.46, 2520.0),
    ("Sn", 50, 118.710, 6.225, 0.022, 0.626),
    ("Ba", 56, 137.327, 5.07, 0.15, 1.1),
    ("Gd", 64, 157.25, 6.5, 151.0, 49700.0),
    ("W", 74, 183.84, 4.86, 1.63, 18.3),
    ("Au", 79, 196.966569, 7.63, 0.43, 98.65),
    ("Pb", 82, 207.2, 9.405, 0.003, 0.171),
    ("Bi", 83, 208.98040, 8.532, 0.0084, 0.0338),
];

// Single isotopes: (symbol, Z, A, mass, b_coh, sigma_inc, sigma_abs)
pub(crate) const ISOTOPES: &[(&str, u32, u32, f64, f64, f64, f64)] = &[
    ("H1", 1, 1, 1.00782503, -3.7406, 80.27, 0.3326),
    ("H2", 1, 2, 2.01410178, 6.671, 2.05, 0.000519),
    ("H3", 1, 3, 3.01604928, 4.792, 0.14, 0.0),
    ("He3", 2, 3, 3.01602932, 5.74, 1.6, 5333.0),
    ("He4", 2, 4, 4.00260325, 3.26, 0.0, 0.0),
    ("Li6", 3, 6, 6.01512288, 2.00, 0.46, 940.0),
    ("Li7", 3, 7, 7.01600343, -2.22, 0.78, 0.0454),
    ("B10", 5, 10, 10.01293695, -0.1, 3.0, 3835.0),
    ("B11", 5, 11, 11.00930536, 6.65, 0.21, 0.0055),
    ("C12", 6, 12, 12.0, 6.6511, 0.0, 0.00353),
    ("C13", 6, 13, 13.00335484, 6.19, 0.52, 0.00137),
    ("N14", 7, 14, 14.00307401, 9.37, 0.50, 1.91),
    ("N15", 7, 15, 15.00010890, 6.44, 0.00005, 0.000024),
    ("O16", 8, 16, 15.99491462, 5.803, 0.0, 0.00010),
    ("O17", 8, 17, 16.99913176, 5.78, 0.004, 0.236),
    ("O18", 8, 18, 17.99915961, 5.84, 0.0, 0.00016),
];

// Natural abundance breakdowns: (element symbol, [(isotope symbol, fraction)])
pub(crate) const NATURAL_ABUNDANCES: &[(&str, &[(&str, f64)])] = &[
    ("H", &[("H1", 0.99985), ("H2", 0.00015)]),
    ("He", &[("He3", 0.00000137), ("He4", 0.99999863)]),
    ("Li", &[("Li6", 0.0759), ("Li7", 0.9241)]),
    ("B", &[("B10", 0.199), ("B11", 0.801)]),
    ("C", &[("C12", 0.9893), ("C13", 0.0107)]),
    ("N", &[("N14", 0.99636), ("N15", 0.00364)]),
    ("O", &[("O16", 0.99757), ("O17", 0.00038), ("O18", 0.00205)]),
];

/// Element symbol for a proton number, if covered by the built-in table
pub(crate) fn element_symbol(z: u32) -> Option<&'static str> {
    NATURAL_ELEMENTS
        .iter()
        .find(|(_, tz, ..)| *tz == z)
        .map(|(sym, ..)| *sym)
}
