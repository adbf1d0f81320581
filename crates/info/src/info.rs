//! The sealed material object and its builder

// crate modules
use crate::dynamics::DynamicInfo;
use crate::error::{Error, Result};
use crate::hkl::reciprocal_matrix;
use crate::types::{AtomIndex, AtomInfo, HklList, IndexedAtom, StructureInfo};

// external crates
use nalgebra::Vector3;

// nxtal modules
use nxtal_atomdb::AtomData;
use nxtal_utils::{OptQuantityExt, QuantityExt, AMU_PER_AA3_TO_G_PER_CM3};

// standard library
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Process-wide unique ids for sealed Info objects
static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// Everything known about one material, sealed and immutable
///
/// Built by a factory through [InfoBuilder], then shared by reference
/// count: every physics process constructed from an `Info` keeps it alive.
/// Materials are crystalline when any of structure, atom positions or HKL
/// information is present; non-crystalline materials always carry dynamics.
#[derive(Debug)]
pub struct Info {
    uid: u64,
    structure: Option<StructureInfo>,
    atoms: Vec<AtomInfo>,
    hkl: Option<HklList>,
    dynamics: Vec<DynamicInfo>,
    composition: Vec<(f64, IndexedAtom)>,
    density: f64,
    number_density: f64,
    temperature: Option<f64>,
    debye_temp_global: Option<f64>,
    xs_free: Option<f64>,
    xs_absorption: Option<f64>,
    custom: Vec<(String, Vec<Vec<String>>)>,
    display_labels: Vec<String>,
    atom_data: Vec<Arc<AtomData>>,
}

impl Info {
    /// Process-wide unique id of this object
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Whether any crystal information is present
    pub fn is_crystalline(&self) -> bool {
        self.structure.is_some()
            || self.atoms.iter().any(|a| !a.positions.is_empty())
            || self.hkl.is_some()
    }

    /// Crystal structure, when present
    pub fn structure(&self) -> Option<&StructureInfo> {
        self.structure.as_ref()
    }

    /// Atom roles, sorted by Z descending
    pub fn atoms(&self) -> &[AtomInfo] {
        &self.atoms
    }

    /// HKL reflection list, when enumerated
    pub fn hkl(&self) -> Option<&HklList> {
        self.hkl.as_ref()
    }

    /// Per-element dynamics
    pub fn dynamics(&self) -> &[DynamicInfo] {
        &self.dynamics
    }

    /// Composition as (fraction, atom) pairs; fractions sum to one
    pub fn composition(&self) -> &[(f64, IndexedAtom)] {
        &self.composition
    }

    /// Density \[g/cm³\]
    pub fn density(&self) -> f64 {
        self.density
    }

    /// Number density \[atoms/Aa³\]
    pub fn number_density(&self) -> f64 {
        self.number_density
    }

    /// Material temperature \[K\], when known
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Global Debye temperature \[K\], when given
    pub fn debye_temp_global(&self) -> Option<f64> {
        self.debye_temp_global
    }

    /// Debye temperature for an atom role: per-element value, or the global
    pub fn debye_temp_by_index(&self, index: AtomIndex) -> Option<f64> {
        self.atoms
            .iter()
            .find(|a| a.atom.index == index)
            .and_then(|a| a.debye_temp)
            .or(self.debye_temp_global)
    }

    /// Saturated (free) scattering cross section \[barn\], when known
    pub fn xs_free(&self) -> Option<f64> {
        self.xs_free
    }

    /// 2200 m/s absorption cross section \[barn\], when known
    pub fn xs_absorption(&self) -> Option<f64> {
        self.xs_absorption
    }

    /// Custom data sections in file order
    pub fn custom_sections(&self) -> &[(String, Vec<Vec<String>>)] {
        &self.custom
    }

    /// Number of custom sections with the given name
    pub fn count_custom_sections(&self, name: &str) -> usize {
        self.custom.iter().filter(|(n, _)| n == name).count()
    }

    /// The i'th custom section with the given name
    pub fn custom_section(&self, name: &str, index: usize) -> Result<&Vec<Vec<String>>> {
        self.custom
            .iter()
            .filter(|(n, _)| n == name)
            .nth(index)
            .map(|(_, lines)| lines)
            .ok_or_else(|| Error::missing(format!("no custom section \"{name}\" (index {index})")))
    }

    /// Display label for an atom role
    ///
    /// When one element plays several roles the labels are suffixed, e.g.
    /// `Al-a` and `Al-b`.
    pub fn display_label(&self, index: AtomIndex) -> &str {
        &self.display_labels[index.0 as usize]
    }

    /// Atom data for a role index
    pub fn atom_data(&self, index: AtomIndex) -> &Arc<AtomData> {
        &self.atom_data[index.0 as usize]
    }

    /// d-spacing \[Aa\] of a Miller index from the structure info
    pub fn dspacing_from_hkl(&self, h: i32, k: i32, l: i32) -> Result<f64> {
        let structure = self
            .structure
            .as_ref()
            .ok_or_else(|| Error::missing("no structure info for d-spacing calculation"))?;
        if (h, k, l) == (0, 0, 0) {
            return Err(Error::bad("(0,0,0) has no d-spacing"));
        }
        let g = reciprocal_matrix(structure)? * Vector3::new(h as f64, k as f64, l as f64);
        Ok(1.0 / g.norm())
    }

    /// Multi-line human-readable summary of the material
    ///
    /// Intended for logs and interactive inspection; the layout is not a
    /// stable interface.
    pub fn dump(&self) -> String {
        use std::fmt::Write;
        let mut out = String::new();
        let _ = writeln!(out, "material summary (uid {}):", self.uid);
        let _ = writeln!(
            out,
            "  density       : {} ({} atoms/Aa3)",
            self.density.with_unit("g/cm3"),
            self.number_density.sci(5)
        );
        let _ = writeln!(out, "  temperature   : {}", self.temperature.with_unit_or_na("K"));
        let _ = writeln!(
            out,
            "  debye temp    : {}",
            self.debye_temp_global.with_unit_or_na("K")
        );
        let _ = writeln!(out, "  free xs       : {}", self.xs_free.with_unit_or_na("barn"));
        let _ = writeln!(
            out,
            "  absorption xs : {}",
            self.xs_absorption.with_unit_or_na("barn")
        );
        if let Some(s) = &self.structure {
            let _ = writeln!(
                out,
                "  cell          : {} x {} x {} ({} atoms, volume {})",
                s.lattice_a.with_unit("Aa"),
                s.lattice_b.with_unit("Aa"),
                s.lattice_c.with_unit("Aa"),
                s.n_atoms,
                s.volume.with_unit("Aa3")
            );
        }
        for (fraction, atom) in &self.composition {
            let _ = writeln!(
                out,
                "  component     : {} at {}",
                self.display_label(atom.index),
                (fraction * 100.0).with_unit("%")
            );
        }
        if let Some(hkl) = &self.hkl {
            let strongest = hkl.list.first().map(|f| f.fsquared).unwrap_or(0.0);
            let _ = writeln!(
                out,
                "  hkl families  : {} with d >= {}, strongest |F|^2 {}",
                hkl.list.len(),
                hkl.dlower.with_unit("Aa"),
                strongest.sci(5)
            );
        }
        let _ = writeln!(out, "  dynamics      : {} entries", self.dynamics.len());
        out
    }

    /// Search the expanded equivalent-(h,k,l) tables for a specific index
    pub fn find_expanded_hkl(&self, h: i16, k: i16, l: i16) -> Option<&crate::types::HklInfo> {
        let hkl = self.hkl.as_ref()?;
        hkl.list.iter().find(|family| {
            family.eqv_hkl.as_ref().is_some_and(|eqv| {
                eqv.iter()
                    .any(|e| *e == [h, k, l] || *e == [-h, -k, -l])
            })
        })
    }
}

/// Mutable staging area which seals into an [Info] by move
///
/// Factories populate the builder in any order and call
/// [build](InfoBuilder::build), which validates the combination, derives
/// the missing one of density/number density, sorts the HKL list by
/// d-spacing and the atoms by Z (both descending), assigns display labels
/// and the unique id, and hands back the sealed immutable object.
#[derive(Debug, Default)]
pub struct InfoBuilder {
    structure: Option<StructureInfo>,
    atoms: Vec<AtomInfo>,
    hkl: Option<HklList>,
    dynamics: Vec<DynamicInfo>,
    composition: Vec<(f64, IndexedAtom)>,
    density: Option<f64>,
    number_density: Option<f64>,
    temperature: Option<f64>,
    debye_temp_global: Option<f64>,
    xs_free: Option<f64>,
    xs_absorption: Option<f64>,
    custom: Vec<(String, Vec<Vec<String>>)>,
}

impl InfoBuilder {
    /// Fresh empty builder
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the crystal structure
    pub fn set_structure(&mut self, structure: StructureInfo) -> &mut Self {
        self.structure = Some(structure);
        self
    }

    /// Add one atom role
    pub fn add_atom(&mut self, atom: AtomInfo) -> &mut Self {
        self.atoms.push(atom);
        self
    }

    /// Set the HKL list
    pub fn set_hkl(&mut self, hkl: HklList) -> &mut Self {
        self.hkl = Some(hkl);
        self
    }

    /// Add one dynamics entry
    pub fn add_dynamics(&mut self, dynamics: DynamicInfo) -> &mut Self {
        self.dynamics.push(dynamics);
        self
    }

    /// Set the composition
    pub fn set_composition(&mut self, composition: Vec<(f64, IndexedAtom)>) -> &mut Self {
        self.composition = composition;
        self
    }

    /// Set the density \[g/cm³\]
    pub fn set_density(&mut self, density: f64) -> &mut Self {
        self.density = Some(density);
        self
    }

    /// Set the number density \[atoms/Aa³\]
    pub fn set_number_density(&mut self, number_density: f64) -> &mut Self {
        self.number_density = Some(number_density);
        self
    }

    /// Set the material temperature \[K\]
    pub fn set_temperature(&mut self, temperature: f64) -> &mut Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the global Debye temperature \[K\]
    pub fn set_debye_temp_global(&mut self, debye_temp: f64) -> &mut Self {
        self.debye_temp_global = Some(debye_temp);
        self
    }

    /// Set the saturated scattering cross section \[barn\]
    pub fn set_xs_free(&mut self, xs: f64) -> &mut Self {
        self.xs_free = Some(xs);
        self
    }

    /// Set the 2200 m/s absorption cross section \[barn\]
    pub fn set_xs_absorption(&mut self, xs: f64) -> &mut Self {
        self.xs_absorption = Some(xs);
        self
    }

    /// Append a custom data section
    pub fn add_custom_section(&mut self, name: String, lines: Vec<Vec<String>>) -> &mut Self {
        self.custom.push((name, lines));
        self
    }

    /// Validate, derive, sort, and seal
    pub fn build(self) -> Result<Arc<Info>> {
        let mut atoms = self.atoms;
        let mut hkl = self.hkl;

        if let Some(s) = &self.structure {
            if !(s.lattice_a > 0.0 && s.lattice_b > 0.0 && s.lattice_c > 0.0) {
                return Err(Error::bad("lattice lengths must be positive"));
            }
            let angle_ok = |x: f64| x > 0.0 && x < 180.0;
            if !(angle_ok(s.alpha) && angle_ok(s.beta) && angle_ok(s.gamma)) {
                return Err(Error::bad("cell angles must be inside (0,180) degrees"));
            }
            let volume = crate::hkl::cell_volume(s);
            if (volume - s.volume).abs() > 1e-6 * volume {
                return Err(Error::bad(format!(
                    "cell volume {} inconsistent with lengths/angles (expected {volume})",
                    s.volume
                )));
            }
        }

        if self.composition.is_empty() {
            return Err(Error::missing("material has no composition".to_string()));
        }
        let frac_sum: f64 = self.composition.iter().map(|(f, _)| f).sum();
        if (frac_sum - 1.0).abs() > 1e-9 {
            return Err(Error::bad(format!(
                "composition fractions sum to {frac_sum}, not 1"
            )));
        }
        if let Some(t) = self.temperature {
            if !(t > 0.0) {
                return Err(Error::bad("temperature must be positive"));
            }
        }
        for (index, ai) in atoms.iter().enumerate() {
            if !ai.positions.is_empty() && ai.positions.len() != ai.count as usize {
                return Err(Error::bad(format!(
                    "atom role {index} has {} positions for count {}",
                    ai.positions.len(),
                    ai.count
                )));
            }
        }

        // derive the missing one of density / number density from the
        // molar-mass weighted composition
        let avg_mass: f64 = self
            .composition
            .iter()
            .map(|(f, a)| f * a.data.mass_amu())
            .sum();
        let (density, number_density) = match (self.density, self.number_density) {
            (Some(d), Some(nd)) => (d, nd),
            (Some(d), None) => (d, d / (avg_mass * AMU_PER_AA3_TO_G_PER_CM3)),
            (None, Some(nd)) => (nd * avg_mass * AMU_PER_AA3_TO_G_PER_CM3, nd),
            (None, None) => {
                return Err(Error::missing(
                    "neither density nor number density available".to_string(),
                ))
            }
        };
        if !(density > 0.0) || !(number_density > 0.0) {
            return Err(Error::bad("densities must be positive"));
        }

        // sort atoms by Z descending, HKL by d-spacing descending
        atoms.sort_by(|a, b| b.atom.data.z().cmp(&a.atom.data.z()));
        if let Some(hkl) = &mut hkl {
            hkl.list.sort_by(|a, b| {
                b.dspacing
                    .partial_cmp(&a.dspacing)
                    .expect("d-spacings are finite")
            });
        }

        // display labels by role index; same-element roles get suffixes
        let mut indexed: Vec<&IndexedAtom> = self.composition.iter().map(|(_, a)| a).collect();
        indexed.sort_by_key(|a| a.index);
        for (expected, atom) in indexed.iter().enumerate() {
            if atom.index.0 as usize != expected {
                return Err(Error::bad(
                    "atom indices must be dense and unique within the material".to_string(),
                ));
            }
        }
        let mut display_labels = Vec::with_capacity(indexed.len());
        let mut atom_data = Vec::with_capacity(indexed.len());
        for atom in &indexed {
            let symbol = atom.data.symbol();
            let same_symbol: Vec<u32> = indexed
                .iter()
                .filter(|o| o.data.symbol() == symbol)
                .map(|o| o.index.0)
                .collect();
            let label = if same_symbol.len() == 1 {
                symbol
            } else {
                let role = same_symbol
                    .iter()
                    .position(|i| *i == atom.index.0)
                    .expect("atom is in its own symbol group");
                // a, b, c... suffixes per role of the same element
                let suffix = (b'a' + role as u8) as char;
                format!("{symbol}-{suffix}")
            };
            display_labels.push(label);
            atom_data.push(atom.data.clone());
        }

        Ok(Arc::new(Info {
            uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
            structure: self.structure,
            atoms,
            hkl,
            dynamics: self.dynamics,
            composition: self.composition,
            density,
            number_density,
            temperature: self.temperature,
            debye_temp_global: self.debye_temp_global,
            xs_free: self.xs_free,
            xs_absorption: self.xs_absorption,
            custom: self.custom,
            display_labels,
            atom_data,
        }))
    }
}
