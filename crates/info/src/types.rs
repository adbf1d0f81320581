//! Plain data types of the material model

// nxtal modules
use nxtal_atomdb::AtomData;

// standard library
use std::sync::Arc;

/// Index of an atom role, scoped to one [Info](crate::Info)
///
/// The same fundamental atom can play several roles in a material (for
/// instance the same element with different displacements on different
/// positions in the unit cell), so roles are addressed by index rather
/// than by element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomIndex(pub u32);

/// Atom data together with its role index
#[derive(Debug, Clone)]
pub struct IndexedAtom {
    /// Role index, valid only within the owning [Info](crate::Info)
    pub index: AtomIndex,
    /// The underlying atom data
    pub data: Arc<AtomData>,
}

/// Crystal structure description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureInfo {
    /// Spacegroup number 1..=230 when known
    pub spacegroup: Option<u32>,
    /// Lattice length a \[Aa\]
    pub lattice_a: f64,
    /// Lattice length b \[Aa\]
    pub lattice_b: f64,
    /// Lattice length c \[Aa\]
    pub lattice_c: f64,
    /// Cell angle α \[deg\]
    pub alpha: f64,
    /// Cell angle β \[deg\]
    pub beta: f64,
    /// Cell angle γ \[deg\]
    pub gamma: f64,
    /// Cell volume \[Aa³\], consistent with lengths and angles
    pub volume: f64,
    /// Number of atoms per unit cell
    pub n_atoms: u32,
}

/// One atom role of the material
#[derive(Debug, Clone)]
pub struct AtomInfo {
    /// The atom and its role index
    pub atom: IndexedAtom,
    /// Multiplicity in the unit cell
    pub count: u32,
    /// Per-element Debye temperature \[K\] when available
    pub debye_temp: Option<f64>,
    /// Fractional unit-cell positions; empty or of length `count`
    pub positions: Vec<[f64; 3]>,
    /// Mean-square displacement \[Aa²\] projected on a linear axis
    pub msd: Option<f64>,
}

/// One family of lattice planes
///
/// When the demi-normals are known, only one of each ±n pair is stored and
/// `multiplicity == 2·demi_normals.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct HklInfo {
    /// Interplanar spacing \[Aa\]
    pub dspacing: f64,
    /// Squared structure factor \[barn\]
    pub fsquared: f64,
    /// Representative Miller index h
    pub h: i32,
    /// Representative Miller index k
    pub k: i32,
    /// Representative Miller index l
    pub l: i32,
    /// Number of symmetry-equivalent planes (both normal signs counted)
    pub multiplicity: u32,
    /// Unit normals, one per ±n pair; may be empty
    pub demi_normals: Vec<[f64; 3]>,
    /// Miller indices matching the demi-normals, when expansion was asked
    pub eqv_hkl: Option<Vec<[i16; 3]>>,
}

/// The HKL reflection list with its enumeration window
#[derive(Debug, Clone, PartialEq)]
pub struct HklList {
    /// Lower d-spacing bound \[Aa\] of the enumeration
    pub dlower: f64,
    /// Upper d-spacing bound \[Aa\] of the enumeration
    pub dupper: f64,
    /// Families sorted by d-spacing, largest first
    pub list: Vec<HklInfo>,
}

impl HklList {
    /// The largest d-spacing \[Aa\], or +∞ when the list is empty
    pub fn dmax(&self) -> f64 {
        self.list.first().map_or(f64::INFINITY, |h| h.dspacing)
    }

    /// The smallest d-spacing \[Aa\], or +∞ when the list is empty
    pub fn dmin(&self) -> f64 {
        self.list.last().map_or(f64::INFINITY, |h| h.dspacing)
    }
}
