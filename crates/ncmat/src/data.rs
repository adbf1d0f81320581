//! The raw data record produced by the NCMAT parser

// crate modules
use crate::error::{Error, Result};

// standard library
use std::collections::BTreeMap;

/// Unit of a parsed `@DENSITY` value
///
/// `g_per_cm3` input is converted to `kg_per_m3` at parse time, so only two
/// units survive into the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityUnit {
    /// Atoms per cubic angstrom
    AtomsPerAa3,
    /// Kilograms per cubic metre
    KgPerM3,
}

/// Dynamics type of a `@DYNINFO` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynType {
    /// `type` key not seen yet
    #[default]
    Undefined,
    /// No inelastic scattering
    Sterile,
    /// Ideal-gas kernel from temperature and mass
    FreeGas,
    /// Explicit S(α,β) table
    ScatKnl,
    /// Tabulated phonon density of states
    Vdos,
    /// Idealised quadratic density of states from a Debye temperature
    VdosDebye,
}

/// One `@DYNINFO` section: the common keys plus free-form numeric fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynInfoData {
    /// Element name (unaliased, so `D` arrives as `H2`)
    pub element: String,
    /// Fraction in (0,1]; negative while unset
    pub fraction: f64,
    /// The declared dynamics type
    pub dtype: DynType,
    /// Keyword fields (`alphagrid`, `sab`, `vdos_egrid`, ...)
    pub fields: BTreeMap<String, Vec<f64>>,
}

impl DynInfoData {
    /// Field accessor for readability at call sites
    pub fn field(&self, name: &str) -> Option<&[f64]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Section-level validation, with messages free of line context
    pub(crate) fn validate(&self) -> core::result::Result<(), String> {
        if self.element.is_empty() {
            return Err("missing \"element\" keyword in @DYNINFO section".to_string());
        }
        if self.fraction < 0.0 {
            return Err("missing \"fraction\" keyword in @DYNINFO section".to_string());
        }
        if self.dtype == DynType::Undefined {
            return Err("missing \"type\" keyword in @DYNINFO section".to_string());
        }

        let allowed: &[&str] = match self.dtype {
            DynType::Undefined => unreachable!(),
            DynType::Sterile | DynType::FreeGas | DynType::VdosDebye => &[],
            DynType::Vdos => &["vdos_egrid", "vdos_density", "egrid"],
            DynType::ScatKnl => &["alphagrid", "betagrid", "sab", "sab_scaled", "egrid"],
        };
        for key in self.fields.keys() {
            if !allowed.contains(&key.as_str()) {
                return Err(format!(
                    "keyword \"{key}\" is not supported for @DYNINFO type \"{}\"",
                    self.type_name()
                ));
            }
        }

        match self.dtype {
            DynType::Vdos => self.validate_vdos(),
            DynType::ScatKnl => self.validate_scatknl(),
            _ => Ok(()),
        }?;

        if let Some(egrid) = self.field("egrid") {
            validate_requested_egrid(egrid)?;
        }
        Ok(())
    }

    fn validate_vdos(&self) -> core::result::Result<(), String> {
        let egrid = self
            .field("vdos_egrid")
            .ok_or("missing \"vdos_egrid\" keyword for @DYNINFO type \"vdos\"")?;
        let density = self
            .field("vdos_density")
            .ok_or("missing \"vdos_density\" keyword for @DYNINFO type \"vdos\"")?;

        match egrid.len() {
            2 => {
                if !(egrid[0] >= 0.0 && egrid[0] < egrid[1]) {
                    return Err("two-value \"vdos_egrid\" must be an increasing [emin,emax] pair".into());
                }
                if density.len() < 5 {
                    return Err("\"vdos_density\" needs at least 5 points for an [emin,emax] grid".into());
                }
            }
            n if n >= 4 => {
                if !is_strictly_increasing(egrid) {
                    return Err("\"vdos_egrid\" values must be strictly increasing".into());
                }
                if density.len() != n {
                    return Err(format!(
                        "\"vdos_density\" has {} entries but \"vdos_egrid\" has {n}",
                        density.len()
                    ));
                }
            }
            _ => return Err("\"vdos_egrid\" must have 2 values or a full grid of at least 4".into()),
        }
        if !density.iter().any(|d| *d > 0.0) {
            return Err("\"vdos_density\" must contain at least one positive value".into());
        }
        Ok(())
    }

    fn validate_scatknl(&self) -> core::result::Result<(), String> {
        let alpha = self
            .field("alphagrid")
            .ok_or("missing \"alphagrid\" keyword for @DYNINFO type \"scatknl\"")?;
        let beta = self
            .field("betagrid")
            .ok_or("missing \"betagrid\" keyword for @DYNINFO type \"scatknl\"")?;

        if alpha.len() < 2 || !is_strictly_increasing(alpha) || alpha[0] < 0.0 {
            return Err("\"alphagrid\" must be a strictly increasing non-negative grid".into());
        }
        if beta.len() < 2 || !is_strictly_increasing(beta) {
            return Err("\"betagrid\" must be a strictly increasing grid".into());
        }

        let sab = self.field("sab");
        let sab_scaled = self.field("sab_scaled");
        let table = match (sab, sab_scaled) {
            (Some(t), None) | (None, Some(t)) => t,
            (Some(_), Some(_)) => {
                return Err("\"sab\" and \"sab_scaled\" are mutually exclusive".into())
            }
            (None, None) => {
                return Err("@DYNINFO type \"scatknl\" needs one of \"sab\" or \"sab_scaled\"".into())
            }
        };
        if table.len() != alpha.len() * beta.len() {
            return Err(format!(
                "kernel table has {} entries, expected |alphagrid|*|betagrid| = {}",
                table.len(),
                alpha.len() * beta.len()
            ));
        }
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        match self.dtype {
            DynType::Undefined => "undefined",
            DynType::Sterile => "sterile",
            DynType::FreeGas => "freegas",
            DynType::ScatKnl => "scatknl",
            DynType::Vdos => "vdos",
            DynType::VdosDebye => "vdosdebye",
        }
    }
}

fn is_strictly_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

// A caller-requested energy grid: [emin,emax,npts] (zeros meaning "choose")
// or a proper grid of at least 4 points
fn validate_requested_egrid(egrid: &[f64]) -> core::result::Result<(), String> {
    match egrid.len() {
        3 => Ok(()),
        n if n >= 4 => {
            if is_strictly_increasing(egrid) {
                Ok(())
            } else {
                Err("\"egrid\" values must be strictly increasing".into())
            }
        }
        _ => Err("\"egrid\" must have 3 entries ([emin,emax,npts]) or a full grid".into()),
    }
}

/// `@CELL` contents: three lattice lengths \[Aa\] and three angles \[deg\]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CellData {
    /// a, b, c
    pub lengths: [f64; 3],
    /// alpha, beta, gamma
    pub angles: [f64; 3],
}

/// The raw result of parsing one NCMAT text source
///
/// Field contents mirror the file sections; nothing is derived here. The
/// record compares equal when the parsed content is identical, which is what
/// the re-serialization round trip in [crate::write_ncmat] relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct NcmatData {
    /// Format version from the first line (1, 2 or 3)
    pub version: u32,
    /// Stream type and name, for error messages
    pub source_descr: String,
    /// `@CELL` section
    pub cell: Option<CellData>,
    /// `@ATOMPOSITIONS` entries in file order
    pub atompos: Vec<(String, [f64; 3])>,
    /// `@SPACEGROUP` number
    pub spacegroup: Option<u32>,
    /// Global `@DEBYETEMPERATURE` value \[K\]
    pub debye_global: Option<f64>,
    /// Per-element `@DEBYETEMPERATURE` values \[K\]
    pub debye_per_element: Vec<(String, f64)>,
    /// `@DENSITY` value and unit
    pub density: Option<(f64, DensityUnit)>,
    /// `@DYNINFO` sections in file order
    pub dyninfos: Vec<DynInfoData>,
    /// Raw `@ATOMDB` lines
    pub atomdb_lines: Vec<Vec<String>>,
    /// `@CUSTOM_<NAME>` sections: name (without prefix) and word-lines
    pub custom_sections: Vec<(String, Vec<Vec<String>>)>,
}

impl NcmatData {
    pub(crate) fn new(source_descr: String) -> Self {
        Self {
            version: 0,
            source_descr,
            cell: None,
            atompos: Vec::new(),
            spacegroup: None,
            debye_global: None,
            debye_per_element: Vec::new(),
            density: None,
            dyninfos: Vec::new(),
            atomdb_lines: Vec::new(),
            custom_sections: Vec::new(),
        }
    }

    /// Whether the record describes a crystal unit cell
    pub fn has_unit_cell(&self) -> bool {
        self.cell.is_some() || !self.atompos.is_empty()
    }

    fn err(&self, reason: impl Into<String>) -> Error {
        Error::bad_data(&self.source_descr, reason)
    }

    pub(crate) fn validate_cell(&self) -> Result<()> {
        let cell = match &self.cell {
            Some(cell) => cell,
            None => return Ok(()),
        };
        if cell.lengths.iter().any(|l| !(*l > 0.0) || !l.is_finite()) {
            return Err(self.err("cell lengths must be positive"));
        }
        if cell.angles.iter().any(|a| !(*a > 0.0 && *a < 180.0)) {
            return Err(self.err("cell angles must be strictly inside (0,180) degrees"));
        }
        Ok(())
    }

    pub(crate) fn validate_atompos(&self) -> Result<()> {
        for (name, pos) in &self.atompos {
            if pos.iter().any(|c| !c.is_finite() || *c < 0.0 || *c > 1.0) {
                return Err(self.err(format!(
                    "fractional coordinates for element \"{name}\" must be inside [0,1]"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn validate_spacegroup(&self) -> Result<()> {
        if let Some(sg) = self.spacegroup {
            if !(1..=230).contains(&sg) {
                return Err(self.err(format!("spacegroup number {sg} outside range [1,230]")));
            }
        }
        Ok(())
    }

    pub(crate) fn validate_debye(&self) -> Result<()> {
        if self.debye_global.is_some() && !self.debye_per_element.is_empty() {
            return Err(self.err(
                "@DEBYETEMPERATURE must be either one global value or per-element \
                 lines, not a mixture",
            ));
        }
        if let Some(t) = self.debye_global {
            if !(t > 0.0) {
                return Err(self.err("global Debye temperature must be positive"));
            }
        }
        for (name, t) in &self.debye_per_element {
            if !(*t > 0.0) {
                return Err(self.err(format!(
                    "Debye temperature for element \"{name}\" must be positive"
                )));
            }
        }
        let mut seen: Vec<&str> = Vec::new();
        for (name, _) in &self.debye_per_element {
            if seen.contains(&name.as_str()) {
                return Err(self.err(format!(
                    "element \"{name}\" repeated in @DEBYETEMPERATURE section"
                )));
            }
            seen.push(name);
        }
        Ok(())
    }

    pub(crate) fn validate_density(&self) -> Result<()> {
        if let Some((value, _)) = self.density {
            if !(value > 0.0) || !value.is_finite() {
                return Err(self.err("density must be a positive finite number"));
            }
        }
        Ok(())
    }

    /// Whole-record validation, run after the last section closes
    pub fn validate(&self) -> Result<()> {
        self.validate_cell()?;
        self.validate_atompos()?;
        self.validate_spacegroup()?;
        self.validate_debye()?;
        self.validate_density()?;

        // structural cross-section consistency
        if self.cell.is_some() != !self.atompos.is_empty() {
            return Err(self.err("@CELL and @ATOMPOSITIONS sections must appear together"));
        }
        if self.spacegroup.is_some() && self.cell.is_none() {
            return Err(self.err("@SPACEGROUP requires a @CELL section"));
        }
        if self.density.is_some() && self.has_unit_cell() {
            return Err(self.err("@DENSITY is only for materials without a unit cell"));
        }

        if self.version == 1 {
            if !self.has_unit_cell() {
                return Err(self.err("NCMAT v1 files require @CELL and @ATOMPOSITIONS sections"));
            }
            if self.debye_global.is_none() && self.debye_per_element.is_empty() {
                return Err(self.err("NCMAT v1 files require a @DEBYETEMPERATURE section"));
            }
        }
        if !self.has_unit_cell() {
            if self.dyninfos.is_empty() {
                return Err(self.err(
                    "non-crystalline materials need at least one @DYNINFO section",
                ));
            }
            if self.density.is_none() {
                return Err(self.err("non-crystalline materials need a @DENSITY section"));
            }
        }

        // @DYNINFO sections must cover each element exactly once and their
        // fractions must form a partition
        if !self.dyninfos.is_empty() {
            let mut seen: Vec<&str> = Vec::new();
            for di in &self.dyninfos {
                if seen.contains(&di.element.as_str()) {
                    return Err(self.err(format!(
                        "element \"{}\" covered by more than one @DYNINFO section",
                        di.element
                    )));
                }
                seen.push(&di.element);
            }
            let total: f64 = self.dyninfos.iter().map(|di| di.fraction).sum();
            if (total - 1.0).abs() > 1e-9 {
                return Err(self.err(format!(
                    "fractions in @DYNINFO sections must sum to 1 (got {total})"
                )));
            }
            if self.has_unit_cell() {
                for di in &self.dyninfos {
                    if !self.atompos.iter().any(|(name, _)| *name == di.element) {
                        return Err(self.err(format!(
                            "@DYNINFO element \"{}\" does not appear in @ATOMPOSITIONS",
                            di.element
                        )));
                    }
                }
            }
        }

        // per-element Debye entries must refer to elements of the material
        for (name, _) in &self.debye_per_element {
            let known = self.atompos.iter().any(|(n, _)| n == name)
                || self.dyninfos.iter().any(|di| di.element == *name);
            if !known {
                return Err(self.err(format!(
                    "@DEBYETEMPERATURE entry for \"{name}\" does not match any element \
                     of the material"
                )));
            }
        }

        // @ATOMDB lines: "nodefaults" only as the very first line
        for (i, parts) in self.atomdb_lines.iter().enumerate() {
            if parts.len() == 1 && parts[0] == "nodefaults" && i > 0 {
                return Err(self.err("\"nodefaults\" must be the first @ATOMDB line"));
            }
            nxtal_atomdb::validate_atomdb_line(parts)
                .map_err(|e| self.err(format!("invalid @ATOMDB line: {e}")))?;
        }

        Ok(())
    }

    /// Replace `D`/`T` aliases with their isotope markers everywhere
    pub(crate) fn unalias_element_names(&mut self) {
        let unalias = |name: &mut String| {
            if name == "D" {
                *name = "H2".to_string();
            } else if name == "T" {
                *name = "H3".to_string();
            }
        };
        for (name, _) in &mut self.atompos {
            unalias(name);
        }
        for (name, _) in &mut self.debye_per_element {
            unalias(name);
        }
        for di in &mut self.dyninfos {
            unalias(&mut di.element);
        }
    }
}
