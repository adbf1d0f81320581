//! Atom database with built-in defaults and user overrides

// crate modules
use crate::atom::{AtomData, IsotopeFraction};
use crate::error::{Error, Result};
use crate::table;

// external crates
use log::debug;

// nxtal modules
use nxtal_utils::StringExt;

// standard library
use std::collections::HashMap;
use std::sync::Arc;

/// Check that a string is a valid element or isotope designation
///
/// Element symbols are one capital ASCII letter followed by at most two lower
/// case letters. An isotope appends the mass number, e.g. `B10`. The alias
/// `D` for deuterium is accepted wherever isotopes are.
///
/// ```rust
/// # use nxtal_atomdb::validate_element_name;
/// assert!(validate_element_name("Al", false).is_ok());
/// assert!(validate_element_name("B10", true).is_ok());
/// assert!(validate_element_name("B10", false).is_err());
/// assert!(validate_element_name("al", true).is_err());
/// ```
pub fn validate_element_name(name: &str, allow_isotopes: bool) -> Result<()> {
    let (symbol, digits) = name.split_trailing_digits();

    if !digits.is_empty() {
        if !allow_isotopes {
            return Err(Error::IsotopeNotAllowed(name.to_string()));
        }
        if digits.starts_with('0') || digits.len() > 3 {
            return Err(Error::BadElementName(name.to_string()));
        }
    }

    // "D" is the lone single-letter alias carrying its own mass number
    if symbol == "D" && digits.is_empty() {
        return if allow_isotopes {
            Ok(())
        } else {
            Err(Error::IsotopeNotAllowed(name.to_string()))
        };
    }

    let mut chars = symbol.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            symbol.len() <= 3 && chars.all(|c| c.is_ascii_lowercase())
        }
        _ => false,
    };
    if !valid {
        return Err(Error::BadElementName(name.to_string()));
    }
    Ok(())
}

/// Validate an atom data line without applying it
///
/// A line is either the single keyword `nodefaults` or
/// `<name> <mass>u <b_coh>fm <sigma_inc>b <sigma_abs>b`.
pub fn validate_atomdb_line(parts: &[String]) -> Result<()> {
    if parts.len() == 1 && parts[0] == "nodefaults" {
        return Ok(());
    }
    parse_data_line(parts).map(|_| ())
}

fn bad_line(parts: &[String], reason: impl Into<String>) -> Error {
    Error::BadDataLine {
        line: parts.join(" "),
        reason: reason.into(),
    }
}

fn parse_suffixed(parts: &[String], token: &str, suffix: &str) -> Result<f64> {
    let raw = token.strip_suffix(suffix).ok_or_else(|| {
        bad_line(parts, format!("expected \"{token}\" to end in unit \"{suffix}\""))
    })?;
    let value: f64 = raw
        .parse()
        .map_err(|_| bad_line(parts, format!("could not decode number \"{raw}\"")))?;
    if !value.is_finite() {
        return Err(bad_line(parts, format!("non-finite value \"{raw}\"")));
    }
    Ok(value)
}

fn parse_data_line(parts: &[String]) -> Result<(String, AtomData)> {
    if parts.len() != 5 {
        return Err(bad_line(
            parts,
            "expected 5 entries: name, mass (u), coherent scattering length (fm), \
             incoherent cross section (b), absorption cross section (b)",
        ));
    }
    let name = &parts[0];
    validate_element_name(name, true)?;

    let mass = parse_suffixed(parts, &parts[1], "u")?;
    let b_coh = parse_suffixed(parts, &parts[2], "fm")?;
    let sigma_inc = parse_suffixed(parts, &parts[3], "b")?;
    let sigma_abs = parse_suffixed(parts, &parts[4], "b")?;

    let (_, digits) = name.split_trailing_digits();
    let a: u32 = if name == "D" {
        2
    } else {
        digits.parse().unwrap_or(0)
    };

    // Z is taken from the built-in symbol table when known, otherwise the
    // entry is treated as a synthetic component
    let (symbol, _) = name.split_trailing_digits();
    let symbol = if name == "D" { "H" } else { symbol };
    let z = table::NATURAL_ELEMENTS
        .iter()
        .find(|(sym, ..)| *sym == symbol)
        .map(|(_, z, ..)| *z)
        .unwrap_or(0);

    let atom = AtomData::new(b_coh, sigma_inc, sigma_abs, mass, z, a)?;
    Ok((unalias(name), atom))
}

/// Resolve the deuterium/tritium shorthands to isotope markers
fn unalias(name: &str) -> String {
    match name {
        "D" => "H2".to_string(),
        "T" => "H3".to_string(),
        other => other.to_string(),
    }
}

/// Database mapping atom names to [AtomData]
///
/// Resolution order for a material is: built-in defaults, then data-file
/// override lines, then configuration override lines. A leading `nodefaults`
/// line discards the built-ins so a file is in full control of its data.
///
/// ```rust
/// # use nxtal_atomdb::AtomDb;
/// let db = AtomDb::with_defaults();
/// let al = db.lookup("Al").unwrap();
/// assert_eq!(al.z(), 13);
/// assert!(db.lookup("Xx").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct AtomDb {
    entries: HashMap<String, Arc<AtomData>>,
    defaults_enabled: bool,
}

impl AtomDb {
    /// Database pre-populated with the built-in table
    pub fn with_defaults() -> Self {
        let mut entries: HashMap<String, Arc<AtomData>> = HashMap::new();

        let mut isotopes: HashMap<&str, Arc<AtomData>> = HashMap::new();
        for (sym, z, a, mass, b_coh, inc, abs) in table::ISOTOPES {
            let atom = Arc::new(
                AtomData::new(*b_coh, *inc, *abs, *mass, *z, *a)
                    .expect("static isotope table entries are valid"),
            );
            isotopes.insert(sym, atom.clone());
            entries.insert(sym.to_string(), atom);
        }

        for (sym, z, mass, b_coh, inc, abs) in table::NATURAL_ELEMENTS {
            let atom = AtomData::new(*b_coh, *inc, *abs, *mass, *z, 0)
                .expect("static element table entries are valid");
            let atom = match table::NATURAL_ABUNDANCES.iter().find(|(s, _)| s == sym) {
                Some((_, breakdown)) => {
                    let components = breakdown
                        .iter()
                        .map(|(iso, fraction)| IsotopeFraction {
                            fraction: *fraction,
                            atom: isotopes[iso].clone(),
                        })
                        .collect();
                    atom.with_components(components)
                        .expect("static abundance tables are consistent")
                }
                None => atom,
            };
            entries.insert(sym.to_string(), Arc::new(atom));
        }

        Self {
            entries,
            defaults_enabled: true,
        }
    }

    /// Empty database, as after a `nodefaults` line
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            defaults_enabled: false,
        }
    }

    /// Build a database from override lines
    ///
    /// Starts from the defaults unless the first line is `nodefaults`.
    pub fn from_lines(lines: &[Vec<String>]) -> Result<Self> {
        let nodefaults = lines
            .first()
            .is_some_and(|line| line.len() == 1 && line[0] == "nodefaults");
        let mut db = if nodefaults {
            Self::empty()
        } else {
            Self::with_defaults()
        };
        let data_lines = if nodefaults { &lines[1..] } else { lines };
        db.apply_lines(data_lines)?;
        Ok(db)
    }

    /// Apply override lines on top of the current contents
    ///
    /// A `nodefaults` entry is rejected here; it is only meaningful as the
    /// first line of a fresh override block.
    pub fn apply_lines(&mut self, lines: &[Vec<String>]) -> Result<()> {
        for parts in lines {
            if parts.len() == 1 && parts[0] == "nodefaults" {
                return Err(bad_line(
                    parts,
                    "\"nodefaults\" must be the first line of an override block",
                ));
            }
            let (name, atom) = parse_data_line(parts)?;
            if self.entries.contains_key(&name) {
                debug!("atomdb override replaces data for {name}");
            }
            self.entries.insert(name, Arc::new(atom));
        }
        Ok(())
    }

    /// Look up an atom by element symbol or isotope marker
    ///
    /// Aliases (`D`, `T`) resolve to their isotope entries.
    pub fn lookup(&self, name: &str) -> Option<Arc<AtomData>> {
        self.entries.get(&unalias(name)).cloned()
    }

    /// Like [AtomDb::lookup] but failing with a typed error
    pub fn require(&self, name: &str) -> Result<Arc<AtomData>> {
        self.lookup(name)
            .ok_or_else(|| Error::UnknownAtom(name.to_string()))
    }

    /// Whether the built-in table is part of this database
    pub fn has_defaults(&self) -> bool {
        self.defaults_enabled
    }
}

impl Default for AtomDb {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn defaults_cover_common_materials() {
        let db = AtomDb::with_defaults();
        for name in ["H", "C", "Al", "Fe", "Ni", "Pb", "H2", "B10"] {
            assert!(db.lookup(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn deuterium_alias() {
        let db = AtomDb::with_defaults();
        let d = db.lookup("D").unwrap();
        assert_eq!(d.a(), 2);
        assert_eq!(d.z(), 1);
    }

    #[test]
    fn natural_breakdown_present() {
        let db = AtomDb::with_defaults();
        let boron = db.lookup("B").unwrap();
        assert_eq!(boron.components().len(), 2);
        let total: f64 = boron.components().iter().map(|c| c.fraction).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn override_line_replaces_entry() {
        let mut db = AtomDb::with_defaults();
        db.apply_lines(&[line("Al 26.98u 3.5fm 0.01b 0.3b")]).unwrap();
        let al = db.lookup("Al").unwrap();
        assert!((al.coherent_scat_length() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn nodefaults_empties_database() {
        let db = AtomDb::from_lines(&[
            line("nodefaults"),
            line("X 10.0u 5.0fm 0.1b 1.0b"),
        ])
        .unwrap();
        assert!(db.lookup("Al").is_none());
        assert!(db.lookup("X").is_some());
    }

    #[test]
    fn nodefaults_must_come_first() {
        let result = AtomDb::from_lines(&[
            line("X 10.0u 5.0fm 0.1b 1.0b"),
            line("nodefaults"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_lines() {
        let mut db = AtomDb::with_defaults();
        assert!(db.apply_lines(&[line("Al 26.98 3.5fm 0.01b 0.3b")]).is_err());
        assert!(db.apply_lines(&[line("Al 26.98u 3.5fm 0.01b")]).is_err());
        assert!(db.apply_lines(&[line("al 26.98u 3.5fm 0.01b 0.3b")]).is_err());
    }
}
