//! The typed parameter table of the configuration grammar

// crate modules
use crate::error::{Error, Result};
use crate::orient::{parse_vector, OrientDir};

// nxtal modules
use nxtal_utils::{ARCMIN, ARCSEC, DEG};

// Characters never allowed in values, to reduce escaping worries in any
// context a configuration string may be embedded in
pub(crate) const FORBIDDEN_CHARS: &str = "\"'|><(){}[]";

/// The recognized configuration parameters
///
/// Variant order is alphabetical by parameter name and defines both the
/// canonical-string order and the cache-signature order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types, missing_docs)]
pub enum Param {
    absnfactory,
    atomdb,
    coh_elas,
    dcutoff,
    dcutoffup,
    dir1,
    dir2,
    dirtol,
    incoh_elas,
    inelas,
    infofactory,
    lcaxis,
    lcmode,
    mos,
    mosprec,
    overridefileext,
    packfact,
    scatfactory,
    sccutoff,
    temp,
    vdoslux,
}

/// Unit family accepted by a double-valued parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit {
    None,
    Angle,
    Temp,
    Length,
}

/// Value kind of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Dbl(Unit),
    Int,
    Bool,
    Str,
    Orient,
    Vector,
    AtomDb,
}

impl Param {
    /// All parameters in canonical (alphabetical) order
    pub const ALL: [Param; 21] = [
        Param::absnfactory,
        Param::atomdb,
        Param::coh_elas,
        Param::dcutoff,
        Param::dcutoffup,
        Param::dir1,
        Param::dir2,
        Param::dirtol,
        Param::incoh_elas,
        Param::inelas,
        Param::infofactory,
        Param::lcaxis,
        Param::lcmode,
        Param::mos,
        Param::mosprec,
        Param::overridefileext,
        Param::packfact,
        Param::scatfactory,
        Param::sccutoff,
        Param::temp,
        Param::vdoslux,
    ];

    /// The parameter name as written in configuration strings
    pub fn name(&self) -> &'static str {
        match self {
            Param::absnfactory => "absnfactory",
            Param::atomdb => "atomdb",
            Param::coh_elas => "coh_elas",
            Param::dcutoff => "dcutoff",
            Param::dcutoffup => "dcutoffup",
            Param::dir1 => "dir1",
            Param::dir2 => "dir2",
            Param::dirtol => "dirtol",
            Param::incoh_elas => "incoh_elas",
            Param::inelas => "inelas",
            Param::infofactory => "infofactory",
            Param::lcaxis => "lcaxis",
            Param::lcmode => "lcmode",
            Param::mos => "mos",
            Param::mosprec => "mosprec",
            Param::overridefileext => "overridefileext",
            Param::packfact => "packfact",
            Param::scatfactory => "scatfactory",
            Param::sccutoff => "sccutoff",
            Param::temp => "temp",
            Param::vdoslux => "vdoslux",
        }
    }

    /// Look up a parameter by name
    pub fn from_name(name: &str) -> Option<Param> {
        Param::ALL.iter().copied().find(|p| p.name() == name)
    }

    pub(crate) fn kind(&self) -> Kind {
        match self {
            Param::absnfactory
            | Param::inelas
            | Param::infofactory
            | Param::overridefileext
            | Param::scatfactory => Kind::Str,
            Param::atomdb => Kind::AtomDb,
            Param::coh_elas | Param::incoh_elas => Kind::Bool,
            Param::dcutoff | Param::dcutoffup => Kind::Dbl(Unit::Length),
            Param::dir1 | Param::dir2 => Kind::Orient,
            Param::dirtol | Param::mos => Kind::Dbl(Unit::Angle),
            Param::lcaxis => Kind::Vector,
            Param::lcmode | Param::vdoslux => Kind::Int,
            Param::mosprec | Param::packfact | Param::sccutoff => Kind::Dbl(Unit::None),
            Param::temp => Kind::Dbl(Unit::Temp),
        }
    }
}

/// A parsed parameter value
///
/// Double and vector values remember their original spelling so that
/// configuration strings can be reproduced losslessly, while cache
/// signatures always use the numeric representation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Dbl { value: f64, orig: Option<String> },
    Int(i64),
    Bool(bool),
    Str(String),
    Orient(OrientDir),
    Vector { value: [f64; 3], orig: Option<String> },
    AtomDb { lines: Vec<Vec<String>>, as_string: String },
}

impl Value {
    /// String form: original user spelling where recorded, or the numeric
    /// representation when `for_cache` (or no spelling survives)
    pub(crate) fn repr(&self, for_cache: bool) -> String {
        match self {
            Value::Dbl { value, orig } => match orig {
                Some(orig) if !for_cache => orig.clone(),
                _ => format!("{value}"),
            },
            Value::Int(v) => format!("{v}"),
            Value::Bool(v) => if *v { "true" } else { "false" }.to_string(),
            Value::Str(v) => v.clone(),
            Value::Orient(v) => v.to_repr(),
            Value::Vector { value, orig } => match orig {
                Some(orig) if !for_cache => orig.clone(),
                _ => format!("{},{},{}", value[0], value[1], value[2]),
            },
            Value::AtomDb { as_string, .. } => as_string.clone(),
        }
    }
}

fn unit_factor(unit: Unit, suffix: &str) -> Option<(f64, f64)> {
    // (factor, offset)
    match unit {
        Unit::Angle => match suffix {
            "rad" => Some((1.0, 0.0)),
            "deg" => Some((DEG, 0.0)),
            "arcmin" => Some((ARCMIN, 0.0)),
            "arcsec" => Some((ARCSEC, 0.0)),
            _ => None,
        },
        Unit::Length => match suffix {
            "Aa" => Some((1.0, 0.0)),
            "nm" => Some((10.0, 0.0)),
            "mm" => Some((1e7, 0.0)),
            "cm" => Some((1e8, 0.0)),
            "m" => Some((1e10, 0.0)),
            _ => None,
        },
        Unit::Temp => match suffix {
            "K" => Some((1.0, 0.0)),
            "C" => Some((1.0, 273.15)),
            "F" => Some((1.0 / 1.8, 273.15 - 32.0 / 1.8)),
            _ => None,
        },
        Unit::None => None,
    }
}

fn parse_dbl(input: &str, unit: Unit) -> Result<Value> {
    let trimmed = input.trim();
    let suffix_start = trimmed
        .rfind(|c: char| !c.is_ascii_alphabetic())
        .map(|i| i + 1)
        .unwrap_or(0);
    let (number_part, suffix) = trimmed.split_at(suffix_start);

    let (factor, offset, numeric) = if suffix.is_empty() {
        (1.0, 0.0, trimmed)
    } else {
        // tolerate exponents like "1e-3" where the suffix scan stops at 'e'
        match unit_factor(unit, suffix) {
            Some((f, o)) => (f, o, number_part),
            None if trimmed.parse::<f64>().is_ok() => (1.0, 0.0, trimmed),
            None => return Err(Error::bad(format!("invalid unit: {suffix}"))),
        }
    };
    let raw: f64 = numeric
        .trim()
        .parse()
        .map_err(|_| Error::bad(format!("could not decode number \"{input}\"")))?;
    let value = offset + factor * raw;
    if value.is_nan() {
        return Err(Error::bad("attempting to set number to NaN"));
    }
    Ok(Value::Dbl {
        value,
        orig: Some(trimmed.to_string()),
    })
}

fn check_str_value(input: &str) -> Result<()> {
    if !input.is_ascii() || input.contains('\t') || input.contains('\n') {
        return Err(Error::bad(
            "non-ASCII characters or tab/newlines in string value",
        ));
    }
    if input.chars().any(|c| FORBIDDEN_CHARS.contains(c)) || input.contains(['=', ';']) {
        return Err(Error::bad("forbidden characters in string value"));
    }
    Ok(())
}

fn parse_atomdb(input: &str) -> Result<Value> {
    let mut lines: Vec<Vec<String>> = Vec::new();
    for line in input.split('@') {
        let words: Vec<String> = line
            .split(':')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        if words.is_empty() {
            continue;
        }
        for word in &words {
            check_str_value(word)
                .map_err(|_| Error::bad("forbidden characters in atomdb parameter"))?;
        }
        nxtal_atomdb::validate_atomdb_line(&words).map_err(|e| {
            Error::bad(format!(
                "invalid entry in atomdb cfg parameter in the line: \"{}\". Error is: {e}",
                words.join(" ")
            ))
        })?;
        if words.len() == 1 && words[0] == "nodefaults" && !lines.is_empty() {
            return Err(Error::bad(
                "invalid entry in atomdb cfg parameter (\"nodefaults\" must be the first line)",
            ));
        }
        lines.push(words);
    }
    let as_string = lines
        .iter()
        .map(|line| line.join(":"))
        .collect::<Vec<_>>()
        .join("@");
    Ok(Value::AtomDb { lines, as_string })
}

/// Parse a raw value string according to the parameter's kind
pub(crate) fn parse_value(par: Param, input: &str) -> Result<Value> {
    if input.is_empty() && !matches!(par.kind(), Kind::Str) {
        return Err(Error::bad(format!(
            "missing parameter value for parameter \"{}\"",
            par.name()
        )));
    }
    match par.kind() {
        Kind::Dbl(unit) => parse_dbl(input, unit),
        Kind::Int => input
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Error::bad(format!("could not decode integer \"{input}\""))),
        Kind::Bool => match input.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            other => Err(Error::bad(format!(
                "could not convert \"{other}\" to boolean value (should be \"true\", \
                 \"1\", \"false\" or \"0\")"
            ))),
        },
        Kind::Str => {
            check_str_value(input)?;
            Ok(Value::Str(input.to_string()))
        }
        Kind::Orient => OrientDir::parse(input).map(Value::Orient),
        Kind::Vector => Ok(Value::Vector {
            value: parse_vector(input)?,
            orig: Some(input.trim().to_string()),
        }),
        Kind::AtomDb => parse_atomdb(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_names_are_sorted() {
        for pair in Param::ALL.windows(2) {
            assert!(pair[0].name() < pair[1].name());
        }
    }

    #[test]
    fn unit_suffixes() {
        let v = parse_value(Param::temp, "20C").unwrap();
        assert_eq!(v, Value::Dbl { value: 293.15, orig: Some("20C".into()) });

        let v = parse_value(Param::dcutoff, "0.05nm").unwrap();
        match v {
            Value::Dbl { value, .. } => assert!((value - 0.5).abs() < 1e-12),
            _ => unreachable!(),
        }

        let v = parse_value(Param::mos, "0.3deg").unwrap();
        match v {
            Value::Dbl { value, .. } => assert!((value - 0.3 * DEG).abs() < 1e-15),
            _ => unreachable!(),
        }

        assert!(parse_value(Param::temp, "20X").is_err());
        // unit suffixes are only for unit-bearing parameters
        assert!(parse_value(Param::packfact, "0.5Aa").is_err());
    }

    #[test]
    fn exponent_notation_is_not_a_unit() {
        let v = parse_value(Param::mosprec, "1e-4").unwrap();
        assert_eq!(v, Value::Dbl { value: 1e-4, orig: Some("1e-4".into()) });
    }

    #[test]
    fn string_values_reject_forbidden_chars() {
        assert!(parse_value(Param::inelas, "none").is_ok());
        assert!(parse_value(Param::inelas, "no[ne]").is_err());
        assert!(parse_value(Param::inelas, "a=b").is_err());
    }

    #[test]
    fn atomdb_value_lines() {
        let v = parse_value(Param::atomdb, "nodefaults@Al:26.98u:3.449fm:0.0082b:0.231b").unwrap();
        match v {
            Value::AtomDb { lines, as_string } => {
                assert_eq!(lines.len(), 2);
                assert_eq!(lines[0], vec!["nodefaults"]);
                assert_eq!(as_string, "nodefaults@Al:26.98u:3.449fm:0.0082b:0.231b");
            }
            _ => unreachable!(),
        }

        assert!(parse_value(Param::atomdb, "Al:26.98u:3.449fm:0.0082b:0.231b@nodefaults").is_err());
    }
}
