//! Orientation direction values for single-crystal configurations

// crate modules
use crate::error::{Error, Result};

// nom parser combinators
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, space0};
use nom::combinator::all_consuming;
use nom::number::complete::double;
use nom::sequence::{delimited, tuple};
use nom::IResult;

/// A direction in the crystal frame, either as coordinates or as the normal
/// of an (h,k,l) plane family
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrystalAxis {
    /// Direct crystal-frame coordinates
    Direction([f64; 3]),
    /// Miller indices of a plane whose normal is meant
    Hkl([f64; 3]),
}

impl CrystalAxis {
    /// The raw vector, whatever frame it refers to
    pub fn vector(&self) -> [f64; 3] {
        match self {
            CrystalAxis::Direction(v) | CrystalAxis::Hkl(v) => *v,
        }
    }

    /// Whether the value is given as Miller indices
    pub fn is_hkl(&self) -> bool {
        matches!(self, CrystalAxis::Hkl(_))
    }
}

/// One (crystal frame, lab frame) direction pair
///
/// Configuration syntax is `@crys:cx,cy,cz@lab:lx,ly,lz` or
/// `@crys_hkl:h,k,l@lab:lx,ly,lz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientDir {
    /// Direction in the crystal frame
    pub crystal: CrystalAxis,
    /// The same direction in the laboratory frame
    pub lab: [f64; 3],
}

fn comma_vector(i: &str) -> IResult<&str, [f64; 3]> {
    let num = |i| delimited(space0, double, space0)(i);
    let (i, (x, _, y, _, z)) = tuple((num, char(','), num, char(','), num))(i)?;
    Ok((i, [x, y, z]))
}

fn orientdir(i: &str) -> IResult<&str, OrientDir> {
    let (i, _) = char('@')(i)?;
    let (i, kind) = alt((tag("crys_hkl:"), tag("crys:")))(i)?;
    let (i, cvec) = comma_vector(i)?;
    let (i, _) = tag("@lab:")(i)?;
    let (i, lvec) = comma_vector(i)?;
    let crystal = if kind == "crys_hkl:" {
        CrystalAxis::Hkl(cvec)
    } else {
        CrystalAxis::Direction(cvec)
    };
    Ok((i, OrientDir { crystal, lab: lvec }))
}

impl OrientDir {
    /// Parse the `@crys...@lab:...` syntax
    pub fn parse(input: &str) -> Result<Self> {
        let (_, dir) = all_consuming(orientdir)(input.trim())
            .map_err(|_| Error::bad(format!("bad syntax for orientation: \"{input}\"")))?;
        let all = dir
            .crystal
            .vector()
            .iter()
            .chain(dir.lab.iter())
            .all(|v| v.is_finite());
        if !all {
            return Err(Error::bad("attempting to set orientation value to NaN"));
        }
        Ok(dir)
    }

    pub(crate) fn to_repr(self) -> String {
        let c = self.crystal.vector();
        let l = self.lab;
        let prefix = if self.crystal.is_hkl() {
            "@crys_hkl:"
        } else {
            "@crys:"
        };
        format!(
            "{prefix}{},{},{}@lab:{},{},{}",
            c[0], c[1], c[2], l[0], l[1], l[2]
        )
    }
}

/// Parse a bare `x,y,z` vector value (e.g. `lcaxis`)
pub(crate) fn parse_vector(input: &str) -> Result<[f64; 3]> {
    let (_, v) = all_consuming(comma_vector)(input.trim())
        .map_err(|_| Error::bad(format!("bad syntax for vector value: \"{input}\"")))?;
    if v.iter().any(|x| !x.is_finite()) {
        return Err(Error::bad("attempting to set vector value to NaN"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_crystal_frames() {
        let d = OrientDir::parse("@crys:0,0,1@lab:0,0,1").unwrap();
        assert_eq!(d.crystal, CrystalAxis::Direction([0.0, 0.0, 1.0]));
        assert_eq!(d.lab, [0.0, 0.0, 1.0]);

        let d = OrientDir::parse("@crys_hkl:1,1,0@lab:0,1,0").unwrap();
        assert!(d.crystal.is_hkl());
    }

    #[test]
    fn tolerates_spacing_inside_vectors() {
        let d = OrientDir::parse(" @crys: 0 , 0.5 , 1 @lab:1,0,0 ").unwrap();
        assert_eq!(d.crystal.vector(), [0.0, 0.5, 1.0]);
    }

    #[test]
    fn rejects_malformed_syntax() {
        assert!(OrientDir::parse("@crys:0,0@lab:0,0,1").is_err());
        assert!(OrientDir::parse("crys:0,0,1@lab:0,0,1").is_err());
        assert!(OrientDir::parse("@crys:0,0,1").is_err());
    }

    #[test]
    fn vector_values() {
        assert_eq!(parse_vector("0,0,1").unwrap(), [0.0, 0.0, 1.0]);
        assert!(parse_vector("0,0").is_err());
    }
}
