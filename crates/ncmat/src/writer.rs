//! Re-serialization of a parsed record back to NCMAT text
//!
//! The emitted text is canonical: sections in a fixed order, one value list
//! per line, numbers in shortest round-trip form. Parsing the output yields
//! a record equal to the input, which the test suite relies on.

// crate modules
use crate::data::{DensityUnit, DynType, NcmatData};

// nxtal modules
use nxtal_utils::f;

use std::fmt::Write;

fn push_values(out: &mut String, values: &[f64]) {
    for v in values {
        let _ = write!(out, " {v}");
    }
    out.push('\n');
}

/// Serialize a record to NCMAT text
pub fn write_ncmat(data: &NcmatData) -> String {
    let mut out = f!("NCMAT v{}\n", data.version);

    if let Some(cell) = &data.cell {
        out.push_str("@CELL\n");
        out.push_str("lengths");
        push_values(&mut out, &cell.lengths);
        out.push_str("angles");
        push_values(&mut out, &cell.angles);
    }

    if !data.atompos.is_empty() {
        out.push_str("@ATOMPOSITIONS\n");
        for (name, pos) in &data.atompos {
            out.push_str(name);
            push_values(&mut out, pos);
        }
    }

    if let Some(sg) = data.spacegroup {
        let _ = write!(out, "@SPACEGROUP\n{sg}\n");
    }

    if data.debye_global.is_some() || !data.debye_per_element.is_empty() {
        out.push_str("@DEBYETEMPERATURE\n");
        if let Some(t) = data.debye_global {
            let _ = write!(out, "{t}\n");
        }
        for (name, t) in &data.debye_per_element {
            let _ = write!(out, "{name} {t}\n");
        }
    }

    if let Some((value, unit)) = &data.density {
        let unit = match unit {
            DensityUnit::AtomsPerAa3 => "atoms_per_aa3",
            DensityUnit::KgPerM3 => "kg_per_m3",
        };
        let _ = write!(out, "@DENSITY\n{value} {unit}\n");
    }

    for di in &data.dyninfos {
        out.push_str("@DYNINFO\n");
        let _ = write!(out, "element {}\n", di.element);
        let _ = write!(out, "fraction {}\n", di.fraction);
        let dtype = match di.dtype {
            DynType::Undefined => "undefined",
            DynType::Sterile => "sterile",
            DynType::FreeGas => "freegas",
            DynType::ScatKnl => "scatknl",
            DynType::Vdos => "vdos",
            DynType::VdosDebye => "vdosdebye",
        };
        let _ = write!(out, "type {dtype}\n");
        for (key, values) in &di.fields {
            out.push_str(key);
            push_values(&mut out, values);
        }
    }

    if !data.atomdb_lines.is_empty() {
        out.push_str("@ATOMDB\n");
        for line in &data.atomdb_lines {
            out.push_str(&line.join(" "));
            out.push('\n');
        }
    }

    for (name, lines) in &data.custom_sections {
        let _ = write!(out, "@CUSTOM_{name}\n");
        for line in lines {
            out.push_str(&line.join(" "));
            out.push('\n');
        }
    }

    out
}
