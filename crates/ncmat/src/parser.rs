//! Section-driven parser for NCMAT text sources

// crate modules
use crate::data::{CellData, DensityUnit, DynInfoData, DynType, NcmatData};
use crate::error::{Error, Result};
use crate::tokens;

// nxtal modules
use nxtal_atomdb::validate_element_name;
use nxtal_textsrc::{full_description, TextSource};

// standard library
use std::collections::HashSet;

/// Parse one NCMAT text source into a raw [NcmatData] record
///
/// Performs the full syntax check (first-line version designation, lexical
/// rules, section structure) and record validation. Errors cite the source
/// description and the offending line.
pub fn parse_ncmat(mut source: Box<dyn TextSource>) -> Result<NcmatData> {
    let mut parser = NcmatParser::new(&mut *source);
    parser.parse()?;
    let mut data = parser.data;
    data.unalias_element_names();
    data.validate()?;
    Ok(data)
}

// The active section. The part before the first marker is handled as a
// pseudo-section so it shares the dispatch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Head,
    Cell,
    AtomPositions,
    SpaceGroup,
    DebyeTemperature,
    DynInfo,
    Density,
    AtomDb,
    Custom,
}

struct NcmatParser<'a> {
    source: &'a mut dyn TextSource,
    data: NcmatData,
    sfd: String,

    // @CELL staging, committed when the section closes
    cell_lengths: Option<[f64; 3]>,
    cell_angles: Option<[f64; 3]>,

    // @DYNINFO streaming state for vector fields spanning multiple lines
    dyninfo_open: bool,
    active_vector_field: Option<String>,
    allow_negative: bool,
}

impl<'a> NcmatParser<'a> {
    fn new(source: &'a mut dyn TextSource) -> Self {
        let sfd = full_description(source);
        Self {
            source,
            data: NcmatData::new(sfd.clone()),
            sfd,
            cell_lengths: None,
            cell_angles: None,
            dyninfo_open: false,
            active_vector_field: None,
            allow_negative: false,
        }
    }

    fn err(&self, line: u32, reason: impl Into<String>) -> Error {
        Error::bad_input(&self.sfd, line, reason)
    }

    fn parse(&mut self) -> Result<()> {
        // First line is special: the file must start with "NCMAT" with no
        // whitespace in front, and carries the format version.
        let first = match self.source.next_line()? {
            Some(line) => line,
            None => return Err(Error::bad_data(&self.sfd, "empty input")),
        };
        if !first.starts_with("NCMAT") {
            return Err(Error::bad_data(
                &self.sfd,
                "not in NCMAT format: the first 5 characters of the first line must be \"NCMAT\"",
            ));
        }
        let parts = self.tokenize(&first, 1)?;
        if parts.len() == 2 {
            self.data.version = match parts[1].as_str() {
                "v1" => 1,
                "v2" => 2,
                "v3" => 3,
                other => {
                    return Err(self.err(
                        1,
                        format!("NCMAT format version \"{other}\" is not recognised"),
                    ))
                }
            };
        }
        if self.data.version == 0 {
            return Err(self.err(
                1,
                "missing clear NCMAT format version designation in the first line, \
                 which should look like e.g. \"NCMAT v1\"",
            ));
        }
        if self.data.version == 1 && first.contains('#') {
            return Err(self.err(
                1,
                "has comments in the first line, which is not allowed in the NCMAT v1 format",
            ));
        }

        // Remaining lines dispatch to the active section handler; a handler
        // sees an empty token list when its section closes.
        let mut current = Section::Head;
        let mut seen: HashSet<String> = HashSet::new();
        let mut saw_any_section = false;
        let mut lineno: u32 = 1;

        while let Some(line) = self.source.next_line()? {
            lineno += 1;
            let parts = self.tokenize(&line, lineno)?;

            if self.data.version == 1 && line.contains('#') {
                let bad = saw_any_section
                    || parts.first().is_some_and(|p| p.starts_with('@'))
                    || !line.starts_with('#');
                if bad {
                    return Err(self.err(
                        lineno,
                        "has comments in a place which is not allowed in the NCMAT v1 \
                         format (must only appear before the first data section and with \
                         the # marker at the beginning of the line)",
                    ));
                }
            }

            if parts.is_empty() {
                continue;
            }

            if parts[0].starts_with('@') {
                saw_any_section = true;
                if parts.len() > 1 {
                    return Err(self.err(
                        lineno,
                        format!(
                            "should not have non-comment entries after a section marker \
                             (found \"{}\" after \"{}\")",
                            parts[1], parts[0]
                        ),
                    ));
                }
                if !line.starts_with('@') {
                    return Err(self.err(
                        lineno,
                        format!(
                            "should not have whitespace before a section marker \
                             (problem with indented \"{}\")",
                            parts[0]
                        ),
                    ));
                }
                let name = &parts[0][1..];
                if name.is_empty() {
                    return Err(self.err(lineno, "missing section name after '@' symbol"));
                }

                // close the previous section before switching
                self.handle(current, &[], lineno.saturating_sub(1))?;

                let is_custom = name.starts_with("CUSTOM_") || name == "CUSTOM_";
                let multiple_allowed = is_custom || name == "DYNINFO";
                if !multiple_allowed && !seen.insert(name.to_string()) {
                    return Err(self.err(
                        lineno,
                        format!("multiple @{name} sections are not allowed"),
                    ));
                }

                current = self.resolve_section(name, lineno)?;
                if current == Section::Custom {
                    let suffix = &name["CUSTOM_".len()..];
                    if suffix.is_empty() {
                        return Err(self.err(
                            lineno,
                            format!(
                                "has @{name} section (needs additional characters \
                                 after \"CUSTOM_\")"
                            ),
                        ));
                    }
                    self.data
                        .custom_sections
                        .push((suffix.to_string(), Vec::new()));
                }
                continue;
            }

            self.handle(current, &parts, lineno)?;
        }

        // End of input closes the last open section.
        self.handle(current, &[], lineno)?;
        Ok(())
    }

    fn resolve_section(&self, name: &str, lineno: u32) -> Result<Section> {
        let version = self.data.version;
        let section = match name {
            "CELL" => Some(Section::Cell),
            "ATOMPOSITIONS" => Some(Section::AtomPositions),
            "SPACEGROUP" => Some(Section::SpaceGroup),
            "DEBYETEMPERATURE" => Some(Section::DebyeTemperature),
            "DYNINFO" if version >= 2 => Some(Section::DynInfo),
            "DENSITY" if version >= 2 => Some(Section::Density),
            "ATOMDB" if version >= 3 => Some(Section::AtomDb),
            custom if custom.starts_with("CUSTOM_") && version >= 3 => Some(Section::Custom),
            _ => None,
        };
        if let Some(section) = section {
            return Ok(section);
        }
        // better messages when the section exists in a later format version
        if version == 1 && (name == "DYNINFO" || name == "DENSITY") {
            return Err(self.err(
                lineno,
                format!(
                    "has @{name} section which is not supported in the indicated NCMAT \
                     format version, \"NCMAT v1\". It is only available starting with \
                     \"NCMAT v2\""
                ),
            ));
        }
        if version < 3 && (name == "ATOMDB" || name.starts_with("CUSTOM_")) {
            return Err(self.err(
                lineno,
                format!(
                    "has @{name} section which is not supported in the indicated NCMAT \
                     format version, \"NCMAT v{version}\". It is only available starting \
                     with \"NCMAT v3\""
                ),
            ));
        }
        Err(self.err(
            lineno,
            format!("has @{name} section which is not a supported section name"),
        ))
    }

    fn handle(&mut self, section: Section, parts: &[String], lineno: u32) -> Result<()> {
        match section {
            Section::Head => self.handle_head(parts, lineno),
            Section::Cell => self.handle_cell(parts, lineno),
            Section::AtomPositions => self.handle_atompositions(parts, lineno),
            Section::SpaceGroup => self.handle_spacegroup(parts, lineno),
            Section::DebyeTemperature => self.handle_debyetemperature(parts, lineno),
            Section::DynInfo => self.handle_dyninfo(parts, lineno),
            Section::Density => self.handle_density(parts, lineno),
            Section::AtomDb => self.handle_atomdb(parts, lineno),
            Section::Custom => self.handle_custom(parts, lineno),
        }
    }

    // ! ------------------------------------------------------------------
    // ! Line tokenization and encoding rules
    // ! ------------------------------------------------------------------

    // Splits off trailing comments and whitespace-separates the rest.
    // Non-comment content must be printable 7-bit ASCII (tabs tolerated);
    // comments may hold UTF-8 but no control codes. A bare `\r` outside a
    // `\r\n` pair can visually hide the line leading up to it in terminal
    // printouts, so it is rejected everywhere.
    fn tokenize(&self, line: &str, lineno: u32) -> Result<Vec<String>> {
        let bytes = line.as_bytes();
        let mut parts: Vec<String> = Vec::new();
        let mut begin: Option<usize> = None;
        let mut pos = bytes.len();

        let mut flush = |begin: &mut Option<usize>, end: usize, parts: &mut Vec<String>| {
            if let Some(b) = begin.take() {
                // content is checked ASCII, so the slice is valid UTF-8
                parts.push(String::from_utf8_lossy(&bytes[b..end]).into_owned());
            }
        };

        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            if c > 32 && c < 127 && c != b'#' {
                if begin.is_none() {
                    begin = Some(i);
                }
                i += 1;
                continue;
            }
            if c == b' ' || c == b'\t' {
                flush(&mut begin, i, &mut parts);
                i += 1;
                continue;
            }
            if c == b'\n' || c == b'\r' || c == b'#' {
                if c == b'\r' && !(i + 1 == bytes.len() || bytes[i + 1] == b'\n') {
                    return Err(self.err(
                        lineno,
                        format!(
                            "contains invalid character at position {i}: carriage return \
                             codes (aka \\r) are not allowed unless used as part of DOS \
                             line endings"
                        ),
                    ));
                }
                pos = i;
                break;
            }
            return Err(self.err(
                lineno,
                format!(
                    "contains invalid character at position {i}: only regular ASCII \
                     characters (including spaces) are allowed outside comments \
                     (comments can be UTF-8)"
                ),
            ));
        }
        if i == bytes.len() {
            pos = bytes.len();
        }
        flush(&mut begin, pos.min(i), &mut parts);

        // no illegal control codes in the comment part
        let mut j = pos;
        while j < bytes.len() {
            let c = bytes[j];
            if (32..127).contains(&c) || c >= 128 || c == b'\t' || c == b'\n' {
                j += 1;
                continue;
            }
            if c == b'\r' {
                if !(j + 1 == bytes.len() || bytes[j + 1] == b'\n') {
                    return Err(self.err(
                        lineno,
                        format!(
                            "contains invalid character at position {j}: carriage return \
                             codes (aka \\r) are not allowed unless used as part of DOS \
                             line endings"
                        ),
                    ));
                }
                j += 1;
                continue;
            }
            return Err(self.err(lineno, "contains illegal control code character"));
        }

        Ok(parts)
    }

    fn check_element_name(&self, name: &str, lineno: u32) -> Result<()> {
        validate_element_name(name, self.data.version >= 3)
            .map_err(|e| self.err(lineno, e.to_string()))
    }

    fn decode_number(&self, token: &str, lineno: u32, what: &str) -> Result<f64> {
        tokens::number(token)
            .map_err(|e| self.err(lineno, format!("problem while decoding {what}: {e}")))
    }

    // ! ------------------------------------------------------------------
    // ! Section handlers
    // ! ------------------------------------------------------------------

    fn handle_head(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        if let Some(first) = parts.first() {
            return Err(self.err(
                lineno,
                format!(
                    "should not have non-comment entries before the first section \
                     (found \"{first}\")"
                ),
            ));
        }
        Ok(())
    }

    fn handle_cell(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        if parts.is_empty() {
            if self.cell_lengths.is_none() || self.cell_angles.is_none() {
                return Err(self.err(
                    lineno,
                    "missing \"lengths\" or \"angles\" entry in @CELL section ending here",
                ));
            }
            self.data.cell = Some(CellData {
                lengths: self.cell_lengths.take().expect("checked above"),
                angles: self.cell_angles.take().expect("checked above"),
            });
            return self.data.validate_cell().map_err(|e| {
                self.err(lineno, format!("{e} (problem in the @CELL section ending here)"))
            });
        }
        let keyword = parts[0].as_str();
        if keyword != "lengths" && keyword != "angles" {
            return Err(self.err(
                lineno,
                format!(
                    "found \"{keyword}\" where \"lengths\" or \"angles\" keyword was \
                     expected in @CELL section"
                ),
            ));
        }
        if parts.len() != 4 {
            return Err(self.err(
                lineno,
                format!(
                    "wrong number of data entries after \"{keyword}\" keyword \
                     (expected three numbers)"
                ),
            ));
        }
        let mut v = [0.0; 3];
        for (i, value) in v.iter_mut().enumerate() {
            *value = self.decode_number(
                &parts[i + 1],
                lineno,
                &format!("\"{keyword}\" parameter #{}", i + 1),
            )?;
        }
        if v == [0.0; 3] {
            return Err(self.err(lineno, format!("vector \"{keyword}\" is a null-vector")));
        }
        let slot = if keyword == "lengths" {
            &mut self.cell_lengths
        } else {
            &mut self.cell_angles
        };
        if slot.is_some() {
            return Err(self.err(lineno, format!("repeated keyword \"{keyword}\"")));
        }
        *slot = Some(v);
        Ok(())
    }

    fn handle_atompositions(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        if parts.is_empty() {
            if self.data.atompos.is_empty() {
                return Err(self.err(
                    lineno,
                    "no element positions specified in @ATOMPOSITIONS section ending here",
                ));
            }
            return self.data.validate_atompos().map_err(|e| {
                self.err(
                    lineno,
                    format!("{e} (problem in the @ATOMPOSITIONS section ending here)"),
                )
            });
        }
        self.check_element_name(&parts[0], lineno)?;
        if parts.len() != 4 {
            return Err(self.err(
                lineno,
                format!(
                    "wrong number of data entries after element name \"{}\" \
                     (expected three numbers)",
                    parts[0]
                ),
            ));
        }
        let mut pos = [0.0; 3];
        for (i, value) in pos.iter_mut().enumerate() {
            *value = tokens::number_with_fractions(&parts[i + 1], self.data.version >= 2)
                .map_err(|e| {
                    self.err(
                        lineno,
                        format!(
                            "problem while decoding position parameter #{} for element \
                             \"{}\": {e}",
                            i + 1,
                            parts[0]
                        ),
                    )
                })?;
        }
        self.data.atompos.push((parts[0].clone(), pos));
        Ok(())
    }

    fn handle_spacegroup(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        if parts.is_empty() {
            if self.data.spacegroup.is_none() {
                return Err(self.err(
                    lineno,
                    "no spacegroup number specified in @SPACEGROUP section ending here",
                ));
            }
            return self.data.validate_spacegroup().map_err(|e| {
                self.err(
                    lineno,
                    format!("{e} (problem in the @SPACEGROUP section ending here)"),
                )
            });
        }
        if self.data.spacegroup.is_some() || parts.len() > 1 {
            return Err(self.err(
                lineno,
                "multiple entries specified in @SPACEGROUP section (requires just a \
                 single number)",
            ));
        }
        let sg: u32 = parts[0].parse().map_err(|_| {
            self.err(
                lineno,
                format!("problem while decoding spacegroup parameter \"{}\"", parts[0]),
            )
        })?;
        self.data.spacegroup = Some(sg);
        Ok(())
    }

    fn handle_debyetemperature(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        if parts.is_empty() {
            if self.data.debye_global.is_none() && self.data.debye_per_element.is_empty() {
                return Err(self.err(
                    lineno,
                    "missing data in @DEBYETEMPERATURE section ending here",
                ));
            }
            return self.data.validate_debye().map_err(|e| {
                self.err(
                    lineno,
                    format!("{e} (problem in the @DEBYETEMPERATURE section ending here)"),
                )
            });
        }
        if self.data.debye_global.is_some() {
            return Err(self.err(
                lineno,
                "invalid entries found after global Debye temperature was already specified",
            ));
        }
        match parts.len() {
            1 => {
                if !self.data.debye_per_element.is_empty() {
                    return Err(self.err(
                        lineno,
                        "invalid entries found (missing element name or temperature?)",
                    ));
                }
                let t = self.decode_number(&parts[0], lineno, "global Debye temperature")?;
                self.data.debye_global = Some(t);
            }
            2 => {
                self.check_element_name(&parts[0], lineno)?;
                let t = self.decode_number(
                    &parts[1],
                    lineno,
                    &format!("temperature for element \"{}\"", parts[0]),
                )?;
                self.data.debye_per_element.push((parts[0].clone(), t));
            }
            _ => return Err(self.err(lineno, "wrong number of data entries")),
        }
        Ok(())
    }

    fn handle_dyninfo(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        if parts.is_empty() {
            if !self.dyninfo_open {
                return Err(self.err(lineno, "no input found in @DYNINFO section ending here"));
            }
            let di = self.data.dyninfos.last().expect("open dyninfo exists");
            di.validate().map_err(|reason| {
                self.err(
                    lineno,
                    format!("{reason} (problem found in the @DYNINFO section ending here)"),
                )
            })?;
            self.dyninfo_open = false;
            self.active_vector_field = None;
            self.allow_negative = false;
            return Ok(());
        }
        if !self.dyninfo_open {
            self.data.dyninfos.push(DynInfoData {
                fraction: -1.0,
                ..Default::default()
            });
            self.dyninfo_open = true;
        }

        let p0 = parts[0].as_str();
        let is_keyword = p0
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase())
            && p0.chars().all(|c| c.is_ascii_lowercase() || c == '_');

        let mut value_tokens: &[String] = parts;
        let target_key: String;

        if is_keyword {
            if parts.len() < 2 {
                return Err(self.err(
                    lineno,
                    format!("provides no arguments for keyword \"{p0}\""),
                ));
            }
            // a new keyword always deactivates any multi-line field
            self.active_vector_field = None;
            self.allow_negative = false;

            if matches!(p0, "fraction" | "element" | "type") {
                return self.handle_dyninfo_common_key(parts, lineno);
            }
            if matches!(p0, "sqw" | "qgrid" | "omegagrid") {
                return Err(self.err(
                    lineno,
                    format!(
                        "support for kernels in S(q,w) format and the keyword \"{p0}\" \
                         is not supported in NCMAT v1 or NCMAT v2 files (but is planned \
                         for inclusion in later format versions)"
                    ),
                ));
            }
            let repeated = self
                .data
                .dyninfos
                .last()
                .expect("open dyninfo exists")
                .fields
                .contains_key(p0);
            if repeated {
                return Err(self.err(
                    lineno,
                    format!("keyword \"{p0}\" is specified a second time"),
                ));
            }
            self.data
                .dyninfos
                .last_mut()
                .expect("open dyninfo exists")
                .fields
                .insert(p0.to_string(), Vec::new());
            // fields potentially needing a large number of arguments may
            // continue over subsequent lines
            if matches!(
                p0,
                "sab" | "sab_scaled" | "alphagrid" | "betagrid" | "egrid" | "vdos_egrid"
                    | "vdos_density"
            ) {
                self.active_vector_field = Some(p0.to_string());
                self.allow_negative = p0 == "betagrid";
            }
            target_key = p0.to_string();
            value_tokens = &parts[1..];
        } else {
            match &self.active_vector_field {
                Some(key) => target_key = key.clone(),
                None => {
                    return Err(self.err(
                        lineno,
                        format!("expected a keyword but found \"{p0}\""),
                    ))
                }
            }
        }

        let allow_negative = self.allow_negative;
        let mut decoded: Vec<f64> = Vec::new();
        for (i, token) in value_tokens.iter().enumerate() {
            let (value, count) = tokens::repeated_number(token).map_err(|e| {
                self.err(
                    lineno,
                    format!("problem while decoding vector entry #{}: {e}", i + 1),
                )
            })?;
            if !allow_negative && value < 0.0 {
                return Err(self.err(
                    lineno,
                    format!("problem while decoding vector entry #{}: negative number", i + 1),
                ));
            }
            decoded.extend(std::iter::repeat(value).take(count));
        }
        let di = self.data.dyninfos.last_mut().expect("open dyninfo exists");
        di.fields
            .get_mut(&target_key)
            .expect("target field exists")
            .extend(decoded);
        Ok(())
    }

    fn handle_dyninfo_common_key(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        let p0 = parts[0].as_str();
        if parts.len() != 2 {
            return Err(self.err(
                lineno,
                format!("does not provide exactly one argument to keyword \"{p0}\""),
            ));
        }
        let p1 = parts[1].as_str();
        let version = self.data.version;
        let di_set = {
            let di = self.data.dyninfos.last().expect("open dyninfo exists");
            match p0 {
                "fraction" => di.fraction >= 0.0,
                "element" => !di.element.is_empty(),
                _ => di.dtype != DynType::Undefined,
            }
        };
        if di_set {
            return Err(self.err(
                lineno,
                format!("keyword \"{p0}\" is specified a second time"),
            ));
        }
        match p0 {
            "fraction" => {
                let fr = tokens::number_with_fractions(p1, version >= 2).map_err(|e| {
                    self.err(lineno, format!("problem while decoding fraction parameter: {e}"))
                })?;
                if !(fr > 0.0 && fr <= 1.0) {
                    return Err(self.err(
                        lineno,
                        "problem while decoding fraction parameter (must result in a \
                         number greater than 0.0 and at most 1.0)",
                    ));
                }
                self.data.dyninfos.last_mut().expect("open dyninfo exists").fraction = fr;
            }
            "element" => {
                self.check_element_name(p1, lineno)?;
                self.data.dyninfos.last_mut().expect("open dyninfo exists").element = p1.to_string();
            }
            _ => {
                let dtype = match p1 {
                    "scatknl" => DynType::ScatKnl,
                    "vdos" => DynType::Vdos,
                    "vdosdebye" => DynType::VdosDebye,
                    "freegas" => DynType::FreeGas,
                    "sterile" => DynType::Sterile,
                    _ => {
                        return Err(self.err(
                            lineno,
                            "invalid @DYNINFO type specified (must be one of \"scatknl\", \
                             \"vdos\", \"vdosdebye\", \"freegas\", \"sterile\")",
                        ))
                    }
                };
                self.data.dyninfos.last_mut().expect("open dyninfo exists").dtype = dtype;
            }
        }
        Ok(())
    }

    fn handle_density(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        if parts.is_empty() {
            if self.data.density.is_none() {
                return Err(self.err(lineno, "no input found in @DENSITY section ending here"));
            }
            return self.data.validate_density().map_err(|e| {
                self.err(lineno, format!("{e} (problem in the @DENSITY section ending here)"))
            });
        }
        if parts.len() != 2 {
            return Err(self.err(lineno, "wrong number of entries in @DENSITY section"));
        }
        if self.data.density.is_some() {
            return Err(self.err(lineno, "repeated density specification"));
        }
        let value = self.decode_number(&parts[0], lineno, "density value")?;
        let entry = match parts[1].as_str() {
            "atoms_per_aa3" => (value, DensityUnit::AtomsPerAa3),
            "kg_per_m3" => (value, DensityUnit::KgPerM3),
            "g_per_cm3" => (value * 1000.0, DensityUnit::KgPerM3),
            _ => return Err(self.err(lineno, "invalid density unit")),
        };
        self.data.density = Some(entry);
        Ok(())
    }

    fn handle_atomdb(&mut self, parts: &[String], lineno: u32) -> Result<()> {
        if parts.is_empty() {
            return Ok(());
        }
        if parts[0] != "nodefaults" {
            self.check_element_name(&parts[0], lineno)?;
        }
        self.data.atomdb_lines.push(parts.to_vec());
        Ok(())
    }

    fn handle_custom(&mut self, parts: &[String], _lineno: u32) -> Result<()> {
        if parts.is_empty() {
            return Ok(());
        }
        self.data
            .custom_sections
            .last_mut()
            .expect("custom section was opened")
            .1
            .push(parts.to_vec());
        Ok(())
    }
}
