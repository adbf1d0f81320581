//! Extraction of the embedded `NCRYSTALMATCFG[...]` magic comment

// crate modules
use crate::error::{Error, Result};

// nxtal modules
use nxtal_textsrc::TextSource;

const PATTERN: &str = "NCRYSTALMATCFG";

/// Scan a whole text source for an embedded configuration string
///
/// At most one `NCRYSTALMATCFG[...]` may appear in a document (and only one
/// per line). Returns the bracket contents, trimmed; `None` when the file
/// embeds nothing.
pub(crate) fn extract_embedded_cfg(source: &mut dyn TextSource) -> Result<Option<String>> {
    let mut found: Option<String> = None;
    while let Some(line) = source.next_line()? {
        let Some(pos) = line.find(PATTERN) else {
            continue;
        };
        if found.is_some() {
            return Err(Error::bad(format!(
                "input file contains more than one {PATTERN} specification"
            )));
        }
        let rest = &line[pos + PATTERN.len()..];
        if rest.contains(PATTERN) {
            return Err(Error::bad(format!(
                "input file contains more than one {PATTERN} specification on a single line"
            )));
        }
        let Some(rest) = rest.strip_prefix('[') else {
            return Err(Error::bad(format!(
                "input file contains {PATTERN} which is not followed by a '[' character"
            )));
        };
        let Some(end) = rest.find(']') else {
            return Err(Error::bad(format!(
                "input file contains {PATTERN} without a closing ']' character"
            )));
        };
        found = Some(rest[..end].trim().to_string());
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nxtal_textsrc::MemorySource;

    fn extract(content: &str) -> Result<Option<String>> {
        extract_embedded_cfg(&mut MemorySource::new("t", content))
    }

    #[test]
    fn finds_single_occurrence() {
        let content = "NCMAT v2\n# NCRYSTALMATCFG[lcaxis=0,0,1]\n@DENSITY\n1.0 kg_per_m3\n";
        assert_eq!(extract(content).unwrap().as_deref(), Some("lcaxis=0,0,1"));
    }

    #[test]
    fn empty_brackets_count_as_occurrence() {
        let content = "# NCRYSTALMATCFG[]\n";
        assert_eq!(extract(content).unwrap().as_deref(), Some(""));
    }

    #[test]
    fn none_when_absent() {
        assert_eq!(extract("NCMAT v2\n").unwrap(), None);
    }

    #[test]
    fn multiple_occurrences_rejected() {
        let content = "# NCRYSTALMATCFG[a=1]\n# NCRYSTALMATCFG[b=2]\n";
        assert!(extract(content).is_err());
        assert!(extract("# NCRYSTALMATCFG[x] NCRYSTALMATCFG[y]\n").is_err());
    }

    #[test]
    fn malformed_brackets_rejected() {
        assert!(extract("# NCRYSTALMATCFG lcaxis\n").is_err());
        assert!(extract("# NCRYSTALMATCFG[lcaxis=0,0,1\n").is_err());
    }
}
