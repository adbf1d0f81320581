//! Text source abstraction over on-disk files and in-memory buffers

// crate modules
use crate::error::Result;

// standard library
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// Line-oriented access to a named text input
///
/// The description identifies the source in error messages (a file name, a
/// registry key). Implementations yield lines without their terminators; a
/// DOS `\r` remains attached so parsers can apply their own encoding rules.
pub trait TextSource {
    /// Identifying description, e.g. a file name or registry key
    fn description(&self) -> &str;

    /// Kind of stream, e.g. "file" or "memory"
    fn stream_type(&self) -> &'static str;

    /// Resolved on-disk path when content comes directly from a file
    fn resolved_path(&self) -> Option<&Path> {
        None
    }

    /// Next line of text, or `None` once input ran out
    fn next_line(&mut self) -> Result<Option<String>>;
}

impl std::fmt::Debug for dyn TextSource + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "TextSource({} \"{}\")", self.stream_type(), self.description())
    }
}

/// Full description used in parser error messages, e.g. `file "Al.ncmat"`
pub fn full_description(source: &dyn TextSource) -> String {
    format!("{} \"{}\"", source.stream_type(), source.description())
}

/// A [TextSource] reading an on-disk file line by line
#[derive(Debug)]
pub struct FileSource {
    description: String,
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl FileSource {
    /// Open a file directly, without any name resolution
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        Ok(Self {
            description: path.display().to_string(),
            lines: BufReader::new(file).lines(),
            path,
        })
    }
}

impl TextSource for FileSource {
    fn description(&self) -> &str {
        &self.description
    }

    fn stream_type(&self) -> &'static str {
        "file"
    }

    fn resolved_path(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next().transpose()?)
    }
}

/// A [TextSource] over an in-memory buffer
///
/// ```rust
/// # use nxtal_textsrc::{MemorySource, TextSource};
/// let mut src = MemorySource::new("demo", "first\nsecond\n");
/// assert_eq!(src.next_line().unwrap().as_deref(), Some("first"));
/// assert_eq!(src.next_line().unwrap().as_deref(), Some("second"));
/// assert_eq!(src.next_line().unwrap(), None);
/// ```
#[derive(Debug, Clone)]
pub struct MemorySource {
    description: String,
    content: String,
    cursor: usize,
}

impl MemorySource {
    /// Wrap a buffer under the given name
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            description: name.into(),
            content: content.into(),
            cursor: 0,
        }
    }
}

impl TextSource for MemorySource {
    fn description(&self) -> &str {
        &self.description
    }

    fn stream_type(&self) -> &'static str {
        "memory"
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        if self.cursor >= self.content.len() {
            return Ok(None);
        }
        let rest = &self.content[self.cursor..];
        let (line, advance) = match rest.find('\n') {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };
        self.cursor += advance;
        Ok(Some(line.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_preserves_carriage_returns() {
        // encoding policy is the parser's job, so `\r` must survive
        let mut src = MemorySource::new("x", "a\r\nb");
        assert_eq!(src.next_line().unwrap().as_deref(), Some("a\r"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("b"));
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn memory_source_empty() {
        let mut src = MemorySource::new("x", "");
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn file_source_reads_and_resolves() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "NCMAT v1").unwrap();
        writeln!(file, "# comment").unwrap();
        file.flush().unwrap();

        let mut src = FileSource::open(file.path()).unwrap();
        assert_eq!(src.stream_type(), "file");
        assert_eq!(src.resolved_path(), Some(file.path()));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("NCMAT v1"));
        assert_eq!(src.next_line().unwrap().as_deref(), Some("# comment"));
        assert_eq!(src.next_line().unwrap(), None);
    }
}
