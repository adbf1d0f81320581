//! Result and Error types for nxtal-ncmat

/// Type alias for `Result<T, ncmat::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-ncmat` crate
///
/// Parser failures always carry the source description, and line-level
/// failures the 1-based line number where the problem was found.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to read text source")]
    Source(#[from] nxtal_textsrc::Error),

    #[error("{source_descr}: {reason} (line {line})")]
    BadInput {
        /// Stream type and name, e.g. `file "Al.ncmat"`
        source_descr: String,
        /// 1-based line number
        line: u32,
        /// What went wrong
        reason: String,
    },

    #[error("{source_descr}: {reason}")]
    BadData {
        /// Stream type and name, e.g. `file "Al.ncmat"`
        source_descr: String,
        /// What went wrong
        reason: String,
    },
}

impl Error {
    pub(crate) fn bad_input(source_descr: &str, line: u32, reason: impl Into<String>) -> Self {
        Error::BadInput {
            source_descr: source_descr.to_string(),
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn bad_data(source_descr: &str, reason: impl Into<String>) -> Self {
        Error::BadData {
            source_descr: source_descr.to_string(),
            reason: reason.into(),
        }
    }
}
