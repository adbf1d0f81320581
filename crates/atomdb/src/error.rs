//! Result and Error types for nxtal-atomdb

/// Type alias for `Result<T, atomdb::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-atomdb` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid element name \"{0}\"")]
    BadElementName(String),

    #[error("isotope markers like \"{0}\" are not supported here")]
    IsotopeNotAllowed(String),

    #[error("no data available for atom \"{0}\"")]
    UnknownAtom(String),

    #[error("invalid atom data line \"{line}\": {reason}")]
    BadDataLine {
        /// The offending line, joined on single spaces
        line: String,
        /// What was wrong with it
        reason: String,
    },

    #[error("invalid atom data value for {name}: {reason}")]
    BadDataValue {
        /// Quantity being set (e.g. "mass")
        name: &'static str,
        /// What was wrong with it
        reason: String,
    },
}
