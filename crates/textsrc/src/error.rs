//! Result and Error types for nxtal-textsrc

/// Type alias for `Result<T, textsrc::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-textsrc` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("could not resolve text source \"{0}\"")]
    FileNotFound(String),
}
