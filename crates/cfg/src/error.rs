//! Result and Error types for nxtal-cfg

/// Type alias for `Result<T, cfg::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-cfg` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to resolve data source")]
    Source(#[from] nxtal_textsrc::Error),

    #[error("invalid configuration: {0}")]
    BadInput(String),

    #[error("value for parameter \"{0}\" not available")]
    MissingInfo(&'static str),

    #[error("modification of configuration object whose access is being monitored is forbidden")]
    AccessLocked,
}

impl Error {
    pub(crate) fn bad(reason: impl Into<String>) -> Self {
        Error::BadInput(reason.into())
    }
}
