//! Result and Error types for nxtal-info

/// Type alias for `Result<T, info::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-info` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid material data: {0}")]
    BadInput(String),

    #[error("required information absent: {0}")]
    MissingInfo(String),

    #[error("atom data lookup failed")]
    Atom(#[from] nxtal_atomdb::Error),

    #[error("scattering kernel problem")]
    Kernel(#[from] nxtal_sab::Error),

    #[error("density of states problem")]
    Vdos(#[from] nxtal_vdos::Error),
}

impl Error {
    pub(crate) fn bad(reason: impl Into<String>) -> Self {
        Error::BadInput(reason.into())
    }

    pub(crate) fn missing(reason: impl Into<String>) -> Self {
        Error::MissingInfo(reason.into())
    }
}
