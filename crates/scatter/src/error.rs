//! Result and Error types for nxtal-scatter

/// Type alias for `Result<T, scatter::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-scatter` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("process \"{0}\" is oriented; query it with an explicit direction")]
    NotIsotropic(&'static str),

    #[error("invalid process setup: {0}")]
    BadSetup(String),

    #[error("calculation failed: {0}")]
    CalcError(String),

    #[error("material model problem")]
    Material(#[from] nxtal_info::Error),

    #[error("scattering kernel problem")]
    Kernel(#[from] nxtal_sab::Error),

    #[error("density of states problem")]
    Vdos(#[from] nxtal_vdos::Error),
}
