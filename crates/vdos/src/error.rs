//! Result and Error types for nxtal-vdos

/// Type alias for `Result<T, vdos::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-vdos` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid density of states: {0}")]
    BadVdos(String),

    #[error("kernel assembly failed")]
    Kernel(#[from] nxtal_sab::Error),
}
