//! Result and Error types for nxtal-sab

/// Type alias for `Result<T, sab::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-sab` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid scattering kernel: {0}")]
    BadKernel(String),

    #[error("problem unscaling S(alpha,beta) at S_scaled={s_scaled} and beta={beta}: \
             requires evaluation of exp({arg}) which is infinity at double precision. \
             Most likely this indicates a problem with the input data")]
    UnscaleOverflow {
        /// Scaled table value at the offending point
        s_scaled: f64,
        /// β grid value at the offending point
        beta: f64,
        /// The combined exponential argument
        arg: f64,
    },

    #[error("support for kernels in S(q,w) format is planned, but not yet implemented")]
    SqwNotImplemented,
}
