//! Result and Error types for the utils module

/// Type alias for `Result<T, utils::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, PartialEq)]
/// The error type for `nxtal_utils`
pub enum Error {
    /// An empty slice of floats for GridExt
    SliceContainsNoValues,

    /// The slice of float values contains things like NAN or INFINITY
    SliceContainsUndefinedValues,

    /// Grid values must be finite and strictly increasing
    NotAGrid,

    /// Value that is searched for outside of the min/max of the array
    ValueOutsideOfBounds {
        /// The requested value
        value: f64,
        /// Lowest grid point
        lower_bound: f64,
        /// Highest grid point
        upper_bound: f64,
    },

    /// For when a slice has fewer than the minimum required values
    BelowMinimumSliceLength {
        /// Actual number of entries
        length: usize,
        /// Number of entries needed
        minimum_required: usize,
    },
}

// error boilerplate
impl core::fmt::Display for Error {
    fn fmt(&self, fmt: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// implement standard error trait to use with ? operator
impl std::error::Error for Error {}
