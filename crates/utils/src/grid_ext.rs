use crate::error::{Error, Result};

/// Extends functionality for slices of floats used as 1D grids
pub trait GridExt {
    /// Find the minimum value in float arrays
    ///
    /// Only provides the minimum value from a collection of valid numbers. Any
    /// NAN values or empty slices will return an error.
    ///
    /// ```rust
    /// # use nxtal_utils::GridExt;
    /// # use nxtal_utils::Error;
    /// assert_eq!([1.1, 0.5, 2.2].try_min(), Ok(0.5));
    /// assert_eq!(
    ///     [1.1, f64::NAN, 2.2].try_min(),
    ///     Err(Error::SliceContainsUndefinedValues)
    /// );
    /// ```
    ///
    /// The float primitives do not implement `Ord` due to `NaN` being
    /// incomparable, so `min()` on a float collection is not available in the
    /// standard library. This extension uses `total_cmp` once the values are
    /// known to be defined.
    fn try_min(&self) -> Result<f64>;

    /// Find the maximum value in float arrays
    ///
    /// The counterpart of [GridExt::try_min], with the same error conditions.
    fn try_max(&self) -> Result<f64>;

    /// True if the slice is a proper grid: at least two entries, all finite,
    /// strictly increasing
    ///
    /// ```rust
    /// # use nxtal_utils::GridExt;
    /// assert!([0.0, 0.5, 2.0].is_grid());
    /// assert!(![0.0, 0.5, 0.5].is_grid());
    /// assert!(![0.0].is_grid());
    /// ```
    fn is_grid(&self) -> bool;

    /// Index `i` of the interval `[self[i], self[i+1])` containing `value`
    ///
    /// A value equal to the last grid point is considered part of the last
    /// interval. Values outside the grid return `None`.
    ///
    /// ```rust
    /// # use nxtal_utils::GridExt;
    /// let grid = [0.0, 1.0, 2.5, 4.0];
    /// assert_eq!(grid.find_interval(0.5), Some(0));
    /// assert_eq!(grid.find_interval(2.5), Some(2));
    /// assert_eq!(grid.find_interval(4.0), Some(2));
    /// assert_eq!(grid.find_interval(5.0), None);
    /// ```
    fn find_interval(&self, value: f64) -> Option<usize>;
}

impl GridExt for [f64] {
    fn try_min(&self) -> Result<f64> {
        if self.is_empty() {
            return Err(Error::SliceContainsNoValues);
        }
        if self.iter().any(|v| v.is_nan()) {
            return Err(Error::SliceContainsUndefinedValues);
        }
        Ok(self.iter().copied().fold(f64::INFINITY, f64::min))
    }

    fn try_max(&self) -> Result<f64> {
        if self.is_empty() {
            return Err(Error::SliceContainsNoValues);
        }
        if self.iter().any(|v| v.is_nan()) {
            return Err(Error::SliceContainsUndefinedValues);
        }
        Ok(self.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    fn is_grid(&self) -> bool {
        self.len() >= 2
            && self.iter().all(|v| v.is_finite())
            && self.windows(2).all(|w| w[0] < w[1])
    }

    fn find_interval(&self, value: f64) -> Option<usize> {
        if self.len() < 2 || value < self[0] || value > self[self.len() - 1] {
            return None;
        }
        // partition_point gives the first index with grid value > `value`
        let idx = self.partition_point(|v| *v <= value);
        Some(idx.saturating_sub(1).min(self.len() - 2))
    }
}
