//! The abstract uniform random source consumed by sampling calls

/// Source of uniform random numbers in (0,1)
///
/// Generators are supplied by the caller per sampling call, so processes
/// have no hidden random state. Any [rand::Rng] works directly:
///
/// ```rust
/// # use nxtal_scatter::RngSource;
/// # use rand::rngs::StdRng;
/// # use rand::SeedableRng;
/// let mut rng = StdRng::seed_from_u64(7);
/// let u = (&mut rng as &mut dyn RngSource).generate();
/// assert!((0.0..1.0).contains(&u));
/// ```
pub trait RngSource {
    /// Next uniform value in (0,1)
    fn generate(&mut self) -> f64;
}

impl<T: rand::Rng> RngSource for T {
    fn generate(&mut self) -> f64 {
        // reject exact zero so callers can take logarithms safely
        loop {
            let u: f64 = self.gen();
            if u > 0.0 {
                return u;
            }
        }
    }
}
