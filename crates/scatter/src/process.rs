//! The scattering process interface and generic combinators

// crate modules
use crate::error::{Error, Result};
use crate::rng::RngSource;

// external crates
use nalgebra::Vector3;

/// Outcome of one sampled scattering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    /// Outgoing direction (unit vector, lab frame)
    pub direction: Vector3<f64>,
    /// Outgoing kinetic energy \[eV\]
    pub ekin: f64,
}

/// A physics process answering cross-section and sampling queries
///
/// Implementations are immutable in use and shareable across threads; the
/// only mutable state of a sampling call is the caller's generator.
pub trait Scatter: Send + Sync + std::fmt::Debug {
    /// Short identifying name, e.g. for error messages
    fn name(&self) -> &'static str;

    /// Energy domain `(E_low, E_high)` \[eV\]; σ vanishes outside
    fn domain(&self) -> (f64, f64);

    /// Whether the cross section depends on direction
    fn is_oriented(&self) -> bool {
        false
    }

    /// Cross section \[barn\] at the given energy and direction
    fn cross_section(&self, ekin: f64, direction: &Vector3<f64>) -> Result<f64>;

    /// Direction-independent cross section \[barn\] for isotropic processes
    ///
    /// Oriented processes refuse; call [Scatter::cross_section] instead.
    fn cross_section_isotropic(&self, ekin: f64) -> Result<f64> {
        if self.is_oriented() {
            return Err(Error::NotIsotropic(self.name()));
        }
        self.cross_section(ekin, &Vector3::z())
    }

    /// Sample an outgoing direction and energy
    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        rng: &mut dyn RngSource,
    ) -> Result<Outcome>;
}

/// Build an outgoing direction at polar cosine `mu` about `incoming`, with
/// the azimuth drawn uniformly
pub(crate) fn direction_at_mu(
    incoming: &Vector3<f64>,
    mu: f64,
    rng: &mut dyn RngSource,
) -> Vector3<f64> {
    let mu = mu.clamp(-1.0, 1.0);
    let k = incoming.normalize();
    // any unit vector not parallel to k seeds the transverse basis
    let seed = if k.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let t1 = k.cross(&seed).normalize();
    let t2 = k.cross(&t1);
    let phi = 2.0 * std::f64::consts::PI * rng.generate();
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
    k * mu + (t1 * phi.cos() + t2 * phi.sin()) * sin_theta
}

/// The null process: zero cross section, pass-through sampling
#[derive(Debug, Default, Clone, Copy)]
pub struct Sterile;

impl Scatter for Sterile {
    fn name(&self) -> &'static str {
        "sterile"
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    fn cross_section(&self, _ekin: f64, _direction: &Vector3<f64>) -> Result<f64> {
        Ok(0.0)
    }

    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        _rng: &mut dyn RngSource,
    ) -> Result<Outcome> {
        Ok(Outcome {
            direction: *direction,
            ekin,
        })
    }
}

/// Weighted sum of component processes
///
/// The scale factors hold per-component multipliers (e.g. a packing factor
/// on the coherent-elastic parts). Sampling selects a component with
/// probability proportional to its scaled cross section at the incident
/// state.
#[derive(Debug, Default)]
pub struct Composite {
    components: Vec<(f64, Box<dyn Scatter>)>,
}

impl Composite {
    /// Empty composite (always zero cross section)
    pub fn new() -> Self {
        Default::default()
    }

    /// Append a component with a scale factor
    pub fn add(&mut self, scale: f64, process: Box<dyn Scatter>) {
        self.components.push((scale, process));
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether any components are present
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The components and their scales
    pub fn components(&self) -> &[(f64, Box<dyn Scatter>)] {
        &self.components
    }
}

impl Scatter for Composite {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn domain(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = 0.0_f64;
        for (_, p) in &self.components {
            let (plo, phi) = p.domain();
            lo = lo.min(plo);
            hi = hi.max(phi);
        }
        if self.components.is_empty() {
            (0.0, f64::INFINITY)
        } else {
            (lo, hi)
        }
    }

    fn is_oriented(&self) -> bool {
        self.components.iter().any(|(_, p)| p.is_oriented())
    }

    fn cross_section(&self, ekin: f64, direction: &Vector3<f64>) -> Result<f64> {
        let mut total = 0.0;
        for (scale, p) in &self.components {
            total += scale * p.cross_section(ekin, direction)?;
        }
        Ok(total)
    }

    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        rng: &mut dyn RngSource,
    ) -> Result<Outcome> {
        let mut weights = Vec::with_capacity(self.components.len());
        let mut total = 0.0;
        for (scale, p) in &self.components {
            let xs = scale * p.cross_section(ekin, direction)?;
            weights.push(xs);
            total += xs;
        }
        if !(total > 0.0) {
            // nothing can interact here; report a pass-through
            return Ok(Outcome {
                direction: *direction,
                ekin,
            });
        }
        let mut target = rng.generate() * total;
        for (i, (_, p)) in self.components.iter().enumerate() {
            if target < weights[i] || i + 1 == self.components.len() {
                return p.sample_scatter(ekin, direction, rng);
            }
            target -= weights[i];
        }
        unreachable!("component selection always returns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sterile_is_a_no_op() {
        let p = Sterile;
        let dir = Vector3::new(0.0, 0.0, 1.0);
        assert_eq!(p.cross_section(1.0, &dir).unwrap(), 0.0);
        let mut rng = StdRng::seed_from_u64(1);
        let out = p.sample_scatter(0.025, &dir, &mut rng).unwrap();
        assert_eq!(out.direction, dir);
        assert_eq!(out.ekin, 0.025);
    }

    #[test]
    fn direction_at_mu_preserves_angle() {
        let mut rng = StdRng::seed_from_u64(2);
        let k = Vector3::new(0.3, -0.5, 0.9).normalize();
        for mu in [-0.9, -0.2, 0.0, 0.4, 0.99] {
            let out = direction_at_mu(&k, mu, &mut rng);
            assert!((out.norm() - 1.0).abs() < 1e-12);
            assert!((out.dot(&k) - mu).abs() < 1e-12);
        }
    }

    #[test]
    fn composite_sums_components() {
        #[derive(Debug)]
        struct Flat(f64);
        impl Scatter for Flat {
            fn name(&self) -> &'static str {
                "flat"
            }
            fn domain(&self) -> (f64, f64) {
                (0.0, f64::INFINITY)
            }
            fn cross_section(&self, _: f64, _: &Vector3<f64>) -> Result<f64> {
                Ok(self.0)
            }
            fn sample_scatter(
                &self,
                ekin: f64,
                direction: &Vector3<f64>,
                _: &mut dyn RngSource,
            ) -> Result<Outcome> {
                Ok(Outcome {
                    direction: *direction,
                    ekin: ekin * self.0,
                })
            }
        }

        let mut c = Composite::new();
        c.add(1.0, Box::new(Flat(2.0)));
        c.add(0.5, Box::new(Flat(4.0)));
        let dir = Vector3::z();
        assert_eq!(c.cross_section(1.0, &dir).unwrap(), 4.0);

        // selection frequencies follow the weights (2.0 vs 2.0 here)
        let mut rng = StdRng::seed_from_u64(3);
        let mut first = 0;
        for _ in 0..2000 {
            let out = c.sample_scatter(1.0, &dir, &mut rng).unwrap();
            if out.ekin == 2.0 {
                first += 1;
            }
        }
        assert!((800..1200).contains(&first), "picked first {first} times");
    }
}
