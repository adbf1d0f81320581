//! Inelastic scattering on a free gas

// crate modules
use crate::error::{Error, Result};
use crate::process::{direction_at_mu, Outcome, Scatter};
use crate::rng::RngSource;

// external crates
use nalgebra::Vector3;

// nxtal modules
use nxtal_utils::{erf, BOLTZMANN, NEUTRON_MASS_AMU};

use std::f64::consts::PI;

/// Ideal-gas inelastic scattering
///
/// The effective cross section for a constant free cross section on a
/// Maxwellian gas of mass ratio A at temperature T is the classic Doppler
/// average
///
/// `σ(E) = σ_free·[ (1 + 1/(2Ax²))·erf(x√A) + e^(−Ax²)/(x√(πA)) ]`, x² = E/kT,
///
/// which tends to σ_free at high energy and to the 1/v law at low energy.
/// Sampling uses the classical target-velocity algorithm: a target speed is
/// drawn from the Maxwellian biased by the relative speed, the collision is
/// isotropic in the centre of mass, and the outgoing state is transformed
/// back to the lab.
#[derive(Debug, Clone, Copy)]
pub struct FreeGas {
    temperature: f64,
    mass_amu: f64,
    free_xs: f64,
}

impl FreeGas {
    /// From temperature \[K\], target mass \[amu\] and the free cross
    /// section \[barn\]
    pub fn new(temperature: f64, mass_amu: f64, free_xs: f64) -> Result<Self> {
        if !(temperature > 0.0) || !(mass_amu > 0.0) || !(free_xs >= 0.0) {
            return Err(Error::BadSetup(format!(
                "free gas needs positive temperature/mass and non-negative cross \
                 section (got T={temperature}, M={mass_amu}, xs={free_xs})"
            )));
        }
        Ok(Self {
            temperature,
            mass_amu,
            free_xs,
        })
    }

    fn mass_ratio(&self) -> f64 {
        self.mass_amu / NEUTRON_MASS_AMU
    }

    fn kt(&self) -> f64 {
        BOLTZMANN * self.temperature
    }
}

impl Scatter for FreeGas {
    fn name(&self) -> &'static str {
        "freegas"
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    fn cross_section(&self, ekin: f64, _direction: &Vector3<f64>) -> Result<f64> {
        if !(ekin > 0.0) {
            return Ok(0.0);
        }
        let a = self.mass_ratio();
        let xsq = ekin / self.kt();
        let x = xsq.sqrt();
        let sqrt_a = a.sqrt();
        let value = (1.0 + 1.0 / (2.0 * a * xsq)) * erf(x * sqrt_a)
            + (-a * xsq).exp() / (x * (PI * a).sqrt());
        Ok(self.free_xs * value)
    }

    fn sample_scatter(
        &self,
        ekin: f64,
        direction: &Vector3<f64>,
        rng: &mut dyn RngSource,
    ) -> Result<Outcome> {
        let a = self.mass_ratio();
        let kt = self.kt();
        // neutron speed in Maxwellian speed units sqrt(2kT/M_target)
        let y = (a * ekin / kt).sqrt();

        // target speed z (same units) and angle cosine mu_t, from the
        // relative-speed-biased Maxwellian
        let (z, mu_t) = loop {
            let z = if rng.generate() * ((PI).sqrt() * y + 2.0) < (PI).sqrt() * y {
                // density ~ z^2 exp(-z^2)
                let (u1, u2) = (rng.generate(), rng.generate());
                let u3 = rng.generate();
                (-(u1.ln()) - u2.ln() * (0.5 * PI * u3).cos().powi(2)).sqrt()
            } else {
                // density ~ z^3 exp(-z^2)
                let (u1, u2) = (rng.generate(), rng.generate());
                (-(u1 * u2).ln()).sqrt()
            };
            let mu_t = 2.0 * rng.generate() - 1.0;
            let rel = (y * y + z * z - 2.0 * y * z * mu_t).max(0.0).sqrt();
            if rng.generate() * (y + z) <= rel {
                break (z, mu_t);
            }
        };

        // velocities in lab units where the neutron speed is v_n
        let v_n = (2.0 * ekin / NEUTRON_MASS_AMU).sqrt(); // arbitrary consistent units
        let unit_speed = v_n / y.max(1e-300);
        let k = direction.normalize();
        let v_neutron = k * v_n;
        let v_target = direction_at_mu(&k, mu_t, rng) * (z * unit_speed);

        // centre of mass transform, isotropic CM scattering
        let v_cm = (v_neutron + v_target * a) / (1.0 + a);
        let v_rel = v_neutron - v_cm;
        let speed_rel = v_rel.norm();
        let mu_cm = 2.0 * rng.generate() - 1.0;
        let new_rel = direction_at_mu(&v_rel.normalize(), mu_cm, rng) * speed_rel;
        let v_out = v_cm + new_rel;

        let speed_out = v_out.norm();
        let ekin_out = 0.5 * NEUTRON_MASS_AMU * speed_out * speed_out;
        Ok(Outcome {
            direction: v_out / speed_out,
            ekin: ekin_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn analytic_limits() {
        let gas = FreeGas::new(293.15, 4.0026, 0.76).unwrap();
        let dir = Vector3::z();
        // high energy: the free value
        let high = gas.cross_section(10.0, &dir).unwrap();
        assert!((high - 0.76).abs() < 1e-3 * 0.76, "high-E xs {high}");
        // low energy: 1/v behaviour, xs ~ 1/sqrt(E)
        let a = gas.cross_section(1e-6, &dir).unwrap();
        let b = gas.cross_section(4e-6, &dir).unwrap();
        assert!((a / b - 2.0).abs() < 1e-2, "1/v ratio {}", a / b);
    }

    #[test]
    fn helium_at_standard_conditions() {
        // scenario: He free gas, sigma_free from the bound value of 1.34 b
        let bound = 1.34;
        let a = 4.0026 / NEUTRON_MASS_AMU;
        let free = bound * (a / (a + 1.0)).powi(2);
        let gas = FreeGas::new(293.15, 4.0026, free).unwrap();
        let xs = gas.cross_section(0.025, &Vector3::z()).unwrap();
        // the Doppler average at thermal energies is a few percent above
        // the free value
        assert!(xs > free && xs < 1.3 * free, "xs = {xs}");
    }

    #[test]
    fn sampling_thermalizes_on_average() {
        // epithermal neutrons on a room-temperature gas lose energy
        let gas = FreeGas::new(293.15, 4.0026, 0.76).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let dir = Vector3::z();
        let e0 = 1.0; // eV, far above kT
        let mut mean_out = 0.0;
        let n = 2000;
        for _ in 0..n {
            let out = gas.sample_scatter(e0, &dir, &mut rng).unwrap();
            assert!(out.ekin > 0.0);
            assert!((out.direction.norm() - 1.0).abs() < 1e-9);
            mean_out += out.ekin;
        }
        mean_out /= n as f64;
        // elastic scattering on A=4: mean energy after one collision is
        // (1+alpha)/2 with alpha=((A-1)/(A+1))^2, about 0.68*E0
        assert!(
            (mean_out - 0.68).abs() < 0.05,
            "mean outgoing energy {mean_out}"
        );
    }

    #[test]
    fn cold_neutrons_gain_energy_on_average() {
        let gas = FreeGas::new(293.15, 4.0026, 0.76).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let dir = Vector3::z();
        let e0 = 1e-4; // far below kT
        let mut gained = 0;
        let n = 500;
        for _ in 0..n {
            let out = gas.sample_scatter(e0, &dir, &mut rng).unwrap();
            if out.ekin > e0 {
                gained += 1;
            }
        }
        assert!(gained > n * 8 / 10, "only {gained}/{n} upscattered");
    }
}
