//! Truncated Gaussian mosaic distribution on the sphere

// crate modules
use crate::error::{Error, Result};
use crate::rng::RngSource;

// nxtal modules
use nxtal_utils::romberg;

use std::f64::consts::PI;

/// FWHM of a Gaussian in units of its sigma
pub(crate) const FWHM_TO_SIGMA: f64 = 2.354820045030949;

/// Mosaic model: a truncated Gaussian distribution of crystallite
/// orientations around the nominal plane normal
///
/// The mosaicity parameter is interpreted as either the FWHM or the sigma
/// of the (untruncated) Gaussian. The truncation radius follows from the
/// requested precision: density beyond it is treated as exactly zero, and
/// the normalization accounts for the clipped tail.
#[derive(Debug, Clone, Copy)]
pub struct GaussMos {
    sigma: f64,
    fwhm: f64,
    trunc_angle: f64,
    cos_trunc: f64,
    norm: f64,
    prec: f64,
}

impl GaussMos {
    /// Create the mosaic model
    ///
    /// `mosaicity` is in radians; `prec` steers both the truncation radius
    /// and the convergence of circle integrals.
    pub fn new(mosaicity: f64, mosaicity_is_fwhm: bool, prec: f64) -> Result<Self> {
        if !(mosaicity > 0.0 && mosaicity <= std::f64::consts::FRAC_PI_2) {
            return Err(Error::BadSetup(format!(
                "mosaicity {mosaicity} outside range (0, pi/2]"
            )));
        }
        if !(1e-7..=1e-1).contains(&prec) {
            return Err(Error::BadSetup(format!(
                "mosaic precision {prec} outside range [1e-7, 1e-1]"
            )));
        }
        let sigma = if mosaicity_is_fwhm {
            mosaicity / FWHM_TO_SIGMA
        } else {
            mosaicity
        };
        let fwhm = sigma * FWHM_TO_SIGMA;

        // truncate where the clipped tail is below the requested precision
        let ntrunc = (-2.0 * prec.ln()).sqrt().max(3.0);
        let trunc_angle = (ntrunc * sigma).min(PI / 2.0);

        // normalize over the sphere: integral of g(x)*2*pi*sin(x) up to the
        // truncation radius is one
        let integral = romberg(
            |x: f64| (-0.5 * x * x / (sigma * sigma)).exp() * 2.0 * PI * x.sin(),
            0.0,
            trunc_angle,
            1e-12,
        );
        Ok(Self {
            sigma,
            fwhm,
            trunc_angle,
            cos_trunc: trunc_angle.cos(),
            norm: 1.0 / integral,
            prec,
        })
    }

    /// Gaussian sigma \[rad\]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Gaussian FWHM \[rad\]
    pub fn fwhm(&self) -> f64 {
        self.fwhm
    }

    /// Truncation radius \[rad\]
    pub fn trunc_angle(&self) -> f64 {
        self.trunc_angle
    }

    /// Cosine of the truncation radius
    pub fn cos_trunc(&self) -> f64 {
        self.cos_trunc
    }

    /// Requested precision
    pub fn precision(&self) -> f64 {
        self.prec
    }

    /// Density per solid angle at an angle from the nominal normal
    pub fn density(&self, angle: f64) -> f64 {
        if angle > self.trunc_angle {
            return 0.0;
        }
        self.norm * (-0.5 * angle * angle / (self.sigma * self.sigma)).exp()
    }

    /// Integral of the density along a circle on the sphere
    ///
    /// The circle sits at polar angle `theta_c` around some axis; the
    /// distribution is centred at polar angle `gamma` from the same axis.
    /// Returns `∮ g(angle(u(φ), centre)) dφ`, converged to the configured
    /// precision. Zero when the circle never enters the truncation cap.
    pub fn circle_integral(
        &self,
        cos_gamma: f64,
        sin_gamma: f64,
        cos_theta_c: f64,
        sin_theta_c: f64,
    ) -> f64 {
        // closest approach between circle and centre
        let cos_closest = cos_theta_c * cos_gamma + sin_theta_c * sin_gamma;
        if cos_closest < self.cos_trunc {
            return 0.0;
        }
        let angle_at = |phi: f64| -> f64 {
            let c = cos_theta_c * cos_gamma + sin_theta_c * sin_gamma * phi.cos();
            c.clamp(-1.0, 1.0).acos()
        };
        // only the arc inside the truncation cap contributes
        let phi_max = {
            let denom = sin_theta_c * sin_gamma;
            if denom.abs() < 1e-300 {
                PI
            } else {
                let cos_phi = (self.cos_trunc - cos_theta_c * cos_gamma) / denom;
                cos_phi.clamp(-1.0, 1.0).acos()
            }
        };
        if !(phi_max > 0.0) {
            return 0.0;
        }

        // refine a symmetric Simpson rule until the change is within prec
        let mut n = 32;
        let mut previous = f64::NAN;
        loop {
            let h = phi_max / n as f64;
            let mut sum = self.density(angle_at(0.0)) + self.density(angle_at(phi_max));
            for i in 1..n {
                let w = if i % 2 == 1 { 4.0 } else { 2.0 };
                sum += w * self.density(angle_at(h * i as f64));
            }
            let estimate = 2.0 * sum * h / 3.0; // both phi signs
            if !previous.is_nan()
                && (estimate - previous).abs() <= self.prec * estimate.abs().max(1e-300)
            {
                return estimate;
            }
            previous = estimate;
            n *= 2;
            if n > 4096 {
                return estimate;
            }
        }
    }

    /// Sample an azimuth on such a circle, weighted by the density
    ///
    /// Rejection sampling on the contributing arc; returns the signed φ.
    pub fn sample_circle_azimuth(
        &self,
        cos_gamma: f64,
        sin_gamma: f64,
        cos_theta_c: f64,
        sin_theta_c: f64,
        rng: &mut dyn RngSource,
    ) -> f64 {
        let angle_at = |phi: f64| -> f64 {
            let c = cos_theta_c * cos_gamma + sin_theta_c * sin_gamma * phi.cos();
            c.clamp(-1.0, 1.0).acos()
        };
        let phi_max = {
            let denom = sin_theta_c * sin_gamma;
            if denom.abs() < 1e-300 {
                PI
            } else {
                let cos_phi = (self.cos_trunc - cos_theta_c * cos_gamma) / denom;
                cos_phi.clamp(-1.0, 1.0).acos()
            }
        };
        let g_max = self.density(angle_at(0.0)).max(1e-300);
        for _ in 0..1000 {
            let phi = (2.0 * rng.generate() - 1.0) * phi_max;
            if rng.generate() * g_max <= self.density(angle_at(phi)) {
                return phi;
            }
        }
        // pathological parameters; the closest-approach point is the mode
        0.0
    }
}
