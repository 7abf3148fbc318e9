//! Logarithmic spiral arm template.

use std::f64::consts::TAU;

use crate::error::Result;
use crate::geometry::rotate;

use super::validate::{finite, positive};
use super::{fixed_params, FixedTemplate, Template, DENSITY_FLOOR};

/// Branches `ϑ = φ + 2πk` searched for the nearest arm, `k ∈ [−W, W]`.
const MAX_WINDINGS: i32 = 3;

/// One logarithmic spiral arm `ρ(ϑ) = r0·exp(κϑ)` with Gaussian cross
/// section `sigma` and a Gaussian taper of width `delta_phi` in winding
/// angle, oriented by `xi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogSpiral {
    r0: f64,
    kappa: f64,
    sigma: f64,
    delta_phi: f64,
    xi: f64,
    x0: f64,
    y0: f64,
}

impl LogSpiral {
    /// `kappa` is the growth rate per radian; negative values wind inwards.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        r0: f64,
        kappa: f64,
        sigma: f64,
        delta_phi: f64,
        xi: f64,
        x0: f64,
        y0: f64,
    ) -> Result<Self> {
        Ok(Self {
            r0: positive(Self::KIND, "r0", r0)?,
            kappa: finite(Self::KIND, "kappa", kappa)?,
            sigma: positive(Self::KIND, "sigma", sigma)?,
            delta_phi: positive(Self::KIND, "delta_phi", delta_phi)?,
            xi: finite(Self::KIND, "xi", xi)?,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
        })
    }

    /// Perpendicular distance to the nearest branch and its winding angle.
    fn nearest_branch(&self, rho: f64, phi: f64) -> (f64, f64) {
        let norm = (1.0 + self.kappa * self.kappa).sqrt();
        (-MAX_WINDINGS..=MAX_WINDINGS)
            .map(|k| {
                let theta = phi + TAU * k as f64;
                let arm = self.r0 * (self.kappa * theta).exp();
                ((rho - arm).abs() / norm, theta)
            })
            .fold((f64::INFINITY, 0.0), |best, cand| {
                if cand.0 < best.0 {
                    cand
                } else {
                    best
                }
            })
    }
}

impl Template for LogSpiral {
    const KIND: &'static str = "LogSpiral";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let (xr, yr) = rotate(x - self.x0, y - self.y0, self.xi);
        let (d, theta) = self.nearest_branch(xr.hypot(yr), yr.atan2(xr));
        let radial = -d * d / (2.0 * self.sigma * self.sigma);
        let taper = -theta * theta / (2.0 * self.delta_phi * self.delta_phi);
        (radial + taper).exp() + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[
            self.r0,
            self.kappa,
            self.sigma,
            self.delta_phi,
            self.xi,
            self.x0,
            self.y0,
        ]);
    }
}

impl FixedTemplate for LogSpiral {
    const PARAM_NAMES: &'static [&'static str] =
        &["r0", "kappa", "sigma", "delta_phi", "xi", "x0", "y0"];

    fn from_params(p: &[f64]) -> Result<Self> {
        let [r0, kappa, sigma, delta_phi, xi, x0, y0]: [f64; 7] = fixed_params(p)?;
        Self::new(r0, kappa, sigma, delta_phi, xi, x0, y0)
    }
}
