//! Filled templates: disk, elliptical Gaussian blob, and a flat floor.

use crate::error::Result;
use crate::geometry::rotate;

use super::ring::ring_semi_axes;
use super::validate::{asymmetry, finite, positive};
use super::{fixed_params, FixedTemplate, Template, DENSITY_FLOOR};

/// Uniform disk of radius `r0` with a Gaussian edge of width `alpha`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disk {
    r0: f64,
    alpha: f64,
    x0: f64,
    y0: f64,
}

impl Disk {
    /// Disk centred on `(x0, y0)`.
    pub fn new(r0: f64, alpha: f64, x0: f64, y0: f64) -> Result<Self> {
        Ok(Self {
            r0: positive(Self::KIND, "r0", r0)?,
            alpha: positive(Self::KIND, "alpha", alpha)?,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
        })
    }
}

impl Template for Disk {
    const KIND: &'static str = "Disk";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let r = (x - self.x0).hypot(y - self.y0);
        if r < self.r0 {
            1.0 + DENSITY_FLOOR
        } else {
            let dr = r - self.r0;
            (-dr * dr / (2.0 * self.alpha * self.alpha)).exp() + DENSITY_FLOOR
        }
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[self.r0, self.alpha, self.x0, self.y0]);
    }
}

impl FixedTemplate for Disk {
    const PARAM_NAMES: &'static [&'static str] = &["r0", "alpha", "x0", "y0"];

    fn from_params(p: &[f64]) -> Result<Self> {
        let [r0, alpha, x0, y0]: [f64; 4] = fixed_params(p)?;
        Self::new(r0, alpha, x0, y0)
    }
}

/// Elliptical Gaussian blob with `σx = σ/√(1−τ)` and `σy = σ·√(1−τ)`
/// in the frame rotated by `xi`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsymGaussian {
    sigma: f64,
    tau: f64,
    xi: f64,
    x0: f64,
    y0: f64,
    axes: (f64, f64),
}

impl AsymGaussian {
    /// Blob of width `sigma`, asymmetry `tau` and orientation `xi`.
    pub fn new(sigma: f64, tau: f64, xi: f64, x0: f64, y0: f64) -> Result<Self> {
        let sigma = positive(Self::KIND, "sigma", sigma)?;
        let tau = asymmetry(Self::KIND, "tau", tau)?;
        Ok(Self {
            sigma,
            tau,
            xi: finite(Self::KIND, "xi", xi)?,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
            axes: ring_semi_axes(sigma, tau),
        })
    }
}

impl Template for AsymGaussian {
    const KIND: &'static str = "AsymGaussian";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let (xr, yr) = rotate(x - self.x0, y - self.y0, self.xi);
        let (sx, sy) = self.axes;
        (-0.5 * (xr * xr / (sx * sx) + yr * yr / (sy * sy))).exp() + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[self.sigma, self.tau, self.xi, self.x0, self.y0]);
    }
}

impl FixedTemplate for AsymGaussian {
    const PARAM_NAMES: &'static [&'static str] = &["sigma", "tau", "xi", "x0", "y0"];

    fn from_params(p: &[f64]) -> Result<Self> {
        let [sigma, tau, xi, x0, y0]: [f64; 5] = fixed_params(p)?;
        Self::new(sigma, tau, xi, x0, y0)
    }
}

/// Flat unit density, used as a uniform background floor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Constant;

impl Template for Constant {
    const KIND: &'static str = "Constant";

    fn evaluate(&self, _x: f64, _y: f64) -> f64 {
        1.0
    }

    fn pack_into(&self, _out: &mut Vec<f64>) {}
}

impl FixedTemplate for Constant {
    const PARAM_NAMES: &'static [&'static str] = &[];

    fn from_params(p: &[f64]) -> Result<Self> {
        fixed_params::<0>(p)?;
        Ok(Self)
    }
}
