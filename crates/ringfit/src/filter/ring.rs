//! Gaussian ring templates: circular, slashed, elliptical, and the two
//! slashed-elliptical variants.

use std::f64::consts::FRAC_PI_2;

use crate::error::Result;
use crate::geometry::{ellipse_sq_distance, rotate, wrap_angle, EllipseDistanceConfig};

use super::validate::{asymmetry, finite, positive, signed_unit_interval, unit_interval};
use super::{fixed_params, FixedTemplate, Template, DENSITY_FLOOR};

/// Semi-axes `(a, b)` of a ring of radius `r0` with asymmetry `tau`.
#[inline]
pub(crate) fn ring_semi_axes(r0: f64, tau: f64) -> (f64, f64) {
    let k = (1.0 - tau).sqrt();
    (r0 / k, r0 * k)
}

/// Squared distance to a rotated ellipse plus the point in the ellipse frame.
#[inline]
pub(crate) fn elliptical_offset(dx: f64, dy: f64, semi: (f64, f64), xi: f64) -> (f64, f64, f64) {
    let (xr, yr) = rotate(dx, dy, xi);
    let d2 = ellipse_sq_distance(xr, yr, semi.0, semi.1, &EllipseDistanceConfig::STANDARD);
    (d2, xr, yr)
}

/// Slash envelope `(1 − s cos φ)/(1 + |s|)` with `φ` already in the slash frame.
#[inline]
fn slash(s: f64, phi: f64) -> f64 {
    (1.0 - s * phi.cos()) / (1.0 + s.abs())
}

/// Circular ring with a Gaussian radial profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianRing {
    r0: f64,
    sigma: f64,
    x0: f64,
    y0: f64,
}

impl GaussianRing {
    /// Ring of radius `r0` and thickness `sigma` centred on `(x0, y0)`.
    pub fn new(r0: f64, sigma: f64, x0: f64, y0: f64) -> Result<Self> {
        Ok(Self {
            r0: positive(Self::KIND, "r0", r0)?,
            sigma: positive(Self::KIND, "sigma", sigma)?,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
        })
    }

    /// Ring radius.
    pub fn r0(&self) -> f64 {
        self.r0
    }

    /// Gaussian thickness.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Ring centre.
    pub fn center(&self) -> [f64; 2] {
        [self.x0, self.y0]
    }
}

impl Template for GaussianRing {
    const KIND: &'static str = "GaussianRing";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let r = (x - self.x0).hypot(y - self.y0);
        let dr = r - self.r0;
        (-dr * dr / (2.0 * self.sigma * self.sigma)).exp() + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[self.r0, self.sigma, self.x0, self.y0]);
    }
}

impl FixedTemplate for GaussianRing {
    const PARAM_NAMES: &'static [&'static str] = &["r0", "sigma", "x0", "y0"];

    fn from_params(p: &[f64]) -> Result<Self> {
        let [r0, sigma, x0, y0]: [f64; 4] = fixed_params(p)?;
        Self::new(r0, sigma, x0, y0)
    }
}

/// Circular ring with a first-order azimuthal brightness gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlashedGaussianRing {
    r0: f64,
    sigma: f64,
    s: f64,
    xi: f64,
    x0: f64,
    y0: f64,
}

impl SlashedGaussianRing {
    /// `s` in `[0, 1]` is the slash strength, `xi` its position angle.
    pub fn new(r0: f64, sigma: f64, s: f64, xi: f64, x0: f64, y0: f64) -> Result<Self> {
        Ok(Self {
            r0: positive(Self::KIND, "r0", r0)?,
            sigma: positive(Self::KIND, "sigma", sigma)?,
            s: unit_interval(Self::KIND, "s", s)?,
            xi: finite(Self::KIND, "xi", xi)?,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
        })
    }
}

impl Template for SlashedGaussianRing {
    const KIND: &'static str = "SlashedGaussianRing";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let (xr, yr) = rotate(x - self.x0, y - self.y0, self.xi);
        let dr = xr.hypot(yr) - self.r0;
        let n = slash(self.s, yr.atan2(xr));
        n * (-dr * dr / (2.0 * self.sigma * self.sigma)).exp() + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[self.r0, self.sigma, self.s, self.xi, self.x0, self.y0]);
    }
}

impl FixedTemplate for SlashedGaussianRing {
    const PARAM_NAMES: &'static [&'static str] = &["r0", "sigma", "s", "xi", "x0", "y0"];

    fn from_params(p: &[f64]) -> Result<Self> {
        let [r0, sigma, s, xi, x0, y0]: [f64; 6] = fixed_params(p)?;
        Self::new(r0, sigma, s, xi, x0, y0)
    }
}

/// Elliptical ring with constant Gaussian thickness.
///
/// The profile is a Gaussian in the distance to the ellipse, which has no
/// closed-form normalisation for `tau > 0`; normalisation happens on the
/// pixel grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticalGaussianRing {
    r0: f64,
    sigma: f64,
    tau: f64,
    xi: f64,
    x0: f64,
    y0: f64,
    semi: (f64, f64),
}

impl EllipticalGaussianRing {
    /// Semi-axes are `r0/√(1−τ)` and `r0·√(1−τ)`; `xi` orients the major axis.
    pub fn new(r0: f64, sigma: f64, tau: f64, xi: f64, x0: f64, y0: f64) -> Result<Self> {
        let r0 = positive(Self::KIND, "r0", r0)?;
        let tau = asymmetry(Self::KIND, "tau", tau)?;
        Ok(Self {
            r0,
            sigma: positive(Self::KIND, "sigma", sigma)?,
            tau,
            xi: finite(Self::KIND, "xi", xi)?,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
            semi: ring_semi_axes(r0, tau),
        })
    }

    /// Semi-major and semi-minor axes.
    pub fn semi_axes(&self) -> (f64, f64) {
        self.semi
    }
}

impl Template for EllipticalGaussianRing {
    const KIND: &'static str = "EllipticalGaussianRing";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let (d2, _, _) = elliptical_offset(x - self.x0, y - self.y0, self.semi, self.xi);
        (-d2 / (2.0 * self.sigma * self.sigma)).exp() + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[self.r0, self.sigma, self.tau, self.xi, self.x0, self.y0]);
    }
}

impl FixedTemplate for EllipticalGaussianRing {
    const PARAM_NAMES: &'static [&'static str] = &["r0", "sigma", "tau", "xi", "x0", "y0"];

    fn from_params(p: &[f64]) -> Result<Self> {
        let [r0, sigma, tau, xi, x0, y0]: [f64; 6] = fixed_params(p)?;
        Self::new(r0, sigma, tau, xi, x0, y0)
    }
}

/// Elliptical ring whose slash is tied to the asymmetry axes.
///
/// `s >= 0` puts the slash along the major axis; `s < 0` puts it along
/// the minor axis with strength `|s|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TIDAGaussianRing {
    r0: f64,
    sigma: f64,
    tau: f64,
    s: f64,
    xi: f64,
    x0: f64,
    y0: f64,
    semi: (f64, f64),
}

impl TIDAGaussianRing {
    /// Build a ring with shared ellipse/slash orientation `xi`.
    pub fn new(
        r0: f64,
        sigma: f64,
        tau: f64,
        s: f64,
        xi: f64,
        x0: f64,
        y0: f64,
    ) -> Result<Self> {
        let r0 = positive(Self::KIND, "r0", r0)?;
        let tau = asymmetry(Self::KIND, "tau", tau)?;
        Ok(Self {
            r0,
            sigma: positive(Self::KIND, "sigma", sigma)?,
            tau,
            s: signed_unit_interval(Self::KIND, "s", s)?,
            xi: finite(Self::KIND, "xi", xi)?,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
            semi: ring_semi_axes(r0, tau),
        })
    }
}

impl Template for TIDAGaussianRing {
    const KIND: &'static str = "TIDAGaussianRing";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let (d2, xr, yr) = elliptical_offset(x - self.x0, y - self.y0, self.semi, self.xi);
        let phi = yr.atan2(xr);
        let n = if self.s >= 0.0 {
            slash(self.s, phi)
        } else {
            slash(-self.s, wrap_angle(phi - FRAC_PI_2))
        };
        n * (-d2 / (2.0 * self.sigma * self.sigma)).exp() + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[
            self.r0, self.sigma, self.tau, self.s, self.xi, self.x0, self.y0,
        ]);
    }
}

impl FixedTemplate for TIDAGaussianRing {
    const PARAM_NAMES: &'static [&'static str] = &["r0", "sigma", "tau", "s", "xi", "x0", "y0"];

    fn from_params(p: &[f64]) -> Result<Self> {
        let [r0, sigma, tau, s, xi, x0, y0]: [f64; 7] = fixed_params(p)?;
        Self::new(r0, sigma, tau, s, xi, x0, y0)
    }
}

/// Elliptical slashed ring with independent ellipse and slash orientations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralGaussianRing {
    r0: f64,
    sigma: f64,
    tau: f64,
    xi_tau: f64,
    s: f64,
    xi_s: f64,
    x0: f64,
    y0: f64,
    semi: (f64, f64),
}

impl GeneralGaussianRing {
    /// `xi_tau` orients the major axis, `xi_s` the slash.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        r0: f64,
        sigma: f64,
        tau: f64,
        xi_tau: f64,
        s: f64,
        xi_s: f64,
        x0: f64,
        y0: f64,
    ) -> Result<Self> {
        let r0 = positive(Self::KIND, "r0", r0)?;
        let tau = asymmetry(Self::KIND, "tau", tau)?;
        Ok(Self {
            r0,
            sigma: positive(Self::KIND, "sigma", sigma)?,
            tau,
            xi_tau: finite(Self::KIND, "xi_tau", xi_tau)?,
            s: unit_interval(Self::KIND, "s", s)?,
            xi_s: finite(Self::KIND, "xi_s", xi_s)?,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
            semi: ring_semi_axes(r0, tau),
        })
    }
}

impl Template for GeneralGaussianRing {
    const KIND: &'static str = "GeneralGaussianRing";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x0;
        let dy = y - self.y0;
        let (d2, _, _) = elliptical_offset(dx, dy, self.semi, self.xi_tau);
        let (xs, ys) = rotate(dx, dy, self.xi_s);
        let n = slash(self.s, ys.atan2(xs));
        n * (-d2 / (2.0 * self.sigma * self.sigma)).exp() + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[
            self.r0,
            self.sigma,
            self.tau,
            self.xi_tau,
            self.s,
            self.xi_s,
            self.x0,
            self.y0,
        ]);
    }
}

impl FixedTemplate for GeneralGaussianRing {
    const PARAM_NAMES: &'static [&'static str] =
        &["r0", "sigma", "tau", "xi_tau", "s", "xi_s", "x0", "y0"];

    fn from_params(p: &[f64]) -> Result<Self> {
        let [r0, sigma, tau, xi_tau, s, xi_s, x0, y0]: [f64; 8] = fixed_params(p)?;
        Self::new(r0, sigma, tau, xi_tau, s, xi_s, x0, y0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn gaussian_ring_peak_and_centre_values() {
        let ring = GaussianRing::new(20.0, 5.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(ring.evaluate(20.0, 0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(ring.evaluate(0.0, 0.0), (-8.0f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(ring.evaluate(0.0, 0.0), 3.3546e-4, max_relative = 1e-4);
    }

    #[test]
    fn gaussian_ring_rejects_negative_radius() {
        let err = GaussianRing::new(-1.0, 5.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            FilterError::InvalidParameter { kind: "GaussianRing", ref field, .. } if field == "r0"
        ));
    }

    #[test]
    fn elliptical_ring_with_zero_tau_is_circular() {
        let circ = GaussianRing::new(15.0, 3.0, 2.0, -1.0).unwrap();
        let ell = EllipticalGaussianRing::new(15.0, 3.0, 0.0, 0.8, 2.0, -1.0).unwrap();
        for &(x, y) in &[(0.0, 0.0), (17.0, -1.0), (5.0, 12.0), (-30.0, 40.0)] {
            assert_relative_eq!(ell.evaluate(x, y), circ.evaluate(x, y), max_relative = 1e-6);
        }
    }

    #[test]
    fn elliptical_ring_peaks_on_semi_axes() {
        let ring = EllipticalGaussianRing::new(20.0, 2.0, 0.36, std::f64::consts::PI, 0.0, 0.0)
            .unwrap();
        let (a, b) = ring.semi_axes();
        assert_relative_eq!(a, 25.0, epsilon = 1e-12);
        assert_relative_eq!(b, 16.0, epsilon = 1e-12);
        // xi = π leaves the frame unrotated, so the major axis lies along x.
        assert_relative_eq!(ring.evaluate(25.0, 0.0), 1.0, epsilon = 1e-9);
        assert_relative_eq!(ring.evaluate(0.0, -16.0), 1.0, epsilon = 1e-9);
        assert!(ring.evaluate(20.0, 0.0) < 0.1);
    }

    #[test]
    fn slash_modulates_opposite_sides() {
        let ring = SlashedGaussianRing::new(10.0, 2.0, 0.5, std::f64::consts::PI, 0.0, 0.0)
            .unwrap();
        let bright = ring.evaluate(-10.0, 0.0);
        let dim = ring.evaluate(10.0, 0.0);
        assert_relative_eq!(bright, 1.0, epsilon = 1e-12);
        assert_relative_eq!(dim, 0.5 / 1.5, epsilon = 1e-12);
    }

    #[test]
    fn zero_slash_matches_plain_ring() {
        let plain = GaussianRing::new(10.0, 2.0, 1.0, 1.0).unwrap();
        let slashed = SlashedGaussianRing::new(10.0, 2.0, 0.0, 0.3, 1.0, 1.0).unwrap();
        for &(x, y) in &[(11.0, 1.0), (-4.0, 6.0), (0.0, 0.0)] {
            assert_relative_eq!(slashed.evaluate(x, y), plain.evaluate(x, y), epsilon = 1e-15);
        }
    }

    #[test]
    fn tida_sign_rotates_slash_by_quarter_turn() {
        let pi = std::f64::consts::PI;
        let aligned = TIDAGaussianRing::new(10.0, 2.0, 0.0, 0.6, pi, 0.0, 0.0).unwrap();
        let anti = TIDAGaussianRing::new(10.0, 2.0, 0.0, -0.6, pi, 0.0, 0.0).unwrap();
        // Aligned: brightest at φ = π (negative x).
        assert_relative_eq!(aligned.evaluate(-10.0, 0.0), 1.0, epsilon = 1e-9);
        // Anti-aligned: brightest at φ = −π/2 (negative y).
        assert_relative_eq!(anti.evaluate(0.0, -10.0), 1.0, epsilon = 1e-9);
        assert_relative_eq!(anti.evaluate(0.0, 10.0), 0.4 / 1.6, epsilon = 1e-9);
        assert_relative_eq!(anti.evaluate(-10.0, 0.0), anti.evaluate(10.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn general_ring_reduces_to_tida_when_axes_coincide() {
        let tida = TIDAGaussianRing::new(12.0, 3.0, 0.2, 0.4, 0.7, 1.0, -2.0).unwrap();
        let general = GeneralGaussianRing::new(12.0, 3.0, 0.2, 0.7, 0.4, 0.7, 1.0, -2.0).unwrap();
        for &(x, y) in &[(13.0, -2.0), (0.0, 9.0), (-8.0, -8.0), (40.0, 3.0)] {
            assert_abs_diff_eq!(general.evaluate(x, y), tida.evaluate(x, y), epsilon = 1e-12);
        }
    }

    #[test]
    fn guards_reject_out_of_range_shape_parameters() {
        assert!(SlashedGaussianRing::new(10.0, 1.0, 1.2, 0.0, 0.0, 0.0).is_err());
        assert!(EllipticalGaussianRing::new(10.0, 1.0, 1.0, 0.0, 0.0, 0.0).is_err());
        assert!(TIDAGaussianRing::new(10.0, 1.0, 0.1, -1.1, 0.0, 0.0, 0.0).is_err());
        assert!(GeneralGaussianRing::new(10.0, 0.0, 0.1, 0.0, 0.1, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn from_params_checks_length() {
        assert!(matches!(
            GaussianRing::from_params(&[1.0, 2.0, 3.0]),
            Err(FilterError::ParameterCountMismatch { expected: 4, got: 3 })
        ));
    }
}
