//! Elliptical ring with cosine-series thickness and slash.

use crate::error::{FilterError, Result};

use super::ring::{elliptical_offset, ring_semi_axes};
use super::validate::{asymmetry, finite, positive, slash_budget};
use super::{Template, DENSITY_FLOOR};

/// Added to `2σ(φ)²` so the exponent stays finite where the thickness
/// series crosses zero.
const THICKNESS_STABILIZER: f64 = 1e-2;

/// Ring whose thickness and brightness vary azimuthally as truncated
/// cosine series.
///
/// With `N` thickness harmonics and `M` slash harmonics:
///
/// ```text
/// σ(φ) = σ₀ + Σₖ σₖ cos(k(φ − ξσₖ))      k = 1..N
/// n(φ) = 1 − Σₘ sₘ cos(m(φ − ξsₘ))       m = 1..M
/// ```
///
/// Parameters pack as
/// `r0, σ₀..σ_N, ξσ₁..ξσ_N, τ, ξτ, s₁..s_M, ξs₁..ξs_M, x0, y0`.
#[derive(Debug, Clone, PartialEq)]
pub struct CosineRing {
    r0: f64,
    sigma: Vec<f64>,
    xi_sigma: Vec<f64>,
    tau: f64,
    xi_tau: f64,
    s: Vec<f64>,
    xi_s: Vec<f64>,
    x0: f64,
    y0: f64,
    semi: (f64, f64),
}

impl CosineRing {
    /// Number of parameters for `N` thickness and `M` slash harmonics.
    pub const fn arity(n: usize, m: usize) -> usize {
        5 + (n + 1) + n + 2 * m
    }

    /// Build a ring; `sigma` carries `N + 1` coefficients, `xi_sigma`
    /// carries `N` angles and `s`/`xi_s` carry `M` entries each.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        r0: f64,
        sigma: Vec<f64>,
        xi_sigma: Vec<f64>,
        tau: f64,
        xi_tau: f64,
        s: Vec<f64>,
        xi_s: Vec<f64>,
        x0: f64,
        y0: f64,
    ) -> Result<Self> {
        let Some(&sigma0) = sigma.first() else {
            return Err(FilterError::ParameterCountMismatch {
                expected: 1,
                got: 0,
            });
        };
        if xi_sigma.len() + 1 != sigma.len() {
            return Err(FilterError::ParameterCountMismatch {
                expected: sigma.len() - 1,
                got: xi_sigma.len(),
            });
        }
        if xi_s.len() != s.len() {
            return Err(FilterError::ParameterCountMismatch {
                expected: s.len(),
                got: xi_s.len(),
            });
        }

        let r0 = positive(Self::KIND, "r0", r0)?;
        positive(Self::KIND, "sigma[0]", sigma0)?;
        for (k, &v) in sigma.iter().enumerate().skip(1) {
            finite(Self::KIND, &format!("sigma[{k}]"), v)?;
        }
        for (k, &v) in xi_sigma.iter().enumerate() {
            finite(Self::KIND, &format!("xi_sigma[{k}]"), v)?;
        }
        let tau = asymmetry(Self::KIND, "tau", tau)?;
        slash_budget(Self::KIND, "s", &s)?;
        for (k, &v) in xi_s.iter().enumerate() {
            finite(Self::KIND, &format!("xi_s[{k}]"), v)?;
        }

        Ok(Self {
            r0,
            sigma,
            xi_sigma,
            tau,
            xi_tau: finite(Self::KIND, "xi_tau", xi_tau)?,
            s,
            xi_s,
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
            semi: ring_semi_axes(r0, tau),
        })
    }

    /// Rebuild from a flat vector laid out as described on the type.
    pub fn from_params(n: usize, m: usize, p: &[f64]) -> Result<Self> {
        let expected = Self::arity(n, m);
        if p.len() != expected {
            return Err(FilterError::ParameterCountMismatch {
                expected,
                got: p.len(),
            });
        }
        let mut rest = p;
        let mut take = |k: usize| {
            let (head, tail) = rest.split_at(k);
            rest = tail;
            head.to_vec()
        };
        let r0 = take(1)[0];
        let sigma = take(n + 1);
        let xi_sigma = take(n);
        let tau = take(1)[0];
        let xi_tau = take(1)[0];
        let s = take(m);
        let xi_s = take(m);
        let center = take(2);
        Self::new(r0, sigma, xi_sigma, tau, xi_tau, s, xi_s, center[0], center[1])
    }

    /// Parameter names in packing order.
    pub fn param_names(n: usize, m: usize) -> Vec<String> {
        let mut names = Vec::with_capacity(Self::arity(n, m));
        names.push("r0".to_string());
        names.extend((0..=n).map(|k| format!("sigma[{k}]")));
        names.extend((0..n).map(|k| format!("xi_sigma[{k}]")));
        names.push("tau".to_string());
        names.push("xi_tau".to_string());
        names.extend((0..m).map(|k| format!("s[{k}]")));
        names.extend((0..m).map(|k| format!("xi_s[{k}]")));
        names.push("x0".to_string());
        names.push("y0".to_string());
        names
    }

    /// Number of thickness harmonics `N`.
    pub fn n(&self) -> usize {
        self.xi_sigma.len()
    }

    /// Number of slash harmonics `M`.
    pub fn m(&self) -> usize {
        self.s.len()
    }

    fn thickness(&self, phi: f64) -> f64 {
        let harmonics: f64 = self.sigma[1..]
            .iter()
            .zip(&self.xi_sigma)
            .enumerate()
            .map(|(k, (sk, xk))| sk * ((k + 1) as f64 * (phi - xk)).cos())
            .sum();
        self.sigma[0] + harmonics
    }

    fn envelope(&self, phi: f64) -> f64 {
        let harmonics: f64 = self
            .s
            .iter()
            .zip(&self.xi_s)
            .enumerate()
            .map(|(k, (sk, xk))| sk * ((k + 1) as f64 * (phi - xk)).cos())
            .sum();
        1.0 - harmonics
    }
}

impl Template for CosineRing {
    const KIND: &'static str = "CosineRing";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        let (d2, xr, yr) = elliptical_offset(x - self.x0, y - self.y0, self.semi, self.xi_tau);
        let phi = yr.atan2(xr);
        let sigma = self.thickness(phi);
        let n = self.envelope(phi).max(0.0);
        n * (-d2 / (2.0 * sigma * sigma + THICKNESS_STABILIZER)).exp() + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.push(self.r0);
        out.extend_from_slice(&self.sigma);
        out.extend_from_slice(&self.xi_sigma);
        out.push(self.tau);
        out.push(self.xi_tau);
        out.extend_from_slice(&self.s);
        out.extend_from_slice(&self.xi_s);
        out.push(self.x0);
        out.push(self.y0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::EllipticalGaussianRing;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn sample_ring() -> CosineRing {
        CosineRing::new(
            18.0,
            vec![4.0, 1.0, -0.5],
            vec![0.3, -1.2],
            0.15,
            0.4,
            vec![0.4, 0.2, 0.1],
            vec![1.0, 2.0, -0.5],
            1.5,
            -2.0,
        )
        .unwrap()
    }

    #[test]
    fn arity_formula() {
        assert_eq!(CosineRing::arity(0, 0), 6);
        assert_eq!(CosineRing::arity(1, 0), 8);
        assert_eq!(CosineRing::arity(2, 3), 16);
        let ring = sample_ring();
        let mut packed = Vec::new();
        ring.pack_into(&mut packed);
        assert_eq!(packed.len(), CosineRing::arity(ring.n(), ring.m()));
        assert_eq!(CosineRing::param_names(2, 3).len(), 16);
    }

    #[test]
    fn from_params_inverts_pack() {
        let ring = sample_ring();
        let mut packed = Vec::new();
        ring.pack_into(&mut packed);
        let rebuilt = CosineRing::from_params(2, 3, &packed).unwrap();
        assert_eq!(rebuilt, ring);
    }

    #[test]
    fn zero_harmonics_match_elliptical_ring() {
        let (r0, sigma, tau, xi, x0, y0) = (20.0, 5.0, 0.25, 0.6, 3.0, -4.0);
        let cosine = CosineRing::new(r0, vec![sigma], vec![], tau, xi, vec![], vec![], x0, y0)
            .unwrap();
        let ell = EllipticalGaussianRing::new(r0, sigma, tau, xi, x0, y0).unwrap();
        for i in 0..36 {
            let t = 2.0 * PI * i as f64 / 36.0;
            for &rad in &[10.0, 18.0, 22.0, 30.0] {
                let (x, y) = (x0 + rad * t.cos(), y0 + rad * t.sin());
                assert_relative_eq!(
                    cosine.evaluate(x, y),
                    ell.evaluate(x, y),
                    max_relative = 1e-3
                );
            }
        }
    }

    #[test]
    fn slash_harmonics_change_brightness_around_ring() {
        let ring = CosineRing::new(
            10.0,
            vec![2.0],
            vec![],
            0.0,
            PI,
            vec![0.5],
            vec![0.0],
            0.0,
            0.0,
        )
        .unwrap();
        // Unrotated frame: n(0) = 0.5, n(π) = 1.5.
        assert!(ring.evaluate(-10.0, 0.0) > 2.5 * ring.evaluate(10.0, 0.0));
    }

    #[test]
    fn thickness_crossing_zero_stays_finite() {
        let ring = CosineRing::new(
            10.0,
            vec![1.0, 1.0],
            vec![0.0],
            0.0,
            PI,
            vec![],
            vec![],
            0.0,
            0.0,
        )
        .unwrap();
        // σ(π) = 0 exactly on the negative x axis.
        let v = ring.evaluate(-12.0, 0.0);
        assert!(v.is_finite() && v > 0.0);
    }

    #[test]
    fn rejects_inconsistent_lengths_and_excess_slash() {
        assert!(CosineRing::new(10.0, vec![], vec![], 0.0, 0.0, vec![], vec![], 0.0, 0.0).is_err());
        assert!(
            CosineRing::new(10.0, vec![1.0, 0.1], vec![], 0.0, 0.0, vec![], vec![], 0.0, 0.0)
                .is_err()
        );
        assert!(CosineRing::new(
            10.0,
            vec![1.0],
            vec![],
            0.0,
            0.0,
            vec![0.8, 0.3],
            vec![0.0, 0.0],
            0.0,
            0.0
        )
        .is_err());
        assert!(CosineRing::from_params(1, 1, &[1.0; 5]).is_err());
    }
}
