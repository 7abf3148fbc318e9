//! Geometric kernels shared by the ring templates.
//!
//! Angles follow the sky convention: a position angle `ξ` is measured
//! north of east, so every template frame is obtained by rotating the
//! offset from the template centre by `π − ξ`.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use serde::{Deserialize, Serialize};

/// Iteration controls for [`ellipse_sq_distance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseDistanceConfig {
    /// Stop when the nearest-point estimate moves less than this between
    /// two iterations (same units as the semi-axes).
    pub eps: f64,
    /// Hard cap on refinement steps.
    pub max_iter: usize,
}

impl EllipseDistanceConfig {
    /// Tolerance and iteration cap used by the ring templates.
    pub const STANDARD: Self = Self {
        eps: 1e-6,
        max_iter: 10,
    };
}

impl Default for EllipseDistanceConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Rotate `(x, y)` by `π − ξ`.
#[inline]
pub fn rotate(x: f64, y: f64, xi: f64) -> (f64, f64) {
    let (s, c) = (PI - xi).sin_cos();
    (c * x - s * y, s * x + c * y)
}

/// Wrap an angle into `(−π, π]`.
#[inline]
pub fn wrap_angle(phi: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut w = phi.rem_euclid(two_pi);
    if w > PI {
        w -= two_pi;
    }
    w
}

/// Squared distance from `(x, y)` to the axis-aligned ellipse centred at
/// the origin with semi-axes `a` (along x) and `b` (along y).
///
/// Works in the first quadrant and refines a unit-circle parameter
/// `(tx, ty)` by projecting through the local centre of curvature on the
/// evolute. Each step clamps the parameter to `[0, 1]` and renormalises
/// it. Running out of iterations is not an error; the last estimate is
/// returned.
pub fn ellipse_sq_distance(x: f64, y: f64, a: f64, b: f64, cfg: &EllipseDistanceConfig) -> f64 {
    let px = x.abs();
    let py = y.abs();
    if px == 0.0 && py == 0.0 {
        let m = a.min(b);
        return m * m;
    }

    let c2 = a * a - b * b;
    let mut tx = FRAC_1_SQRT_2;
    let mut ty = FRAC_1_SQRT_2;

    for _ in 0..cfg.max_iter {
        let ex = c2 * tx * tx * tx / a;
        let ey = -c2 * ty * ty * ty / b;

        let rx = a * tx - ex;
        let ry = b * ty - ey;
        let qx = px - ex;
        let qy = py - ey;
        let r = rx.hypot(ry);
        let q = qx.hypot(qy);
        if q <= f64::MIN_POSITIVE {
            // Query point coincides with the centre of curvature.
            break;
        }

        let nx = ((qx * r / q + ex) / a).clamp(0.0, 1.0);
        let ny = ((qy * r / q + ey) / b).clamp(0.0, 1.0);
        let t = nx.hypot(ny);
        if t <= f64::MIN_POSITIVE {
            break;
        }
        let nx = nx / t;
        let ny = ny / t;

        let step = (a * (nx - tx)).hypot(b * (ny - ty));
        tx = nx;
        ty = ny;
        if step < cfg.eps {
            break;
        }
    }

    let dx = a * tx - px;
    let dy = b * ty - py;
    dx * dx + dy * dy
}
