//! Shared synthetic images for unit tests.

use crate::filter::{Filter, GaussianRing};
use crate::raster::rasterize;
use crate::sky_image::SkyImage;

pub(crate) const TRUTH_NPIX: usize = 64;
pub(crate) const TRUTH_RANGE: [f64; 2] = [-60.0, 60.0];

/// `GaussianRing(r0 = 20, σ = 5)` at the origin.
pub(crate) fn truth_ring() -> GaussianRing {
    GaussianRing::new(20.0, 5.0, 0.0, 0.0).expect("valid ring")
}

/// Render `filter` on the standard 64×64 grid over `[-60, 60]²`.
pub(crate) fn render(filter: &Filter) -> SkyImage {
    rasterize(filter, TRUTH_NPIX, TRUTH_RANGE, TRUTH_RANGE).expect("renderable filter")
}

/// [`truth_ring`] rendered by [`render`].
pub(crate) fn gaussian_ring_image() -> SkyImage {
    render(&truth_ring().into())
}
