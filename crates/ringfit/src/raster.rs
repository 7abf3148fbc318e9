//! Raster evaluation of filters on sky-convention pixel grids.

use nalgebra::DMatrix;

use crate::error::Result;
use crate::filter::Filter;
use crate::sky_image::SkyImage;

/// Centres of `n` equal pixels spanning `range = [min, max]`.
///
/// With `descending` the first centre sits next to `max` (sky x axis),
/// otherwise next to `min`.
pub fn pixel_centers(n: usize, range: [f64; 2], descending: bool) -> Vec<f64> {
    let [lo, hi] = range;
    let step = (hi - lo) / n as f64;
    (0..n)
        .map(|k| {
            let offset = (k as f64 + 0.5) * step;
            if descending {
                hi - offset
            } else {
                lo + offset
            }
        })
        .collect()
}

/// Evaluate `filter` on an `npix × npix` grid covering `x_range × y_range`.
///
/// The result uses the same orientation as any other [`SkyImage`], so it
/// can be fed back as an observation or exported directly.
pub fn rasterize(filter: &Filter, npix: usize, x_range: [f64; 2], y_range: [f64; 2]) -> Result<SkyImage> {
    let xs = pixel_centers(npix, x_range, true);
    let ys = pixel_centers(npix, y_range, false);
    let values = DMatrix::from_fn(ys.len(), xs.len(), |i, j| filter.evaluate(xs[j], ys[i]));
    SkyImage::from_ranges(values, x_range, y_range)
}

/// Evaluate `filter` at the pixel centres of `grid`.
pub fn sample_on(filter: &Filter, grid: &SkyImage) -> DMatrix<f64> {
    let xs = grid.x_centers();
    let ys = grid.y_centers();
    DMatrix::from_fn(ys.len(), xs.len(), |i, j| filter.evaluate(xs[j], ys[i]))
}
