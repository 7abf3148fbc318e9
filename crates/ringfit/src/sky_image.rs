//! Intensity grid with sky-convention pixel geometry.
//!
//! Rows run bottom to top (y increasing with row index), columns run
//! left to right with x *decreasing* (east to the left, as on the sky).
//! The grid covers `x_range × y_range` with square or rectangular pixels
//! of size `width / ncols` by `height / nrows`; samples sit at pixel
//! centres.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::raster::pixel_centers;

/// Non-negative intensity samples on a regular sky grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SkyImageSpec", into = "SkyImageSpec")]
pub struct SkyImage {
    values: DMatrix<f64>,
    x_range: [f64; 2],
    y_range: [f64; 2],
}

/// Serialized form: row-major rows, bottom row first.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SkyImageSpec {
    x_range: [f64; 2],
    y_range: [f64; 2],
    rows: Vec<Vec<f64>>,
}

impl TryFrom<SkyImageSpec> for SkyImage {
    type Error = FilterError;

    fn try_from(spec: SkyImageSpec) -> Result<Self> {
        let ny = spec.rows.len();
        let nx = spec.rows.first().map_or(0, Vec::len);
        if let Some(bad) = spec.rows.iter().position(|r| r.len() != nx) {
            return Err(FilterError::InvalidImage(format!(
                "row {bad} has {} samples, expected {nx}",
                spec.rows[bad].len()
            )));
        }
        let values = DMatrix::from_fn(ny, nx, |i, j| spec.rows[i][j]);
        Self::from_ranges(values, spec.x_range, spec.y_range)
    }
}

impl From<SkyImage> for SkyImageSpec {
    fn from(img: SkyImage) -> Self {
        let rows = img
            .values
            .row_iter()
            .map(|r| r.iter().copied().collect())
            .collect();
        Self {
            x_range: img.x_range,
            y_range: img.y_range,
            rows,
        }
    }
}

fn check_range(name: &str, r: [f64; 2]) -> Result<()> {
    if r[0].is_finite() && r[1].is_finite() && r[0] < r[1] {
        Ok(())
    } else {
        Err(FilterError::InvalidImage(format!(
            "{name} must be finite and increasing, got [{}, {}]",
            r[0], r[1]
        )))
    }
}

impl SkyImage {
    /// Wrap `values` (`nrows = ny`, `ncols = nx`) covering the given ranges.
    pub fn from_ranges(values: DMatrix<f64>, x_range: [f64; 2], y_range: [f64; 2]) -> Result<Self> {
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(FilterError::InvalidImage("empty grid".to_string()));
        }
        check_range("x_range", x_range)?;
        check_range("y_range", y_range)?;
        if let Some(v) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(FilterError::InvalidImage(format!(
                "samples must be finite and non-negative, found {v}"
            )));
        }
        Ok(Self {
            values,
            x_range,
            y_range,
        })
    }

    /// Square grid centred on the origin with field of view `fov` per side.
    pub fn centered(values: DMatrix<f64>, fov: f64) -> Result<Self> {
        let half = 0.5 * fov;
        Self::from_ranges(values, [-half, half], [-half, half])
    }

    /// Samples, `nrows = ny` by `ncols = nx`.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Number of columns.
    pub fn nx(&self) -> usize {
        self.values.ncols()
    }

    /// Number of rows.
    pub fn ny(&self) -> usize {
        self.values.nrows()
    }

    /// Physical x extent `[min, max]`.
    pub fn x_range(&self) -> [f64; 2] {
        self.x_range
    }

    /// Physical y extent `[min, max]`.
    pub fn y_range(&self) -> [f64; 2] {
        self.y_range
    }

    /// Pixel width.
    pub fn psize_x(&self) -> f64 {
        (self.x_range[1] - self.x_range[0]) / self.nx() as f64
    }

    /// Pixel height.
    pub fn psize_y(&self) -> f64 {
        (self.y_range[1] - self.y_range[0]) / self.ny() as f64
    }

    /// Field of view `(width, height)`.
    pub fn fov(&self) -> (f64, f64) {
        (
            self.x_range[1] - self.x_range[0],
            self.y_range[1] - self.y_range[0],
        )
    }

    /// Column centres, decreasing left to right.
    pub fn x_centers(&self) -> Vec<f64> {
        pixel_centers(self.nx(), self.x_range, true)
    }

    /// Row centres, increasing bottom to top.
    pub fn y_centers(&self) -> Vec<f64> {
        pixel_centers(self.ny(), self.y_range, false)
    }

    /// Sum of all samples.
    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// Copy rescaled to unit total.
    pub fn normalized(&self) -> Result<Self> {
        let total = self.total();
        if !(total.is_finite() && total > 0.0) {
            return Err(FilterError::DegenerateDistribution(format!(
                "image total intensity is {total}"
            )));
        }
        Ok(Self {
            values: &self.values / total,
            x_range: self.x_range,
            y_range: self.y_range,
        })
    }

    /// Bilinear interpolation between pixel centres.
    ///
    /// Points outside the field of view read as zero; points inside the
    /// outer half-pixel border take the nearest edge value.
    pub fn interpolate(&self, x: f64, y: f64) -> f64 {
        let [x_min, x_max] = self.x_range;
        let [y_min, y_max] = self.y_range;
        if !(x >= x_min && x <= x_max && y >= y_min && y <= y_max) {
            return 0.0;
        }
        let nx = self.nx();
        let ny = self.ny();
        let fj = ((x_max - x) / self.psize_x() - 0.5).clamp(0.0, (nx - 1) as f64);
        let fi = ((y - y_min) / self.psize_y() - 0.5).clamp(0.0, (ny - 1) as f64);

        let j0 = fj.floor() as usize;
        let i0 = fi.floor() as usize;
        let j1 = (j0 + 1).min(nx - 1);
        let i1 = (i0 + 1).min(ny - 1);
        let tj = fj - j0 as f64;
        let ti = fi - i0 as f64;

        let v = &self.values;
        let bottom = v[(i0, j0)] * (1.0 - tj) + v[(i0, j1)] * tj;
        let top = v[(i1, j0)] * (1.0 - tj) + v[(i1, j1)] * tj;
        bottom * (1.0 - ti) + top * ti
    }
}
