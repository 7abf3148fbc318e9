//! Template backed by a pre-rasterised image.

use std::sync::Arc;

use crate::error::{FilterError, Result};
use crate::sky_image::SkyImage;

use super::validate::finite;
use super::{Template, DENSITY_FLOOR};

/// Shifted lookup into an external image.
///
/// Only the shift `(x0, y0)` is a free parameter; the pixel data travels
/// with the shape descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFilter {
    x0: f64,
    y0: f64,
    source: Arc<SkyImage>,
}

impl ImageFilter {
    /// Parameter names in packing order.
    pub const PARAM_NAMES: &'static [&'static str] = &["x0", "y0"];

    /// Template reading `source` shifted by `(x0, y0)`.
    pub fn new(x0: f64, y0: f64, source: Arc<SkyImage>) -> Result<Self> {
        Ok(Self {
            x0: finite(Self::KIND, "x0", x0)?,
            y0: finite(Self::KIND, "y0", y0)?,
            source,
        })
    }

    /// Rebuild from `[x0, y0]`.
    pub fn from_params(p: &[f64], source: Arc<SkyImage>) -> Result<Self> {
        match *p {
            [x0, y0] => Self::new(x0, y0, source),
            _ => Err(FilterError::ParameterCountMismatch {
                expected: 2,
                got: p.len(),
            }),
        }
    }

    /// Image the template reads from.
    pub fn source(&self) -> &Arc<SkyImage> {
        &self.source
    }
}

impl Template for ImageFilter {
    const KIND: &'static str = "ImageFilter";

    fn evaluate(&self, x: f64, y: f64) -> f64 {
        self.source.interpolate(x - self.x0, y - self.y0) + DENSITY_FLOOR
    }

    fn pack_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&[self.x0, self.y0]);
    }
}
