//! JSON configuration for filters and extraction runs.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::{pack, unpack, FilterShape};
use crate::divergence::{Divergence, DivergenceKind};
use crate::error::Result;
use crate::extract::ExtractionContext;
use crate::filter::Filter;
use crate::sky_image::SkyImage;

/// A filter written as its shape plus flat parameters.
///
/// ```json
/// { "shape": "GaussianRing", "params": [20.0, 5.0, 0.0, 0.0] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Tree structure.
    pub shape: FilterShape,
    /// Parameters in packing order.
    pub params: Vec<f64>,
}

impl FilterSpec {
    /// Spec describing an existing filter.
    pub fn from_filter(filter: &Filter) -> Self {
        Self {
            shape: filter.shape(),
            params: pack(filter),
        }
    }

    /// Validated filter.
    pub fn build(&self) -> Result<Filter> {
        unpack(&self.params, &self.shape)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

/// Everything needed to set up an extraction against an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSpec {
    /// Divergence flavour.
    #[serde(default)]
    pub divergence: DivergenceKind,
    /// Shape of the searched filter.
    pub shape: FilterShape,
    /// Lower bounds in packing order.
    pub lower: Vec<f64>,
    /// Upper bounds in packing order.
    pub upper: Vec<f64>,
    /// Initial guess in packing order.
    pub initial: Vec<f64>,
}

impl ExtractionSpec {
    /// Load from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Bind the config to an observed image.
    pub fn into_context(self, image: &SkyImage) -> Result<ExtractionContext> {
        let divergence = Divergence::new(self.divergence, image, self.shape)?;
        ExtractionContext::new(divergence, self.lower, self.upper, self.initial)
    }
}
