//! Divergence between a candidate filter and a fixed observed image.
//!
//! Both distributions are compared on the image's own pixel grid: the
//! filter is sampled at the image's pixel centres and normalised to unit
//! total before the sum is folded.

use std::sync::Arc;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::codec::{unpack, FilterShape};
use crate::error::{FilterError, Result};
use crate::filter::{Filter, DENSITY_FLOOR};
use crate::raster::sample_on;
use crate::sky_image::SkyImage;

/// Statistical distance used to compare filter and image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    /// Bhattacharyya coefficient `Σ √(F·I)`; 1 at a perfect match.
    #[default]
    Bhattacharyya,
    /// Kullback-Leibler divergence `Σ F ln(F / I)`; 0 at a perfect match.
    KullbackLeibler,
}

/// Divergence context: an observed image, normalised once, plus the
/// shape used to decode flat parameter vectors.
#[derive(Debug, Clone)]
pub struct Divergence {
    kind: DivergenceKind,
    image: Arc<SkyImage>,
    shape: FilterShape,
}

impl Divergence {
    /// Normalise `image` and bind it to `shape`.
    ///
    /// Fails with [`FilterError::DegenerateDistribution`] when the image
    /// has zero total intensity.
    pub fn new(kind: DivergenceKind, image: &SkyImage, shape: FilterShape) -> Result<Self> {
        let image = Arc::new(image.normalized()?);
        tracing::debug!(
            "divergence {:?}: image {}x{}, shape {} ({} params)",
            kind,
            image.nx(),
            image.ny(),
            shape,
            shape.size()
        );
        Ok(Self { kind, image, shape })
    }

    /// Divergence flavour.
    pub fn kind(&self) -> DivergenceKind {
        self.kind
    }

    /// Normalised observed image.
    pub fn image(&self) -> &Arc<SkyImage> {
        &self.image
    }

    /// Shape used by [`Self::objective`].
    pub fn shape(&self) -> &FilterShape {
        &self.shape
    }

    /// Raw divergence value: Bhattacharyya coefficient (higher is better)
    /// or KL divergence (lower is better).
    pub fn score(&self, filter: &Filter) -> Result<f64> {
        let model = normalized_samples(filter, &self.image)?;
        let obs = self.image.values();
        let value = match self.kind {
            DivergenceKind::Bhattacharyya => model
                .iter()
                .zip(obs.iter())
                .map(|(f, i)| (f * i).sqrt())
                .sum(),
            DivergenceKind::KullbackLeibler => model
                .iter()
                .zip(obs.iter())
                .filter(|(f, _)| **f > 0.0)
                .map(|(f, i)| f * (f / (i + DENSITY_FLOOR)).ln())
                .sum(),
        };
        Ok(value)
    }

    /// Minimiser-oriented loss for a flat parameter vector: `−ln Bh` or
    /// `KL`. Both are zero when filter and image coincide.
    ///
    /// A Bhattacharyya coefficient that underflows to zero is reported as
    /// [`FilterError::DegenerateDistribution`], so the loss is always finite.
    pub fn objective(&self, params: &[f64]) -> Result<f64> {
        let filter = unpack(params, &self.shape)?;
        let score = self.score(&filter)?;
        let loss = match self.kind {
            DivergenceKind::Bhattacharyya => bhattacharyya_loss(score)?,
            DivergenceKind::KullbackLeibler => score,
        };
        tracing::trace!("objective {:?} = {loss:.6e}", params);
        Ok(loss)
    }
}

fn bhattacharyya_loss(coefficient: f64) -> Result<f64> {
    if coefficient > 0.0 && coefficient.is_finite() {
        Ok(-coefficient.ln())
    } else {
        Err(FilterError::DegenerateDistribution(format!(
            "Bhattacharyya coefficient {coefficient} has no finite log"
        )))
    }
}

fn normalized_samples(filter: &Filter, grid: &SkyImage) -> Result<DMatrix<f64>> {
    let samples = sample_on(filter, grid);
    if let Some(bad) = samples.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
        return Err(FilterError::DegenerateDistribution(format!(
            "{} produced sample {bad} on the image grid",
            filter.kind()
        )));
    }
    let total = samples.sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(FilterError::DegenerateDistribution(format!(
            "{} total intensity on the image grid is {total}",
            filter.kind()
        )));
    }
    Ok(samples / total)
}
