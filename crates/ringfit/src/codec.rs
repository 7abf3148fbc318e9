//! Parameter codec: lossless conversion between filter trees and flat
//! parameter vectors.
//!
//! A flat vector carries no type information, so unpacking needs a
//! [`FilterShape`] describing the tree. Layout is depth-first: each leaf
//! emits its parameters in declaration order, `Sum` emits left then
//! right, and `Scale` emits its child followed by the weight.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::filter::{
    combine, scale, AsymGaussian, Constant, CosineRing, Disk, EllipticalGaussianRing, Filter,
    FixedTemplate, GaussianRing, GeneralGaussianRing, ImageFilter, LogSpiral,
    SlashedGaussianRing, TIDAGaussianRing,
};
use crate::sky_image::SkyImage;

/// Structure of a filter tree without its numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterShape {
    /// [`GaussianRing`].
    GaussianRing,
    /// [`SlashedGaussianRing`].
    SlashedGaussianRing,
    /// [`EllipticalGaussianRing`].
    EllipticalGaussianRing,
    /// [`TIDAGaussianRing`].
    TIDAGaussianRing,
    /// [`GeneralGaussianRing`].
    GeneralGaussianRing,
    /// [`CosineRing`] with `n` thickness and `m` slash harmonics.
    CosineRing {
        /// Thickness harmonics.
        n: usize,
        /// Slash harmonics.
        m: usize,
    },
    /// [`Disk`].
    Disk,
    /// [`AsymGaussian`].
    AsymGaussian,
    /// [`Constant`].
    Constant,
    /// [`LogSpiral`].
    LogSpiral,
    /// [`ImageFilter`] reading from the attached image.
    #[serde(skip)]
    Image(Arc<SkyImage>),
    /// Sum of two sub-shapes.
    Sum(Box<FilterShape>, Box<FilterShape>),
    /// Scaled sub-shape; adds one weight parameter.
    Scale(Box<FilterShape>),
}

impl FilterShape {
    /// Sum of two shapes.
    pub fn sum(a: FilterShape, b: FilterShape) -> Self {
        Self::Sum(Box::new(a), Box::new(b))
    }

    /// Scaled shape.
    pub fn scaled(child: FilterShape) -> Self {
        Self::Scale(Box::new(child))
    }

    /// Length of the flat parameter vector for this shape.
    pub fn size(&self) -> usize {
        match self {
            Self::GaussianRing => GaussianRing::ARITY,
            Self::SlashedGaussianRing => SlashedGaussianRing::ARITY,
            Self::EllipticalGaussianRing => EllipticalGaussianRing::ARITY,
            Self::TIDAGaussianRing => TIDAGaussianRing::ARITY,
            Self::GeneralGaussianRing => GeneralGaussianRing::ARITY,
            Self::CosineRing { n, m } => CosineRing::arity(*n, *m),
            Self::Disk => Disk::ARITY,
            Self::AsymGaussian => AsymGaussian::ARITY,
            Self::Constant => Constant::ARITY,
            Self::LogSpiral => LogSpiral::ARITY,
            Self::Image(_) => ImageFilter::PARAM_NAMES.len(),
            Self::Sum(a, b) => a.size() + b.size(),
            Self::Scale(f) => f.size() + 1,
        }
    }

    /// Parameter names in packing order.
    ///
    /// Terms of a sum chain are prefixed by their position (`"1.r0"`), a
    /// scale weight is named `"w"`.
    pub fn param_names(&self) -> Vec<String> {
        let leaf = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        match self {
            Self::GaussianRing => leaf(GaussianRing::PARAM_NAMES),
            Self::SlashedGaussianRing => leaf(SlashedGaussianRing::PARAM_NAMES),
            Self::EllipticalGaussianRing => leaf(EllipticalGaussianRing::PARAM_NAMES),
            Self::TIDAGaussianRing => leaf(TIDAGaussianRing::PARAM_NAMES),
            Self::GeneralGaussianRing => leaf(GeneralGaussianRing::PARAM_NAMES),
            Self::CosineRing { n, m } => CosineRing::param_names(*n, *m),
            Self::Disk => leaf(Disk::PARAM_NAMES),
            Self::AsymGaussian => leaf(AsymGaussian::PARAM_NAMES),
            Self::Constant => leaf(Constant::PARAM_NAMES),
            Self::LogSpiral => leaf(LogSpiral::PARAM_NAMES),
            Self::Image(_) => leaf(ImageFilter::PARAM_NAMES),
            Self::Sum(..) => {
                let mut terms = Vec::new();
                self.collect_terms(&mut terms);
                terms
                    .iter()
                    .enumerate()
                    .flat_map(|(i, t)| {
                        t.param_names()
                            .into_iter()
                            .map(move |name| format!("{i}.{name}"))
                    })
                    .collect()
            }
            Self::Scale(f) => {
                let mut names = f.param_names();
                names.push("w".to_string());
                names
            }
        }
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a FilterShape>) {
        match self {
            Self::Sum(a, b) => {
                a.collect_terms(out);
                b.collect_terms(out);
            }
            other => out.push(other),
        }
    }
}

impl fmt::Display for FilterShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CosineRing { n, m } => write!(f, "CosineRing<{n},{m}>"),
            Self::Image(img) => write!(f, "ImageFilter[{}x{}]", img.nx(), img.ny()),
            Self::Sum(a, b) => write!(f, "Sum({a}, {b})"),
            Self::Scale(c) => write!(f, "Scale({c})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Flatten a filter tree into its parameter vector.
pub fn pack(filter: &Filter) -> Vec<f64> {
    let mut out = Vec::with_capacity(filter.size());
    filter.pack_into(&mut out);
    out
}

/// Rebuild a filter tree from `params` laid out according to `shape`.
///
/// Fails with [`FilterError::ParameterCountMismatch`] when the length
/// disagrees with `shape.size()`, and with
/// [`FilterError::InvalidParameter`] when any leaf guard rejects a value.
pub fn unpack(params: &[f64], shape: &FilterShape) -> Result<Filter> {
    let expected = shape.size();
    if params.len() != expected {
        return Err(FilterError::ParameterCountMismatch {
            expected,
            got: params.len(),
        });
    }
    build(params, shape)
}

fn build(p: &[f64], shape: &FilterShape) -> Result<Filter> {
    let filter = match shape {
        FilterShape::GaussianRing => GaussianRing::from_params(p)?.into(),
        FilterShape::SlashedGaussianRing => SlashedGaussianRing::from_params(p)?.into(),
        FilterShape::EllipticalGaussianRing => EllipticalGaussianRing::from_params(p)?.into(),
        FilterShape::TIDAGaussianRing => TIDAGaussianRing::from_params(p)?.into(),
        FilterShape::GeneralGaussianRing => GeneralGaussianRing::from_params(p)?.into(),
        FilterShape::CosineRing { n, m } => CosineRing::from_params(*n, *m, p)?.into(),
        FilterShape::Disk => Disk::from_params(p)?.into(),
        FilterShape::AsymGaussian => AsymGaussian::from_params(p)?.into(),
        FilterShape::Constant => Constant::from_params(p)?.into(),
        FilterShape::LogSpiral => LogSpiral::from_params(p)?.into(),
        FilterShape::Image(src) => ImageFilter::from_params(p, src.clone())?.into(),
        FilterShape::Sum(a, b) => {
            let (pa, pb) = p.split_at(a.size());
            combine(build(pa, a)?, build(pb, b)?)
        }
        FilterShape::Scale(child) => {
            let Some((&w, pc)) = p.split_last() else {
                return Err(FilterError::ParameterCountMismatch {
                    expected: shape.size(),
                    got: 0,
                });
            };
            scale(build(pc, child)?, w)?
        }
    };
    Ok(filter)
}
