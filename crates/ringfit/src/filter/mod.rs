//! Filter model: closed-form density templates and their composition.
//!
//! A [`Filter`] is an immutable tree. Leaves are the template kinds
//! re-exported from this module; inner nodes are [`Filter::Sum`] (add two
//! densities) and [`Filter::Scale`] (multiply a density by a relative
//! flux weight). Changing parameters means building a new tree, usually
//! through [`crate::codec::unpack`].

mod blob;
mod cosine;
mod image;
mod ring;
mod spiral;
pub(crate) mod validate;

pub use blob::{AsymGaussian, Constant, Disk};
pub use cosine::CosineRing;
pub use image::ImageFilter;
pub use ring::{
    EllipticalGaussianRing, GaussianRing, GeneralGaussianRing, SlashedGaussianRing,
    TIDAGaussianRing,
};
pub use spiral::LogSpiral;

use crate::codec::FilterShape;
use crate::error::{FilterError, Result};

/// Added to every template density so logarithms never see an exact zero.
pub const DENSITY_FLOOR: f64 = 1e-50;

/// Pointwise density of a leaf template.
pub trait Template {
    /// Kind name used in errors and diagnostics.
    const KIND: &'static str;

    /// Density at `(x, y)`; strictly positive and side-effect free.
    fn evaluate(&self, x: f64, y: f64) -> f64;

    /// Append the parameters in packing order.
    fn pack_into(&self, out: &mut Vec<f64>);
}

/// Templates with a fixed parameter schema.
pub trait FixedTemplate: Template + Sized {
    /// Parameter names in packing order.
    const PARAM_NAMES: &'static [&'static str];

    /// Number of parameters.
    const ARITY: usize = Self::PARAM_NAMES.len();

    /// Validated construction from a flat slice of exactly `ARITY` values.
    fn from_params(p: &[f64]) -> Result<Self>;
}

/// Copy a slice into a fixed-size array, reporting a count mismatch.
pub(crate) fn fixed_params<const N: usize>(p: &[f64]) -> Result<[f64; N]> {
    p.try_into()
        .map_err(|_| FilterError::ParameterCountMismatch {
            expected: N,
            got: p.len(),
        })
}

/// A filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Circular Gaussian ring.
    GaussianRing(GaussianRing),
    /// Circular ring with azimuthal slash.
    SlashedGaussianRing(SlashedGaussianRing),
    /// Elliptical ring.
    EllipticalGaussianRing(EllipticalGaussianRing),
    /// Elliptical ring with slash tied to the asymmetry axes.
    TIDAGaussianRing(TIDAGaussianRing),
    /// Elliptical ring with independent slash orientation.
    GeneralGaussianRing(GeneralGaussianRing),
    /// Ring with cosine-series thickness and slash.
    CosineRing(CosineRing),
    /// Uniform disk with Gaussian edge.
    Disk(Disk),
    /// Elliptical Gaussian blob.
    AsymGaussian(AsymGaussian),
    /// Flat floor.
    Constant(Constant),
    /// Logarithmic spiral arm.
    LogSpiral(LogSpiral),
    /// Shifted external image.
    Image(ImageFilter),
    /// Sum of two densities.
    Sum(Box<Filter>, Box<Filter>),
    /// Density times a non-negative relative weight.
    Scale(Box<Filter>, Weight),
}

/// Relative flux weight of a [`Filter::Scale`] node; finite and `>= 0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Weight(f64);

impl Weight {
    /// Checked weight.
    pub fn new(w: f64) -> Result<Self> {
        validate::non_negative("Scale", "w", w).map(Self)
    }

    /// Raw value.
    pub fn get(self) -> f64 {
        self.0
    }
}

macro_rules! impl_from_leaf {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Filter {
                fn from(leaf: $ty) -> Self {
                    Filter::$variant(leaf)
                }
            }
        )*
    };
}

impl_from_leaf! {
    GaussianRing => GaussianRing,
    SlashedGaussianRing => SlashedGaussianRing,
    EllipticalGaussianRing => EllipticalGaussianRing,
    TIDAGaussianRing => TIDAGaussianRing,
    GeneralGaussianRing => GeneralGaussianRing,
    CosineRing => CosineRing,
    Disk => Disk,
    AsymGaussian => AsymGaussian,
    Constant => Constant,
    LogSpiral => LogSpiral,
    Image => ImageFilter,
}

/// `a + b`: both densities evaluated and added.
pub fn combine(a: impl Into<Filter>, b: impl Into<Filter>) -> Filter {
    Filter::Sum(Box::new(a.into()), Box::new(b.into()))
}

/// `w · f` with `w >= 0`.
pub fn scale(f: impl Into<Filter>, w: f64) -> Result<Filter> {
    Ok(Filter::Scale(Box::new(f.into()), Weight::new(w)?))
}

impl Filter {
    /// Density at `(x, y)`.
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        match self {
            Self::GaussianRing(f) => f.evaluate(x, y),
            Self::SlashedGaussianRing(f) => f.evaluate(x, y),
            Self::EllipticalGaussianRing(f) => f.evaluate(x, y),
            Self::TIDAGaussianRing(f) => f.evaluate(x, y),
            Self::GeneralGaussianRing(f) => f.evaluate(x, y),
            Self::CosineRing(f) => f.evaluate(x, y),
            Self::Disk(f) => f.evaluate(x, y),
            Self::AsymGaussian(f) => f.evaluate(x, y),
            Self::Constant(f) => f.evaluate(x, y),
            Self::LogSpiral(f) => f.evaluate(x, y),
            Self::Image(f) => f.evaluate(x, y),
            Self::Sum(a, b) => a.evaluate(x, y) + b.evaluate(x, y),
            Self::Scale(f, w) => w.get() * f.evaluate(x, y),
        }
    }

    /// Number of free parameters.
    pub fn size(&self) -> usize {
        match self {
            Self::GaussianRing(_) => GaussianRing::ARITY,
            Self::SlashedGaussianRing(_) => SlashedGaussianRing::ARITY,
            Self::EllipticalGaussianRing(_) => EllipticalGaussianRing::ARITY,
            Self::TIDAGaussianRing(_) => TIDAGaussianRing::ARITY,
            Self::GeneralGaussianRing(_) => GeneralGaussianRing::ARITY,
            Self::CosineRing(f) => CosineRing::arity(f.n(), f.m()),
            Self::Disk(_) => Disk::ARITY,
            Self::AsymGaussian(_) => AsymGaussian::ARITY,
            Self::Constant(_) => Constant::ARITY,
            Self::LogSpiral(_) => LogSpiral::ARITY,
            Self::Image(_) => ImageFilter::PARAM_NAMES.len(),
            Self::Sum(a, b) => a.size() + b.size(),
            Self::Scale(f, _) => f.size() + 1,
        }
    }

    /// Kind name of the root node.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GaussianRing(_) => GaussianRing::KIND,
            Self::SlashedGaussianRing(_) => SlashedGaussianRing::KIND,
            Self::EllipticalGaussianRing(_) => EllipticalGaussianRing::KIND,
            Self::TIDAGaussianRing(_) => TIDAGaussianRing::KIND,
            Self::GeneralGaussianRing(_) => GeneralGaussianRing::KIND,
            Self::CosineRing(_) => CosineRing::KIND,
            Self::Disk(_) => Disk::KIND,
            Self::AsymGaussian(_) => AsymGaussian::KIND,
            Self::Constant(_) => Constant::KIND,
            Self::LogSpiral(_) => LogSpiral::KIND,
            Self::Image(_) => ImageFilter::KIND,
            Self::Sum(..) => "Sum",
            Self::Scale(..) => "Scale",
        }
    }

    /// Shape descriptor needed to unpack this tree's parameter vector.
    pub fn shape(&self) -> FilterShape {
        match self {
            Self::GaussianRing(_) => FilterShape::GaussianRing,
            Self::SlashedGaussianRing(_) => FilterShape::SlashedGaussianRing,
            Self::EllipticalGaussianRing(_) => FilterShape::EllipticalGaussianRing,
            Self::TIDAGaussianRing(_) => FilterShape::TIDAGaussianRing,
            Self::GeneralGaussianRing(_) => FilterShape::GeneralGaussianRing,
            Self::CosineRing(f) => FilterShape::CosineRing { n: f.n(), m: f.m() },
            Self::Disk(_) => FilterShape::Disk,
            Self::AsymGaussian(_) => FilterShape::AsymGaussian,
            Self::Constant(_) => FilterShape::Constant,
            Self::LogSpiral(_) => FilterShape::LogSpiral,
            Self::Image(f) => FilterShape::Image(f.source().clone()),
            Self::Sum(a, b) => FilterShape::Sum(Box::new(a.shape()), Box::new(b.shape())),
            Self::Scale(f, _) => FilterShape::Scale(Box::new(f.shape())),
        }
    }

    /// Append this tree's parameters depth-first: leaves in declaration
    /// order, `Sum` left then right, `Scale` child then weight.
    pub fn pack_into(&self, out: &mut Vec<f64>) {
        match self {
            Self::GaussianRing(f) => f.pack_into(out),
            Self::SlashedGaussianRing(f) => f.pack_into(out),
            Self::EllipticalGaussianRing(f) => f.pack_into(out),
            Self::TIDAGaussianRing(f) => f.pack_into(out),
            Self::GeneralGaussianRing(f) => f.pack_into(out),
            Self::CosineRing(f) => f.pack_into(out),
            Self::Disk(f) => f.pack_into(out),
            Self::AsymGaussian(f) => f.pack_into(out),
            Self::Constant(f) => f.pack_into(out),
            Self::LogSpiral(f) => f.pack_into(out),
            Self::Image(f) => f.pack_into(out),
            Self::Sum(a, b) => {
                a.pack_into(out);
                b.pack_into(out);
            }
            Self::Scale(f, w) => {
                f.pack_into(out);
                out.push(w.get());
            }
        }
    }

    /// Flatten a chain of sums into its ordered terms.
    ///
    /// `Scale` nodes are kept whole so each term still carries its weight.
    pub fn split(&self) -> Vec<&Filter> {
        let mut terms = Vec::new();
        self.collect_terms(&mut terms);
        terms
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a Filter>) {
        match self {
            Self::Sum(a, b) => {
                a.collect_terms(out);
                b.collect_terms(out);
            }
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::prelude::*;
    use std::f64::consts::PI;
    use std::sync::Arc;

    use crate::sky_image::SkyImage;

    fn ring() -> GaussianRing {
        GaussianRing::new(20.0, 5.0, 0.0, 0.0).unwrap()
    }

    fn every_leaf() -> Vec<Filter> {
        let src = SkyImage::centered(nalgebra::DMatrix::from_element(8, 8, 0.5), 16.0).unwrap();
        vec![
            ring().into(),
            SlashedGaussianRing::new(15.0, 3.0, 0.4, 0.3, 1.0, -1.0).unwrap().into(),
            EllipticalGaussianRing::new(15.0, 3.0, 0.2, 0.3, 1.0, -1.0).unwrap().into(),
            TIDAGaussianRing::new(15.0, 3.0, 0.2, -0.5, 0.3, 1.0, -1.0).unwrap().into(),
            GeneralGaussianRing::new(15.0, 3.0, 0.2, 0.3, 0.5, 1.1, 1.0, -1.0).unwrap().into(),
            CosineRing::new(
                15.0,
                vec![3.0, 0.5],
                vec![0.2],
                0.1,
                0.4,
                vec![0.3, 0.1],
                vec![0.5, -0.5],
                1.0,
                -1.0,
            )
            .unwrap()
            .into(),
            Disk::new(10.0, 2.0, 0.0, 0.0).unwrap().into(),
            AsymGaussian::new(6.0, 0.3, 0.2, 0.0, 0.0).unwrap().into(),
            Constant.into(),
            LogSpiral::new(8.0, 0.25, 2.0, 3.0, 0.0, 0.0, 0.0).unwrap().into(),
            ImageFilter::new(0.5, 0.5, Arc::new(src)).unwrap().into(),
        ]
    }

    #[test]
    fn all_leaves_are_strictly_positive() {
        let mut rng = StdRng::seed_from_u64(42);
        let far = [(1e4, 1e4), (-1e5, 3.0), (0.0, 0.0), (1e8, -1e8)];
        for leaf in every_leaf() {
            for &(x, y) in &far {
                let v = leaf.evaluate(x, y);
                assert!(v > 0.0 && v.is_finite(), "{}: {v} at ({x}, {y})", leaf.kind());
            }
            for _ in 0..500 {
                let x = rng.gen_range(-80.0..80.0);
                let y = rng.gen_range(-80.0..80.0);
                let v = leaf.evaluate(x, y);
                assert!(v > 0.0 && v.is_finite(), "{}: {v} at ({x}, {y})", leaf.kind());
            }
        }
    }

    #[test]
    fn sum_adds_and_scale_multiplies() {
        let a = ring();
        let b = Disk::new(5.0, 1.0, 3.0, 0.0).unwrap();
        let sum = combine(a, b);
        let scaled = scale(b, 0.25).unwrap();
        for &(x, y) in &[(0.0, 0.0), (20.0, 0.0), (3.0, 7.0)] {
            assert_relative_eq!(sum.evaluate(x, y), a.evaluate(x, y) + b.evaluate(x, y));
            assert_relative_eq!(scaled.evaluate(x, y), 0.25 * b.evaluate(x, y));
        }
    }

    #[test]
    fn sizes_are_additive() {
        let a: Filter = ring().into();
        let b: Filter = CosineRing::new(
            10.0,
            vec![1.0, 0.1],
            vec![0.0],
            0.0,
            0.0,
            vec![0.2],
            vec![0.0],
            0.0,
            0.0,
        )
        .unwrap()
        .into();
        let sum = combine(a.clone(), b.clone());
        assert_eq!(sum.size(), a.size() + b.size());
        let scaled = scale(b.clone(), 2.0).unwrap();
        assert_eq!(scaled.size(), b.size() + 1);
        for leaf in every_leaf() {
            let mut packed = Vec::new();
            leaf.pack_into(&mut packed);
            assert_eq!(packed.len(), leaf.size(), "{}", leaf.kind());
        }
    }

    #[test]
    fn scale_rejects_negative_weight() {
        assert!(scale(ring(), -0.1).is_err());
        assert!(scale(ring(), 0.0).is_ok());
        assert!(Weight::new(f64::NAN).is_err());
        assert!(Weight::new(f64::INFINITY).is_err());
    }

    #[test]
    fn scale_node_built_by_hand_still_carries_a_checked_weight() {
        let w = Weight::new(0.25).unwrap();
        let node = Filter::Scale(Box::new(ring().into()), w);
        assert_eq!(node, scale(ring(), 0.25).unwrap());
        assert_relative_eq!(node.evaluate(20.0, 0.0), 0.25 * ring().evaluate(20.0, 0.0));
        assert!(matches!(
            Weight::new(-1e-3),
            Err(FilterError::InvalidParameter { kind: "Scale", .. })
        ));
    }

    #[test]
    fn split_recovers_terms_in_order() {
        let model = combine(
            combine(ring(), scale(Constant, 0.1).unwrap()),
            AsymGaussian::new(3.0, 0.0, PI, 0.0, 0.0).unwrap(),
        );
        let kinds: Vec<_> = model.split().iter().map(|f| f.kind()).collect();
        assert_eq!(kinds, vec!["GaussianRing", "Scale", "AsymGaussian"]);
    }

    #[test]
    fn pack_layout_for_composites() {
        let model = combine(ring(), scale(Disk::new(4.0, 1.0, 2.0, 3.0).unwrap(), 0.5).unwrap());
        let mut packed = Vec::new();
        model.pack_into(&mut packed);
        assert_eq!(packed, vec![20.0, 5.0, 0.0, 0.0, 4.0, 1.0, 2.0, 3.0, 0.5]);
    }
}
