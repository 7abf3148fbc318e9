//! ringfit: closed-form ring and blob templates fitted to images by
//! divergence minimisation.
//!
//! The building blocks are:
//!
//! 1. **Geometry** – rotation convention, angle wrapping and the squared
//!    distance to an axis-aligned ellipse.
//! 2. **Filters** – strictly positive density templates (Gaussian rings,
//!    slashed and elliptical variants, cosine-series rings, disks, blobs,
//!    spirals, image lookups) composed with [`combine`] and [`scale`].
//! 3. **Codec** – lossless [`pack`]/[`unpack`] between filter trees and
//!    flat parameter vectors, keyed by a [`FilterShape`].
//! 4. **Raster** – evaluation on sky-convention pixel grids.
//! 5. **Divergence** – Bhattacharyya or Kullback-Leibler comparison of a
//!    filter against a fixed normalised [`SkyImage`].
//! 6. **Extraction** – validated search box and objective handed to any
//!    external [`Optimizer`].
//!
//! ```no_run
//! use ringfit::{rasterize, Divergence, DivergenceKind, ExtractionContext, FilterShape, GaussianRing};
//!
//! # fn main() -> ringfit::Result<()> {
//! let truth = GaussianRing::new(20.0, 5.0, 0.0, 0.0)?;
//! let image = rasterize(&truth.into(), 64, [-60.0, 60.0], [-60.0, 60.0])?;
//! let div = Divergence::new(DivergenceKind::Bhattacharyya, &image, FilterShape::GaussianRing)?;
//! let ctx = ExtractionContext::new(
//!     div,
//!     vec![5.0, 1.0, -20.0, -20.0],
//!     vec![40.0, 15.0, 20.0, 20.0],
//!     vec![15.0, 3.0, 2.0, -2.0],
//! )?;
//! let loss = ctx.objective(ctx.initial())?;
//! println!("loss at initial guess: {loss:.4e}");
//! # Ok(())
//! # }
//! ```

mod codec;
mod config;
mod divergence;
mod error;
mod extract;
mod filter;
mod geometry;
mod raster;
mod sky_image;

#[cfg(test)]
mod test_utils;

pub use codec::{pack, unpack, FilterShape};
pub use config::{ExtractionSpec, FilterSpec};
pub use divergence::{Divergence, DivergenceKind};
pub use error::{FilterError, Result};
pub use extract::{best_of, Extraction, ExtractionContext, OptimizeResult, Optimizer};
pub use filter::{
    combine, scale, AsymGaussian, Constant, CosineRing, Disk, EllipticalGaussianRing, Filter,
    FixedTemplate, GaussianRing, GeneralGaussianRing, ImageFilter, LogSpiral, SlashedGaussianRing,
    TIDAGaussianRing, Template, Weight, DENSITY_FLOOR,
};
pub use geometry::{ellipse_sq_distance, rotate, wrap_angle, EllipseDistanceConfig};
pub use raster::{pixel_centers, rasterize, sample_on};
pub use sky_image::SkyImage;
