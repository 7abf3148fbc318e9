//! Extraction context: the typed boundary between a divergence and an
//! external optimiser.
//!
//! The context owns the divergence together with validated flat bound
//! vectors and an initial guess. Optimisers see only
//! `objective: &[f64] -> f64` and the bounds; results come back as flat
//! vectors and are turned into filters with [`ExtractionContext::reconstruct`].

use serde::{Deserialize, Serialize};

use crate::codec::{pack, unpack, FilterShape};
use crate::divergence::Divergence;
use crate::error::{FilterError, Result};
use crate::filter::Filter;

/// Outcome of one optimiser run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    /// Best flat parameter vector found.
    pub params: Vec<f64>,
    /// Objective at `params`.
    pub value: f64,
    /// Whether the optimiser met its own stopping criterion.
    pub converged: bool,
    /// Iterations spent, in the optimiser's own unit.
    pub iterations: usize,
}

/// A bound-constrained minimiser.
///
/// Failing to converge is reported through [`OptimizeResult::converged`],
/// never as an error.
pub trait Optimizer {
    /// Minimise `objective` inside `[lower, upper]` starting from `initial`.
    fn minimize(
        &self,
        objective: &dyn Fn(&[f64]) -> f64,
        lower: &[f64],
        upper: &[f64],
        initial: &[f64],
    ) -> OptimizeResult;
}

/// Filter recovered by an optimiser run.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Filter decoded from [`OptimizeResult::params`].
    pub filter: Filter,
    /// Raw optimiser output.
    pub result: OptimizeResult,
}

/// Pick the best of several runs (for example a multi-start batch).
///
/// The lowest finite objective wins; on equal objectives a converged run
/// is preferred. Returns `None` for an empty input.
pub fn best_of(results: impl IntoIterator<Item = OptimizeResult>) -> Option<OptimizeResult> {
    let mut n_runs = 0usize;
    let mut best: Option<OptimizeResult> = None;
    for r in results {
        n_runs += 1;
        if !r.value.is_finite() {
            tracing::warn!("discarding run with non-finite objective {}", r.value);
            continue;
        }
        let better = match &best {
            None => true,
            Some(b) => r.value < b.value || (r.value == b.value && r.converged && !b.converged),
        };
        if better {
            best = Some(r);
        }
    }
    match &best {
        Some(b) if !b.converged => {
            tracing::warn!(
                "best of {n_runs} runs did not converge, keeping objective {:.6e}",
                b.value
            );
        }
        Some(b) => tracing::debug!("best of {n_runs} runs: objective {:.6e}", b.value),
        None => tracing::warn!("best-of reduction over {n_runs} runs found no usable result"),
    }
    best
}

/// Divergence plus validated search box.
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    divergence: Divergence,
    lower: Vec<f64>,
    upper: Vec<f64>,
    initial: Vec<f64>,
}

fn check_len(expected: usize, v: &[f64]) -> Result<()> {
    if v.len() == expected {
        Ok(())
    } else {
        Err(FilterError::BoundsLengthMismatch {
            expected,
            got: v.len(),
        })
    }
}

impl ExtractionContext {
    /// Validate bounds against the divergence's shape.
    ///
    /// Each vector must have the shape's arity, `lower ≤ initial ≤ upper`
    /// must hold componentwise and the initial guess must decode to a
    /// valid filter.
    pub fn new(
        divergence: Divergence,
        lower: Vec<f64>,
        upper: Vec<f64>,
        initial: Vec<f64>,
    ) -> Result<Self> {
        let n = divergence.shape().size();
        check_len(n, &lower)?;
        check_len(n, &upper)?;
        check_len(n, &initial)?;
        for (index, ((&lo, &hi), &x)) in lower.iter().zip(&upper).zip(&initial).enumerate() {
            // NaN fails every comparison and lands here too.
            if !(lo <= x && x <= hi) {
                return Err(FilterError::InvalidBounds {
                    index,
                    lower: lo,
                    initial: x,
                    upper: hi,
                });
            }
        }
        unpack(&initial, divergence.shape())?;

        tracing::debug!(
            "extraction context: shape {}, {} params, divergence {:?}",
            divergence.shape(),
            n,
            divergence.kind()
        );
        Ok(Self {
            divergence,
            lower,
            upper,
            initial,
        })
    }

    /// Build the bound vectors from three filters of the divergence's shape.
    pub fn from_filters(
        divergence: Divergence,
        lower: &Filter,
        upper: &Filter,
        initial: &Filter,
    ) -> Result<Self> {
        for f in [lower, upper, initial] {
            let shape = f.shape();
            if &shape != divergence.shape() {
                return Err(FilterError::ShapeMismatch {
                    expected: divergence.shape().to_string(),
                    got: shape.to_string(),
                });
            }
        }
        Self::new(divergence, pack(lower), pack(upper), pack(initial))
    }

    /// Lower bounds.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Initial guess.
    pub fn initial(&self) -> &[f64] {
        &self.initial
    }

    /// Shape of the searched filter.
    pub fn shape(&self) -> &FilterShape {
        self.divergence.shape()
    }

    /// Underlying divergence.
    pub fn divergence(&self) -> &Divergence {
        &self.divergence
    }

    /// Loss at `params`; see [`Divergence::objective`].
    pub fn objective(&self, params: &[f64]) -> Result<f64> {
        self.divergence.objective(params)
    }

    /// Loss with failures mapped to `f64::MAX`, for optimisers that cannot
    /// handle errors.
    pub fn penalized_objective(&self, params: &[f64]) -> f64 {
        match self.divergence.objective(params) {
            Ok(v) if v.is_finite() => v,
            Ok(_) => f64::MAX,
            Err(e) => {
                tracing::trace!("objective rejected {params:?}: {e}");
                f64::MAX
            }
        }
    }

    /// Decode a flat vector into a filter.
    pub fn reconstruct(&self, params: &[f64]) -> Result<Filter> {
        unpack(params, self.divergence.shape())
    }

    /// Run `optimizer` on the penalised objective from the stored
    /// initial guess and decode its best vector.
    pub fn run(&self, optimizer: &impl Optimizer) -> Result<Extraction> {
        let objective = |p: &[f64]| self.penalized_objective(p);
        let result = optimizer.minimize(&objective, &self.lower, &self.upper, &self.initial);
        if !result.converged {
            tracing::warn!(
                "optimizer stopped without converging after {} iterations",
                result.iterations
            );
        }
        let filter = self.reconstruct(&result.params)?;
        Ok(Extraction { filter, result })
    }
}
