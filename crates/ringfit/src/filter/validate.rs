//! Construction guards for template parameters.
//!
//! Every guard rejects non-finite input and returns the value unchanged
//! on success; nothing is clamped.

use crate::error::{FilterError, Result};

fn reject(kind: &'static str, field: &str, value: f64, reason: &'static str) -> FilterError {
    FilterError::InvalidParameter {
        kind,
        field: field.to_string(),
        value,
        reason,
    }
}

pub(crate) fn finite(kind: &'static str, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(reject(kind, field, value, "must be finite"))
    }
}

pub(crate) fn positive(kind: &'static str, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(reject(kind, field, value, "must be finite and > 0"))
    }
}

pub(crate) fn non_negative(kind: &'static str, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(reject(kind, field, value, "must be finite and >= 0"))
    }
}

/// Asymmetry parameters live in `[0, 1)`.
pub(crate) fn asymmetry(kind: &'static str, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(reject(kind, field, value, "must lie in [0, 1)"))
    }
}

pub(crate) fn unit_interval(kind: &'static str, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(reject(kind, field, value, "must lie in [0, 1]"))
    }
}

pub(crate) fn signed_unit_interval(kind: &'static str, field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && (-1.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(reject(kind, field, value, "must lie in [-1, 1]"))
    }
}

/// Sum of absolute slash coefficients must not exceed one so the
/// azimuthal envelope stays non-negative.
pub(crate) fn slash_budget(kind: &'static str, field: &str, coeffs: &[f64]) -> Result<()> {
    for (i, &s) in coeffs.iter().enumerate() {
        finite(kind, &format!("{field}[{i}]"), s)?;
    }
    let total: f64 = coeffs.iter().map(|s| s.abs()).sum();
    if total <= 1.0 {
        Ok(())
    } else {
        Err(reject(kind, field, total, "sum of |coefficients| must be <= 1"))
    }
}
