//! Benchmark setup error type.
//!
//! Lets setup functions propagate failures with `?` instead of using
//! `.expect()`.

use clustrum_core::ValidationError;

use crate::synthetic::SyntheticError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic data generation failed.
    #[error("synthetic assignment generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// The warm-up validation pass failed.
    #[error("warm-up validation failed: {0}")]
    Validation(#[from] ValidationError),
}
