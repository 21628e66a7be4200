use thiserror::Error;

use loom_core::{DimensionMismatch, StepSizeError};
use loom_solvers::{integrate, linearize};

/// Errors that can occur when computing a prediction.
///
/// Collaborator failures are passed through unchanged as the error source.
/// No value is substituted for a failed computation.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatch),

    #[error("integration failed: {0}")]
    Integration(#[source] integrate::Error),

    #[error("linearization failed: {0}")]
    Linearization(#[source] linearize::Error),
}

/// Errors that can occur when configuring a system model.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("invalid step duration: {0}")]
    Step(#[from] StepSizeError),

    #[error("a step duration is required")]
    MissingStep,

    #[error("unusable noise Jacobian: {0}")]
    NoiseJacobianShape(#[source] DimensionMismatch),

    #[error("unusable noise Jacobian: entries must be finite")]
    NoiseJacobianNotFinite,
}
