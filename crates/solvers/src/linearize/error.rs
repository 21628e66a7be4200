use std::error::Error as StdError;

use nalgebra::DMatrix;
use uom::si::{f64::Time, time::second};

use loom_core::DimensionMismatch;

use crate::integrate;

/// Errors that can occur during linearization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vector field error: {0}")]
    Field(#[source] Box<dyn StdError + Send + Sync>),

    #[error("integration failed: {0}")]
    Integration(#[from] integrate::Error),

    #[error(transparent)]
    Dimension(#[from] DimensionMismatch),

    #[error("non-finite Jacobian at t = {time} s")]
    NonFinite { time: f64 },
}

impl Error {
    pub(crate) fn field<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Field(Box::new(err))
    }

    pub(crate) fn ensure_finite(jacobian: &DMatrix<f64>, time: Time) -> Result<(), Self> {
        if jacobian.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(Self::NonFinite {
                time: time.get::<second>(),
            })
        }
    }
}
