use std::error::Error as StdError;

use nalgebra::DVector;
use uom::si::{f64::Time, time::second};

use loom_core::DimensionMismatch;

/// Errors that can occur during integration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vector field error: {0}")]
    Field(#[source] Box<dyn StdError + Send + Sync>),

    #[error(transparent)]
    Dimension(#[from] DimensionMismatch),

    #[error("non-finite value at t = {time} s")]
    NonFinite { time: f64 },
}

impl Error {
    pub(crate) fn field<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Field(Box::new(err))
    }

    pub(crate) fn ensure_finite(values: &DVector<f64>, time: Time) -> Result<(), Self> {
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(Self::NonFinite {
                time: time.get::<second>(),
            })
        }
    }
}
