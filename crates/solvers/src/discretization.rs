use nalgebra::DVector;
use uom::si::f64::Time;

use loom_core::{StepSize, StepSizeError, VectorField};

use crate::integrate::{self, Integrator, Scheme};

/// How a continuous-time system is turned into a discrete-time map.
///
/// A `Discretization` fixes the step duration, the substep count, and the
/// integration [`Scheme`].
/// Mean propagation and linearization both read from the same instance, so
/// the Jacobian always describes the map that actually advances the state.
///
/// A substep count of zero selects the scheme's default subdivision.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawDiscretization", into = "RawDiscretization")
)]
pub struct Discretization {
    step: StepSize,
    substeps: usize,
    scheme: Scheme,
}

impl Discretization {
    /// Creates a discretization from a validated step size.
    #[must_use]
    pub fn new(step: StepSize, substeps: usize, scheme: Scheme) -> Self {
        Self {
            step,
            substeps,
            scheme,
        }
    }

    /// Creates a discretization from a step duration in seconds.
    ///
    /// # Errors
    ///
    /// Returns a [`StepSizeError`] if `seconds` is not finite or not strictly positive.
    pub fn from_seconds(
        seconds: f64,
        substeps: usize,
        scheme: Scheme,
    ) -> Result<Self, StepSizeError> {
        Ok(Self::new(StepSize::from_seconds(seconds)?, substeps, scheme))
    }

    /// Returns the step duration.
    #[must_use]
    pub fn step(&self) -> StepSize {
        self.step
    }

    /// Returns the configured substep count, which may be zero.
    #[must_use]
    pub fn substeps(&self) -> usize {
        self.substeps
    }

    /// Returns the number of substeps actually taken.
    #[must_use]
    pub fn effective_substeps(&self) -> usize {
        self.scheme.resolve_substeps(self.substeps)
    }

    /// Returns the duration of one substep.
    #[must_use]
    pub fn substep(&self) -> StepSize {
        self.step.split(self.effective_substeps())
    }

    /// Returns the integration scheme.
    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Advances `field` from `state` at `time` by one step.
    ///
    /// # Errors
    ///
    /// Returns an [`integrate::Error`] if integration fails.
    pub fn advance<F: VectorField>(
        &self,
        field: &F,
        state: &DVector<f64>,
        time: Time,
    ) -> Result<DVector<f64>, integrate::Error> {
        self.scheme.integrate(field, state, time, self.step, self.substeps)
    }
}

/// Unvalidated form of a [`Discretization`], used for (de)serialization.
#[cfg(feature = "serde-derive")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawDiscretization {
    step_seconds: f64,
    #[serde(default)]
    substeps: usize,
    #[serde(default)]
    scheme: Scheme,
}

#[cfg(feature = "serde-derive")]
impl TryFrom<RawDiscretization> for Discretization {
    type Error = StepSizeError;

    fn try_from(raw: RawDiscretization) -> Result<Self, Self::Error> {
        Self::from_seconds(raw.step_seconds, raw.substeps, raw.scheme)
    }
}

#[cfg(feature = "serde-derive")]
impl From<Discretization> for RawDiscretization {
    fn from(d: Discretization) -> Self {
        Self {
            step_seconds: d.step.seconds(),
            substeps: d.substeps,
            scheme: d.scheme,
        }
    }
}
