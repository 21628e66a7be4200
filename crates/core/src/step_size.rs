use std::{fmt, ops::Deref};

use thiserror::Error;
use uom::{
    Conversion,
    si::{f64::Time, time},
};

/// A unit-safe, strictly positive duration for one discrete prediction step.
///
/// `StepSize` wraps a [`Time`] value and enforces that the duration is finite
/// and strictly greater than zero.
/// An estimator advances by exactly one `StepSize` per prediction, so the
/// invariant holds for as long as the step is in use.
///
/// # Construction
///
/// From a concrete [`uom`] unit:
///
/// ```
/// use loom_core::StepSize;
/// use uom::si::time::second;
///
/// let dt = StepSize::new::<second>(0.1).unwrap();
/// assert_eq!(dt.seconds(), 0.1);
/// ```
///
/// Or from an existing [`Time`] value:
///
/// ```
/// use loom_core::StepSize;
/// use uom::si::{f64::Time, time::second};
///
/// let dt = StepSize::try_from(Time::new::<second>(0.5)).unwrap();
/// assert_eq!(dt.seconds(), 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct StepSize(Time);

/// Error type returned when constructing an invalid [`StepSize`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StepSizeError {
    #[error("step size must be greater than zero, got {0} s")]
    NotPositive(f64),

    #[error("step size must be finite, got {0} s")]
    NotFinite(f64),
}

impl StepSize {
    /// Constructs a `StepSize` from a numeric value and unit.
    ///
    /// # Errors
    ///
    /// Returns [`StepSizeError`] if `value` is not finite or not strictly positive.
    pub fn new<U>(value: f64) -> Result<Self, StepSizeError>
    where
        U: time::Unit + Conversion<f64, T = f64>,
    {
        Self::from_time(Time::new::<U>(value))
    }

    /// Constructs a `StepSize` from an existing [`Time`] value.
    ///
    /// # Errors
    ///
    /// Returns [`StepSizeError`] if the time is not finite or not strictly positive.
    pub fn from_time(time: Time) -> Result<Self, StepSizeError> {
        let seconds = time.get::<time::second>();
        if !seconds.is_finite() {
            Err(StepSizeError::NotFinite(seconds))
        } else if seconds > 0.0 {
            Ok(Self(time))
        } else {
            Err(StepSizeError::NotPositive(seconds))
        }
    }

    /// Constructs a `StepSize` from a duration in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`StepSizeError`] if `seconds` is not finite or not strictly positive.
    pub fn from_seconds(seconds: f64) -> Result<Self, StepSizeError> {
        Self::new::<time::second>(seconds)
    }

    /// Returns the duration in seconds.
    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.0.get::<time::second>()
    }

    /// Splits the step into `parts` equal sub-intervals.
    ///
    /// A `parts` of zero is treated as one.
    #[must_use]
    pub fn split(self, parts: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let parts = parts.max(1) as f64;
        Self(self.0 / parts)
    }

    /// Consumes the `StepSize` and returns the underlying [`Time`] value.
    #[must_use]
    pub fn into_inner(self) -> Time {
        self.0
    }
}

impl TryFrom<Time> for StepSize {
    type Error = StepSizeError;
    fn try_from(t: Time) -> Result<Self, Self::Error> {
        Self::from_time(t)
    }
}

impl Deref for StepSize {
    type Target = Time;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for StepSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} s", self.seconds())
    }
}
