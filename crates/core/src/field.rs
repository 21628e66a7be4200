use nalgebra::{DMatrix, DVector};
use uom::si::f64::Time;

/// A time-varying vector field `ẋ = g(x, t)` with no free input.
///
/// This is the form an integrator consumes: every input the dynamics need
/// has already been bound, typically by pairing a [`DynamicalSystem`] with a
/// [`Controller`] in a [`ControlledSystem`].
///
/// [`DynamicalSystem`]: crate::DynamicalSystem
/// [`Controller`]: crate::Controller
/// [`ControlledSystem`]: crate::ControlledSystem
pub trait VectorField {
    /// The error type returned if evaluation fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the length of the state vector.
    fn dim(&self) -> usize;

    /// Evaluates the state time derivative, per second.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the derivative cannot be evaluated.
    fn evaluate(&self, state: &DVector<f64>, time: Time) -> Result<DVector<f64>, Self::Error>;
}

/// A [`VectorField`] that can report its Jacobian `∂g/∂x`.
pub trait DifferentiableField: VectorField {
    /// Evaluates the `n×n` Jacobian of the field at `state`.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the Jacobian cannot be evaluated.
    fn jacobian(&self, state: &DVector<f64>, time: Time) -> Result<DMatrix<f64>, Self::Error>;
}

/// A [`DifferentiableField`] driven by an input that is held fixed over a
/// step, which can report the Jacobian `∂g/∂u` with respect to that input.
pub trait ActuatedField: DifferentiableField {
    /// Returns the length of the input vector.
    fn input_dim(&self) -> usize;

    /// Evaluates the `n×m` Jacobian of the field with respect to its input.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the Jacobian cannot be evaluated.
    fn input_jacobian(&self, state: &DVector<f64>, time: Time)
    -> Result<DMatrix<f64>, Self::Error>;
}
