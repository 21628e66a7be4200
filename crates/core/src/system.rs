use nalgebra::{DMatrix, DVector};
use uom::si::f64::Time;

/// A continuous-time dynamical system driven by a control input.
///
/// A `DynamicalSystem` evaluates the state time derivative
///
/// ```text
/// ẋ = f(x, u, t)
/// ```
///
/// for a state `x` of length [`state_dim`] and a control `u` of length
/// [`control_dim`].
/// The derivative is expressed per second.
///
/// The control is passed explicitly on every evaluation; a system never holds
/// a reference to the controller that drives it.
/// Binding a system to a control source is the job of
/// [`ControlledSystem`](crate::ControlledSystem).
///
/// [`state_dim`]: DynamicalSystem::state_dim
/// [`control_dim`]: DynamicalSystem::control_dim
pub trait DynamicalSystem {
    /// The error type returned if evaluation fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the length of the state vector.
    fn state_dim(&self) -> usize;

    /// Returns the length of the control vector.
    fn control_dim(&self) -> usize;

    /// Evaluates the state time derivative.
    ///
    /// Callers guarantee that `state` and `control` have the declared lengths.
    /// The returned vector must have length [`state_dim`](Self::state_dim).
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the derivative cannot be evaluated.
    fn derivative(
        &self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        time: Time,
    ) -> Result<DVector<f64>, Self::Error>;
}

/// A [`DynamicalSystem`] that can report its continuous-time Jacobians.
///
/// Implementing this trait enables analytic sensitivity propagation, which
/// is exact for linear systems and avoids the truncation error of finite
/// differences.
pub trait DifferentiableSystem: DynamicalSystem {
    /// Evaluates the Jacobians of the state derivative.
    ///
    /// Returns `(A, B)` where `A = ∂f/∂x` is `n×n` and `B = ∂f/∂u` is `n×m`,
    /// with `n` the state dimension and `m` the control dimension.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the Jacobians cannot be evaluated.
    fn jacobians(
        &self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        time: Time,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), Self::Error>;
}
