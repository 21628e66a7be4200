mod constant;

pub use constant::ConstantController;

use nalgebra::{DMatrix, DVector};
use uom::si::f64::Time;

/// A control law that produces the input applied to a [`DynamicalSystem`].
///
/// A controller maps the current state and time to a control vector.
/// Paired with a system in a [`ControlledSystem`], it closes the loop so the
/// pair can be advanced by an integrator without further input.
///
/// [`DynamicalSystem`]: crate::DynamicalSystem
/// [`ControlledSystem`]: crate::ControlledSystem
pub trait Controller {
    /// Computes the control vector for the given state and time.
    fn control(&self, state: &DVector<f64>, time: Time) -> DVector<f64>;

    /// Returns the gain `∂u/∂x` of the control law.
    ///
    /// The result is `m×n`, with `m` the control dimension and `n` the length
    /// of `state`.
    fn state_gain(&self, state: &DVector<f64>, time: Time) -> DMatrix<f64>;
}
