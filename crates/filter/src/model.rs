use nalgebra::{DMatrix, DVector};
use uom::si::f64::Time;

/// The process model a discrete-time recursive estimator calls every
/// prediction step.
///
/// For a discrete transition `x_{k+1} = F(x_k, u_k, t_k) + G·w_k`, an
/// implementation provides `F`, its state Jacobian `∂F/∂x`, and the noise
/// Jacobian `G`.
/// An extended Kalman filter, for example, propagates its mean with
/// [`compute_dynamics`] and its covariance with [`compute_derivative_state`]
/// and [`compute_derivative_noise`].
///
/// Methods that take `&mut self` may update internal state, so a model is
/// used by one estimator at a time.
///
/// [`compute_dynamics`]: SystemModel::compute_dynamics
/// [`compute_derivative_state`]: SystemModel::compute_derivative_state
/// [`compute_derivative_noise`]: SystemModel::compute_derivative_noise
pub trait SystemModel {
    /// The error type returned if a prediction cannot be computed.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the length of the state vector.
    fn state_dim(&self) -> usize;

    /// Returns the length of the control vector.
    fn control_dim(&self) -> usize;

    /// Propagates `state` under `control` from `time` by one step.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the next state cannot be computed.
    fn compute_dynamics(
        &mut self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        time: Time,
    ) -> Result<DVector<f64>, Self::Error>;

    /// Computes the `n×n` Jacobian of one step with respect to the state.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the Jacobian cannot be computed.
    fn compute_derivative_state(
        &mut self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        time: Time,
    ) -> Result<DMatrix<f64>, Self::Error>;

    /// Returns the `n×n` Jacobian mapping process noise into state space.
    fn compute_derivative_noise(
        &self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        time: Time,
    ) -> DMatrix<f64>;
}
