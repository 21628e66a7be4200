mod builder;
mod error;


pub use builder::Builder;
pub use error::{ConfigError, Error};

use nalgebra::{DMatrix, DVector};
use uom::si::{f64::Time, time::second};

use loom_core::{
    ConstantController, ControlledSystem, DifferentiableSystem, DimensionMismatch,
    DynamicalSystem, Quantity, Shape,
};
use loom_solvers::{
    Discretization,
    linearize::{Linearizer, Sensitivity},
};

use crate::SystemModel;

/// The system bound to the model's internal constant controller.
pub type Bound<S> = ControlledSystem<S, ConstantController>;

/// Exposes a continuous-time [`DynamicalSystem`] as a discrete-time
/// [`SystemModel`].
///
/// `ControlledSystemModel` owns the system and binds it to a private
/// [`ConstantController`].
/// On every call it assigns the caller's control to that controller, then
/// delegates:
///
/// - [`compute_dynamics`] advances the bound system by one step with
///   [`Discretization::advance`]
/// - [`compute_derivative_state`] asks the [`Linearizer`] for the Jacobian of
///   that same step
/// - [`compute_derivative_noise`] returns the configured noise Jacobian
///
/// Propagation and linearization read the one [`Discretization`] held by the
/// model, so the Jacobian always describes the map used to propagate the mean.
///
/// When the model linearizes with [`Sensitivity`], it also offers
/// [`compute_derivative_control`](Self::compute_derivative_control), the
/// Jacobian of that same step with respect to the control.
///
/// # Ownership
///
/// The model owns its system for its entire lifetime.
/// Calls that assign the control take `&mut self`, so a model cannot be
/// driven by two callers at once.
/// Estimators running concurrently each need their own model.
/// Use [`into_system`](Self::into_system) to take the system back.
///
/// # Noise model
///
/// The noise Jacobian is constant, which models additive, state-independent
/// process noise.
/// It defaults to the identity and changes only through
/// [`set_noise_jacobian`](Self::set_noise_jacobian).
///
/// [`compute_dynamics`]: SystemModel::compute_dynamics
/// [`compute_derivative_state`]: SystemModel::compute_derivative_state
/// [`compute_derivative_noise`]: SystemModel::compute_derivative_noise
#[derive(Debug, Clone)]
pub struct ControlledSystemModel<S, L = Sensitivity> {
    system: Bound<S>,
    linearizer: L,
    discretization: Discretization,
    noise_jacobian: DMatrix<f64>,
    state_jacobian: Option<DMatrix<f64>>,
    control_jacobian: Option<DMatrix<f64>>,
}

impl<S> ControlledSystemModel<S>
where
    S: DynamicalSystem,
{
    /// Starts building a model for `system` that linearizes with
    /// [`Sensitivity`].
    pub fn builder(system: S) -> Builder<S> {
        Builder::new(system)
    }
}

impl<S, L> ControlledSystemModel<S, L>
where
    S: DynamicalSystem,
    L: Linearizer<Bound<S>>,
{
    /// Creates a model with an identity noise Jacobian.
    ///
    /// The internal controller starts with a zero control.
    pub fn new(system: S, linearizer: L, discretization: Discretization) -> Self {
        let n = system.state_dim();
        let m = system.control_dim();

        log::debug!(
            "system model with n = {n}, m = {m}, step = {}, substeps = {}, scheme = {:?}",
            discretization.step(),
            discretization.substeps(),
            discretization.scheme(),
        );

        Self {
            system: ControlledSystem::new(system, ConstantController::zeros(m)),
            linearizer,
            discretization,
            noise_jacobian: DMatrix::identity(n, n),
            state_jacobian: None,
            control_jacobian: None,
        }
    }

    /// Replaces the noise Jacobian, consuming and returning the model.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `noise_jacobian` is not `n×n` or has a
    /// non-finite entry.
    pub fn with_noise_jacobian(
        mut self,
        noise_jacobian: DMatrix<f64>,
    ) -> Result<Self, ConfigError> {
        self.set_noise_jacobian(noise_jacobian)?;
        Ok(self)
    }

    /// Replaces the noise Jacobian.
    ///
    /// On error the previous noise Jacobian is kept.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `noise_jacobian` is not `n×n` or has a
    /// non-finite entry.
    pub fn set_noise_jacobian(&mut self, noise_jacobian: DMatrix<f64>) -> Result<(), ConfigError> {
        let n = self.system.system().state_dim();
        DimensionMismatch::check_shape(
            Quantity::NoiseJacobian,
            Shape::matrix(n, n),
            Shape::matrix(noise_jacobian.nrows(), noise_jacobian.ncols()),
        )
        .map_err(ConfigError::NoiseJacobianShape)?;

        if !noise_jacobian.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::NoiseJacobianNotFinite);
        }

        log::debug!("noise Jacobian reconfigured");
        self.noise_jacobian = noise_jacobian;
        Ok(())
    }

    /// Returns the discretization shared by propagation and linearization.
    #[must_use]
    pub fn discretization(&self) -> &Discretization {
        &self.discretization
    }

    /// Returns the linearizer.
    #[must_use]
    pub fn linearizer(&self) -> &L {
        &self.linearizer
    }

    /// Returns the configured noise Jacobian.
    #[must_use]
    pub fn noise_jacobian(&self) -> &DMatrix<f64> {
        &self.noise_jacobian
    }

    /// Returns the control most recently assigned by a call.
    ///
    /// Before any call this is a zero vector.
    #[must_use]
    pub fn control(&self) -> &DVector<f64> {
        self.system.controller().get()
    }

    /// Returns the state Jacobian from the most recent successful call to
    /// [`compute_derivative_state`](SystemModel::compute_derivative_state)
    /// or [`compute_derivative_control`](Self::compute_derivative_control).
    ///
    /// A failed call clears it.
    #[must_use]
    pub fn state_jacobian(&self) -> Option<&DMatrix<f64>> {
        self.state_jacobian.as_ref()
    }

    /// Returns the control Jacobian from the most recent successful call to
    /// [`compute_derivative_control`](Self::compute_derivative_control).
    ///
    /// A failed call, or any call to
    /// [`compute_derivative_state`](SystemModel::compute_derivative_state),
    /// clears it.
    #[must_use]
    pub fn control_jacobian(&self) -> Option<&DMatrix<f64>> {
        self.control_jacobian.as_ref()
    }

    /// Returns a reference to the system.
    #[must_use]
    pub fn system(&self) -> &S {
        self.system.system()
    }

    /// Consumes the model and returns the system.
    pub fn into_system(self) -> S {
        self.system.into_parts().0
    }

    /// Checks input dimensions, then assigns `control` to the controller.
    fn retarget(&mut self, state: &DVector<f64>, control: &DVector<f64>) -> Result<(), Error> {
        let system = self.system.system();
        DimensionMismatch::check_len(Quantity::State, system.state_dim(), state.len())?;
        DimensionMismatch::check_len(Quantity::Control, system.control_dim(), control.len())?;

        self.system.controller_mut().set_control(control.clone());
        Ok(())
    }
}

impl<S> ControlledSystemModel<S, Sensitivity>
where
    S: DifferentiableSystem,
{
    /// Returns the `n×m` Jacobian of one discrete step with respect to the
    /// control, which is held fixed over the step.
    ///
    /// The state Jacobian of the same step is computed alongside and cached,
    /// so [`state_jacobian`](Self::state_jacobian) matches what
    /// [`compute_derivative_state`](SystemModel::compute_derivative_state)
    /// would return for these inputs.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if `state` or `control` has the wrong length, if
    /// the system fails, or if either Jacobian is non-finite.
    /// On error both cached Jacobians are cleared.
    pub fn compute_derivative_control(
        &mut self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        time: Time,
    ) -> Result<DMatrix<f64>, Error> {
        self.state_jacobian = None;
        self.control_jacobian = None;
        self.retarget(state, control)?;
        log::trace!("linearizing in the control at t = {} s", time.get::<second>());

        let (phi, gamma) = self
            .linearizer
            .jacobians(&self.system, state, time, &self.discretization)
            .map_err(Error::Linearization)?;

        self.state_jacobian = Some(phi);
        self.control_jacobian = Some(gamma.clone());
        Ok(gamma)
    }
}

impl<S, L> SystemModel for ControlledSystemModel<S, L>
where
    S: DynamicalSystem,
    L: Linearizer<Bound<S>>,
{
    type Error = Error;

    fn state_dim(&self) -> usize {
        self.system.system().state_dim()
    }

    fn control_dim(&self) -> usize {
        self.system.system().control_dim()
    }

    fn compute_dynamics(
        &mut self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        time: Time,
    ) -> Result<DVector<f64>, Self::Error> {
        self.retarget(state, control)?;
        log::trace!("propagating from t = {} s", time.get::<second>());

        self.discretization
            .advance(&self.system, state, time)
            .map_err(Error::Integration)
    }

    fn compute_derivative_state(
        &mut self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        time: Time,
    ) -> Result<DMatrix<f64>, Self::Error> {
        self.state_jacobian = None;
        self.control_jacobian = None;
        self.retarget(state, control)?;
        log::trace!("linearizing at t = {} s", time.get::<second>());

        let jacobian = self
            .linearizer
            .state_jacobian(&self.system, state, time, &self.discretization)
            .map_err(Error::Linearization)?;

        self.state_jacobian = Some(jacobian.clone());
        Ok(jacobian)
    }

    fn compute_derivative_noise(
        &self,
        _state: &DVector<f64>,
        _control: &DVector<f64>,
        _time: Time,
    ) -> DMatrix<f64> {
        self.noise_jacobian.clone()
    }
}
