use nalgebra::DMatrix;
use uom::si::f64::Time;

use loom_core::{DynamicalSystem, StepSize};
use loom_solvers::{
    Discretization,
    integrate::Scheme,
    linearize::{Linearizer, Sensitivity},
};

use super::{Bound, ConfigError, ControlledSystemModel};

/// Step-by-step construction of a [`ControlledSystemModel`].
///
/// A step duration is required.
/// Everything else has a default: zero substeps (the scheme's default),
/// [`Scheme::Rk4`], [`Sensitivity`] linearization, and an identity noise
/// Jacobian.
/// All validation happens in [`build`](Self::build), before any model exists.
///
/// ```
/// use loom_core::{DifferentiableSystem, DynamicalSystem};
/// use loom_filter::ControlledSystemModel;
/// use loom_solvers::integrate::Scheme;
/// use nalgebra::{DMatrix, DVector};
/// use uom::si::{f64::Time, time::second};
///
/// struct Drift;
///
/// impl DynamicalSystem for Drift {
///     type Error = std::convert::Infallible;
///
///     fn state_dim(&self) -> usize { 1 }
///     fn control_dim(&self) -> usize { 1 }
///
///     fn derivative(
///         &self,
///         _state: &DVector<f64>,
///         control: &DVector<f64>,
///         _time: Time,
///     ) -> Result<DVector<f64>, Self::Error> {
///         Ok(control.clone())
///     }
/// }
///
/// impl DifferentiableSystem for Drift {
///     fn jacobians(
///         &self,
///         _state: &DVector<f64>,
///         _control: &DVector<f64>,
///         _time: Time,
///     ) -> Result<(DMatrix<f64>, DMatrix<f64>), Self::Error> {
///         Ok((DMatrix::zeros(1, 1), DMatrix::identity(1, 1)))
///     }
/// }
///
/// let model = ControlledSystemModel::builder(Drift)
///     .step(Time::new::<second>(0.1))
///     .substeps(5)
///     .scheme(Scheme::Heun)
///     .build()
///     .unwrap();
///
/// assert_eq!(model.discretization().effective_substeps(), 5);
/// ```
#[derive(Debug)]
pub struct Builder<S, L = Sensitivity> {
    system: S,
    linearizer: L,
    step: Option<Time>,
    substeps: usize,
    scheme: Scheme,
    noise_jacobian: Option<DMatrix<f64>>,
}

impl<S> Builder<S>
where
    S: DynamicalSystem,
{
    /// Starts a builder for `system`.
    pub fn new(system: S) -> Self {
        Self {
            system,
            linearizer: Sensitivity,
            step: None,
            substeps: 0,
            scheme: Scheme::default(),
            noise_jacobian: None,
        }
    }
}

impl<S, L> Builder<S, L>
where
    S: DynamicalSystem,
{
    /// Sets the step duration.
    #[must_use]
    pub fn step(mut self, step: Time) -> Self {
        self.step = Some(step);
        self
    }

    /// Sets the substep count; zero selects the scheme's default.
    #[must_use]
    pub fn substeps(mut self, substeps: usize) -> Self {
        self.substeps = substeps;
        self
    }

    /// Sets the integration scheme.
    #[must_use]
    pub fn scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Copies step duration, substep count, and scheme from `discretization`.
    #[must_use]
    pub fn discretization(self, discretization: Discretization) -> Self {
        self.step(*discretization.step())
            .substeps(discretization.substeps())
            .scheme(discretization.scheme())
    }

    /// Sets the noise Jacobian.
    #[must_use]
    pub fn noise_jacobian(mut self, noise_jacobian: DMatrix<f64>) -> Self {
        self.noise_jacobian = Some(noise_jacobian);
        self
    }

    /// Replaces the linearizer.
    #[must_use]
    pub fn linearizer<L2>(self, linearizer: L2) -> Builder<S, L2> {
        Builder {
            system: self.system,
            linearizer,
            step: self.step,
            substeps: self.substeps,
            scheme: self.scheme,
            noise_jacobian: self.noise_jacobian,
        }
    }
}

impl<S, L> Builder<S, L>
where
    S: DynamicalSystem,
    L: Linearizer<Bound<S>>,
{
    /// Validates the configuration and creates the model.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the step duration is missing, not
    /// finite, or not strictly positive, or if the noise Jacobian is not
    /// `n×n` or has a non-finite entry.
    pub fn build(self) -> Result<ControlledSystemModel<S, L>, ConfigError> {
        let step = StepSize::from_time(self.step.ok_or(ConfigError::MissingStep)?)?;
        let discretization = Discretization::new(step, self.substeps, self.scheme);

        let model = ControlledSystemModel::new(self.system, self.linearizer, discretization);
        match self.noise_jacobian {
            Some(noise_jacobian) => model.with_noise_jacobian(noise_jacobian),
            None => Ok(model),
        }
    }
}
