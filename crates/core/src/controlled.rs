use std::error::Error as StdError;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;
use uom::si::f64::Time;

use crate::{
    ActuatedField, Controller, DifferentiableField, DifferentiableSystem, DimensionMismatch,
    DynamicalSystem, Quantity, Shape, VectorField,
};

/// A [`DynamicalSystem`] bound to the [`Controller`] that drives it.
///
/// `ControlledSystem` owns both halves.
/// Each evaluation asks the controller for a control vector, checks its
/// length, and passes it explicitly to the system:
///
/// ```text
/// ẋ = f(x, c(x, t), t)
/// ```
///
/// The result is a [`VectorField`] that integrators and linearizers can
/// consume without knowing how the control is produced.
///
/// Because the pair is owned, mutating the controller requires `&mut self`,
/// and no other consumer can observe the system under a control it did not
/// choose.
#[derive(Debug, Clone)]
pub struct ControlledSystem<S, C> {
    system: S,
    controller: C,
}

/// Errors that can occur when evaluating a [`ControlledSystem`].
#[derive(Debug, Error)]
pub enum ControlledSystemError {
    #[error(transparent)]
    Dimension(#[from] DimensionMismatch),

    #[error("system error: {0}")]
    System(#[source] Box<dyn StdError + Send + Sync>),
}

impl ControlledSystemError {
    fn system<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::System(Box::new(err))
    }
}

impl<S, C> ControlledSystem<S, C> {
    /// Binds `system` to `controller`.
    pub fn new(system: S, controller: C) -> Self {
        Self { system, controller }
    }

    /// Returns a reference to the system.
    pub fn system(&self) -> &S {
        &self.system
    }

    /// Returns a reference to the controller.
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Returns a mutable reference to the controller.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Consumes the binding and returns the system and controller.
    pub fn into_parts(self) -> (S, C) {
        (self.system, self.controller)
    }
}

impl<S, C> ControlledSystem<S, C>
where
    S: DynamicalSystem,
    C: Controller,
{
    fn checked_control(
        &self,
        state: &DVector<f64>,
        time: Time,
    ) -> Result<DVector<f64>, DimensionMismatch> {
        let control = self.controller.control(state, time);
        DimensionMismatch::check_len(Quantity::Control, self.system.control_dim(), control.len())?;
        Ok(control)
    }
}

impl<S, C> VectorField for ControlledSystem<S, C>
where
    S: DynamicalSystem,
    C: Controller,
{
    type Error = ControlledSystemError;

    fn dim(&self) -> usize {
        self.system.state_dim()
    }

    fn evaluate(&self, state: &DVector<f64>, time: Time) -> Result<DVector<f64>, Self::Error> {
        let control = self.checked_control(state, time)?;

        let derivative = self
            .system
            .derivative(state, &control, time)
            .map_err(ControlledSystemError::system)?;
        DimensionMismatch::check_len(Quantity::Derivative, self.dim(), derivative.len())?;

        Ok(derivative)
    }
}

impl<S, C> ControlledSystem<S, C>
where
    S: DifferentiableSystem,
    C: Controller,
{
    /// Evaluates `(A, B)` at the controller's output and checks their shapes.
    fn checked_jacobians(
        &self,
        state: &DVector<f64>,
        time: Time,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), ControlledSystemError> {
        let n = self.system.state_dim();
        let m = self.system.control_dim();

        let control = self.checked_control(state, time)?;
        let (a, b) = self
            .system
            .jacobians(state, &control, time)
            .map_err(ControlledSystemError::system)?;
        DimensionMismatch::check_shape(
            Quantity::StateJacobian,
            Shape::matrix(n, n),
            Shape::matrix(a.nrows(), a.ncols()),
        )?;
        DimensionMismatch::check_shape(
            Quantity::ControlJacobian,
            Shape::matrix(n, m),
            Shape::matrix(b.nrows(), b.ncols()),
        )?;

        Ok((a, b))
    }
}

/// The closed-loop Jacobian is `A + B·K`, where `A` and `B` come from the
/// system and `K = ∂u/∂x` comes from the controller.
impl<S, C> DifferentiableField for ControlledSystem<S, C>
where
    S: DifferentiableSystem,
    C: Controller,
{
    fn jacobian(&self, state: &DVector<f64>, time: Time) -> Result<DMatrix<f64>, Self::Error> {
        let n = self.system.state_dim();
        let m = self.system.control_dim();

        let (a, b) = self.checked_jacobians(state, time)?;

        let gain = self.controller.state_gain(state, time);
        DimensionMismatch::check_shape(
            Quantity::StateGain,
            Shape::matrix(m, n),
            Shape::matrix(gain.nrows(), gain.ncols()),
        )?;

        Ok(a + b * gain)
    }
}

/// The input is the controller's output, so the input Jacobian is the
/// system's `B` evaluated at that output.
impl<S, C> ActuatedField for ControlledSystem<S, C>
where
    S: DifferentiableSystem,
    C: Controller,
{
    fn input_dim(&self) -> usize {
        self.system.control_dim()
    }

    fn input_jacobian(
        &self,
        state: &DVector<f64>,
        time: Time,
    ) -> Result<DMatrix<f64>, Self::Error> {
        let (_, b) = self.checked_jacobians(state, time)?;
        Ok(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use uom::si::time::second;

    use crate::ConstantController;

    /// Double integrator: ẋ₁ = x₂, ẋ₂ = u.
    struct DoubleIntegrator;

    impl DynamicalSystem for DoubleIntegrator {
        type Error = Infallible;

        fn state_dim(&self) -> usize {
            2
        }

        fn control_dim(&self) -> usize {
            1
        }

        fn derivative(
            &self,
            state: &DVector<f64>,
            control: &DVector<f64>,
            _time: Time,
        ) -> Result<DVector<f64>, Self::Error> {
            Ok(DVector::from_vec(vec![state[1], control[0]]))
        }
    }

    impl DifferentiableSystem for DoubleIntegrator {
        fn jacobians(
            &self,
            _state: &DVector<f64>,
            _control: &DVector<f64>,
            _time: Time,
        ) -> Result<(DMatrix<f64>, DMatrix<f64>), Self::Error> {
            Ok((
                DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]),
                DMatrix::from_row_slice(2, 1, &[0.0, 1.0]),
            ))
        }
    }

    /// Proportional feedback `u = -k·x₁`, for checking the closed-loop Jacobian.
    struct Proportional(f64);

    impl Controller for Proportional {
        fn control(&self, state: &DVector<f64>, _time: Time) -> DVector<f64> {
            DVector::from_vec(vec![-self.0 * state[0]])
        }

        fn state_gain(&self, state: &DVector<f64>, _time: Time) -> DMatrix<f64> {
            let mut gain = DMatrix::zeros(1, state.len());
            gain[(0, 0)] = -self.0;
            gain
        }
    }

    /// Returns a derivative one element too long.
    struct Malformed;

    impl DynamicalSystem for Malformed {
        type Error = Infallible;

        fn state_dim(&self) -> usize {
            1
        }

        fn control_dim(&self) -> usize {
            0
        }

        fn derivative(
            &self,
            _state: &DVector<f64>,
            _control: &DVector<f64>,
            _time: Time,
        ) -> Result<DVector<f64>, Self::Error> {
            Ok(DVector::zeros(2))
        }
    }

    fn t0() -> Time {
        Time::new::<second>(0.0)
    }

    #[test]
    fn evaluates_with_controller_output() {
        let bound = ControlledSystem::new(
            DoubleIntegrator,
            ConstantController::new(DVector::from_vec(vec![3.0])),
        );

        let derivative = bound
            .evaluate(&DVector::from_vec(vec![1.0, 2.0]), t0())
            .unwrap();

        assert_eq!(derivative, DVector::from_vec(vec![2.0, 3.0]));
    }

    #[test]
    fn controller_can_be_retargeted() {
        let mut bound = ControlledSystem::new(DoubleIntegrator, ConstantController::zeros(1));
        bound
            .controller_mut()
            .set_control(DVector::from_vec(vec![-1.0]));

        let derivative = bound.evaluate(&DVector::zeros(2), t0()).unwrap();

        assert_eq!(derivative, DVector::from_vec(vec![0.0, -1.0]));
    }

    #[test]
    fn wrong_control_length_is_a_dimension_mismatch() {
        let bound = ControlledSystem::new(DoubleIntegrator, ConstantController::zeros(2));

        let err = bound.evaluate(&DVector::zeros(2), t0()).unwrap_err();

        assert!(matches!(
            err,
            ControlledSystemError::Dimension(DimensionMismatch {
                quantity: Quantity::Control,
                ..
            })
        ));
    }

    #[test]
    fn wrong_derivative_length_is_a_dimension_mismatch() {
        let bound = ControlledSystem::new(Malformed, ConstantController::zeros(0));

        let err = bound.evaluate(&DVector::zeros(1), t0()).unwrap_err();

        assert!(matches!(
            err,
            ControlledSystemError::Dimension(DimensionMismatch {
                quantity: Quantity::Derivative,
                ..
            })
        ));
    }

    #[test]
    fn open_loop_jacobian_ignores_control() {
        let bound = ControlledSystem::new(
            DoubleIntegrator,
            ConstantController::new(DVector::from_vec(vec![10.0])),
        );

        let jacobian = bound.jacobian(&DVector::zeros(2), t0()).unwrap();

        assert_eq!(
            jacobian,
            DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0])
        );
    }

    #[test]
    fn closed_loop_jacobian_includes_state_gain() {
        let bound = ControlledSystem::new(DoubleIntegrator, Proportional(4.0));

        let jacobian = bound
            .jacobian(&DVector::from_vec(vec![0.5, 0.0]), t0())
            .unwrap();

        assert_relative_eq!(
            jacobian,
            DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -4.0, 0.0])
        );
    }

    #[test]
    fn input_jacobian_is_the_control_matrix() {
        let bound = ControlledSystem::new(DoubleIntegrator, Proportional(4.0));

        assert_eq!(bound.input_dim(), 1);
        assert_eq!(
            bound
                .input_jacobian(&DVector::from_vec(vec![0.5, 0.0]), t0())
                .unwrap(),
            DMatrix::from_row_slice(2, 1, &[0.0, 1.0])
        );
    }

    #[test]
    fn input_jacobian_checks_the_control_length() {
        let bound = ControlledSystem::new(
            DoubleIntegrator,
            ConstantController::new(DVector::zeros(3)),
        );

        let err = bound.input_jacobian(&DVector::zeros(2), t0()).unwrap_err();
        assert!(matches!(
            err,
            ControlledSystemError::Dimension(DimensionMismatch {
                quantity: Quantity::Control,
                ..
            })
        ));
    }
}
