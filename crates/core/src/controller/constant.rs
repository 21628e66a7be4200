use nalgebra::{DMatrix, DVector};
use uom::si::f64::Time;

use crate::Controller;

/// A [`Controller`] that returns one fixed control vector.
///
/// `ConstantController` ignores the state and time it is given, which forces
/// open-loop evaluation of a system under a chosen input.
/// The held control is replaced with [`set_control`](Self::set_control) and is
/// never restored, so it always reflects the most recent assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantController {
    control: DVector<f64>,
}

impl ConstantController {
    /// Creates a controller holding `control`.
    #[must_use]
    pub fn new(control: DVector<f64>) -> Self {
        Self { control }
    }

    /// Creates a controller holding a zero vector of length `dim`.
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self::new(DVector::zeros(dim))
    }

    /// Overwrites the held control.
    pub fn set_control(&mut self, control: DVector<f64>) {
        self.control = control;
    }

    /// Returns the held control.
    #[must_use]
    pub fn get(&self) -> &DVector<f64> {
        &self.control
    }
}

impl Controller for ConstantController {
    fn control(&self, _state: &DVector<f64>, _time: Time) -> DVector<f64> {
        self.control.clone()
    }

    fn state_gain(&self, state: &DVector<f64>, _time: Time) -> DMatrix<f64> {
        DMatrix::zeros(self.control.len(), state.len())
    }
}
