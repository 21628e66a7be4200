//! Reference systems shared by the integration tests.

use std::convert::Infallible;

use nalgebra::{DMatrix, DVector};
use serde::Deserialize;
use thiserror::Error;
use uom::si::f64::Time;

use loom_core::{DifferentiableSystem, DimensionMismatch, DynamicalSystem, Quantity, Shape};
use loom_solvers::Discretization;

/// A system whose state never changes: ẋ = 0.
#[derive(Debug, Clone, Copy)]
pub struct ZeroDynamics {
    pub state_dim: usize,
    pub control_dim: usize,
}

impl DynamicalSystem for ZeroDynamics {
    type Error = Infallible;

    fn state_dim(&self) -> usize {
        self.state_dim
    }

    fn control_dim(&self) -> usize {
        self.control_dim
    }

    fn derivative(
        &self,
        _state: &DVector<f64>,
        _control: &DVector<f64>,
        _time: Time,
    ) -> Result<DVector<f64>, Self::Error> {
        Ok(DVector::zeros(self.state_dim))
    }
}

impl DifferentiableSystem for ZeroDynamics {
    fn jacobians(
        &self,
        _state: &DVector<f64>,
        _control: &DVector<f64>,
        _time: Time,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), Self::Error> {
        Ok((
            DMatrix::zeros(self.state_dim, self.state_dim),
            DMatrix::zeros(self.state_dim, self.control_dim),
        ))
    }
}

/// A linear time-invariant system: ẋ = A·x + B·u.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    a: DMatrix<f64>,
    b: DMatrix<f64>,
}

impl LinearSystem {
    /// Creates a linear system from its state and control matrices.
    ///
    /// # Errors
    ///
    /// Returns a [`DimensionMismatch`] if `a` is not square or `b` does not
    /// have as many rows as `a`.
    pub fn new(a: DMatrix<f64>, b: DMatrix<f64>) -> Result<Self, DimensionMismatch> {
        let n = a.nrows();
        DimensionMismatch::check_shape(
            Quantity::StateJacobian,
            Shape::matrix(n, n),
            Shape::matrix(a.nrows(), a.ncols()),
        )?;
        DimensionMismatch::check_shape(
            Quantity::ControlJacobian,
            Shape::matrix(n, b.ncols()),
            Shape::matrix(b.nrows(), b.ncols()),
        )?;
        Ok(Self { a, b })
    }

    /// Double integrator: ẋ₁ = x₂, ẋ₂ = u.
    #[must_use]
    pub fn double_integrator() -> Self {
        Self {
            a: DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]),
            b: DMatrix::from_row_slice(2, 1, &[0.0, 1.0]),
        }
    }

    /// Forced harmonic oscillator: ẋ₁ = x₂, ẋ₂ = -ω²·x₁ + u.
    #[must_use]
    pub fn harmonic_oscillator(omega: f64) -> Self {
        Self {
            a: DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -omega * omega, 0.0]),
            b: DMatrix::from_row_slice(2, 1, &[0.0, 1.0]),
        }
    }

    #[must_use]
    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    #[must_use]
    pub fn b(&self) -> &DMatrix<f64> {
        &self.b
    }
}

impl DynamicalSystem for LinearSystem {
    type Error = Infallible;

    fn state_dim(&self) -> usize {
        self.a.nrows()
    }

    fn control_dim(&self) -> usize {
        self.b.ncols()
    }

    fn derivative(
        &self,
        state: &DVector<f64>,
        control: &DVector<f64>,
        _time: Time,
    ) -> Result<DVector<f64>, Self::Error> {
        Ok(&self.a * state + &self.b * control)
    }
}

impl DifferentiableSystem for LinearSystem {
    fn jacobians(
        &self,
        _state: &DVector<f64>,
        _control: &DVector<f64>,
        _time: Time,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), Self::Error> {
        Ok((self.a.clone(), self.b.clone()))
    }
}

/// Exact state transition of the unforced harmonic oscillator over `t` seconds.
#[must_use]
pub fn oscillator_transition(omega: f64, t: f64) -> DMatrix<f64> {
    let (sin, cos) = (omega * t).sin_cos();
    DMatrix::from_row_slice(2, 2, &[cos, sin / omega, -omega * sin, cos])
}

/// Damped pendulum with torque input: θ̈ = -(g/l)·sin θ - c·θ̇ + u.
#[derive(Debug, Clone, Copy)]
pub struct Pendulum {
    pub gravity_over_length: f64,
    pub damping: f64,
}

impl Default for Pendulum {
    fn default() -> Self {
        Self {
            gravity_over_length: 9.81,
            damping: 0.2,
        }
    }
}

/// Errors produced by a [`Pendulum`] that has left its modeled range.
#[derive(Debug, Error)]
pub enum PendulumError {
    #[error("angular rate {0} rad/s is outside the modeled range")]
    Overspeed(f64),
}

impl Pendulum {
    /// Largest angular rate the model accepts.
    pub const MAX_RATE: f64 = 100.0;

    fn check(state: &DVector<f64>) -> Result<(), PendulumError> {
        if state[1].abs() > Self::MAX_RATE {
            Err(PendulumError::Overspeed(state[1]))
        } else {
            Ok(())
        }
    }
}

impl DynamicalSystem for Pendulum {
    type Error = PendulumError;

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
        Self::check(state)?;
        let (theta, rate) = (state[0], state[1]);
        Ok(DVector::from_vec(vec![
            rate,
            -self.gravity_over_length * theta.sin() - self.damping * rate + control[0],
        ]))
    }
}

impl DifferentiableSystem for Pendulum {
    fn jacobians(
        &self,
        state: &DVector<f64>,
        _control: &DVector<f64>,
        _time: Time,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), Self::Error> {
        Self::check(state)?;
        Ok((
            DMatrix::from_row_slice(
                2,
                2,
                &[
                    0.0,
                    1.0,
                    -self.gravity_over_length * state[0].cos(),
                    -self.damping,
                ],
            ),
            DMatrix::from_row_slice(2, 1, &[0.0, 1.0]),
        ))
    }
}

/// Model settings as they appear in a configuration file.
#[derive(Debug, Deserialize)]
pub struct ModelConfig {
    pub discretization: Discretization,
    #[serde(default)]
    pub noise_jacobian: Option<Vec<Vec<f64>>>,
}

impl ModelConfig {
    /// Returns the noise Jacobian as a matrix, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns a [`DimensionMismatch`] if the rows are not all the same
    /// length.
    pub fn noise_jacobian(&self) -> Result<Option<DMatrix<f64>>, DimensionMismatch> {
        let Some(rows) = self.noise_jacobian.as_ref() else {
            return Ok(None);
        };

        let ncols = rows.first().map_or(0, Vec::len);
        for row in rows {
            DimensionMismatch::check_len(Quantity::NoiseJacobian, ncols, row.len())?;
        }

        Ok(Some(DMatrix::from_row_iterator(
            rows.len(),
            ncols,
            rows.iter().flatten().copied(),
        )))
    }
}

/// Deterministic pseudo-random sequence for input sweeps.
///
/// A 64-bit linear congruential generator; not suitable for anything but
/// reproducible test inputs.
#[derive(Debug, Clone)]
pub struct Sweep(u64);

impl Sweep {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the next value, uniform in `[lo, hi)`.
    pub fn next_in(&mut self, lo: f64, hi: f64) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        #[allow(clippy::cast_precision_loss)]
        let unit = (self.0 >> 11) as f64 / (1_u64 << 53) as f64;
        lo + (hi - lo) * unit
    }

    /// Returns a vector of `len` values, each uniform in `[lo, hi)`.
    pub fn vector(&mut self, len: usize, lo: f64, hi: f64) -> DVector<f64> {
        DVector::from_fn(len, |_, _| self.next_in(lo, hi))
    }
}
