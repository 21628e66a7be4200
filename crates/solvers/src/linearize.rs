//! Jacobians of discrete-time state-transition maps.
//!
//! A [`Linearizer`] computes `Φ = ∂x_{k+1}/∂x_k` for the map defined by a
//! [`Discretization`].
//! It takes the discretization by reference and never carries its own step
//! duration, substep count, or scheme.
//! The Jacobian therefore always describes the map that
//! [`Discretization::advance`] applies.
//!
//! # Linearizers
//!
//! - [`Sensitivity`] — propagates the field's analytic Jacobian through the
//!   stages of the scheme; exact for linear fields up to roundoff
//! - [`FiniteDifference`] — perturbs the state and re-integrates; works for any
//!   [`VectorField`]

mod error;
mod finite_difference;
mod sensitivity;

pub use error::Error;
pub use finite_difference::{ConfigError, Difference, FiniteDifference};
pub use sensitivity::Sensitivity;

use nalgebra::{DMatrix, DVector};
use uom::si::f64::Time;

use loom_core::VectorField;

use crate::Discretization;

/// Computes the state Jacobian of a discretized [`VectorField`].
pub trait Linearizer<F: VectorField> {
    /// Returns the `n×n` Jacobian of one discrete step starting at `state`
    /// and `time`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if evaluating or integrating the field fails, or
    /// if the Jacobian is non-finite or has the wrong shape.
    fn state_jacobian(
        &self,
        field: &F,
        state: &DVector<f64>,
        time: Time,
        discretization: &Discretization,
    ) -> Result<DMatrix<f64>, Error>;
}
