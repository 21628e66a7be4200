use nalgebra::{DMatrix, DVector};
use thiserror::Error;
use uom::si::f64::Time;

use loom_core::{DimensionMismatch, Quantity, VectorField};

use crate::Discretization;

use super::{Error as LinearizeError, Linearizer};

/// Finite-difference approximation of the discrete state Jacobian.
///
/// Column `j` is estimated by perturbing `xⱼ` by `eps · max(1, |xⱼ|)` and
/// re-running [`Discretization::advance`] on the perturbed state.
/// Because the same discretization advances the unperturbed state, the
/// approximation targets exactly the map used for mean propagation.
///
/// Central differences cost two integrations per state component and have
/// second-order truncation error.
/// Forward differences cost one integration per component plus one for the
/// base point, with first-order truncation error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteDifference {
    eps: f64,
    difference: Difference,
}

/// The difference formula used by [`FiniteDifference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Difference {
    /// `(F(x + h) - F(x)) / h`
    Forward,

    /// `(F(x + h) - F(x - h)) / 2h`
    #[default]
    Central,
}

/// Errors that can occur when validating a finite-difference config.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("eps must be finite and in (0, 1e-2]")]
    Eps,
}

impl Default for FiniteDifference {
    fn default() -> Self {
        // Known-good values, unwrap is safe
        Self::new(1e-6, Difference::Central).unwrap()
    }
}

impl FiniteDifference {
    /// Largest accepted relative perturbation.
    pub const MAX_EPS: f64 = 1e-2;

    /// Creates a finite-difference linearizer with a validated perturbation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Eps`] if `eps` is not finite or outside `(0, 1e-2]`.
    pub fn new(eps: f64, difference: Difference) -> Result<Self, ConfigError> {
        if !eps.is_finite() || eps <= 0.0 || eps > Self::MAX_EPS {
            return Err(ConfigError::Eps);
        }

        Ok(Self { eps, difference })
    }

    /// Returns the relative perturbation.
    #[must_use]
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Returns the difference formula.
    #[must_use]
    pub fn difference(&self) -> Difference {
        self.difference
    }
}

impl<F: VectorField> Linearizer<F> for FiniteDifference {
    fn state_jacobian(
        &self,
        field: &F,
        state: &DVector<f64>,
        time: Time,
        discretization: &Discretization,
    ) -> Result<DMatrix<f64>, LinearizeError> {
        let n = field.dim();
        DimensionMismatch::check_len(Quantity::State, n, state.len())?;

        let base = match self.difference {
            Difference::Forward => Some(discretization.advance(field, state, time)?),
            Difference::Central => None,
        };

        let mut jacobian = DMatrix::zeros(n, n);
        let mut perturbed = state.clone();

        for j in 0..n {
            let original = state[j];
            let h = self.eps * original.abs().max(1.0);

            perturbed[j] = original + h;
            let plus = discretization.advance(field, &perturbed, time)?;

            let column = if let Some(base) = &base {
                (plus - base) / h
            } else {
                perturbed[j] = original - h;
                let minus = discretization.advance(field, &perturbed, time)?;
                (plus - minus) / (2.0 * h)
            };

            perturbed[j] = original;
            jacobian.set_column(j, &column);
        }

        log::trace!(
            "{:?} difference Jacobian from {} integration(s)",
            self.difference,
            match self.difference {
                Difference::Forward => n + 1,
                Difference::Central => 2 * n,
            }
        );

        LinearizeError::ensure_finite(&jacobian, time)?;
        Ok(jacobian)
    }
}
