//! Fixed-step explicit Runge-Kutta integration.
//!
//! An [`Integrator`] advances a [`VectorField`] from an initial state across a
//! fixed duration, optionally subdivided into equal substeps:
//!
//! ```text
//! h       = duration / substeps
//! x_{k+1} = x_k + h · Σ bᵢ kᵢ,    kᵢ = g(x_k + h · Σ aᵢⱼ kⱼ, t_k + cᵢ h)
//! ```
//!
//! Each [`Scheme`] supplies its own Butcher tableau `(a, b, c)`.
//!
//! # Failure
//!
//! Integration never retries, clamps, or substitutes values.
//! A field error, a derivative of the wrong length, or any non-finite stage
//! derivative or substep result ends integration with an [`Error`].

mod error;
mod scheme;
mod tableau;

pub use error::Error;
pub use scheme::Scheme;

pub(crate) use tableau::Tableau;

use nalgebra::DVector;
use uom::si::f64::Time;

use loom_core::{DimensionMismatch, Quantity, StepSize, VectorField};

/// A numerical integrator over a fixed duration.
pub trait Integrator {
    /// Advances `field` from `initial` at `start` across `duration`.
    ///
    /// A `substeps` of zero selects the integrator's default subdivision.
    /// Otherwise the duration is split into `substeps` equal sub-intervals.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if the field fails, returns a derivative of the
    /// wrong length, or the state becomes non-finite.
    fn integrate<F: VectorField>(
        &self,
        field: &F,
        initial: &DVector<f64>,
        start: Time,
        duration: StepSize,
        substeps: usize,
    ) -> Result<DVector<f64>, Error>;
}

impl Integrator for Scheme {
    fn integrate<F: VectorField>(
        &self,
        field: &F,
        initial: &DVector<f64>,
        start: Time,
        duration: StepSize,
        substeps: usize,
    ) -> Result<DVector<f64>, Error> {
        DimensionMismatch::check_len(Quantity::State, field.dim(), initial.len())?;

        let substeps = self.resolve_substeps(substeps);
        let h = duration.split(substeps);
        let tableau = self.tableau();

        log::trace!("integrating {self:?} over {duration} in {substeps} substep(s) of {h}");

        let mut state = initial.clone();
        for k in 0..substeps {
            #[allow(clippy::cast_precision_loss)]
            let time = start + *h * k as f64;
            state = tableau.step(field, &state, time, h)?;
        }

        Ok(state)
    }
}

/// Evaluates `field` and checks the derivative's length and finiteness.
pub(crate) fn evaluate_checked<F: VectorField>(
    field: &F,
    state: &DVector<f64>,
    time: Time,
) -> Result<DVector<f64>, Error> {
    let derivative = field.evaluate(state, time).map_err(Error::field)?;
    DimensionMismatch::check_len(Quantity::Derivative, state.len(), derivative.len())?;
    Error::ensure_finite(&derivative, time)?;
    Ok(derivative)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use thiserror::Error as ThisError;
    use uom::si::time::second;

    /// Exponential decay: ẋ = -λx.
    struct Decay(f64);

    impl VectorField for Decay {
        type Error = Infallible;

        fn dim(&self) -> usize {
            1
        }

        fn evaluate(&self, state: &DVector<f64>, _time: Time) -> Result<DVector<f64>, Self::Error> {
            Ok(-self.0 * state)
        }
    }

    /// Pure time dependence: ẋ = t, so x(t) = x₀ + t²/2 from t = 0.
    struct Ramp;

    impl VectorField for Ramp {
        type Error = Infallible;

        fn dim(&self) -> usize {
            1
        }

        fn evaluate(&self, _state: &DVector<f64>, time: Time) -> Result<DVector<f64>, Self::Error> {
            Ok(DVector::from_element(1, time.get::<second>()))
        }
    }

    /// Finite-time blow-up: ẋ = x², which overflows for large steps.
    struct BlowUp;

    impl VectorField for BlowUp {
        type Error = Infallible;

        fn dim(&self) -> usize {
            1
        }

        fn evaluate(&self, state: &DVector<f64>, _time: Time) -> Result<DVector<f64>, Self::Error> {
            Ok(state.map(|x| x * x))
        }
    }

    #[derive(Debug, ThisError)]
    #[error("sensor offline")]
    struct Offline;

    struct Failing;

    impl VectorField for Failing {
        type Error = Offline;

        fn dim(&self) -> usize {
            1
        }

        fn evaluate(
            &self,
            _state: &DVector<f64>,
            _time: Time,
        ) -> Result<DVector<f64>, Self::Error> {
            Err(Offline)
        }
    }

    fn seconds(value: f64) -> Time {
        Time::new::<second>(value)
    }

    fn step(value: f64) -> StepSize {
        StepSize::from_seconds(value).unwrap()
    }

    #[test]
    fn forward_euler_single_step() {
        let x0 = DVector::from_element(1, 1.0);

        let x1 = Scheme::ForwardEuler
            .integrate(&Decay(2.0), &x0, seconds(0.0), step(0.1), 1)
            .unwrap();

        assert_relative_eq!(x1[0], 0.8);
    }

    #[test]
    fn zero_substeps_uses_default() {
        let x0 = DVector::from_element(1, 1.0);

        let default = Scheme::ForwardEuler
            .integrate(&Decay(2.0), &x0, seconds(0.0), step(0.1), 0)
            .unwrap();
        let one = Scheme::ForwardEuler
            .integrate(&Decay(2.0), &x0, seconds(0.0), step(0.1), 1)
            .unwrap();

        assert_eq!(default, one);
    }

    #[test]
    fn substeps_start_at_offset_times() {
        // Forward Euler on ẋ = t samples t = 0.0, 0.5 with two substeps.
        let x1 = Scheme::ForwardEuler
            .integrate(&Ramp, &DVector::zeros(1), seconds(0.0), step(1.0), 2)
            .unwrap();

        assert_relative_eq!(x1[0], 0.25);
    }

    #[test]
    fn higher_order_schemes_integrate_polynomial_in_time_exactly() {
        for scheme in [Scheme::Midpoint, Scheme::Heun, Scheme::Rk3, Scheme::Rk4] {
            let x1 = scheme
                .integrate(&Ramp, &DVector::zeros(1), seconds(2.0), step(1.0), 1)
                .unwrap();

            // ∫₂³ t dt = 2.5
            assert_relative_eq!(x1[0], 2.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn rk4_matches_exponential_decay() {
        let x0 = DVector::from_element(1, 3.0);

        let x1 = Scheme::Rk4
            .integrate(&Decay(1.5), &x0, seconds(0.0), step(1.0), 20)
            .unwrap();

        assert_relative_eq!(x1[0], 3.0 * (-1.5_f64).exp(), epsilon = 1e-7);
    }

    #[test]
    fn error_shrinks_at_the_scheme_order() {
        let x0 = DVector::from_element(1, 1.0);
        let exact = (-1.0_f64).exp();

        for scheme in Scheme::ALL {
            let error = |substeps| {
                let x1 = scheme
                    .integrate(&Decay(1.0), &x0, seconds(0.0), step(1.0), substeps)
                    .unwrap();
                (x1[0] - exact).abs()
            };

            // Halving h divides the global error by roughly 2^order.
            let ratio = error(8) / error(16);
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
            let expected = 2.0_f64.powi(scheme.order() as i32);
            assert!(
                (ratio / expected - 1.0).abs() < 0.2,
                "{scheme:?}: ratio {ratio}, expected about {expected}"
            );
        }
    }

    #[test]
    fn wrong_initial_length_is_rejected() {
        let err = Scheme::Rk4
            .integrate(&Decay(1.0), &DVector::zeros(2), seconds(0.0), step(0.1), 1)
            .unwrap_err();

        assert!(matches!(err, Error::Dimension(_)));
    }

    #[test]
    fn overflow_is_reported_as_non_finite() {
        let x0 = DVector::from_element(1, 1e200);

        let err = Scheme::ForwardEuler
            .integrate(&BlowUp, &x0, seconds(0.0), step(1.0), 1)
            .unwrap_err();

        assert!(matches!(err, Error::NonFinite { .. }));
    }

    #[test]
    fn field_errors_pass_through() {
        let err = Scheme::Rk4
            .integrate(&Failing, &DVector::zeros(1), seconds(0.0), step(0.1), 1)
            .unwrap_err();

        assert!(matches!(err, Error::Field(_)));
        assert_eq!(err.to_string(), "vector field error: sensor offline");
    }
}
