//! How substep count and scheme affect one prediction step.
//!
//! Propagates an undamped oscillator (ω = 2 rad/s) through one step for
//! every scheme and several substep counts, and prints the error against
//! the closed-form solution for both the propagated state and the state
//! Jacobian.
//!
//! # Usage
//!
//! ```text
//! cargo run --example substeps
//! cargo run --example substeps -- 0.2
//! ```
//!
//! The optional argument is the step duration in seconds (default `0.5`).

use std::{convert::Infallible, error::Error};

use nalgebra::{DMatrix, DVector};
use uom::si::{f64::Time, time::second};

use loom_core::{DifferentiableSystem, DynamicalSystem};
use loom_filter::{ControlledSystemModel, SystemModel};
use loom_solvers::integrate::Scheme;

const OMEGA: f64 = 2.0;

struct Oscillator;

impl DynamicalSystem for Oscillator {
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
        Ok(DVector::from_vec(vec![
            state[1],
            -OMEGA * OMEGA * state[0] + control[0],
        ]))
    }
}

impl DifferentiableSystem for Oscillator {
    fn jacobians(
        &self,
        _state: &DVector<f64>,
        _control: &DVector<f64>,
        _time: Time,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), Self::Error> {
        Ok((
            DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -OMEGA * OMEGA, 0.0]),
            DMatrix::from_row_slice(2, 1, &[0.0, 1.0]),
        ))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let step = std::env::args()
        .nth(1)
        .as_deref()
        .map(str::parse::<f64>)
        .transpose()?
        .unwrap_or(0.5);

    let (sin, cos) = (OMEGA * step).sin_cos();
    let exact_phi = DMatrix::from_row_slice(2, 2, &[cos, sin / OMEGA, -OMEGA * sin, cos]);
    let x0 = DVector::from_vec(vec![1.0, 0.0]);
    let exact_x = &exact_phi * &x0;
    let u = DVector::zeros(1);
    let t0 = Time::new::<second>(0.0);

    println!("step = {step} s");
    println!(
        "{:<14} {:>8} {:>14} {:>14}",
        "scheme", "substeps", "state error", "jacobian error"
    );

    for scheme in Scheme::ALL {
        for substeps in [1, 2, 4, 8, 16, 32] {
            let mut model = ControlledSystemModel::builder(Oscillator)
                .step(Time::new::<second>(step))
                .substeps(substeps)
                .scheme(scheme)
                .build()?;

            let x = model.compute_dynamics(&x0, &u, t0)?;
            let phi = model.compute_derivative_state(&x0, &u, t0)?;

            println!(
                "{:<14} {:>8} {:>14.3e} {:>14.3e}",
                format!("{scheme:?}"),
                substeps,
                (x - &exact_x).norm(),
                (phi - &exact_phi).norm(),
            );
        }
    }

    Ok(())
}
