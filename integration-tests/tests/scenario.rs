use std::error::Error as StdError;

use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};
use uom::si::{
    f64::Time,
    time::{millisecond, second},
};

use integration_tests::test_components::{LinearSystem, ModelConfig, Pendulum, PendulumError};
use loom_core::{Quantity, Shape};
use loom_filter::{ControlledSystemModel, Error, SystemModel};
use loom_solvers::{Discretization, integrate::Scheme};

/// One extended Kalman filter prediction: `x' = F(x)`, `P' = A·P·Aᵀ + G·Q·Gᵀ`.
fn predict<M: SystemModel>(
    model: &mut M,
    mean: &DVector<f64>,
    covariance: &DMatrix<f64>,
    process_noise: &DMatrix<f64>,
    control: &DVector<f64>,
    time: Time,
) -> Result<(DVector<f64>, DMatrix<f64>), M::Error> {
    let next = model.compute_dynamics(mean, control, time)?;
    let a = model.compute_derivative_state(mean, control, time)?;
    let g = model.compute_derivative_noise(mean, control, time);

    let covariance = &a * covariance * a.transpose() + &g * process_noise * g.transpose();
    Ok((next, covariance))
}

#[test]
fn double_integrator_end_to_end() {
    let mut model = ControlledSystemModel::builder(LinearSystem::double_integrator())
        .step(Time::new::<millisecond>(100.0))
        .substeps(5)
        .build()
        .unwrap();

    let state = DVector::from_vec(vec![0.0, 0.0]);
    let control = DVector::from_vec(vec![1.0]);
    let t0 = Time::new::<second>(0.0);

    let next = model.compute_dynamics(&state, &control, t0).unwrap();
    assert_relative_eq!(next, DVector::from_vec(vec![0.005, 0.1]), epsilon = 1e-12);

    // Exact up to roundoff in the RK4 weights.
    let jacobian = model.compute_derivative_state(&state, &control, t0).unwrap();
    assert_relative_eq!(
        jacobian,
        DMatrix::from_row_slice(2, 2, &[1.0, 0.1, 0.0, 1.0]),
        epsilon = 1e-12
    );

    let gamma = model.compute_derivative_control(&state, &control, t0).unwrap();
    assert_relative_eq!(
        gamma,
        DMatrix::from_row_slice(2, 1, &[0.005, 0.1]),
        epsilon = 1e-12
    );

    assert_eq!(
        model.compute_derivative_noise(&state, &control, t0),
        DMatrix::identity(2, 2)
    );
}

#[test]
fn forward_euler_differs_in_propagation_but_not_in_the_jacobian() {
    let mut model = ControlledSystemModel::builder(LinearSystem::double_integrator())
        .step(Time::new::<second>(0.1))
        .substeps(5)
        .scheme(Scheme::ForwardEuler)
        .build()
        .unwrap();

    let state = DVector::zeros(2);
    let control = DVector::from_element(1, 1.0);
    let t0 = Time::new::<second>(0.0);

    // Σ h·(k·h) for k = 0..5 with h = 0.02.
    let next = model.compute_dynamics(&state, &control, t0).unwrap();
    assert_relative_eq!(next, DVector::from_vec(vec![0.004, 0.1]), epsilon = 1e-12);

    let jacobian = model.compute_derivative_state(&state, &control, t0).unwrap();
    assert_relative_eq!(
        jacobian,
        DMatrix::from_row_slice(2, 2, &[1.0, 0.1, 0.0, 1.0]),
        epsilon = 1e-12
    );
}

#[test]
fn drives_a_filter_prediction_loop() {
    let mut model = ControlledSystemModel::builder(Pendulum::default())
        .step(Time::new::<second>(0.02))
        .substeps(2)
        .noise_jacobian(DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]))
        .build()
        .unwrap();

    let q = DMatrix::from_diagonal_element(2, 2, 1e-3);
    let mut mean = DVector::from_vec(vec![0.3, 0.0]);
    let mut covariance = DMatrix::from_diagonal_element(2, 2, 1e-2);

    for k in 0..50 {
        let time = Time::new::<second>(0.02 * f64::from(k));
        let control = DVector::from_element(1, (0.5 * f64::from(k)).sin());

        (mean, covariance) = predict(&mut model, &mean, &covariance, &q, &control, time).unwrap();

        assert!(mean.iter().all(|v| v.is_finite()));
        assert_relative_eq!(covariance, covariance.transpose(), epsilon = 1e-12);
        assert!(covariance[(0, 0)] > 0.0 && covariance[(1, 1)] > 0.0);
    }

    assert!(model.state_jacobian().is_some());
}

#[test]
fn system_failures_reach_the_caller_unchanged() {
    let mut model = ControlledSystemModel::builder(Pendulum::default())
        .step(Time::new::<second>(0.1))
        .build()
        .unwrap();

    let err = model
        .compute_dynamics(
            &DVector::from_vec(vec![0.0, 2.0 * Pendulum::MAX_RATE]),
            &DVector::zeros(1),
            Time::new::<second>(0.0),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Integration(_)));

    let mut source: Option<&(dyn StdError + 'static)> = Some(&err);
    let mut found = None;
    while let Some(current) = source {
        if let Some(pendulum) = current.downcast_ref::<PendulumError>() {
            found = Some(pendulum);
        }
        source = current.source();
    }

    assert!(matches!(found, Some(PendulumError::Overspeed(rate)) if *rate == 200.0));
}

#[test]
fn loads_a_model_from_toml() {
    let config: ModelConfig = toml::from_str(
        r#"
        noise_jacobian = [[0.0, 0.0], [0.0, 1.0]]

        [discretization]
        step_seconds = 0.1
        substeps = 5
        scheme = "heun"
        "#,
    )
    .unwrap();

    assert_eq!(
        config.discretization,
        Discretization::from_seconds(0.1, 5, Scheme::Heun).unwrap()
    );

    let mut builder = ControlledSystemModel::builder(LinearSystem::double_integrator())
        .discretization(config.discretization);
    if let Some(g) = config.noise_jacobian().unwrap() {
        builder = builder.noise_jacobian(g);
    }
    let mut model = builder.build().unwrap();

    let next = model
        .compute_dynamics(
            &DVector::zeros(2),
            &DVector::from_element(1, 1.0),
            Time::new::<second>(0.0),
        )
        .unwrap();
    assert_relative_eq!(next, DVector::from_vec(vec![0.005, 0.1]), epsilon = 1e-12);
    assert_eq!(
        model.noise_jacobian(),
        &DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0])
    );
}

#[test]
fn toml_defaults_and_validation() {
    let config: ModelConfig = toml::from_str(
        r#"
        [discretization]
        step_seconds = 0.25
        "#,
    )
    .unwrap();

    assert_eq!(config.discretization.substeps(), 0);
    assert_eq!(config.discretization.scheme(), Scheme::Rk4);
    assert!(config.noise_jacobian().unwrap().is_none());

    let rejected = toml::from_str::<ModelConfig>(
        r#"
        [discretization]
        step_seconds = -0.25
        "#,
    );
    assert!(rejected.is_err());
}

#[test]
fn ragged_noise_jacobian_is_rejected() {
    let config: ModelConfig = toml::from_str(
        r#"
        noise_jacobian = [[1.0, 0.0], [0.0]]

        [discretization]
        step_seconds = 0.1
        "#,
    )
    .unwrap();

    let err = config.noise_jacobian().unwrap_err();
    assert_eq!(err.quantity, Quantity::NoiseJacobian);
    assert_eq!(err.expected, Shape::vector(2));
    assert_eq!(err.actual, Shape::vector(1));
}
