//! Core traits and types for the Loom framework.
//!
//! This crate defines the shared abstractions that integrators, linearizers,
//! and estimator-facing system models build on:
//!
//! - [`DynamicalSystem`] — a continuous-time system `ẋ = f(x, u, t)` with
//!   declared state and control dimensions
//! - [`DifferentiableSystem`] — a system that also reports `∂f/∂x` and `∂f/∂u`
//! - [`Controller`] — a control law, with [`ConstantController`] holding one
//!   fixed input
//! - [`ControlledSystem`] — a system bound to the controller that drives it
//! - [`VectorField`], [`DifferentiableField`], [`ActuatedField`] — the
//!   closed-loop form that integrators and linearizers consume
//! - [`StepSize`] — a strictly positive, finite, unit-safe step duration
//! - [`DimensionMismatch`] — a vector or matrix with the wrong shape

mod controlled;
mod controller;
mod dimension;
mod field;
mod step_size;
mod system;

pub use controlled::{ControlledSystem, ControlledSystemError};
pub use controller::{ConstantController, Controller};
pub use dimension::{DimensionMismatch, Quantity, Shape};
pub use field::{ActuatedField, DifferentiableField, VectorField};
pub use step_size::{StepSize, StepSizeError};
pub use system::{DifferentiableSystem, DynamicalSystem};
