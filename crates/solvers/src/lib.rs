//! Integration and linearization for the Loom framework.
//!
//! A [`Discretization`] fixes how a continuous-time [`VectorField`] becomes a
//! discrete-time map: step duration, substep count, and integration scheme.
//! Both modules below consume it:
//!
//! - [`integrate`] — fixed-step explicit Runge-Kutta schemes behind the
//!   [`Integrator`](integrate::Integrator) trait
//! - [`linearize`] — state Jacobians of the discrete map behind the
//!   [`Linearizer`](linearize::Linearizer) trait
//!
//! # Features
//!
//! - `serde-derive` — derives `serde` traits for [`Discretization`],
//!   [`Scheme`](integrate::Scheme), and
//!   [`Difference`](linearize::Difference).
//!
//! [`VectorField`]: loom_core::VectorField

mod discretization;

pub mod integrate;
pub mod linearize;

pub use discretization::Discretization;
