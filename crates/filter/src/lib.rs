//! Estimator-facing system models for the Loom framework.
//!
//! A recursive estimator predicts with three quantities per step: the
//! propagated state, the state Jacobian of that propagation, and the noise
//! Jacobian.
//! [`SystemModel`] is the interface that supplies them, and
//! [`ControlledSystemModel`] implements it for any continuous-time
//! [`DynamicalSystem`] by combining a [`Discretization`] with a
//! [`Linearizer`].
//!
//! # Features
//!
//! - `serde-derive` — enables `serde` support for [`Discretization`] and the
//!   configuration types it holds.
//!
//! [`DynamicalSystem`]: loom_core::DynamicalSystem
//! [`Discretization`]: loom_solvers::Discretization
//! [`Linearizer`]: loom_solvers::linearize::Linearizer

mod model;
mod system_model;

pub use model::SystemModel;
pub use system_model::{Bound, Builder, ConfigError, ControlledSystemModel, Error};
