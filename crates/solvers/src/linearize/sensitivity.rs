use nalgebra::{DMatrix, DVector};
use uom::si::f64::Time;

use loom_core::{ActuatedField, DifferentiableField, DimensionMismatch, Quantity, Shape};

use crate::{
    Discretization,
    integrate::{self, evaluate_checked},
};

use super::{Error, Linearizer};

/// Analytic sensitivity of an explicit Runge-Kutta step.
///
/// For each stage `i` of the scheme, with stage input `yᵢ` and field
/// Jacobian `Jᵢ = ∂g/∂x (yᵢ)`, the stage sensitivity is
///
/// ```text
/// Sᵢ = Jᵢ · (I + h · Σⱼ aᵢⱼ Sⱼ)
/// Φ  = I + h · Σᵢ bᵢ Sᵢ
/// ```
///
/// and the substep Jacobians are chained across the step.
/// The result is the exact derivative of the discrete map applied by
/// [`Discretization::advance`], so linear fields produce their discrete
/// transition matrix up to roundoff regardless of the scheme.
///
/// For an [`ActuatedField`], [`Sensitivity::jacobians`] also carries the
/// input Jacobian `Bᵢ = ∂g/∂u (yᵢ)` through the same stages:
///
/// ```text
/// Uᵢ = Jᵢ · h · Σⱼ aᵢⱼ Uⱼ + Bᵢ
/// Γ  = Φ_step · Γ + h · Σᵢ bᵢ Uᵢ
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sensitivity;

impl Sensitivity {
    /// Returns the `n×n` state Jacobian `Φ` and the `n×m` input Jacobian `Γ`
    /// of one discrete step, holding the input fixed across the step.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if evaluating or integrating the field fails, or
    /// if either Jacobian is non-finite or has the wrong shape.
    pub fn jacobians<F: ActuatedField>(
        &self,
        field: &F,
        state: &DVector<f64>,
        time: Time,
        discretization: &Discretization,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), Error> {
        let n = field.dim();
        let m = field.input_dim();

        propagate(field, state, time, discretization, m, |stage_state, stage_time| {
            let jacobian = field
                .input_jacobian(stage_state, stage_time)
                .map_err(Error::field)?;
            DimensionMismatch::check_shape(
                Quantity::ControlJacobian,
                Shape::matrix(n, m),
                Shape::matrix(jacobian.nrows(), jacobian.ncols()),
            )?;
            Ok(jacobian)
        })
    }
}

impl<F: DifferentiableField> Linearizer<F> for Sensitivity {
    fn state_jacobian(
        &self,
        field: &F,
        state: &DVector<f64>,
        time: Time,
        discretization: &Discretization,
    ) -> Result<DMatrix<f64>, Error> {
        let n = field.dim();
        let (phi, _) = propagate(field, state, time, discretization, 0, |_, _| {
            Ok(DMatrix::zeros(n, 0))
        })?;
        Ok(phi)
    }
}

/// Integrates one step while accumulating `Φ` and an `n×m` input Jacobian
/// `Γ`, with `input_jacobian` supplying `Bᵢ` at each stage.
fn propagate<F, B>(
    field: &F,
    state: &DVector<f64>,
    time: Time,
    discretization: &Discretization,
    m: usize,
    input_jacobian: B,
) -> Result<(DMatrix<f64>, DMatrix<f64>), Error>
where
    F: DifferentiableField,
    B: Fn(&DVector<f64>, Time) -> Result<DMatrix<f64>, Error>,
{
    let n = field.dim();
    DimensionMismatch::check_len(Quantity::State, n, state.len())?;

    let tableau = discretization.scheme().tableau();
    let stages = tableau.b.len();
    let h = discretization.substep();
    let hs = h.seconds();
    let identity = DMatrix::<f64>::identity(n, n);

    let mut x = state.clone();
    let mut phi = identity.clone();
    let mut gamma = DMatrix::<f64>::zeros(n, m);

    for substep in 0..discretization.effective_substeps() {
        #[allow(clippy::cast_precision_loss)]
        let t = time + *h * substep as f64;

        let mut k = Vec::with_capacity(stages);
        let mut s: Vec<DMatrix<f64>> = Vec::with_capacity(stages);
        let mut u: Vec<DMatrix<f64>> = Vec::with_capacity(stages);

        for i in 0..stages {
            let stage_state = tableau.stage_state(i, &x, &k, hs);
            let stage_time = tableau.stage_time(i, t, h);

            let jacobian = field
                .jacobian(&stage_state, stage_time)
                .map_err(Error::field)?;
            DimensionMismatch::check_shape(
                Quantity::StateJacobian,
                Shape::matrix(n, n),
                Shape::matrix(jacobian.nrows(), jacobian.ncols()),
            )?;

            let mut chain = identity.clone();
            let mut input_chain = DMatrix::<f64>::zeros(n, m);
            for ((a, sj), uj) in tableau.a[i].iter().zip(&s).zip(&u) {
                if *a != 0.0 {
                    chain += sj * (hs * a);
                    input_chain += uj * (hs * a);
                }
            }

            let b = input_jacobian(&stage_state, stage_time)?;
            k.push(evaluate_checked(field, &stage_state, stage_time)?);
            u.push(&jacobian * input_chain + b);
            s.push(jacobian * chain);
        }

        let mut step_phi = identity.clone();
        let mut step_gamma = DMatrix::<f64>::zeros(n, m);
        for ((b, si), ui) in tableau.b.iter().zip(&s).zip(&u) {
            if *b != 0.0 {
                step_phi += si * (hs * b);
                step_gamma += ui * (hs * b);
            }
        }
        gamma = &step_phi * gamma + step_gamma;
        phi = step_phi * phi;

        x = tableau.combine(&x, &k, hs);
        integrate::Error::ensure_finite(&x, t + *h)?;
    }

    log::trace!(
        "sensitivity over {} substep(s) of {h} with {:?}",
        discretization.effective_substeps(),
        discretization.scheme()
    );

    Error::ensure_finite(&phi, time)?;
    Error::ensure_finite(&gamma, time)?;
    Ok((phi, gamma))
}
