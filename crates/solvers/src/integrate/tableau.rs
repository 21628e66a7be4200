use nalgebra::DVector;
use uom::si::f64::Time;

use loom_core::{StepSize, VectorField};

use super::{Error, evaluate_checked};

/// Butcher tableau of an explicit Runge-Kutta method.
///
/// Row `i` of `a` holds the coefficients `aᵢⱼ` for `j < i`.
#[derive(Debug)]
pub(crate) struct Tableau {
    pub(crate) a: &'static [&'static [f64]],
    pub(crate) b: &'static [f64],
    pub(crate) c: &'static [f64],
}

impl Tableau {
    pub(crate) const FORWARD_EULER: Tableau = Tableau {
        a: &[&[]],
        b: &[1.0],
        c: &[0.0],
    };

    pub(crate) const MIDPOINT: Tableau = Tableau {
        a: &[&[], &[0.5]],
        b: &[0.0, 1.0],
        c: &[0.0, 0.5],
    };

    pub(crate) const HEUN: Tableau = Tableau {
        a: &[&[], &[1.0]],
        b: &[0.5, 0.5],
        c: &[0.0, 1.0],
    };

    pub(crate) const RK3: Tableau = Tableau {
        a: &[&[], &[0.5], &[-1.0, 2.0]],
        b: &[1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
        c: &[0.0, 0.5, 1.0],
    };

    pub(crate) const RK4: Tableau = Tableau {
        a: &[&[], &[0.5], &[0.0, 0.5], &[0.0, 0.0, 1.0]],
        b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
        c: &[0.0, 0.5, 0.5, 1.0],
    };

    /// Returns the input state of stage `i`: `x + h · Σⱼ aᵢⱼ kⱼ`.
    pub(crate) fn stage_state(
        &self,
        i: usize,
        state: &DVector<f64>,
        k: &[DVector<f64>],
        h: f64,
    ) -> DVector<f64> {
        let mut stage = state.clone();
        for (a, kj) in self.a[i].iter().zip(k) {
            if *a != 0.0 {
                stage.axpy(h * a, kj, 1.0);
            }
        }
        stage
    }

    /// Returns the start time of stage `i`.
    pub(crate) fn stage_time(&self, i: usize, time: Time, h: StepSize) -> Time {
        time + *h * self.c[i]
    }

    /// Takes one step of length `h` from `state` at `time`.
    pub(crate) fn step<F: VectorField>(
        &self,
        field: &F,
        state: &DVector<f64>,
        time: Time,
        h: StepSize,
    ) -> Result<DVector<f64>, Error> {
        let hs = h.seconds();

        let mut k = Vec::with_capacity(self.b.len());
        for i in 0..self.b.len() {
            let stage = self.stage_state(i, state, &k, hs);
            k.push(evaluate_checked(field, &stage, self.stage_time(i, time, h))?);
        }

        let next = self.combine(state, &k, hs);
        Error::ensure_finite(&next, time + *h)?;
        Ok(next)
    }

    /// Returns the state at the end of a step: `x + h · Σᵢ bᵢ kᵢ`.
    pub(crate) fn combine(&self, state: &DVector<f64>, k: &[DVector<f64>], h: f64) -> DVector<f64> {
        let mut next = state.clone();
        for (b, ki) in self.b.iter().zip(k) {
            if *b != 0.0 {
                next.axpy(h * b, ki, 1.0);
            }
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn tableaus_are_consistent() {
        for tableau in [
            &Tableau::FORWARD_EULER,
            &Tableau::MIDPOINT,
            &Tableau::HEUN,
            &Tableau::RK3,
            &Tableau::RK4,
        ] {
            assert_eq!(tableau.a.len(), tableau.b.len());
            assert_eq!(tableau.c.len(), tableau.b.len());
            assert_relative_eq!(tableau.b.iter().sum::<f64>(), 1.0, epsilon = 1e-15);

            // Row sums of `a` equal the stage times.
            for (i, row) in tableau.a.iter().enumerate() {
                assert_eq!(row.len(), i);
                assert_relative_eq!(row.iter().sum::<f64>(), tableau.c[i], epsilon = 1e-15);
            }
        }
    }
}
