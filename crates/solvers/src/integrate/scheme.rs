use super::Tableau;

/// An explicit fixed-step Runge-Kutta scheme.
///
/// The same scheme drives both state propagation and linearization when it
/// is held by a [`Discretization`](crate::Discretization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde-derive",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Scheme {
    /// First-order forward Euler.
    ForwardEuler,

    /// Second-order explicit midpoint.
    Midpoint,

    /// Second-order Heun's method, also known as modified Euler.
    Heun,

    /// Kutta's third-order method.
    Rk3,

    /// The classic fourth-order Runge-Kutta method.
    #[default]
    Rk4,
}

impl Scheme {
    /// Every available scheme, in increasing order of accuracy.
    pub const ALL: [Scheme; 5] = [
        Self::ForwardEuler,
        Self::Midpoint,
        Self::Heun,
        Self::Rk3,
        Self::Rk4,
    ];

    /// Number of substeps used when zero is requested.
    pub const DEFAULT_SUBSTEPS: usize = 1;

    /// Returns the order of accuracy of the scheme.
    #[must_use]
    pub fn order(self) -> usize {
        match self {
            Self::ForwardEuler => 1,
            Self::Midpoint | Self::Heun => 2,
            Self::Rk3 => 3,
            Self::Rk4 => 4,
        }
    }

    /// Resolves a requested substep count, mapping zero to the default.
    #[must_use]
    pub fn resolve_substeps(self, substeps: usize) -> usize {
        if substeps == 0 {
            Self::DEFAULT_SUBSTEPS
        } else {
            substeps
        }
    }

    pub(crate) fn tableau(self) -> &'static Tableau {
        match self {
            Self::ForwardEuler => &Tableau::FORWARD_EULER,
            Self::Midpoint => &Tableau::MIDPOINT,
            Self::Heun => &Tableau::HEUN,
            Self::Rk3 => &Tableau::RK3,
            Self::Rk4 => &Tableau::RK4,
        }
    }
}
