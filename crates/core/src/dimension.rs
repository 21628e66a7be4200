use std::fmt;

use thiserror::Error;

/// The vector or matrix whose size was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// A state vector.
    State,
    /// A control vector.
    Control,
    /// A state time derivative returned by a system.
    Derivative,
    /// A state Jacobian, checked by its row and column counts.
    StateJacobian,
    /// A control Jacobian, checked by its row and column counts.
    ControlJacobian,
    /// A controller's state gain, checked by its row and column counts.
    StateGain,
    /// A noise Jacobian, checked by its row and column counts.
    NoiseJacobian,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::State => "state",
            Self::Control => "control",
            Self::Derivative => "derivative",
            Self::StateJacobian => "state Jacobian",
            Self::ControlJacobian => "control Jacobian",
            Self::StateGain => "state gain",
            Self::NoiseJacobian => "noise Jacobian",
        };
        f.write_str(name)
    }
}

/// A vector or matrix did not have the size a system declared.
///
/// Vector lengths are recorded as single-column [`Shape`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{quantity} has shape {actual}, expected {expected}")]
pub struct DimensionMismatch {
    pub quantity: Quantity,
    pub expected: Shape,
    pub actual: Shape,
}

/// The shape of a vector (`rows × 1`) or matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    /// Shape of a column vector of length `len`.
    #[must_use]
    pub const fn vector(len: usize) -> Self {
        Self { rows: len, cols: 1 }
    }

    /// Shape of a `rows × cols` matrix.
    #[must_use]
    pub const fn matrix(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cols == 1 {
            write!(f, "{}", self.rows)
        } else {
            write!(f, "{}x{}", self.rows, self.cols)
        }
    }
}

impl DimensionMismatch {
    /// Checks a vector length against the expected length.
    ///
    /// # Errors
    ///
    /// Returns a [`DimensionMismatch`] if the lengths differ.
    pub fn check_len(quantity: Quantity, expected: usize, actual: usize) -> Result<(), Self> {
        Self::check_shape(quantity, Shape::vector(expected), Shape::vector(actual))
    }

    /// Checks a matrix shape against the expected shape.
    ///
    /// # Errors
    ///
    /// Returns a [`DimensionMismatch`] if the shapes differ.
    pub fn check_shape(quantity: Quantity, expected: Shape, actual: Shape) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self {
                quantity,
                expected,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_lengths_pass() {
        assert!(DimensionMismatch::check_len(Quantity::State, 3, 3).is_ok());
    }

    #[test]
    fn mismatched_length_reports_both_sizes() {
        let err = DimensionMismatch::check_len(Quantity::Control, 1, 2).unwrap_err();
        assert_eq!(err.expected, Shape::vector(1));
        assert_eq!(err.actual, Shape::vector(2));
        assert_eq!(err.to_string(), "control has shape 2, expected 1");
    }

    #[test]
    fn mismatched_matrix_shape_is_displayed_as_rows_by_cols() {
        let err = DimensionMismatch::check_shape(
            Quantity::NoiseJacobian,
            Shape::matrix(2, 2),
            Shape::matrix(2, 3),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "noise Jacobian has shape 2x3, expected 2x2");
    }
}
