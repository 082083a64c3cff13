// src/utils/linalg.rs

use crate::error::GeometryError;
use nalgebra::{Matrix3, Vector3};

/// Mean length of the three lattice vectors.
pub fn mean_length(cell: &Matrix3<f64>) -> f64 {
  (cell.column(0).norm() + cell.column(1).norm() + cell.column(2).norm()) / 3.0
}

/// Smallest |det| a cell may have before it counts as singular.
///
/// Scales with the cube of the mean lattice-vector length, so the verdict does
/// not depend on the units the cell is written in.
pub fn singular_threshold(cell: &Matrix3<f64>, tolerance: f64) -> f64 {
  tolerance * mean_length(cell).powi(3)
}

/// Inverse of `cell`, refusing cells whose determinant is below the singular threshold.
pub fn checked_inverse(cell: &Matrix3<f64>, tolerance: f64) -> Result<Matrix3<f64>, GeometryError> {
  let determinant = cell.determinant();
  let threshold = singular_threshold(cell, tolerance);

  let singular = || GeometryError::SingularCell {
    cell: *cell,
    determinant,
    threshold,
  };

  if !determinant.is_finite() || determinant.abs() < threshold {
    return Err(singular());
  }
  cell.try_inverse().ok_or_else(singular)
}

/// Largest distance of any component of `v` from its nearest integer.
pub fn integer_residual(v: &Vector3<f64>) -> f64 {
  v.iter().map(|x| (x - x.round()).abs()).fold(0.0, f64::max)
}

/// Whether every component of `v` is within `tolerance` of an integer.
pub fn is_integral(v: &Vector3<f64>, tolerance: f64) -> bool {
  integer_residual(v) < tolerance
}

/// Whether every entry of `m` is within `tolerance` of an integer.
pub fn is_integral_matrix(m: &Matrix3<f64>, tolerance: f64) -> bool {
  m.iter().all(|x| (x - x.round()).abs() < tolerance)
}
