// src/physics/operations/periodic.rs
//
// Periodicity checks and position wrapping. All functions take the inverse
// cell precomputed by the caller, who is responsible for rejecting singular
// cells (see `utils::linalg::checked_inverse`).

use crate::utils::linalg::{integer_residual, is_integral};
use nalgebra::{Matrix3, Vector3};

/// True iff `pos_a - pos_b` is a lattice translation of the cell whose inverse is given.
///
/// The difference is taken to fractional coordinates, `inverse_cell · (pos_a - pos_b)`,
/// and each component is compared against its nearest integer. `tolerance` is in
/// fractional units.
pub fn are_periodic_images(
  pos_a: &Vector3<f64>,
  pos_b: &Vector3<f64>,
  inverse_cell: &Matrix3<f64>,
  tolerance: f64,
) -> bool {
  is_integral(&(inverse_cell * (pos_a - pos_b)), tolerance)
}

/// How far `pos_a - pos_b` is from being a lattice translation, in fractional units.
pub fn periodic_residual(
  pos_a: &Vector3<f64>,
  pos_b: &Vector3<f64>,
  inverse_cell: &Matrix3<f64>,
) -> f64 {
  integer_residual(&(inverse_cell * (pos_a - pos_b)))
}

/// Periodic image of `pos` with fractional coordinates in [0, 1).
pub fn into_cell(pos: &Vector3<f64>, cell: &Matrix3<f64>, inverse_cell: &Matrix3<f64>) -> Vector3<f64> {
  let frac = (inverse_cell * pos).map(wrap_coordinate);
  cell * frac
}

/// Shortest periodic image of `pos`, i.e. the image inside the Voronoi cell of the origin.
pub fn into_voronoi(pos: &Vector3<f64>, cell: &Matrix3<f64>, inverse_cell: &Matrix3<f64>) -> Vector3<f64> {
  let frac = (inverse_cell * pos).map(|x| x - x.round());
  let centred = cell * frac;

  let mut best = centred;
  let mut best_norm = centred.norm_squared();

  // Rounding leaves the shortest image within one cell of the centred one.
  for i in -1..=1 {
    for j in -1..=1 {
      for k in -1..=1 {
        let shift = Vector3::new(i as f64, j as f64, k as f64);
        let image = cell * (frac + shift);
        let norm = image.norm_squared();
        if norm < best_norm {
          best = image;
          best_norm = norm;
        }
      }
    }
  }

  best
}

/// Wrap coordinate to [0,1) range
fn wrap_coordinate(x: f64) -> f64 {
  let wrapped = x - x.floor();
  if wrapped >= 1.0 {
    0.0
  } else {
    wrapped
  }
}
