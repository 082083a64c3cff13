// src/physics/operations/supercell.rs

use crate::error::{GeometryError, InconsistentLatticeError, Result};
use crate::model::structure::{Site, Structure};
use crate::physics::operations::periodic::into_cell;
use crate::physics::operations::primitive::DEFAULT_TOLERANCE;
use crate::utils::linalg::{checked_inverse, is_integral_matrix};
use nalgebra::{Matrix3, Vector3};

/// Repeats `structure` `nx × ny × nz` times along its three cell vectors.
pub fn replicate(structure: &Structure, nx: u32, ny: u32, nz: u32) -> Result<Structure> {
  let diagonal = Matrix3::from_diagonal(&Vector3::new(nx as f64, ny as f64, nz as f64));
  if nx == 0 || ny == 0 || nz == 0 {
    return Err(
      GeometryError::NotASupercell {
        transform: diagonal,
        tolerance: DEFAULT_TOLERANCE,
      }
      .into(),
    );
  }

  let mut result = supercell(structure, &(structure.cell * diagonal), DEFAULT_TOLERANCE)?;
  if !structure.name.is_empty() {
    result.name = format!("{} ({}x{}x{} Supercell)", structure.name, nx, ny, nz);
  }
  Ok(result)
}

/// Expands `lattice` into the cell `cell`, given in the same units as `lattice.cell`.
///
/// `lattice.cell⁻¹ · cell` must be an integer matrix. Each output atom records
/// the index of the lattice atom it was copied from in `site`. Atoms are
/// ordered by lattice translation, the untranslated copy first, then by lattice
/// atom.
pub fn supercell(lattice: &Structure, cell: &Matrix3<f64>, tolerance: f64) -> Result<Structure> {
  let inv_lattice = checked_inverse(&lattice.cell, tolerance)?;
  let transform = inv_lattice * cell;
  if !is_integral_matrix(&transform, tolerance) {
    return Err(GeometryError::NotASupercell { transform, tolerance }.into());
  }
  let transform = transform.map(f64::round);
  let multiplicity = transform.determinant().round().abs() as usize;
  if multiplicity == 0 {
    return Err(GeometryError::NotASupercell { transform, tolerance }.into());
  }
  let inv_cell = checked_inverse(cell, tolerance)?;

  // ========== 1. LATTICE POINTS COVERING THE NEW CELL ==========
  // Corners of the new cell in lattice coordinates bound the translations.
  let mut lo = [i64::MAX; 3];
  let mut hi = [i64::MIN; 3];
  for corner in 0..8 {
    let c = Vector3::new(
      (corner & 1) as f64,
      ((corner >> 1) & 1) as f64,
      ((corner >> 2) & 1) as f64,
    );
    let p = transform * c;
    for axis in 0..3 {
      lo[axis] = lo[axis].min(p[axis].floor() as i64 - 1);
      hi[axis] = hi[axis].max(p[axis].ceil() as i64);
    }
  }

  let mut shifts: Vec<[i64; 3]> = Vec::new();
  for x in lo[0]..=hi[0] {
    for y in lo[1]..=hi[1] {
      for z in lo[2]..=hi[2] {
        shifts.push([x, y, z]);
      }
    }
  }
  shifts.sort_by_key(|n| *n != [0, 0, 0]);

  // ========== 2. COPY ATOMS INSIDE THE NEW CELL ==========
  // Lattice atoms may lie anywhere; the shifts above cover images in [0,1).
  let bases: Vec<Vector3<f64>> = lattice
    .atoms
    .iter()
    .map(|atom| into_cell(&atom.pos, &lattice.cell, &inv_lattice))
    .collect();

  let mut result = lattice.empty_like(*cell);
  for n in &shifts {
    let translation = lattice.cell * Vector3::new(n[0] as f64, n[1] as f64, n[2] as f64);

    for (index, atom) in lattice.atoms.iter().enumerate() {
      let pos = bases[index] + translation;
      let frac = inv_cell * pos;
      if is_in_unit_cell(&frac, tolerance) {
        let mut new_atom = atom.clone();
        new_atom.pos = pos;
        new_atom.site = Some(Site::Index(index));
        result.atoms.push(new_atom);
      }
    }
  }

  if result.len() != multiplicity * lattice.len() {
    return Err(
      InconsistentLatticeError {
        cell: *cell,
        tolerance,
        reason: format!(
          "expected {} atoms in the supercell, found {}",
          multiplicity * lattice.len(),
          result.len()
        ),
      }
      .into(),
    );
  }

  Ok(result)
}

/// Check if fractional coordinate is within unit cell [0,1) with tolerance
fn is_in_unit_cell(frac: &Vector3<f64>, tolerance: f64) -> bool {
  frac.iter().all(|&x| x >= -tolerance && x < 1.0 - tolerance)
}
