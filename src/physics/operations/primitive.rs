// src/physics/operations/primitive.rs
//
// Primitive-cell reduction. The pure translations of a structure are found
// from one class of equivalent atoms, the smallest cell spanned by them is
// selected deterministically, and the atoms are folded into that cell.

use crate::error::{GeometryError, InconsistentLatticeError, Result};
use crate::model::{Atom, Structure};
use crate::physics::operations::periodic::{
  are_periodic_images, into_cell, into_voronoi, periodic_residual,
};
use crate::utils::linalg::{checked_inverse, is_integral, singular_threshold};
use log::{debug, trace};
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;

pub const DEFAULT_TOLERANCE: f64 = 1e-8;

// A translation mapping every atom to within min(NOISE_FACTOR * tol, NOISE_CEILING)
// but not within tol is a near miss. Near misses only matter when no exact
// translation exists and they tile the structure at that looser tolerance.
const NOISE_FACTOR: f64 = 1e4;
const NOISE_CEILING: f64 = 1e-3;

const VOLUME_SLACK: f64 = 3.0;

// Resolution of the rounded fractional coordinates used to order candidates.
const KEY_RESOLUTION: f64 = 1e6;

/// True iff no smaller cell reproduces the structure.
///
/// Derived from [`primitive`]: the structure is primitive exactly when the
/// reduced cell has the same volume as the input cell.
pub fn is_primitive(structure: &Structure, tolerance: f64) -> Result<bool> {
  let reduced = primitive(structure, tolerance)?;
  let original = structure.cell.determinant().abs();
  let volume = reduced.cell.determinant().abs();
  Ok((original - volume).abs() <= tolerance * original)
}

/// Smallest-volume cell generating the same crystal, with atoms folded into it.
///
/// The input is never modified. When the structure is already primitive the
/// returned value is an exact clone. Otherwise the new cell is a basis of the
/// full translation lattice, oriented like the input cell; atoms are kept in
/// input order, the first atom of each periodic class surviving, wrapped into
/// the new cell with species, attributes and `site` copied.
///
/// # Errors
/// * [`GeometryError`] when the tolerance is invalid, the structure is empty,
///   the cell is (near-)singular, or two distinct atoms coincide at `tolerance`.
/// * [`InconsistentLatticeError`] when no candidate cell tiles the structure,
///   or when no translation holds at `tolerance` but some tile the structure
///   up to noise slightly larger than it. Exact translations always take
///   precedence over near misses.
pub fn primitive(structure: &Structure, tolerance: f64) -> Result<Structure> {
  // ========== 0. INPUT VALIDATION ==========
  if !tolerance.is_finite() || tolerance <= 0.0 {
    return Err(GeometryError::InvalidTolerance(tolerance).into());
  }
  if structure.is_empty() {
    return Err(GeometryError::EmptyStructure.into());
  }

  let cell = structure.cell;
  let inv_cell = checked_inverse(&cell, tolerance)?;
  check_distinct(&structure.atoms, &inv_cell, tolerance)?;

  // ========== 1. CANDIDATE TRANSLATIONS ==========
  let (classes, class_of) = equivalence_classes(&structure.atoms);
  let Some(seed) = classes.iter().min_by_key(|class| class.len()) else {
    return Err(GeometryError::EmptyStructure.into());
  };

  let search = find_translations(structure, &class_of, seed, &inv_cell, tolerance);
  debug!(
    "primitive: seed class of {} atom(s), {} pure translation(s)",
    seed.len(),
    search.translations.len()
  );

  if search.translations.is_empty() {
    if let Some(residual) = search.worst_near_miss() {
      if tiles_up_to_noise(structure, &inv_cell, &search.near_misses, noise_window(tolerance)) {
        return Err(
          InconsistentLatticeError {
            cell,
            tolerance,
            reason: format!(
              "translations tile the structure to within {:e} but not within tolerance; \
               the structure is a supercell up to noise",
              residual
            ),
          }
          .into(),
        );
      }
      debug!("primitive: near-miss translations do not tile the structure, ignored");
    }
    debug!("primitive: structure is already primitive");
    return Ok(structure.clone());
  }

  if !search.near_misses.is_empty() {
    debug!(
      "primitive: {} near-miss translation(s) ignored in favour of exact ones",
      search.near_misses.len()
    );
  }

  // ========== 2-3. BASIS SEARCH ==========
  let bases = candidate_bases(&cell, &inv_cell, &search.translations, tolerance);
  debug!("primitive: {} candidate basis(es)", bases.len());

  // ========== 4-5. REMAP ATOMS & CHECK ==========
  for basis in bases {
    if let Some(reduced) = fold_into(structure, &basis, tolerance) {
      debug!(
        "primitive: reduced {} atom(s) to {} (volume {:.6} -> {:.6})",
        structure.len(),
        reduced.len(),
        cell.determinant().abs(),
        basis.determinant().abs()
      );
      return Ok(reduced);
    }
    trace!("primitive: basis {} rejected by volume check", basis);
  }

  Err(
    InconsistentLatticeError {
      cell,
      tolerance,
      reason: "no candidate cell tiles the structure".to_string(),
    }
    .into(),
  )
}

// ========== HELPER FUNCTIONS ==========

/// Fails if two atoms sit on periodic images of the same point.
fn check_distinct(atoms: &[Atom], inv_cell: &Matrix3<f64>, tolerance: f64) -> Result<()> {
  for (first, a) in atoms.iter().enumerate() {
    for (offset, b) in atoms[first + 1..].iter().enumerate() {
      if are_periodic_images(&a.pos, &b.pos, inv_cell, tolerance) {
        return Err(
          GeometryError::IndistinguishableAtoms {
            first,
            second: first + 1 + offset,
            tolerance,
          }
          .into(),
        );
      }
    }
  }
  Ok(())
}

/// Groups atom indices by (species, attributes), classes ordered by first member.
fn equivalence_classes(atoms: &[Atom]) -> (Vec<Vec<usize>>, Vec<usize>) {
  let mut classes: Vec<Vec<usize>> = Vec::new();
  let mut class_of = Vec::with_capacity(atoms.len());

  for (i, atom) in atoms.iter().enumerate() {
    match classes
      .iter()
      .position(|class| atoms[class[0]].is_compatible(atom))
    {
      Some(c) => {
        classes[c].push(i);
        class_of.push(c);
      }
      None => {
        class_of.push(classes.len());
        classes.push(vec![i]);
      }
    }
  }

  (classes, class_of)
}

/// Offsets of the seed atoms, split into exact lattice translations and near
/// misses (within the noise window but not within tolerance).
struct TranslationSearch {
  translations: Vec<Vector3<f64>>,
  near_misses: Vec<(Vector3<f64>, f64)>,
}

impl TranslationSearch {
  fn worst_near_miss(&self) -> Option<f64> {
    self
      .near_misses
      .iter()
      .map(|(_, residual)| *residual)
      .reduce(f64::max)
  }
}

fn noise_window(tolerance: f64) -> f64 {
  (NOISE_FACTOR * tolerance).min(NOISE_CEILING)
}

fn find_translations(
  structure: &Structure,
  class_of: &[usize],
  seed: &[usize],
  inv_cell: &Matrix3<f64>,
  tolerance: f64,
) -> TranslationSearch {
  let cell = &structure.cell;
  let representative = &structure.atoms[seed[0]];
  let window = noise_window(tolerance);

  let scored: Vec<(Vector3<f64>, f64)> = seed[1..]
    .par_iter()
    .map(|&i| {
      let offset = structure.atoms[i].pos - representative.pos;
      let translation = into_voronoi(&offset, cell, inv_cell);
      let residual =
        translation_residual(structure, class_of, &translation, inv_cell, window.max(tolerance));
      (translation, residual)
    })
    .collect();

  let mut search = TranslationSearch {
    translations: Vec::new(),
    near_misses: Vec::new(),
  };
  for (translation, residual) in scored {
    if residual < tolerance {
      search.translations.push(translation);
    } else if residual < window {
      search.near_misses.push((translation, residual));
    }
  }
  search
}

/// Whether the near-miss translations reduce the structure when the noise
/// window is used as tolerance.
fn tiles_up_to_noise(
  structure: &Structure,
  inv_cell: &Matrix3<f64>,
  near_misses: &[(Vector3<f64>, f64)],
  window: f64,
) -> bool {
  let translations: Vec<Vector3<f64>> = near_misses.iter().map(|(t, _)| *t).collect();
  candidate_bases(&structure.cell, inv_cell, &translations, window)
    .iter()
    .any(|basis| fold_into(structure, basis, window).is_some())
}

/// Worst mismatch, over all atoms, between `atom + translation` and the closest
/// atom of its class. Stops early once the mismatch reaches `cutoff`.
fn translation_residual(
  structure: &Structure,
  class_of: &[usize],
  translation: &Vector3<f64>,
  inv_cell: &Matrix3<f64>,
  cutoff: f64,
) -> f64 {
  let mut worst: f64 = 0.0;

  for (i, atom) in structure.atoms.iter().enumerate() {
    let moved = atom.pos + translation;
    let best = structure
      .atoms
      .iter()
      .enumerate()
      .filter(|(j, _)| class_of[*j] == class_of[i])
      .map(|(_, other)| periodic_residual(&moved, &other.pos, inv_cell))
      .fold(f64::INFINITY, f64::min);

    worst = worst.max(best);
    if worst >= cutoff {
      break;
    }
  }

  worst
}

/// Bases of the translation lattice, best first.
///
/// Triples of pool vectors (translations plus cell vectors) are kept when they
/// are non-singular, strictly smaller than the cell, and generate every cell
/// vector and translation with integer coefficients. They are ordered by volume,
/// equal volumes by the lexicographic order of their vectors' rounded fractional
/// coordinates. A basis from the Hermite normal form of the generators closes
/// the list.
fn candidate_bases(
  cell: &Matrix3<f64>,
  inv_cell: &Matrix3<f64>,
  translations: &[Vector3<f64>],
  tolerance: f64,
) -> Vec<Matrix3<f64>> {
  let original = cell.determinant().abs();
  let threshold = singular_threshold(cell, tolerance);
  let volume_tol = tolerance * original;

  let generators: Vec<Vector3<f64>> = translations
    .iter()
    .copied()
    .chain((0..3).map(|c| cell.column(c).into_owned()))
    .collect();

  let mut pool: Vec<([i64; 3], Vector3<f64>)> = generators
    .iter()
    .map(|v| (fractional_key(v, inv_cell), *v))
    .collect();
  pool.sort_by(|a, b| a.0.cmp(&b.0));
  pool.dedup_by(|a, b| a.0 == b.0);

  let n = pool.len();
  let mut found: Vec<(f64, [usize; 3])> = (0..n)
    .into_par_iter()
    .flat_map_iter(|i| {
      let pool = &pool;
      let generators = &generators;
      (i + 1..n).flat_map(move |j| {
        (j + 1..n).filter_map(move |k| {
          let basis = Matrix3::from_columns(&[pool[i].1, pool[j].1, pool[k].1]);
          let volume = basis.determinant().abs();
          if volume < threshold || volume > original - volume_tol {
            return None;
          }
          if !spans_all(&basis, generators, tolerance * original / volume) {
            return None;
          }
          Some((volume, [i, j, k]))
        })
      })
    })
    .collect();

  found.sort_by(|a, b| a.0.total_cmp(&b.0));

  // Volumes equal within tolerance form one group, ordered by triple index.
  let mut ordered: Vec<[usize; 3]> = Vec::with_capacity(found.len());
  let mut start = 0;
  while start < found.len() {
    let lead = found[start].0;
    let end = found[start..]
      .iter()
      .position(|(volume, _)| volume - lead > volume_tol)
      .map_or(found.len(), |offset| start + offset);
    let mut group: Vec<[usize; 3]> = found[start..end].iter().map(|(_, idx)| *idx).collect();
    group.sort();
    ordered.extend(group);
    start = end;
  }

  let mut bases: Vec<Matrix3<f64>> = ordered
    .into_iter()
    .map(|[i, j, k]| orient(Matrix3::from_columns(&[pool[i].1, pool[j].1, pool[k].1]), cell))
    .collect();

  if let Some(basis) = hermite_basis(cell, inv_cell, translations) {
    bases.push(orient(basis, cell));
  }

  bases
}

/// Whether every generator has integer coordinates in `basis`.
fn spans_all(basis: &Matrix3<f64>, generators: &[Vector3<f64>], tolerance: f64) -> bool {
  match basis.try_inverse() {
    Some(inv) => generators.iter().all(|g| is_integral(&(inv * g), tolerance)),
    None => false,
  }
}

fn fractional_key(v: &Vector3<f64>, inv_cell: &Matrix3<f64>) -> [i64; 3] {
  let frac = inv_cell * v;
  [
    (frac.x * KEY_RESOLUTION).round() as i64,
    (frac.y * KEY_RESOLUTION).round() as i64,
    (frac.z * KEY_RESOLUTION).round() as i64,
  ]
}

/// Flips the third vector if needed so `basis` has the handedness of `cell`.
fn orient(mut basis: Matrix3<f64>, cell: &Matrix3<f64>) -> Matrix3<f64> {
  if basis.determinant().signum() != cell.determinant().signum() {
    let flipped = -basis.column(2).into_owned();
    basis.set_column(2, &flipped);
  }
  basis
}

/// Basis of the lattice generated by the cell vectors and `translations`.
///
/// The fractional coordinates of the translations have denominators dividing
/// the number of cosets, so scaling by it gives an integer generating set whose
/// column Hermite normal form is a basis.
fn hermite_basis(
  cell: &Matrix3<f64>,
  inv_cell: &Matrix3<f64>,
  translations: &[Vector3<f64>],
) -> Option<Matrix3<f64>> {
  let n = (translations.len() + 1) as i64;

  let mut columns: Vec<[i64; 3]> = vec![[n, 0, 0], [0, n, 0], [0, 0, n]];
  for t in translations {
    let frac = inv_cell * t;
    columns.push([
      (frac.x * n as f64).round() as i64,
      (frac.y * n as f64).round() as i64,
      (frac.z * n as f64).round() as i64,
    ]);
  }

  for row in 0..3 {
    loop {
      // Smallest non-zero entry of this row becomes the pivot.
      let pivot = (row..columns.len())
        .filter(|&c| columns[c][row] != 0)
        .min_by_key(|&c| columns[c][row].abs())?;
      columns.swap(row, pivot);

      let p = columns[row];
      let mut done = true;
      for c in row + 1..columns.len() {
        let q = columns[c][row] / p[row];
        if q != 0 {
          for r in 0..3 {
            columns[c][r] -= q * p[r];
          }
        }
        if columns[c][row] != 0 {
          done = false;
        }
      }
      if done {
        break;
      }
    }
  }

  let integer = Matrix3::from_fn(|r, c| columns[c][r] as f64 / n as f64);
  let basis = cell * integer;
  if basis.determinant().abs() < f64::EPSILON * cell.determinant().abs() {
    return None;
  }
  Some(basis)
}

/// Folds the atoms of `structure` into `basis`, or None if the volume check fails.
fn fold_into(structure: &Structure, basis: &Matrix3<f64>, tolerance: f64) -> Option<Structure> {
  let inv_basis = basis.try_inverse()?;
  let original = structure.cell.determinant().abs();
  let ratio = original / basis.determinant().abs();
  let local_tol = tolerance * ratio;

  let mut reduced = structure.empty_like(*basis);
  for atom in &structure.atoms {
    let seen = reduced.atoms.iter().any(|kept| {
      kept.is_compatible(atom) && are_periodic_images(&kept.pos, &atom.pos, &inv_basis, local_tol)
    });
    if !seen {
      let mut kept = atom.clone();
      kept.pos = into_cell(&atom.pos, basis, &inv_basis);
      reduced.atoms.push(kept);
    }
  }

  let multiplier = structure.len() as f64 / reduced.len() as f64;
  let tiles = structure.len() % reduced.len() == 0
    && (ratio - multiplier).abs() <= VOLUME_SLACK * tolerance * ratio;
  if tiles {
    Some(reduced)
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::Error;
  use crate::model::Species;
  use crate::physics::operations::supercell::{replicate, supercell};

  fn zinc_blende() -> Structure {
    Structure::new(Matrix3::new(0.0, 0.5, 0.5, 0.5, 0.0, 0.5, 0.5, 0.5, 0.0), 2.0)
      .with_atom(Atom::new([0.0, 0.0, 0.0], "As"))
      .with_atom(Atom::new([0.25, 0.25, 0.25], ["In", "Ga"]).with_attribute("m", true))
  }

  #[test]
  fn test_lattice_is_primitive() {
    assert!(is_primitive(&zinc_blende(), DEFAULT_TOLERANCE).unwrap());
  }

  #[test]
  fn test_reduces_diagonal_supercell() {
    let lattice = zinc_blende();
    let big = replicate(&lattice, 2, 1, 3).unwrap();
    assert_eq!(big.len(), 12);
    assert!(!is_primitive(&big, DEFAULT_TOLERANCE).unwrap());

    let reduced = primitive(&big, DEFAULT_TOLERANCE).unwrap();
    assert_eq!(reduced.len(), 2);
    assert!((reduced.volume() - lattice.volume()).abs() < 1e-8);
    assert_eq!(reduced.atoms[0].species, Species::from("As"));
    assert_eq!(reduced.atoms[1].species, Species::from(["Ga", "In"]));
    assert!(reduced.cell.determinant() > 0.0);
  }

  #[test]
  fn test_classes_split_on_attributes() {
    let atoms = vec![
      Atom::new([0.0, 0.0, 0.0], "Fe"),
      Atom::new([0.5, 0.0, 0.0], "Fe").with_attribute("m", true),
      Atom::new([0.0, 0.5, 0.0], "Fe").with_attribute("m", false),
      Atom::new([0.0, 0.0, 0.5], "O"),
    ];
    let (classes, class_of) = equivalence_classes(&atoms);
    assert_eq!(classes, vec![vec![0, 2], vec![1], vec![3]]);
    assert_eq!(class_of, vec![0, 1, 0, 2]);
  }

  #[test]
  fn test_attribute_breaks_translation() {
    // Two Fe on a doubled simple-cubic cell; marking one of them keeps the cell.
    let base = Structure::new(Matrix3::new(2.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0), 1.0);
    let plain = base
      .clone()
      .with_atom(Atom::new([0.0, 0.0, 0.0], "Fe"))
      .with_atom(Atom::new([1.0, 0.0, 0.0], "Fe"));
    let marked = base
      .with_atom(Atom::new([0.0, 0.0, 0.0], "Fe"))
      .with_atom(Atom::new([1.0, 0.0, 0.0], "Fe").with_attribute("moving", true));

    assert_eq!(primitive(&plain, DEFAULT_TOLERANCE).unwrap().len(), 1);
    assert_eq!(primitive(&marked, DEFAULT_TOLERANCE).unwrap(), marked);
  }

  #[test]
  fn test_tie_break_is_deterministic() {
    let big = replicate(&zinc_blende(), 2, 2, 1).unwrap();
    let first = primitive(&big, DEFAULT_TOLERANCE).unwrap();
    for _ in 0..5 {
      assert_eq!(primitive(&big, DEFAULT_TOLERANCE).unwrap(), first);
    }
  }

  #[test]
  fn test_equal_volume_bases_ordered_by_key() {
    let cell = Matrix3::from_diagonal(&Vector3::new(2.0, 2.0, 1.0));
    let inv = cell.try_inverse().unwrap();
    let t1 = Vector3::new(1.0, 0.0, 0.0);
    let t2 = Vector3::new(0.0, 1.0, 0.0);
    let t3 = Vector3::new(1.0, 1.0, 0.0);

    // Unit-volume bases: (c, t2, t1), (c, t2, t3), (c, t1, t3), then the
    // Hermite fallback. The first, re-oriented, wins.
    let bases = candidate_bases(&cell, &inv, &[t1, t2, t3], DEFAULT_TOLERANCE);
    assert_eq!(bases.len(), 4);
    let expected = Matrix3::new(0.0, 0.0, -1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0);
    assert_eq!(bases[0], expected);
    for basis in &bases {
      assert!((basis.determinant() - 1.0).abs() < 1e-12);
    }

    let shuffled = candidate_bases(&cell, &inv, &[t3, t1, t2], DEFAULT_TOLERANCE);
    assert_eq!(shuffled[..3], bases[..3]);
  }

  #[test]
  fn test_exact_translations_win_over_near_misses() {
    // Simple cubic cell, one Fe slightly off the body centre.
    let cell = Structure::new(Matrix3::identity(), 1.0)
      .with_atom(Atom::new([0.0, 0.0, 0.0], "Fe"))
      .with_atom(Atom::new([0.5, 0.5, 0.5 + 2e-5], "Fe"));
    let big = replicate(&cell, 2, 1, 1).unwrap();

    let reduced = primitive(&big, 1e-8).unwrap();
    assert_eq!(reduced.len(), 2);
    assert!((reduced.volume() - 1.0).abs() < 1e-10);

    // Loose enough to accept the body-centring translation.
    let bcc = primitive(&big, 1e-4).unwrap();
    assert_eq!(bcc.len(), 1);
    assert!((bcc.volume() - 0.5).abs() < 1e-3);

    // With no exact translation left, the cell is a body-centred supercell up to noise.
    assert!(matches!(
      primitive(&cell, 1e-8),
      Err(Error::InconsistentLattice(_))
    ));
  }

  #[test]
  fn test_noisy_supercell() {
    let mut big = replicate(&zinc_blende(), 2, 1, 1).unwrap();
    big.atoms[2].pos.x += 1e-6;

    let reduced = primitive(&big, 1e-4).unwrap();
    assert_eq!(reduced.len(), 2);

    match primitive(&big, 1e-8) {
      Err(Error::InconsistentLattice(err)) => {
        assert_eq!(err.tolerance, 1e-8);
        assert_eq!(err.cell, big.cell);
      }
      other => panic!("expected an inconsistent lattice, got {:?}", other),
    }
  }

  #[test]
  fn test_loose_tolerance_conflates_atoms() {
    let s = Structure::new(Matrix3::from_diagonal_element(4.0), 1.0)
      .with_atom(Atom::new([0.0, 0.0, 0.0], "Si"))
      .with_atom(Atom::new([0.04, 0.0, 0.0], "Si"));

    assert!(primitive(&s, 1e-3).is_ok());
    match primitive(&s, 0.05) {
      Err(Error::Geometry(GeometryError::IndistinguishableAtoms { first, second, .. })) => {
        assert_eq!((first, second), (0, 1));
      }
      other => panic!("expected indistinguishable atoms, got {:?}", other),
    }
  }

  #[test]
  fn test_rejects_bad_inputs() {
    let empty = Structure::new(Matrix3::identity(), 1.0);
    assert!(matches!(
      primitive(&empty, DEFAULT_TOLERANCE),
      Err(Error::Geometry(GeometryError::EmptyStructure))
    ));

    let flat = Structure::new(Matrix3::new(1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1e-12), 1.0)
      .with_atom(Atom::new([0.0, 0.0, 0.0], "Si"));
    assert!(matches!(
      primitive(&flat, DEFAULT_TOLERANCE),
      Err(Error::Geometry(GeometryError::SingularCell { .. }))
    ));

    assert!(matches!(
      primitive(&zinc_blende(), 0.0),
      Err(Error::Geometry(GeometryError::InvalidTolerance(_)))
    ));
    assert!(matches!(
      primitive(&zinc_blende(), f64::NAN),
      Err(Error::Geometry(GeometryError::InvalidTolerance(_)))
    ));
  }

  #[test]
  fn test_near_singular_candidates_are_skipped() {
    // A translation nearly parallel to a cell vector: (t, c, a) has |det| = 2e-9,
    // small but not zero, and must not be taken for the reduced cell.
    let cell = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0);
    let inv = cell.try_inverse().unwrap();
    let translations = [Vector3::new(0.0, 1e-9, 1.0)];

    let bases = candidate_bases(&cell, &inv, &translations, DEFAULT_TOLERANCE);
    assert!(!bases.is_empty());
    let threshold = singular_threshold(&cell, DEFAULT_TOLERANCE);
    for basis in &bases {
      assert!(basis.determinant().abs() > threshold);
      assert!((basis.determinant() - 1.0).abs() < 1e-6);
    }
  }

  #[test]
  fn test_hermite_basis_spans_translations() {
    let cell = Matrix3::from_diagonal_element(3.0);
    let inv = cell.try_inverse().unwrap();
    let translations = [Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.0, 2.0, 2.0)];

    let basis = hermite_basis(&cell, &inv, &translations).unwrap();
    assert!((basis.determinant().abs() - 9.0).abs() < 1e-9);
    let mut generators = translations.to_vec();
    generators.extend((0..3).map(|c| cell.column(c).into_owned()));
    assert!(spans_all(&basis, &generators, 1e-8));
  }

  #[test]
  fn test_general_supercell_keeps_sites() {
    let lattice = zinc_blende();
    let m = Matrix3::new(2.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 2.0);
    let big = supercell(&lattice, &(lattice.cell * m), DEFAULT_TOLERANCE).unwrap();
    assert_eq!(big.len(), 8);

    let reduced = primitive(&big, DEFAULT_TOLERANCE).unwrap();
    assert_eq!(reduced.len(), 2);
    let inv = lattice.cell.try_inverse().unwrap();
    for atom in &reduced {
      let Some(crate::model::Site::Index(site)) = atom.site else {
        panic!("site should be carried over");
      };
      assert!(are_periodic_images(&lattice[site].pos, &atom.pos, &inv, 1e-8));
      assert!(lattice[site].is_compatible(atom));
    }
  }
}
