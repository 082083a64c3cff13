// src/physics/operations/sites.rs

use crate::error::Result;
use crate::model::{Atom, Site, Structure};
use crate::physics::operations::periodic::are_periodic_images;
use crate::utils::linalg::checked_inverse;

/// Records, for every atom of `structure`, which site of `lattice` it sits on.
///
/// Positions are compared modulo the lattice cell. Atoms with no matching site
/// get `Site::Unmatched`. Returns true when every atom found a site.
pub fn map_sites(lattice: &Structure, structure: &mut Structure, tolerance: f64) -> Result<bool> {
  map_sites_by(lattice, structure, tolerance, |_, _| true)
}

/// Same as [`map_sites`], additionally requiring `cmp(site, atom)` to hold.
pub fn map_sites_by<F>(
  lattice: &Structure,
  structure: &mut Structure,
  tolerance: f64,
  cmp: F,
) -> Result<bool>
where
  F: Fn(&Atom, &Atom) -> bool,
{
  let inv_cell = checked_inverse(&lattice.cell, tolerance)?;
  let mut all_matched = true;

  for atom in structure.atoms.iter_mut() {
    let found = lattice.atoms.iter().position(|site| {
      are_periodic_images(&site.pos, &atom.pos, &inv_cell, tolerance) && cmp(site, &*atom)
    });

    atom.site = Some(match found {
      Some(index) => Site::Index(index),
      None => {
        all_matched = false;
        Site::Unmatched
      }
    });
  }

  log::debug!(
    "map_sites: {} atom(s), all matched: {}",
    structure.len(),
    all_matched
  );
  Ok(all_matched)
}
