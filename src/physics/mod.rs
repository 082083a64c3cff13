// src/physics/mod.rs
pub mod operations;

pub use operations::periodic::{are_periodic_images, into_cell, into_voronoi};
pub use operations::primitive::{is_primitive, primitive, DEFAULT_TOLERANCE};
pub use operations::sites::{map_sites, map_sites_by};
pub use operations::supercell::{replicate, supercell};
