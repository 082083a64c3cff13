//! Primitive-cell reduction for periodic crystal structures whose sites carry
//! species (possibly disordered) and caller-defined attributes.
//!
//! ```
//! use nalgebra::Matrix3;
//! use primcell::{primitive, replicate, Atom, Structure, DEFAULT_TOLERANCE};
//!
//! let lattice = Structure::new(Matrix3::new(0.0, 0.5, 0.5, 0.5, 0.0, 0.5, 0.5, 0.5, 0.0), 2.0)
//!   .with_atom(Atom::new([0.0, 0.0, 0.0], "As"))
//!   .with_atom(Atom::new([0.25, 0.25, 0.25], ["In", "Ga"]));
//!
//! let big = replicate(&lattice, 2, 2, 2).unwrap();
//! let reduced = primitive(&big, DEFAULT_TOLERANCE).unwrap();
//! assert_eq!(reduced.len(), 2);
//! assert!((reduced.volume() - lattice.volume()).abs() < 1e-8);
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod physics;
pub mod utils;

pub use config::Config;
pub use error::{Error, GeometryError, InconsistentLatticeError, Result};
pub use model::{AttrValue, Atom, Site, Species, Structure};
pub use physics::{
  are_periodic_images, into_cell, into_voronoi, is_primitive, map_sites, map_sites_by, primitive,
  replicate, supercell, DEFAULT_TOLERANCE,
};
