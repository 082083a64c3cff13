// src/error.rs

use nalgebra::Matrix3;
use thiserror::Error;

/// The input geometry cannot be handled at the requested tolerance.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
  #[error("singular cell: |det| = {determinant:e} is below {threshold:e}")]
  SingularCell {
    cell: Matrix3<f64>,
    determinant: f64,
    threshold: f64,
  },

  #[error("atoms {first} and {second} are indistinguishable at tolerance {tolerance:e}")]
  IndistinguishableAtoms {
    first: usize,
    second: usize,
    tolerance: f64,
  },

  #[error("tolerance must be finite and positive, got {0}")]
  InvalidTolerance(f64),

  #[error("structure has no atoms")]
  EmptyStructure,

  #[error("cell is not an integer multiple of the lattice (transform {transform})")]
  NotASupercell {
    transform: Matrix3<f64>,
    tolerance: f64,
  },
}

/// No sub-lattice reproduces the structure at the requested tolerance.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("inconsistent lattice at tolerance {tolerance:e}: {reason}")]
pub struct InconsistentLatticeError {
  pub cell: Matrix3<f64>,
  pub tolerance: f64,
  pub reason: String,
}

#[derive(Error, Debug)]
pub enum Error {
  #[error(transparent)]
  Geometry(#[from] GeometryError),

  #[error(transparent)]
  InconsistentLattice(#[from] InconsistentLatticeError),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("IO error: {0}")]
  Io(String),

  #[error("Serialization error: {0}")]
  Json(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
  fn from(err: std::io::Error) -> Self {
    Error::Io(err.to_string())
  }
}

impl From<serde_json::Error> for Error {
  fn from(err: serde_json::Error) -> Self {
    Error::Json(err.to_string())
  }
}
