// src/model/structure.rs

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Occupation of a site: one species, or a set of species sharing the site.
///
/// Two species compare equal when their label sets are equal, so a
/// one-element disordered set is the same as the single label.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Species {
  Single(String),
  Disordered(BTreeSet<String>),
}

impl Species {
  pub fn single(label: impl Into<String>) -> Self {
    Species::Single(label.into())
  }

  /// Builds a disordered site; a single label collapses to `Species::Single`.
  pub fn disordered<I, S>(labels: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut set: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
    if set.len() == 1 {
      if let Some(label) = set.pop_first() {
        return Species::Single(label);
      }
    }
    Species::Disordered(set)
  }

  pub fn labels(&self) -> BTreeSet<&str> {
    match self {
      Species::Single(label) => std::iter::once(label.as_str()).collect(),
      Species::Disordered(set) => set.iter().map(String::as_str).collect(),
    }
  }

  pub fn is_disordered(&self) -> bool {
    matches!(self, Species::Disordered(set) if set.len() > 1)
  }
}

impl PartialEq for Species {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Species::Single(a), Species::Single(b)) => a == b,
      _ => self.labels() == other.labels(),
    }
  }
}

impl Eq for Species {}

impl From<&str> for Species {
  fn from(label: &str) -> Self {
    Species::single(label)
  }
}

impl From<String> for Species {
  fn from(label: String) -> Self {
    Species::Single(label)
  }
}

impl<const N: usize> From<[&str; N]> for Species {
  fn from(labels: [&str; N]) -> Self {
    Species::disordered(labels)
  }
}

impl fmt::Display for Species {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Species::Single(label) => write!(f, "{}", label),
      Species::Disordered(set) => {
        let joined: Vec<&str> = set.iter().map(String::as_str).collect();
        write!(f, "({})", joined.join(","))
      }
    }
  }
}

/// Value of a caller-defined atom attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
}

// Missing attributes read as `false`.
static ABSENT: AttrValue = AttrValue::Bool(false);

impl From<bool> for AttrValue {
  fn from(v: bool) -> Self {
    AttrValue::Bool(v)
  }
}

impl From<i64> for AttrValue {
  fn from(v: i64) -> Self {
    AttrValue::Int(v)
  }
}

impl From<f64> for AttrValue {
  fn from(v: f64) -> Self {
    AttrValue::Float(v)
  }
}

impl From<&str> for AttrValue {
  fn from(v: &str) -> Self {
    AttrValue::Text(v.to_string())
  }
}

impl From<String> for AttrValue {
  fn from(v: String) -> Self {
    AttrValue::Text(v)
  }
}

/// Index of the reference-lattice site an atom sits on.
///
/// Serialized as an integer, `-1` meaning no site matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Site {
  Index(usize),
  Unmatched,
}

impl From<Site> for i64 {
  fn from(site: Site) -> Self {
    match site {
      Site::Index(i) => i as i64,
      Site::Unmatched => -1,
    }
  }
}

impl TryFrom<i64> for Site {
  type Error = String;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    match value {
      -1 => Ok(Site::Unmatched),
      v if v >= 0 => Ok(Site::Index(v as usize)),
      v => Err(format!("invalid site index {}", v)),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Atom {
  /// Cartesian position, in the same units as the cell.
  pub pos: Vector3<f64>,
  #[serde(rename = "type")]
  pub species: Species,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub attributes: BTreeMap<String, AttrValue>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub site: Option<Site>,
}

impl Atom {
  pub fn new(pos: [f64; 3], species: impl Into<Species>) -> Self {
    Self {
      pos: Vector3::from(pos),
      species: species.into(),
      attributes: BTreeMap::new(),
      site: None,
    }
  }

  pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
    self.attributes.insert(key.into(), value.into());
    self
  }

  /// Attribute lookup, with `Bool(false)` standing in for absent keys.
  pub fn attribute(&self, key: &str) -> &AttrValue {
    self.attributes.get(key).unwrap_or(&ABSENT)
  }

  /// Attribute equality over the union of both key sets.
  pub fn attributes_match(&self, other: &Atom) -> bool {
    self
      .attributes
      .keys()
      .chain(other.attributes.keys())
      .all(|key| self.attribute(key) == other.attribute(key))
  }

  /// Same species and same attributes: the two may be related by a lattice translation.
  pub fn is_compatible(&self, other: &Atom) -> bool {
    self.species == other.species && self.attributes_match(other)
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
  /// Lattice vectors as COLUMNS, in units of `scale`.
  pub cell: Matrix3<f64>,
  #[serde(default = "default_scale")]
  pub scale: f64,
  #[serde(default)]
  pub atoms: Vec<Atom>,
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub name: String,
}

fn default_scale() -> f64 {
  1.0
}

impl Structure {
  pub fn new(cell: Matrix3<f64>, scale: f64) -> Self {
    Self {
      cell,
      scale,
      atoms: Vec::new(),
      name: String::new(),
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn with_atom(mut self, atom: Atom) -> Self {
    self.atoms.push(atom);
    self
  }

  pub fn push_atom(&mut self, atom: Atom) {
    self.atoms.push(atom);
  }

  /// Physical volume, `scale³ · |det(cell)|`.
  pub fn volume(&self) -> f64 {
    self.scale.powi(3) * self.cell.determinant().abs()
  }

  pub fn len(&self) -> usize {
    self.atoms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.atoms.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Atom> {
    self.atoms.iter()
  }

  /// Copy of the structure with the same cell and no atoms.
  pub fn empty_like(&self, cell: Matrix3<f64>) -> Self {
    Self {
      cell,
      scale: self.scale,
      atoms: Vec::new(),
      name: self.name.clone(),
    }
  }
}

impl std::ops::Index<usize> for Structure {
  type Output = Atom;

  fn index(&self, index: usize) -> &Self::Output {
    &self.atoms[index]
  }
}

impl<'a> IntoIterator for &'a Structure {
  type Item = &'a Atom;
  type IntoIter = std::slice::Iter<'a, Atom>;

  fn into_iter(self) -> Self::IntoIter {
    self.atoms.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_species_set_equality() {
    assert_eq!(Species::from(["In", "Ga"]), Species::from(["Ga", "In"]));
    assert_eq!(Species::from(["Ga"]), Species::from("Ga"));
    assert_ne!(Species::from(["In", "Ga"]), Species::from("In"));
    assert!(Species::from(["In", "Ga"]).is_disordered());
    assert_eq!(Species::from(["In", "Ga"]).to_string(), "(Ga,In)");
  }

  #[test]
  fn test_missing_attribute_reads_false() {
    let plain = Atom::new([0.0, 0.0, 0.0], "As");
    let off = Atom::new([0.0, 0.0, 0.0], "As").with_attribute("m", false);
    let on = Atom::new([0.0, 0.0, 0.0], "As").with_attribute("m", true);

    assert!(plain.attributes_match(&off));
    assert!(off.attributes_match(&plain));
    assert!(!plain.attributes_match(&on));
    assert!(!on.is_compatible(&plain));
    assert!(plain.is_compatible(&off));
  }

  #[test]
  fn test_site_serializes_as_integer() {
    let atom = Atom {
      site: Some(Site::Unmatched),
      ..Atom::new([0.0, 0.5, 0.0], ["In", "Ga"])
    };
    let json = serde_json::to_value(&atom).unwrap();
    assert_eq!(json["site"], serde_json::json!(-1));
    assert_eq!(json["type"], serde_json::json!(["Ga", "In"]));

    let back: Atom = serde_json::from_value(json).unwrap();
    assert_eq!(back, atom);
  }

  #[test]
  fn test_volume_uses_scale() {
    let s = Structure::new(Matrix3::new(0.0, 0.5, 0.5, 0.5, 0.0, 0.5, 0.5, 0.5, 0.0), 2.0);
    assert!((s.volume() - 2.0).abs() < 1e-12);
    assert!(s.is_empty());
  }
}
