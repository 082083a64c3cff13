// src/config.rs

use crate::error::{Error, Result};
use crate::physics::operations::primitive::DEFAULT_TOLERANCE;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
  /// Fractional tolerance handed to the reducer.
  #[serde(default = "default_tolerance")]
  pub tolerance: f64,

  #[serde(default = "default_log_level")]
  pub log_level: String,

  #[serde(default)]
  pub pretty_output: bool,
}

fn default_tolerance() -> f64 {
  DEFAULT_TOLERANCE
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Default for Config {
  fn default() -> Self {
    Self {
      tolerance: default_tolerance(),
      log_level: default_log_level(),
      pretty_output: false,
    }
  }
}

impl Config {
  /// Loads config from standard OS location (e.g., ~/.config/primcell/settings.json)
  ///
  /// Falls back to defaults when the file is missing or unreadable; the second
  /// value describes what happened, for logging once a logger is up.
  pub fn load() -> (Self, String) {
    let path = Self::get_path();
    if path.exists() {
      match Self::load_from(&path) {
        Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
        Err(e) => (Self::default(), format!("Error reading config: {}", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  pub fn load_from(path: &Path) -> Result<Self> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let cfg: Self = serde_json::from_reader(reader)?;
    cfg.validate()?;
    Ok(cfg)
  }

  /// Saves config to standard OS location
  pub fn save(&self) -> Result<PathBuf> {
    let path = Self::get_path();
    self.save_to(&path)?;
    Ok(path)
  }

  pub fn save_to(&self, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, self)?;
    Ok(())
  }

  pub fn validate(&self) -> Result<()> {
    if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
      return Err(Error::Config(format!(
        "tolerance must be finite and positive, got {}",
        self.tolerance
      )));
    }
    if crate::utils::logger::parse_level(&self.log_level).is_none() {
      return Err(Error::Config(format!("unknown log level {:?}", self.log_level)));
    }
    Ok(())
  }

  fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("org", "primcell", "primcell") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}
