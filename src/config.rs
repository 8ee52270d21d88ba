//! Training configuration.
//!
//! `MlpConfig` carries the model hyperparameters; `RunConfig` wraps it with the settings the
//! CLI driver needs and can be loaded from a JSON file:
//!
//! ```json
//! {
//!   "model": {
//!     "hidden_size": 100,
//!     "learning_rate": 0.001,
//!     "epochs": 500,
//!     "plateau": { "patience": 15, "decay": 0.5, "min_learning_rate": 1e-100 }
//!   },
//!   "batch_size": 64,
//!   "model_path": "model.json"
//! }
//! ```
//!
//! Every field has a default, so `{}` is a valid file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Plateau detection and decay settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateauConfig {
    /// Consecutive non-improving epochs before decaying.
    pub patience: usize,
    /// Multiplier applied to the learning rate on each decay.
    pub decay: f64,
    /// Training stops once the learning rate falls below this.
    pub min_learning_rate: f64,
}

impl Default for PlateauConfig {
    fn default() -> Self {
        Self {
            patience: 10,
            decay: 0.5,
            min_learning_rate: 1e-3,
        }
    }
}

impl PlateauConfig {
    pub fn validate(&self) -> Result<()> {
        if self.patience == 0 {
            return Err(Error::InvalidConfig("patience must be > 0".to_owned()));
        }
        if !(self.decay.is_finite() && self.decay > 0.0 && self.decay < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "decay must be in (0, 1), got {}",
                self.decay
            )));
        }
        if !(self.min_learning_rate.is_finite() && self.min_learning_rate >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "min_learning_rate must be finite and >= 0, got {}",
                self.min_learning_rate
            )));
        }
        Ok(())
    }
}

/// Hyperparameters of the one-hidden-layer network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpConfig {
    pub hidden_size: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    pub plateau: PlateauConfig,
    /// Where to write the best parameters whenever test accuracy improves.
    pub checkpoint_path: Option<PathBuf>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_size: 100,
            learning_rate: 1e-3,
            epochs: 500,
            plateau: PlateauConfig::default(),
            checkpoint_path: None,
        }
    }
}

impl MlpConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hidden_size == 0 {
            return Err(Error::InvalidConfig("hidden_size must be > 0".to_owned()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        self.plateau.validate()
    }
}

/// Everything the CLI driver needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub model: MlpConfig,
    pub batch_size: usize,
    /// Seed for the split, initialization and shuffling; `None` draws from the OS.
    pub seed: Option<u64>,
    /// Previously saved model to try before training.
    pub model_path: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: MlpConfig::default(),
            batch_size: 64,
            seed: None,
            model_path: PathBuf::from("model.json"),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        self.model.validate()
    }
}

/// Read and validate a `RunConfig` from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig> {
    let p = path.as_ref();
    let contents = fs::read_to_string(p)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", p.display())))?;
    let config: RunConfig = serde_json::from_str(&contents)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", p.display())))?;
    config.validate()?;
    Ok(config)
}
