//! Model persistence.
//!
//! A checkpoint is a versioned JSON document holding the four parameter tensors and the best
//! test accuracy. We do not serialize `Mlp` directly, so the file format stays stable if the
//! in-memory representation changes.
//!
//! Loading validates the format version, tensor lengths against the declared dims, finiteness,
//! and finally the dims against the receiving model. Any failure is `Error::ModelLoad`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::mlp::Params;
use crate::{Error, Matrix, Mlp, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format_version: u32,
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    /// Row-major (input_size, hidden_size).
    pub weights_hidden: Vec<f64>,
    pub bias_hidden: Vec<f64>,
    /// Row-major (hidden_size, output_size).
    pub weights_output: Vec<f64>,
    pub bias_output: Vec<f64>,
    pub best_accuracy: f64,
}

impl Checkpoint {
    pub fn new(params: &Params, best_accuracy: f64) -> Self {
        let (input_size, hidden_size, output_size) = params.dims();
        Self {
            format_version: MODEL_FORMAT_VERSION,
            input_size,
            hidden_size,
            output_size,
            weights_hidden: params.weights_hidden.as_slice().to_vec(),
            bias_hidden: params.bias_hidden.clone(),
            weights_output: params.weights_output.as_slice().to_vec(),
            bias_output: params.bias_output.clone(),
            best_accuracy,
        }
    }

    /// Rebuild validated parameters from the stored tensors.
    pub fn to_params(&self) -> Result<Params> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::ModelLoad(format!(
                "unsupported model format_version {}; expected {MODEL_FORMAT_VERSION}",
                self.format_version
            )));
        }
        let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
        if !(finite(&self.weights_hidden)
            && finite(&self.bias_hidden)
            && finite(&self.weights_output)
            && finite(&self.bias_output)
            && self.best_accuracy.is_finite())
        {
            return Err(Error::ModelLoad(
                "parameters must contain only finite values".to_owned(),
            ));
        }
        if !(0.0..=1.0).contains(&self.best_accuracy) {
            return Err(Error::ModelLoad(format!(
                "best_accuracy {} outside [0, 1]",
                self.best_accuracy
            )));
        }

        let params = Params {
            weights_hidden: Matrix::from_flat(
                self.input_size,
                self.hidden_size,
                self.weights_hidden.clone(),
            )
            .map_err(|e| Error::ModelLoad(format!("weights_hidden: {e}")))?,
            bias_hidden: self.bias_hidden.clone(),
            weights_output: Matrix::from_flat(
                self.hidden_size,
                self.output_size,
                self.weights_output.clone(),
            )
            .map_err(|e| Error::ModelLoad(format!("weights_output: {e}")))?,
            bias_output: self.bias_output.clone(),
        };
        params
            .validate()
            .map_err(|e| Error::ModelLoad(e.to_string()))?;
        Ok(params)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::ModelSave(format!("failed to serialize model: {e}")))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| Error::ModelLoad(format!("failed to parse model json: {e}")))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string()?;
        let p = path.as_ref();
        fs::write(p, s)
            .map_err(|e| Error::ModelSave(format!("failed to write {}: {e}", p.display())))
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = fs::read_to_string(p)
            .map_err(|e| Error::ModelLoad(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

impl Mlp {
    /// Persist the current parameters and the best accuracy.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Checkpoint::new(&self.params, self.best_accuracy()).write(path)
    }

    /// Persist the best-accuracy snapshot.
    pub fn save_best<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Checkpoint::new(&self.best_params, self.best_accuracy()).write(path)
    }

    /// Replace the parameters and best accuracy with a saved checkpoint.
    ///
    /// The checkpoint must match this model's input, hidden and output sizes. On error the
    /// model is left untouched.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let checkpoint = Checkpoint::read(path)?;
        let params = checkpoint.to_params()?;

        let expected = (self.input_size(), self.hidden_size(), self.output_size());
        if params.dims() != expected {
            return Err(Error::ModelLoad(format!(
                "checkpoint dims {:?} do not match model dims {expected:?}",
                params.dims()
            )));
        }

        self.best_params = params.clone();
        self.params = params;
        self.schedule.set_best(checkpoint.best_accuracy);
        Ok(())
    }
}
