//! A from-scratch MLP classifier for cat breed prediction.
//!
//! `catbreed-mlp` trains a one-hidden-layer network (ReLU hidden layer, softmax output) on a
//! numeric feature matrix with integer class labels. Upstream code (survey CSV ingestion,
//! cleaning, class balancing, label encoding, free-text parsing) is expected to produce the
//! [`Dataset`]; this crate owns everything from there on.
//!
//! # Design goals
//!
//! - Hand-derived backprop against plain matrix products, no autodiff.
//! - Explicit randomness: every engine is built from an injected `StdRng`, so a fixed seed
//!   reproduces the split, the initialization and every epoch shuffle.
//! - Per-instance training state: learning rate, best accuracy, plateau counter and loss
//!   history live on the [`Mlp`] value.
//!
//! # Panics vs `Result`
//!
//! - Low-level hot path (panics on misuse): [`Mlp::forward`], [`Mlp::backward`],
//!   [`Mlp::gradients`] and the free functions in [`activation`], [`loss`], [`metrics`].
//!   Shape mismatches are programmer error and trip an `assert!`.
//! - High-level APIs return [`Result`]: construction, [`Mlp::train`], [`Mlp::predict`],
//!   [`Mlp::save`] / [`Mlp::load`].
//!
//! # Quick start
//!
//! ```rust
//! use catbreed_mlp::{Dataset, Mlp, MlpConfig};
//! use rand::SeedableRng;
//!
//! # fn main() -> catbreed_mlp::Result<()> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let data = Dataset::gaussian_blobs(3, 50, 4, 4.0, 0.5, &mut rng)?;
//!
//! let config = MlpConfig {
//!     hidden_size: 8,
//!     learning_rate: 0.05,
//!     epochs: 20,
//!     ..MlpConfig::default()
//! };
//! let mut mlp = Mlp::new_with_seed(&data, &config, 0)?;
//! let report = mlp.train(16)?;
//! assert_eq!(report.epochs.len(), mlp.loss_history().len());
//!
//! let class = mlp.predict_row(data.features().row(0))?;
//! assert!(class < 3);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod checkpoint;
pub mod config;
pub mod data;
pub mod error;
pub mod loss;
pub(crate) mod matmul;
pub mod matrix;
pub mod metrics;
pub mod mlp;
pub mod schedule;
pub mod train;

pub use checkpoint::{Checkpoint, MODEL_FORMAT_VERSION};
pub use config::{MlpConfig, PlateauConfig, RunConfig, load_config};
pub use data::Dataset;
pub use error::{Error, Result};
pub use matrix::Matrix;
pub use mlp::{Forward, Gradients, Mlp, Params};
pub use schedule::{PlateauSchedule, ScheduleEvent};
pub use train::{CancelToken, EpochReport, FitReport, StopReason};
