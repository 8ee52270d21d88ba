use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::loss::cross_entropy_loss;
use crate::metrics::accuracy;
use crate::schedule::ScheduleEvent;
use crate::{Error, Mlp, Result};

/// Cooperative stop flag for a running `train_with_cancel`.
///
/// Clone it, hand a clone to another thread, and call `cancel`. The trainer checks it
/// between mini-batches and between epochs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a training run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// All configured epochs completed.
    EpochLimit,
    /// The learning rate decayed below its floor.
    LearningRateFloor,
    /// A `CancelToken` was triggered.
    Cancelled,
}

/// Telemetry for one completed epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    /// 1-based.
    pub epoch: usize,
    /// Mean of the per-batch losses.
    pub loss: f64,
    /// Test-set accuracy after the epoch.
    pub accuracy: f64,
    /// Learning rate in effect at the end of the epoch (after any decay).
    pub learning_rate: f64,
    /// Accuracy beat the previous best and the parameters were checkpointed.
    pub improved: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// Test accuracy of the parameters at the end of training (not necessarily the best).
    pub final_accuracy: f64,
    pub best_accuracy: f64,
    pub stop: StopReason,
    pub epochs: Vec<EpochReport>,
}

impl Mlp {
    /// Train for the configured number of epochs.
    pub fn train(&mut self, batch_size: usize) -> Result<FitReport> {
        self.train_with_cancel(batch_size, &CancelToken::new())
    }

    /// Train until the epoch limit, the learning-rate floor, or cancellation.
    ///
    /// Each epoch shuffles the owned training partition, runs mini-batch gradient descent,
    /// evaluates on the test partition and feeds the accuracy to the plateau schedule.
    /// Improvements snapshot the parameters and, if a checkpoint path is configured, write
    /// them to disk. A failed checkpoint write is logged and training carries on.
    pub fn train_with_cancel(
        &mut self,
        batch_size: usize,
        cancel: &CancelToken,
    ) -> Result<FitReport> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }

        let mut epochs = Vec::new();
        let mut stop = StopReason::EpochLimit;

        'epochs: for epoch in 1..=self.epochs {
            if cancel.is_cancelled() {
                stop = StopReason::Cancelled;
                break;
            }

            self.train.shuffle(&mut self.rng);

            let mut batch_losses = 0.0_f64;
            let mut n_batches = 0_usize;
            for start in (0..self.train.len()).step_by(batch_size) {
                if cancel.is_cancelled() {
                    stop = StopReason::Cancelled;
                    break 'epochs;
                }
                let end = (start + batch_size).min(self.train.len());
                let (data, labels) = self.train.batch(start, end);
                let labels = labels.to_vec();

                let pass = self.forward(&data);
                batch_losses += cross_entropy_loss(&pass.predictions, &labels);
                n_batches += 1;
                self.backward(&data, &labels, pass);
            }

            let loss = batch_losses / n_batches.max(1) as f64;
            self.loss_history.push(loss);

            let acc = self.evaluate();
            let event = self.schedule.observe(acc);
            let improved = event == ScheduleEvent::Improved;

            log::info!(
                "epoch {epoch}/{}: loss={loss:.4} accuracy={:.2}% lr={:e}",
                self.epochs,
                acc * 100.0,
                self.learning_rate()
            );

            epochs.push(EpochReport {
                epoch,
                loss,
                accuracy: acc,
                learning_rate: self.learning_rate(),
                improved,
            });

            match event {
                ScheduleEvent::Improved => self.checkpoint_best(),
                ScheduleEvent::Plateau { .. } => {}
                ScheduleEvent::Decayed { learning_rate } => {
                    log::info!("learning rate reduced to {learning_rate:e}");
                }
                ScheduleEvent::Exhausted { learning_rate } => {
                    log::info!(
                        "learning rate {learning_rate:e} below floor {:e}, stopping",
                        self.schedule.config().min_learning_rate
                    );
                    stop = StopReason::LearningRateFloor;
                    break;
                }
            }
        }

        if stop == StopReason::Cancelled {
            log::info!("training cancelled after {} epochs", epochs.len());
        }

        Ok(FitReport {
            final_accuracy: self.evaluate(),
            best_accuracy: self.best_accuracy(),
            stop,
            epochs,
        })
    }

    /// Test-set accuracy of the current parameters.
    pub fn evaluate(&self) -> f64 {
        let pass = self.forward(self.test.features());
        accuracy(&pass.predictions, self.test.labels())
    }

    fn checkpoint_best(&mut self) {
        self.best_params = self.params.clone();
        let Some(path) = self.checkpoint_path.clone() else {
            return;
        };
        match self.save_best(&path) {
            Ok(()) => log::debug!(
                "checkpoint written to {} (accuracy {:.4})",
                path.display(),
                self.best_accuracy()
            ),
            Err(e) => log::warn!("{e}; keeping the in-memory snapshot only"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dataset, MlpConfig, PlateauConfig};

    fn blobs(seed: u64) -> Dataset {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        Dataset::gaussian_blobs(3, 40, 2, 4.0, 0.3, &mut rng).unwrap()
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let mut mlp = Mlp::new_with_seed(&blobs(0), &MlpConfig::default(), 0).unwrap();
        assert!(matches!(mlp.train(0), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn one_report_and_one_loss_per_epoch() {
        let config = MlpConfig {
            hidden_size: 8,
            learning_rate: 0.05,
            epochs: 7,
            plateau: PlateauConfig {
                min_learning_rate: 0.0,
                ..PlateauConfig::default()
            },
            checkpoint_path: None,
        };
        let mut mlp = Mlp::new_with_seed(&blobs(1), &config, 1).unwrap();
        let report = mlp.train(10).unwrap();

        assert_eq!(report.stop, StopReason::EpochLimit);
        assert_eq!(report.epochs.len(), mlp.epochs());
        assert_eq!(mlp.loss_history().len(), 7);
        for (i, e) in report.epochs.iter().enumerate() {
            assert_eq!(e.epoch, i + 1);
            assert_eq!(e.loss, mlp.loss_history()[i]);
            assert!(e.loss.is_finite());
        }
        assert_eq!(report.best_accuracy, mlp.best_accuracy());
        assert!(report.final_accuracy <= report.best_accuracy);
    }

    #[test]
    fn cancelled_token_stops_before_the_first_epoch() {
        let mut mlp = Mlp::new_with_seed(&blobs(2), &MlpConfig::default(), 2).unwrap();
        let before = mlp.params().clone();
        let token = CancelToken::new();
        token.cancel();

        let report = mlp.train_with_cancel(8, &token).unwrap();
        assert_eq!(report.stop, StopReason::Cancelled);
        assert!(report.epochs.is_empty());
        assert_eq!(mlp.params(), &before);
    }

    #[test]
    fn best_snapshot_tracks_improving_epochs() {
        let config = MlpConfig {
            hidden_size: 8,
            learning_rate: 0.05,
            epochs: 20,
            ..MlpConfig::default()
        };
        let mut mlp = Mlp::new_with_seed(&blobs(3), &config, 3).unwrap();
        let report = mlp.train(16).unwrap();

        let best_epoch = report
            .epochs
            .iter()
            .rev()
            .find(|e| e.improved)
            .expect("the first epoch with non-zero accuracy improves");
        assert_eq!(best_epoch.accuracy, mlp.best_accuracy());

        mlp.restore_best();
        assert_eq!(mlp.evaluate(), mlp.best_accuracy());
    }
}
