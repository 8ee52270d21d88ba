//! Plateau-triggered learning-rate decay.
//!
//! After each epoch the trainer reports the test accuracy. A strict improvement resets the
//! plateau counter; otherwise the counter grows, and every `patience` non-improving epochs
//! the learning rate is multiplied by `decay`. Once it drops below `min_learning_rate`
//! training should stop.

use crate::config::PlateauConfig;

/// What a single `observe` call decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleEvent {
    /// Accuracy strictly exceeded the best so far.
    Improved,
    /// No improvement; counter advanced but no decay yet.
    Plateau { counter: usize },
    /// The counter reached `patience` and the learning rate was decayed.
    Decayed { learning_rate: f64 },
    /// The decayed learning rate fell below the floor.
    Exhausted { learning_rate: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateauSchedule {
    config: PlateauConfig,
    learning_rate: f64,
    best: f64,
    counter: usize,
}

impl PlateauSchedule {
    pub fn new(learning_rate: f64, config: PlateauConfig) -> Self {
        Self {
            config,
            learning_rate,
            best: 0.0,
            counter: 0,
        }
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    #[inline]
    pub fn best(&self) -> f64 {
        self.best
    }

    #[inline]
    pub fn counter(&self) -> usize {
        self.counter
    }

    #[inline]
    pub fn config(&self) -> &PlateauConfig {
        &self.config
    }

    /// Overrides the best accuracy, e.g. after restoring a checkpoint.
    pub fn set_best(&mut self, best: f64) {
        self.best = best;
    }

    /// Feed one epoch's accuracy.
    pub fn observe(&mut self, accuracy: f64) -> ScheduleEvent {
        if accuracy > self.best {
            self.best = accuracy;
            self.counter = 0;
            return ScheduleEvent::Improved;
        }

        self.counter += 1;
        if self.counter < self.config.patience {
            return ScheduleEvent::Plateau {
                counter: self.counter,
            };
        }

        self.counter = 0;
        self.learning_rate *= self.config.decay;
        if self.learning_rate < self.config.min_learning_rate {
            ScheduleEvent::Exhausted {
                learning_rate: self.learning_rate,
            }
        } else {
            ScheduleEvent::Decayed {
                learning_rate: self.learning_rate,
            }
        }
    }
}
