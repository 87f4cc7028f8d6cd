use crate::model::loss::LossComponents;
use crate::training::TrainingState;
use std::time::{Duration, Instant};

/// Training callback trait
///
/// Callbacks observe the run. They never touch the model or the optimizer.
pub trait TrainingCallback: Send {
    /// Called at the start of training
    fn on_train_begin(&mut self, _epochs: usize) {}

    /// Called after every parameter update
    fn on_epoch_end(&mut self, _epoch: usize, _state: &TrainingState, _losses: &LossComponents) {}

    /// Called after the last epoch
    fn on_train_end(&mut self, _state: &TrainingState) {}
}

/// Callback manager that handles multiple callbacks
#[derive(Default)]
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainingCallback>>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a callback
    pub fn add_callback<C: TrainingCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn on_train_begin(&mut self, epochs: usize) {
        for callback in &mut self.callbacks {
            callback.on_train_begin(epochs);
        }
    }

    pub fn on_epoch_end(&mut self, epoch: usize, state: &TrainingState, losses: &LossComponents) {
        for callback in &mut self.callbacks {
            callback.on_epoch_end(epoch, state, losses);
        }
    }

    pub fn on_train_end(&mut self, state: &TrainingState) {
        for callback in &mut self.callbacks {
            callback.on_train_end(state);
        }
    }
}

/// Logs every loss term each `log_frequency` epochs
pub struct ProgressLoggerCallback {
    log_frequency: usize,
}

impl ProgressLoggerCallback {
    pub fn new(log_frequency: usize) -> Self {
        Self {
            log_frequency: log_frequency.max(1),
        }
    }
}

impl TrainingCallback for ProgressLoggerCallback {
    fn on_epoch_end(&mut self, epoch: usize, _state: &TrainingState, losses: &LossComponents) {
        if (epoch + 1) % self.log_frequency == 0 {
            tracing::info!(
                "Epoch {} - Loss: {:.4} (csl {:.4}/{:.4}, rec {:.4}/{:.4}, cross {:.4})",
                epoch + 1,
                losses.total,
                losses.csl_omics1,
                losses.csl_omics2,
                losses.rec_omics1,
                losses.rec_omics2,
                losses.cross
            );
        }
    }
}

/// Timer callback that tracks training time
#[derive(Default)]
pub struct TimerCallback {
    start_time: Option<Instant>,
    last_epoch: Option<Instant>,
    epoch_times: Vec<Duration>,
}

impl TimerCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get average epoch time
    pub fn average_epoch_time(&self) -> Option<Duration> {
        if self.epoch_times.is_empty() {
            None
        } else {
            let total: Duration = self.epoch_times.iter().sum();
            Some(total / self.epoch_times.len() as u32)
        }
    }

    /// Get total training time
    pub fn total_time(&self) -> Option<Duration> {
        self.start_time.map(|t| t.elapsed())
    }
}

impl TrainingCallback for TimerCallback {
    fn on_train_begin(&mut self, epochs: usize) {
        let now = Instant::now();
        self.start_time = Some(now);
        self.last_epoch = Some(now);
        tracing::info!("Training started ({} epochs)", epochs);
    }

    fn on_epoch_end(&mut self, _epoch: usize, _state: &TrainingState, _losses: &LossComponents) {
        let now = Instant::now();
        if let Some(last) = self.last_epoch.replace(now) {
            self.epoch_times.push(now - last);
        }
    }

    fn on_train_end(&mut self, state: &TrainingState) {
        if let Some(start) = self.start_time {
            tracing::info!(
                "Training completed in {:.2?} ({} epochs, {:.2?} per epoch)",
                start.elapsed(),
                state.epoch,
                self.average_epoch_time().unwrap_or_default()
            );
        }
    }
}
