use crate::data::permutation::PermutationSampler;
use crate::data::{DualOmicsData, OmicsDataset, OmicsTensors};
use crate::error::SpamiError;
use crate::model::architecture::{DualOmicsInput, DualOmicsModel, ModalityInput};
use crate::model::loss::{LossComposer, LossTargets};
use crate::training::callbacks::{CallbackManager, ProgressLoggerCallback, TimerCallback, TrainingCallback};
use crate::training::finalizer::RunFinalizer;
use crate::training::{TrainingConfig, TrainingResult, TrainingState};
use crate::utils::random::{stream_rng, RngStream};
use anyhow::{Context, Result};
use burn::module::AutodiffModule;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::{debug, info};

/// A model after its last parameter update, ready to be finalized
pub struct FittedRun<B: AutodiffBackend, M> {
    /// Trained model, still on the autodiff backend
    pub model: M,
    /// Loss history of the run
    pub state: TrainingState,
    /// Real and shuffled inputs of the last epoch
    pub last_input: DualOmicsInput<B>,
}

/// Trainer for dual-omics models
pub struct Trainer<B: AutodiffBackend> {
    /// Training configuration
    config: TrainingConfig,
    /// Device
    device: B::Device,
    callbacks: CallbackManager,
    show_progress: bool,
}

impl<B: AutodiffBackend> Trainer<B> {
    /// Create new trainer with the default progress logger and timer callbacks
    pub fn new(config: TrainingConfig, device: B::Device) -> Self {
        let mut callbacks = CallbackManager::new();
        callbacks.add_callback(ProgressLoggerCallback::new(100));
        callbacks.add_callback(TimerCallback::new());

        Self {
            config,
            device,
            callbacks,
            show_progress: true,
        }
    }

    /// Register an extra callback
    pub fn with_callback<C: TrainingCallback + 'static>(mut self, callback: C) -> Self {
        self.callbacks.add_callback(callback);
        self
    }

    /// Show or hide the epoch progress bar
    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(self.config.epochs as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} epochs {msg}",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }

    /// Run the configured number of epochs on an initialized model
    ///
    /// Every epoch draws fresh row permutations for both modalities, runs one forward
    /// pass and applies one Adam update. A non-finite loss aborts the run with
    /// [`SpamiError::NumericDivergence`].
    pub fn fit<M>(
        &mut self,
        mut model: M,
        omics1: &OmicsTensors<B>,
        omics2: &OmicsTensors<B>,
    ) -> Result<FittedRun<B, M>>
    where
        M: AutodiffModule<B> + DualOmicsModel<B>,
    {
        self.config.validate()?;
        info!(
            "Training '{}' for {} epochs (lr {}, factors {:?})",
            self.config.dataset,
            self.config.epochs,
            self.config.learning_rate,
            self.config.factors.factors()
        );

        let composer = LossComposer::new(self.config.factors);
        let targets = LossTargets {
            feat_omics1: omics1.feat.clone(),
            feat_omics2: omics2.feat.clone(),
            labels_omics1: omics1.labels.clone(),
            labels_omics2: omics2.labels.clone(),
        };

        let weight_decay = (self.config.weight_decay > 0.0)
            .then(|| WeightDecayConfig::new(self.config.weight_decay as f32));
        let mut optim = AdamConfig::new()
            .with_epsilon(1e-8)
            .with_weight_decay(weight_decay)
            .init::<B, M>();

        let mut sampler = PermutationSampler::new(stream_rng(self.config.seed, RngStream::Permutation));
        let mut dropout_rng = stream_rng(self.config.seed, RngStream::Dropout);

        let mut state = TrainingState::new();
        let mut last_input = None;
        let progress = self.progress_bar();

        self.callbacks.on_train_begin(self.config.epochs);

        while !state.is_finished(self.config.epochs) {
            let epoch = state.epoch;
            let input = DualOmicsInput {
                omics1: ModalityInput {
                    feat: omics1.feat.clone(),
                    feat_shuffled: sampler.shuffle_rows(&omics1.feat),
                },
                omics2: ModalityInput {
                    feat: omics2.feat.clone(),
                    feat_shuffled: sampler.shuffle_rows(&omics2.feat),
                },
            };

            let output = model.forward(input.clone(), &mut dropout_rng);
            let loss = composer.compose(&output, &targets);
            let components = loss.components();

            if !components.total.is_finite() {
                progress.abandon();
                return Err(SpamiError::NumericDivergence {
                    epoch,
                    value: components.total,
                }
                .into());
            }

            // burn builds a fresh gradient set on every backward pass
            let grads = loss.total.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(self.config.learning_rate, model, grads);

            state.record(components);
            debug!("Epoch {}: {:?}", epoch + 1, components);
            self.callbacks.on_epoch_end(epoch, &state, &components);

            progress.set_message(format!("loss {:.4}", components.total));
            progress.inc(1);
            last_input = Some(input);
        }

        progress.finish_with_message(format!(
            "loss {:.4}",
            state.last_loss().unwrap_or(f64::NAN)
        ));
        self.callbacks.on_train_end(&state);

        let last_input = last_input.context("Training ran no epochs")?;
        Ok(FittedRun {
            model,
            state,
            last_input,
        })
    }

    /// Build the model for `data`, train it and persist the run's artifacts
    pub fn train(&mut self, data: &DualOmicsData) -> Result<TrainingResult> {
        let start_time = Instant::now();

        let omics1 = OmicsTensors::<B>::from_dataset(data.omics1(), &self.device);
        let omics2 = OmicsTensors::<B>::from_dataset(data.omics2(), &self.device);

        let model_config = self
            .config
            .model_config(data.omics1().n_features(), data.omics2().n_features());
        let model = model_config.init::<B>(&omics1, &omics2, self.config.seed, &self.device);
        info!(
            "Initialized model: {} locations, input dims {} / {}, out_dim {}",
            data.n_locations(),
            model_config.omics1_input_dim,
            model_config.omics2_input_dim,
            model_config.out_dim
        );

        let run = self.fit(model, &omics1, &omics2)?;

        let artifacts = self.config.artifact_paths();
        let outputs = RunFinalizer::new(artifacts.clone(), self.config.clone(), model_config)
            .finalize(&run)?;

        Ok(TrainingResult {
            state: run.state,
            artifacts,
            embedding: outputs.embedding,
            attention: outputs.attention,
            duration_secs: start_time.elapsed().as_secs_f64(),
        })
    }
}

/// Pair two modalities, train on `device` and persist the artifacts
pub fn train<B: AutodiffBackend>(
    omics1: OmicsDataset,
    omics2: OmicsDataset,
    config: TrainingConfig,
    device: B::Device,
) -> Result<TrainingResult> {
    let data = DualOmicsData::new(omics1, omics2)?;
    let mut trainer = Trainer::<B>::new(config, device);
    trainer.train(&data)
}
