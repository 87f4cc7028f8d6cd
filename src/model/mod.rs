pub mod architecture;
pub mod checkpoint;
pub mod layers;
pub mod loss;

use crate::data::OmicsTensors;
use crate::model::architecture::{OmicsEncoder, SpamiModel};
use crate::model::layers::AttentionFusion;
use crate::utils::random::{stream_rng, RngStream};
use burn::prelude::*;

/// Model configuration
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// Feature dimension of the first modality
    pub omics1_input_dim: usize,

    /// Feature dimension of the second modality
    pub omics2_input_dim: usize,

    /// Embedding dimension
    #[config(default = "64")]
    pub out_dim: usize,

    /// Dropout rate on encoder inputs
    #[config(default = "0.15")]
    pub dropout: f64,
}

impl ModelConfig {
    /// Initialize the model bound to both modalities' graphs
    ///
    /// Parameters are drawn from the `Init` stream of `seed`.
    pub fn init<B: Backend>(
        &self,
        omics1: &OmicsTensors<B>,
        omics2: &OmicsTensors<B>,
        seed: u64,
        device: &B::Device,
    ) -> SpamiModel<B> {
        let mut rng = stream_rng(seed, RngStream::Init);

        let encoder_omics1 = OmicsEncoder::init(
            self.omics1_input_dim,
            self.out_dim,
            self.dropout,
            omics1.adj.clone(),
            omics1.graph_neigh.clone(),
            &mut rng,
            device,
        );
        let encoder_omics2 = OmicsEncoder::init(
            self.omics2_input_dim,
            self.out_dim,
            self.dropout,
            omics2.adj.clone(),
            omics2.graph_neigh.clone(),
            &mut rng,
            device,
        );
        let fusion = AttentionFusion::init(self.out_dim, &mut rng, device);

        SpamiModel::new(encoder_omics1, encoder_omics2, fusion)
    }
}
