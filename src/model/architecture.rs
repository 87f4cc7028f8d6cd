use crate::model::layers::{dropout, neighborhood_readout, xavier_uniform, AttentionFusion, Discriminator};
use burn::prelude::*;
use burn::module::Param;
use burn::tensor::activation::relu;
use burn::tensor::backend::AutodiffBackend;
use rand_chacha::ChaCha8Rng;

/// Real and corrupted features of one modality
#[derive(Debug, Clone)]
pub struct ModalityInput<B: Backend> {
    /// Original features [n, d]
    pub feat: Tensor<B, 2>,
    /// Row-shuffled features [n, d]
    pub feat_shuffled: Tensor<B, 2>,
}

/// Forward-pass input for both modalities
#[derive(Debug, Clone)]
pub struct DualOmicsInput<B: Backend> {
    pub omics1: ModalityInput<B>,
    pub omics2: ModalityInput<B>,
}

impl<B: AutodiffBackend> DualOmicsInput<B> {
    /// Same input on the inner (gradient-free) backend
    pub fn inner(self) -> DualOmicsInput<B::InnerBackend> {
        let inner = |m: ModalityInput<B>| ModalityInput {
            feat: m.feat.inner(),
            feat_shuffled: m.feat_shuffled.inner(),
        };
        DualOmicsInput {
            omics1: inner(self.omics1),
            omics2: inner(self.omics2),
        }
    }
}

/// Forward-pass output of one modality
#[derive(Debug, Clone)]
pub struct ModalityOutput<B: Backend> {
    /// Graph-aware embedding [n, out_dim]
    pub embedding: Tensor<B, 2>,
    /// Reconstructed features [n, d]
    pub reconstruction: Tensor<B, 2>,
    /// Raw discriminator scores against the real summary [n, 2]
    pub score_real: Tensor<B, 2>,
    /// Raw discriminator scores against the shuffled summary [n, 2]
    pub score_shuffled: Tensor<B, 2>,
}

/// Forward-pass output for both modalities plus their fusion
#[derive(Debug, Clone)]
pub struct DualOmicsOutput<B: Backend> {
    pub omics1: ModalityOutput<B>,
    pub omics2: ModalityOutput<B>,
    /// Fused embedding [n, out_dim]
    pub combined: Tensor<B, 2>,
    /// Mixing weights of the fusion [n, 2]
    pub attention: Tensor<B, 2>,
}

/// Contract between the training loop and a dual-omics architecture
///
/// Graph structure is bound at construction. `rng` feeds stochastic layers and is
/// ignored when the backend does not track gradients.
pub trait DualOmicsModel<B: Backend>: Module<B> {
    fn forward(&self, input: DualOmicsInput<B>, rng: &mut ChaCha8Rng) -> DualOmicsOutput<B>;
}

/// Graph contrastive encoder for one modality
#[derive(Module, Debug)]
pub struct OmicsEncoder<B: Backend> {
    /// Encoder weight [in_dim, out_dim]
    weight1: Param<Tensor<B, 2>>,
    /// Decoder weight [out_dim, in_dim]
    weight2: Param<Tensor<B, 2>>,
    disc: Discriminator<B>,
    /// Adjacency with self-loops
    adj: Tensor<B, 2>,
    /// Neighborhood indicator with self-loops
    graph_neigh: Tensor<B, 2>,
    dropout: f64,
}

impl<B: Backend> OmicsEncoder<B> {
    /// Initialize encoder bound to a spatial graph
    pub fn init(
        in_dim: usize,
        out_dim: usize,
        dropout: f64,
        adj: Tensor<B, 2>,
        graph_neigh: Tensor<B, 2>,
        rng: &mut ChaCha8Rng,
        device: &B::Device,
    ) -> Self {
        let weight1 = xavier_uniform([in_dim, out_dim], in_dim, out_dim, rng, device);
        let weight2 = xavier_uniform([out_dim, in_dim], out_dim, in_dim, rng, device);
        let disc = Discriminator::init(out_dim, rng, device);

        Self {
            weight1: Param::from_tensor(weight1),
            weight2: Param::from_tensor(weight2),
            disc,
            adj,
            graph_neigh,
            dropout,
        }
    }

    fn propagate(&self, feat: Tensor<B, 2>, rng: &mut ChaCha8Rng) -> Tensor<B, 2> {
        let z = dropout(feat, self.dropout, rng).matmul(self.weight1.val());
        self.adj.clone().matmul(z)
    }

    pub fn forward(&self, input: ModalityInput<B>, rng: &mut ChaCha8Rng) -> ModalityOutput<B> {
        let z = self.propagate(input.feat, rng);
        let reconstruction = self.adj.clone().matmul(z.clone().matmul(self.weight2.val()));
        let z_a = self.propagate(input.feat_shuffled, rng);

        let emb = relu(z.clone());
        let emb_a = relu(z_a);

        let g = neighborhood_readout(emb.clone(), self.graph_neigh.clone());
        let g_a = neighborhood_readout(emb_a.clone(), self.graph_neigh.clone());

        let score_real = self.disc.forward(g, emb.clone(), emb_a.clone());
        let score_shuffled = self.disc.forward(g_a, emb_a, emb);

        ModalityOutput {
            embedding: z,
            reconstruction,
            score_real,
            score_shuffled,
        }
    }
}

/// Two graph encoders joined by attention fusion
#[derive(Module, Debug)]
pub struct SpamiModel<B: Backend> {
    encoder_omics1: OmicsEncoder<B>,
    encoder_omics2: OmicsEncoder<B>,
    fusion: AttentionFusion<B>,
}

impl<B: Backend> SpamiModel<B> {
    pub fn new(
        encoder_omics1: OmicsEncoder<B>,
        encoder_omics2: OmicsEncoder<B>,
        fusion: AttentionFusion<B>,
    ) -> Self {
        Self {
            encoder_omics1,
            encoder_omics2,
            fusion,
        }
    }
}

impl<B: Backend> DualOmicsModel<B> for SpamiModel<B> {
    fn forward(&self, input: DualOmicsInput<B>, rng: &mut ChaCha8Rng) -> DualOmicsOutput<B> {
        let omics1 = self.encoder_omics1.forward(input.omics1, rng);
        let omics2 = self.encoder_omics2.forward(input.omics2, rng);
        let (combined, attention) = self
            .fusion
            .forward(omics1.embedding.clone(), omics2.embedding.clone());

        DualOmicsOutput {
            omics1,
            omics2,
            combined,
            attention,
        }
    }
}
