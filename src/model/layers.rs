use burn::prelude::*;
use burn::module::Param;
use burn::tensor::activation::{sigmoid, softmax};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Xavier-uniform matrix drawn from an explicit RNG
pub fn xavier_uniform<B: Backend>(
    shape: [usize; 2],
    fan_in: usize,
    fan_out: usize,
    rng: &mut ChaCha8Rng,
    device: &B::Device,
) -> Tensor<B, 2> {
    let bound = (6.0 / (fan_in + fan_out) as f64).sqrt() as f32;
    let values: Vec<f32> = (0..shape[0] * shape[1])
        .map(|_| rng.gen_range(-bound..=bound))
        .collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

/// Inverted dropout with a mask drawn from `rng`
///
/// Identity when the backend does not track gradients (evaluation) or when `prob` is 0.
pub fn dropout<B: Backend>(input: Tensor<B, 2>, prob: f64, rng: &mut ChaCha8Rng) -> Tensor<B, 2> {
    if !B::ad_enabled() || prob <= 0.0 {
        return input;
    }

    let shape = input.dims();
    let scale = (1.0 / (1.0 - prob)) as f32;
    let mask: Vec<f32> = (0..shape[0] * shape[1])
        .map(|_| if rng.gen_bool(prob) { 0.0 } else { scale })
        .collect();
    let mask = Tensor::from_data(TensorData::new(mask, shape), &input.device());
    input.mul(mask)
}

/// Row-wise L2 normalization
///
/// The squared norm is clamped before the root so all-zero rows keep a finite gradient.
pub fn l2_normalize<B: Backend>(input: Tensor<B, 2>) -> Tensor<B, 2> {
    let norm = input.clone().powf_scalar(2.0).sum_dim(1).clamp_min(1e-24).sqrt();
    input.div(norm)
}

/// Neighborhood summary per location
///
/// Averages the embeddings of each location's neighbors (rows of `graph_neigh`),
/// normalizes, then squashes with a sigmoid.
pub fn neighborhood_readout<B: Backend>(emb: Tensor<B, 2>, graph_neigh: Tensor<B, 2>) -> Tensor<B, 2> {
    let row_sum = graph_neigh.clone().sum_dim(1);
    let summary = graph_neigh.matmul(emb).div(row_sum);
    sigmoid(l2_normalize(summary))
}

/// Bilinear discriminator scoring (embedding, summary) pairs
#[derive(Module, Debug)]
pub struct Discriminator<B: Backend> {
    /// Bilinear weight [hidden, hidden]
    weight: Param<Tensor<B, 2>>,
    /// Bias [1]
    bias: Param<Tensor<B, 1>>,
}

impl<B: Backend> Discriminator<B> {
    /// Initialize discriminator
    pub fn init(hidden: usize, rng: &mut ChaCha8Rng, device: &B::Device) -> Self {
        // fan computed as for a [1, hidden, hidden] bilinear weight
        let weight = xavier_uniform(
            [hidden, hidden],
            hidden * hidden,
            hidden,
            rng,
            device,
        );
        Self {
            weight: Param::from_tensor(weight),
            bias: Param::from_tensor(Tensor::zeros([1], device)),
        }
    }

    fn score(&self, emb: Tensor<B, 2>, summary: Tensor<B, 2>) -> Tensor<B, 2> {
        emb.matmul(self.weight.val())
            .mul(summary)
            .sum_dim(1)
            .add(self.bias.val().unsqueeze())
    }

    /// Raw scores [n, 2]: column 0 for the positive embedding, column 1 for the negative
    pub fn forward(
        &self,
        summary: Tensor<B, 2>,
        positive: Tensor<B, 2>,
        negative: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let pos = self.score(positive, summary.clone());
        let neg = self.score(negative, summary);
        Tensor::cat(vec![pos, neg], 1)
    }
}

/// Attention fusion of two per-location embeddings
#[derive(Module, Debug)]
pub struct AttentionFusion<B: Backend> {
    /// Projection [hidden, hidden]
    w_omega: Param<Tensor<B, 2>>,
    /// Scoring vector [hidden, 1]
    u_omega: Param<Tensor<B, 2>>,
}

impl<B: Backend> AttentionFusion<B> {
    /// Initialize fusion layer
    pub fn init(hidden: usize, rng: &mut ChaCha8Rng, device: &B::Device) -> Self {
        let w_omega = xavier_uniform([hidden, hidden], hidden, hidden, rng, device);
        let u_omega = xavier_uniform([hidden, 1], hidden, 1, rng, device);
        Self {
            w_omega: Param::from_tensor(w_omega),
            u_omega: Param::from_tensor(u_omega),
        }
    }

    fn attention_score(&self, emb: Tensor<B, 2>) -> Tensor<B, 2> {
        emb.matmul(self.w_omega.val()).tanh().matmul(self.u_omega.val())
    }

    /// Returns the fused embedding [n, hidden] and mixing weights [n, 2]
    pub fn forward(&self, emb1: Tensor<B, 2>, emb2: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let [n, _] = emb1.dims();
        let scores = Tensor::cat(
            vec![
                self.attention_score(emb1.clone()),
                self.attention_score(emb2.clone()),
            ],
            1,
        );
        let alpha = softmax(scores.add_scalar(1e-6), 1);

        let w1 = alpha.clone().slice([0..n, 0..1]);
        let w2 = alpha.clone().slice([0..n, 1..2]);
        let fused = emb1.mul(w1).add(emb2.mul(w2));

        (fused, alpha)
    }
}
