use crate::model::architecture::DualOmicsOutput;
use burn::prelude::*;
use burn::nn::loss::{BinaryCrossEntropyLossConfig, MseLoss, Reduction};
use burn::tensor::ElementConversion;
use serde::{Deserialize, Serialize};

/// Lower bound on the product of norms in cosine similarity
const COSINE_EPS: f64 = 1e-8;

/// Scalar weights of the five loss terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossWeights {
    /// Contrastive loss, first modality
    pub csl_omics1: f64,
    /// Contrastive loss, second modality
    pub csl_omics2: f64,
    /// Reconstruction loss, first modality
    pub rec_omics1: f64,
    /// Reconstruction loss, second modality
    pub rec_omics2: f64,
    /// Cross-modality cosine alignment
    pub cross: f64,
}

impl LossWeights {
    /// Build from a `[w1..w5]` factor vector
    pub const fn from_factors(factors: [f64; 5]) -> Self {
        Self {
            csl_omics1: factors[0],
            csl_omics2: factors[1],
            rec_omics1: factors[2],
            rec_omics2: factors[3],
            cross: factors[4],
        }
    }

    /// Factor vector `[w1..w5]`
    pub fn factors(&self) -> [f64; 5] {
        [
            self.csl_omics1,
            self.csl_omics2,
            self.rec_omics1,
            self.rec_omics2,
            self.cross,
        ]
    }
}

/// Ground truth the loss compares model outputs against
#[derive(Debug, Clone)]
pub struct LossTargets<B: Backend> {
    pub feat_omics1: Tensor<B, 2>,
    pub feat_omics2: Tensor<B, 2>,
    pub labels_omics1: Tensor<B, 2, Int>,
    pub labels_omics2: Tensor<B, 2, Int>,
}

/// Every loss term of one forward pass, still on the device
#[derive(Debug, Clone)]
pub struct LossBreakdown<B: Backend> {
    pub csl_omics1: Tensor<B, 1>,
    pub csl_omics2: Tensor<B, 1>,
    pub rec_omics1: Tensor<B, 1>,
    pub rec_omics2: Tensor<B, 1>,
    pub cross: Tensor<B, 1>,
    /// Weighted sum of all terms
    pub total: Tensor<B, 1>,
}

/// Host-side copy of a loss breakdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LossComponents {
    pub csl_omics1: f64,
    pub csl_omics2: f64,
    pub rec_omics1: f64,
    pub rec_omics2: f64,
    pub cross: f64,
    pub total: f64,
}

impl<B: Backend> LossBreakdown<B> {
    /// Read every term back to the host
    pub fn components(&self) -> LossComponents {
        let scalar = |t: &Tensor<B, 1>| t.clone().into_scalar().elem::<f64>();
        LossComponents {
            csl_omics1: scalar(&self.csl_omics1),
            csl_omics2: scalar(&self.csl_omics2),
            rec_omics1: scalar(&self.rec_omics1),
            rec_omics2: scalar(&self.rec_omics2),
            cross: scalar(&self.cross),
            total: scalar(&self.total),
        }
    }
}

/// Contrastive loss of one modality
///
/// Binary cross-entropy on raw scores (sigmoid applied internally) for both
/// discriminator outputs, summed.
pub fn contrastive_loss<B: Backend>(
    score_real: Tensor<B, 2>,
    score_shuffled: Tensor<B, 2>,
    labels: Tensor<B, 2, Int>,
) -> Tensor<B, 1> {
    let bce = BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(&score_real.device());

    bce.forward(score_real, labels.clone())
        .add(bce.forward(score_shuffled, labels))
}

/// Mean squared reconstruction error
pub fn reconstruction_loss<B: Backend>(
    feat: Tensor<B, 2>,
    reconstruction: Tensor<B, 2>,
) -> Tensor<B, 1> {
    MseLoss::new().forward(feat, reconstruction, Reduction::Mean)
}

/// Per-row cosine similarity [n]
pub fn cosine_similarity<B: Backend>(x: Tensor<B, 2>, y: Tensor<B, 2>) -> Tensor<B, 1> {
    let dot = x.clone().mul(y.clone()).sum_dim(1);
    let x_sq = x.powf_scalar(2.0).sum_dim(1);
    let y_sq = y.powf_scalar(2.0).sum_dim(1);
    let denom = x_sq.mul(y_sq).clamp_min(COSINE_EPS * COSINE_EPS).sqrt();
    dot.div(denom).squeeze(1)
}

/// One minus the mean per-location cosine similarity of two embeddings; lies in [0, 2]
pub fn cross_modality_loss<B: Backend>(emb1: Tensor<B, 2>, emb2: Tensor<B, 2>) -> Tensor<B, 1> {
    cosine_similarity(emb1, emb2).mean().neg().add_scalar(1.0)
}

/// Weighted combination of the contrastive, reconstruction and alignment terms
#[derive(Debug, Clone, Copy)]
pub struct LossComposer {
    weights: LossWeights,
}

impl LossComposer {
    pub fn new(weights: LossWeights) -> Self {
        Self { weights }
    }

    /// Compute every term and the weighted total
    pub fn compose<B: Backend>(
        &self,
        output: &DualOmicsOutput<B>,
        targets: &LossTargets<B>,
    ) -> LossBreakdown<B> {
        let csl_omics1 = contrastive_loss(
            output.omics1.score_real.clone(),
            output.omics1.score_shuffled.clone(),
            targets.labels_omics1.clone(),
        );
        let csl_omics2 = contrastive_loss(
            output.omics2.score_real.clone(),
            output.omics2.score_shuffled.clone(),
            targets.labels_omics2.clone(),
        );
        let rec_omics1 = reconstruction_loss(
            targets.feat_omics1.clone(),
            output.omics1.reconstruction.clone(),
        );
        let rec_omics2 = reconstruction_loss(
            targets.feat_omics2.clone(),
            output.omics2.reconstruction.clone(),
        );
        let cross = cross_modality_loss(
            output.omics1.embedding.clone(),
            output.omics2.embedding.clone(),
        );

        let w = &self.weights;
        let total = csl_omics1.clone().mul_scalar(w.csl_omics1)
            .add(csl_omics2.clone().mul_scalar(w.csl_omics2))
            .add(rec_omics1.clone().mul_scalar(w.rec_omics1))
            .add(rec_omics2.clone().mul_scalar(w.rec_omics2))
            .add(cross.clone().mul_scalar(w.cross));

        LossBreakdown {
            csl_omics1,
            csl_omics2,
            rec_omics1,
            rec_omics2,
            cross,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::architecture::ModalityOutput;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn scalar(t: Tensor<TestBackend, 1>) -> f64 {
        t.into_scalar().elem::<f64>()
    }

    fn matrix(rows: &[[f32; 3]]) -> Tensor<TestBackend, 2> {
        let device = <TestBackend as Backend>::Device::default();
        let values: Vec<f32> = rows.iter().flatten().copied().collect();
        Tensor::from_data(TensorData::new(values, [rows.len(), 3]), &device)
    }

    fn labels(n: usize) -> Tensor<TestBackend, 2, Int> {
        let device = <TestBackend as Backend>::Device::default();
        let values: Vec<i64> = (0..n).flat_map(|_| [1i64, 0]).collect();
        Tensor::from_data(TensorData::new(values, [n, 2]), &device)
    }

    fn scores(rows: &[[f32; 2]]) -> Tensor<TestBackend, 2> {
        let device = <TestBackend as Backend>::Device::default();
        let values: Vec<f32> = rows.iter().flatten().copied().collect();
        Tensor::from_data(TensorData::new(values, [rows.len(), 2]), &device)
    }

    fn fixture() -> (DualOmicsOutput<TestBackend>, LossTargets<TestBackend>) {
        let emb1 = matrix(&[[1.0, 2.0, 3.0], [-1.0, 0.5, 0.0]]);
        let emb2 = matrix(&[[0.5, -2.0, 1.0], [2.0, 0.0, 1.0]]);
        let feat1 = matrix(&[[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]);
        let feat2 = matrix(&[[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);

        let modality = |emb: Tensor<TestBackend, 2>, rec: Tensor<TestBackend, 2>| ModalityOutput {
            embedding: emb,
            reconstruction: rec,
            score_real: scores(&[[2.0, -1.0], [0.5, 0.3]]),
            score_shuffled: scores(&[[-0.5, 1.5], [1.0, -2.0]]),
        };

        let output = DualOmicsOutput {
            omics1: modality(emb1.clone(), feat1.clone().mul_scalar(0.5)),
            omics2: modality(emb2.clone(), feat2.clone().add_scalar(0.25)),
            combined: emb1.clone(),
            attention: scores(&[[0.5, 0.5], [0.5, 0.5]]),
        };
        let targets = LossTargets {
            feat_omics1: feat1,
            feat_omics2: feat2,
            labels_omics1: labels(2),
            labels_omics2: labels(2),
        };
        (output, targets)
    }

    #[test]
    fn test_contrastive_loss_matches_formula() {
        let real = scores(&[[2.0, -1.0]]);
        let shuffled = scores(&[[0.0, 0.0]]);
        let loss = scalar(contrastive_loss(real, shuffled, labels(1)));

        let softplus = |x: f64| (1.0 + x.exp()).ln();
        // label 1 on column 0, label 0 on column 1
        let real_term = (softplus(-2.0) + softplus(-1.0)) / 2.0;
        let shuffled_term = (softplus(0.0) + softplus(0.0)) / 2.0;
        assert!((loss - (real_term + shuffled_term)).abs() < 1e-5);
    }

    #[test]
    fn test_reconstruction_loss() {
        let feat = matrix(&[[1.0, 2.0, 3.0]]);
        let rec = matrix(&[[1.0, 0.0, 4.0]]);
        let loss = scalar(reconstruction_loss(feat.clone(), rec));
        assert!((loss - 5.0 / 3.0).abs() < 1e-6);
        assert_eq!(scalar(reconstruction_loss(feat.clone(), feat)), 0.0);
    }

    #[test]
    fn test_cross_modality_identical_and_opposite() {
        let emb = matrix(&[[1.0, 2.0, 3.0], [-0.5, 4.0, 0.25], [7.0, 0.0, -1.0]]);

        let same = scalar(cross_modality_loss(emb.clone(), emb.clone()));
        assert!(same.abs() < 1e-6, "identical embeddings gave {}", same);

        let opposite = scalar(cross_modality_loss(emb.clone(), emb.neg()));
        assert!((opposite - 2.0).abs() < 1e-6, "opposite embeddings gave {}", opposite);
    }

    #[test]
    fn test_cross_modality_orthogonal() {
        let a = matrix(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let b = matrix(&[[0.0, 3.0, 0.0], [0.0, 0.0, 2.0]]);
        assert!((scalar(cross_modality_loss(a, b)) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_finite() {
        let a = matrix(&[[0.0, 0.0, 0.0]]);
        let b = matrix(&[[1.0, 2.0, 3.0]]);
        let sim = scalar(cosine_similarity(a, b));
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_zero_weights_give_zero_total() {
        let (output, targets) = fixture();
        let composer = LossComposer::new(LossWeights::from_factors([0.0; 5]));
        let components = composer.compose(&output, &targets).components();
        assert_eq!(components.total, 0.0);
        assert!(components.csl_omics1 > 0.0);
    }

    #[test]
    fn test_total_is_weighted_sum() {
        let (output, targets) = fixture();
        let weights = LossWeights::from_factors([1.0, 1.0, 10.0, 15.0, 3.0]);
        let c = LossComposer::new(weights).compose(&output, &targets).components();

        let expected = c.csl_omics1 + c.csl_omics2 + 10.0 * c.rec_omics1 + 15.0 * c.rec_omics2 + 3.0 * c.cross;
        assert!((c.total - expected).abs() < 1e-4);
        assert!(c.total.is_finite() && c.total >= 0.0);
        assert!(c.cross >= 0.0 && c.cross <= 2.0);
    }

    #[test]
    fn test_factor_round_trip() {
        let factors = [1.0, 5.0, 10.0, 25.0, 1.0];
        assert_eq!(LossWeights::from_factors(factors).factors(), factors);
    }
}
