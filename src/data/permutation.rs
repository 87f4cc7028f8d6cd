use burn::prelude::*;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Draws row permutations used to corrupt feature matrices into negative samples.
///
/// Every call samples a fresh permutation; the sampler never caches one.
#[derive(Debug, Clone)]
pub struct PermutationSampler {
    rng: ChaCha8Rng,
}

impl PermutationSampler {
    /// Create sampler from an explicit RNG stream
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }

    /// Uniform random permutation of `0..n`
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng);
        indices
    }

    /// Copy of `feat` with its rows in a random order
    pub fn shuffle_rows<B: Backend>(&mut self, feat: &Tensor<B, 2>) -> Tensor<B, 2> {
        let [n, _] = feat.dims();
        let indices: Vec<i64> = self
            .permutation(n)
            .into_iter()
            .map(|i| i as i64)
            .collect();
        let indices = Tensor::<B, 1, Int>::from_data(TensorData::new(indices, [n]), &feat.device());
        feat.clone().select(0, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{array_to_tensor, tensor_to_array};
    use crate::utils::random::{stream_rng, RngStream};
    use burn::backend::NdArray;
    use ndarray::Array2;

    type TestBackend = NdArray<f32>;

    fn sorted_rows(array: &Array2<f32>) -> Vec<Vec<f32>> {
        let mut rows: Vec<Vec<f32>> = array.outer_iter().map(|r| r.to_vec()).collect();
        rows.sort_by(|a, b| a.partial_cmp(b).unwrap());
        rows
    }

    #[test]
    fn test_permutation_is_bijection() {
        let mut sampler = PermutationSampler::new(stream_rng(7, RngStream::Permutation));
        let mut perm = sampler.permutation(100);
        perm.sort_unstable();
        assert_eq!(perm, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_rows_preserves_multiset() {
        let device = <TestBackend as Backend>::Device::default();
        let original = Array2::from_shape_fn((50, 4), |(i, j)| (i * 4 + j) as f32);
        let feat = array_to_tensor::<TestBackend>(&original, &device);

        let mut sampler = PermutationSampler::new(stream_rng(7, RngStream::Permutation));
        let first = tensor_to_array(sampler.shuffle_rows(&feat)).unwrap();
        let second = tensor_to_array(sampler.shuffle_rows(&feat)).unwrap();

        assert_eq!(first.dim(), original.dim());
        assert_eq!(sorted_rows(&first), sorted_rows(&original));
        assert_eq!(sorted_rows(&second), sorted_rows(&original));

        // 50! orderings: a repeat or an identity draw would point at a broken sampler
        assert_ne!(first, original);
        assert_ne!(first, second);
    }

    #[test]
    fn test_input_untouched() {
        let device = <TestBackend as Backend>::Device::default();
        let original = Array2::from_shape_fn((10, 3), |(i, j)| (i + j) as f32);
        let feat = array_to_tensor::<TestBackend>(&original, &device);

        let mut sampler = PermutationSampler::new(stream_rng(1, RngStream::Permutation));
        let _ = sampler.shuffle_rows(&feat);

        assert_eq!(tensor_to_array(feat).unwrap(), original);
    }

    #[test]
    fn test_same_seed_same_permutations() {
        let mut a = PermutationSampler::new(stream_rng(2024, RngStream::Permutation));
        let mut b = PermutationSampler::new(stream_rng(2024, RngStream::Permutation));
        for _ in 0..5 {
            assert_eq!(a.permutation(30), b.permutation(30));
        }
    }
}
