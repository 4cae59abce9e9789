// ============================================================
// Layer 4 — Token Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<TokenSample>
// into tensors for the classifier.
//
// How batching works here:
//   Input:  Vec of N TokenSamples, each with F features
//   Output: TokenBatch with features [N, F] and labels [N]
//
//   We flatten all feature rows into one long Vec, then reshape:
//   [s1_f1, s1_f2, ..., s1_fF, s2_f1, ..., sN_fF] → [N, F]
//
// Sample ids travel alongside the tensors as a plain Vec so the
// evaluator can map each prediction back to its token.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TokenSample;

// ─── TokenBatch ───────────────────────────────────────────────────────────────
/// A batch of token samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct TokenBatch<B: Backend> {
    /// Flat token indices, one per row
    pub ids: Vec<usize>,

    /// Feature matrix, shape [batch_size, n_features]
    pub features: Tensor<B, 2>,

    /// Class targets, shape [batch_size], values 0 or 1
    pub labels: Tensor<B, 1, Int>,
}

// ─── TokenBatcher ─────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created in the right place.
#[derive(Clone, Debug)]
pub struct TokenBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TokenBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TokenSample, TokenBatch<B>> for TokenBatcher<B> {
    fn batch(&self, items: Vec<TokenSample>) -> TokenBatch<B> {
        let batch_size = items.len();
        // All rows have the same width (validated by the extractor)
        let n_features = items.first().map_or(0, |s| s.features.len());

        let ids: Vec<usize> = items.iter().map(|s| s.id).collect();

        let features_flat: Vec<f32> = items
            .iter()
            .flat_map(|s| s.features.iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| s.label as i32)
            .collect();

        let features = Tensor::<B, 1>::from_floats(
            features_flat.as_slice(), &self.device
        ).reshape([batch_size, n_features]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            labels.as_slice(), &self.device
        );

        TokenBatch { ids, features, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_ids() {
        let batcher = TokenBatcher::<NdArray>::new(Default::default());
        let items = vec![
            TokenSample { id: 7, features: vec![1.0, 2.0, 3.0], label: 1 },
            TokenSample { id: 9, features: vec![4.0, 5.0, 6.0], label: 0 },
        ];
        let batch = batcher.batch(items);
        assert_eq!(batch.ids, vec![7, 9]);
        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.labels.dims(), [2]);

        let labels: Vec<i64> = batch.labels.into_data().iter::<i64>().collect();
        assert_eq!(labels, vec![1, 0]);
    }
}
