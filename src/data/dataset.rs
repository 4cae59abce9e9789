use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One token position ready for the classifier.
/// `id` is the flat token index so validation predictions can be
/// written back to the matching token record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSample {
    pub id:       usize,
    pub features: Vec<f32>,
    pub label:    u8,
}

pub struct TokenDataset {
    samples: Vec<TokenSample>,
}

impl TokenDataset {
    /// Pair each feature row with its label; ids follow row order.
    pub fn from_features(features: &[Vec<f64>], labels: &[u8]) -> Self {
        let samples = features
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(id, (f, &label))| TokenSample {
                id,
                features: f.iter().map(|&x| x as f32).collect(),
                label,
            })
            .collect();
        Self { samples }
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }

    pub fn n_features(&self) -> usize {
        self.samples.first().map_or(0, |s| s.features.len())
    }
}

impl Dataset<TokenSample> for TokenDataset {
    fn get(&self, index: usize) -> Option<TokenSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_features_assigns_ids_in_order() {
        let ds = TokenDataset::from_features(&[vec![1.0, 2.0], vec![3.0, 4.0]], &[0, 1]);
        assert_eq!(ds.sample_count(), 2);
        assert_eq!(ds.n_features(), 2);
        let s = ds.get(1).unwrap();
        assert_eq!(s.id, 1);
        assert_eq!(s.features, vec![3.0f32, 4.0]);
        assert_eq!(s.label, 1);
        assert!(ds.get(2).is_none());
    }
}
