// ============================================================
// Layer 4 — Feature / Label Extractor
// ============================================================
// Flattens hypothesis records into per-token samples:
//
//   for each record (in order)
//     validate the parallel arrays            (fatal on mismatch)
//     feature width equal across records      (fatal on mismatch)
//     for each token position i
//       feature vector  ← chosen by FeatureType
//       label           ← positional_score − lm_score > 0.01
//       token record    ← flat copy of the per-token fields
//
// Feature vectors per type:
//   context → lm_context[i]
//   freq    → freq[i]
//   all     → [lm_entropy[i], exp(lm_max[i])] ++ freq[i] ++ lm_context[i]
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{ensure, Context, Result};

use crate::domain::hypothesis::{FeatureType, HypothesisRecord, TokenRecord};

/// Everything the trainer needs from one side of the split.
/// All vectors are index-aligned by flat token position.
#[derive(Debug, Clone, Default)]
pub struct TokenFeatures {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
    pub tokens: Vec<TokenRecord>,
    /// Token count of each source record, used to regroup dumps
    pub lengths: Vec<usize>,
}

impl TokenFeatures {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Width of the feature vectors (0 when there are no tokens)
    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    /// Fraction of tokens labelled "trust retrieval"
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&l| l == 1).count() as f64 / self.labels.len() as f64
    }
}

/// Build features, labels and token records for `hypos`.
pub fn extract(hypos: &[HypothesisRecord], feature_type: FeatureType) -> Result<TokenFeatures> {
    let total: usize = hypos.iter().map(HypothesisRecord::len).sum();
    let mut out = TokenFeatures {
        features: Vec::with_capacity(total),
        labels: Vec::with_capacity(total),
        tokens: Vec::with_capacity(total),
        lengths: Vec::with_capacity(hypos.len()),
    };

    for (index, hypo) in hypos.iter().enumerate() {
        hypo.validate(feature_type)
            .with_context(|| format!("Malformed hypothesis record #{index}"))?;

        for i in 0..hypo.len() {
            let features = token_features(hypo, i, feature_type);
            if let Some(first) = out.features.first() {
                ensure!(
                    features.len() == first.len(),
                    "Hypothesis record #{index} has {} features per token, earlier records have {}",
                    features.len(),
                    first.len()
                );
            }
            out.features.push(features);
            out.labels.push(hypo.label(i));
            out.tokens.push(hypo.token(i));
        }
        out.lengths.push(hypo.len());
    }

    Ok(out)
}

/// Feature vector of position `i`. The record must already be validated.
fn token_features(hypo: &HypothesisRecord, i: usize, feature_type: FeatureType) -> Vec<f64> {
    let freq: &[f64] = hypo.freq.as_ref().map(|f| f[i].as_slice()).unwrap_or_default();

    match feature_type {
        FeatureType::Context => hypo.lm_context[i].clone(),
        FeatureType::Freq => freq.to_vec(),
        FeatureType::All => {
            let entropy = hypo.lm_entropy.as_ref().map_or(0.0, |v| v[i]);
            let lm_max = hypo.lm_max.as_ref().map_or(0.0, |v| v[i]);

            let mut f = Vec::with_capacity(2 + freq.len() + hypo.lm_context[i].len());
            // confidence features
            f.push(entropy);
            f.push(lm_max.exp());
            f.extend_from_slice(freq);
            f.extend_from_slice(&hypo.lm_context[i]);
            f
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hypothesis::tests::record;

    fn hypos() -> Vec<HypothesisRecord> {
        vec![
            record(&[0.4, 0.49, -1.0], &[0.0; 3], &[0.5, 0.5, -0.5]),
            record(&[-2.0, -3.0], &[-1.0, -1.0], &[-2.0, -3.0]),
        ]
    }

    #[test]
    fn test_output_lengths_match_token_count() {
        let out = extract(&hypos(), FeatureType::All).unwrap();
        assert_eq!(out.features.len(), 5);
        assert_eq!(out.labels.len(), 5);
        assert_eq!(out.tokens.len(), 5);
        assert_eq!(out.lengths, vec![3, 2]);
    }

    #[test]
    fn test_feature_dimensions() {
        let h = hypos();
        assert_eq!(extract(&h, FeatureType::Context).unwrap().n_features(), 4);
        assert_eq!(extract(&h, FeatureType::Freq).unwrap().n_features(), 3);
        assert_eq!(extract(&h, FeatureType::All).unwrap().n_features(), 2 + 3 + 4);
    }

    #[test]
    fn test_all_features_layout() {
        let out = extract(&hypos(), FeatureType::All).unwrap();
        let f = &out.features[1];
        assert_eq!(f[0], 1.5);
        assert!((f[1] - (-0.5f64).exp()).abs() < 1e-12);
        assert_eq!(&f[2..5], &[1.0, 2.0, 3.0]);
        assert_eq!(&f[5..], &[0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn test_labels_and_order() {
        let out = extract(&hypos(), FeatureType::Context).unwrap();
        assert_eq!(out.labels, vec![1, 0, 1, 0, 0]);
        assert_eq!(out.tokens[3].string, "tok0");
        assert_eq!(out.tokens[3].lm_score, -2.0);
    }

    #[test]
    fn test_mismatched_record_is_fatal() {
        let mut h = hypos();
        h[1].lm_context.push(vec![0.0; 4]);
        let err = extract(&h, FeatureType::Context).unwrap_err();
        assert!(format!("{err:#}").contains("#1"));
    }

    #[test]
    fn test_feature_width_must_match_across_records() {
        let mut h = hypos();
        h[1].lm_context = vec![vec![0.5, 0.5, 0.5]; 2];
        let err = extract(&h, FeatureType::Context).unwrap_err();
        assert!(err.to_string().contains("#1"));

        // ragged inside one record is caught by validation
        let mut h = hypos();
        h[0].lm_context[1] = vec![0.5; 3];
        let err = extract(&h, FeatureType::Context).unwrap_err();
        assert!(format!("{err:#}").contains("#0"));
    }

    #[test]
    fn test_positive_rate() {
        let out = extract(&hypos(), FeatureType::Context).unwrap();
        assert!((out.positive_rate() - 0.4).abs() < 1e-12);
    }
}
