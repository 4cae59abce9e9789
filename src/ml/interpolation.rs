// ============================================================
// Layer 5 — Interpolated Perplexity
// ============================================================
// Scores the classifier's retrieval-trust decisions by mixing
// the base LM and kNN log-scores in log space:
//
//   p = 1 (trust):    log( λ·p_lm + (1−λ)·p_knn )
//   p = 0 (distrust): log( p_lm )   (kNN weight is −1e5)
//
//   knn_weight = p·ln(1−λ) + (1−p)·(−1e5)
//   lm_weight  = p·ln(λ)
//   combined   = logsumexp(knn_score + knn_weight, lm_score + lm_weight)
//
//   perplexity = exp(−Σ combined / number of records)
//
// The trainer passes token records, so the average is per token.

use anyhow::{ensure, Result};

use crate::domain::hypothesis::TokenRecord;

/// kNN / LM mixing weight when retrieval is trusted
pub const LAMBDA: f64 = 0.75;

/// Log-space weight that switches the kNN term off
pub const KNN_DISTRUST_PENALTY: f64 = -1e5;

/// Numerically stable ln(Σ exp(x)).
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        return max;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Log-likelihood of one token under the given trust decision.
pub fn combined_log_score(knn_score: f64, lm_score: f64, trust: u8) -> f64 {
    let p = f64::from(trust);
    let knn_weight = p * (1.0 - LAMBDA).ln() + (1.0 - p) * KNN_DISTRUST_PENALTY;
    let lm_weight = p * LAMBDA.ln();
    log_sum_exp(&[knn_score + knn_weight, lm_score + lm_weight])
}

/// Perplexity of `records` when position i uses `predictions[i]`.
pub fn interpolated_perplexity(records: &[TokenRecord], predictions: &[u8]) -> Result<f64> {
    ensure!(
        records.len() == predictions.len(),
        "got {} predictions for {} token records",
        predictions.len(),
        records.len()
    );
    ensure!(!records.is_empty(), "cannot score an empty set of token records");

    let total: f64 = records
        .iter()
        .zip(predictions)
        .map(|(r, &p)| combined_log_score(r.knn_score, r.lm_score, p))
        .sum();

    Ok((-total / records.len() as f64).exp())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hypothesis::tests::record;

    fn single(knn: f64, lm: f64) -> Vec<TokenRecord> {
        vec![record(&[lm], &[knn], &[lm]).token(0)]
    }

    #[test]
    fn test_trusted_zero_scores_give_unit_perplexity() {
        let ppl = interpolated_perplexity(&single(0.0, 0.0), &[1]).unwrap();
        assert!((ppl - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_distrusted_zero_scores_give_unit_perplexity() {
        let ppl = interpolated_perplexity(&single(0.0, 0.0), &[0]).unwrap();
        assert!((ppl - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_distrust_uses_lm_only() {
        let lm = (0.2f64).ln();
        let ppl = interpolated_perplexity(&single(-0.1, lm), &[0]).unwrap();
        assert!((ppl - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_trust_mixes_probabilities() {
        let (p_lm, p_knn) = (0.2f64, 0.6f64);
        let got = combined_log_score(p_knn.ln(), p_lm.ln(), 1);
        let want = (LAMBDA * p_lm + (1.0 - LAMBDA) * p_knn).ln();
        assert!((got - want).abs() < 1e-12);
    }

    #[test]
    fn test_averages_over_records() {
        let mut records = single(0.0, (0.5f64).ln());
        records.extend(single(0.0, (0.125f64).ln()));
        // geometric mean of 1/0.5 and 1/0.125 = sqrt(2 * 8)
        let ppl = interpolated_perplexity(&records, &[0, 0]).unwrap();
        assert!((ppl - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_mismatch_fails() {
        assert!(interpolated_perplexity(&single(0.0, 0.0), &[0, 1]).is_err());
        assert!(interpolated_perplexity(&[], &[]).is_err());
    }

    #[test]
    fn test_log_sum_exp() {
        assert!((log_sum_exp(&[(0.25f64).ln(), (0.75f64).ln()])).abs() < 1e-12);
        assert_eq!(log_sum_exp(&[f64::NEG_INFINITY]), f64::NEG_INFINITY);
    }
}
