// ============================================================
// Layer 3 — Hypothesis and Token Domain Types
// ============================================================
// A HypothesisRecord is one generated sequence with a set of
// parallel per-token arrays (scores, confidence features,
// frequency and context feature vectors).
//
// A TokenRecord is the flat view of one position inside a
// record: every per-token field except the context vector.
// Token records drive the perplexity scorer and are regrouped
// into hypotheses again for the prediction dumps.
//
// Reference: Rust Book §5 (Structs), §8 (Collections)

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, ensure, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A token is labelled "trust retrieval" when the chosen positional
/// score beats the base LM score by more than this margin.
pub const TRUST_MARGIN: f64 = 0.01;

/// Slack for float noise in the margin test: 0.5 - 0.49 is
/// 0.010000000000000009 in f64 and must not count as a margin > 0.01.
const MARGIN_TOLERANCE: f64 = 1e-9;

// ─── FeatureType ──────────────────────────────────────────────────────────────
/// Which per-token features feed the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    /// Local LM context vector, already bounded, never normalised
    Context,
    /// n-gram frequency vector
    Freq,
    /// [entropy, exp(lm_max)] ++ freq ++ context
    All,
}

impl FeatureType {
    /// Context features are probabilities already; everything
    /// else goes through a StandardScaler.
    pub fn needs_scaling(self) -> bool {
        !matches!(self, FeatureType::Context)
    }
}

impl FromStr for FeatureType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "context" => Ok(FeatureType::Context),
            "freq" => Ok(FeatureType::Freq),
            "all" => Ok(FeatureType::All),
            other => Err(anyhow!(
                "invalid feature type '{other}' (expected one of: context, freq, all)"
            )),
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureType::Context => "context",
            FeatureType::Freq => "freq",
            FeatureType::All => "all",
        };
        f.write_str(name)
    }
}

// ─── HypothesisRecord ─────────────────────────────────────────────────────────
/// One line of `features.jsonl`.
///
/// Keys not modelled here land in `extra` and are carried through
/// to the prediction dumps; each must be a per-token array too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisRecord {
    pub string: Vec<String>,
    pub lm_scores: Vec<f64>,
    pub knn_scores: Vec<f64>,
    pub positional_scores: Vec<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_entropy: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lm_max: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq: Option<Vec<Vec<f64>>>,

    pub lm_context: Vec<Vec<f64>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HypothesisRecord {
    /// Number of tokens in this hypothesis
    pub fn len(&self) -> usize {
        self.string.len()
    }

    pub fn is_empty(&self) -> bool {
        self.string.is_empty()
    }

    /// Check that every parallel array has one entry per token and that
    /// the fields the feature type reads are present.
    pub fn validate(&self, feature_type: FeatureType) -> Result<()> {
        let n = self.len();

        let check = |name: &str, len: usize| -> Result<()> {
            ensure!(
                len == n,
                "field '{name}' has {len} entries but 'string' has {n}"
            );
            Ok(())
        };

        check("lm_context", self.lm_context.len())?;
        check("lm_scores", self.lm_scores.len())?;
        check("knn_scores", self.knn_scores.len())?;
        check("positional_scores", self.positional_scores.len())?;
        if let Some(v) = &self.lm_entropy {
            check("lm_entropy", v.len())?;
        }
        if let Some(v) = &self.lm_max {
            check("lm_max", v.len())?;
        }
        if let Some(v) = &self.freq {
            check("freq", v.len())?;
        }
        uniform_width("lm_context", &self.lm_context)?;
        if let Some(v) = &self.freq {
            uniform_width("freq", v)?;
        }
        for (key, value) in &self.extra {
            match value {
                Value::Array(items) => check(key.as_str(), items.len())?,
                _ => bail!("field '{key}' is not a per-token array"),
            }
        }

        match feature_type {
            FeatureType::Context => {}
            FeatureType::Freq => {
                ensure!(self.freq.is_some(), "feature type 'freq' needs field 'freq'");
            }
            FeatureType::All => {
                for (name, present) in [
                    ("lm_entropy", self.lm_entropy.is_some()),
                    ("lm_max", self.lm_max.is_some()),
                    ("freq", self.freq.is_some()),
                ] {
                    ensure!(present, "feature type 'all' needs field '{name}'");
                }
            }
        }

        Ok(())
    }

    /// 1 if the positional score beats the LM score by more than
    /// TRUST_MARGIN at position `i`, else 0.
    pub fn label(&self, i: usize) -> u8 {
        let margin = self.positional_scores[i] - self.lm_scores[i];
        u8::from(margin - TRUST_MARGIN > MARGIN_TOLERANCE)
    }

    /// Flat copy of position `i` (the context vector is left out).
    /// Call `validate` first; indexing assumes equal lengths.
    pub fn token(&self, i: usize) -> TokenRecord {
        TokenRecord {
            string: self.string[i].clone(),
            lm_score: self.lm_scores[i],
            knn_score: self.knn_scores[i],
            positional_score: self.positional_scores[i],
            lm_entropy: self.lm_entropy.as_ref().map(|v| v[i]),
            lm_max: self.lm_max.as_ref().map(|v| v[i]),
            freq: self.freq.as_ref().map(|v| v[i].clone()),
            extra: self
                .extra
                .iter()
                .map(|(k, v)| (k.clone(), v[i].clone()))
                .collect(),
        }
    }
}

/// Every per-token vector of a field must have the same width.
fn uniform_width(name: &str, rows: &[Vec<f64>]) -> Result<()> {
    if let Some(first) = rows.first() {
        for (i, row) in rows.iter().enumerate() {
            ensure!(
                row.len() == first.len(),
                "field '{name}' has width {} at token {i} but {} at token 0",
                row.len(),
                first.len()
            );
        }
    }
    Ok(())
}

// ─── TokenRecord ──────────────────────────────────────────────────────────────
/// All per-token scalar fields at a single position.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub string: String,
    pub lm_score: f64,
    pub knn_score: f64,
    pub positional_score: f64,
    pub lm_entropy: Option<f64>,
    pub lm_max: Option<f64>,
    pub freq: Option<Vec<f64>>,
    pub extra: Map<String, Value>,
}
