// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two pieces:
//
//   BinaryReport   — accuracy / precision / recall / F1 of the
//                    "trust retrieval" class (label 1) over a
//                    set of predictions
//
//   MetricsLogger  — appends one CSV row per epoch so learning
//                    curves can be plotted after the run
//
// Undefined ratios (no predicted positives, no true positives)
// are reported as 0.0 rather than NaN.
//
// Example CSV output:
//   epoch,train_loss,val_loss,accuracy,precision,recall,f1,retrieval_rate,ppl
//   0,0.612300,0.598100,0.701000,0.655000,0.480000,0.554000,0.312000,21.904000
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{ensure, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

// ─── BinaryReport ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinaryReport {
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

impl BinaryReport {
    /// Compare `predicted` with `truth`, positive label = 1.
    pub fn compute(truth: &[u8], predicted: &[u8]) -> Result<Self> {
        ensure!(
            truth.len() == predicted.len(),
            "got {} predictions for {} labels",
            predicted.len(),
            truth.len()
        );

        let (mut tp, mut fp, mut fn_, mut correct) = (0usize, 0usize, 0usize, 0usize);
        for (&t, &p) in truth.iter().zip(predicted) {
            if t == p {
                correct += 1;
            }
            match (t, p) {
                (1, 1) => tp += 1,
                (0, 1) => fp += 1,
                (1, 0) => fn_ += 1,
                _ => {}
            }
        }

        let ratio = |num: usize, den: usize| if den > 0 { num as f64 / den as f64 } else { 0.0 };
        let precision = ratio(tp, tp + fp);
        let recall    = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Ok(Self {
            accuracy: ratio(correct, truth.len()),
            precision,
            recall,
            f1,
        })
    }
}

/// Fraction of tokens predicted as "trust retrieval"
pub fn retrieval_rate(predicted: &[u8]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    predicted.iter().filter(|&&p| p == 1).count() as f64 / predicted.len() as f64
}

// ─── EpochMetrics ─────────────────────────────────────────────────────────────
/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 0, matching the dump file names)
    pub epoch: usize,

    /// Mean weighted cross-entropy over all training samples
    pub train_loss: f64,

    /// Mean weighted cross-entropy over the validation set
    pub val_loss: f64,

    pub report: BinaryReport,

    /// Fraction of validation tokens classified as "trust retrieval"
    pub retrieval_rate: f64,

    /// Interpolated perplexity under this epoch's predictions
    pub perplexity: f64,
}

impl EpochMetrics {
    /// Returns true if this epoch beats the best perplexity seen so far
    pub fn is_improvement(&self, best_perplexity: f64) -> bool {
        self.perplexity < best_perplexity
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    /// Full path to the CSV file
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();

        // Create directory if it doesn't exist
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Write CSV header only if file is new
        // This allows appending to an existing log across runs
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(
                f,
                "epoch,train_loss,val_loss,accuracy,precision,recall,f1,retrieval_rate,ppl"
            )?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.report.accuracy,
            m.report.precision,
            m.report.recall,
            m.report.f1,
            m.retrieval_rate,
            m.perplexity,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: val_loss={:.4}, ppl={:.4}",
            m.epoch,
            m.val_loss,
            m.perplexity,
        );

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_report() {
        let truth     = [1, 1, 0, 0, 1];
        let predicted = [1, 0, 1, 0, 1];
        let r = BinaryReport::compute(&truth, &predicted).unwrap();
        assert!((r.accuracy - 0.6).abs() < 1e-12);
        // tp=2 fp=1 fn=1
        assert!((r.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions_gives_zero() {
        let r = BinaryReport::compute(&[1, 0], &[0, 0]).unwrap();
        assert_eq!(r.precision, 0.0);
        assert_eq!(r.recall, 0.0);
        assert_eq!(r.f1, 0.0);
        assert!((r.accuracy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_report_length_mismatch() {
        assert!(BinaryReport::compute(&[1], &[1, 0]).is_err());
    }

    #[test]
    fn test_retrieval_rate() {
        assert_eq!(retrieval_rate(&[1, 0, 1, 1]), 0.75);
        assert_eq!(retrieval_rate(&[]), 0.0);
    }

    #[test]
    fn test_logger_appends_rows() {
        let dir = std::env::temp_dir().join(format!("knnlm-metrics-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let logger = MetricsLogger::new(&dir).unwrap();
        let m = EpochMetrics {
            epoch: 0,
            train_loss: 0.5,
            val_loss: 0.4,
            report: BinaryReport { accuracy: 0.9, precision: 0.8, recall: 0.7, f1: 0.75 },
            retrieval_rate: 0.3,
            perplexity: 20.0,
        };
        logger.log(&m).unwrap();
        logger.log(&EpochMetrics { epoch: 1, ..m.clone() }).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0,0.500000,0.400000"));
        assert!(lines[2].starts_with("1,"));
        assert!(m.is_improvement(25.0));

        fs::remove_dir_all(&dir).unwrap();
    }
}
