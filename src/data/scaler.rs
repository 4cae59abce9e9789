// ============================================================
// Layer 4 — Standard Scaler
// ============================================================
// Per-dimension standardisation: x' = (x − mean) / std.
//
// The scaler is fitted on TRAINING features only and the same
// value is then used to transform both the training and the
// validation features. It is an explicit value passed to each
// transform call, and it is serialisable so a checkpoint can
// store it next to the model weights.
//
// Population statistics (divide by n). A dimension with zero
// variance gets scale 1.0 so it maps to 0 instead of NaN.
//
// Reference: Rust Book §8 (Vectors), §9 (Error Handling)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and standard deviation of every column of `rows`.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        ensure!(!rows.is_empty(), "cannot fit a scaler on zero samples");
        let width = rows[0].len();
        ensure!(
            rows.iter().all(|r| r.len() == width),
            "feature vectors have inconsistent widths"
        );

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; width];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }

        let scale = var
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect();

        tracing::debug!("Fitted scaler on {} samples x {} features", rows.len(), width);
        Ok(Self { mean, scale })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardise `rows` with the fitted statistics.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter()
            .map(|row| {
                ensure!(
                    row.len() == self.width(),
                    "feature vector has {} values, scaler was fitted on {}",
                    row.len(),
                    self.width()
                );
                Ok(row
                    .iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(x, (m, s))| (x - m) / s)
                    .collect())
            })
            .collect()
    }
}
