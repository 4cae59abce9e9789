// ============================================================
// Layer 6 — Prediction Dumps
// ============================================================
// After every epoch the validation predictions are written to
// `<dir>/epoch<N>_pred.jsonl` for offline inspection.
//
// Token records are regrouped into their source hypotheses
// (using the per-record token counts) and each hypothesis is
// written as one JSON object: every per-token field as a
// parallel array under its original key, minus the context
// vector, plus `prediction` (0.0 / 1.0 per token).
//
// Each line is flushed as it is written; a crash leaves a
// partial file behind.

use anyhow::{ensure, Context, Result};
use serde_json::{Map, Value};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::domain::hypothesis::TokenRecord;

pub struct PredictionWriter {
    dir: PathBuf,
}

impl PredictionWriter {
    /// Create the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn epoch_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("epoch{epoch}_pred.jsonl"))
    }

    /// Write the dump for one epoch and return its path.
    pub fn write_epoch(
        &self,
        epoch:       usize,
        tokens:      &[TokenRecord],
        lengths:     &[usize],
        predictions: &[u8],
    ) -> Result<PathBuf> {
        let path = self.epoch_path(epoch);
        write_dump_file(&path, tokens, lengths, predictions)?;
        tracing::debug!("Wrote predictions to '{}'", path.display());
        Ok(path)
    }
}

fn write_dump_file(
    path:        &Path,
    tokens:      &[TokenRecord],
    lengths:     &[usize],
    predictions: &[u8],
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    write_dump(BufWriter::new(file), tokens, lengths, predictions)
        .with_context(|| format!("Cannot write '{}'", path.display()))
}

/// Write one JSON line per hypothesis.
pub fn write_dump<W: Write>(
    mut out:     W,
    tokens:      &[TokenRecord],
    lengths:     &[usize],
    predictions: &[u8],
) -> Result<()> {
    ensure!(
        tokens.len() == predictions.len(),
        "got {} predictions for {} token records",
        predictions.len(),
        tokens.len()
    );
    ensure!(
        lengths.iter().sum::<usize>() == tokens.len(),
        "record lengths do not add up to {} tokens",
        tokens.len()
    );

    let mut start = 0;
    for &len in lengths {
        let end = start + len;
        let hypo = regroup(&tokens[start..end], &predictions[start..end]);
        serde_json::to_writer(&mut out, &hypo)?;
        out.write_all(b"\n")?;
        out.flush()?;
        start = end;
    }
    Ok(())
}

/// Rebuild the parallel arrays of one hypothesis from its tokens.
fn regroup(tokens: &[TokenRecord], predictions: &[u8]) -> Map<String, Value> {
    let column = |f: &dyn Fn(&TokenRecord) -> Value| -> Value {
        Value::Array(tokens.iter().map(f).collect())
    };

    let mut hypo = Map::new();
    hypo.insert("string".into(), column(&|t| Value::from(t.string.clone())));
    hypo.insert("lm_scores".into(), column(&|t| Value::from(t.lm_score)));
    hypo.insert("knn_scores".into(), column(&|t| Value::from(t.knn_score)));
    hypo.insert("positional_scores".into(), column(&|t| Value::from(t.positional_score)));

    // optional fields are present for all tokens of a record or none
    if let Some(first) = tokens.first() {
        if first.lm_entropy.is_some() {
            hypo.insert("lm_entropy".into(), column(&|t| Value::from(t.lm_entropy)));
        }
        if first.lm_max.is_some() {
            hypo.insert("lm_max".into(), column(&|t| Value::from(t.lm_max)));
        }
        if first.freq.is_some() {
            hypo.insert("freq".into(), column(&|t| Value::from(t.freq.clone())));
        }
        for key in first.extra.keys() {
            hypo.insert(
                key.clone(),
                column(&|t| t.extra.get(key).cloned().unwrap_or(Value::Null)),
            );
        }
    }

    hypo.insert(
        "prediction".into(),
        Value::Array(predictions.iter().map(|&p| Value::from(f64::from(p))).collect()),
    );
    hypo
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hypothesis::tests::record;

    fn tokens() -> (Vec<TokenRecord>, Vec<usize>) {
        let mut a = record(&[-1.0, -2.0], &[-1.5, -2.5], &[-1.0, -1.5]);
        a.extra.insert("ids".into(), Value::from(vec![10, 11]));
        let mut b = record(&[-3.0], &[-3.5], &[-3.0]);
        b.extra.insert("ids".into(), Value::from(vec![12]));

        let mut toks: Vec<TokenRecord> = (0..2).map(|i| a.token(i)).collect();
        toks.push(b.token(0));
        (toks, vec![2, 1])
    }

    #[test]
    fn test_regroups_by_record() {
        let (toks, lengths) = tokens();
        let mut out = Vec::new();
        write_dump(&mut out, &toks, &lengths, &[1, 0, 1]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let first = &lines[0];
        assert_eq!(first["string"], serde_json::json!(["tok0", "tok1"]));
        assert_eq!(first["lm_scores"], serde_json::json!([-1.0, -2.0]));
        assert_eq!(first["ids"], serde_json::json!([10, 11]));
        assert_eq!(first["prediction"], serde_json::json!([1.0, 0.0]));
        assert!(first.get("lm_context").is_none());

        assert_eq!(lines[1]["prediction"], serde_json::json!([1.0]));
        assert_eq!(lines[1]["freq"], serde_json::json!([[0.0, 2.0, 3.0]]));
    }

    #[test]
    fn test_rejects_misaligned_predictions() {
        let (toks, lengths) = tokens();
        assert!(write_dump(Vec::new(), &toks, &lengths, &[1, 0]).is_err());
        assert!(write_dump(Vec::new(), &toks, &[2, 2], &[1, 0, 1]).is_err());
    }

    #[test]
    fn test_epoch_file_name() {
        let dir = std::env::temp_dir().join(format!("knnlm-pred-{}", std::process::id()));
        let writer = PredictionWriter::new(&dir).unwrap();
        let (toks, lengths) = tokens();
        let path = writer.write_epoch(3, &toks, &lengths, &[0, 0, 0]).unwrap();
        assert!(path.ends_with("epoch3_pred.jsonl"));
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
        fs::remove_dir_all(&dir).unwrap();
    }
}
