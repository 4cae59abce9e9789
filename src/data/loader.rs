// ============================================================
// Layer 4 — Hypothesis Loader
// ============================================================
// Loads precomputed per-token hypothesis records from a JSON
// lines file: one HypothesisRecord object per line.
//
// A line that fails to parse aborts the load with the line
// number in the error; silently skipping a record would
// change the reported metrics. Blank lines are ignored.
//
// Reference: serde_json crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::PathBuf,
};

use crate::domain::hypothesis::HypothesisRecord;
use crate::domain::traits::HypothesisSource;

/// Loads hypothesis records from a `.jsonl` file.
/// Implements the HypothesisSource trait from Layer 3.
pub struct JsonlHypothesisLoader {
    path: PathBuf,
}

impl JsonlHypothesisLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HypothesisSource for JsonlHypothesisLoader {
    fn load_all(&self) -> Result<Vec<HypothesisRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open hypotheses '{}'", self.path.display()))?;
        let records = parse_jsonl(BufReader::new(file))
            .with_context(|| format!("Cannot load hypotheses from '{}'", self.path.display()))?;

        tracing::info!(
            "Loaded {} hypotheses from '{}'",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }
}

/// Parse every non-blank line of `reader` as a HypothesisRecord.
pub fn parse_jsonl<R: BufRead>(reader: R) -> Result<Vec<HypothesisRecord>> {
    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: HypothesisRecord = serde_json::from_str(line)
            .with_context(|| format!("Malformed hypothesis on line {}", lineno + 1))?;
        records.push(record);
    }
    Ok(records)
}
