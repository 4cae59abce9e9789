// ============================================================
// Layer 2 — NgramUseCase
// ============================================================
// Counts n-gram histories in a text corpus and writes them as
// a tab-separated table, most frequent first.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
};

use crate::data::ngram::{count_histories, write_counts};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgramConfig {
    pub input:  String,
    pub output: String,
    /// Longest history counted
    pub order:  usize,
}

impl Default for NgramConfig {
    fn default() -> Self {
        Self {
            input:  "wiki.train.tokens".to_string(),
            output: "ngram_freq.tsv".to_string(),
            order:  4,
        }
    }
}

pub struct NgramUseCase {
    config: NgramConfig,
}

impl NgramUseCase {
    pub fn new(config: NgramConfig) -> Self {
        Self { config }
    }

    /// Returns the number of distinct histories written.
    pub fn execute(&self) -> Result<usize> {
        let cfg = &self.config;
        ensure!(cfg.order >= 1, "n-gram order must be at least 1");

        let input = File::open(&cfg.input)
            .with_context(|| format!("Cannot open '{}'", cfg.input))?;
        let counts = count_histories(BufReader::new(input), cfg.order)
            .with_context(|| format!("Cannot read '{}'", cfg.input))?;

        let output = File::create(&cfg.output)
            .with_context(|| format!("Cannot create '{}'", cfg.output))?;
        write_counts(BufWriter::new(output), &counts)
            .with_context(|| format!("Cannot write '{}'", cfg.output))?;

        tracing::info!("Wrote {} histories to '{}'", counts.len(), cfg.output);
        Ok(counts.len())
    }
}
