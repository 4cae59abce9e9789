// ============================================================
// Layer 2 — SplitUseCase
// ============================================================
// Partitions a wikitext corpus into a held-out set and a
// training set of whole articles:
//
//   Step 1: Read and group articles   (Layer 4 - data)
//   Step 2: Seeded shuffle + split    (Layer 4 - data)
//   Step 3: Write <prefix>.heldout    (Layer 4 - data)
//   Step 4: Write <prefix>.train      (Layer 4 - data)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::{corpus::write_articles_to, splitter::split_heldout};
use crate::data::corpus::WikitextReader;
use crate::domain::article::Article;
use crate::domain::traits::ArticleSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    pub input:  String,
    /// Number of held-out articles
    pub n:      usize,
    /// Output path prefix; `.heldout` and `.train` are appended
    pub output: String,
    pub seed:   u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            input:  "wiki.train.tokens".to_string(),
            n:      500,
            output: "wiki".to_string(),
            seed:   22,
        }
    }
}

impl SplitConfig {
    pub fn heldout_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.heldout", self.output))
    }

    pub fn train_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.train", self.output))
    }
}

/// Sizes of the two written splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSummary {
    pub heldout: usize,
    pub train:   usize,
}

pub struct SplitUseCase {
    config: SplitConfig,
}

impl SplitUseCase {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<SplitSummary> {
        let cfg = &self.config;
        ensure!(!cfg.output.is_empty(), "output prefix must not be empty");

        // ── Step 1: Read articles ────────────────────────────────────────────
        let articles = WikitextReader::new(&cfg.input).read_articles()?;
        println!("there are {} articles", articles.len());

        if cfg.n > articles.len() {
            tracing::warn!(
                "Requested {} held-out articles but the corpus has only {}",
                cfg.n,
                articles.len()
            );
        }

        // ── Step 2: Shuffle and split ────────────────────────────────────────
        let (heldout, train) = split_heldout(articles, cfg.n, cfg.seed);
        for title in heldout.iter().filter_map(Article::title) {
            tracing::debug!("held out: {}", title);
        }

        // ── Steps 3-4: Write both splits ─────────────────────────────────────
        write_articles_to(&cfg.heldout_path(), &heldout, "heldout")?;
        write_articles_to(&cfg.train_path(), &train, "train")?;

        tracing::info!(
            "Wrote {} held-out articles to '{}' and {} training articles to '{}'",
            heldout.len(),
            cfg.heldout_path().display(),
            train.len(),
            cfg.train_path().display()
        );
        Ok(SplitSummary { heldout: heldout.len(), train: train.len() })
    }
}
