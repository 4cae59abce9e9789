// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer talks to its inputs through these
// traits, so a use case never knows whether articles come
// from a wikitext file or hypotheses from a JSONL dump.
//
//   - WikitextReader implements ArticleSource
//   - JsonlHypothesisLoader implements HypothesisSource
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::article::Article;
use crate::domain::hypothesis::HypothesisRecord;

// ─── ArticleSource ────────────────────────────────────────────────────────────
/// Any component that can produce a corpus as an ordered list of articles.
pub trait ArticleSource {
    /// Read every article, in corpus order.
    fn read_articles(&self) -> Result<Vec<Article>>;
}

// ─── HypothesisSource ─────────────────────────────────────────────────────────
/// Any component that can load precomputed hypothesis records.
pub trait HypothesisSource {
    /// Load all records in file order.
    fn load_all(&self) -> Result<Vec<HypothesisRecord>>;
}
