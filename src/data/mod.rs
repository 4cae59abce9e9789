// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between files on disk and tensor batches.
//
// Corpus side (`split`, `ngram-freq`):
//
//   wikitext file ──► WikitextReader ──► split_heldout ──► write_articles
//   text file     ──► count_histories ──► write_counts
//
// Classifier side (`train`):
//
//   features.jsonl
//       │
//       ▼
//   JsonlHypothesisLoader  → parses one record per line
//       │
//       ▼
//   split_train_val        → whole records to train / validation
//       │
//       ▼
//   extract                → per-token features, labels, token records
//       │
//       ▼
//   StandardScaler         → fitted on training features only
//       │
//       ▼
//   TokenDataset           → implements Burn's Dataset trait
//       │
//       ▼
//   TokenBatcher           → stacks samples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Groups wikitext lines into articles and writes splits
pub mod corpus;

/// Loads hypothesis records from JSON lines
pub mod loader;

/// Seeded held-out and train/validation splits
pub mod splitter;

/// Per-token feature vectors, labels and token records
pub mod features;

/// Zero-mean / unit-variance feature scaling
pub mod scaler;

/// Implements Burn's Dataset trait for token samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// N-gram history counts for frequency features
pub mod ngram;
