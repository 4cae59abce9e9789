// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one command (split, train or ngram-freq).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No argument parsing here (that's Layer 1)
//   - File access goes through Layer 4 and 6 helpers
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Held-out / train article split
pub mod split_use_case;

// Classifier training and perplexity evaluation
pub mod train_use_case;

// N-gram history counting
pub mod ngram_use_case;
