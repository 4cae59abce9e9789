// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything a training run leaves on disk:
//
//   checkpoint.rs   — config, scaler and final weights
//                     (Burn CompactRecorder for the weights)
//
//   metrics.rs      — classification metrics and the per-epoch
//                     metrics CSV
//
//   predictions.rs  — per-epoch validation prediction dumps
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Saving of the trained classifier and its inputs
pub mod checkpoint;

/// Classification metrics and CSV logger
pub mod metrics;

/// Per-epoch JSONL prediction dumps
pub mod predictions;
