// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model and training code lives here, plus the
// interpolation math that turns per-token trust decisions
// into a perplexity.
//
//   model.rs         — feed-forward classifier (Linear → ReLU →
//                      Dropout, stacked) with a two-way output
//                      and class-weighted cross-entropy
//
//   trainer.rs       — epoch loop: Adam updates, validation
//                      predictions, metrics and dumps
//
//   interpolation.rs — kNN / LM log-space mixing and the
//                      interpolated perplexity
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Khandelwal et al. (2020) kNN-LM

/// Feed-forward token classifier
pub mod model;

/// Training loop with per-epoch validation
pub mod trainer;

/// Interpolated log-probabilities and perplexity
pub mod interpolation;
