// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts:
// corpus articles, hypothesis records and their per-token view.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A corpus article (header line + body lines)
pub mod article;

// Hypothesis records, token records and feature selection
pub mod hypothesis;

// Core abstractions (traits) that other layers implement
pub mod traits;
