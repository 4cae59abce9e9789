// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists a finished training run so the classifier can be
// rebuilt later:
//
//   <dir>/
//     train_config.json    ← hyperparameters and feature type
//     scaler.json          ← fitted StandardScaler (non-context runs)
//     classifier.mpk       ← model weights (Burn CompactRecorder)
//
// CompactRecorder serialises the module record to MessagePack
// at half precision; it appends the extension itself.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::Serialize;

use crate::application::train_use_case::TrainConfig;
use crate::data::scaler::StandardScaler;
use crate::ml::model::TokenClassifier;

/// Manages saving of the trained artifact.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager and its directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint dir '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Save model weights to {dir}/classifier.mpk
    pub fn save_model<B: Backend>(&self, model: &TokenClassifier<B>) -> Result<()> {
        // Build the file path (no extension, the recorder adds it)
        let path = self.dir.join("classifier");

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", path.display())
            })?;

        tracing::info!("Saved classifier weights to '{}'", self.dir.display());
        Ok(())
    }

    /// Save the training configuration to JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.save_json("train_config.json", cfg)
    }

    /// Save the fitted scaler to JSON.
    pub fn save_scaler(&self, scaler: &StandardScaler) -> Result<()> {
        self.save_json("scaler.json", scaler)
    }

    fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }
}
