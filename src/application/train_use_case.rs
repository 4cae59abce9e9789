// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full classifier pipeline in order:
//
//   Step 1: Load hypothesis records        (Layer 4 - data)
//   Step 2: Split records train/validation (Layer 4 - data)
//   Step 3: Extract features and labels    (Layer 4 - data)
//   Step 4: Fit / apply the scaler         (Layer 4 - data)
//   Step 5: Build datasets                 (Layer 4 - data)
//   Step 6: Report baseline perplexities   (Layer 5 - ml)
//   Step 7: Prepare outputs, save config   (Layer 6 - infra)
//   Step 8: Run training loop              (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::TokenDataset,
    features::{extract, TokenFeatures},
    loader::JsonlHypothesisLoader,
    scaler::StandardScaler,
    splitter::split_train_val,
};
use crate::domain::hypothesis::{FeatureType, HypothesisRecord};
use crate::domain::traits::HypothesisSource;
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    predictions::PredictionWriter,
};
use crate::ml::interpolation::interpolated_perplexity;
use crate::ml::trainer::{run_training, TrainOutputs, TrainingSummary};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Serialisable so it can
// be stored next to the checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub input:           String,
    pub output_dir:      String,
    pub checkpoint_dir:  Option<String>,
    pub feature_type:    FeatureType,
    pub hidden_units:    usize,
    pub nlayers:         usize,
    pub dropout:         f64,
    pub negative_weight: f32,
    pub seed:            u64,
    pub epochs:          usize,
    pub batch_size:      usize,
    pub lr:              f64,
    pub val_fraction:    f64,
    pub log_every:       usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            input:           "features.jsonl".to_string(),
            output_dir:      "prediction_feature".to_string(),
            checkpoint_dir:  None,
            feature_type:    FeatureType::All,
            hidden_units:    32,
            nlayers:         3,
            dropout:         0.0,
            negative_weight: 1.0,
            seed:            22,
            epochs:          30,
            batch_size:      64,
            lr:              5e-4,
            val_fraction:    0.2,
            log_every:       500,
        }
    }
}

impl TrainConfig {
    /// Reject bad settings before any file is touched.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.negative_weight),
            "negative weight must be in [0, 1], got {}",
            self.negative_weight
        );
        ensure!((0.0..1.0).contains(&self.dropout), "dropout must be in [0, 1), got {}", self.dropout);
        ensure!(self.nlayers >= 1, "nlayers must be at least 1");
        ensure!(self.hidden_units >= 1, "hidden units must be at least 1");
        ensure!(self.batch_size >= 1, "batch size must be at least 1");
        ensure!(self.log_every >= 1, "log interval must be at least 1");
        ensure!(
            self.val_fraction > 0.0 && self.val_fraction < 1.0,
            "validation fraction must be in (0, 1), got {}",
            self.val_fraction
        );
        Ok(())
    }
}

/// The three reference perplexities reported before training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baselines {
    /// Never trust retrieval
    pub no_retrieval:  f64,
    /// Always trust retrieval
    pub all_retrieval: f64,
    /// Trust exactly where the label says so
    pub oracle:        f64,
}

impl Baselines {
    pub fn compute(val: &TokenFeatures) -> Result<Self> {
        let n = val.len();
        Ok(Self {
            no_retrieval:  interpolated_perplexity(&val.tokens, &vec![0; n])?,
            all_retrieval: interpolated_perplexity(&val.tokens, &vec![1; n])?,
            oracle:        interpolated_perplexity(&val.tokens, &val.labels)?,
        })
    }
}

/// Train and validation sides after extraction and scaling.
pub struct PreparedData {
    pub train:  TokenFeatures,
    pub val:    TokenFeatures,
    pub scaler: Option<StandardScaler>,
}

/// Steps 2–4: split records, extract, normalise.
pub fn prepare_data(hypos: Vec<HypothesisRecord>, cfg: &TrainConfig) -> Result<PreparedData> {
    let (train_hypos, val_hypos) = split_train_val(hypos, cfg.val_fraction, cfg.seed);
    tracing::info!(
        "Split: {} train hypotheses, {} validation hypotheses",
        train_hypos.len(),
        val_hypos.len()
    );
    ensure!(!train_hypos.is_empty(), "no hypotheses left for training");
    ensure!(!val_hypos.is_empty(), "no hypotheses left for validation");

    let mut train = extract(&train_hypos, cfg.feature_type)?;
    let mut val   = extract(&val_hypos, cfg.feature_type)?;
    ensure!(!train.is_empty(), "training hypotheses contain no tokens");
    ensure!(!val.is_empty(), "validation hypotheses contain no tokens");
    ensure!(
        train.n_features() == val.n_features(),
        "train and validation feature widths differ ({} vs {})",
        train.n_features(),
        val.n_features()
    );

    tracing::info!(
        "{} train tokens ({:.1}% trust retrieval), {} validation tokens, {} features",
        train.len(),
        train.positive_rate() * 100.0,
        val.len(),
        train.n_features()
    );

    // Context features are already bounded; everything else is
    // standardised with statistics from the training side only.
    let scaler = if cfg.feature_type.needs_scaling() {
        let scaler = StandardScaler::fit(&train.features)?;
        train.features = scaler.transform(&train.features)?;
        val.features   = scaler.transform(&val.features)?;
        Some(scaler)
    } else {
        None
    };

    Ok(PreparedData { train, val, scaler })
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingSummary> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load hypothesis records ──────────────────────────────────
        let loader = JsonlHypothesisLoader::new(&cfg.input);
        let hypos  = loader.load_all()?;

        // ── Steps 2-4: split, extract, scale ─────────────────────────────────
        let data = prepare_data(hypos, cfg)?;

        // ── Step 5: Build Burn datasets ───────────────────────────────────────
        let train_dataset = TokenDataset::from_features(&data.train.features, &data.train.labels);
        let val_dataset   = TokenDataset::from_features(&data.val.features, &data.val.labels);

        // ── Step 6: Baselines ─────────────────────────────────────────────────
        let baselines = Baselines::compute(&data.val)?;
        println!("no retrieval ppl {:.4}", baselines.no_retrieval);
        println!("all retrieval ppl {:.4}", baselines.all_retrieval);
        println!("oracle retrieval ppl {:.4}", baselines.oracle);

        // ── Step 7: Outputs and config ────────────────────────────────────────
        let checkpoint = match &cfg.checkpoint_dir {
            Some(dir) => {
                let ckpt = CheckpointManager::new(dir)?;
                ckpt.save_config(cfg)?;
                if let Some(scaler) = &data.scaler {
                    ckpt.save_scaler(scaler)?;
                }
                Some(ckpt)
            }
            None => None,
        };
        let outputs = TrainOutputs {
            predictions: PredictionWriter::new(&cfg.output_dir)?,
            metrics:     MetricsLogger::new(&cfg.output_dir)?,
            checkpoint,
        };

        // ── Step 8: Run training loop (Layer 5) ───────────────────────────────
        run_training(cfg, train_dataset, val_dataset, &data.val, &outputs)
    }
}
