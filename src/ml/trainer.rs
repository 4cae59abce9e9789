// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
//   - Training uses MyBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on the inner backend
//     (no autodiff, dropout disabled)
//   - Validation batcher must also use the inner backend
//   - argmax(1) returns [batch,1] so we flatten before reading
//
// After every epoch the validation predictions are scored
// (loss, accuracy, precision/recall/F1, retrieval rate,
// interpolated perplexity), dumped to JSONL and appended to
// the metrics CSV.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{ensure, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{TokenBatch, TokenBatcher},
    dataset::TokenDataset,
    features::TokenFeatures,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{retrieval_rate, BinaryReport, EpochMetrics, MetricsLogger},
    predictions::PredictionWriter,
};
use crate::ml::interpolation::interpolated_perplexity;
use crate::ml::model::{weighted_cross_entropy, TokenClassifier, TokenClassifierConfig};

type MyBackend = Autodiff<NdArray>;

/// Where each epoch's side outputs go.
pub struct TrainOutputs {
    pub predictions: PredictionWriter,
    pub metrics:     MetricsLogger,
    pub checkpoint:  Option<CheckpointManager>,
}

/// Per-epoch metrics of a finished run.
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs:     Vec<EpochMetrics>,
    /// Epoch with the lowest interpolated perplexity
    pub best_epoch: Option<usize>,
}

/// Validation pass result, index-aligned with the validation tokens.
struct Evaluation {
    loss:        f64,
    predictions: Vec<u8>,
}

pub fn run_training(
    cfg:           &TrainConfig,
    train_dataset: TokenDataset,
    val_dataset:   TokenDataset,
    val:           &TokenFeatures,
    outputs:       &TrainOutputs,
) -> Result<TrainingSummary> {
    let device = NdArrayDevice::default();
    tracing::info!("Using NdArray device: {:?}", device);
    train_loop::<MyBackend>(cfg, train_dataset, val_dataset, val, outputs, device)
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    train_dataset: TokenDataset,
    val_dataset:   TokenDataset,
    val:           &TokenFeatures,
    outputs:       &TrainOutputs,
    device:        B::Device,
) -> Result<TrainingSummary> {
    ensure!(
        val_dataset.sample_count() == val.len(),
        "validation dataset has {} samples but {} token records",
        val_dataset.sample_count(),
        val.len()
    );

    // Weight init and dropout masks
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let model_cfg = TokenClassifierConfig::new(train_dataset.n_features())
        .with_hidden_units(cfg.hidden_units)
        .with_nlayers(cfg.nlayers)
        .with_dropout(cfg.dropout);
    let mut model: TokenClassifier<B> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: {} features → {} x {} hidden → 2, {} parameters",
        model_cfg.n_features,
        cfg.nlayers,
        cfg.hidden_units,
        model.num_params()
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend), reshuffled every epoch ───────
    let train_batcher = TokenBatcher::<B>::new(device.clone());
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend), fixed order ────────────────────
    let val_batcher = TokenBatcher::<B::InnerBackend>::new(device.clone());
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .build(val_dataset);

    tracing::info!("Logging epoch metrics to '{}'", outputs.metrics.csv_path().display());

    let mut summary = TrainingSummary { epochs: Vec::with_capacity(cfg.epochs), best_epoch: None };
    let mut best_ppl = f64::INFINITY;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut running_loss = 0.0f64;
        let mut running_n    = 0usize;
        let mut epoch_loss   = 0.0f64;
        let mut epoch_n      = 0usize;

        for (step, batch) in train_loader.iter().enumerate() {
            let n = batch.ids.len();
            let (loss, _) = model.forward_loss(batch.features, batch.labels, cfg.negative_weight);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            running_loss += loss_val * n as f64;
            running_n    += n;
            epoch_loss   += loss_val * n as f64;
            epoch_n      += n;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);

            if (step + 1) % cfg.log_every == 0 {
                tracing::info!(
                    "epoch: {}, step: {}, training loss: {:.3}",
                    epoch,
                    step,
                    running_loss / running_n as f64
                );
                running_loss = 0.0;
                running_n    = 0;
            }
        }

        let train_loss = if epoch_n > 0 { epoch_loss / epoch_n as f64 } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let eval = evaluate(&model_valid, val_loader.as_ref(), val.len(), cfg.negative_weight)?;

        let report     = BinaryReport::compute(&val.labels, &eval.predictions)?;
        let rate       = retrieval_rate(&eval.predictions);
        let perplexity = interpolated_perplexity(&val.tokens, &eval.predictions)?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.3} | accuracy={:.3} | precision={:.3} | recall={:.3} | f1={:.3}",
            epoch, cfg.epochs, train_loss, eval.loss,
            report.accuracy, report.precision, report.recall, report.f1,
        );
        println!("Epoch {:>3}/{} | {:.4} retrieval, ppl {:.4}", epoch, cfg.epochs, rate, perplexity);

        outputs
            .predictions
            .write_epoch(epoch, &val.tokens, &val.lengths, &eval.predictions)?;

        let metrics = EpochMetrics {
            epoch,
            train_loss,
            val_loss: eval.loss,
            report,
            retrieval_rate: rate,
            perplexity,
        };
        outputs.metrics.log(&metrics)?;

        if metrics.is_improvement(best_ppl) {
            best_ppl = metrics.perplexity;
            summary.best_epoch = Some(epoch);
        }
        summary.epochs.push(metrics);
    }

    if let Some(ckpt) = &outputs.checkpoint {
        ckpt.save_model(&model)?;
    }

    match summary.best_epoch {
        Some(best) => tracing::info!("Training complete! Best ppl {:.4} at epoch {}", best_ppl, best),
        None       => tracing::info!("Training complete!"),
    }
    Ok(summary)
}

/// Run the model over the validation loader, scattering each
/// prediction to its token index.
fn evaluate<B: Backend>(
    model:           &TokenClassifier<B>,
    loader:          &dyn DataLoader<TokenBatch<B>>,
    n_tokens:        usize,
    negative_weight: f32,
) -> Result<Evaluation> {
    let mut predictions: Vec<Option<u8>> = vec![None; n_tokens];
    let mut loss_sum = 0.0f64;
    let mut nsamples = 0usize;

    for batch in loader.iter() {
        let n = batch.ids.len();
        let logits = model.forward(batch.features);

        let loss: f64 = weighted_cross_entropy(logits.clone(), batch.labels, negative_weight)
            .into_scalar()
            .elem::<f64>();
        loss_sum += loss * n as f64;
        nsamples += n;

        let preds = logits.argmax(1).flatten::<1>(0, 1).into_data();
        for (&id, pred) in batch.ids.iter().zip(preds.iter::<i64>()) {
            ensure!(id < n_tokens, "prediction for unknown token {id}");
            predictions[id] = Some(u8::from(pred == 1));
        }
    }

    let predictions = predictions
        .into_iter()
        .enumerate()
        .map(|(id, p)| p.ok_or_else(|| anyhow::anyhow!("no prediction for token {id}")))
        .collect::<Result<Vec<u8>>>()?;

    Ok(Evaluation {
        loss: if nsamples > 0 { loss_sum / nsamples as f64 } else { f64::NAN },
        predictions,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hypothesis::{tests::record, FeatureType};
    use crate::data::features::extract;
    use std::fs;

    /// Records whose context feature carries the label signal
    fn separable() -> Vec<crate::domain::hypothesis::HypothesisRecord> {
        (0..12)
            .map(|i| {
                let trust = i % 2 == 0;
                let pos = if trust { -0.5 } else { -1.0 };
                let mut r = record(&[-1.0; 4], &[-0.7; 4], &[pos; 4]);
                let signal = if trust { 1.0 } else { 0.0 };
                r.lm_context = vec![vec![signal, 1.0 - signal]; 4];
                r
            })
            .collect()
    }

    #[test]
    fn test_short_run_writes_outputs() {
        let dir = std::env::temp_dir().join(format!("knnlm-train-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let hypos = separable();
        let train = extract(&hypos[..8], FeatureType::Context).unwrap();
        let val   = extract(&hypos[8..], FeatureType::Context).unwrap();

        let cfg = TrainConfig {
            epochs: 2,
            batch_size: 8,
            hidden_units: 8,
            nlayers: 2,
            feature_type: FeatureType::Context,
            ..TrainConfig::default()
        };
        let outputs = TrainOutputs {
            predictions: PredictionWriter::new(&dir).unwrap(),
            metrics:     MetricsLogger::new(&dir).unwrap(),
            checkpoint:  None,
        };

        let summary = train_loop::<MyBackend>(
            &cfg,
            TokenDataset::from_features(&train.features, &train.labels),
            TokenDataset::from_features(&val.features, &val.labels),
            &val,
            &outputs,
            NdArrayDevice::default(),
        )
        .unwrap();

        assert_eq!(summary.epochs.len(), 2);
        assert!(summary.best_epoch.is_some());
        for m in &summary.epochs {
            assert!(m.perplexity.is_finite());
            assert!((0.0..=1.0).contains(&m.retrieval_rate));
        }
        assert!(dir.join("epoch0_pred.jsonl").exists());
        assert!(dir.join("epoch1_pred.jsonl").exists());
        assert_eq!(
            fs::read_to_string(dir.join("epoch1_pred.jsonl")).unwrap().lines().count(),
            4
        );

        fs::remove_dir_all(&dir).unwrap();
    }
}
