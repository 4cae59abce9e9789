// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `split`      — held-out / train split of a wikitext corpus
//   2. `train`      — trains the retrieval-trust classifier
//   3. `ngram-freq` — counts n-gram histories
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, NgramArgs, SplitArgs, TrainArgs};

use crate::application::{
    ngram_use_case::NgramUseCase,
    split_use_case::SplitUseCase,
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "knnlm-tools",
    version,
    about = "Corpus splitting, n-gram counting and retrieval-trust classification for kNN-LM experiments."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Split(args)     => run_split(args),
            Commands::Train(args)     => run_train(args),
            Commands::NgramFreq(args) => run_ngram(args),
        }
    }
}

fn run_split(args: SplitArgs) -> Result<()> {
    tracing::info!("Splitting corpus: {}", args.input);
    let summary = SplitUseCase::new(args.into()).execute()?;
    println!("{} held-out articles, {} training articles", summary.heldout, summary.train);
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Training on {} with {} features", args.input, args.feature_type);
    let summary = TrainUseCase::new(args.into()).execute()?;

    if let Some(best) = summary.best_epoch.and_then(|e| summary.epochs.get(e)) {
        println!("best epoch {} ppl {:.4}", best.epoch, best.perplexity);
    }
    Ok(())
}

fn run_ngram(args: NgramArgs) -> Result<()> {
    tracing::info!("Counting order-{} histories in {}", args.order, args.input);
    let n = NgramUseCase::new(args.into()).execute()?;
    println!("{n} distinct histories");
    Ok(())
}
