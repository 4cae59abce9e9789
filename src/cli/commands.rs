// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `split`, `train` and
// `ngram-freq`, and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, FeatureType, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::{
    ngram_use_case::NgramConfig,
    split_use_case::SplitConfig,
    train_use_case::TrainConfig,
};
use crate::domain::hypothesis::FeatureType;

/// The top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a wikitext corpus into held-out and training articles
    Split(SplitArgs),

    /// Train the retrieval-trust classifier and report perplexity
    Train(TrainArgs),

    /// Count n-gram histories in a text corpus
    NgramFreq(NgramArgs),
}

/// All arguments for the `split` command.
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Wikitext corpus to split
    #[arg(long)]
    pub input: String,

    /// Number of articles to hold out
    #[arg(long, default_value_t = 500)]
    pub n: usize,

    /// Output prefix; writes <prefix>.heldout and <prefix>.train
    #[arg(long)]
    pub output: String,

    /// Shuffle seed
    #[arg(long, default_value_t = 22)]
    pub seed: u64,
}

impl From<SplitArgs> for SplitConfig {
    fn from(a: SplitArgs) -> Self {
        SplitConfig {
            input:  a.input,
            n:      a.n,
            output: a.output,
            seed:   a.seed,
        }
    }
}

/// All arguments for the `train` command.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Which per-token features to feed the classifier: context, freq or all
    #[arg(long)]
    pub feature_type: FeatureType,

    /// Width of every hidden layer
    #[arg(long, default_value_t = 32)]
    pub hidden_units: usize,

    /// Number of hidden layers
    #[arg(long, default_value_t = 3)]
    pub nlayers: usize,

    /// Dropout probability after every hidden layer
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Loss weight of the "do not trust retrieval" class, in [0, 1]
    #[arg(long, default_value_t = 1.0)]
    pub negative_weight: f32,

    /// Seed for the train/validation split, weight init and shuffling
    #[arg(long, default_value_t = 22)]
    pub seed: u64,

    /// Hypothesis records, one JSON object per line
    #[arg(long, default_value = "features.jsonl")]
    pub input: String,

    /// Directory for per-epoch prediction dumps and metrics.csv
    #[arg(long, default_value = "prediction_feature")]
    pub output_dir: String,

    /// Save config, scaler and final weights here
    #[arg(long)]
    pub checkpoint_dir: Option<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// This is the boundary between Layer 1 and Layer 2;
/// the application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            input:           a.input,
            output_dir:      a.output_dir,
            checkpoint_dir:  a.checkpoint_dir,
            feature_type:    a.feature_type,
            hidden_units:    a.hidden_units,
            nlayers:         a.nlayers,
            dropout:         a.dropout,
            negative_weight: a.negative_weight,
            seed:            a.seed,
            ..TrainConfig::default()
        }
    }
}

/// All arguments for the `ngram-freq` command
#[derive(Args, Debug)]
pub struct NgramArgs {
    /// Tokenised text corpus, one sentence or paragraph per line
    #[arg(long)]
    pub input: String,

    /// Output TSV of history counts
    #[arg(long)]
    pub output: String,

    /// Longest history to count
    #[arg(long, default_value_t = 4)]
    pub order: usize,
}

impl From<NgramArgs> for NgramConfig {
    fn from(a: NgramArgs) -> Self {
        NgramConfig {
            input:  a.input,
            output: a.output,
            order:  a.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults() {
        let cli = Cli::try_parse_from(["knnlm-tools", "train", "--feature-type", "freq"]).unwrap();
        let Commands::Train(args) = cli.command else {
            panic!("expected train");
        };
        let cfg = TrainConfig::from(args);
        assert_eq!(cfg.feature_type, FeatureType::Freq);
        assert_eq!(cfg.hidden_units, 32);
        assert_eq!(cfg.nlayers, 3);
        assert_eq!(cfg.seed, 22);
        assert_eq!(cfg.output_dir, "prediction_feature");
        assert!(cfg.checkpoint_dir.is_none());
    }

    #[test]
    fn test_unknown_feature_type_rejected() {
        assert!(Cli::try_parse_from(["knnlm-tools", "train", "--feature-type", "bogus"]).is_err());
        assert!(Cli::try_parse_from(["knnlm-tools", "train"]).is_err());
    }

    #[test]
    fn test_split_args() {
        let cli = Cli::try_parse_from([
            "knnlm-tools", "split", "--input", "wiki.txt", "--output", "out",
        ])
        .unwrap();
        let Commands::Split(args) = cli.command else {
            panic!("expected split");
        };
        let cfg = SplitConfig::from(args);
        assert_eq!(cfg.n, 500);
        assert_eq!(cfg.seed, 22);
        assert_eq!(cfg.heldout_path(), std::path::PathBuf::from("out.heldout"));
    }

    #[test]
    fn test_ngram_args() {
        let cli = Cli::try_parse_from([
            "knnlm-tools", "ngram-freq", "--input", "a.txt", "--output", "b.tsv",
        ])
        .unwrap();
        let Commands::NgramFreq(args) = cli.command else {
            panic!("expected ngram-freq");
        };
        assert_eq!(NgramConfig::from(args).order, 4);
    }
}
