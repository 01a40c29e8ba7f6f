//! Command line argument parsing for the Colloquy CLI using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::intent_classifier::EngineConfig;

/// Colloquy - train and talk to an intent-classification assistant
#[derive(Parser, Debug, Clone)]
#[command(name = "colloquy")]
#[command(about = "Train and run an intent-classification assistant")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct ColloquyArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl ColloquyArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a model from an intents file and save it
    Train(TrainArgs),

    /// Classify one utterance with a saved model
    Classify(ClassifyArgs),

    /// Interactive conversation with a saved model
    Chat(ChatArgs),

    /// Show the vocabulary, tags and metadata of a saved model
    Inspect(InspectArgs),
}

/// Where the model lives and how the engine is configured.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "COLLOQUY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the model artifacts
    #[arg(short = 'd', long, value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    /// Base name of the model artifacts
    #[arg(short = 'n', long, value_name = "NAME")]
    pub model_name: Option<String>,
}

impl ModelArgs {
    /// Configuration file (or defaults) with command line overrides applied.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_path(path)?,
            None => EngineConfig::default(),
        };
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if let Some(name) = &self.model_name {
            config.model_name = name.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Intents file (JSON)
    #[arg(value_name = "INTENTS_FILE")]
    pub intents: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Number of training epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Seed for reproducible training
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for classifying one utterance
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Intents file (JSON)
    #[arg(value_name = "INTENTS_FILE")]
    pub intents: PathBuf,

    /// Utterance to classify
    #[arg(value_name = "TEXT")]
    pub text: String,

    #[command(flatten)]
    pub model: ModelArgs,
}

/// Arguments for the interactive loop
#[derive(Parser, Debug, Clone)]
pub struct ChatArgs {
    /// Intents file (JSON)
    #[arg(value_name = "INTENTS_FILE")]
    pub intents: PathBuf,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Tag that ends the conversation after its response
    #[arg(long, value_name = "TAG")]
    pub exit_tag: Option<String>,

    /// Train and save a model if none is saved yet
    #[arg(long)]
    pub train: bool,
}

/// Arguments for inspecting a saved model
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Print the whole vocabulary instead of its size
    #[arg(long)]
    pub words: bool,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_command() {
        let args = ColloquyArgs::try_parse_from([
            "colloquy",
            "train",
            "intents.json",
            "--model-dir",
            "/tmp/models",
            "--model-name",
            "assistant",
            "--epochs",
            "50",
            "--seed",
            "7",
        ])
        .unwrap();

        if let Command::Train(train_args) = args.command {
            assert_eq!(train_args.intents, PathBuf::from("intents.json"));
            assert_eq!(train_args.model.model_dir, Some(PathBuf::from("/tmp/models")));
            assert_eq!(train_args.model.model_name.as_deref(), Some("assistant"));
            assert_eq!(train_args.epochs, Some(50));
            assert_eq!(train_args.seed, Some(7));
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_classify_command() {
        let args =
            ColloquyArgs::try_parse_from(["colloquy", "classify", "intents.json", "hello there"])
                .unwrap();

        if let Command::Classify(classify_args) = args.command {
            assert_eq!(classify_args.text, "hello there");
            assert!(classify_args.model.model_dir.is_none());
        } else {
            panic!("Expected Classify command");
        }
    }

    #[test]
    fn test_chat_command() {
        let args = ColloquyArgs::try_parse_from([
            "colloquy",
            "chat",
            "intents.json",
            "--exit-tag",
            "bye",
            "--train",
        ])
        .unwrap();

        if let Command::Chat(chat_args) = args.command {
            assert_eq!(chat_args.exit_tag.as_deref(), Some("bye"));
            assert!(chat_args.train);
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = ColloquyArgs::try_parse_from(["colloquy", "inspect"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = ColloquyArgs::try_parse_from(["colloquy", "-vv", "inspect"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = ColloquyArgs::try_parse_from(["colloquy", "inspect", "--quiet"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            ColloquyArgs::try_parse_from(["colloquy", "--format", "json", "inspect"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);

        assert!(ColloquyArgs::try_parse_from(["colloquy", "--format", "yaml", "inspect"]).is_err());
    }

    #[test]
    fn test_engine_config_overrides() {
        let model = ModelArgs {
            config: None,
            model_dir: Some(PathBuf::from("models")),
            model_name: Some("assistant".to_string()),
        };
        let config = model.engine_config().unwrap();
        assert_eq!(config.model_dir, PathBuf::from("models"));
        assert_eq!(config.model_name, "assistant");

        let bad = ModelArgs {
            model_name: Some("a/b".to_string()),
            ..ModelArgs::default()
        };
        assert!(bad.engine_config().unwrap_err().is_configuration());
    }
}
