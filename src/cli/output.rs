//! Output formatting for CLI commands.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::cli::args::{ColloquyArgs, OutputFormat};
use crate::error::Result;

/// Result structure for training.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainingResult {
    pub model_name: String,
    pub model_dir: String,
    pub artifact_files: Vec<String>,
    pub training_examples: usize,
    pub vocabulary_size: usize,
    pub tags: Vec<String>,
    pub epochs: usize,
    pub final_loss: f64,
    pub final_accuracy: f64,
    pub training_time_ms: u64,
}

/// Probability of one tag.
#[derive(Debug, Serialize, Deserialize)]
pub struct TagProbability {
    pub tag: String,
    pub probability: f32,
}

/// Result structure for classification.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub text: String,
    pub tag: String,
    pub confidence: f32,
    pub probabilities: Vec<TagProbability>,
}

/// Description of a saved model.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub artifact_id: Option<String>,
    pub version: String,
    pub trained_at: String,
    pub training_examples: usize,
    pub vocabulary_size: usize,
    pub vocabulary: Option<Vec<String>>,
    pub tags: Vec<String>,
    pub optimizer: String,
    pub hyperparameters: BTreeMap<String, f64>,
    pub final_accuracy: Option<f64>,
    pub artifacts: Vec<ArtifactFile>,
}

/// One stored artifact of a model.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub file: String,
    pub bytes: u64,
}

/// Human-readable rendering of a command result.
pub trait HumanReadable {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()>;
}

impl HumanReadable for TrainingResult {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Model:             {}", self.model_name)?;
        writeln!(out, "Directory:         {}", self.model_dir)?;
        writeln!(out, "Artifacts:         {}", self.artifact_files.join(", "))?;
        writeln!(out, "Training examples: {}", self.training_examples)?;
        writeln!(out, "Vocabulary size:   {}", self.vocabulary_size)?;
        writeln!(out, "Tags:              {}", self.tags.join(", "))?;
        writeln!(out, "Epochs:            {}", self.epochs)?;
        writeln!(out, "Final loss:        {:.4}", self.final_loss)?;
        writeln!(out, "Final accuracy:    {:.3}", self.final_accuracy)?;
        writeln!(out, "Training time:     {}ms", self.training_time_ms)
    }
}

impl HumanReadable for ClassificationResult {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{} ({:.3})", self.tag, self.confidence)?;
        for p in &self.probabilities {
            writeln!(out, "  {:<20} {:.4}", p.tag, p.probability)?;
        }
        Ok(())
    }
}

impl HumanReadable for ModelInfo {
    fn write_human(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Model:             {}", self.model_name)?;
        if let Some(id) = &self.artifact_id {
            writeln!(out, "Artifact id:       {id}")?;
        }
        writeln!(out, "Trained with:      colloquy {}", self.version)?;
        writeln!(out, "Trained at:        {}", self.trained_at)?;
        writeln!(out, "Training examples: {}", self.training_examples)?;
        writeln!(out, "Vocabulary size:   {}", self.vocabulary_size)?;
        writeln!(out, "Tags:              {}", self.tags.join(", "))?;
        writeln!(out, "Optimizer:         {}", self.optimizer)?;
        for (name, value) in &self.hyperparameters {
            writeln!(out, "  {name}: {value}")?;
        }
        if let Some(accuracy) = self.final_accuracy {
            writeln!(out, "Final accuracy:    {accuracy:.3}")?;
        }
        writeln!(out, "Artifacts:")?;
        for artifact in &self.artifacts {
            writeln!(out, "  {:<30} {} bytes", artifact.file, artifact.bytes)?;
        }
        if let Some(words) = &self.vocabulary {
            writeln!(out)?;
            writeln!(out, "Vocabulary:")?;
            for word in words {
                writeln!(out, "  {word}")?;
            }
        }
        Ok(())
    }
}

/// Output a result to stdout in the requested format.
pub fn output_result<T>(message: &str, result: &T, args: &ColloquyArgs) -> Result<()>
where
    T: Serialize + HumanReadable,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_result(&mut out, message, result, args)
}

/// Write a result in the requested format.
pub fn write_result<T>(
    out: &mut dyn Write,
    message: &str,
    result: &T,
    args: &ColloquyArgs,
) -> Result<()>
where
    T: Serialize + HumanReadable,
{
    match args.output_format {
        OutputFormat::Human => {
            if args.verbosity() > 0 && !message.is_empty() {
                writeln!(out, "{message}")?;
                writeln!(out)?;
            }
            result.write_human(out)?;
        }
        OutputFormat::Json => {
            let json = if args.pretty {
                serde_json::to_string_pretty(result)?
            } else {
                serde_json::to_string(result)?
            };
            writeln!(out, "{json}")?;
        }
    }
    Ok(())
}
