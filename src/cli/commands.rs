//! Command implementations for the Colloquy CLI.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{ColloquyError, Result};
use crate::ml::intent_classifier::{
    ArtifactKind, EngineConfig, IntentCorpus, IntentEngine, ModelStore,
};
use crate::storage::FileStorage;

/// Execute a CLI command.
pub fn execute_command(args: ColloquyArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Classify(classify_args) => classify(classify_args, &args),
        Command::Chat(chat_args) => chat(chat_args, &args),
        Command::Inspect(inspect_args) => inspect(inspect_args, &args),
    }
}

/// Train a model and save it.
fn train(args: &TrainArgs, cli_args: &ColloquyArgs) -> Result<()> {
    let mut config = args.model.engine_config()?;
    if let Some(epochs) = args.epochs {
        config = config.with_epochs(epochs);
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;

    let corpus = IntentCorpus::from_path(&args.intents)?;
    info!(
        "Loaded {} intents with {} patterns from {}",
        corpus.len(),
        corpus.pattern_count(),
        args.intents.display()
    );

    let mut engine = IntentEngine::new(corpus, config)?;
    let stats = engine.fit()?;
    engine.save()?;

    let config = engine.config();
    let result = TrainingResult {
        model_name: config.model_name.clone(),
        model_dir: config.model_dir.display().to_string(),
        artifact_files: ArtifactKind::ALL
            .iter()
            .map(|kind| kind.file_name(&config.model_name))
            .collect(),
        training_examples: stats.examples,
        vocabulary_size: engine.vocabulary().map(|v| v.len()).unwrap_or(0),
        tags: engine
            .tags()
            .map(|t| t.tags().to_vec())
            .unwrap_or_default(),
        epochs: stats.epochs,
        final_loss: stats.final_loss,
        final_accuracy: stats.final_accuracy,
        training_time_ms: stats.training_time_ms,
    };

    output_result("Model trained and saved", &result, cli_args)
}

/// Classify a single utterance.
fn classify(args: &ClassifyArgs, cli_args: &ColloquyArgs) -> Result<()> {
    let config = args.model.engine_config()?;
    let corpus = IntentCorpus::from_path(&args.intents)?;
    let mut engine = IntentEngine::new(corpus, config)?;
    engine.load()?;

    let prediction = engine.predict(&args.text)?;
    let result = ClassificationResult {
        text: args.text.clone(),
        tag: prediction.tag.clone(),
        confidence: prediction.confidence(),
        probabilities: prediction
            .probabilities
            .into_iter()
            .map(|(tag, probability)| TagProbability { tag, probability })
            .collect(),
    };

    output_result("", &result, cli_args)
}

/// Interactive conversation on stdin/stdout.
fn chat(args: &ChatArgs, cli_args: &ColloquyArgs) -> Result<()> {
    let config = args.model.engine_config()?;
    let corpus = IntentCorpus::from_path(&args.intents)?;
    let finished = Arc::new(AtomicBool::new(false));

    let mut engine = IntentEngine::new(corpus, config)?;
    if let Some(tag) = &args.exit_tag {
        let flag = Arc::clone(&finished);
        engine = engine.with_action(tag.clone(), move || -> anyhow::Result<()> {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
    }

    load_or_train(&mut engine, args.train)?;

    if cli_args.verbosity() > 0 {
        eprintln!("Model '{}' ready. Press Ctrl-D to quit.", engine.model_name());
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let turns = chat_loop(&engine, stdin.lock(), stdout.lock(), &finished)?;
    info!("Conversation ended after {turns} turns");
    Ok(())
}

fn load_or_train(engine: &mut IntentEngine, train_if_missing: bool) -> Result<()> {
    match engine.load() {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() && train_if_missing => {
            warn!("{e}; training a new model");
            engine.fit()?;
            engine.save()
        }
        Err(e) if e.is_not_found() => Err(ColloquyError::not_found(format!(
            "{e}; run `colloquy train` first or pass --train"
        ))),
        Err(e) => Err(e),
    }
}

/// Answer every line of `input` until end of input or until `finished` is
/// set by an action. Returns the number of turns.
pub fn chat_loop<R, W>(
    engine: &IntentEngine,
    input: R,
    mut output: W,
    finished: &AtomicBool,
) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut turns = 0;
    write!(output, "> ")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            write!(output, "> ")?;
            output.flush()?;
            continue;
        }

        let response = engine.respond(text)?;
        turns += 1;
        writeln!(output, "{}", response.text)?;

        if finished.load(Ordering::SeqCst) {
            break;
        }
        write!(output, "> ")?;
        output.flush()?;
    }

    Ok(turns)
}

/// Describe a saved model.
fn inspect(args: &InspectArgs, cli_args: &ColloquyArgs) -> Result<()> {
    let config: EngineConfig = args.model.engine_config()?;
    let storage = Arc::new(FileStorage::open(&config.model_dir)?);
    let result = model_info(&ModelStore::new(storage), &config.model_name, args.words)?;

    output_result("Saved model", &result, cli_args)
}

fn model_info(store: &ModelStore, name: &str, words: bool) -> Result<ModelInfo> {
    let model = store.load(name)?;
    let artifacts = store
        .artifact_sizes(name)?
        .into_iter()
        .map(|(file, bytes)| ArtifactFile { file, bytes })
        .collect();

    let metadata = &model.metadata;
    Ok(ModelInfo {
        model_name: name.to_string(),
        artifact_id: model.artifact_id.map(|id| id.to_string()),
        version: metadata.version.clone(),
        trained_at: metadata.trained_at.to_rfc3339(),
        training_examples: metadata.training_examples,
        vocabulary_size: model.vocabulary.len(),
        vocabulary: words.then(|| model.vocabulary.words().to_vec()),
        tags: model.tags.tags().to_vec(),
        optimizer: metadata.optimizer.clone(),
        hyperparameters: metadata
            .hyperparameters
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect(),
        final_accuracy: model.stats.as_ref().map(|s| s.final_accuracy),
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::ml::intent_classifier::Intent;
    use crate::storage::MemoryStorage;

    fn ready_engine(finished: &Arc<AtomicBool>) -> IntentEngine {
        ready_engine_on(finished, Arc::new(MemoryStorage::new_default()))
    }

    fn ready_engine_on(finished: &Arc<AtomicBool>, storage: Arc<MemoryStorage>) -> IntentEngine {
        let corpus = IntentCorpus::new(vec![
            Intent::new("greeting", ["hello", "hi there"], ["Hi!"]),
            Intent::new("bye", ["goodbye", "see you"], ["Bye!"]),
        ])
        .unwrap();
        let flag = Arc::clone(finished);
        let mut engine = IntentEngine::with_storage(
            corpus,
            EngineConfig::default().with_seed(3),
            storage,
        )
        .unwrap()
        .with_action("bye", move || -> anyhow::Result<()> {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        engine.fit().unwrap();
        engine
    }

    #[test]
    fn test_chat_loop_stops_on_exit_action() {
        let finished = Arc::new(AtomicBool::new(false));
        let engine = ready_engine(&finished);

        let input = Cursor::new("hello\n\ngoodbye\nhello\n");
        let mut output = Vec::new();
        let turns = chat_loop(&engine, input, &mut output, &finished).unwrap();

        assert_eq!(turns, 2);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Hi!"));
        assert!(text.ends_with("Bye!\n"));
    }

    #[test]
    fn test_chat_loop_until_eof() {
        let finished = Arc::new(AtomicBool::new(false));
        let engine = ready_engine(&finished);

        let mut output = Vec::new();
        let turns = chat_loop(&engine, Cursor::new("hello\nhi there"), &mut output, &finished).unwrap();

        assert_eq!(turns, 2);
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_load_or_train() {
        let finished = Arc::new(AtomicBool::new(false));
        let mut engine = ready_engine(&finished);

        let err = load_or_train(&mut engine, false).unwrap_err();
        assert!(err.is_not_found());

        load_or_train(&mut engine, true).unwrap();
        load_or_train(&mut engine, false).unwrap();
        assert!(engine.is_ready());
    }

    #[test]
    fn test_model_info_lists_artifacts() {
        let storage = Arc::new(MemoryStorage::new_default());
        let finished = Arc::new(AtomicBool::new(false));
        ready_engine_on(&finished, storage.clone())
            .save_as("greeter")
            .unwrap();

        let store = ModelStore::new(storage.clone());
        let info = model_info(&store, "greeter", true).unwrap();
        assert_eq!(info.tags, vec!["greeting", "bye"]);
        assert_eq!(info.vocabulary.as_ref().map(Vec::len), Some(info.vocabulary_size));

        let files: Vec<&str> = info.artifacts.iter().map(|a| a.file.as_str()).collect();
        assert_eq!(files, vec!["greeter.model", "greeter_words.bin", "greeter_tags.bin"]);
        for artifact in &info.artifacts {
            assert_eq!(artifact.bytes, storage.get(&artifact.file).unwrap().len() as u64);
        }

        assert!(model_info(&store, "missing", false).unwrap_err().is_not_found());
    }
}
