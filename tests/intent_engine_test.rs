use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use colloquy::error::Result;
use colloquy::ml::intent_classifier::{
    ActionStatus, EngineConfig, FALLBACK_RESPONSE, Intent, IntentClassifier, IntentCorpus,
    IntentEngine,
};
use colloquy::ml::network::{Activation, LayerSpec, OptimizerConfig};
use colloquy::storage::{MemoryStorage, Storage};

fn greeting_corpus() -> IntentCorpus {
    IntentCorpus::new(vec![
        Intent::new("greeting", ["hello", "hi there"], ["Hi!"]),
        Intent::new("bye", ["goodbye", "see you"], ["Bye!"]),
    ])
    .unwrap()
}

fn engine_on(storage: Arc<dyn Storage>) -> Result<IntentEngine> {
    IntentEngine::with_storage(
        greeting_corpus(),
        EngineConfig::default().with_seed(7),
        storage,
    )
}

#[test]
fn test_greeting_and_bye() -> Result<()> {
    let mut engine = engine_on(Arc::new(MemoryStorage::new_default()))?;
    engine.fit()?;

    assert_eq!(engine.classify("hello")?, "greeting");
    assert_eq!(engine.classify("goodbye")?, "bye");
    assert_eq!(engine.ask("hello")?, "Hi!");
    assert_eq!(engine.ask("goodbye")?, "Bye!");

    Ok(())
}

#[test]
fn test_every_pattern_is_learned() -> Result<()> {
    let corpus = IntentCorpus::from_json_str(
        r#"{"intents": [
            {"tag": "weather", "patterns": ["is it raining", "weather forecast"], "responses": ["Sunny."]},
            {"tag": "time", "patterns": ["what time is it", "current clock"], "responses": ["Noon."]},
            {"tag": "music", "patterns": ["play a song", "start the playlist"], "responses": ["Playing."]}
        ]}"#,
    )?;
    let mut engine = IntentEngine::with_storage(
        corpus.clone(),
        EngineConfig::default().with_seed(11),
        Arc::new(MemoryStorage::new_default()),
    )?;
    let stats = engine.fit()?;

    assert_eq!(stats.examples, 6);
    for intent in corpus.intents() {
        for pattern in &intent.patterns {
            assert_eq!(engine.classify(pattern)?, intent.tag, "pattern '{pattern}'");
        }
    }

    Ok(())
}

fn every_pattern() -> Vec<String> {
    greeting_corpus()
        .intents()
        .iter()
        .flat_map(|intent| intent.patterns.clone())
        .collect()
}

#[test]
fn test_restart_reloads_model() -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new_default());
    let patterns = every_pattern();

    let before = {
        let mut engine = engine_on(Arc::clone(&storage))?;
        engine.fit()?;
        engine.save()?;
        patterns
            .iter()
            .map(|pattern| engine.predict(pattern))
            .collect::<Result<Vec<_>>>()?
    };

    // Fresh engine over the same storage, no training.
    let mut engine = engine_on(Arc::clone(&storage))?;
    assert!(!engine.is_ready());
    engine.load()?;

    for (pattern, before) in patterns.iter().zip(&before) {
        let after = engine.predict(pattern)?;
        assert_eq!(after.tag, before.tag, "pattern '{pattern}'");
        for ((tag_a, p_a), (tag_b, p_b)) in before.probabilities.iter().zip(&after.probabilities) {
            assert_eq!(tag_a, tag_b);
            assert!((p_a - p_b).abs() < 1e-6, "pattern '{pattern}'");
        }
    }
    assert_eq!(engine.tags().unwrap().tags(), &["greeting", "bye"]);
    assert!(engine.training_stats().is_some());

    Ok(())
}

#[test]
fn test_failed_refit_keeps_model() -> Result<()> {
    let mut engine = engine_on(Arc::new(MemoryStorage::new_default()))?;
    engine.fit()?;

    let patterns = every_pattern();
    let tags_before: Vec<String> = patterns
        .iter()
        .map(|pattern| engine.classify(pattern))
        .collect::<Result<_>>()?;
    let vocabulary_before = engine.vocabulary().cloned();
    let trained_at = engine.metadata().map(|m| m.trained_at);

    let err = engine.fit_with(OptimizerConfig::default(), 0).unwrap_err();
    assert!(err.is_configuration());

    assert!(engine.is_ready());
    assert_eq!(engine.vocabulary().cloned(), vocabulary_before);
    assert_eq!(engine.metadata().map(|m| m.trained_at), trained_at);
    for (pattern, tag) in patterns.iter().zip(&tags_before) {
        assert_eq!(&engine.classify(pattern)?, tag, "pattern '{pattern}'");
    }

    Ok(())
}

#[test]
fn test_refit_replaces_loaded_model() -> Result<()> {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new_default());
    let weather = IntentCorpus::new(vec![
        Intent::new("weather", ["is it raining", "weather forecast"], ["Sunny."]),
        Intent::new("time", ["what time is it"], ["Noon."]),
        Intent::new("music", ["play a song"], ["Playing."]),
    ])?;
    let mut other = IntentEngine::with_storage(
        weather,
        EngineConfig::default().with_seed(2).with_epochs(20),
        Arc::clone(&storage),
    )?;
    other.fit()?;
    other.save()?;

    let mut engine = engine_on(Arc::clone(&storage))?;
    engine.load()?;
    assert_eq!(engine.tags().unwrap().tags(), &["weather", "time", "music"]);
    assert!(engine.vocabulary().unwrap().contains("weather"));

    let stats = engine.fit_with(OptimizerConfig::sgd(0.1, 0.9), 300)?;
    assert_eq!(stats.epochs, 300);

    assert_eq!(engine.tags().unwrap().tags(), &["greeting", "bye"]);
    let vocabulary = engine.vocabulary().unwrap();
    assert!(vocabulary.contains("hello"));
    assert!(!vocabulary.contains("weather"));
    let metadata = engine.metadata().unwrap();
    assert_eq!(metadata.optimizer, "sgd");
    assert_eq!(metadata.vocabulary_size, vocabulary.len());
    assert_eq!(metadata.tag_count, 2);

    // The network matches the new vocabulary width and tag count.
    for pattern in every_pattern() {
        let prediction = engine.predict(&pattern)?;
        assert_eq!(prediction.probabilities.len(), 2);
        assert!(["greeting", "bye"].contains(&prediction.tag.as_str()));
    }

    Ok(())
}

#[test]
fn test_file_storage_round_trip() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let config = EngineConfig::default()
        .with_seed(3)
        .with_model_dir(dir.path());

    let mut engine = IntentEngine::new(greeting_corpus(), config.clone())?;
    engine.fit()?;
    engine.save()?;

    for file in ["basic_model.model", "basic_model_words.bin", "basic_model_tags.bin"] {
        assert!(dir.path().join(file).exists(), "missing {file}");
    }
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    let mut restarted = IntentEngine::new(greeting_corpus(), config)?;
    restarted.load()?;
    assert_eq!(restarted.classify("hello")?, "greeting");
    assert_eq!(restarted.classify("goodbye")?, "bye");

    Ok(())
}

#[test]
fn test_load_missing_model() -> Result<()> {
    let mut engine = engine_on(Arc::new(MemoryStorage::new_default()))?;

    let err = engine.load_from("nonexistent_model").unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("nonexistent_model"));
    assert!(!engine.is_ready());

    Ok(())
}

#[test]
fn test_not_ready_before_fit() -> Result<()> {
    let engine = engine_on(Arc::new(MemoryStorage::new_default()))?;

    assert!(engine.classify("hello").unwrap_err().is_not_ready());
    assert!(engine.predict("hello").unwrap_err().is_not_ready());
    assert!(engine.ask("hello").unwrap_err().is_not_ready());
    assert!(IntentClassifier::predict(&engine, "hello").is_err());

    Ok(())
}

#[test]
fn test_failing_action_does_not_abort() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut engine = engine_on(Arc::new(MemoryStorage::new_default()))?
        .with_action("bye", || -> anyhow::Result<()> {
            anyhow::bail!("could not write portfolio")
        })
        .with_action("greeting", move || -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    engine.fit()?;

    let response = engine.respond("goodbye")?;
    assert_eq!(response.tag, "bye");
    assert!(response.action.is_failed());
    assert_ne!(response.text, "Bye!");
    assert!(response.text.contains("could not write portfolio"));

    // The engine keeps serving turns after a failure.
    let response = engine.respond("hello")?;
    assert_eq!(response.action, ActionStatus::Executed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[test]
fn test_panicking_action_is_contained() -> Result<()> {
    let mut engine = engine_on(Arc::new(MemoryStorage::new_default()))?.with_action(
        "greeting",
        || -> anyhow::Result<()> { panic!("chart backend crashed") },
    );
    engine.fit()?;

    let response = engine.respond("hello")?;
    assert!(response.action.is_failed());
    assert!(response.text.starts_with("Error executing action for 'greeting'"));

    Ok(())
}

#[test]
fn test_respond_accepts_any_text() -> Result<()> {
    let mut engine = engine_on(Arc::new(MemoryStorage::new_default()))?;
    engine.fit()?;

    for text in ["", "   ", "?!,.", "zzzz qqqq", "héllo wörld", "1234 5678"] {
        let response = engine.respond(text)?;
        assert!(["greeting", "bye"].contains(&response.tag.as_str()));
        assert!(["Hi!", "Bye!"].contains(&response.text.as_str()));
        assert_ne!(response.text, FALLBACK_RESPONSE);
    }

    Ok(())
}

#[test]
fn test_corpus_validation() {
    assert!(IntentCorpus::from_json_str(r#"{"items": []}"#)
        .unwrap_err()
        .is_configuration());
    assert!(IntentCorpus::from_json_str(r#"{"intents": []}"#)
        .unwrap_err()
        .is_configuration());
    assert!(IntentCorpus::from_json_str(
        r#"{"intents": [{"tag": "a", "patterns": [], "responses": ["x"]}]}"#
    )
    .unwrap_err()
    .is_configuration());
    assert!(IntentCorpus::new(vec![
        Intent::new("a", ["one"], ["x"]),
        Intent::new("a", ["two"], ["y"]),
    ])
    .unwrap_err()
    .is_configuration());
    assert!(IntentCorpus::from_path("does/not/exist.json")
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_invalid_hidden_layers() {
    let config =
        EngineConfig::default().with_hidden_layers(vec![LayerSpec::dense(0, Activation::Relu)]);
    let err = IntentEngine::with_storage(
        greeting_corpus(),
        config,
        Arc::new(MemoryStorage::new_default()),
    )
    .unwrap_err();
    assert!(err.is_configuration());

    let config = EngineConfig::default().with_hidden_layers(vec![LayerSpec::dropout(1.5)]);
    assert!(config.validate().unwrap_err().is_configuration());
}

#[test]
fn test_custom_hidden_layers_from_file() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("engine.json");
    std::fs::write(
        &path,
        r#"{
            "model_name": "tiny",
            "hidden_layers": [{"type": "dense", "units": 16}],
            "trainer": {"epochs": 150, "seed": 5}
        }"#,
    )?;

    let config = EngineConfig::from_path(&path)?.with_model_dir(dir.path());
    assert_eq!(config.model_name, "tiny");
    assert_eq!(config.hidden_layers(), vec![LayerSpec::dense(16, Activation::Relu)]);

    let mut engine = IntentEngine::new(greeting_corpus(), config)?;
    let stats = engine.fit()?;
    assert_eq!(stats.epochs, 150);
    engine.save()?;
    assert!(dir.path().join("tiny.model").exists());

    Ok(())
}

#[test]
fn test_demo_corpus() -> Result<()> {
    let corpus = IntentCorpus::from_json_str(include_str!("../demos/intents.json"))?;
    assert_eq!(corpus.len(), 7);

    let mut engine = IntentEngine::with_storage(
        corpus,
        EngineConfig::default().with_seed(1),
        Arc::new(MemoryStorage::new_default()),
    )?;
    engine.fit()?;

    assert_eq!(engine.classify("Hello")?, "greeting");
    assert_eq!(engine.classify("Goodbye")?, "goodbye");
    assert_eq!(engine.classify("Draw a stock chart")?, "plot_chart");

    Ok(())
}
