//! The intent engine: training, persistence and turn dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

use crate::analysis::IntentAnalyzer;
use crate::error::{ColloquyError, Result};
use crate::ml::models::{ModelMetadata, TrainingStats};
use crate::ml::network::{OptimizerConfig, argmax};
use crate::storage::{FileStorage, Storage};

use super::action::{ActionStatus, IntentAction, MethodMapping, run_action};
use super::classifier::IntentClassifier;
use super::config::EngineConfig;
use super::encoder::encode_text;
use super::store::{ModelStore, TrainedModel};
use super::trainer::Trainer;
use super::types::IntentCorpus;
use super::vocabulary::{TagList, Vocabulary, VocabularyBuilder};

/// Reply used when the predicted tag has no intent in the corpus.
pub const FALLBACK_RESPONSE: &str = "I don't understand. Please try again.";

/// Full output of the classifier for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Arg-max tag.
    pub tag: String,
    /// Probability of every tag, in tag-list order.
    pub probabilities: Vec<(String, f32)>,
}

impl Prediction {
    /// Probability assigned to the predicted tag.
    pub fn confidence(&self) -> f32 {
        self.probabilities
            .iter()
            .find(|(tag, _)| *tag == self.tag)
            .map(|(_, p)| *p)
            .unwrap_or(0.0)
    }
}

/// Result of one conversational turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub tag: String,
    pub text: String,
    pub action: ActionStatus,
}

struct ReadyModel {
    model: TrainedModel,
    analyzer: IntentAnalyzer,
}

impl ReadyModel {
    fn new(model: TrainedModel) -> Result<Self> {
        let analyzer = IntentAnalyzer::from_config(&model.analyzer)?;
        Ok(ReadyModel { model, analyzer })
    }
}

enum EngineState {
    Untrained,
    Ready(Box<ReadyModel>),
}

/// Intent-classification engine.
///
/// Starts `Untrained`; [`fit`](Self::fit) or [`load`](Self::load) make it
/// ready. Inference before that fails with `NotReady`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use colloquy::ml::intent_classifier::{EngineConfig, IntentCorpus, IntentEngine};
/// use colloquy::storage::MemoryStorage;
///
/// # fn main() -> colloquy::error::Result<()> {
/// let corpus = IntentCorpus::from_json_str(r#"{"intents": [
///     {"tag": "greeting", "patterns": ["hello", "hi there"], "responses": ["Hi!"]},
///     {"tag": "bye", "patterns": ["goodbye", "see you"], "responses": ["Bye!"]}
/// ]}"#)?;
///
/// let mut engine = IntentEngine::with_storage(
///     corpus,
///     EngineConfig::default().with_seed(42),
///     Arc::new(MemoryStorage::new_default()),
/// )?;
/// engine.fit()?;
///
/// assert_eq!(engine.classify("hello")?, "greeting");
/// assert_eq!(engine.ask("goodbye")?, "Bye!");
/// # Ok(())
/// # }
/// ```
pub struct IntentEngine {
    corpus: IntentCorpus,
    config: EngineConfig,
    actions: MethodMapping,
    store: ModelStore,
    state: EngineState,
    rng: Mutex<StdRng>,
}

impl IntentEngine {
    /// Create an engine persisting to `config.model_dir`.
    pub fn new(corpus: IntentCorpus, config: EngineConfig) -> Result<Self> {
        let storage = Arc::new(FileStorage::open(&config.model_dir)?);
        Self::with_storage(corpus, config, storage)
    }

    /// Create an engine persisting to an explicit storage backend.
    pub fn with_storage(
        corpus: IntentCorpus,
        config: EngineConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self> {
        corpus.validate()?;
        config.validate()?;
        IntentAnalyzer::from_config(&config.analyzer)?;

        let rng = match config.trainer.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(IntentEngine {
            corpus,
            config,
            actions: HashMap::new(),
            store: ModelStore::new(storage),
            state: EngineState::Untrained,
            rng: Mutex::new(rng),
        })
    }

    /// Register the action run when `tag` is predicted.
    pub fn with_action<A>(mut self, tag: impl Into<String>, action: A) -> Self
    where
        A: IntentAction + 'static,
    {
        self.register(tag.into(), Arc::new(action));
        self
    }

    /// Register a whole method mapping.
    pub fn with_actions(mut self, actions: MethodMapping) -> Self {
        for (tag, action) in actions {
            self.register(tag, action);
        }
        self
    }

    fn register(&mut self, tag: String, action: Arc<dyn IntentAction>) {
        if self.corpus.intent(&tag).is_none() {
            warn!("Action registered for tag '{tag}' which has no intent");
        }
        self.actions.insert(tag, action);
    }

    pub fn corpus(&self) -> &IntentCorpus {
        &self.corpus
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    fn ready(&self) -> Result<&ReadyModel> {
        match &self.state {
            EngineState::Ready(ready) => Ok(&**ready),
            EngineState::Untrained => Err(ColloquyError::not_ready(
                "no model trained or loaded; call fit or load first",
            )),
        }
    }

    fn trained(&self) -> Option<&TrainedModel> {
        match &self.state {
            EngineState::Ready(ready) => Some(&ready.model),
            EngineState::Untrained => None,
        }
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.trained().map(|model| &model.vocabulary)
    }

    pub fn tags(&self) -> Option<&TagList> {
        self.trained().map(|model| &model.tags)
    }

    pub fn training_stats(&self) -> Option<&TrainingStats> {
        self.trained().and_then(|model| model.stats.as_ref())
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.trained().map(|model| &model.metadata)
    }

    /// Train with the configured optimizer and epoch count.
    pub fn fit(&mut self) -> Result<TrainingStats> {
        let trainer = Trainer::new(self.config.trainer.clone(), self.config.hidden_layers())?;
        self.fit_trainer(trainer)
    }

    /// Train with an explicit optimizer and epoch count.
    pub fn fit_with(&mut self, optimizer: OptimizerConfig, epochs: usize) -> Result<TrainingStats> {
        let trainer = Trainer::new(self.config.trainer.clone(), self.config.hidden_layers())?
            .with_optimizer(optimizer)?
            .with_epochs(epochs)?;
        self.fit_trainer(trainer)
    }

    fn fit_trainer(&mut self, trainer: Trainer) -> Result<TrainingStats> {
        let analyzer = IntentAnalyzer::from_config(&self.config.analyzer)?;
        let built = VocabularyBuilder::new(&analyzer).build(&self.corpus)?;
        let (network, stats) = trainer.fit(&built.documents, &built.vocabulary, &built.tags)?;

        let trainer_config = trainer.config();
        let mut metadata = ModelMetadata::new(&self.config.model_name);
        metadata.training_examples = built.documents.len();
        metadata.vocabulary_size = built.vocabulary.len();
        metadata.tag_count = built.tags.len();
        metadata.optimizer = trainer_config.optimizer.name().to_string();
        metadata.hyperparameters.insert(
            "learning_rate".to_string(),
            trainer_config.optimizer.learning_rate() as f64,
        );
        metadata
            .hyperparameters
            .insert("epochs".to_string(), trainer_config.epochs as f64);
        metadata
            .hyperparameters
            .insert("batch_size".to_string(), trainer_config.batch_size as f64);

        let model = TrainedModel {
            network,
            vocabulary: built.vocabulary,
            tags: built.tags,
            analyzer: self.config.analyzer.clone(),
            metadata,
            stats: Some(stats.clone()),
            artifact_id: None,
        };
        self.state = EngineState::Ready(Box::new(ReadyModel { model, analyzer }));

        info!(
            "Engine '{}' ready: {} tags, final accuracy {:.3}",
            self.config.model_name,
            self.tags().map(TagList::len).unwrap_or(0),
            stats.final_accuracy
        );
        Ok(stats)
    }

    /// Persist the current model under the configured model name.
    pub fn save(&self) -> Result<()> {
        self.save_as(&self.config.model_name)
    }

    pub fn save_as(&self, name: &str) -> Result<()> {
        let ready = self.ready()?;
        self.store.save(name, &ready.model)?;
        Ok(())
    }

    /// Replace the current model with the one saved under the configured name.
    pub fn load(&mut self) -> Result<()> {
        let name = self.config.model_name.clone();
        self.load_from(&name)
    }

    /// On failure the previous state is kept.
    pub fn load_from(&mut self, name: &str) -> Result<()> {
        let model = self.store.load(name)?;
        for tag in model.tags.tags() {
            if self.corpus.intent(tag).is_none() {
                warn!("Loaded model predicts tag '{tag}' which has no intent in the corpus");
            }
        }
        let ready = ReadyModel::new(model)?;
        self.state = EngineState::Ready(Box::new(ready));
        Ok(())
    }

    /// Class distribution for `text`.
    pub fn predict(&self, text: &str) -> Result<Prediction> {
        let ready = self.ready()?;
        let model = &ready.model;

        let features = encode_text(&ready.analyzer, text, &model.vocabulary)?;
        if features.iter().all(|f| *f == 0.0) {
            debug!("No known words in {text:?}");
        }
        let probabilities = model.network.predict(&features)?;
        let index = argmax(&probabilities)
            .ok_or_else(|| ColloquyError::other("classifier produced no output"))?;
        let tag = model
            .tags
            .get(index)
            .ok_or_else(|| ColloquyError::other(format!("output {index} has no tag")))?
            .to_string();

        let probabilities = model
            .tags
            .tags()
            .iter()
            .cloned()
            .zip(probabilities)
            .collect();

        Ok(Prediction { tag, probabilities })
    }

    /// Tag of the best-matching intent.
    pub fn classify(&self, text: &str) -> Result<String> {
        Ok(self.predict(text)?.tag)
    }

    /// Handle one turn: classify, run the tag's action, pick a reply.
    ///
    /// Once the engine is ready this only fails if the analyzer does; action
    /// failures and unknown tags are reported in the response.
    pub fn respond(&self, text: &str) -> Result<Response> {
        let tag = self.classify(text)?;

        let action = match self.actions.get(&tag) {
            Some(action) => run_action(action.as_ref()),
            None => ActionStatus::NotRegistered,
        };

        let text = match &action {
            ActionStatus::Failed(msg) => {
                warn!("Action for '{tag}' failed: {msg}");
                format!("Error executing action for '{tag}': {msg}")
            }
            _ => self.pick_response(&tag),
        };

        Ok(Response { tag, text, action })
    }

    /// Like [`respond`](Self::respond), returning only the reply text.
    pub fn ask(&self, text: &str) -> Result<String> {
        Ok(self.respond(text)?.text)
    }

    fn pick_response(&self, tag: &str) -> String {
        let Some(intent) = self.corpus.intent(tag) else {
            warn!("Predicted tag '{tag}' has no intent; using fallback response");
            return FALLBACK_RESPONSE.to_string();
        };
        let mut rng = self.rng.lock();
        intent
            .responses
            .choose(&mut *rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_RESPONSE.to_string())
    }
}

impl IntentClassifier for IntentEngine {
    fn predict(&self, query: &str) -> Result<String> {
        self.classify(query)
    }

    fn name(&self) -> &str {
        &self.config.model_name
    }
}

impl std::fmt::Debug for IntentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentEngine")
            .field("model_name", &self.config.model_name)
            .field("intents", &self.corpus.len())
            .field("actions", &self.actions.len())
            .field("ready", &self.is_ready())
            .finish()
    }
}
