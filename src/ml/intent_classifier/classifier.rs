//! Intent classifier trait definition.

use crate::error::Result;

/// Intent classifier trait.
///
/// Maps an utterance to the tag of the best-matching intent.
pub trait IntentClassifier: Send + Sync {
    /// Predict the intent tag for a given query.
    fn predict(&self, query: &str) -> Result<String>;

    /// Get the name of this classifier for debugging and logging.
    fn name(&self) -> &str;
}
