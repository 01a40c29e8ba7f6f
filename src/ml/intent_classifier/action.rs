//! Host-supplied side effects bound to intent tags.

use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A zero-argument side effect run when its tag is predicted.
///
/// Any closure `Fn() -> anyhow::Result<()>` is an action:
///
/// ```
/// use std::sync::Arc;
///
/// use colloquy::ml::intent_classifier::{IntentAction, MethodMapping};
///
/// let mut actions = MethodMapping::new();
/// let greet = || -> anyhow::Result<()> {
///     println!("hello from the host");
///     Ok(())
/// };
/// actions.insert("greeting".to_string(), Arc::new(greet));
/// assert!(actions["greeting"].execute().is_ok());
/// ```
pub trait IntentAction: Send + Sync {
    fn execute(&self) -> anyhow::Result<()>;
}

impl<F> IntentAction for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self) -> anyhow::Result<()> {
        self()
    }
}

/// Tag → action table consulted by the engine.
pub type MethodMapping = HashMap<String, Arc<dyn IntentAction>>;

/// What happened to the action of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionStatus {
    /// No action is registered for the predicted tag.
    NotRegistered,
    /// The action ran and returned `Ok`.
    Executed,
    /// The action returned an error or panicked; carries the message.
    Failed(String),
}

impl ActionStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, ActionStatus::Failed(_))
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::NotRegistered => write!(f, "none"),
            ActionStatus::Executed => write!(f, "executed"),
            ActionStatus::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// Run `action`, turning both an `Err` and a panic into
/// [`ActionStatus::Failed`].
pub fn run_action(action: &dyn IntentAction) -> ActionStatus {
    match panic::catch_unwind(AssertUnwindSafe(|| action.execute())) {
        Ok(Ok(())) => ActionStatus::Executed,
        Ok(Err(err)) => ActionStatus::Failed(format!("{err:#}")),
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "action panicked".to_string()
            };
            ActionStatus::Failed(msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{Context, bail};

    use super::*;

    #[test]
    fn test_closure_is_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let action = move || -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        assert_eq!(run_action(&action), ActionStatus::Executed);
        assert_eq!(run_action(&action), ActionStatus::Executed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_error_is_captured() {
        let action = || -> anyhow::Result<()> {
            let missing: Option<u32> = None;
            missing.context("no portfolio loaded")?;
            Ok(())
        };
        assert_eq!(
            run_action(&action),
            ActionStatus::Failed("no portfolio loaded".to_string())
        );

        let action = || -> anyhow::Result<()> { bail!("price feed offline") };
        assert!(run_action(&action).is_failed());
    }

    #[test]
    fn test_panic_is_captured() {
        let action = || -> anyhow::Result<()> { panic!("division by zero") };
        assert_eq!(
            run_action(&action),
            ActionStatus::Failed("division by zero".to_string())
        );

        let action = || -> anyhow::Result<()> { panic!("{} shares", 3) };
        assert_eq!(run_action(&action), ActionStatus::Failed("3 shares".to_string()));
    }

    #[test]
    fn test_display() {
        assert_eq!(ActionStatus::Executed.to_string(), "executed");
        assert_eq!(ActionStatus::Failed("x".into()).to_string(), "failed: x");
    }
}
