//! Tiered resolution of a working tokenizer + model pair.
//!
//! Strategies are tried in order: fully local, hub tokenizer with local
//! weights, fully remote. The first strategy that loads both halves wins.
//! Partial success inside a strategy counts as that strategy's failure.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::handle::{ModelHandle, SequenceClassifier, TextTokenizer};
use crate::source::ModelSource;

/// Loads tokenizers and models from a [`ModelSource`].
pub trait ArtifactLoader {
    fn load_tokenizer(&self, source: &ModelSource) -> anyhow::Result<Box<dyn TextTokenizer>>;
    fn load_model(&self, source: &ModelSource) -> anyhow::Result<Box<dyn SequenceClassifier>>;
}

/// One way of obtaining a tokenizer + model pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub name: &'static str,
    pub tokenizer: ModelSource,
    pub model: ModelSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Loaded,
    Failed(String),
}

/// Diagnostic record of one strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: &'static str,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Loaded => write!(f, "{}: loaded", self.strategy),
            AttemptOutcome::Failed(reason) => write!(f, "{}: {reason}", self.strategy),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no model could be loaded ({} strategies failed, last: {})", .attempts.len(), last_failure(.attempts))]
    Exhausted { attempts: Vec<Attempt> },
}

fn last_failure(attempts: &[Attempt]) -> String {
    attempts
        .last()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "no strategies configured".into())
}

/// Successful resolution: the handle plus every attempt that led to it.
pub struct Resolution {
    pub handle: ModelHandle,
    pub attempts: Vec<Attempt>,
}

/// Ordered list of resolution strategies.
pub struct ModelResolver {
    strategies: Vec<Strategy>,
}

impl ModelResolver {
    /// Build the standard local → hybrid → remote sequence.
    pub fn new(local_dir: impl Into<PathBuf>, hub_id: impl Into<String>) -> Self {
        let local = ModelSource::Local(local_dir.into());
        let hub = ModelSource::Hub(hub_id.into());
        Self {
            strategies: vec![
                Strategy {
                    name: "fully-local",
                    tokenizer: local.clone(),
                    model: local.clone(),
                },
                Strategy {
                    name: "hybrid",
                    tokenizer: hub.clone(),
                    model: local,
                },
                Strategy {
                    name: "fully-remote",
                    tokenizer: hub.clone(),
                    model: hub,
                },
            ],
        }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Try each strategy in turn and return the first working handle.
    pub fn resolve(&self, loader: &dyn ArtifactLoader) -> Result<Resolution, ResolveError> {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for (i, strategy) in self.strategies.iter().enumerate() {
            info!(
                strategy = strategy.name,
                tokenizer = %strategy.tokenizer,
                model = %strategy.model,
                "attempting model resolution"
            );

            match attempt(strategy, loader) {
                Ok(handle) => {
                    info!(strategy = strategy.name, source = %handle.describe(), "model resolved");
                    attempts.push(Attempt {
                        strategy: strategy.name,
                        outcome: AttemptOutcome::Loaded,
                    });
                    return Ok(Resolution { handle, attempts });
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    if i + 1 < self.strategies.len() {
                        warn!(strategy = strategy.name, error = %reason, "strategy failed, falling back");
                    } else {
                        error!(strategy = strategy.name, error = %reason, "final strategy failed");
                    }
                    attempts.push(Attempt {
                        strategy: strategy.name,
                        outcome: AttemptOutcome::Failed(reason),
                    });
                }
            }
        }

        Err(ResolveError::Exhausted { attempts })
    }
}

fn attempt(strategy: &Strategy, loader: &dyn ArtifactLoader) -> anyhow::Result<ModelHandle> {
    let tokenizer = loader
        .load_tokenizer(&strategy.tokenizer)
        .map_err(|e| e.context(format!("tokenizer from {}", strategy.tokenizer)))?;
    let model = loader
        .load_model(&strategy.model)
        .map_err(|e| e.context(format!("model from {}", strategy.model)))?;
    Ok(ModelHandle::new(
        tokenizer,
        model,
        strategy.tokenizer.clone(),
        strategy.model.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_order() {
        let resolver = ModelResolver::new("saved-model", "distilbert-base-uncased");
        let names: Vec<&str> = resolver.strategies().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["fully-local", "hybrid", "fully-remote"]);

        let hybrid = &resolver.strategies()[1];
        assert_eq!(
            hybrid.tokenizer,
            ModelSource::Hub("distilbert-base-uncased".into())
        );
        assert_eq!(
            hybrid.model,
            ModelSource::Local(PathBuf::from("saved-model"))
        );
    }

    #[test]
    fn exhausted_message_names_last_failure() {
        let err = ResolveError::Exhausted {
            attempts: vec![
                Attempt {
                    strategy: "fully-local",
                    outcome: AttemptOutcome::Failed("no tokenizer.json".into()),
                },
                Attempt {
                    strategy: "fully-remote",
                    outcome: AttemptOutcome::Failed("network unreachable".into()),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 strategies failed"), "{msg}");
        assert!(msg.contains("fully-remote: network unreachable"), "{msg}");
    }
}
