//! Label space of a classification model and which label means "spam".
//!
//! The label names come from the model's `config.json` (`id2label`), falling
//! back to the hub's `LABEL_<i>` convention. Which of those names is the spam
//! class is deployment configuration and is chosen per model source, because
//! a locally fine-tuned model and a community hub model need not agree on
//! class order.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::handle::ScoreFunction;
use crate::source::ModelSource;

/// Default spam label: the model's second class index.
pub const DEFAULT_SPAM_LABEL: &str = "LABEL_1";

/// The subset of a Hugging Face `config.json` needed for classification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub id2label: HashMap<String, String>,
    #[serde(default)]
    pub problem_type: Option<String>,
}

impl ModelConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("read {}: {e}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Ordered label names for a head with `num_labels` outputs.
    pub fn labels(&self, num_labels: usize) -> Vec<String> {
        (0..num_labels)
            .map(|i| {
                self.id2label
                    .get(&i.to_string())
                    .cloned()
                    .unwrap_or_else(|| format!("LABEL_{i}"))
            })
            .collect()
    }

    pub fn score_fn(&self, num_labels: usize) -> ScoreFunction {
        if num_labels == 1 || self.problem_type.as_deref() == Some("multi_label_classification") {
            ScoreFunction::Sigmoid
        } else {
            ScoreFunction::Softmax
        }
    }
}

/// Spam label per model source.
///
/// A configured label is either a name from the model's label space or the
/// `LABEL_<i>` class-index form, which matches regardless of `id2label`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamLabels {
    pub local: String,
    pub hub: String,
}

impl Default for SpamLabels {
    fn default() -> Self {
        Self {
            local: DEFAULT_SPAM_LABEL.into(),
            hub: DEFAULT_SPAM_LABEL.into(),
        }
    }
}

impl SpamLabels {
    pub fn for_source(&self, model_source: &ModelSource) -> &str {
        match model_source {
            ModelSource::Local(_) => &self.local,
            ModelSource::Hub(_) => &self.hub,
        }
    }

    /// Class index of the spam label for a model from `model_source`.
    ///
    /// Fails when the configured label names no class of `labels`.
    pub fn resolve_index(
        &self,
        model_source: &ModelSource,
        labels: &[String],
    ) -> anyhow::Result<usize> {
        let wanted = self.for_source(model_source);
        if let Some(idx) = labels.iter().position(|l| l == wanted) {
            return Ok(idx);
        }
        if let Some(idx) = class_index(wanted)
            && idx < labels.len()
        {
            return Ok(idx);
        }
        anyhow::bail!(
            "spam label {wanted:?} is not in the label space {labels:?} of {model_source}"
        )
    }
}

/// Parse the `LABEL_<i>` hub convention.
fn class_index(label: &str) -> Option<usize> {
    label.strip_prefix("LABEL_")?.parse().ok()
}
