//! Capability interface over a tokenizer and a sequence-classification model.
//!
//! A [`ModelHandle`] bundles one tokenizer with one model that share a label
//! space. It is built once at startup and only ever read afterwards, so it is
//! shared across request handlers without synchronization at this layer.

use crate::source::ModelSource;

/// Tokenized input for a single text, ready to be fed to a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl Encoding {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Converts raw text into model input.
pub trait TextTokenizer: Send + Sync {
    fn encode(&self, text: &str) -> anyhow::Result<Encoding>;
}

/// How raw logits are turned into per-class scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFunction {
    /// Single-label, multi-class head.
    Softmax,
    /// Single-logit or multi-label head.
    Sigmoid,
}

/// A model mapping tokenized input to one logit per class.
pub trait SequenceClassifier: Send + Sync {
    /// Label names, index-aligned with the logits.
    fn labels(&self) -> &[String];

    fn score_fn(&self) -> ScoreFunction {
        ScoreFunction::Softmax
    }

    /// Run one forward pass and return the raw logits for the single input.
    fn logits(&self, input: &Encoding) -> anyhow::Result<Vec<f32>>;
}

/// Top class of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Class index into [`SequenceClassifier::labels`].
    pub index: usize,
    pub label: String,
    pub score: f32,
}

/// Immutable tokenizer + model pair produced by the resolver.
pub struct ModelHandle {
    tokenizer: Box<dyn TextTokenizer>,
    model: Box<dyn SequenceClassifier>,
    tokenizer_source: ModelSource,
    model_source: ModelSource,
}

impl ModelHandle {
    pub fn new(
        tokenizer: Box<dyn TextTokenizer>,
        model: Box<dyn SequenceClassifier>,
        tokenizer_source: ModelSource,
        model_source: ModelSource,
    ) -> Self {
        Self {
            tokenizer,
            model,
            tokenizer_source,
            model_source,
        }
    }

    pub fn tokenizer_source(&self) -> &ModelSource {
        &self.tokenizer_source
    }

    pub fn model_source(&self) -> &ModelSource {
        &self.model_source
    }

    /// Label space of the model, index-aligned with its logits.
    pub fn labels(&self) -> &[String] {
        self.model.labels()
    }

    /// Human-readable identifier of where this handle was loaded from.
    ///
    /// Names only the model source when tokenizer and model share an origin,
    /// otherwise both, so a hybrid resolution is visible to clients.
    pub fn describe(&self) -> String {
        if self.tokenizer_source == self.model_source {
            self.model_source.to_string()
        } else {
            format!(
                "model={} tokenizer={}",
                self.model_source, self.tokenizer_source
            )
        }
    }

    /// Tokenize `text`, run a single forward pass and return the top class.
    pub fn classify(&self, text: &str) -> anyhow::Result<ClassificationResult> {
        let encoding = self.tokenizer.encode(text)?;
        let logits = self.model.logits(&encoding)?;
        let labels = self.model.labels();
        anyhow::ensure!(
            logits.len() == labels.len(),
            "model returned {} logits for {} labels",
            logits.len(),
            labels.len()
        );

        let scores = score(&logits, self.model.score_fn());
        let Some((idx, best)) = argmax(&scores) else {
            anyhow::bail!("model returned no logits");
        };
        anyhow::ensure!(best.is_finite(), "model produced a non-finite score");

        Ok(ClassificationResult {
            index: idx,
            label: labels[idx].clone(),
            score: best,
        })
    }
}

/// Normalize logits into probabilities.
pub fn score(logits: &[f32], function: ScoreFunction) -> Vec<f32> {
    match function {
        ScoreFunction::Softmax => softmax(logits),
        ScoreFunction::Sigmoid => logits.iter().map(|&x| 1.0 / (1.0 + (-x).exp())).collect(),
    }
}

/// Numerically stable softmax.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest score; first wins on ties.
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, s)| match best {
            Some((_, b)) if b >= s => best,
            _ => Some((i, s)),
        })
}
