//! Spam classification models: tiered resolution of a tokenizer + model pair and
//! single-text inference over it. The ONNX Runtime backend sits behind `onnx`.

pub mod handle;
pub mod labels;
pub mod resolver;
pub mod source;

pub use handle::{
    ClassificationResult, Encoding, ModelHandle, ScoreFunction, SequenceClassifier, TextTokenizer,
};
pub use labels::{DEFAULT_SPAM_LABEL, ModelConfig, SpamLabels};
pub use resolver::{
    ArtifactLoader, Attempt, AttemptOutcome, ModelResolver, Resolution, ResolveError, Strategy,
};
pub use source::ModelSource;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::{DEFAULT_HUB_WEIGHTS_FILE, OnnxClassifier, OnnxLoader, OnnxTokenizer};
