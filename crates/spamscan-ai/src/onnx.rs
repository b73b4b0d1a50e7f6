//! ONNX Runtime sequence classifier with Hugging Face Hub fallback.
//!
//! A local model directory must contain `model.onnx` and `tokenizer.json`;
//! `config.json` is optional and supplies `id2label`. Hub repositories are
//! fetched through the `hf-hub` cache.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::handle::{Encoding, ScoreFunction, SequenceClassifier, TextTokenizer};
use crate::labels::ModelConfig;
use crate::resolver::ArtifactLoader;
use crate::source::ModelSource;

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const MODEL_FILE: &str = "model.onnx";
pub const CONFIG_FILE: &str = "config.json";
/// Where exported ONNX weights usually live in a hub repository.
pub const DEFAULT_HUB_WEIGHTS_FILE: &str = "onnx/model.onnx";

/// `tokenizers` tokenizer behind the [`TextTokenizer`] capability.
pub struct OnnxTokenizer {
    tokenizer: Tokenizer,
}

impl OnnxTokenizer {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        anyhow::ensure!(path.exists(), "{TOKENIZER_FILE} not found at {path:?}");
        let tokenizer =
            Tokenizer::from_file(path).map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        info!(tokenizer = %path.display(), "loaded tokenizer");
        Ok(Self { tokenizer })
    }
}

impl TextTokenizer for OnnxTokenizer {
    fn encode(&self, text: &str) -> anyhow::Result<Encoding> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        Ok(Encoding {
            input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
            attention_mask: encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect(),
            token_type_ids: encoding.get_type_ids().iter().map(|&t| t as i64).collect(),
        })
    }
}

/// Sequence-classification head exported to ONNX.
pub struct OnnxClassifier {
    // `Session::run` needs exclusive access.
    session: Mutex<Session>,
    labels: Vec<String>,
    score_fn: ScoreFunction,
    uses_token_type_ids: bool,
}

impl OnnxClassifier {
    pub fn load(model_path: &Path, config_path: Option<&Path>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            model_path.exists(),
            "{MODEL_FILE} not found at {model_path:?}"
        );

        let config = match config_path {
            Some(path) if path.exists() => ModelConfig::from_file(path)?,
            _ => ModelConfig::default(),
        };

        let session = Session::builder()?.commit_from_file(model_path)?;

        let uses_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let logits_type = session.outputs().first().map(|output| output.dtype());
        let Some(num_labels) = resolve_num_labels(logits_type, &config) else {
            anyhow::bail!("cannot determine number of labels for {model_path:?}");
        };

        let labels = config.labels(num_labels);
        let score_fn = config.score_fn(num_labels);

        info!(
            model = %model_path.display(),
            num_labels,
            ?labels,
            uses_token_type_ids,
            "loaded classification model"
        );
        Ok(Self {
            session: Mutex::new(session),
            labels,
            score_fn,
            uses_token_type_ids,
        })
    }
}

impl SequenceClassifier for OnnxClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn score_fn(&self) -> ScoreFunction {
        self.score_fn
    }

    fn logits(&self, input: &Encoding) -> anyhow::Result<Vec<f32>> {
        anyhow::ensure!(!input.is_empty(), "tokenizer produced no tokens");

        let shape = [1i64, input.len() as i64];
        let ids_tensor = Tensor::from_array((shape, input.input_ids.clone().into_boxed_slice()))?;
        let mask_tensor =
            Tensor::from_array((shape, input.attention_mask.clone().into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("model session lock poisoned"))?;

        let outputs = if self.uses_token_type_ids {
            let type_tensor =
                Tensor::from_array((shape, input.token_type_ids.clone().into_boxed_slice()))?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])?
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])?
        };

        // Logits: [1, num_labels].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        anyhow::ensure!(
            dims.len() == 2 && dims[0] == 1 && dims[1] as usize == self.labels.len(),
            "unexpected output shape: {dims:?}, expected [1, {}]",
            self.labels.len()
        );

        debug!(tokens = input.len(), "forward pass complete");
        Ok(output_data.to_vec())
    }
}

/// Label count from the logits shape, falling back to `id2label`.
fn resolve_num_labels(
    logits_type: Option<&ort::value::ValueType>,
    config: &ModelConfig,
) -> Option<usize> {
    logits_type
        .and_then(infer_num_labels)
        .or_else(|| (!config.id2label.is_empty()).then_some(config.id2label.len()))
}

fn infer_num_labels(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

/// Loads artifacts from a local directory or the Hugging Face Hub.
#[derive(Debug, Clone)]
pub struct OnnxLoader {
    hub_weights_file: String,
}

impl Default for OnnxLoader {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_WEIGHTS_FILE)
    }
}

impl OnnxLoader {
    pub fn new(hub_weights_file: impl Into<String>) -> Self {
        Self {
            hub_weights_file: hub_weights_file.into(),
        }
    }

    fn hub_file(repo_id: &str, filename: &str) -> anyhow::Result<PathBuf> {
        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| anyhow::anyhow!("initialise Hugging Face API client: {e}"))?;
        let path = api
            .model(repo_id.to_string())
            .get(filename)
            .map_err(|e| anyhow::anyhow!("download {filename} from {repo_id}: {e}"))?;
        debug!(repo = repo_id, file = filename, path = %path.display(), "fetched hub file");
        Ok(path)
    }
}

impl ArtifactLoader for OnnxLoader {
    fn load_tokenizer(&self, source: &ModelSource) -> anyhow::Result<Box<dyn TextTokenizer>> {
        let path = match source {
            ModelSource::Local(dir) => dir.join(TOKENIZER_FILE),
            ModelSource::Hub(repo) => Self::hub_file(repo, TOKENIZER_FILE)?,
        };
        Ok(Box::new(OnnxTokenizer::from_file(&path)?))
    }

    fn load_model(&self, source: &ModelSource) -> anyhow::Result<Box<dyn SequenceClassifier>> {
        let (model_path, config_path) = match source {
            ModelSource::Local(dir) => (dir.join(MODEL_FILE), Some(dir.join(CONFIG_FILE))),
            ModelSource::Hub(repo) => {
                let model = Self::hub_file(repo, &self.hub_weights_file)?;
                // config.json is optional; a missing one falls back to LABEL_<i>.
                let config = Self::hub_file(repo, CONFIG_FILE).ok();
                (model, config)
            }
        };
        Ok(Box::new(OnnxClassifier::load(
            &model_path,
            config_path.as_deref(),
        )?))
    }
}
