use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use spamscan_ai::SpamLabels;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Spam email classification API server", long_about = None)]
pub struct Args {
    /// Directory holding the bundled `tokenizer.json`, `model.onnx` and `config.json`.
    #[arg(long, env = "SPAMSCAN_MODEL_DIR", default_value = "saved-model")]
    pub model_dir: PathBuf,

    /// Hugging Face Hub repository used when local artifacts cannot be loaded.
    #[arg(
        long,
        env = "SPAMSCAN_FALLBACK_MODEL",
        default_value = "distilbert-base-uncased"
    )]
    pub fallback_model: String,

    /// Path of the ONNX weights inside the fallback repository.
    #[arg(
        long,
        env = "SPAMSCAN_HUB_WEIGHTS_FILE",
        default_value = spamscan_ai::DEFAULT_HUB_WEIGHTS_FILE
    )]
    pub hub_weights_file: String,

    /// Spam class when the model comes from `--model-dir`: an `id2label`
    /// name or the `LABEL_<i>` class index.
    #[arg(
        long,
        env = "SPAMSCAN_LOCAL_SPAM_LABEL",
        default_value = spamscan_ai::DEFAULT_SPAM_LABEL
    )]
    pub local_spam_label: String,

    /// Label that means spam when the model comes from the hub.
    #[arg(
        long,
        env = "SPAMSCAN_HUB_SPAM_LABEL",
        default_value = spamscan_ai::DEFAULT_SPAM_LABEL
    )]
    pub hub_spam_label: String,

    /// Fail a prediction that runs longer than this many seconds.
    #[arg(long, env = "SPAMSCAN_INFERENCE_TIMEOUT_SECS")]
    pub inference_timeout_secs: Option<u64>,

    #[arg(long, env = "SPAMSCAN_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "SPAMSCAN_PORT", default_value_t = 8001)]
    pub port: u16,
}

impl Args {
    pub fn spam_labels(&self) -> SpamLabels {
        SpamLabels {
            local: self.local_spam_label.clone(),
            hub: self.hub_spam_label.clone(),
        }
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout_secs.map(Duration::from_secs)
    }
}
