//! Inference service: one request in, one [`PredictionResponse`] out.
//!
//! Holds the [`ModelHandle`] resolved at startup for the life of the process.
//! The handle is injected, so tests substitute a fake one.

use std::sync::Arc;
use std::time::Duration;

use spamscan_ai::{ModelHandle, SpamLabels};
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::models::{PredictionDetails, PredictionResponse};

pub struct InferenceService {
    handle: ModelHandle,
    spam_index: usize,
    spam_label: String,
    timeout: Option<Duration>,
    model_source: String,
}

impl InferenceService {
    /// Fails when the configured spam label names no class of the model.
    pub fn new(
        handle: ModelHandle,
        spam_labels: &SpamLabels,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let spam_index = spam_labels.resolve_index(handle.model_source(), handle.labels())?;
        let spam_label = handle.labels()[spam_index].clone();
        let model_source = handle.describe();
        info!(%spam_label, spam_index, "spam class resolved");
        Ok(Self {
            handle,
            spam_index,
            spam_label,
            timeout,
            model_source,
        })
    }

    pub fn model_source(&self) -> &str {
        &self.model_source
    }

    /// Name of the model class treated as spam.
    pub fn spam_label(&self) -> &str {
        &self.spam_label
    }

    /// Classify `content`, rejecting whitespace-only input before the model runs.
    pub fn classify(&self, content: &str) -> Result<PredictionResponse, ApiError> {
        if content.trim().is_empty() {
            return Err(ApiError::InvalidInput);
        }

        let result = self.handle.classify(content).map_err(|e| {
            let chain = format!("{e:#}");
            error!(error = %chain, "forward pass failed");
            ApiError::InferenceFailure(e.to_string())
        })?;

        let is_spam = result.index == self.spam_index;
        let content_length = content.chars().count();
        debug!(
            label = %result.label,
            score = result.score,
            is_spam,
            content_length,
            "classified"
        );

        Ok(PredictionResponse {
            is_spam,
            confidence: result.score,
            details: PredictionDetails {
                raw_label: result.label,
                raw_score: result.score,
                model_source: self.model_source.clone(),
                content_length,
            },
        })
    }

    /// Run [`classify`](Self::classify) on the blocking pool, bounded by the
    /// configured timeout if any.
    pub async fn classify_async(
        self: &Arc<Self>,
        content: String,
    ) -> Result<PredictionResponse, ApiError> {
        let service = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || service.classify(&content));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    // The blocking task cannot be cancelled; it finishes in the background.
                    warn!(timeout_secs = limit.as_secs_f64(), "prediction timed out");
                    return Err(ApiError::InferenceTimeout(limit));
                }
            },
            None => task.await,
        };

        joined.map_err(|e| {
            error!(error = %e, "prediction task failed");
            ApiError::InferenceFailure(e.to_string())
        })?
    }
}
