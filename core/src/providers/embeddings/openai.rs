use crate::embeddings::model::{EmbeddingModel, ModelError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

const URL_ENV_VAR: &str = "EMBEDDING_SERVICE_URL";
const MODEL_ENV_VAR: &str = "EMBEDDING_MODEL_NAME";
const TIMEOUT_ENV_VAR: &str = "EMBEDDING_TIMEOUT";
const DEFAULT_URL: &str = "http://127.0.0.1:7000";
const DEFAULT_MODEL: &str = "bge-large-zh-v1.5";
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const EMBEDDINGS_PATH: &str = "/v1/embeddings";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to deserialize json config: {0}")]
    InvalidJson(String),
    #[error("Invalid timeout `{0}`, expected a positive number of seconds")]
    InvalidTimeout(String),
    #[error("Failed to fetch env var `{0}`")]
    MissingApiKey(String),
    #[error("Failed to build http client: {0}")]
    Client(String),
}

#[derive(Serialize, Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ModelConfig {
    api_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    api_key_var: Option<String>,
}

/// Resolved settings for an OpenAI-compatible embedding endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Full URL of the embeddings endpoint
    pub api_url: String,
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl EmbeddingConfig {
    /// Resolve the configuration from an optional JSON config string, falling
    /// back to the `EMBEDDING_*` environment variables and then to defaults.
    ///
    /// # Example
    /// ```json
    /// {
    ///     "api_url": "http://10.0.0.5:7000",
    ///     "model": "bge-large-zh-v1.5",
    ///     "timeout_secs": 60,
    ///     "api_key_var": "EMBEDDING_API_KEY"
    /// }
    /// ```
    ///
    /// # Errors
    /// Fails on malformed or unknown JSON fields, an unparsable or zero
    /// timeout, or an `api_key_var` naming an unset variable.
    pub fn resolve(json_config: Option<&str>) -> Result<Self, ConfigError> {
        Self::resolve_with(json_config, |name| std::env::var(name).ok())
    }

    fn resolve_with(
        json_config: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let config = match json_config {
            Some(json) => serde_json::from_str::<ModelConfig>(json)
                .map_err(|e| ConfigError::InvalidJson(e.to_string()))?,
            None => ModelConfig::default(),
        };

        let api_url = config
            .api_url
            .or_else(|| env(URL_ENV_VAR))
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let model = config
            .model
            .or_else(|| env(MODEL_ENV_VAR))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = match (config.timeout_secs, env(TIMEOUT_ENV_VAR)) {
            (Some(secs), _) => secs,
            (None, Some(raw)) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?,
            (None, None) => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(timeout_secs.to_string()));
        }

        let api_key = match config.api_key_var {
            Some(var) => Some(env(&var).ok_or(ConfigError::MissingApiKey(var))?),
            None => None,
        };

        Ok(Self {
            api_url: endpoint_url(&api_url),
            model,
            timeout: Duration::from_secs(timeout_secs),
            api_key,
        })
    }
}

/// Accept either the full endpoint or the service base URL
fn endpoint_url(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    if trimmed.ends_with("/embeddings") {
        trimmed.to_string()
    } else {
        format!("{trimmed}{EMBEDDINGS_PATH}")
    }
}

#[derive(Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f64>,
    #[serde(default)]
    index: Option<usize>,
}

impl OpenAIEmbeddingResponse {
    /// Vectors in request order. Items are put back in `index` order when the
    /// provider numbers them, which must then be exactly `0..len`.
    fn into_vectors(self) -> Result<Vec<Vec<f64>>, ModelError> {
        let mut data = self.data;
        if data.iter().all(|d| d.index.is_some()) {
            data.sort_by_key(|d| d.index);
            let sequential = data
                .iter()
                .enumerate()
                .all(|(i, d)| d.index == Some(i));
            if !sequential {
                return Err(ModelError::ParseError(
                    "embedding indices are not a permutation of the request".to_string(),
                ));
            }
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Client for an OpenAI-compatible `/v1/embeddings` endpoint, such as a
/// self-hosted BGE server.
///
/// Every call to [`EmbeddingModel::embed`] is one POST of the whole batch:
/// `{"input": [...], "model": "..."}`, answered by `{"data": [{"embedding": [...]}, ...]}`.
/// Requests are not retried.
pub struct OpenAIEmbeddingModel {
    api_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAIEmbeddingModel {
    /// Creates a new `OpenAIEmbeddingModel` from an optional JSON configuration string,
    /// see [`EmbeddingConfig::resolve`].
    ///
    /// # Errors
    /// Fails when the configuration can't be resolved.
    #[instrument]
    pub fn new(json_config: Option<&str>) -> Result<Self, ConfigError> {
        let config = EmbeddingConfig::resolve(json_config).map_err(|e| {
            error!(%e, "invalid embedding config");
            e
        })?;
        Self::from_config(config)
    }

    /// # Errors
    /// Fails when the underlying http client can't be built.
    pub fn from_config(config: EmbeddingConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        debug!(api_url = %config.api_url, model = %config.model, "embedding model ready");
        Ok(Self {
            api_url: config.api_url,
            api_key: config.api_key,
            model: config.model,
            timeout: config.timeout,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn map_request_error(&self, e: &reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::Timeout(self.timeout)
        } else {
            ModelError::RequestError(e.to_string())
        }
    }
}

#[async_trait]
impl EmbeddingModel for OpenAIEmbeddingModel {
    #[instrument(skip_all, fields(model = %self.model, count = texts.len()))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ModelError> {
        let request_body = OpenAIEmbeddingRequest {
            input: texts,
            model: &self.model,
        };
        let mut request = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .json(&request_body);
        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_request_error(&e))?;

        if response.status().is_success() {
            let response = response
                .json::<OpenAIEmbeddingResponse>()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        ModelError::Timeout(self.timeout)
                    } else {
                        ModelError::ParseError(e.to_string())
                    }
                })?;
            let vectors = response.into_vectors()?;
            debug!(returned = vectors.len(), "embedding response received");
            Ok(vectors)
        } else {
            let status = response.status().as_u16();
            let error_message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status, %error_message, "embedding provider error");

            Err(ModelError::ProviderError(status, error_message))
        }
    }
}
