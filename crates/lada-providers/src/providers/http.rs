//! HTTP transport shared by the daemon-protocol clients

use std::time::{Duration, Instant};

use lada_config::EngineName;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, error};

use crate::{
    error::{LlmError, Result},
    models::{GenerationConfig, LlmResponse, ResponseMetadata},
    wire::{ErrorBody, GenerateRequest, GenerateResponse, TagsResponse},
};

/// Upper bound for liveness probes, independent of the generation timeout
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection to one daemon-protocol endpoint
#[derive(Debug, Clone)]
pub(crate) struct DaemonTransport {
    engine: EngineName,
    host: String,
    timeout_secs: u64,
    client: Client,
}

impl DaemonTransport {
    pub(crate) fn new(engine: EngineName, host: &str, timeout_secs: u64) -> Result<Self> {
        if host.trim().is_empty() {
            return Err(LlmError::Configuration {
                key: Some(format!("model.engines.{}.host", engine)),
                message: format!("{} host is required", engine),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| LlmError::Configuration {
                key: None,
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            engine,
            host: host.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    pub(crate) fn engine(&self) -> EngineName {
        self.engine
    }

    pub(crate) fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    /// GET `path` and report whether it answered with a success status
    pub(crate) async fn probe(&self, path: &str) -> bool {
        let timeout = PROBE_TIMEOUT.min(Duration::from_secs(self.timeout_secs));
        match self.client.get(self.url(path)).timeout(timeout).send().await {
            Ok(response) => {
                let ok = response.status().is_success();
                debug!("{} probe {} -> {}", self.engine, path, response.status());
                ok
            }
            Err(e) => {
                debug!("{} is not reachable at {}: {}", self.engine, self.host, e);
                false
            }
        }
    }

    pub(crate) async fn tags(&self) -> Result<TagsResponse> {
        debug!("Listing models from {} at {}", self.engine, self.host);
        let response = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let response = self.check_status(response, None).await?;
        response
            .json::<TagsResponse>()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse model list: {}", e)))
    }

    /// Model names from `/api/tags`
    pub(crate) async fn model_names(&self) -> Result<Vec<String>> {
        Ok(self
            .tags()
            .await?
            .models
            .into_iter()
            .map(|tag| tag.name)
            .collect())
    }

    /// One non-streaming `/api/generate` round trip
    pub(crate) async fn generate(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<LlmResponse> {
        let request = GenerateRequest {
            options: Some(config.to_options()),
            ..GenerateRequest::new(model, prompt)
        };

        debug!(
            "Sending generate request to {} for model: {}",
            self.engine, model
        );
        let started = Instant::now();
        let response = self
            .client
            .post(self.url("/api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("{} generate request failed: {}", self.engine, e);
                self.transport_error(e)
            })?;
        let response = self.check_status(response, Some(model)).await?;
        let reply: GenerateResponse = response.json().await.map_err(|e| {
            error!("Failed to parse {} response: {}", self.engine, e);
            LlmError::Response(format!("Failed to parse {} response: {}", self.engine, e))
        })?;
        let elapsed = started.elapsed().as_secs_f64();

        if reply.response.trim().is_empty() {
            return Err(LlmError::Response(format!(
                "{} returned an empty response for model '{}'",
                self.engine, model
            )));
        }

        let generation_time_secs = if reply.total_duration > 0 {
            reply.total_duration as f64 / 1e9
        } else {
            elapsed
        };
        Ok(LlmResponse {
            content: reply.response,
            metadata: ResponseMetadata {
                prompt_tokens: reply.prompt_eval_count,
                completion_tokens: reply.eval_count,
                total_tokens: reply.prompt_eval_count + reply.eval_count,
                generation_time_secs,
                model_name: if reply.model.is_empty() {
                    model.to_string()
                } else {
                    reply.model
                },
            },
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                engine: self.engine,
                timeout_secs: self.timeout_secs,
            }
        } else {
            LlmError::Connection {
                engine: self.engine,
                host: self.host.clone(),
                message: err.to_string(),
            }
        }
    }

    async fn check_status(&self, response: Response, model: Option<&str>) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        error!("{} API error ({}): {}", self.engine, status, message);

        if status == StatusCode::NOT_FOUND {
            if let Some(model) = model {
                return Err(LlmError::ModelNotFound {
                    engine: self.engine,
                    model: model.to_string(),
                    available: Vec::new(),
                    suggestions: Vec::new(),
                });
            }
        }
        if message.to_lowercase().contains("context") {
            return Err(LlmError::ContextLengthExceeded(message));
        }
        if status.is_server_error() {
            return Err(LlmError::Engine {
                engine: self.engine,
                message,
                details: Some(format!("HTTP {}", status)),
            });
        }
        Err(LlmError::Response(format!("HTTP {}: {}", status, message)))
    }
}
