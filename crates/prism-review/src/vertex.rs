use std::time::Duration;

use async_trait::async_trait;
use prism_core::{PrismError, ReviewError, VertexConfig};
use serde_json::Value;

use crate::prompt;

/// Finish reasons that mean the model withheld its answer.
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Generative review of a single file.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Model identifier, for logs and run reports.
    fn model(&self) -> &str;

    /// Review `content` of `filename` and return free-text feedback.
    async fn review(&self, filename: &str, content: &str) -> Result<String, ReviewError>;
}

/// Vertex AI `generateContent` client for Gemini publisher models.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use prism_core::VertexConfig;
/// use prism_review::vertex::VertexClient;
///
/// let config = VertexConfig {
///     project: Some("my-project".into()),
///     ..VertexConfig::default()
/// };
/// let client = VertexClient::new(&config, Duration::from_secs(30)).unwrap();
/// assert!(client.endpoint_url().unwrap().starts_with("https://us-central1-aiplatform"));
/// ```
pub struct VertexClient {
    client: reqwest::Client,
    config: VertexConfig,
    access_token: Option<String>,
}

impl VertexClient {
    /// Create a client from configuration, using `config.access_token` as the
    /// bearer credential.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &VertexConfig, timeout: Duration) -> Result<Self, PrismError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PrismError::Config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
            access_token: config.access_token.clone(),
        })
    }

    /// Replace the bearer credential.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token;
        self
    }

    /// Full `generateContent` URL for the configured project, location and model.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotConfigured`] when no project is set.
    pub fn endpoint_url(&self) -> Result<String, ReviewError> {
        let project = self
            .config
            .project
            .as_deref()
            .ok_or_else(|| ReviewError::NotConfigured("GCP project is not set".into()))?;
        let location = &self.config.location;
        let base = match &self.config.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None if location == "global" => "https://aiplatform.googleapis.com".to_string(),
            None => format!("https://{location}-aiplatform.googleapis.com"),
        };
        Ok(format!(
            "{base}/v1/projects/{project}/locations/{location}/publishers/google/models/{}:generateContent",
            self.config.model
        ))
    }

    /// Send a single-turn prompt and return the model's text.
    ///
    /// # Errors
    ///
    /// Returns a [`ReviewError`] describing which stage failed.
    pub async fn generate(&self, prompt: &str) -> Result<String, ReviewError> {
        let url = self.endpoint_url()?;
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| ReviewError::Auth("no Vertex AI access token available".into()))?;

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReviewError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(ReviewError::Auth(body_text));
            }
            return Err(ReviewError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| ReviewError::Malformed(format!("failed to parse response: {e}")))?;

        extract_text(&response_body)
    }
}

#[async_trait]
impl Reviewer for VertexClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn review(&self, filename: &str, content: &str) -> Result<String, ReviewError> {
        self.generate(&prompt::build_review_prompt(filename, content))
            .await
    }
}

/// Pull the answer text out of a `generateContent` response body.
///
/// # Errors
///
/// Returns [`ReviewError::Blocked`] when the prompt or candidate was blocked
/// and [`ReviewError::Malformed`] when no text can be found.
pub fn extract_text(body: &Value) -> Result<String, ReviewError> {
    if let Some(reason) = body
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Err(ReviewError::Blocked(reason.to_string()));
    }

    let candidate = body
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ReviewError::Malformed(format!("no candidates in response: {body}")))?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    match candidate.get("finishReason").and_then(Value::as_str) {
        Some(reason) if BLOCKING_FINISH_REASONS.contains(&reason) => {
            Err(ReviewError::Blocked(reason.to_string()))
        }
        _ => Err(ReviewError::Malformed(format!(
            "candidate has no text: {candidate}"
        ))),
    }
}

/// Ask the local `gcloud` CLI for an access token.
///
/// Returns `None` if `gcloud` is missing, fails, or prints nothing.
pub fn gcloud_access_token() -> Option<String> {
    let output = std::process::Command::new("gcloud")
        .args(["auth", "print-access-token"])
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::debug!(
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "gcloud auth print-access-token failed"
        );
        return None;
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!token.is_empty()).then_some(token)
}
