/// Errors that can occur across the prism crates.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary renders it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use prism_core::PrismError;
///
/// let err = PrismError::Config("missing repository".into());
/// assert!(err.to_string().contains("missing repository"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PrismError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check .prism.toml and the GITHUB_*/GCP_* environment variables"))]
    Config(String),

    /// GitHub API failure (listing files or posting a comment).
    #[error("GitHub error: {0}")]
    GitHub(String),

    /// Raw file content could not be retrieved.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failure of a single generative-model review call.
///
/// A review failure never aborts a run; the orchestrator turns it into
/// placeholder review text.
///
/// # Examples
///
/// ```
/// use prism_core::ReviewError;
///
/// let err = ReviewError::Api { status: 429, body: "quota exceeded".into() };
/// assert_eq!(err.to_string(), "Vertex AI API error 429: quota exceeded");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewError {
    /// Required model settings (project, location) are missing.
    #[error("model not configured: {0}")]
    NotConfigured(String),

    /// No usable access token for the model endpoint.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network-level failure: connect, timeout, body read.
    #[error("request failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("Vertex AI API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The model declined to answer (prompt blocked or safety stop).
    #[error("model declined to respond: {0}")]
    Blocked(String),

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Malformed(String),
}
