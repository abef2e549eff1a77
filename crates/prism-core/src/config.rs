use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PrismError;
use crate::types::RunContext;

/// Top-level configuration loaded from `.prism.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
/// Environment variables are applied once through [`PrismConfig::apply_env`]
/// and the result is validated once through [`PrismConfig::validate`].
///
/// # Examples
///
/// ```
/// use prism_core::PrismConfig;
///
/// let config = PrismConfig::default();
/// assert_eq!(config.vertex.location, "us-central1");
/// assert_eq!(config.review.max_file_chars, 25_000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrismConfig {
    /// Generative model settings.
    #[serde(default)]
    pub vertex: VertexConfig,
    /// Source-control host settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Review behavior settings.
    #[serde(default)]
    pub review: ReviewConfig,
}

impl PrismConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::Io`] if the file cannot be read, or
    /// [`PrismError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prism_core::PrismConfig;
    /// use std::path::Path;
    ///
    /// let config = PrismConfig::from_file(Path::new(".prism.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PrismError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use prism_core::PrismConfig;
    ///
    /// let toml = r#"
    /// [vertex]
    /// model = "gemini-2.5-pro"
    /// "#;
    /// let config = PrismConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.vertex.model, "gemini-2.5-pro");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PrismError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Override settings from environment-style variables.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`; tests pass a map.
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::Config`] if `PR_NUMBER` is not a positive integer.
    ///
    /// # Examples
    ///
    /// ```
    /// use prism_core::PrismConfig;
    ///
    /// let mut config = PrismConfig::default();
    /// config
    ///     .apply_env(|key| match key {
    ///         "GITHUB_REPOSITORY" => Some("octocat/hello-world".into()),
    ///         "PR_NUMBER" => Some("42".into()),
    ///         _ => None,
    ///     })
    ///     .unwrap();
    /// assert_eq!(config.github.pr_number, Some(42));
    /// ```
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), PrismError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GCP_PROJECT_ID") {
            self.vertex.project = Some(v);
        }
        if let Some(v) = get("GCP_LOCATION") {
            self.vertex.location = v;
        }
        if let Some(v) = get("GCP_MODEL") {
            self.vertex.model = v;
        }
        if let Some(v) = get("VERTEX_ACCESS_TOKEN") {
            self.vertex.access_token = Some(v);
        }
        if let Some(v) = get("GITHUB_REPOSITORY") {
            self.github.repository = Some(v);
        }
        if let Some(v) = get("PR_NUMBER") {
            self.github.pr_number = Some(parse_pr_number(&v)?);
        }
        if let Some(v) = get("GITHUB_TOKEN").or_else(|| get("GH_TOKEN")) {
            self.github.token = Some(v);
        }
        if let Some(v) = get("GITHUB_API_URL") {
            self.github.api_url = v;
        }
        Ok(())
    }

    /// Check the merged configuration once, before any network call.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::Config`] describing the first invalid setting.
    pub fn validate(&self) -> Result<(), PrismError> {
        if self.vertex.location.trim().is_empty() {
            return Err(PrismError::Config("vertex.location must not be empty".into()));
        }
        if self.vertex.model.trim().is_empty() {
            return Err(PrismError::Config("vertex.model must not be empty".into()));
        }
        if self.review.max_file_chars == 0 {
            return Err(PrismError::Config(
                "review.max_file_chars must be greater than 0".into(),
            ));
        }
        if self.review.timeout_secs == 0 {
            return Err(PrismError::Config(
                "review.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.github.pr_number == Some(0) {
            return Err(PrismError::Config("pull request number must be positive".into()));
        }
        self.run_context().map(|_| ())
    }

    /// Resolve the pull-request context from the GitHub settings.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::Config`] if the repository coordinate is malformed.
    pub fn run_context(&self) -> Result<RunContext, PrismError> {
        RunContext::resolve(self.github.repository.as_deref(), self.github.pr_number)
    }
}

/// Parse a pull-request number from text.
///
/// # Errors
///
/// Returns [`PrismError::Config`] on anything but a positive integer.
///
/// # Examples
///
/// ```
/// use prism_core::parse_pr_number;
///
/// assert_eq!(parse_pr_number("17").unwrap(), 17);
/// assert!(parse_pr_number("abc").is_err());
/// ```
pub fn parse_pr_number(value: &str) -> Result<u64, PrismError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(PrismError::Config(format!("invalid PR number: {value}"))),
    }
}

/// Vertex AI generative model configuration.
///
/// # Examples
///
/// ```
/// use prism_core::VertexConfig;
///
/// let config = VertexConfig::default();
/// assert_eq!(config.model, "gemini-2.5-flash");
/// assert!(config.project.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexConfig {
    /// Google Cloud project identifier.
    pub project: Option<String>,
    /// Vertex AI region (default: `"us-central1"`).
    #[serde(default = "default_location")]
    pub location: String,
    /// Publisher model name (default: `"gemini-2.5-flash"`).
    #[serde(default = "default_model")]
    pub model: String,
    /// OAuth access token. When unset, `gcloud` is asked for one.
    pub access_token: Option<String>,
    /// Custom base URL for API requests.
    pub endpoint: Option<String>,
}

fn default_location() -> String {
    "us-central1".into()
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}

impl Default for VertexConfig {
    fn default() -> Self {
        Self {
            project: None,
            location: default_location(),
            model: default_model(),
            access_token: None,
            endpoint: None,
        }
    }
}

/// GitHub configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Repository coordinate in `owner/repo` form.
    pub repository: Option<String>,
    /// Pull request number.
    pub pr_number: Option<u64>,
    /// Access token, sent as a bearer credential.
    pub token: Option<String>,
    /// REST API base URL (default: `"https://api.github.com"`).
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repository: None,
            pr_number: None,
            token: None,
            api_url: default_api_url(),
        }
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use prism_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.max_file_chars, 25_000);
/// assert_eq!(config.timeout_secs, 60);
/// assert!(config.fallback_output.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Characters of file content sent to the model before truncation (default: 25000).
    #[serde(default = "default_max_file_chars")]
    pub max_file_chars: usize,
    /// Timeout applied to every outbound request, in seconds (default: 60).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Local file reviewed in debug mode.
    #[serde(default = "default_debug_fixture")]
    pub debug_fixture: PathBuf,
    /// Where to write the comment body if posting it fails.
    pub fallback_output: Option<PathBuf>,
}

impl ReviewConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_max_file_chars() -> usize {
    25_000
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_debug_fixture() -> PathBuf {
    PathBuf::from("fixtures/debug_review.py")
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_file_chars: default_max_file_chars(),
            timeout_secs: default_timeout_secs(),
            debug_fixture: default_debug_fixture(),
            fallback_output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = PrismConfig::default();
        assert!(config.vertex.project.is_none());
        assert_eq!(config.vertex.location, "us-central1");
        assert_eq!(config.vertex.model, "gemini-2.5-flash");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.github.repository.is_none());
        assert_eq!(config.review.max_file_chars, 25_000);
        assert_eq!(config.review.timeout(), Duration::from_secs(60));
        assert_eq!(
            config.review.debug_fixture,
            PathBuf::from("fixtures/debug_review.py")
        );
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[vertex]
project = "my-project"
location = "europe-west4"
model = "gemini-2.5-pro"

[github]
repository = "octocat/hello-world"
pr_number = 12

[review]
max_file_chars = 1000
timeout_secs = 5
fallback_output = "review-comment.md"
"#;
        let config = PrismConfig::from_toml(toml).unwrap();
        assert_eq!(config.vertex.project.as_deref(), Some("my-project"));
        assert_eq!(config.vertex.location, "europe-west4");
        assert_eq!(config.github.pr_number, Some(12));
        assert_eq!(config.review.max_file_chars, 1000);
        assert_eq!(
            config.review.fallback_output,
            Some(PathBuf::from("review-comment.md"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PrismConfig::from_toml("").unwrap();
        assert_eq!(config.vertex.model, "gemini-2.5-flash");
        assert_eq!(config.review.timeout_secs, 60);
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(PrismConfig::from_toml("{{invalid}}").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = PrismConfig::from_toml("[vertex]\nmodel = \"from-file\"").unwrap();
        config
            .apply_env(env(&[
                ("GCP_PROJECT_ID", "proj"),
                ("GCP_MODEL", "from-env"),
                ("GITHUB_REPOSITORY", "o/r"),
                ("PR_NUMBER", "9"),
                ("GITHUB_TOKEN", "ghp_x"),
            ]))
            .unwrap();
        assert_eq!(config.vertex.project.as_deref(), Some("proj"));
        assert_eq!(config.vertex.model, "from-env");
        assert_eq!(config.vertex.location, "us-central1");
        assert_eq!(config.github.token.as_deref(), Some("ghp_x"));
        let ctx = config.run_context().unwrap();
        assert_eq!(ctx.pull_request().unwrap().number, 9);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = PrismConfig::default();
        config
            .apply_env(env(&[("PR_NUMBER", ""), ("GCP_LOCATION", "  ")]))
            .unwrap();
        assert!(config.github.pr_number.is_none());
        assert_eq!(config.vertex.location, "us-central1");
    }

    #[test]
    fn gh_token_is_a_fallback() {
        let mut config = PrismConfig::default();
        config.apply_env(env(&[("GH_TOKEN", "gho_y")])).unwrap();
        assert_eq!(config.github.token.as_deref(), Some("gho_y"));
    }

    #[test]
    fn non_numeric_pr_number_is_rejected() {
        let mut config = PrismConfig::default();
        let err = config.apply_env(env(&[("PR_NUMBER", "abc")])).unwrap_err();
        assert!(err.to_string().contains("invalid PR number"));
    }

    #[test]
    fn validate_rejects_malformed_repository() {
        let mut config = PrismConfig::default();
        config.github.repository = Some("just-a-name".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = PrismConfig::default();
        config.review.max_file_chars = 0;
        assert!(config.validate().is_err());

        let mut config = PrismConfig::default();
        config.review.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
