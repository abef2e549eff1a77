use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PrismError;

/// Where the content of a changed file can be read from.
///
/// # Examples
///
/// ```
/// use prism_core::ContentLocator;
///
/// let loc = ContentLocator::Url("https://raw.example.com/a.py".into());
/// assert_eq!(loc.to_string(), "https://raw.example.com/a.py");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentLocator {
    /// Raw content URL, fetched without authentication.
    Url(String),
    /// Local file, used by the debug fixture.
    Path(PathBuf),
}

impl fmt::Display for ContentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentLocator::Url(url) => write!(f, "{url}"),
            ContentLocator::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A file changed by the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Repository-relative path.
    pub filename: String,
    /// Where to read the file's content.
    pub locator: ContentLocator,
}

/// Review text produced for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    /// Repository-relative path of the reviewed file.
    pub filename: String,
    /// Model feedback, or a placeholder when the model call failed.
    pub review: String,
}

/// A fully identified pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl fmt::Display for PullRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Pull-request coordinates resolved once at startup.
///
/// Any missing field puts the run in debug mode: a local fixture is reviewed
/// and the comment is printed instead of posted.
///
/// # Examples
///
/// ```
/// use prism_core::RunContext;
///
/// let ctx = RunContext::resolve(Some("octocat/hello-world"), Some(42)).unwrap();
/// assert_eq!(ctx.pull_request().unwrap().to_string(), "octocat/hello-world#42");
///
/// let debug = RunContext::resolve(Some("octocat/hello-world"), None).unwrap();
/// assert!(debug.pull_request().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunContext {
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub pr_number: Option<u64>,
}

impl RunContext {
    /// Build a context from an optional `owner/repo` coordinate and PR number.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::Config`] if `repository` is present but not in
    /// `owner/repo` form.
    pub fn resolve(repository: Option<&str>, pr_number: Option<u64>) -> Result<Self, PrismError> {
        let (owner, repo) = match repository {
            Some(coord) => {
                let (owner, repo) = parse_repository(coord)?;
                (Some(owner), Some(repo))
            }
            None => (None, None),
        };
        Ok(Self {
            owner,
            repo,
            pr_number,
        })
    }

    /// The live pull request, or `None` in debug mode.
    pub fn pull_request(&self) -> Option<PullRequest> {
        match (&self.owner, &self.repo, self.pr_number) {
            (Some(owner), Some(repo), Some(number)) => Some(PullRequest {
                owner: owner.clone(),
                repo: repo.clone(),
                number,
            }),
            _ => None,
        }
    }

    /// `true` when no live pull request is available.
    pub fn is_debug(&self) -> bool {
        self.pull_request().is_none()
    }
}

/// Parse an `owner/repo` coordinate.
///
/// # Errors
///
/// Returns [`PrismError::Config`] if the format is invalid.
///
/// # Examples
///
/// ```
/// use prism_core::parse_repository;
///
/// let (owner, repo) = parse_repository("rust-lang/rust").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(repo, "rust");
/// assert!(parse_repository("rust").is_err());
/// ```
pub fn parse_repository(coord: &str) -> Result<(String, String), PrismError> {
    let invalid = || {
        PrismError::Config(format!(
            "invalid repository '{coord}', expected owner/repo"
        ))
    };
    let (owner, repo) = coord.trim().split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}
