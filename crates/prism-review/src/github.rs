use std::time::Duration;

use async_trait::async_trait;
use prism_core::{ChangedFile, ContentLocator, GitHubConfig, PrismError, PullRequest};
use serde::Deserialize;

/// GitHub returns at most 100 files per page and 3000 files per pull request.
const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 30;

/// Source-control host operations the review pipeline depends on.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// List the files changed by `pr`.
    async fn list_files(&self, pr: &PullRequest) -> Result<Vec<ChangedFile>, PrismError>;

    /// Post `body` as a comment on the pull request's conversation thread.
    async fn post_comment(&self, pr: &PullRequest, body: &str) -> Result<(), PrismError>;
}

/// GitHub REST client for listing pull-request files and posting comments.
///
/// Reads use `reqwest` directly so pagination stays explicit; the comment
/// write goes through `octocrab`.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: Option<String>,
    api_url: String,
}

impl GitHubClient {
    /// Create a client from configuration. The token is optional: without
    /// one, reads are unauthenticated and comment posting will be rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PrismError::GitHub`] if a client cannot be built or the API
    /// URL is invalid.
    pub fn new(config: &GitHubConfig, timeout: Duration) -> Result<Self, PrismError> {
        let api_url = config.api_url.trim_end_matches('/').to_string();

        let mut builder = octocrab::Octocrab::builder()
            .base_uri(api_url.as_str())
            .map_err(|e| PrismError::GitHub(format!("invalid API URL '{api_url}': {e}")))?
            .set_connect_timeout(Some(timeout))
            .set_read_timeout(Some(timeout))
            .set_write_timeout(Some(timeout));
        if let Some(token) = &config.token {
            builder = builder.personal_token(token.clone());
        }
        let octocrab = builder
            .build()
            .map_err(|e| PrismError::GitHub(format!("failed to create GitHub client: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PrismError::GitHub(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            octocrab,
            http,
            token: config.token.clone(),
            api_url,
        })
    }

    async fn list_files_page(
        &self,
        pr: &PullRequest,
        page: usize,
    ) -> Result<Vec<PrFileEntry>, PrismError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_url, pr.owner, pr.repo, pr.number
        );

        let mut request = self
            .http
            .get(&url)
            .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "prism");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| PrismError::GitHub(format!("failed to list PR files: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PrismError::GitHub(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PrismError::GitHub(format!("failed to parse PR files: {e}")))
    }
}

#[async_trait]
impl PullRequestHost for GitHubClient {
    async fn list_files(&self, pr: &PullRequest) -> Result<Vec<ChangedFile>, PrismError> {
        let mut files = Vec::new();
        for page in 1..=MAX_PAGES {
            let entries = self.list_files_page(pr, page).await?;
            let last_page = entries.len() < PER_PAGE;
            files.extend(to_changed_files(entries));
            if last_page {
                break;
            }
        }
        Ok(files)
    }

    async fn post_comment(&self, pr: &PullRequest, body: &str) -> Result<(), PrismError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/comments",
            pr.owner, pr.repo, pr.number
        );
        let payload = serde_json::json!({ "body": body });

        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| PrismError::GitHub(format!("failed to post comment: {e}")))?;

        Ok(())
    }
}

/// One entry of the pull-request files listing. Status, patch and counts
/// are ignored: whole-file content is reviewed.
#[derive(Debug, Deserialize)]
struct PrFileEntry {
    filename: Option<String>,
    raw_url: Option<String>,
}

fn to_changed_files(entries: Vec<PrFileEntry>) -> Vec<ChangedFile> {
    entries
        .into_iter()
        .filter_map(|entry| match (entry.filename, entry.raw_url) {
            (Some(filename), Some(raw_url)) if !filename.is_empty() && !raw_url.is_empty() => {
                Some(ChangedFile {
                    filename,
                    locator: ContentLocator::Url(raw_url),
                })
            }
            (filename, _) => {
                tracing::debug!(?filename, "skipping PR file entry without filename or raw URL");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CannedServer;

    fn files_page(start: usize, count: usize) -> String {
        let entries: Vec<_> = (start..start + count)
            .map(|i| {
                serde_json::json!({
                    "filename": format!("src/f{i}.rs"),
                    "raw_url": format!("https://raw.example/f{i}.rs"),
                })
            })
            .collect();
        serde_json::Value::Array(entries).to_string()
    }

    fn client_for(server: &CannedServer) -> GitHubClient {
        let config = GitHubConfig {
            api_url: server.base_url.clone(),
            token: Some("t0k".into()),
            ..GitHubConfig::default()
        };
        GitHubClient::new(&config, Duration::from_secs(5)).unwrap()
    }

    fn pr() -> PullRequest {
        PullRequest {
            owner: "octo".into(),
            repo: "hello".into(),
            number: 7,
        }
    }

    #[test]
    fn entries_map_to_changed_files_in_order() {
        let json = r#"[
            {"filename": "a.py", "raw_url": "https://raw/a.py", "status": "modified", "patch": "@@"},
            {"filename": "b.py", "raw_url": "https://raw/b.py", "additions": 3}
        ]"#;
        let entries: Vec<PrFileEntry> = serde_json::from_str(json).unwrap();
        let files = to_changed_files(entries);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "a.py");
        assert_eq!(files[0].locator, ContentLocator::Url("https://raw/a.py".into()));
        assert_eq!(files[1].filename, "b.py");
    }

    #[test]
    fn entries_missing_fields_are_skipped() {
        let json = r#"[
            {"filename": "a.py"},
            {"raw_url": "https://raw/b.py"},
            {"filename": "", "raw_url": "https://raw/c.py"},
            {"filename": "d.py", "raw_url": null},
            {"filename": "e.py", "raw_url": "https://raw/e.py"}
        ]"#;
        let entries: Vec<PrFileEntry> = serde_json::from_str(json).unwrap();
        let files = to_changed_files(entries);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "e.py");
    }

    #[tokio::test]
    async fn client_builds_without_token() {
        let client = GitHubClient::new(&GitHubConfig::default(), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn api_url_trailing_slash_is_trimmed() {
        let config = GitHubConfig {
            api_url: "https://ghe.example.com/api/v3/".into(),
            ..GitHubConfig::default()
        };
        let client = GitHubClient::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(client.api_url, "https://ghe.example.com/api/v3");
    }

    #[tokio::test]
    async fn listing_stops_after_short_page() {
        let server = CannedServer::start(vec![
            (200, files_page(0, 100)),
            (200, files_page(100, 3)),
        ])
        .await;

        let files = client_for(&server).list_files(&pr()).await.unwrap();
        assert_eq!(files.len(), 103);
        assert_eq!(files[0].filename, "src/f0.rs");
        assert_eq!(files[102].filename, "src/f102.rs");

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("GET /repos/octo/hello/pulls/7/files?"));
        assert!(requests[0].contains("per_page=100&page=1 "));
        assert!(requests[1].contains("per_page=100&page=2 "));
    }

    #[tokio::test]
    async fn listing_is_capped_at_max_pages() {
        let pages = (0..=MAX_PAGES)
            .map(|p| (200, files_page(p * PER_PAGE, PER_PAGE)))
            .collect();
        let server = CannedServer::start(pages).await;

        let files = client_for(&server).list_files(&pr()).await.unwrap();
        assert_eq!(files.len(), MAX_PAGES * PER_PAGE);
        assert_eq!(server.requests().len(), MAX_PAGES);
    }

    #[tokio::test]
    async fn error_on_later_page_fails_listing() {
        let server = CannedServer::start(vec![
            (200, files_page(0, 100)),
            (500, r#"{"message":"boom"}"#.into()),
        ])
        .await;

        let err = client_for(&server).list_files(&pr()).await.unwrap_err();
        match err {
            PrismError::GitHub(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("boom"));
            }
            other => panic!("expected GitHub error, got {other:?}"),
        }
    }
}
