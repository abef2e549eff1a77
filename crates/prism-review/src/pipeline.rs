use std::fmt;
use std::path::PathBuf;

use prism_core::{ChangedFile, ContentLocator, ReviewConfig, ReviewResult, RunContext};
use serde::Serialize;

use crate::comment;
use crate::fetch::{truncate_content, ContentFetcher};
use crate::github::PullRequestHost;
use crate::vertex::Reviewer;

/// Whether the run targets a live pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Live,
    Debug,
}

/// Why a changed file produced no review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum SkipReason {
    /// Content could not be retrieved.
    FetchFailed(String),
    /// Content was retrieved and is empty.
    Empty,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            SkipReason::Empty => write!(f, "empty file"),
        }
    }
}

/// A changed file that was not reviewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: SkipReason,
}

/// What happened to the aggregated comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PublishOutcome {
    /// Posted to the pull request.
    Posted,
    /// No pull request context (debug mode); the caller prints `body`.
    Printed { body: String },
    /// Posting failed; the body may have been saved to `fallback`.
    Failed {
        error: String,
        fallback: Option<PathBuf>,
    },
    /// No file produced a review, so nothing was published.
    NothingToPublish,
}

/// Outcome of reviewing one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Review text was produced. `model_failed` marks placeholder text.
    Reviewed {
        result: ReviewResult,
        model_failed: bool,
    },
    Skipped(SkippedFile),
}

/// Summary of a review run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub mode: RunMode,
    /// Model identifier used for the reviews.
    pub model: String,
    /// Changed files returned by the lister.
    pub files_listed: usize,
    /// Per-file reviews, in listing order.
    pub reviews: Vec<ReviewResult>,
    pub skipped: Vec<SkippedFile>,
    /// Reviews whose text is a model-failure placeholder.
    pub model_failures: usize,
    pub publish: PublishOutcome,
}

impl RunReport {
    /// `true` when files were listed but none was reviewed, or when the
    /// comment could not be posted. Drives `--strict`.
    pub fn is_failure(&self) -> bool {
        (self.files_listed > 0 && self.reviews.is_empty())
            || matches!(self.publish, PublishOutcome::Failed { .. })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reviews.is_empty() {
            return writeln!(f, "No reviews generated.");
        }
        let mode = match self.mode {
            RunMode::Live => "live",
            RunMode::Debug => "debug",
        };
        writeln!(
            f,
            "{} of {} files reviewed with {} ({mode} mode)",
            self.reviews.len(),
            self.files_listed,
            self.model
        )?;
        for s in &self.skipped {
            writeln!(f, "  skipped {}: {}", s.filename, s.reason)?;
        }
        if self.model_failures > 0 {
            writeln!(f, "  {} model call(s) failed", self.model_failures)?;
        }
        match &self.publish {
            PublishOutcome::Posted => writeln!(f, "Comment posted to PR"),
            PublishOutcome::Printed { .. } => writeln!(f, "No pull request context, comment printed"),
            PublishOutcome::Failed { error, fallback } => {
                writeln!(f, "Failed to post comment: {error}")?;
                match fallback {
                    Some(path) => writeln!(f, "Comment body saved to {}", path.display()),
                    None => Ok(()),
                }
            }
            PublishOutcome::NothingToPublish => writeln!(f, "No reviews generated."),
        }
    }
}

/// Review orchestrator: list changed files, fetch and review each one in
/// order, then publish a single aggregated comment.
///
/// Every failure is absorbed where it happens; a run never aborts halfway.
pub struct ReviewPipeline<H, F, R> {
    host: H,
    fetcher: F,
    reviewer: R,
    config: ReviewConfig,
}

impl<H, F, R> ReviewPipeline<H, F, R>
where
    H: PullRequestHost,
    F: ContentFetcher,
    R: Reviewer,
{
    pub fn new(host: H, fetcher: F, reviewer: R, config: ReviewConfig) -> Self {
        Self {
            host,
            fetcher,
            reviewer,
            config,
        }
    }

    /// Files to review. In debug mode this is the local fixture alone; a
    /// listing failure is logged and yields no files.
    pub async fn list_changed_files(&self, ctx: &RunContext) -> Vec<ChangedFile> {
        let Some(pr) = ctx.pull_request() else {
            let fixture = &self.config.debug_fixture;
            tracing::info!(fixture = %fixture.display(), "no pull request context, running in debug mode");
            return vec![ChangedFile {
                filename: fixture.to_string_lossy().into_owned(),
                locator: ContentLocator::Path(fixture.clone()),
            }];
        };

        match self.host.list_files(&pr).await {
            Ok(files) => {
                tracing::info!(pr = %pr, count = files.len(), "listed changed files");
                files
            }
            Err(e) => {
                tracing::error!(pr = %pr, error = %e, "failed to fetch PR files");
                Vec::new()
            }
        }
    }

    /// Fetch, truncate and review one file.
    pub async fn review_file(&self, file: &ChangedFile) -> FileOutcome {
        let content = match self.fetcher.fetch(&file.locator).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(file = %file.filename, error = %e, "skipping file, content unavailable");
                return FileOutcome::Skipped(SkippedFile {
                    filename: file.filename.clone(),
                    reason: SkipReason::FetchFailed(e.to_string()),
                });
            }
        };

        if content.is_empty() {
            tracing::info!(file = %file.filename, "skipping empty file");
            return FileOutcome::Skipped(SkippedFile {
                filename: file.filename.clone(),
                reason: SkipReason::Empty,
            });
        }

        let content = truncate_content(content, self.config.max_file_chars);
        tracing::debug!(file = %file.filename, chars = content.chars().count(), "requesting review");

        let (review, model_failed) = match self.reviewer.review(&file.filename, &content).await {
            Ok(text) => (text, false),
            Err(e) => {
                tracing::warn!(file = %file.filename, error = %e, "model call failed");
                (comment::failure_review(&e), true)
            }
        };

        FileOutcome::Reviewed {
            result: ReviewResult {
                filename: file.filename.clone(),
                review,
            },
            model_failed,
        }
    }

    /// Post `body` to the pull request. In debug mode the body is handed
    /// back in [`PublishOutcome::Printed`] for the caller to print.
    pub async fn publish(&self, ctx: &RunContext, body: &str) -> PublishOutcome {
        let Some(pr) = ctx.pull_request() else {
            return PublishOutcome::Printed {
                body: body.to_string(),
            };
        };

        match self.host.post_comment(&pr, body).await {
            Ok(()) => {
                tracing::info!(pr = %pr, "comment posted");
                PublishOutcome::Posted
            }
            Err(e) => {
                tracing::error!(pr = %pr, error = %e, "failed to post comment");
                let fallback = self.save_fallback(body).await;
                PublishOutcome::Failed {
                    error: e.to_string(),
                    fallback,
                }
            }
        }
    }

    async fn save_fallback(&self, body: &str) -> Option<PathBuf> {
        let path = self.config.fallback_output.as_ref()?;
        match tokio::fs::write(path, body).await {
            Ok(()) => Some(path.clone()),
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to save comment body");
                None
            }
        }
    }

    /// Run the whole review for `ctx`.
    pub async fn run(&self, ctx: &RunContext) -> RunReport {
        let files = self.list_changed_files(ctx).await;

        let mut reviews = Vec::new();
        let mut skipped = Vec::new();
        let mut model_failures = 0;
        for file in &files {
            match self.review_file(file).await {
                FileOutcome::Reviewed {
                    result,
                    model_failed,
                } => {
                    if model_failed {
                        model_failures += 1;
                    }
                    reviews.push(result);
                }
                FileOutcome::Skipped(s) => skipped.push(s),
            }
        }

        let publish = match comment::build_comment_body(&reviews) {
            Some(body) => self.publish(ctx, &body).await,
            None => {
                tracing::info!("no reviews generated");
                PublishOutcome::NothingToPublish
            }
        };

        RunReport {
            mode: if ctx.is_debug() {
                RunMode::Debug
            } else {
                RunMode::Live
            },
            model: self.reviewer.model().to_string(),
            files_listed: files.len(),
            reviews,
            skipped,
            model_failures,
            publish,
        }
    }
}
