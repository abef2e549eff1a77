use prism_core::{ReviewError, ReviewResult};

/// Heading that opens every aggregated review comment.
pub const COMMENT_HEADER: &str = "## Vertex AI — Automated Code Review\n";

/// Separator placed between per-file sections.
pub const SECTION_SEPARATOR: &str = "\n---\n";

/// Prefix of the placeholder review used when the model call fails.
pub const MODEL_FAILURE_PREFIX: &str = "GenAI model call failed: ";

/// Placeholder review text for a failed model call.
///
/// # Examples
///
/// ```
/// use prism_core::ReviewError;
/// use prism_review::comment::failure_review;
///
/// let text = failure_review(&ReviewError::Transport("timed out".into()));
/// assert_eq!(text, "GenAI model call failed: request failed: timed out");
/// ```
pub fn failure_review(err: &ReviewError) -> String {
    format!("{MODEL_FAILURE_PREFIX}{err}")
}

fn format_section(result: &ReviewResult) -> String {
    format!("**File:** `{}`\n{}\n", result.filename, result.review)
}

/// Assemble the comment body from per-file results, in order.
///
/// Returns `None` when there is nothing to post.
///
/// # Examples
///
/// ```
/// use prism_core::ReviewResult;
/// use prism_review::comment::build_comment_body;
///
/// assert!(build_comment_body(&[]).is_none());
///
/// let body = build_comment_body(&[ReviewResult {
///     filename: "a.py".into(),
///     review: "Looks fine.".into(),
/// }])
/// .unwrap();
/// assert!(body.contains("**File:** `a.py`\nLooks fine."));
/// ```
pub fn build_comment_body(results: &[ReviewResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }
    let sections: Vec<String> = results.iter().map(format_section).collect();
    Some(format!("{COMMENT_HEADER}{}", sections.join(SECTION_SEPARATOR)))
}
