/// Build the review prompt for a single file.
///
/// The file content is embedded verbatim inside a fenced block.
///
/// # Examples
///
/// ```
/// use prism_review::prompt::build_review_prompt;
///
/// let prompt = build_review_prompt("src/app.py", "print(1)");
/// assert!(prompt.contains("`src/app.py`"));
/// assert!(prompt.contains("```\nprint(1)\n```"));
/// ```
pub fn build_review_prompt(filename: &str, content: &str) -> String {
    format!(
        "You are a senior software engineer reviewing code. \
         Provide concise, actionable review comments for `{filename}`. \
         Highlight bugs, security issues, and style improvements.\n\n\
         ```\n{content}\n```"
    )
}
