//! Pull-request review pipeline.
//!
//! Lists the files changed by a pull request, fetches each one, asks a
//! Vertex AI model for feedback, and posts the aggregated result as a single
//! pull-request comment.

pub mod comment;
pub mod fetch;
pub mod github;
pub mod pipeline;
pub mod prompt;
pub mod vertex;

#[cfg(test)]
mod test_support;
