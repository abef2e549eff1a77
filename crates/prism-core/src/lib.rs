//! Core types, configuration, and error handling for prism.
//!
//! This crate provides the shared foundation used by the review pipeline
//! and the CLI:
//! - [`PrismError`] and [`ReviewError`], built on `thiserror`
//! - [`PrismConfig`], loaded from `.prism.toml` and environment variables
//! - Shared types: [`ChangedFile`], [`ContentLocator`], [`ReviewResult`],
//!   [`RunContext`], [`PullRequest`]

mod config;
mod error;
mod types;

pub use config::{parse_pr_number, GitHubConfig, PrismConfig, ReviewConfig, VertexConfig};
pub use error::{PrismError, ReviewError};
pub use types::{
    parse_repository, ChangedFile, ContentLocator, PullRequest, ReviewResult, RunContext,
};

/// A convenience `Result` type for prism operations.
pub type Result<T> = std::result::Result<T, PrismError>;
