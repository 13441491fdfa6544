//! Commitlint GitHub - GitHub API integration
//!
//! This crate provides the REST implementation of `GitHubApi`:
//! - Commit statuses
//! - Pull request commit listing
//! - Pull request comments

pub mod client;

pub use client::GitHubClient;
