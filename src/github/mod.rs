//! GitHub REST API access for releases, pull requests and issues.

mod client;
mod repo;
mod types;

pub use client::{DEFAULT_API_URL, GitHub, ReleaseApi};
#[cfg(test)]
pub use client::MockReleaseApi;
pub use repo::GitHubRepo;
pub use types::{Issue, NewRelease, PullRequest, Release, ReleaseUpdate};
