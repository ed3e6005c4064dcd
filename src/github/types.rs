use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub release
#[derive(Deserialize, Serialize, Debug, PartialEq, Clone, Default)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub name: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    pub html_url: Option<String>,
}

/// Payload for creating a release.
#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct NewRelease {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub prerelease: bool,
}

impl NewRelease {
    /// Tags with a pre-version suffix (`v1.0.0-beta.1`) are published as pre-releases.
    pub fn new(tag_name: &str, name: &str, body: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            name: name.to_string(),
            body: body.to_string(),
            prerelease: tag_name.contains('-'),
        }
    }
}

/// Payload for editing a release.
#[derive(Serialize, Debug, PartialEq, Clone)]
pub struct ReleaseUpdate {
    pub name: String,
    pub body: String,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    pub merge_commit_sha: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Clone)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    /// Present when the issue is a pull request.
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetails,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CommitDetails {
    pub committer: Signature,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Signature {
    pub date: DateTime<Utc>,
}
