//! Release notes built from the pull requests and issues closed since the previous release.

use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use log::info;

use crate::github::{GitHubRepo, Issue, PullRequest, ReleaseApi};

pub const MERGED_PULL_REQUEST_THRESHOLD: usize = 50;
pub const CLOSED_ISSUE_THRESHOLD: usize = 50;

/// Everything a changelog is rendered from.
#[derive(Debug, Clone)]
pub struct Changelog {
    pub repo: GitHubRepo,
    pub start_ref: String,
    pub next_version_tag: String,
    pub date: NaiveDate,
    pub merged_pull_requests: Vec<PullRequest>,
    pub closed_issues: Vec<Issue>,
}

impl Changelog {
    /// Collect pull requests and issues closed after the commit `start_ref` points at.
    ///
    /// Fails if either count reaches its sanity threshold, which usually means `start_ref` is
    /// far older than the previous release.
    #[tracing::instrument(skip(api, repo, today))]
    pub async fn collect<G: ReleaseApi + ?Sized>(
        api: &G,
        repo: &GitHubRepo,
        start_ref: &str,
        next_version_tag: &str,
        today: DateTime<Utc>,
    ) -> Result<Self> {
        let start_date = api.get_commit_date(repo, start_ref).await?;
        info!("Collecting changes since {} ({})", start_ref, start_date);

        let merged_pull_requests = api.merged_pull_requests_since(repo, start_date).await?;
        if merged_pull_requests.len() >= MERGED_PULL_REQUEST_THRESHOLD {
            bail!(
                "Sanity check failed! Found an unexpectedly high number of merged pull requests: {} (threshold is {})",
                merged_pull_requests.len(),
                MERGED_PULL_REQUEST_THRESHOLD
            );
        }

        let closed_issues = api.closed_issues_since(repo, start_date).await?;
        if closed_issues.len() >= CLOSED_ISSUE_THRESHOLD {
            bail!(
                "Sanity check failed! Found an unexpectedly high number of closed issues: {} (threshold is {})",
                closed_issues.len(),
                CLOSED_ISSUE_THRESHOLD
            );
        }

        Ok(Self {
            repo: repo.clone(),
            start_ref: start_ref.to_string(),
            next_version_tag: next_version_tag.to_string(),
            date: today.date_naive(),
            merged_pull_requests,
            closed_issues,
        })
    }

    pub fn render(&self) -> String {
        let pull_requests = section(self.merged_pull_requests.iter().map(|pr| {
            match pr.merged_at {
                Some(merged_at) => format!(
                    "- #{} {} (merged {})",
                    pr.number,
                    pr.title,
                    merged_at.format("%Y-%m-%d")
                ),
                None => format!("- #{} {}", pr.number, pr.title),
            }
        }));
        let issues = section(
            self.closed_issues
                .iter()
                .map(|issue| format!("- #{} {}", issue.number, issue.title)),
        );

        format!(
            "# Changelog {next} ({date})\n\
             \n\
             This changelog covers the changes between [{start} and {next}]({compare}).\n\
             \n\
             For further reference, please refer to the changelog of the previous version, [{start}]({previous}).\n\
             \n\
             ## Merged Pull Requests\n\
             \n\
             {pull_requests}\n\
             \n\
             ## Closed Issues\n\
             \n\
             {issues}",
            next = self.next_version_tag,
            date = self.date.format("%Y-%m-%d"),
            start = self.start_ref,
            compare = self.repo.compare_url(&self.start_ref, &self.next_version_tag),
            previous = self.repo.release_url(&self.start_ref),
            pull_requests = pull_requests,
            issues = issues,
        )
    }
}

fn section(lines: impl Iterator<Item = String>) -> String {
    let text = lines.collect::<Vec<_>>().join("\n");
    if text.is_empty() {
        "- none".to_string()
    } else {
        text
    }
}
