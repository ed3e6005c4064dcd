use crate::retry::{check_retryable, with_retry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};

use super::repo::GitHubRepo;
use super::types::{Commit, Issue, NewRelease, PullRequest, Release, ReleaseUpdate};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Pages of closed pull requests fetched at most.
const MAX_PAGES: usize = 10;
const PER_PAGE: &str = "100";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseApi: Send + Sync {
    /// The release for `tag`, or `None` if there is none yet.
    async fn get_release_by_tag(&self, repo: &GitHubRepo, tag: &str) -> Result<Option<Release>>;
    async fn create_release(&self, repo: &GitHubRepo, release: &NewRelease) -> Result<Release>;
    async fn update_release(
        &self,
        repo: &GitHubRepo,
        release_id: u64,
        update: &ReleaseUpdate,
    ) -> Result<Release>;
    /// Committer date of the commit `reference` resolves to.
    async fn get_commit_date(&self, repo: &GitHubRepo, reference: &str) -> Result<DateTime<Utc>>;
    async fn merged_pull_requests_since(
        &self,
        repo: &GitHubRepo,
        since: DateTime<Utc>,
    ) -> Result<Vec<PullRequest>>;
    /// Issues closed since `since`, pull requests excluded.
    async fn closed_issues_since(
        &self,
        repo: &GitHubRepo,
        since: DateTime<Utc>,
    ) -> Result<Vec<Issue>>;
}

pub struct GitHub {
    pub client: Client,
    pub api_url: String,
}

impl GitHub {
    #[tracing::instrument(skip(client, api_url))]
    pub fn new(client: Client, api_url: Option<String>) -> Self {
        let api_url = api_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self { client, api_url }
    }

    fn repo_url(&self, repo: &GitHubRepo, route: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, repo.owner, repo.repo, route)
    }

    async fn get_json<T>(&self, operation: &str, url: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        debug!("{}: GET {}", operation, url);

        with_retry(operation, || {
            let request = self.client.get(url).query(query);
            async move {
                let response = request
                    .send()
                    .await
                    .context("Failed to send request to GitHub API")?;

                let response = response.error_for_status().map_err(check_retryable)?;

                response
                    .json::<T>()
                    .await
                    .context("Failed to parse JSON response from GitHub API")
            }
        })
        .await
    }

    async fn send_json<B, T>(&self, operation: &str, method: Method, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        debug!("{}: {} {}", operation, method, url);

        with_retry(operation, || {
            let request = self.client.request(method.clone(), url).json(body);
            async move {
                let response = request
                    .send()
                    .await
                    .context("Failed to send request to GitHub API")?;

                let response = response.error_for_status().map_err(check_retryable)?;

                response
                    .json::<T>()
                    .await
                    .context("Failed to parse JSON response from GitHub API")
            }
        })
        .await
    }
}

fn iso_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl ReleaseApi for GitHub {
    #[tracing::instrument(skip(self, repo))]
    async fn get_release_by_tag(&self, repo: &GitHubRepo, tag: &str) -> Result<Option<Release>> {
        let url = self.repo_url(repo, &format!("/releases/tags/{}", tag));
        debug!("Fetching release from {}...", url);

        with_retry("Fetching release", || {
            let request = self.client.get(&url);
            async move {
                let response = request
                    .send()
                    .await
                    .context("Failed to send request to GitHub API")?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(None);
                }

                let response = response.error_for_status().map_err(check_retryable)?;
                let release = response
                    .json::<Release>()
                    .await
                    .context("Failed to parse JSON response from GitHub API")?;

                Ok(Some(release))
            }
        })
        .await
    }

    #[tracing::instrument(skip(self, repo))]
    async fn create_release(&self, repo: &GitHubRepo, release: &NewRelease) -> Result<Release> {
        let url = self.repo_url(repo, "/releases");
        self.send_json("Creating release", Method::POST, &url, release)
            .await
    }

    #[tracing::instrument(skip(self, repo))]
    async fn update_release(
        &self,
        repo: &GitHubRepo,
        release_id: u64,
        update: &ReleaseUpdate,
    ) -> Result<Release> {
        let url = self.repo_url(repo, &format!("/releases/{}", release_id));
        self.send_json("Updating release", Method::PATCH, &url, update)
            .await
    }

    #[tracing::instrument(skip(self, repo))]
    async fn get_commit_date(&self, repo: &GitHubRepo, reference: &str) -> Result<DateTime<Utc>> {
        let url = self.repo_url(repo, &format!("/commits/{}", reference));
        let commit: Commit = self.get_json("Fetching commit", &url, &[]).await?;
        Ok(commit.commit.committer.date)
    }

    /// Closed pull requests are listed by last update, newest first. A pull request is
    /// updated when it is merged, so paging stops after the first page that reaches back
    /// before `since`.
    #[tracing::instrument(skip(self, repo))]
    async fn merged_pull_requests_since(
        &self,
        repo: &GitHubRepo,
        since: DateTime<Utc>,
    ) -> Result<Vec<PullRequest>> {
        let url = self.repo_url(repo, "/pulls");
        let mut merged = Vec::new();

        for page in 1..=MAX_PAGES {
            let query = [
                ("state", "closed".to_string()),
                ("sort", "updated".to_string()),
                ("direction", "desc".to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let pulls: Vec<PullRequest> = self
                .get_json("Fetching pull requests", &url, &query)
                .await?;

            let exhausted = pulls
                .last()
                .is_none_or(|pr| pr.updated_at.is_some_and(|at| at < since));

            merged.extend(
                pulls
                    .into_iter()
                    .filter(|pr| pr.merged_at.is_some_and(|at| at > since)),
            );

            if exhausted {
                break;
            }
        }

        Ok(merged)
    }

    #[tracing::instrument(skip(self, repo))]
    async fn closed_issues_since(
        &self,
        repo: &GitHubRepo,
        since: DateTime<Utc>,
    ) -> Result<Vec<Issue>> {
        let url = self.repo_url(repo, "/issues");
        let query = [
            ("state", "closed".to_string()),
            ("since", iso_date(since)),
            ("per_page", PER_PAGE.to_string()),
        ];
        let issues: Vec<Issue> = self.get_json("Fetching issues", &url, &query).await?;

        Ok(issues
            .into_iter()
            .filter(|issue| !issue.is_pull_request())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    fn repo() -> GitHubRepo {
        GitHubRepo {
            owner: "test-owner".to_string(),
            repo: "test-repo".to_string(),
        }
    }

    fn since() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let github = GitHub::new(Client::new(), Some("http://localhost:1234/".to_string()));
        assert_eq!(github.api_url, "http://localhost:1234");

        let github = GitHub::new(Client::new(), None);
        assert_eq!(github.api_url, DEFAULT_API_URL);
    }

    #[tokio::test]
    async fn test_get_release_by_tag() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/test-owner/test-repo/releases/tags/v1.0.0")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 42, "tag_name": "v1.0.0", "name": "v1.0.0", "body": "text", "prerelease": false}"#)
            .create_async()
            .await;

        let github = GitHub::new(Client::new(), Some(server.url()));
        let release = github.get_release_by_tag(&repo(), "v1.0.0").await.unwrap();

        mock.assert_async().await;
        let release = release.unwrap();
        assert_eq!(release.id, 42);
        assert_eq!(release.body.as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn test_get_release_by_tag_not_found() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/test-owner/test-repo/releases/tags/v9.9.9")
            .with_status(404)
            .create_async()
            .await;

        let github = GitHub::new(Client::new(), Some(server.url()));
        let release = github.get_release_by_tag(&repo(), "v9.9.9").await.unwrap();

        mock.assert_async().await;
        assert_eq!(release, None);
    }

    #[tokio::test]
    async fn test_get_release_by_tag_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/test-owner/test-repo/releases/tags/v1.0.0")
            .with_status(401)
            .create_async()
            .await;

        let github = GitHub::new(Client::new(), Some(server.url()));
        let err = github.get_release_by_tag(&repo(), "v1.0.0").await.unwrap_err();
        assert!(err.to_string().contains("GH_TOKEN"));
    }

    #[tokio::test]
    async fn test_create_release() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/test-owner/test-repo/releases")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "tag_name": "v1.1.0-beta.2",
                "name": "Release v1.1.0-beta.2",
                "prerelease": true
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 7, "tag_name": "v1.1.0-beta.2", "prerelease": true}"#)
            .create_async()
            .await;

        let github = GitHub::new(Client::new(), Some(server.url()));
        let release = github
            .create_release(
                &repo(),
                &NewRelease::new("v1.1.0-beta.2", "Release v1.1.0-beta.2", "notes"),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(release.id, 7);
        assert!(release.prerelease);
    }

    #[tokio::test]
    async fn test_update_release() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/repos/test-owner/test-repo/releases/7")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "New title",
                "body": "New text"
            })))
            .with_status(200)
            .with_body(r#"{"id": 7, "tag_name": "v1.1.0", "name": "New title"}"#)
            .create_async()
            .await;

        let github = GitHub::new(Client::new(), Some(server.url()));
        let update = ReleaseUpdate {
            name: "New title".to_string(),
            body: "New text".to_string(),
        };
        let release = github.update_release(&repo(), 7, &update).await.unwrap();

        mock.assert_async().await;
        assert_eq!(release.name.as_deref(), Some("New title"));
    }

    #[tokio::test]
    async fn test_get_commit_date() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/test-owner/test-repo/commits/v1.0.0")
            .with_status(200)
            .with_body(r#"{"sha": "abc", "commit": {"committer": {"date": "2024-03-01T12:00:00Z"}}}"#)
            .create_async()
            .await;

        let github = GitHub::new(Client::new(), Some(server.url()));
        let date = github.get_commit_date(&repo(), "v1.0.0").await.unwrap();

        mock.assert_async().await;
        assert_eq!(date, since());
    }

    #[tokio::test]
    async fn test_merged_pull_requests_since_pages_by_update_date() {
        let mut server = mockito::Server::new_async().await;

        let page = |n: &str| {
            Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "closed".into()),
                Matcher::UrlEncoded("sort".into(), "updated".into()),
                Matcher::UrlEncoded("direction".into(), "desc".into()),
                Matcher::UrlEncoded("page".into(), n.into()),
            ])
        };

        let mock_p1 = server
            .mock("GET", "/repos/test-owner/test-repo/pulls")
            .match_query(page("1"))
            .with_status(200)
            .with_body(
                r#"[
                    {"number": 13, "title": "Add feature", "merged_at": "2024-03-05T10:00:00Z", "updated_at": "2024-03-06T10:00:00Z", "merge_commit_sha": "aaa"},
                    {"number": 11, "title": "Closed unmerged", "merged_at": null, "updated_at": "2024-03-04T10:00:00Z", "merge_commit_sha": null}
                ]"#,
            )
            .create_async()
            .await;
        // #12 was created before #11 but merged later, so creation order would miss it.
        let mock_p2 = server
            .mock("GET", "/repos/test-owner/test-repo/pulls")
            .match_query(page("2"))
            .with_status(200)
            .with_body(
                r#"[
                    {"number": 12, "title": "Fix typo", "merged_at": "2024-03-02T10:00:00Z", "updated_at": "2024-03-02T10:00:00Z", "merge_commit_sha": "ccc"},
                    {"number": 10, "title": "Old", "merged_at": "2024-02-01T10:00:00Z", "updated_at": "2024-02-01T10:00:00Z", "merge_commit_sha": "bbb"}
                ]"#,
            )
            .create_async()
            .await;
        let mock_p3 = server
            .mock("GET", "/repos/test-owner/test-repo/pulls")
            .match_query(page("3"))
            .with_status(200)
            .with_body("[]")
            .expect(0)
            .create_async()
            .await;

        let github = GitHub::new(Client::new(), Some(server.url()));
        let pulls = github
            .merged_pull_requests_since(&repo(), since())
            .await
            .unwrap();

        mock_p1.assert_async().await;
        mock_p2.assert_async().await;
        mock_p3.assert_async().await;
        let numbers: Vec<u64> = pulls.iter().map(|pr| pr.number).collect();
        assert_eq!(numbers, vec![13, 12]);
    }

    #[tokio::test]
    async fn test_closed_issues_since_excludes_pull_requests() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repos/test-owner/test-repo/issues")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("state".into(), "closed".into()),
                Matcher::UrlEncoded("since".into(), "2024-03-01T12:00:00Z".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"[
                    {"number": 3, "title": "Crash on start"},
                    {"number": 12, "title": "Add feature", "pull_request": {"url": "u"}}
                ]"#,
            )
            .create_async()
            .await;

        let github = GitHub::new(Client::new(), Some(server.url()));
        let issues = github.closed_issues_since(&repo(), since()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "Crash on start");
    }
}
