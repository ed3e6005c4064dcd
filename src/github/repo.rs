use anyhow::{Result, anyhow};
use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

static GITHUB_REMOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)github\.com[:/](.+)$").expect("valid remote regex"));

#[derive(Debug, PartialEq, Clone)]
pub struct GitHubRepo {
    pub owner: String,
    pub repo: String,
}

impl GitHubRepo {
    /// The repository behind a git remote URL, for both the SSH (`git@github.com:o/r.git`)
    /// and HTTPS (`https://github.com/o/r`) forms. Remotes on other hosts yield `None`.
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let path = GITHUB_REMOTE.captures(url.trim())?.get(1)?.as_str();
        let path = path.strip_suffix(".git").unwrap_or(path);
        path.parse().ok()
    }

    pub fn compare_url(&self, from: &str, to: &str) -> String {
        format!("https://github.com/{}/compare/{}...{}", self, from, to)
    }

    pub fn release_url(&self, tag: &str) -> String {
        format!("https://github.com/{}/releases/tag/{}", self, tag)
    }
}

impl std::fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for GitHubRepo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            Err(anyhow!("Invalid repository format. Expected 'owner/repo'."))
        } else {
            Ok(GitHubRepo {
                owner: parts[0].to_string(),
                repo: parts[1].to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> GitHubRepo {
        GitHubRepo {
            owner: "process-engine".to_string(),
            repo: "ci_tools".to_string(),
        }
    }

    #[test]
    fn test_parse_github_repo_valid() {
        assert_eq!(GitHubRepo::from_str("process-engine/ci_tools").unwrap(), repo());
    }

    #[test]
    fn test_parse_github_repo_invalid() {
        assert!(GitHubRepo::from_str("ci_tools").is_err());
        assert!(GitHubRepo::from_str("a/b/c").is_err());
        assert!(GitHubRepo::from_str("/ci_tools").is_err());
    }

    #[test]
    fn test_from_remote_url_ssh() {
        assert_eq!(
            GitHubRepo::from_remote_url("git@github.com:process-engine/ci_tools.git\n"),
            Some(repo())
        );
    }

    #[test]
    fn test_from_remote_url_https() {
        assert_eq!(
            GitHubRepo::from_remote_url("https://github.com/process-engine/ci_tools"),
            Some(repo())
        );
    }

    #[test]
    fn test_from_remote_url_other_host() {
        assert_eq!(
            GitHubRepo::from_remote_url("https://gitlab.com/process-engine/ci_tools.git"),
            None
        );
    }

    #[test]
    fn test_links() {
        assert_eq!(
            repo().compare_url("v1.0.0", "v1.1.0"),
            "https://github.com/process-engine/ci_tools/compare/v1.0.0...v1.1.0"
        );
        assert_eq!(
            repo().release_url("v1.0.0"),
            "https://github.com/process-engine/ci_tools/releases/tag/v1.0.0"
        );
    }
}
