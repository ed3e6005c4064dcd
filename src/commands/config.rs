use anyhow::Result;
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use std::path::PathBuf;

use crate::{
    github::{GitHub, ReleaseApi},
    runtime::Runtime,
};

pub const USER_AGENT: &str = "ci_tools";
pub const TOKEN_ENV: &str = "GH_TOKEN";

/// What every command runs against: system access, the GitHub API and the package directory.
pub struct Config<R: Runtime, G: ReleaseApi> {
    pub runtime: R,
    pub github: G,
    pub dir: PathBuf,
}

impl<R: Runtime> Config<R, GitHub> {
    pub fn new(runtime: R, dir: Option<PathBuf>, api_url: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var(TOKEN_ENV) {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!("Using {} for authentication: {}", TOKEN_ENV, mask(&token));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        let dir = match dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => runtime.current_dir()?.join(dir),
            None => runtime.current_dir()?,
        };

        Ok(Self {
            github: GitHub::new(client, api_url),
            runtime,
            dir,
        })
    }
}

impl<R: Runtime, G: ReleaseApi> Config<R, G> {
    pub fn with_github(runtime: R, github: G, dir: PathBuf) -> Self {
        Self {
            runtime,
            github,
            dir,
        }
    }
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*********".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}*********{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockito::{Matcher, Server};
    use std::path::Path;

    async fn verify_authorization_header(token: Option<&str>) {
        let mut runtime = MockRuntime::new();
        let token_clone = token.map(|t| t.to_string());

        runtime
            .expect_env_var()
            .with(mockall::predicate::eq(TOKEN_ENV))
            .returning(move |_| token_clone.clone().ok_or(std::env::VarError::NotPresent));
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/work")));

        let mut server = Server::new_async().await;

        let expected_header = match token {
            Some(t) => Matcher::Exact(format!("Bearer {}", t)),
            None => Matcher::Missing,
        };

        let mock = server
            .mock("GET", "/")
            .match_header("Authorization", expected_header)
            .match_header("User-Agent", USER_AGENT)
            .create_async()
            .await;

        let config = Config::new(runtime, None, None).unwrap();
        let _ = config.github.client.get(server.url()).send().await;

        mock.assert_async().await;
        assert_eq!(config.dir, PathBuf::from("/work"));
    }

    #[tokio::test]
    async fn test_config_new_with_gh_token() {
        verify_authorization_header(Some("ghp_test_token_1234")).await;
    }

    #[tokio::test]
    async fn test_config_new_without_gh_token() {
        verify_authorization_header(None).await;
    }

    #[test]
    fn test_relative_dir_is_resolved() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));
        runtime
            .expect_current_dir()
            .returning(|| Ok(PathBuf::from("/work")));

        let config = Config::new(runtime, Some(PathBuf::from("packages/sub")), None).unwrap();
        assert_eq!(config.dir, Path::new("/work/packages/sub"));
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("short"), "*********");
        assert_eq!(mask("ghp_abcdefghijklmnop"), "ghp_*********mnop");
    }
}
