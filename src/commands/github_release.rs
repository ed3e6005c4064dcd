use anyhow::{Result, bail};

use crate::git::Git;
use crate::github::{GitHubRepo, NewRelease, ReleaseApi, ReleaseUpdate};
use crate::package::Package;
use crate::runtime::Runtime;

use super::Badge;
use super::commit_and_tag::SKIP_CI_MESSAGE;
use super::config::Config;

const BADGE: Badge = Badge("update-github-release");

#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    pub version_tag: Option<String>,
    pub title: Option<String>,
    pub text: Option<String>,
    pub use_title_and_text_from_git_tag: bool,
    pub dry: bool,
}

/// The repository `origin` points at.
pub fn origin_repo<R: Runtime>(git: &Git<'_, R>) -> Result<GitHubRepo> {
    let url = git.remote_url("origin")?;
    match GitHubRepo::from_remote_url(&url) {
        Some(repo) => Ok(repo),
        None => bail!("Remote 'origin' ({}) is not a GitHub repository", url),
    }
}

/// Create the GitHub release for a version tag, or update it if it already exists.
#[tracing::instrument(skip(config))]
pub async fn update_github_release<R: Runtime, G: ReleaseApi>(
    config: &Config<R, G>,
    package: Package,
    options: ReleaseOptions,
) -> Result<()> {
    let runtime = &config.runtime;
    let git = Git::new(runtime, &package.dir);

    let version_tag = match options.version_tag {
        Some(tag) => tag,
        None => {
            let tag = package.version_tag(runtime)?;
            BADGE.value("No --version-tag given, versionTag set to", &tag);
            tag
        }
    };

    let (title, text) = if options.use_title_and_text_from_git_tag {
        if !git.is_existing_tag(&version_tag)? {
            bail!("Tag does not exist: {}", version_tag);
        }
        let message = git.full_commit_message(&version_tag)?;
        let text = message.body.replace(SKIP_CI_MESSAGE, "").trim().to_string();

        BADGE.blank();
        BADGE.line("Option --use-title-and-text-from-git-tag was given.");
        BADGE.value("title set to", &message.subject);
        BADGE.value("text set to", &text);
        (message.subject, text)
    } else {
        (
            options.title.unwrap_or_else(|| version_tag.clone()),
            options.text.unwrap_or_default(),
        )
    };

    let repo = origin_repo(&git)?;
    let existing = config.github.get_release_by_tag(&repo, &version_tag).await?;

    match existing {
        Some(release) => {
            if options.dry {
                BADGE.line("Would now update existing release. Skipping since this is a dry run!");
                return Ok(());
            }
            BADGE.line(format!("Updating existing release for {} ...", version_tag));
            let update = ReleaseUpdate { name: title, body: text };
            config.github.update_release(&repo, release.id, &update).await?;
        }
        None => {
            if options.dry {
                BADGE.line("Would now create a new release. Skipping since this is a dry run!");
                return Ok(());
            }
            BADGE.line(format!("Creating new release for {} ...", version_tag));
            let release = NewRelease::new(&version_tag, &title, &text);
            config.github.create_release(&repo, &release).await?;
        }
    }

    BADGE.line("Success.");
    Ok(())
}
