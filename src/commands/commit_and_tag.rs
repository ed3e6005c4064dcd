use anyhow::Result;
use log::warn;

use crate::application::ReleaseContext;
use crate::changelog::Changelog;
use crate::github::{GitHubRepo, ReleaseApi};
use crate::package::Package;
use crate::runtime::Runtime;

use super::Badge;
use super::config::Config;

const BADGE: Badge = Badge("commit-and-tag-version");
pub const SKIP_CI_MESSAGE: &str = "[skip ci]";

#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
    pub dry: bool,
    pub force: bool,
}

/// Commit the version bump, tag it `v{version}` with the changelog as message and push
/// branch and tags to `origin`.
#[tracing::instrument(skip(config))]
pub async fn commit_and_tag_version<R: Runtime, G: ReleaseApi>(
    config: &Config<R, G>,
    package: Package,
    options: CommitOptions,
) -> Result<()> {
    let runtime = &config.runtime;
    let context = ReleaseContext::new(runtime, package);
    let git = context.git();

    let package_version = context.package_version()?;
    let package_version_tag = context.package_version_tag()?;
    let branch = context.branch()?;

    BADGE.value("isDryRun", options.dry);
    BADGE.value("isForced", options.force);
    BADGE.blank();
    BADGE.value("packageVersion", &package_version);
    BADGE.value("packageVersionTag", &package_version_tag);
    BADGE.value("branchName", &branch);
    BADGE.blank();

    if context.is_redundant_run()? {
        BADGE.line(format!(
            "Current commit is tagged with \"{}\".",
            package_version_tag
        ));
        BADGE.line("Nothing to do here, since this is the current package version!");
        return Ok(());
    }

    if context.is_retry_run_for_partially_successful_build()? {
        BADGE.line("This seems to be a retry run for a partially successful build.");
        BADGE.line("Nothing to do here!");
        return Ok(());
    }

    BADGE.value("git config user.name", git.config_value("user.name")?);
    BADGE.value("git config user.email", git.config_value("user.email")?);

    let changelog = changelog_for(config, &context, &package_version_tag).await?;
    let message = release_commit_message(&package_version_tag, changelog.as_deref());

    if options.dry {
        BADGE.line("Would commit, tag and push with message:");
        BADGE.block(&message);
        BADGE.line("Aborting due to --dry.");
        return Ok(());
    }

    let files = context.package().version_files(runtime)?;
    let files: Vec<&str> = files.iter().map(String::as_str).collect();

    git.checkout(&branch)?;
    git.add(&files)?;
    git.commit(&message)?;
    git.tag(&package_version_tag)?;
    BADGE.block(&git.push("origin", &branch)?);
    BADGE.block(&git.push_tags()?);

    BADGE.line(format!(
        "Committed version {} and tagged that commit as \"{}\"",
        package_version, package_version_tag
    ));
    Ok(())
}

/// Changelog since the previous stable release, if one can be built.
async fn changelog_for<R: Runtime, G: ReleaseApi>(
    config: &Config<R, G>,
    context: &ReleaseContext<'_, R>,
    version_tag: &str,
) -> Result<Option<String>> {
    let Some(repo) = GitHubRepo::from_remote_url(&context.git().remote_url("origin")?) else {
        warn!("Remote 'origin' is not a GitHub repository, skipping changelog");
        return Ok(None);
    };
    let Some(start_ref) = context.prev_version_tag()? else {
        warn!("No previous stable release found, skipping changelog");
        return Ok(None);
    };

    let changelog = Changelog::collect(
        &config.github,
        &repo,
        &start_ref,
        version_tag,
        config.runtime.now(),
    )
    .await?;
    Ok(Some(changelog.render()))
}

pub fn release_commit_message(version_tag: &str, changelog: Option<&str>) -> String {
    match changelog {
        Some(changelog) => format!(
            "Release {}\n\n{}\n\n{}",
            version_tag, changelog, SKIP_CI_MESSAGE
        ),
        None => format!("Release {}\n\n{}", version_tag, SKIP_CI_MESSAGE),
    }
}
