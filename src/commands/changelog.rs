use anyhow::{Result, bail};

use crate::application::ReleaseContext;
use crate::changelog::Changelog;
use crate::github::ReleaseApi;
use crate::package::Package;
use crate::runtime::Runtime;

use super::Badge;
use super::config::Config;
use super::github_release::origin_repo;

const BADGE: Badge = Badge("create-changelog");

/// Print the changelog between `start_ref` (default: the previous stable release) and the
/// next version.
#[tracing::instrument(skip(config))]
pub async fn create_changelog<R: Runtime, G: ReleaseApi>(
    config: &Config<R, G>,
    package: Package,
    start_ref: Option<String>,
) -> Result<()> {
    let context = ReleaseContext::new(&config.runtime, package);

    let start_ref = match start_ref {
        Some(start_ref) => start_ref,
        None => match context.prev_version_tag()? {
            Some(tag) => {
                BADGE.line(format!("No start ref given, using: \"{}\"", tag));
                tag
            }
            None => bail!("No previous stable release found, please pass a start ref"),
        },
    };

    let next_version_tag = context.next_version_tag()?;
    let repo = origin_repo(context.git())?;

    BADGE.value("startRef", &start_ref);
    BADGE.value("endRef", "HEAD");
    BADGE.value("nextVersionTag", &next_version_tag);
    println!();

    let changelog = Changelog::collect(
        &config.github,
        &repo,
        &start_ref,
        &next_version_tag,
        config.runtime.now(),
    )
    .await?;

    println!("{}", changelog.render());
    Ok(())
}
