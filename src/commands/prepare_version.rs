//! `prepare-version`: write the next pre-version into the package manifest.
//!
//! The base of the version is never changed, only its suffix:
//!
//! ```text
//! 1.2.0-alpha.14   develop
//! 1.2.0-beta.2     beta
//! 1.2.0            master
//! ```

use anyhow::{Result, bail};
use log::warn;

use crate::application::ReleaseContext;
use crate::package::Package;
use crate::runtime::Runtime;
use crate::version::version_tag;

use super::Badge;

const BADGE: Badge = Badge("prepare-version");

#[derive(Debug, Clone, Copy, Default)]
pub struct PrepareOptions {
    pub allow_dirty_workdir: bool,
    pub dry: bool,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrepareOutcome {
    Written(String),
    DryRun(String),
    /// `HEAD` is the release commit of the current package version.
    NothingToDo,
}

#[tracing::instrument(skip(runtime))]
pub fn prepare_version<R: Runtime>(
    runtime: &R,
    package: Package,
    options: PrepareOptions,
) -> Result<PrepareOutcome> {
    let context = ReleaseContext::new(runtime, package);
    let git = context.git();

    let mut next_version = context.next_version()?;
    print_info(&context, &next_version, options)?;

    if let Some(version) = context.partially_successful_build_version()? {
        warn!("Retry run for a partially successful build detected");
        BADGE.line("This seems to be a retry run for a partially successful build.");
        BADGE.value("resetting nextVersionTag", version_tag(&version));
        next_version = version;
    }
    let is_retry_run = context.is_retry_run_for_partially_successful_build()?;

    if context.is_redundant_run()? {
        BADGE.line(format!(
            "Current commit is tagged with \"{}\".",
            context.package_version_tag()?
        ));
        BADGE.line("Nothing to do here, since this is the current package version!");
        return Ok(PrepareOutcome::NothingToDo);
    }

    if !options.allow_dirty_workdir && git.is_dirty(&[])? {
        let status = git.status_porcelain(&[])?;
        if !options.force {
            BADGE.line("Can not proceed due to dirty git workdir:");
            BADGE.block(&status);
            bail!("Git workdir is dirty");
        }
        BADGE.line("Git workdir is dirty:");
        BADGE.block(&status);
        BADGE.line("Resuming since --force was provided.");
    }

    let next_version_tag = version_tag(&next_version);
    if !is_retry_run && git.is_existing_tag(&next_version_tag)? {
        BADGE.line("Sanity check failed!");
        BADGE.line(format!("Tag \"{}\" already exists!", next_version_tag));
        if !options.force {
            bail!("Tag \"{}\" already exists", next_version_tag);
        }
        BADGE.line("Resuming since --force was provided.");
    }

    if options.dry {
        BADGE.line(format!(
            "I would write version {} to the {} package.",
            next_version,
            context.package().mode
        ));
        BADGE.line("Aborting due to --dry.");
        if options.force {
            BADGE.line("Even though --force was provided, --dry takes precedence.");
        }
        return Ok(PrepareOutcome::DryRun(next_version));
    }

    context.package().set_version(runtime, &next_version)?;
    BADGE.line(format!("Wrote version {}", next_version));

    Ok(PrepareOutcome::Written(next_version))
}

fn print_info<R: Runtime>(
    context: &ReleaseContext<'_, R>,
    next_version: &str,
    options: PrepareOptions,
) -> Result<()> {
    BADGE.value("isDryRun", options.dry);
    BADGE.value("isForced", options.force);
    BADGE.blank();
    BADGE.value("packageVersion", context.package_version()?);
    BADGE.value("packageVersionTag", context.package_version_tag()?);
    BADGE.value("branchName", context.branch()?);
    BADGE.line("gitTagList:");
    BADGE.block(&context.tag_list()?);
    BADGE.line("tagsForHEAD:");
    BADGE.block(&context.git().tags_pointing_at("HEAD")?.join("\n"));
    BADGE.value("nextVersionTag", version_tag(next_version));
    BADGE.blank();
    Ok(())
}
