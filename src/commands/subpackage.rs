use anyhow::{Result, bail};
use std::path::Path;

use crate::application::ReleaseContext;
use crate::package::{Package, PackageMode, node};
use crate::runtime::Runtime;

use super::Badge;
use super::commit_and_tag::SKIP_CI_MESSAGE;

const BADGE: Badge = Badge("copy-and-commit-version-for-subpackage");

#[derive(Debug, Clone, Copy, Default)]
pub struct SubpackageOptions {
    pub dry: bool,
    pub force: bool,
}

/// Copy the main package version into the npm package at `subpackage_dir`, commit and push.
#[tracing::instrument(skip(runtime))]
pub fn copy_and_commit_version_for_subpackage<R: Runtime>(
    runtime: &R,
    package: Package,
    subpackage_dir: &Path,
    options: SubpackageOptions,
) -> Result<()> {
    let subpackage = Package::new(PackageMode::Node, &package.dir.join(subpackage_dir));
    let context = ReleaseContext::new(runtime, package);
    let git = context.git();

    let version = context.package_version()?;
    let branch = context.branch()?;

    BADGE.value("isDryRun", options.dry);
    BADGE.value("isForced", options.force);
    BADGE.blank();
    BADGE.value("packageVersion", &version);
    BADGE.value("branchName", &branch);
    BADGE.value("subpackage", subpackage_dir.display());
    BADGE.blank();

    if context.is_redundant_run()? {
        BADGE.line(format!(
            "Current commit is tagged with \"{}\".",
            context.package_version_tag()?
        ));
        BADGE.line("Nothing to do here, since this is the current package version!");
        return Ok(());
    }

    if !runtime.is_dir(&subpackage.dir) {
        bail!(
            "Can not proceed since the subpackage location is missing: {}",
            subpackage.dir.display()
        );
    }

    if options.dry {
        BADGE.line(format!(
            "I would write version {} to {}.",
            version,
            subpackage_dir.join(node::PACKAGE_JSON).display()
        ));
        BADGE.line("Aborting due to --dry.");
        return Ok(());
    }

    subpackage.set_version(runtime, &version)?;
    let name = subpackage.product_name(runtime)?;

    let files: Vec<String> = subpackage
        .version_files(runtime)?
        .iter()
        .map(|file| subpackage_dir.join(file).display().to_string())
        .collect();
    let files: Vec<&str> = files.iter().map(String::as_str).collect();

    git.add(&files)?;
    git.commit(&format!(
        "Update {} to v{}\n\n{}",
        name, version, SKIP_CI_MESSAGE
    ))?;
    BADGE.block(&git.push("origin", &branch)?);

    BADGE.line(format!("Committed {} with version {}", name, version));
    Ok(())
}
