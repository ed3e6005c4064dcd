use anyhow::{Result, bail};
use std::path::Path;

use crate::git::Git;
use crate::npm::{Dependency, Npm, all_dependencies, npm_tag, publish_args};
use crate::package::node;
use crate::runtime::Runtime;

use super::Badge;

/// Fail if `package.json` requires pre-versions of any dependency.
#[tracing::instrument(skip(runtime))]
pub fn fail_on_pre_version_dependencies<R: Runtime>(runtime: &R, dir: &Path) -> Result<()> {
    let badge = Badge("fail-on-pre-version-dependencies");
    let package_json = node::read_package_json(runtime, dir)?;

    let pre_versions: Vec<Dependency> = all_dependencies(&package_json)
        .into_iter()
        .filter(Dependency::is_pre_version)
        .collect();

    if pre_versions.is_empty() {
        badge.line("No dependencies with pre-version requirements found.");
        return Ok(());
    }

    badge.line("Found dependencies with pre-version requirements:");
    badge.blank();
    for dependency in &pre_versions {
        badge.line(format!("  - {}", dependency));
    }
    bail!(
        "{} dependencies with pre-version requirements",
        pre_versions.len()
    )
}

/// Dependencies whose names start with one of `patterns`, split into range requirements and
/// pinned ones, each sorted and without duplicates.
pub fn matching_dependencies(
    dependencies: &[Dependency],
    patterns: &[String],
) -> (Vec<String>, Vec<String>) {
    let mut ranged = Vec::new();
    let mut strict = Vec::new();

    let mut sorted: Vec<&Dependency> = dependencies.iter().collect();
    sorted.sort_by_key(|d| d.to_string());

    for dependency in sorted.into_iter().filter(|d| d.matches_any(patterns)) {
        let target = if dependency.is_strict() {
            &mut strict
        } else {
            &mut ranged
        };
        let requirement = dependency.to_string();
        if !target.contains(&requirement) {
            target.push(requirement);
        }
    }

    (ranged, strict)
}

/// `npm install` only the dependencies matching `patterns`.
#[tracing::instrument(skip(runtime))]
pub fn npm_install_only<R: Runtime>(
    runtime: &R,
    dir: &Path,
    patterns: &[String],
    dry: bool,
) -> Result<()> {
    let badge = Badge("npm-install-only");
    let package_json = node::read_package_json(runtime, dir)?;
    let dependencies = all_dependencies(&package_json);
    let (ranged, strict) = matching_dependencies(&dependencies, patterns);

    badge.value("patternList", patterns.join(", "));
    badge.value("matchingPackagesWithNoStrictVersion", ranged.join(" "));
    badge.value("matchingPackagesWithStrictVersion", strict.join(" "));
    badge.blank();

    let npm = Npm::new(runtime, dir);
    let installs = [(Vec::new(), ranged), (vec!["--save-exact".to_string()], strict)];

    for (flags, packages) in installs {
        if packages.is_empty() {
            continue;
        }

        let mut args = vec!["install".to_string()];
        args.extend(flags);
        args.extend(packages);

        badge.line(format!("Running: npm {}", args.join(" ")));
        if dry {
            badge.line("[skipping execution due to --dry]");
            continue;
        }
        badge.block(&npm.run(&args)?.combined());
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PublishOptions {
    pub dry: bool,
    pub create_tag_from_branch_name: bool,
}

/// `npm publish` the package, then confirm the registry lists the new version.
#[tracing::instrument(skip(runtime))]
pub fn publish_npm_package<R: Runtime>(
    runtime: &R,
    dir: &Path,
    options: PublishOptions,
) -> Result<()> {
    let badge = Badge("publish-npm-package");
    let name = node::product_name(runtime, dir)?;
    let version = node::package_version(runtime, dir)?;

    let tag = if options.create_tag_from_branch_name {
        npm_tag(&Git::new(runtime, dir).branch()?)
    } else {
        None
    };

    let npm = Npm::new(runtime, dir);
    let args = publish_args(options.dry, tag.as_deref());
    badge.line(format!("|>>> npm {}", args.join(" ")));

    let output = npm.run(&args)?;
    badge.block(&output.combined());

    let expected = format!("+ {}@{}", name, version);
    let reported = output
        .stdout
        .trim()
        .lines()
        .last()
        .is_some_and(|line| line.trim() == expected);
    if !reported {
        bail!("npm publish did not report '{}'", expected);
    }

    if options.dry {
        badge.line(format!("Dry run for version '{}' succeeded.", version));
        return Ok(());
    }

    if !npm.published_versions(&name)?.contains(&version) {
        bail!(
            "Version '{}' is not reported by 'npm view {} versions --json'",
            version,
            name
        );
    }

    badge.line(format!("Successfully published version '{}'.", version));
    Ok(())
}
