use anyhow::Result;

use crate::package::Package;
use crate::runtime::Runtime;

use super::Badge;

const BADGE: Badge = Badge("set-version");

/// Print the package version (or only its major component) to stdout, unadorned, for use
/// in shell scripts.
#[tracing::instrument(skip(runtime))]
pub fn get_version<R: Runtime>(runtime: &R, package: &Package, major: bool) -> Result<()> {
    if major {
        println!("{}", package.major_version(runtime)?);
    } else {
        println!("{}", package.version(runtime)?);
    }
    Ok(())
}

#[tracing::instrument(skip(runtime))]
pub fn set_version<R: Runtime>(runtime: &R, package: &Package, version: &str) -> Result<()> {
    let current = package.version(runtime)?;
    BADGE.line(format!(
        "Changing {} package version from {} to {}",
        package.mode, current, version
    ));
    package.set_version(runtime, version)
}
